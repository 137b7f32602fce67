use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, Query, State, rejection::QueryRejection},
    response::IntoResponse,
    routing::{get, post},
};
use crates::{
    domain::{
        repositories::{
            bookings::BookingRepository, catalog::CatalogRepository,
            group_classes::GroupClassRepository, plans::PlanRepository,
        },
        value_objects::enums::resource_kinds::ResourceKind,
    },
    infra::db::{
        postgres::postgres_connection::PgPoolSquad,
        repositories::{
            bookings::BookingPostgres, catalog::CatalogPostgres,
            group_classes::GroupClassPostgres, plans::PlanPostgres,
        },
    },
};
use serde_json::json;

use super::parse_path_id;
use crate::{
    auth::AuthUser,
    axum_http::error_responses::AppError,
    usecases::{
        bookings::BookingUseCase,
        catalog::{CatalogUseCase, WindowQuery},
    },
};

pub fn routes(db_pool: Arc<PgPoolSquad>) -> Router {
    let catalog_usecase = CatalogUseCase::new(
        Arc::new(PlanPostgres::new(Arc::clone(&db_pool))),
        Arc::new(GroupClassPostgres::new(Arc::clone(&db_pool))),
        Arc::new(CatalogPostgres::new(Arc::clone(&db_pool))),
    );
    let booking_usecase = BookingUseCase::new(Arc::new(BookingPostgres::new(Arc::clone(&db_pool))));

    let catalog_routes = Router::new()
        .route(
            "/public",
            get(public_trainers::<PlanPostgres, GroupClassPostgres, CatalogPostgres>),
        )
        .route(
            "/availability",
            get(availability::<PlanPostgres, GroupClassPostgres, CatalogPostgres>),
        )
        .with_state(Arc::new(catalog_usecase));

    let booking_routes = Router::new()
        .route("/availability/:id/book", post(book_slot::<BookingPostgres>))
        .route("/availability/:id/cancel", post(cancel_slot::<BookingPostgres>))
        .with_state(Arc::new(booking_usecase));

    catalog_routes.merge(booking_routes)
}

pub async fn public_trainers<P, G, C>(
    State(catalog_usecase): State<Arc<CatalogUseCase<P, G, C>>>,
) -> Result<impl IntoResponse, AppError>
where
    P: PlanRepository + Send + Sync + 'static,
    G: GroupClassRepository + Send + Sync + 'static,
    C: CatalogRepository + Send + Sync + 'static,
{
    let trainers = catalog_usecase.list_public_trainers().await?;

    Ok(Json(json!({ "trainers": trainers })))
}

pub async fn availability<P, G, C>(
    State(catalog_usecase): State<Arc<CatalogUseCase<P, G, C>>>,
    auth: AuthUser,
    query: Result<Query<WindowQuery>, QueryRejection>,
) -> Result<impl IntoResponse, AppError>
where
    P: PlanRepository + Send + Sync + 'static,
    G: GroupClassRepository + Send + Sync + 'static,
    C: CatalogRepository + Send + Sync + 'static,
{
    let Query(window) = query?;
    let availability = catalog_usecase
        .trainer_availability(auth.user_id, &window)
        .await?;

    Ok(Json(json!({ "availability": availability })))
}

pub async fn book_slot<B>(
    State(booking_usecase): State<Arc<BookingUseCase<B>>>,
    auth: AuthUser,
    Path(slot_id): Path<String>,
) -> Result<impl IntoResponse, AppError>
where
    B: BookingRepository + Send + Sync + 'static,
{
    let slot_id = parse_path_id(&slot_id, "slot")?;
    let confirmation = booking_usecase
        .book(ResourceKind::TrainerSlot, auth.user_id, slot_id)
        .await?;

    Ok(Json(confirmation))
}

pub async fn cancel_slot<B>(
    State(booking_usecase): State<Arc<BookingUseCase<B>>>,
    auth: AuthUser,
    Path(slot_id): Path<String>,
) -> Result<impl IntoResponse, AppError>
where
    B: BookingRepository + Send + Sync + 'static,
{
    let slot_id = parse_path_id(&slot_id, "slot")?;
    let confirmation = booking_usecase
        .cancel(ResourceKind::TrainerSlot, auth.user_id, slot_id)
        .await?;

    Ok(Json(confirmation))
}
