use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{
        Path, Query, State,
        rejection::{JsonRejection, QueryRejection},
    },
    response::IntoResponse,
    routing::{get, post},
};
use crates::{
    domain::{
        repositories::{
            bookings::BookingRepository, catalog::CatalogRepository,
            group_classes::GroupClassRepository, membership::MembershipRepository,
            plans::PlanRepository, users::UserRepository,
        },
        value_objects::{enums::resource_kinds::ResourceKind, membership::PlanSelectorModel},
    },
    infra::db::{
        postgres::postgres_connection::PgPoolSquad,
        repositories::{
            bookings::BookingPostgres, catalog::CatalogPostgres,
            group_classes::GroupClassPostgres, membership::MembershipPostgres,
            plans::PlanPostgres, users::UserPostgres,
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
        membership::MembershipUseCase,
    },
};

pub fn routes(db_pool: Arc<PgPoolSquad>) -> Router {
    let plan_repository = Arc::new(PlanPostgres::new(Arc::clone(&db_pool)));

    let catalog_usecase = CatalogUseCase::new(
        Arc::clone(&plan_repository),
        Arc::new(GroupClassPostgres::new(Arc::clone(&db_pool))),
        Arc::new(CatalogPostgres::new(Arc::clone(&db_pool))),
    );
    let booking_usecase = BookingUseCase::new(Arc::new(BookingPostgres::new(Arc::clone(&db_pool))));
    let membership_usecase = MembershipUseCase::new(
        Arc::new(UserPostgres::new(Arc::clone(&db_pool))),
        plan_repository,
        Arc::new(MembershipPostgres::new(Arc::clone(&db_pool))),
    );

    let schedule_routes = Router::new()
        .route(
            "/schedule",
            get(schedule::<PlanPostgres, GroupClassPostgres, CatalogPostgres>),
        )
        .with_state(Arc::new(catalog_usecase));

    let booking_routes = Router::new()
        .route("/sessions/:id/book", post(book_session::<BookingPostgres>))
        .route("/sessions/:id/cancel", post(cancel_session::<BookingPostgres>))
        .route("/bookings", get(list_bookings::<BookingPostgres>))
        .with_state(Arc::new(booking_usecase));

    let membership_routes = Router::new()
        .route("/me", get(me::<UserPostgres, PlanPostgres, MembershipPostgres>))
        .route(
            "/subscribe-plan",
            post(subscribe_plan::<UserPostgres, PlanPostgres, MembershipPostgres>),
        )
        .route(
            "/membership/history",
            get(membership_history::<UserPostgres, PlanPostgres, MembershipPostgres>),
        )
        .with_state(Arc::new(membership_usecase));

    schedule_routes.merge(booking_routes).merge(membership_routes)
}

pub async fn schedule<P, G, C>(
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
    let sessions = catalog_usecase.class_schedule(auth.user_id, &window).await?;

    Ok(Json(json!({ "sessions": sessions })))
}

pub async fn book_session<B>(
    State(booking_usecase): State<Arc<BookingUseCase<B>>>,
    auth: AuthUser,
    Path(session_id): Path<String>,
) -> Result<impl IntoResponse, AppError>
where
    B: BookingRepository + Send + Sync + 'static,
{
    let session_id = parse_path_id(&session_id, "session")?;
    let confirmation = booking_usecase
        .book(ResourceKind::ClassSession, auth.user_id, session_id)
        .await?;

    Ok(Json(confirmation))
}

pub async fn cancel_session<B>(
    State(booking_usecase): State<Arc<BookingUseCase<B>>>,
    auth: AuthUser,
    Path(session_id): Path<String>,
) -> Result<impl IntoResponse, AppError>
where
    B: BookingRepository + Send + Sync + 'static,
{
    let session_id = parse_path_id(&session_id, "session")?;
    let confirmation = booking_usecase
        .cancel(ResourceKind::ClassSession, auth.user_id, session_id)
        .await?;

    Ok(Json(confirmation))
}

pub async fn list_bookings<B>(
    State(booking_usecase): State<Arc<BookingUseCase<B>>>,
    auth: AuthUser,
) -> Result<impl IntoResponse, AppError>
where
    B: BookingRepository + Send + Sync + 'static,
{
    let bookings = booking_usecase.list_bookings(auth.user_id).await?;

    Ok(Json(bookings))
}

pub async fn me<U, P, M>(
    State(membership_usecase): State<Arc<MembershipUseCase<U, P, M>>>,
    auth: AuthUser,
) -> Result<impl IntoResponse, AppError>
where
    U: UserRepository + Send + Sync + 'static,
    P: PlanRepository + Send + Sync + 'static,
    M: MembershipRepository + Send + Sync + 'static,
{
    let me = membership_usecase.me(auth.user_id).await?;

    Ok(Json(me))
}

pub async fn subscribe_plan<U, P, M>(
    State(membership_usecase): State<Arc<MembershipUseCase<U, P, M>>>,
    auth: AuthUser,
    payload: Result<Json<PlanSelectorModel>, JsonRejection>,
) -> Result<impl IntoResponse, AppError>
where
    U: UserRepository + Send + Sync + 'static,
    P: PlanRepository + Send + Sync + 'static,
    M: MembershipRepository + Send + Sync + 'static,
{
    let Json(selector) = payload?;
    let subscribed = membership_usecase
        .subscribe_plan(auth.user_id, &selector)
        .await?;

    Ok(Json(subscribed))
}

pub async fn membership_history<U, P, M>(
    State(membership_usecase): State<Arc<MembershipUseCase<U, P, M>>>,
    auth: AuthUser,
) -> Result<impl IntoResponse, AppError>
where
    U: UserRepository + Send + Sync + 'static,
    P: PlanRepository + Send + Sync + 'static,
    M: MembershipRepository + Send + Sync + 'static,
{
    let events = membership_usecase.history(auth.user_id).await?;

    Ok(Json(json!({ "events": events })))
}
