use std::sync::Arc;

use axum::{Json, Router, extract::State, response::IntoResponse, routing::get};
use crates::{
    domain::repositories::{
        catalog::CatalogRepository, group_classes::GroupClassRepository, plans::PlanRepository,
    },
    infra::db::{
        postgres::postgres_connection::PgPoolSquad,
        repositories::{
            catalog::CatalogPostgres, group_classes::GroupClassPostgres, plans::PlanPostgres,
        },
    },
};
use serde_json::json;

use crate::{axum_http::error_responses::AppError, usecases::catalog::CatalogUseCase};

type PostgresCatalog = CatalogUseCase<PlanPostgres, GroupClassPostgres, CatalogPostgres>;

pub fn routes(db_pool: Arc<PgPoolSquad>) -> Router {
    let catalog_usecase: PostgresCatalog = CatalogUseCase::new(
        Arc::new(PlanPostgres::new(Arc::clone(&db_pool))),
        Arc::new(GroupClassPostgres::new(Arc::clone(&db_pool))),
        Arc::new(CatalogPostgres::new(Arc::clone(&db_pool))),
    );

    Router::new()
        .route(
            "/plans",
            get(list_plans::<PlanPostgres, GroupClassPostgres, CatalogPostgres>),
        )
        .route(
            "/classes",
            get(list_classes::<PlanPostgres, GroupClassPostgres, CatalogPostgres>),
        )
        .with_state(Arc::new(catalog_usecase))
}

pub async fn list_plans<P, G, C>(
    State(catalog_usecase): State<Arc<CatalogUseCase<P, G, C>>>,
) -> Result<impl IntoResponse, AppError>
where
    P: PlanRepository + Send + Sync + 'static,
    G: GroupClassRepository + Send + Sync + 'static,
    C: CatalogRepository + Send + Sync + 'static,
{
    let plans = catalog_usecase.list_public_plans().await?;

    Ok(Json(json!({ "plans": plans })))
}

pub async fn list_classes<P, G, C>(
    State(catalog_usecase): State<Arc<CatalogUseCase<P, G, C>>>,
) -> Result<impl IntoResponse, AppError>
where
    P: PlanRepository + Send + Sync + 'static,
    G: GroupClassRepository + Send + Sync + 'static,
    C: CatalogRepository + Send + Sync + 'static,
{
    let classes = catalog_usecase.list_public_classes().await?;

    Ok(Json(json!({ "classes": classes })))
}
