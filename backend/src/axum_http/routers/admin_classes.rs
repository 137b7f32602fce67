use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, State, rejection::JsonRejection},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, put},
};
use crates::{
    domain::{
        repositories::group_classes::GroupClassRepository,
        value_objects::group_classes::GroupClassFormModel,
    },
    infra::db::{
        postgres::postgres_connection::PgPoolSquad,
        repositories::group_classes::GroupClassPostgres,
    },
};
use serde_json::json;
use tracing::info;

use super::parse_path_id;
use crate::{
    auth::AdminUser, axum_http::error_responses::AppError,
    usecases::group_classes::GroupClassUseCase,
};

pub fn routes(db_pool: Arc<PgPoolSquad>) -> Router {
    let group_class_repository = GroupClassPostgres::new(Arc::clone(&db_pool));
    let group_class_usecase = GroupClassUseCase::new(Arc::new(group_class_repository));

    Router::new()
        .route(
            "/classes",
            get(list_classes::<GroupClassPostgres>).post(create_class::<GroupClassPostgres>),
        )
        .route(
            "/classes/:id",
            put(update_class::<GroupClassPostgres>).delete(delete_class::<GroupClassPostgres>),
        )
        .with_state(Arc::new(group_class_usecase))
}

pub async fn list_classes<G>(
    State(group_class_usecase): State<Arc<GroupClassUseCase<G>>>,
    _admin: AdminUser,
) -> Result<impl IntoResponse, AppError>
where
    G: GroupClassRepository + Send + Sync + 'static,
{
    let classes = group_class_usecase.list().await?;

    Ok(Json(json!({ "classes": classes })))
}

pub async fn create_class<G>(
    State(group_class_usecase): State<Arc<GroupClassUseCase<G>>>,
    AdminUser(admin): AdminUser,
    payload: Result<Json<GroupClassFormModel>, JsonRejection>,
) -> Result<impl IntoResponse, AppError>
where
    G: GroupClassRepository + Send + Sync + 'static,
{
    let Json(form) = payload?;
    let class = group_class_usecase.create(&form).await?;
    info!(admin_id = %admin.user_id, class_id = %class.id, "admin_classes: created");

    Ok((StatusCode::CREATED, Json(json!({ "class": class }))))
}

pub async fn update_class<G>(
    State(group_class_usecase): State<Arc<GroupClassUseCase<G>>>,
    AdminUser(admin): AdminUser,
    Path(class_id): Path<String>,
    payload: Result<Json<GroupClassFormModel>, JsonRejection>,
) -> Result<impl IntoResponse, AppError>
where
    G: GroupClassRepository + Send + Sync + 'static,
{
    let class_id = parse_path_id(&class_id, "class")?;
    let Json(form) = payload?;
    let class = group_class_usecase.update(class_id, &form).await?;
    info!(admin_id = %admin.user_id, %class_id, "admin_classes: updated");

    Ok(Json(json!({ "class": class })))
}

pub async fn delete_class<G>(
    State(group_class_usecase): State<Arc<GroupClassUseCase<G>>>,
    AdminUser(admin): AdminUser,
    Path(class_id): Path<String>,
) -> Result<impl IntoResponse, AppError>
where
    G: GroupClassRepository + Send + Sync + 'static,
{
    let class_id = parse_path_id(&class_id, "class")?;
    group_class_usecase.delete(class_id).await?;
    info!(admin_id = %admin.user_id, %class_id, "admin_classes: deleted");

    Ok(Json(json!({ "message": "Class deleted successfully" })))
}
