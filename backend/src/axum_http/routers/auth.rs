use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
    response::IntoResponse,
    routing::post,
};
use crates::{
    domain::{
        repositories::users::UserRepository,
        value_objects::iam::{LoginModel, RegisterUserModel},
    },
    infra::db::{postgres::postgres_connection::PgPoolSquad, repositories::users::UserPostgres},
};
use serde_json::json;

use crate::{
    auth::{AccessControl, AuthUser},
    axum_http::error_responses::AppError,
    usecases::accounts::AccountUseCase,
};

pub fn routes(db_pool: Arc<PgPoolSquad>, access_control: Arc<AccessControl>) -> Router {
    let user_repository = UserPostgres::new(Arc::clone(&db_pool));
    let account_usecase = AccountUseCase::new(Arc::new(user_repository), access_control);

    Router::new()
        .route("/register", post(register::<UserPostgres>))
        .route("/login", post(login::<UserPostgres>))
        .route("/logout", post(logout::<UserPostgres>))
        .with_state(Arc::new(account_usecase))
}

pub async fn register<U>(
    State(account_usecase): State<Arc<AccountUseCase<U>>>,
    payload: Result<Json<RegisterUserModel>, JsonRejection>,
) -> Result<impl IntoResponse, AppError>
where
    U: UserRepository + Send + Sync + 'static,
{
    let Json(model) = payload?;
    let response = account_usecase.register(model).await?;

    Ok((StatusCode::CREATED, Json(response)))
}

pub async fn login<U>(
    State(account_usecase): State<Arc<AccountUseCase<U>>>,
    payload: Result<Json<LoginModel>, JsonRejection>,
) -> Result<impl IntoResponse, AppError>
where
    U: UserRepository + Send + Sync + 'static,
{
    let Json(model) = payload?;
    let response = account_usecase.login(model).await?;

    Ok(Json(response))
}

pub async fn logout<U>(
    State(account_usecase): State<Arc<AccountUseCase<U>>>,
    auth: AuthUser,
) -> Result<impl IntoResponse, AppError>
where
    U: UserRepository + Send + Sync + 'static,
{
    account_usecase.logout(&auth).await?;

    Ok(Json(json!({ "message": "Logged out" })))
}
