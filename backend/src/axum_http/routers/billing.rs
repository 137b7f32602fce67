use std::sync::Arc;

use axum::{
    Json, Router,
    body::Bytes,
    extract::{State, rejection::JsonRejection},
    http::HeaderMap,
    response::IntoResponse,
    routing::post,
};
use crates::{
    domain::{
        repositories::{
            membership::MembershipRepository, plans::PlanRepository, users::UserRepository,
        },
        value_objects::membership::{CancelSubscriptionModel, PlanSelectorModel},
    },
    infra::db::{
        postgres::postgres_connection::PgPoolSquad,
        repositories::{
            membership::MembershipPostgres, plans::PlanPostgres, users::UserPostgres,
        },
    },
    payments::stripe_client::StripeClient,
};
use serde_json::json;

use crate::{
    auth::AuthUser,
    axum_http::error_responses::AppError,
    usecases::billing::{BillingUseCase, StripeGateway},
};

const SIGNATURE_HEADER: &str = "stripe-signature";

pub fn routes(db_pool: Arc<PgPoolSquad>, stripe_client: Option<Arc<StripeClient>>) -> Router {
    let billing_usecase = BillingUseCase::new(
        Arc::new(UserPostgres::new(Arc::clone(&db_pool))),
        Arc::new(PlanPostgres::new(Arc::clone(&db_pool))),
        Arc::new(MembershipPostgres::new(Arc::clone(&db_pool))),
        stripe_client,
    );

    Router::new()
        .route(
            "/create-checkout-session",
            post(create_checkout_session::<UserPostgres, PlanPostgres, MembershipPostgres, StripeClient>),
        )
        .route(
            "/cancel-subscription",
            post(cancel_subscription::<UserPostgres, PlanPostgres, MembershipPostgres, StripeClient>),
        )
        .route(
            "/webhook",
            post(webhook::<UserPostgres, PlanPostgres, MembershipPostgres, StripeClient>),
        )
        .with_state(Arc::new(billing_usecase))
}

pub async fn create_checkout_session<U, P, M, S>(
    State(billing_usecase): State<Arc<BillingUseCase<U, P, M, S>>>,
    auth: AuthUser,
    payload: Result<Json<PlanSelectorModel>, JsonRejection>,
) -> Result<impl IntoResponse, AppError>
where
    U: UserRepository + Send + Sync + 'static,
    P: PlanRepository + Send + Sync + 'static,
    M: MembershipRepository + Send + Sync + 'static,
    S: StripeGateway + Send + Sync + 'static,
{
    let Json(selector) = payload?;
    let url = billing_usecase
        .create_checkout_session(auth.user_id, &selector)
        .await?;

    Ok(Json(json!({ "url": url })))
}

/// The body is optional here; an empty body cancels at period end.
pub async fn cancel_subscription<U, P, M, S>(
    State(billing_usecase): State<Arc<BillingUseCase<U, P, M, S>>>,
    auth: AuthUser,
    body: Bytes,
) -> Result<impl IntoResponse, AppError>
where
    U: UserRepository + Send + Sync + 'static,
    P: PlanRepository + Send + Sync + 'static,
    M: MembershipRepository + Send + Sync + 'static,
    S: StripeGateway + Send + Sync + 'static,
{
    let model = parse_cancel_body(&body)?;
    let cancellation = billing_usecase
        .cancel_subscription(auth.user_id, model.mode)
        .await?;

    Ok(Json(cancellation))
}

/// Takes the raw body: the signature covers the exact bytes Stripe sent.
pub async fn webhook<U, P, M, S>(
    State(billing_usecase): State<Arc<BillingUseCase<U, P, M, S>>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<impl IntoResponse, AppError>
where
    U: UserRepository + Send + Sync + 'static,
    P: PlanRepository + Send + Sync + 'static,
    M: MembershipRepository + Send + Sync + 'static,
    S: StripeGateway + Send + Sync + 'static,
{
    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|value| value.to_str().ok());

    billing_usecase.handle_webhook(&body, signature).await?;

    Ok(Json(json!({ "received": true })))
}

fn parse_cancel_body(body: &[u8]) -> Result<CancelSubscriptionModel, AppError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(CancelSubscriptionModel::default());
    }

    serde_json::from_slice(body).map_err(|err| AppError::Validation(err.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crates::domain::value_objects::enums::cancel_modes::CancelMode;

    #[test]
    fn empty_cancel_body_defaults_to_period_end() {
        assert_eq!(parse_cancel_body(b"").unwrap().mode, CancelMode::PeriodEnd);
        assert_eq!(parse_cancel_body(b" \n").unwrap().mode, CancelMode::PeriodEnd);
    }

    #[test]
    fn explicit_cancel_mode_is_read() {
        let model = parse_cancel_body(br#"{"mode":"immediate"}"#).unwrap();

        assert_eq!(model.mode, CancelMode::Immediate);
    }

    #[test]
    fn unknown_cancel_mode_is_validation() {
        let err = parse_cancel_body(br#"{"mode":"later"}"#).unwrap_err();

        assert!(matches!(err, AppError::Validation(_)));
    }
}
