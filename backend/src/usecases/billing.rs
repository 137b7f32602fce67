use std::{
    collections::HashMap,
    sync::{
        Arc,
        atomic::{AtomicU32, Ordering},
    },
};

use anyhow::Result as AnyResult;
use async_trait::async_trait;
use crates::{
    domain::{
        repositories::{
            membership::MembershipRepository, plans::PlanRepository, users::UserRepository,
        },
        value_objects::{
            enums::{cancel_modes::CancelMode, membership_statuses::MembershipStatus},
            membership::{
                CancellationDto, CheckoutCompletion, CustomerStatusUpdate, MembershipEventDraft,
                PlanSelectorModel,
            },
        },
    },
    payments::stripe_client::{
        StripeClient, StripeEvent, StripeSubscription, WebhookSignatureError, expandable_id,
    },
};
use serde_json::Value;
use thiserror::Error;
use tracing::{error, info, warn};
use uuid::Uuid;

use super::plan_resolver::{PlanResolutionError, PlanResolver};
use crate::axum_http::error_responses::AppError;

/// Consecutive signature failures after which each further failure is logged at error level.
pub const SIGNATURE_FAILURE_ALERT_THRESHOLD: u32 = 3;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait StripeGateway: Send + Sync {
    async fn create_customer(
        &self,
        email: &str,
        name: Option<String>,
        user_id: Uuid,
    ) -> AnyResult<String>;

    async fn create_checkout_session(
        &self,
        price_id: &str,
        customer_id: &str,
        metadata: HashMap<String, String>,
    ) -> AnyResult<String>;

    async fn cancel_subscription_immediately(
        &self,
        subscription_id: &str,
    ) -> AnyResult<StripeSubscription>;

    async fn cancel_subscription_at_period_end(
        &self,
        subscription_id: &str,
    ) -> AnyResult<StripeSubscription>;

    fn verify_webhook_signature(
        &self,
        payload: &[u8],
        signature: &str,
    ) -> Result<StripeEvent, WebhookSignatureError>;
}

#[async_trait]
impl StripeGateway for StripeClient {
    async fn create_customer(
        &self,
        email: &str,
        name: Option<String>,
        user_id: Uuid,
    ) -> AnyResult<String> {
        self.create_customer(email, name.as_deref(), user_id).await
    }

    async fn create_checkout_session(
        &self,
        price_id: &str,
        customer_id: &str,
        metadata: HashMap<String, String>,
    ) -> AnyResult<String> {
        self.create_checkout_session(price_id, customer_id, metadata)
            .await
    }

    async fn cancel_subscription_immediately(
        &self,
        subscription_id: &str,
    ) -> AnyResult<StripeSubscription> {
        self.cancel_subscription_immediately(subscription_id).await
    }

    async fn cancel_subscription_at_period_end(
        &self,
        subscription_id: &str,
    ) -> AnyResult<StripeSubscription> {
        self.cancel_subscription_at_period_end(subscription_id)
            .await
    }

    fn verify_webhook_signature(
        &self,
        payload: &[u8],
        signature: &str,
    ) -> Result<StripeEvent, WebhookSignatureError> {
        self.verify_webhook_signature(payload, signature)
    }
}

#[derive(Debug, Error)]
pub enum BillingError {
    #[error("Stripe not configured")]
    NotConfigured,
    #[error("Plan is not configured for Stripe (missing price id)")]
    MissingPriceId,
    #[error("No active subscription to cancel")]
    NoSubscription,
    #[error("User not found")]
    UserNotFound,
    #[error("Missing Stripe-Signature header")]
    MissingSignatureHeader,
    #[error("Webhook Error: {0}")]
    Signature(#[from] WebhookSignatureError),
    #[error(transparent)]
    Plan(#[from] PlanResolutionError),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl BillingError {
    pub fn status_code(&self) -> axum::http::StatusCode {
        use axum::http::StatusCode;
        match self {
            BillingError::MissingPriceId
            | BillingError::NoSubscription
            | BillingError::MissingSignatureHeader
            | BillingError::Signature(_)
            | BillingError::Plan(PlanResolutionError::MissingSelector) => StatusCode::BAD_REQUEST,
            BillingError::UserNotFound | BillingError::Plan(PlanResolutionError::NotFound) => {
                StatusCode::NOT_FOUND
            }
            BillingError::NotConfigured
            | BillingError::Plan(PlanResolutionError::Internal(_))
            | BillingError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<BillingError> for AppError {
    fn from(err: BillingError) -> Self {
        match err {
            BillingError::NotConfigured => AppError::Unavailable(err.to_string()),
            BillingError::MissingPriceId
            | BillingError::NoSubscription
            | BillingError::MissingSignatureHeader
            | BillingError::Signature(_) => AppError::Validation(err.to_string()),
            BillingError::UserNotFound => AppError::NotFound(err.to_string()),
            BillingError::Plan(inner) => inner.into(),
            BillingError::Internal(inner) => AppError::Internal(inner),
        }
    }
}

pub type UseCaseResult<T> = std::result::Result<T, BillingError>;

pub struct BillingUseCase<U, P, M, Stripe>
where
    U: UserRepository + Send + Sync + 'static,
    P: PlanRepository + Send + Sync + 'static,
    M: MembershipRepository + Send + Sync + 'static,
    Stripe: StripeGateway + Send + Sync + 'static,
{
    user_repo: Arc<U>,
    membership_repo: Arc<M>,
    plan_resolver: PlanResolver<P>,
    stripe_client: Option<Arc<Stripe>>,
    signature_failures: AtomicU32,
}

impl<U, P, M, Stripe> BillingUseCase<U, P, M, Stripe>
where
    U: UserRepository + Send + Sync + 'static,
    P: PlanRepository + Send + Sync + 'static,
    M: MembershipRepository + Send + Sync + 'static,
    Stripe: StripeGateway + Send + Sync + 'static,
{
    pub fn new(
        user_repo: Arc<U>,
        plan_repo: Arc<P>,
        membership_repo: Arc<M>,
        stripe_client: Option<Arc<Stripe>>,
    ) -> Self {
        Self {
            user_repo,
            membership_repo,
            plan_resolver: PlanResolver::new(plan_repo),
            stripe_client,
            signature_failures: AtomicU32::new(0),
        }
    }

    fn stripe(&self) -> UseCaseResult<&Stripe> {
        self.stripe_client
            .as_deref()
            .ok_or(BillingError::NotConfigured)
    }

    pub async fn create_checkout_session(
        &self,
        user_id: Uuid,
        selector: &PlanSelectorModel,
    ) -> UseCaseResult<String> {
        let stripe = self.stripe()?;
        let plan = self.plan_resolver.resolve(selector).await?;
        let price_id = plan
            .stripe_price_id
            .clone()
            .ok_or(BillingError::MissingPriceId)?;

        let user = self
            .user_repo
            .find_by_id(user_id)
            .await
            .map_err(|err| {
                error!(%user_id, db_error = ?err, "billing: failed to load user");
                BillingError::Internal(err)
            })?
            .ok_or(BillingError::UserNotFound)?;

        let customer_id = match user.stripe_customer_id.filter(|id| !id.is_empty()) {
            Some(customer_id) => customer_id,
            None => {
                let created = stripe
                    .create_customer(&user.email, user.full_name.clone(), user_id)
                    .await
                    .map_err(|err| {
                        error!(%user_id, stripe_error = ?err, "billing: failed to create customer");
                        BillingError::Internal(err)
                    })?;
                let stored = self
                    .user_repo
                    .attach_stripe_customer(user_id, &created)
                    .await
                    .map_err(|err| {
                        error!(%user_id, db_error = ?err, "billing: failed to store customer id");
                        BillingError::Internal(err)
                    })?;
                info!(%user_id, customer_id = %stored, "billing: customer attached");
                stored
            }
        };

        let metadata = HashMap::from([
            ("userId".to_string(), user_id.to_string()),
            ("planId".to_string(), plan.id.to_string()),
        ]);

        let url = stripe
            .create_checkout_session(&price_id, &customer_id, metadata)
            .await
            .map_err(|err| {
                error!(%user_id, plan_id = %plan.id, stripe_error = ?err, "billing: failed to create checkout session");
                BillingError::Internal(err)
            })?;

        info!(%user_id, plan_id = %plan.id, "billing: checkout session created");
        Ok(url)
    }

    pub async fn cancel_subscription(
        &self,
        user_id: Uuid,
        mode: CancelMode,
    ) -> UseCaseResult<CancellationDto> {
        let stripe = self.stripe()?;
        let user = self
            .user_repo
            .find_by_id(user_id)
            .await
            .map_err(|err| {
                error!(%user_id, db_error = ?err, "billing: failed to load user");
                BillingError::Internal(err)
            })?
            .ok_or(BillingError::NoSubscription)?;
        let subscription_id = user
            .stripe_subscription_id
            .filter(|id| !id.is_empty())
            .ok_or(BillingError::NoSubscription)?;

        let updated = match mode {
            CancelMode::Immediate => stripe.cancel_subscription_immediately(&subscription_id).await,
            CancelMode::PeriodEnd => {
                stripe
                    .cancel_subscription_at_period_end(&subscription_id)
                    .await
            }
        }
        .map_err(|err| {
            error!(%user_id, %subscription_id, %mode, stripe_error = ?err, "billing: failed to cancel subscription");
            BillingError::Internal(err)
        })?;

        let status = match mode {
            CancelMode::Immediate => MembershipStatus::Canceled,
            CancelMode::PeriodEnd => MembershipStatus::from_provider_status(&updated.status),
        }
        .to_string();

        let stripe_object_id = if updated.id.is_empty() {
            subscription_id
        } else {
            updated.id
        };
        let event = MembershipEventDraft {
            event_type: mode.event_type().to_string(),
            status: Some(status.clone()),
            stripe_object_id: Some(stripe_object_id),
            amount_minor: None,
            currency: None,
            raw: updated.raw,
        };

        self.membership_repo
            .set_status_with_event(user_id, status.clone(), event)
            .await
            .map_err(|err| {
                error!(%user_id, db_error = ?err, "billing: failed to store cancellation");
                BillingError::Internal(err)
            })?;

        info!(%user_id, %mode, %status, "billing: cancellation processed");
        Ok(CancellationDto {
            message: "Cancellation processed".to_string(),
            status,
            mode,
        })
    }

    /// Verifies and applies one webhook delivery. Unknown event types are accepted and ignored.
    pub async fn handle_webhook(
        &self,
        payload: &[u8],
        signature: Option<&str>,
    ) -> UseCaseResult<()> {
        let stripe = self.stripe()?;
        let signature = signature
            .filter(|value| !value.trim().is_empty())
            .ok_or_else(|| {
                warn!("billing: webhook without signature header");
                BillingError::MissingSignatureHeader
            })?;

        let event = match stripe.verify_webhook_signature(payload, signature) {
            Ok(event) => {
                self.signature_failures.store(0, Ordering::Relaxed);
                event
            }
            Err(err) => {
                self.record_signature_failure(&err);
                return Err(BillingError::Signature(err));
            }
        };

        let event_id = event.id.clone().unwrap_or_default();
        info!(%event_id, event_type = %event.type_, "billing: webhook received");

        match event.type_.as_str() {
            "checkout.session.completed" => self.on_checkout_completed(&event).await,
            "customer.subscription.created" | "customer.subscription.updated" => {
                let object = &event.data.object;
                let status = MembershipStatus::from_provider_status(
                    object.get("status").and_then(Value::as_str).unwrap_or_default(),
                )
                .to_string();
                let subscription_id = string_field(object, "id");
                let update = CustomerStatusUpdate {
                    subscription_id: subscription_id.clone(),
                    status: Some(status.clone()),
                };
                self.apply_to_customer(&event, update, Some(status), subscription_id, None)
                    .await
            }
            "customer.subscription.deleted" => {
                let object = &event.data.object;
                let status = MembershipStatus::Canceled.to_string();
                let update = CustomerStatusUpdate {
                    subscription_id: None,
                    status: Some(status.clone()),
                };
                self.apply_to_customer(&event, update, Some(status), string_field(object, "id"), None)
                    .await
            }
            "invoice.payment_failed" => {
                let object = &event.data.object;
                let status = MembershipStatus::PastDue.to_string();
                let update = CustomerStatusUpdate {
                    subscription_id: None,
                    status: Some(status.clone()),
                };
                self.apply_to_customer(
                    &event,
                    update,
                    Some(status),
                    string_field(object, "id"),
                    amount_of(object, "total"),
                )
                .await
            }
            "invoice.payment_succeeded" => {
                let object = &event.data.object;
                self.apply_to_customer(
                    &event,
                    CustomerStatusUpdate::default(),
                    Some(MembershipStatus::Active.to_string()),
                    string_field(object, "id"),
                    amount_of(object, "total"),
                )
                .await
            }
            other => {
                info!(%event_id, event_type = %other, "billing: webhook event ignored");
                Ok(())
            }
        }
    }

    fn record_signature_failure(&self, err: &WebhookSignatureError) {
        let failures = self.signature_failures.fetch_add(1, Ordering::Relaxed) + 1;
        if failures >= SIGNATURE_FAILURE_ALERT_THRESHOLD {
            error!(
                consecutive_failures = failures,
                reason = %err,
                "billing: webhook signature verification keeps failing"
            );
        } else {
            warn!(
                consecutive_failures = failures,
                reason = %err,
                "billing: webhook signature verification failed"
            );
        }
    }

    async fn on_checkout_completed(&self, event: &StripeEvent) -> UseCaseResult<()> {
        let session = &event.data.object;
        let metadata = session.get("metadata");
        let user_id = metadata
            .and_then(|m| m.get("userId"))
            .and_then(Value::as_str)
            .and_then(|raw| Uuid::parse_str(raw).ok());
        let customer_id = expandable_id(session.get("customer"));

        let (Some(user_id), Some(customer_id)) = (user_id, customer_id) else {
            warn!(
                event_id = ?event.id,
                "billing: checkout session without userId or customer, dropped"
            );
            return Ok(());
        };

        let subscription_id = expandable_id(session.get("subscription"));
        let plan_id = metadata
            .and_then(|m| m.get("planId"))
            .and_then(Value::as_str)
            .and_then(|raw| Uuid::parse_str(raw).ok());
        let status = MembershipStatus::Active.to_string();

        let (amount_minor, currency) = amount_of(session, "amount_total").unzip();
        let draft = MembershipEventDraft {
            event_type: event.type_.clone(),
            status: Some(status.clone()),
            stripe_object_id: subscription_id
                .clone()
                .or_else(|| string_field(session, "id")),
            amount_minor,
            currency: currency.flatten(),
            raw: session.clone(),
        };
        let completion = CheckoutCompletion {
            user_id,
            customer_id,
            subscription_id,
            plan_id,
            status,
        };

        let applied = self
            .membership_repo
            .complete_checkout(completion, draft)
            .await
            .map_err(|err| {
                error!(%user_id, db_error = ?err, "billing: failed to apply checkout completion");
                BillingError::Internal(err)
            })?;

        if applied {
            info!(%user_id, ?plan_id, "billing: checkout completed");
        } else {
            warn!(%user_id, "billing: checkout completed for unknown user, dropped");
        }
        Ok(())
    }

    async fn apply_to_customer(
        &self,
        event: &StripeEvent,
        update: CustomerStatusUpdate,
        event_status: Option<String>,
        stripe_object_id: Option<String>,
        amount: Option<(i64, Option<String>)>,
    ) -> UseCaseResult<()> {
        let Some(customer_id) = expandable_id(event.data.object.get("customer")) else {
            warn!(
                event_id = ?event.id,
                event_type = %event.type_,
                "billing: webhook object without customer, dropped"
            );
            return Ok(());
        };

        let (amount_minor, currency) = amount.unzip();
        let draft = MembershipEventDraft {
            event_type: event.type_.clone(),
            status: event_status,
            stripe_object_id,
            amount_minor,
            currency: currency.flatten(),
            raw: event.data.object.clone(),
        };

        let matched = self
            .membership_repo
            .apply_customer_event(&customer_id, update, draft)
            .await
            .map_err(|err| {
                error!(%customer_id, event_type = %event.type_, db_error = ?err, "billing: failed to apply webhook");
                BillingError::Internal(err)
            })?;

        match matched {
            Some(user_id) => {
                info!(%user_id, %customer_id, event_type = %event.type_, "billing: webhook applied");
            }
            None => {
                warn!(%customer_id, event_type = %event.type_, "billing: webhook for unknown customer, dropped");
            }
        }
        Ok(())
    }
}

fn string_field(object: &Value, key: &str) -> Option<String> {
    object
        .get(key)
        .and_then(Value::as_str)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}

/// Minor-unit amount and upper-cased currency. `None` when the amount is absent or zero.
fn amount_of(object: &Value, key: &str) -> Option<(i64, Option<String>)> {
    let amount = object.get(key).and_then(Value::as_i64).filter(|a| *a != 0)?;
    let currency = string_field(object, "currency").map(|c| c.to_uppercase());
    Some((amount, currency))
}
