use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::{
    entities::{membership_events::MembershipEventEntity, plans::PlanEntity},
    value_objects::{enums::cancel_modes::CancelMode, iam::UserDto},
};

/// Plan chosen by id or, failing that, by name.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanSelectorModel {
    pub plan_id: Option<Uuid>,
    pub plan_name: Option<String>,
}

impl PlanSelectorModel {
    pub fn plan_name(&self) -> Option<&str> {
        self.plan_name
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty())
    }

    pub fn is_empty(&self) -> bool {
        self.plan_id.is_none() && self.plan_name().is_none()
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CancelSubscriptionModel {
    #[serde(default)]
    pub mode: CancelMode,
}

/// An event-log row before the owning user is resolved.
#[derive(Debug, Clone, PartialEq)]
pub struct MembershipEventDraft {
    pub event_type: String,
    pub status: Option<String>,
    pub stripe_object_id: Option<String>,
    pub amount_minor: Option<i64>,
    pub currency: Option<String>,
    pub raw: serde_json::Value,
}

/// Column writes carried by a completed checkout. Absent ids leave stored values untouched.
#[derive(Debug, Clone, PartialEq)]
pub struct CheckoutCompletion {
    pub user_id: Uuid,
    pub customer_id: String,
    pub subscription_id: Option<String>,
    pub plan_id: Option<Uuid>,
    pub status: String,
}

/// Update addressed by billing-customer id. `None` fields are not written.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CustomerStatusUpdate {
    pub subscription_id: Option<String>,
    pub status: Option<String>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct PlanSummaryDto {
    pub id: Uuid,
    pub name: String,
    pub price_minor: i32,
    pub currency: String,
}

impl From<PlanEntity> for PlanSummaryDto {
    fn from(value: PlanEntity) -> Self {
        Self {
            id: value.id,
            name: value.name,
            price_minor: value.price_minor,
            currency: value.currency,
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct MeDto {
    pub user: UserDto,
    pub plan: Option<PlanSummaryDto>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct SubscribedDto {
    pub message: String,
    pub plan: PlanSummaryDto,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct MembershipEventDto {
    pub id: Uuid,
    pub event_type: String,
    pub status: Option<String>,
    pub stripe_object_id: Option<String>,
    pub amount_minor: Option<i64>,
    pub currency: Option<String>,
    pub occurred_at: DateTime<Utc>,
}

impl From<MembershipEventEntity> for MembershipEventDto {
    fn from(value: MembershipEventEntity) -> Self {
        Self {
            id: value.id,
            event_type: value.event_type,
            status: value.status,
            stripe_object_id: value.stripe_object_id,
            amount_minor: value.amount_minor,
            currency: value.currency,
            occurred_at: value.occurred_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct CancellationDto {
    pub message: String,
    pub status: String,
    pub mode: CancelMode,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn selector_reads_camel_case_keys() {
        let selector: PlanSelectorModel =
            serde_json::from_str(r#"{"planName":"  Premium "}"#).unwrap();

        assert_eq!(selector.plan_name(), Some("Premium"));
        assert!(selector.plan_id.is_none());
        assert!(!selector.is_empty());
    }

    #[test]
    fn blank_selector_is_empty() {
        let selector: PlanSelectorModel = serde_json::from_str(r#"{"planName":"   "}"#).unwrap();

        assert!(selector.is_empty());
    }

    #[test]
    fn cancel_mode_defaults_to_period_end() {
        let model: CancelSubscriptionModel = serde_json::from_str("{}").unwrap();
        assert_eq!(model.mode, CancelMode::PeriodEnd);

        let model: CancelSubscriptionModel =
            serde_json::from_str(r#"{"mode":"immediate"}"#).unwrap();
        assert_eq!(model.mode, CancelMode::Immediate);
    }
}
