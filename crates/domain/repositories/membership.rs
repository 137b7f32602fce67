use anyhow::Result;
use async_trait::async_trait;
use mockall::automock;
use uuid::Uuid;

use crate::domain::{
    entities::membership_events::MembershipEventEntity,
    value_objects::membership::{CheckoutCompletion, CustomerStatusUpdate, MembershipEventDraft},
};

/// Owns the status, plan and billing columns of users plus the event log.
#[automock]
#[async_trait]
pub trait MembershipRepository {
    /// Returns false when the user row is missing.
    async fn assign_plan(&self, user_id: Uuid, plan_id: Uuid, status: String) -> Result<bool>;
    /// Writes the completion and appends `event` in one transaction. False when the user is unknown.
    async fn complete_checkout(
        &self,
        completion: CheckoutCompletion,
        event: MembershipEventDraft,
    ) -> Result<bool>;
    /// Applies `update` to the user holding `customer_id` and appends `event` for them.
    /// `Ok(None)` when no local user matches; nothing is written then.
    async fn apply_customer_event(
        &self,
        customer_id: &str,
        update: CustomerStatusUpdate,
        event: MembershipEventDraft,
    ) -> Result<Option<Uuid>>;
    async fn set_status_with_event(
        &self,
        user_id: Uuid,
        status: String,
        event: MembershipEventDraft,
    ) -> Result<()>;
    /// Newest first.
    async fn list_events(&self, user_id: Uuid, limit: i64) -> Result<Vec<MembershipEventEntity>>;
}
