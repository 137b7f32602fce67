use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use mockall::automock;
use uuid::Uuid;

use crate::domain::value_objects::{
    bookings::{BookOutcome, CancelOutcome, ClassBookingView, TrainerBookingView},
    enums::resource_kinds::ResourceKind,
};

/// The only writer of booking rows.
#[automock]
#[async_trait]
pub trait BookingRepository {
    /// Check-and-write is atomic per instance.
    async fn book(
        &self,
        kind: ResourceKind,
        user_id: Uuid,
        instance_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<BookOutcome>;
    async fn cancel(
        &self,
        kind: ResourceKind,
        user_id: Uuid,
        instance_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<CancelOutcome>;
    async fn list_class_bookings(&self, user_id: Uuid) -> Result<Vec<ClassBookingView>>;
    async fn list_trainer_bookings(&self, user_id: Uuid) -> Result<Vec<TrainerBookingView>>;
}
