use anyhow::Result;
use async_trait::async_trait;
use mockall::automock;
use uuid::Uuid;

use crate::domain::{
    entities::trainers::TrainerEntity,
    value_objects::catalog::{ClassSessionView, ScheduleWindow, TrainerSlotView},
};

#[automock]
#[async_trait]
pub trait CatalogRepository {
    /// Ordered by start time, annotated for `viewer_id`.
    async fn list_class_sessions(
        &self,
        window: ScheduleWindow,
        viewer_id: Uuid,
    ) -> Result<Vec<ClassSessionView>>;
    async fn list_trainer_slots(
        &self,
        window: ScheduleWindow,
        viewer_id: Uuid,
    ) -> Result<Vec<TrainerSlotView>>;
    async fn list_active_trainers(&self) -> Result<Vec<TrainerEntity>>;
}
