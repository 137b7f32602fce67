use anyhow::Result;
use async_trait::async_trait;
use mockall::automock;
use uuid::Uuid;

use crate::domain::{
    entities::group_classes::{GroupClassEntity, InsertGroupClassEntity, UpdateGroupClassEntity},
    value_objects::group_classes::DeleteClassOutcome,
};

#[automock]
#[async_trait]
pub trait GroupClassRepository {
    async fn list_classes(&self) -> Result<Vec<GroupClassEntity>>;
    async fn create_class(&self, new_class: InsertGroupClassEntity) -> Result<GroupClassEntity>;
    async fn update_class(
        &self,
        class_id: Uuid,
        changes: UpdateGroupClassEntity,
    ) -> Result<Option<GroupClassEntity>>;
    /// Refuses while sessions still reference the class.
    async fn delete_class(&self, class_id: Uuid) -> Result<DeleteClassOutcome>;
}
