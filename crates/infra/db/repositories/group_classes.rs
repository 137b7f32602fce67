use anyhow::Result;
use async_trait::async_trait;
use diesel::{Connection, RunQueryDsl, delete, insert_into, prelude::*, update};
use std::sync::Arc;
use uuid::Uuid;

use crate::domain;
use crate::infra::db::postgres::{
    postgres_connection::PgPoolSquad,
    schema::{class_sessions, group_classes},
};
use domain::{
    entities::group_classes::{GroupClassEntity, InsertGroupClassEntity, UpdateGroupClassEntity},
    repositories::group_classes::GroupClassRepository,
    value_objects::group_classes::DeleteClassOutcome,
};

pub struct GroupClassPostgres {
    db_pool: Arc<PgPoolSquad>,
}

impl GroupClassPostgres {
    pub fn new(db_pool: Arc<PgPoolSquad>) -> Self {
        Self { db_pool }
    }
}

#[async_trait]
impl GroupClassRepository for GroupClassPostgres {
    async fn list_classes(&self) -> Result<Vec<GroupClassEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let classes = group_classes::table
            .order(group_classes::title.asc())
            .select(GroupClassEntity::as_select())
            .load::<GroupClassEntity>(&mut conn)?;

        Ok(classes)
    }

    async fn create_class(&self, new_class: InsertGroupClassEntity) -> Result<GroupClassEntity> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let created = insert_into(group_classes::table)
            .values(&new_class)
            .returning(GroupClassEntity::as_returning())
            .get_result::<GroupClassEntity>(&mut conn)?;

        Ok(created)
    }

    async fn update_class(
        &self,
        class_id: Uuid,
        changes: UpdateGroupClassEntity,
    ) -> Result<Option<GroupClassEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let updated = update(group_classes::table.filter(group_classes::id.eq(class_id)))
            .set(&changes)
            .returning(GroupClassEntity::as_returning())
            .get_result::<GroupClassEntity>(&mut conn)
            .optional()?;

        Ok(updated)
    }

    async fn delete_class(&self, class_id: Uuid) -> Result<DeleteClassOutcome> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let outcome = conn.transaction::<DeleteClassOutcome, diesel::result::Error, _>(|tx| {
            let exists = group_classes::table
                .filter(group_classes::id.eq(class_id))
                .select(group_classes::id)
                .for_update()
                .first::<Uuid>(tx)
                .optional()?;
            if exists.is_none() {
                return Ok(DeleteClassOutcome::NotFound);
            }

            let session_count = class_sessions::table
                .filter(class_sessions::class_id.eq(class_id))
                .count()
                .get_result::<i64>(tx)?;
            if session_count > 0 {
                return Ok(DeleteClassOutcome::HasSessions(session_count));
            }

            delete(group_classes::table.filter(group_classes::id.eq(class_id))).execute(tx)?;
            Ok(DeleteClassOutcome::Deleted)
        })?;

        Ok(outcome)
    }
}
