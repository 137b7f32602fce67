use chrono::{DateTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use crate::infra::db::postgres::schema::class_sessions;

#[derive(Debug, Clone, Identifiable, Selectable, Queryable)]
#[diesel(table_name = class_sessions)]
pub struct ClassSessionEntity {
    pub id: Uuid,
    pub class_id: Uuid,
    pub starts_at: DateTime<Utc>,
    pub duration_min: i32,
    pub capacity: i32,
    pub created_at: DateTime<Utc>,
}
