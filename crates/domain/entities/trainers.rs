use chrono::{DateTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use crate::infra::db::postgres::schema::{trainer_availability, trainers};

#[derive(Debug, Clone, PartialEq, Identifiable, Selectable, Queryable)]
#[diesel(table_name = trainers)]
pub struct TrainerEntity {
    pub id: Uuid,
    pub name: String,
    pub bio: Option<String>,
    pub max_clients: i32,
    pub active: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Identifiable, Selectable, Queryable)]
#[diesel(table_name = trainer_availability)]
pub struct TrainerAvailabilityEntity {
    pub id: Uuid,
    pub trainer_id: Uuid,
    pub starts_at: DateTime<Utc>,
    pub duration_min: i32,
    pub capacity: i32,
    pub created_at: DateTime<Utc>,
}
