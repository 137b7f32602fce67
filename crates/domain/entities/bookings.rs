use chrono::{DateTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use crate::infra::db::postgres::schema::{bookings, trainer_bookings};

#[derive(Debug, Clone, Identifiable, Selectable, Queryable)]
#[diesel(table_name = bookings)]
pub struct BookingEntity {
    pub id: Uuid,
    pub user_id: Uuid,
    pub session_id: Uuid,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = bookings)]
pub struct InsertBookingEntity {
    pub user_id: Uuid,
    pub session_id: Uuid,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Identifiable, Selectable, Queryable)]
#[diesel(table_name = trainer_bookings)]
pub struct TrainerBookingEntity {
    pub id: Uuid,
    pub user_id: Uuid,
    pub availability_id: Uuid,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = trainer_bookings)]
pub struct InsertTrainerBookingEntity {
    pub user_id: Uuid,
    pub availability_id: Uuid,
    pub status: String,
    pub created_at: DateTime<Utc>,
}
