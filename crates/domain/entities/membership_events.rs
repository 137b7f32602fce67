use chrono::{DateTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use crate::infra::db::postgres::schema::membership_events;

#[derive(Debug, Clone, Identifiable, Selectable, Queryable)]
#[diesel(table_name = membership_events)]
pub struct MembershipEventEntity {
    pub id: Uuid,
    pub user_id: Uuid,
    pub event_type: String,
    pub status: Option<String>,
    pub stripe_object_id: Option<String>,
    pub amount_minor: Option<i64>,
    pub currency: Option<String>,
    pub raw: serde_json::Value,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = membership_events)]
pub struct InsertMembershipEventEntity {
    pub user_id: Uuid,
    pub event_type: String,
    pub status: Option<String>,
    pub stripe_object_id: Option<String>,
    pub amount_minor: Option<i64>,
    pub currency: Option<String>,
    pub raw: serde_json::Value,
    pub occurred_at: DateTime<Utc>,
}
