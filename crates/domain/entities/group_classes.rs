use chrono::{DateTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use crate::infra::db::postgres::schema::group_classes;

#[derive(Debug, Clone, PartialEq, Identifiable, Selectable, Queryable)]
#[diesel(table_name = group_classes)]
pub struct GroupClassEntity {
    pub id: Uuid,
    pub title: String,
    pub blurb: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Insertable)]
#[diesel(table_name = group_classes)]
pub struct InsertGroupClassEntity {
    pub title: String,
    pub blurb: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// `treat_none_as_null` so an omitted blurb clears the column, matching a full PUT.
#[derive(Debug, Clone, PartialEq, AsChangeset)]
#[diesel(table_name = group_classes, treat_none_as_null = true)]
pub struct UpdateGroupClassEntity {
    pub title: String,
    pub blurb: Option<String>,
    pub updated_at: DateTime<Utc>,
}
