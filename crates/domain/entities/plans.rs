use chrono::{DateTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use crate::infra::db::postgres::schema::plans;

#[derive(Debug, Clone, PartialEq)]
pub struct PlanEntity {
    pub id: Uuid,
    pub name: String,
    pub price_minor: i32,
    pub currency: String,
    pub description: Option<String>,
    pub features: Vec<String>,
    pub highlighted: bool,
    pub stripe_price_id: Option<String>,
}

/// Raw row used for Diesel queries. Features stay as JSON until mapped.
#[derive(Debug, Clone, Identifiable, Selectable, Queryable)]
#[diesel(table_name = plans)]
pub struct PlanRow {
    pub id: Uuid,
    pub name: String,
    pub price_minor: i32,
    pub currency: String,
    pub description: Option<String>,
    pub features: serde_json::Value,
    pub highlighted: bool,
    pub stripe_price_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<PlanRow> for PlanEntity {
    fn from(value: PlanRow) -> Self {
        let features = serde_json::from_value(value.features).unwrap_or_default();

        Self {
            id: value.id,
            name: value.name,
            price_minor: value.price_minor,
            currency: value.currency,
            description: value.description,
            features,
            highlighted: value.highlighted,
            stripe_price_id: value.stripe_price_id.filter(|id| !id.trim().is_empty()),
        }
    }
}
