use chrono::{DateTime, Utc};
use diesel::prelude::*;

use crate::infra::db::postgres::schema::jwt_blacklist;

#[derive(Debug, Clone, Insertable, Queryable, Selectable)]
#[diesel(table_name = jwt_blacklist)]
pub struct RevokedTokenEntity {
    pub jti: String,
    pub expires_at: DateTime<Utc>,
}
