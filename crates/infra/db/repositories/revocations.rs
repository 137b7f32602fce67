use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::{RunQueryDsl, delete, dsl::exists, insert_into, prelude::*, select};
use std::sync::Arc;

use crate::domain;
use crate::infra::db::postgres::{postgres_connection::PgPoolSquad, schema::jwt_blacklist};
use domain::{entities::jwt_blacklist::RevokedTokenEntity, repositories::revocations::RevocationRepository};

pub struct RevocationPostgres {
    db_pool: Arc<PgPoolSquad>,
}

impl RevocationPostgres {
    pub fn new(db_pool: Arc<PgPoolSquad>) -> Self {
        Self { db_pool }
    }
}

#[async_trait]
impl RevocationRepository for RevocationPostgres {
    async fn revoke(&self, jti: &str, expires_at: DateTime<Utc>) -> Result<()> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        insert_into(jwt_blacklist::table)
            .values(&RevokedTokenEntity {
                jti: jti.to_string(),
                expires_at,
            })
            .on_conflict(jwt_blacklist::jti)
            .do_nothing()
            .execute(&mut conn)?;

        Ok(())
    }

    async fn is_revoked(&self, jti: &str) -> Result<bool> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let revoked = select(exists(
            jwt_blacklist::table.filter(jwt_blacklist::jti.eq(jti)),
        ))
        .get_result::<bool>(&mut conn)?;

        Ok(revoked)
    }

    async fn purge_expired(&self, now: DateTime<Utc>) -> Result<usize> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let removed =
            delete(jwt_blacklist::table.filter(jwt_blacklist::expires_at.lt(now))).execute(&mut conn)?;

        Ok(removed)
    }
}
