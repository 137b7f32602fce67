use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use mockall::automock;

#[automock]
#[async_trait]
pub trait RevocationRepository {
    /// Idempotent.
    async fn revoke(&self, jti: &str, expires_at: DateTime<Utc>) -> Result<()>;
    async fn is_revoked(&self, jti: &str) -> Result<bool>;
    /// Deletes records whose token has expired anyway; returns how many were removed.
    async fn purge_expired(&self, now: DateTime<Utc>) -> Result<usize>;
}
