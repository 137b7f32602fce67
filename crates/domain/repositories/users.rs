use anyhow::Result;
use async_trait::async_trait;
use mockall::automock;
use uuid::Uuid;

use crate::domain::entities::users::{InsertUserEntity, UserEntity};

#[automock]
#[async_trait]
pub trait UserRepository {
    /// `Ok(None)` when the email is already taken.
    async fn create_user(&self, new_user: InsertUserEntity) -> Result<Option<UserEntity>>;
    async fn find_by_email(&self, email: &str) -> Result<Option<UserEntity>>;
    async fn find_by_id(&self, user_id: Uuid) -> Result<Option<UserEntity>>;
    /// `Ok(None)` when the user does not exist.
    async fn is_admin(&self, user_id: Uuid) -> Result<Option<bool>>;
    /// Stores the billing-customer id only if none is set yet; returns the id now on record.
    async fn attach_stripe_customer(&self, user_id: Uuid, customer_id: &str) -> Result<String>;
}
