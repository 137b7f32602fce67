use anyhow::{Result, anyhow};
use async_trait::async_trait;
use chrono::Utc;
use diesel::result::{DatabaseErrorKind, Error as DieselError};
use diesel::{RunQueryDsl, insert_into, prelude::*, update};
use std::sync::Arc;
use uuid::Uuid;

use crate::domain;
use crate::infra::db::postgres::{postgres_connection::PgPoolSquad, schema::users};
use domain::{
    entities::users::{InsertUserEntity, UserEntity},
    repositories::users::UserRepository,
};

pub struct UserPostgres {
    db_pool: Arc<PgPoolSquad>,
}

impl UserPostgres {
    pub fn new(db_pool: Arc<PgPoolSquad>) -> Self {
        Self { db_pool }
    }
}

#[async_trait]
impl UserRepository for UserPostgres {
    async fn create_user(&self, new_user: InsertUserEntity) -> Result<Option<UserEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let inserted = insert_into(users::table)
            .values(&new_user)
            .returning(UserEntity::as_returning())
            .get_result::<UserEntity>(&mut conn);

        match inserted {
            Ok(user) => Ok(Some(user)),
            // Unique index on lower(email).
            Err(DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _)) => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<UserEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let user = users::table
            .filter(users::email.eq(email))
            .select(UserEntity::as_select())
            .first::<UserEntity>(&mut conn)
            .optional()?;

        Ok(user)
    }

    async fn find_by_id(&self, user_id: Uuid) -> Result<Option<UserEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let user = users::table
            .filter(users::id.eq(user_id))
            .select(UserEntity::as_select())
            .first::<UserEntity>(&mut conn)
            .optional()?;

        Ok(user)
    }

    async fn is_admin(&self, user_id: Uuid) -> Result<Option<bool>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let is_admin = users::table
            .filter(users::id.eq(user_id))
            .select(users::is_admin)
            .first::<bool>(&mut conn)
            .optional()?;

        Ok(is_admin)
    }

    async fn attach_stripe_customer(&self, user_id: Uuid, customer_id: &str) -> Result<String> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        update(
            users::table
                .filter(users::id.eq(user_id))
                .filter(users::stripe_customer_id.is_null()),
        )
        .set((
            users::stripe_customer_id.eq(customer_id),
            users::updated_at.eq(Utc::now()),
        ))
        .execute(&mut conn)?;

        let stored = users::table
            .filter(users::id.eq(user_id))
            .select(users::stripe_customer_id)
            .first::<Option<String>>(&mut conn)?;

        stored.ok_or_else(|| anyhow!("stripe customer id missing after attach for user {user_id}"))
    }
}
