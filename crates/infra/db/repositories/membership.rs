use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;
use diesel::{Connection, PgConnection, RunQueryDsl, insert_into, prelude::*, update};
use std::sync::Arc;
use uuid::Uuid;

use crate::domain;
use crate::infra::db::postgres::{
    postgres_connection::PgPoolSquad,
    schema::{membership_events, users},
};
use domain::{
    entities::{
        membership_events::{InsertMembershipEventEntity, MembershipEventEntity},
        users::UpdateUserBillingEntity,
    },
    repositories::membership::MembershipRepository,
    value_objects::membership::{CheckoutCompletion, CustomerStatusUpdate, MembershipEventDraft},
};

pub struct MembershipPostgres {
    db_pool: Arc<PgPoolSquad>,
}

impl MembershipPostgres {
    pub fn new(db_pool: Arc<PgPoolSquad>) -> Self {
        Self { db_pool }
    }
}

fn append_event(
    conn: &mut PgConnection,
    user_id: Uuid,
    event: MembershipEventDraft,
) -> QueryResult<usize> {
    insert_into(membership_events::table)
        .values(&InsertMembershipEventEntity {
            user_id,
            event_type: event.event_type,
            status: event.status,
            stripe_object_id: event.stripe_object_id,
            amount_minor: event.amount_minor,
            currency: event.currency,
            raw: event.raw,
            occurred_at: Utc::now(),
        })
        .execute(conn)
}

#[async_trait]
impl MembershipRepository for MembershipPostgres {
    async fn assign_plan(&self, user_id: Uuid, plan_id: Uuid, status: String) -> Result<bool> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let updated = update(users::table.filter(users::id.eq(user_id)))
            .set((
                users::plan_id.eq(plan_id),
                users::membership_status.eq(status),
                users::updated_at.eq(Utc::now()),
            ))
            .execute(&mut conn)?;

        Ok(updated > 0)
    }

    async fn complete_checkout(
        &self,
        completion: CheckoutCompletion,
        event: MembershipEventDraft,
    ) -> Result<bool> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let applied = conn.transaction::<bool, diesel::result::Error, _>(|tx| {
            let current = users::table
                .filter(users::id.eq(completion.user_id))
                .select((
                    users::stripe_customer_id,
                    users::stripe_subscription_id,
                    users::plan_id,
                ))
                .for_update()
                .first::<(Option<String>, Option<String>, Option<Uuid>)>(tx)
                .optional()?;
            let Some((customer_id, subscription_id, plan_id)) = current else {
                return Ok(false);
            };

            // A stored customer id wins; incoming subscription and plan ids win when present.
            update(users::table.filter(users::id.eq(completion.user_id)))
                .set((
                    users::stripe_customer_id.eq(customer_id.or(Some(completion.customer_id))),
                    users::stripe_subscription_id.eq(completion.subscription_id.or(subscription_id)),
                    users::plan_id.eq(completion.plan_id.or(plan_id)),
                    users::membership_status.eq(completion.status),
                    users::updated_at.eq(Utc::now()),
                ))
                .execute(tx)?;

            append_event(tx, completion.user_id, event)?;
            Ok(true)
        })?;

        Ok(applied)
    }

    async fn apply_customer_event(
        &self,
        customer_id: &str,
        status_update: CustomerStatusUpdate,
        event: MembershipEventDraft,
    ) -> Result<Option<Uuid>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let matched = conn.transaction::<Option<Uuid>, diesel::result::Error, _>(|tx| {
            let target = users::table.filter(users::stripe_customer_id.eq(customer_id));

            let user_ids: Vec<Uuid> =
                if status_update.subscription_id.is_none() && status_update.status.is_none() {
                    target.select(users::id).for_update().load::<Uuid>(tx)?
                } else {
                    update(target)
                        .set(&UpdateUserBillingEntity {
                            stripe_subscription_id: status_update.subscription_id,
                            membership_status: status_update.status,
                            updated_at: Utc::now(),
                        })
                        .returning(users::id)
                        .get_results::<Uuid>(tx)?
                };

            let Some(user_id) = user_ids.into_iter().min() else {
                return Ok(None);
            };

            append_event(tx, user_id, event)?;
            Ok(Some(user_id))
        })?;

        Ok(matched)
    }

    async fn set_status_with_event(
        &self,
        user_id: Uuid,
        status: String,
        event: MembershipEventDraft,
    ) -> Result<()> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        conn.transaction::<(), diesel::result::Error, _>(|tx| {
            update(users::table.filter(users::id.eq(user_id)))
                .set((
                    users::membership_status.eq(status),
                    users::updated_at.eq(Utc::now()),
                ))
                .execute(tx)?;

            append_event(tx, user_id, event)?;
            Ok(())
        })?;

        Ok(())
    }

    async fn list_events(&self, user_id: Uuid, limit: i64) -> Result<Vec<MembershipEventEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let events = membership_events::table
            .filter(membership_events::user_id.eq(user_id))
            .order((membership_events::occurred_at.desc(), membership_events::id.desc()))
            .limit(limit)
            .select(MembershipEventEntity::as_select())
            .load::<MembershipEventEntity>(&mut conn)?;

        Ok(events)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::db::postgres::test_support::{scratch_pool, seed_user, test_database_url};
    use serde_json::json;

    fn active_update_event() -> MembershipEventDraft {
        MembershipEventDraft {
            event_type: "customer.subscription.updated".to_string(),
            status: Some("active".to_string()),
            stripe_object_id: Some("sub_456".to_string()),
            amount_minor: None,
            currency: None,
            raw: json!({ "id": "sub_456", "status": "active" }),
        }
    }

    #[tokio::test]
    #[ignore = "requires TEST_DATABASE_URL pointing at a disposable PostgreSQL database"]
    async fn repeated_subscription_update_keeps_status_and_logs_each_delivery() {
        let (_schema, pool) = scratch_pool(&test_database_url());

        let user_id = {
            let mut conn = pool.get().unwrap();
            let user_id = seed_user(&mut conn, "member@example.com");
            update(users::table.filter(users::id.eq(user_id)))
                .set(users::stripe_customer_id.eq("cus_123"))
                .execute(&mut conn)
                .unwrap();
            user_id
        };
        let repo = MembershipPostgres::new(Arc::clone(&pool));

        for _ in 0..2 {
            let matched = repo
                .apply_customer_event(
                    "cus_123",
                    CustomerStatusUpdate {
                        subscription_id: Some("sub_456".to_string()),
                        status: Some("active".to_string()),
                    },
                    active_update_event(),
                )
                .await
                .unwrap();
            assert_eq!(matched, Some(user_id));

            let mut conn = pool.get().unwrap();
            let status: String = users::table
                .filter(users::id.eq(user_id))
                .select(users::membership_status)
                .first(&mut conn)
                .unwrap();
            assert_eq!(status, "active");
        }

        let events = repo.list_events(user_id, 10).await.unwrap();
        assert_eq!(events.len(), 2);
        assert!(events.iter().all(|event| event.status.as_deref() == Some("active")));
    }
}
