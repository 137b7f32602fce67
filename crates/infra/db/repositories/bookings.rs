use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::{Connection, PgConnection, RunQueryDsl, insert_into, prelude::*, update};
use std::sync::Arc;
use tokio::task;
use uuid::Uuid;

use crate::domain;
use crate::infra::db::postgres::{
    postgres_connection::PgPoolSquad,
    schema::{bookings, class_sessions, group_classes, trainer_availability, trainer_bookings, trainers},
};
use domain::{
    entities::{
        bookings::{BookingEntity, InsertBookingEntity, InsertTrainerBookingEntity, TrainerBookingEntity},
        class_sessions::ClassSessionEntity,
        group_classes::GroupClassEntity,
        trainers::{TrainerAvailabilityEntity, TrainerEntity},
    },
    repositories::bookings::BookingRepository,
    value_objects::{
        bookings::{
            BookOutcome, BookingDecision, CancelDecision, CancelOutcome, ClassBookingView,
            InstanceSnapshot, TrainerBookingView, decide_book, decide_cancel,
        },
        enums::{booking_statuses::BookingStatus, resource_kinds::ResourceKind},
    },
};

pub struct BookingPostgres {
    db_pool: Arc<PgPoolSquad>,
}

impl BookingPostgres {
    pub fn new(db_pool: Arc<PgPoolSquad>) -> Self {
        Self { db_pool }
    }
}

/// Locks the instance row and reads what `decide_book` needs. Must run inside a transaction.
fn lock_snapshot(
    conn: &mut PgConnection,
    kind: ResourceKind,
    user_id: Uuid,
    instance_id: Uuid,
) -> QueryResult<Option<InstanceSnapshot>> {
    let booked = BookingStatus::Booked.to_string();

    let (instance, booked_count, existing) = match kind {
        ResourceKind::ClassSession => {
            let instance = class_sessions::table
                .filter(class_sessions::id.eq(instance_id))
                .select((class_sessions::starts_at, class_sessions::capacity))
                .for_update()
                .first::<(DateTime<Utc>, i32)>(conn)
                .optional()?;
            let Some(instance) = instance else {
                return Ok(None);
            };

            let booked_count = bookings::table
                .filter(bookings::session_id.eq(instance_id))
                .filter(bookings::status.eq(&booked))
                .count()
                .get_result::<i64>(conn)?;

            let existing = bookings::table
                .filter(bookings::user_id.eq(user_id))
                .filter(bookings::session_id.eq(instance_id))
                .select(bookings::status)
                .first::<String>(conn)
                .optional()?;

            (instance, booked_count, existing)
        }
        ResourceKind::TrainerSlot => {
            let instance = trainer_availability::table
                .filter(trainer_availability::id.eq(instance_id))
                .select((trainer_availability::starts_at, trainer_availability::capacity))
                .for_update()
                .first::<(DateTime<Utc>, i32)>(conn)
                .optional()?;
            let Some(instance) = instance else {
                return Ok(None);
            };

            let booked_count = trainer_bookings::table
                .filter(trainer_bookings::availability_id.eq(instance_id))
                .filter(trainer_bookings::status.eq(&booked))
                .count()
                .get_result::<i64>(conn)?;

            let existing = trainer_bookings::table
                .filter(trainer_bookings::user_id.eq(user_id))
                .filter(trainer_bookings::availability_id.eq(instance_id))
                .select(trainer_bookings::status)
                .first::<String>(conn)
                .optional()?;

            (instance, booked_count, existing)
        }
    };

    let (starts_at, capacity) = instance;
    Ok(Some(InstanceSnapshot {
        starts_at,
        capacity,
        booked_count,
        existing_status: existing.as_deref().and_then(BookingStatus::from_str),
    }))
}

fn insert_booking(
    conn: &mut PgConnection,
    kind: ResourceKind,
    user_id: Uuid,
    instance_id: Uuid,
    now: DateTime<Utc>,
) -> QueryResult<usize> {
    let status = BookingStatus::Booked.to_string();
    match kind {
        ResourceKind::ClassSession => insert_into(bookings::table)
            .values(&InsertBookingEntity {
                user_id,
                session_id: instance_id,
                status,
                created_at: now,
            })
            .execute(conn),
        ResourceKind::TrainerSlot => insert_into(trainer_bookings::table)
            .values(&InsertTrainerBookingEntity {
                user_id,
                availability_id: instance_id,
                status,
                created_at: now,
            })
            .execute(conn),
    }
}

/// Moves the caller's row from `from` to `to`; returns affected rows.
fn transition_booking(
    conn: &mut PgConnection,
    kind: ResourceKind,
    user_id: Uuid,
    instance_id: Uuid,
    from: BookingStatus,
    to: BookingStatus,
) -> QueryResult<usize> {
    match kind {
        ResourceKind::ClassSession => update(
            bookings::table
                .filter(bookings::user_id.eq(user_id))
                .filter(bookings::session_id.eq(instance_id))
                .filter(bookings::status.eq(from.to_string())),
        )
        .set(bookings::status.eq(to.to_string()))
        .execute(conn),
        ResourceKind::TrainerSlot => update(
            trainer_bookings::table
                .filter(trainer_bookings::user_id.eq(user_id))
                .filter(trainer_bookings::availability_id.eq(instance_id))
                .filter(trainer_bookings::status.eq(from.to_string())),
        )
        .set(trainer_bookings::status.eq(to.to_string()))
        .execute(conn),
    }
}

fn load_starts_at(
    conn: &mut PgConnection,
    kind: ResourceKind,
    instance_id: Uuid,
) -> QueryResult<Option<DateTime<Utc>>> {
    match kind {
        ResourceKind::ClassSession => class_sessions::table
            .filter(class_sessions::id.eq(instance_id))
            .select(class_sessions::starts_at)
            .first::<DateTime<Utc>>(conn)
            .optional(),
        ResourceKind::TrainerSlot => trainer_availability::table
            .filter(trainer_availability::id.eq(instance_id))
            .select(trainer_availability::starts_at)
            .first::<DateTime<Utc>>(conn)
            .optional(),
    }
}

#[async_trait]
impl BookingRepository for BookingPostgres {
    async fn book(
        &self,
        kind: ResourceKind,
        user_id: Uuid,
        instance_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<BookOutcome> {
        // Waiting on the row lock blocks, so the transaction runs on the blocking pool.
        let db_pool = Arc::clone(&self.db_pool);

        Ok(task::spawn_blocking(move || -> Result<BookOutcome> {
            let mut conn = db_pool.get()?;

            let outcome = conn.transaction::<BookOutcome, diesel::result::Error, _>(|tx| {
                let Some(snapshot) = lock_snapshot(tx, kind, user_id, instance_id)? else {
                    return Ok(BookOutcome::InstanceNotFound);
                };

                match decide_book(&snapshot, now) {
                    BookingDecision::Rejected(reason) => Ok(BookOutcome::Rejected(reason)),
                    BookingDecision::Reactivate => {
                        transition_booking(
                            tx,
                            kind,
                            user_id,
                            instance_id,
                            BookingStatus::Canceled,
                            BookingStatus::Booked,
                        )?;
                        Ok(BookOutcome::Reactivated)
                    }
                    BookingDecision::Insert => {
                        insert_booking(tx, kind, user_id, instance_id, now)?;
                        Ok(BookOutcome::Inserted)
                    }
                }
            })?;

            Ok(outcome)
        })
        .await??)
    }

    async fn cancel(
        &self,
        kind: ResourceKind,
        user_id: Uuid,
        instance_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<CancelOutcome> {
        let db_pool = Arc::clone(&self.db_pool);

        Ok(task::spawn_blocking(move || -> Result<CancelOutcome> {
            let mut conn = db_pool.get()?;

            let outcome = conn.transaction::<CancelOutcome, diesel::result::Error, _>(|tx| {
                let Some(starts_at) = load_starts_at(tx, kind, instance_id)? else {
                    return Ok(CancelOutcome::InstanceNotFound);
                };

                match decide_cancel(starts_at, now) {
                    CancelDecision::Rejected(reason) => Ok(CancelOutcome::Rejected(reason)),
                    CancelDecision::Cancel => {
                        let released = transition_booking(
                            tx,
                            kind,
                            user_id,
                            instance_id,
                            BookingStatus::Booked,
                            BookingStatus::Canceled,
                        )?;
                        Ok(CancelOutcome::Canceled {
                            released: released > 0,
                        })
                    }
                }
            })?;

            Ok(outcome)
        })
        .await??)
    }

    async fn list_class_bookings(&self, user_id: Uuid) -> Result<Vec<ClassBookingView>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let rows = bookings::table
            .inner_join(class_sessions::table.inner_join(group_classes::table))
            .filter(bookings::user_id.eq(user_id))
            .filter(bookings::status.eq(BookingStatus::Booked.to_string()))
            .order((class_sessions::starts_at.asc(), bookings::id.asc()))
            .select((
                BookingEntity::as_select(),
                ClassSessionEntity::as_select(),
                GroupClassEntity::as_select(),
            ))
            .load::<(BookingEntity, ClassSessionEntity, GroupClassEntity)>(&mut conn)?;

        Ok(rows
            .into_iter()
            .map(|(booking, session, class)| ClassBookingView {
                id: booking.id,
                session_id: booking.session_id,
                status: booking.status,
                created_at: booking.created_at,
                starts_at: session.starts_at,
                duration_min: session.duration_min,
                capacity: session.capacity,
                class_id: class.id,
                class_title: class.title,
                class_blurb: class.blurb,
                booking_type: "class",
            })
            .collect())
    }

    async fn list_trainer_bookings(&self, user_id: Uuid) -> Result<Vec<TrainerBookingView>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let rows = trainer_bookings::table
            .inner_join(trainer_availability::table.inner_join(trainers::table))
            .filter(trainer_bookings::user_id.eq(user_id))
            .filter(trainer_bookings::status.eq(BookingStatus::Booked.to_string()))
            .order((trainer_availability::starts_at.asc(), trainer_bookings::id.asc()))
            .select((
                TrainerBookingEntity::as_select(),
                TrainerAvailabilityEntity::as_select(),
                TrainerEntity::as_select(),
            ))
            .load::<(TrainerBookingEntity, TrainerAvailabilityEntity, TrainerEntity)>(&mut conn)?;

        Ok(rows
            .into_iter()
            .map(|(booking, slot, trainer)| TrainerBookingView {
                id: booking.id,
                availability_id: booking.availability_id,
                status: booking.status,
                created_at: booking.created_at,
                starts_at: slot.starts_at,
                duration_min: slot.duration_min,
                capacity: slot.capacity,
                trainer_id: trainer.id,
                trainer_name: trainer.name,
                trainer_bio: trainer.bio,
                booking_type: "trainer",
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::value_objects::bookings::BookingRejection;
    use crate::infra::db::postgres::test_support::{scratch_pool, seed_user, test_database_url};
    use chrono::Duration;

    fn seed_session(conn: &mut PgConnection, capacity: i32, starts_at: DateTime<Utc>) -> Uuid {
        let class_id: Uuid = insert_into(group_classes::table)
            .values(group_classes::title.eq("Spin"))
            .returning(group_classes::id)
            .get_result(conn)
            .expect("seed class");

        insert_into(class_sessions::table)
            .values((
                class_sessions::class_id.eq(class_id),
                class_sessions::starts_at.eq(starts_at),
                class_sessions::duration_min.eq(45),
                class_sessions::capacity.eq(capacity),
            ))
            .returning(class_sessions::id)
            .get_result(conn)
            .expect("seed session")
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    #[ignore = "requires TEST_DATABASE_URL pointing at a disposable PostgreSQL database"]
    async fn concurrent_bookers_never_exceed_capacity() {
        let (_schema, pool) = scratch_pool(&test_database_url());

        let (session_id, holder, racers) = {
            let mut conn = pool.get().unwrap();
            let session_id = seed_session(&mut conn, 2, Utc::now() + Duration::days(1));
            let holder = seed_user(&mut conn, "holder@example.com");
            let racers: Vec<Uuid> = (0..2)
                .map(|i| seed_user(&mut conn, &format!("racer{i}@example.com")))
                .collect();
            (session_id, holder, racers)
        };

        let repo = Arc::new(BookingPostgres::new(Arc::clone(&pool)));
        let first = repo
            .book(ResourceKind::ClassSession, holder, session_id, Utc::now())
            .await
            .unwrap();
        assert_eq!(first, BookOutcome::Inserted);

        // One seat left, two bookers.
        let handles: Vec<_> = racers
            .into_iter()
            .map(|user_id| {
                let repo = Arc::clone(&repo);
                tokio::spawn(async move {
                    repo.book(ResourceKind::ClassSession, user_id, session_id, Utc::now())
                        .await
                        .unwrap()
                })
            })
            .collect();

        let mut outcomes = Vec::new();
        for handle in handles {
            outcomes.push(handle.await.unwrap());
        }

        assert_eq!(outcomes.iter().filter(|o| **o == BookOutcome::Inserted).count(), 1);
        assert_eq!(
            outcomes
                .iter()
                .filter(|o| **o == BookOutcome::Rejected(BookingRejection::Full))
                .count(),
            1
        );

        let mut conn = pool.get().unwrap();
        let booked = bookings::table
            .filter(bookings::session_id.eq(session_id))
            .filter(bookings::status.eq("booked"))
            .count()
            .get_result::<i64>(&mut conn)
            .unwrap();
        assert_eq!(booked, 2);
    }

    #[tokio::test]
    #[ignore = "requires TEST_DATABASE_URL pointing at a disposable PostgreSQL database"]
    async fn cancel_then_rebook_reuses_the_same_row() {
        let (_schema, pool) = scratch_pool(&test_database_url());

        let (session_id, user_id) = {
            let mut conn = pool.get().unwrap();
            (
                seed_session(&mut conn, 5, Utc::now() + Duration::days(1)),
                seed_user(&mut conn, "member@example.com"),
            )
        };
        let repo = BookingPostgres::new(Arc::clone(&pool));
        let kind = ResourceKind::ClassSession;

        assert_eq!(repo.book(kind, user_id, session_id, Utc::now()).await.unwrap(), BookOutcome::Inserted);
        assert_eq!(
            repo.book(kind, user_id, session_id, Utc::now()).await.unwrap(),
            BookOutcome::Rejected(BookingRejection::AlreadyBooked)
        );
        assert_eq!(
            repo.cancel(kind, user_id, session_id, Utc::now()).await.unwrap(),
            CancelOutcome::Canceled { released: true }
        );
        assert_eq!(
            repo.cancel(kind, user_id, session_id, Utc::now()).await.unwrap(),
            CancelOutcome::Canceled { released: false }
        );
        assert_eq!(repo.book(kind, user_id, session_id, Utc::now()).await.unwrap(), BookOutcome::Reactivated);

        let mut conn = pool.get().unwrap();
        let rows = bookings::table
            .filter(bookings::user_id.eq(user_id))
            .filter(bookings::session_id.eq(session_id))
            .count()
            .get_result::<i64>(&mut conn)
            .unwrap();
        assert_eq!(rows, 1);

        let listed = repo.list_class_bookings(user_id).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].booking_type, "class");
    }

    #[tokio::test]
    #[ignore = "requires TEST_DATABASE_URL pointing at a disposable PostgreSQL database"]
    async fn canceled_seat_is_rebookable_by_a_waiting_member() {
        let (_schema, pool) = scratch_pool(&test_database_url());

        let (session_id, a, b, c) = {
            let mut conn = pool.get().unwrap();
            (
                seed_session(&mut conn, 2, Utc::now() + Duration::days(1)),
                seed_user(&mut conn, "a@example.com"),
                seed_user(&mut conn, "b@example.com"),
                seed_user(&mut conn, "c@example.com"),
            )
        };
        let repo = BookingPostgres::new(Arc::clone(&pool));
        let kind = ResourceKind::ClassSession;

        assert_eq!(repo.book(kind, a, session_id, Utc::now()).await.unwrap(), BookOutcome::Inserted);
        assert_eq!(repo.book(kind, b, session_id, Utc::now()).await.unwrap(), BookOutcome::Inserted);
        assert_eq!(
            repo.book(kind, c, session_id, Utc::now()).await.unwrap(),
            BookOutcome::Rejected(BookingRejection::Full)
        );

        assert_eq!(
            repo.cancel(kind, a, session_id, Utc::now()).await.unwrap(),
            CancelOutcome::Canceled { released: true }
        );
        assert_eq!(repo.book(kind, c, session_id, Utc::now()).await.unwrap(), BookOutcome::Inserted);

        // A's canceled row does not jump the queue once the session is full again.
        assert_eq!(
            repo.book(kind, a, session_id, Utc::now()).await.unwrap(),
            BookOutcome::Rejected(BookingRejection::Full)
        );

        let mut conn = pool.get().unwrap();
        let mut booked: Vec<Uuid> = bookings::table
            .filter(bookings::session_id.eq(session_id))
            .filter(bookings::status.eq("booked"))
            .select(bookings::user_id)
            .load(&mut conn)
            .unwrap();
        booked.sort();
        let mut expected = vec![b, c];
        expected.sort();
        assert_eq!(booked, expected);
    }
}
