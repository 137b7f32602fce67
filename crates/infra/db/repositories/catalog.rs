use anyhow::Result;
use async_trait::async_trait;
use diesel::{RunQueryDsl, dsl::count_star, prelude::*};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use uuid::Uuid;

use crate::domain;
use crate::infra::db::postgres::{
    postgres_connection::PgPoolSquad,
    schema::{bookings, class_sessions, group_classes, trainer_availability, trainer_bookings, trainers},
};
use domain::{
    entities::{
        class_sessions::ClassSessionEntity,
        group_classes::GroupClassEntity,
        trainers::{TrainerAvailabilityEntity, TrainerEntity},
    },
    repositories::catalog::CatalogRepository,
    value_objects::{
        catalog::{ClassSessionView, ScheduleWindow, TrainerSlotView},
        enums::booking_statuses::BookingStatus,
    },
};

pub struct CatalogPostgres {
    db_pool: Arc<PgPoolSquad>,
}

impl CatalogPostgres {
    pub fn new(db_pool: Arc<PgPoolSquad>) -> Self {
        Self { db_pool }
    }
}

#[async_trait]
impl CatalogRepository for CatalogPostgres {
    async fn list_class_sessions(
        &self,
        window: ScheduleWindow,
        viewer_id: Uuid,
    ) -> Result<Vec<ClassSessionView>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;
        let booked = BookingStatus::Booked.to_string();

        // One snapshot for instances and their counts.
        let views = conn
            .build_transaction()
            .read_only()
            .repeatable_read()
            .run::<_, diesel::result::Error, _>(|tx| {
                let mut query = class_sessions::table
                    .inner_join(group_classes::table)
                    .select((ClassSessionEntity::as_select(), GroupClassEntity::as_select()))
                    .order((class_sessions::starts_at.asc(), class_sessions::id.asc()))
                    .into_boxed();
                if let Some(from) = window.from {
                    query = query.filter(class_sessions::starts_at.ge(from));
                }
                if let Some(to) = window.to {
                    query = query.filter(class_sessions::starts_at.le(to));
                }
                let rows = query.load::<(ClassSessionEntity, GroupClassEntity)>(tx)?;
                if rows.is_empty() {
                    return Ok(Vec::new());
                }

                let ids: Vec<Uuid> = rows.iter().map(|(session, _)| session.id).collect();

                let counts: HashMap<Uuid, i64> = bookings::table
                    .filter(bookings::session_id.eq_any(&ids))
                    .filter(bookings::status.eq(&booked))
                    .group_by(bookings::session_id)
                    .select((bookings::session_id, count_star()))
                    .load::<(Uuid, i64)>(tx)?
                    .into_iter()
                    .collect();

                let mine: HashSet<Uuid> = bookings::table
                    .filter(bookings::user_id.eq(viewer_id))
                    .filter(bookings::session_id.eq_any(&ids))
                    .filter(bookings::status.eq(&booked))
                    .select(bookings::session_id)
                    .load::<Uuid>(tx)?
                    .into_iter()
                    .collect();

                Ok(rows
                    .into_iter()
                    .map(|(session, class)| ClassSessionView {
                        id: session.id,
                        class_id: class.id,
                        starts_at: session.starts_at,
                        duration_min: session.duration_min,
                        capacity: session.capacity,
                        class_title: class.title,
                        class_blurb: class.blurb,
                        booked_count: counts.get(&session.id).copied().unwrap_or(0),
                        user_has_booking: i64::from(mine.contains(&session.id)),
                    })
                    .collect())
            })?;

        Ok(views)
    }

    async fn list_trainer_slots(
        &self,
        window: ScheduleWindow,
        viewer_id: Uuid,
    ) -> Result<Vec<TrainerSlotView>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;
        let booked = BookingStatus::Booked.to_string();

        let views = conn
            .build_transaction()
            .read_only()
            .repeatable_read()
            .run::<_, diesel::result::Error, _>(|tx| {
                let mut query = trainer_availability::table
                    .inner_join(trainers::table)
                    .select((TrainerAvailabilityEntity::as_select(), TrainerEntity::as_select()))
                    .order((trainer_availability::starts_at.asc(), trainer_availability::id.asc()))
                    .into_boxed();
                if let Some(from) = window.from {
                    query = query.filter(trainer_availability::starts_at.ge(from));
                }
                if let Some(to) = window.to {
                    query = query.filter(trainer_availability::starts_at.le(to));
                }
                let rows = query.load::<(TrainerAvailabilityEntity, TrainerEntity)>(tx)?;
                if rows.is_empty() {
                    return Ok(Vec::new());
                }

                let ids: Vec<Uuid> = rows.iter().map(|(slot, _)| slot.id).collect();

                let counts: HashMap<Uuid, i64> = trainer_bookings::table
                    .filter(trainer_bookings::availability_id.eq_any(&ids))
                    .filter(trainer_bookings::status.eq(&booked))
                    .group_by(trainer_bookings::availability_id)
                    .select((trainer_bookings::availability_id, count_star()))
                    .load::<(Uuid, i64)>(tx)?
                    .into_iter()
                    .collect();

                let mine: HashSet<Uuid> = trainer_bookings::table
                    .filter(trainer_bookings::user_id.eq(viewer_id))
                    .filter(trainer_bookings::availability_id.eq_any(&ids))
                    .filter(trainer_bookings::status.eq(&booked))
                    .select(trainer_bookings::availability_id)
                    .load::<Uuid>(tx)?
                    .into_iter()
                    .collect();

                Ok(rows
                    .into_iter()
                    .map(|(slot, trainer)| TrainerSlotView {
                        id: slot.id,
                        trainer_id: trainer.id,
                        starts_at: slot.starts_at,
                        duration_min: slot.duration_min,
                        capacity: slot.capacity,
                        trainer_name: trainer.name,
                        trainer_bio: trainer.bio,
                        booked_count: counts.get(&slot.id).copied().unwrap_or(0),
                        user_has_booking: i64::from(mine.contains(&slot.id)),
                    })
                    .collect())
            })?;

        Ok(views)
    }

    async fn list_active_trainers(&self) -> Result<Vec<TrainerEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let rows = trainers::table
            .filter(trainers::active.eq(true))
            .order(trainers::name.asc())
            .select(TrainerEntity::as_select())
            .load::<TrainerEntity>(&mut conn)?;

        Ok(rows)
    }
}
