use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::domain::entities::{group_classes::GroupClassEntity, plans::PlanEntity, trainers::TrainerEntity};

/// Inclusive start-time window. Either bound may be open.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScheduleWindow {
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
}

impl ScheduleWindow {
    pub fn contains(&self, starts_at: DateTime<Utc>) -> bool {
        self.from.is_none_or(|from| starts_at >= from) && self.to.is_none_or(|to| starts_at <= to)
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ClassSessionView {
    pub id: Uuid,
    pub class_id: Uuid,
    pub starts_at: DateTime<Utc>,
    pub duration_min: i32,
    pub capacity: i32,
    pub class_title: String,
    pub class_blurb: Option<String>,
    pub booked_count: i64,
    /// 0 or 1; kept numeric for existing clients.
    pub user_has_booking: i64,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct TrainerSlotView {
    pub id: Uuid,
    pub trainer_id: Uuid,
    pub starts_at: DateTime<Utc>,
    pub duration_min: i32,
    pub capacity: i32,
    pub trainer_name: String,
    pub trainer_bio: Option<String>,
    pub booked_count: i64,
    pub user_has_booking: i64,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct PublicPlanDto {
    pub id: Uuid,
    pub name: String,
    pub price_minor: i32,
    pub currency: String,
    pub description: Option<String>,
    pub features: Vec<String>,
    pub highlighted: bool,
}

impl From<PlanEntity> for PublicPlanDto {
    fn from(value: PlanEntity) -> Self {
        Self {
            id: value.id,
            name: value.name,
            price_minor: value.price_minor,
            currency: value.currency,
            description: value.description,
            features: value.features,
            highlighted: value.highlighted,
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct PublicClassDto {
    pub id: Uuid,
    pub title: String,
    pub blurb: Option<String>,
}

impl From<GroupClassEntity> for PublicClassDto {
    fn from(value: GroupClassEntity) -> Self {
        Self {
            id: value.id,
            title: value.title,
            blurb: value.blurb,
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct TrainerDto {
    pub id: Uuid,
    pub name: String,
    pub bio: Option<String>,
    pub max_clients: i32,
}

impl From<TrainerEntity> for TrainerDto {
    fn from(value: TrainerEntity) -> Self {
        Self {
            id: value.id,
            name: value.name,
            bio: value.bio,
            max_clients: value.max_clients,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn window_bounds_are_inclusive() {
        let now = Utc::now();
        let window = ScheduleWindow {
            from: Some(now),
            to: Some(now + Duration::hours(1)),
        };

        assert!(window.contains(now));
        assert!(window.contains(now + Duration::hours(1)));
        assert!(!window.contains(now - Duration::seconds(1)));
        assert!(!window.contains(now + Duration::hours(2)));
    }

    #[test]
    fn open_window_contains_everything() {
        assert!(ScheduleWindow::default().contains(Utc::now()));
    }
}
