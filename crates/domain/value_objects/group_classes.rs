use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::entities::group_classes::{
    GroupClassEntity, InsertGroupClassEntity, UpdateGroupClassEntity,
};

#[derive(Debug, Clone, Default, Deserialize)]
pub struct GroupClassFormModel {
    pub title: Option<String>,
    pub blurb: Option<String>,
}

impl GroupClassFormModel {
    /// Trimmed title, or `None` when missing or blank.
    pub fn title(&self) -> Option<String> {
        self.title
            .as_deref()
            .map(str::trim)
            .filter(|title| !title.is_empty())
            .map(str::to_string)
    }

    fn blurb(&self) -> Option<String> {
        self.blurb
            .as_deref()
            .map(str::trim)
            .filter(|blurb| !blurb.is_empty())
            .map(str::to_string)
    }

    pub fn to_insert_entity(&self, title: String) -> InsertGroupClassEntity {
        let now = Utc::now();
        InsertGroupClassEntity {
            title,
            blurb: self.blurb(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn to_update_entity(&self, title: String) -> UpdateGroupClassEntity {
        UpdateGroupClassEntity {
            title,
            blurb: self.blurb(),
            updated_at: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteClassOutcome {
    Deleted,
    NotFound,
    HasSessions(i64),
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct GroupClassDto {
    pub id: Uuid,
    pub title: String,
    pub blurb: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<GroupClassEntity> for GroupClassDto {
    fn from(value: GroupClassEntity) -> Self {
        Self {
            id: value.id,
            title: value.title,
            blurb: value.blurb,
            created_at: value.created_at,
            updated_at: value.updated_at,
        }
    }
}
