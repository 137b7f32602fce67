use std::sync::Arc;

use chrono::{DateTime, Utc};
use crates::domain::{
    repositories::{
        catalog::CatalogRepository, group_classes::GroupClassRepository, plans::PlanRepository,
    },
    value_objects::catalog::{
        ClassSessionView, PublicClassDto, PublicPlanDto, ScheduleWindow, TrainerDto,
        TrainerSlotView,
    },
};
use serde::Deserialize;
use thiserror::Error;
use tracing::{error, info};
use uuid::Uuid;

use crate::axum_http::error_responses::AppError;

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Invalid `{field}` timestamp, expected RFC 3339")]
    InvalidTimestamp { field: &'static str },
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl CatalogError {
    pub fn status_code(&self) -> axum::http::StatusCode {
        use axum::http::StatusCode;
        match self {
            CatalogError::InvalidTimestamp { .. } => StatusCode::BAD_REQUEST,
            CatalogError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<CatalogError> for AppError {
    fn from(err: CatalogError) -> Self {
        match err {
            CatalogError::InvalidTimestamp { .. } => AppError::Validation(err.to_string()),
            CatalogError::Internal(inner) => AppError::Internal(inner),
        }
    }
}

pub type UseCaseResult<T> = std::result::Result<T, CatalogError>;

/// Raw `?from&to` query parameters.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct WindowQuery {
    pub from: Option<String>,
    pub to: Option<String>,
}

impl WindowQuery {
    pub fn parse(&self) -> UseCaseResult<ScheduleWindow> {
        Ok(ScheduleWindow {
            from: parse_bound(self.from.as_deref(), "from")?,
            to: parse_bound(self.to.as_deref(), "to")?,
        })
    }
}

fn parse_bound(raw: Option<&str>, field: &'static str) -> UseCaseResult<Option<DateTime<Utc>>> {
    match raw.map(str::trim).filter(|value| !value.is_empty()) {
        None => Ok(None),
        Some(value) => DateTime::parse_from_rfc3339(value)
            .map(|parsed| Some(parsed.with_timezone(&Utc)))
            .map_err(|_| CatalogError::InvalidTimestamp { field }),
    }
}

pub struct CatalogUseCase<P, G, C>
where
    P: PlanRepository + Send + Sync + 'static,
    G: GroupClassRepository + Send + Sync + 'static,
    C: CatalogRepository + Send + Sync + 'static,
{
    plan_repo: Arc<P>,
    group_class_repo: Arc<G>,
    catalog_repo: Arc<C>,
}

impl<P, G, C> CatalogUseCase<P, G, C>
where
    P: PlanRepository + Send + Sync + 'static,
    G: GroupClassRepository + Send + Sync + 'static,
    C: CatalogRepository + Send + Sync + 'static,
{
    pub fn new(plan_repo: Arc<P>, group_class_repo: Arc<G>, catalog_repo: Arc<C>) -> Self {
        Self {
            plan_repo,
            group_class_repo,
            catalog_repo,
        }
    }

    pub async fn list_public_plans(&self) -> UseCaseResult<Vec<PublicPlanDto>> {
        let plans = self.plan_repo.list_plans().await.map_err(|err| {
            error!(db_error = ?err, "catalog: failed to list plans");
            CatalogError::Internal(err)
        })?;

        Ok(plans.into_iter().map(PublicPlanDto::from).collect())
    }

    pub async fn list_public_classes(&self) -> UseCaseResult<Vec<PublicClassDto>> {
        let classes = self.group_class_repo.list_classes().await.map_err(|err| {
            error!(db_error = ?err, "catalog: failed to list classes");
            CatalogError::Internal(err)
        })?;

        Ok(classes.into_iter().map(PublicClassDto::from).collect())
    }

    pub async fn list_public_trainers(&self) -> UseCaseResult<Vec<TrainerDto>> {
        let trainers = self.catalog_repo.list_active_trainers().await.map_err(|err| {
            error!(db_error = ?err, "catalog: failed to list trainers");
            CatalogError::Internal(err)
        })?;

        Ok(trainers.into_iter().map(TrainerDto::from).collect())
    }

    pub async fn class_schedule(
        &self,
        viewer_id: Uuid,
        query: &WindowQuery,
    ) -> UseCaseResult<Vec<ClassSessionView>> {
        let window = query.parse()?;
        let sessions = self
            .catalog_repo
            .list_class_sessions(window, viewer_id)
            .await
            .map_err(|err| {
                error!(%viewer_id, db_error = ?err, "catalog: failed to list class sessions");
                CatalogError::Internal(err)
            })?;

        info!(%viewer_id, session_count = sessions.len(), "catalog: schedule loaded");
        Ok(sessions)
    }

    pub async fn trainer_availability(
        &self,
        viewer_id: Uuid,
        query: &WindowQuery,
    ) -> UseCaseResult<Vec<TrainerSlotView>> {
        let window = query.parse()?;
        let slots = self
            .catalog_repo
            .list_trainer_slots(window, viewer_id)
            .await
            .map_err(|err| {
                error!(%viewer_id, db_error = ?err, "catalog: failed to list trainer slots");
                CatalogError::Internal(err)
            })?;

        info!(%viewer_id, slot_count = slots.len(), "catalog: availability loaded");
        Ok(slots)
    }
}
