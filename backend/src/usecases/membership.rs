use std::sync::Arc;

use crates::domain::{
    repositories::{membership::MembershipRepository, plans::PlanRepository, users::UserRepository},
    value_objects::{
        enums::membership_statuses::MembershipStatus,
        iam::UserDto,
        membership::{
            MeDto, MembershipEventDto, PlanSelectorModel, PlanSummaryDto, SubscribedDto,
        },
    },
};
use thiserror::Error;
use tracing::{error, info, warn};
use uuid::Uuid;

use super::plan_resolver::{PlanResolutionError, PlanResolver};
use crate::axum_http::error_responses::AppError;

pub const HISTORY_LIMIT: i64 = 200;

#[derive(Debug, Error)]
pub enum MembershipError {
    #[error("User not found")]
    UserNotFound,
    #[error(transparent)]
    Plan(#[from] PlanResolutionError),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl MembershipError {
    pub fn status_code(&self) -> axum::http::StatusCode {
        use axum::http::StatusCode;
        match self {
            MembershipError::UserNotFound | MembershipError::Plan(PlanResolutionError::NotFound) => {
                StatusCode::NOT_FOUND
            }
            MembershipError::Plan(PlanResolutionError::MissingSelector) => StatusCode::BAD_REQUEST,
            MembershipError::Plan(PlanResolutionError::Internal(_)) | MembershipError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl From<PlanResolutionError> for AppError {
    fn from(err: PlanResolutionError) -> Self {
        match err {
            PlanResolutionError::MissingSelector => AppError::Validation(err.to_string()),
            PlanResolutionError::NotFound => AppError::NotFound(err.to_string()),
            PlanResolutionError::Internal(inner) => AppError::Internal(inner),
        }
    }
}

impl From<MembershipError> for AppError {
    fn from(err: MembershipError) -> Self {
        match err {
            MembershipError::UserNotFound => AppError::NotFound(err.to_string()),
            MembershipError::Plan(inner) => inner.into(),
            MembershipError::Internal(inner) => AppError::Internal(inner),
        }
    }
}

pub type UseCaseResult<T> = std::result::Result<T, MembershipError>;

pub struct MembershipUseCase<U, P, M>
where
    U: UserRepository + Send + Sync + 'static,
    P: PlanRepository + Send + Sync + 'static,
    M: MembershipRepository + Send + Sync + 'static,
{
    user_repo: Arc<U>,
    plan_repo: Arc<P>,
    membership_repo: Arc<M>,
    plan_resolver: PlanResolver<P>,
}

impl<U, P, M> MembershipUseCase<U, P, M>
where
    U: UserRepository + Send + Sync + 'static,
    P: PlanRepository + Send + Sync + 'static,
    M: MembershipRepository + Send + Sync + 'static,
{
    pub fn new(user_repo: Arc<U>, plan_repo: Arc<P>, membership_repo: Arc<M>) -> Self {
        Self {
            user_repo,
            plan_resolver: PlanResolver::new(Arc::clone(&plan_repo)),
            plan_repo,
            membership_repo,
        }
    }

    pub async fn me(&self, user_id: Uuid) -> UseCaseResult<MeDto> {
        let user = self
            .user_repo
            .find_by_id(user_id)
            .await
            .map_err(|err| {
                error!(%user_id, db_error = ?err, "membership: failed to load user");
                MembershipError::Internal(err)
            })?
            .ok_or(MembershipError::UserNotFound)?;

        let plan = match user.plan_id {
            Some(plan_id) => {
                let plan = self.plan_repo.find_by_id(plan_id).await.map_err(|err| {
                    error!(%user_id, %plan_id, db_error = ?err, "membership: failed to load plan");
                    MembershipError::Internal(err)
                })?;
                if plan.is_none() {
                    warn!(%user_id, %plan_id, "membership: user references a missing plan");
                }
                plan.map(PlanSummaryDto::from)
            }
            None => None,
        };

        Ok(MeDto {
            user: UserDto::from(user),
            plan,
        })
    }

    /// Grants the plan directly with status `active`; no payment is taken.
    pub async fn subscribe_plan(
        &self,
        user_id: Uuid,
        selector: &PlanSelectorModel,
    ) -> UseCaseResult<SubscribedDto> {
        let plan = self.plan_resolver.resolve(selector).await?;

        let assigned = self
            .membership_repo
            .assign_plan(user_id, plan.id, MembershipStatus::Active.to_string())
            .await
            .map_err(|err| {
                error!(%user_id, plan_id = %plan.id, db_error = ?err, "membership: failed to assign plan");
                MembershipError::Internal(err)
            })?;
        if !assigned {
            return Err(MembershipError::UserNotFound);
        }

        info!(%user_id, plan_id = %plan.id, plan_name = %plan.name, "membership: plan assigned");
        Ok(SubscribedDto {
            message: "Subscribed".to_string(),
            plan: PlanSummaryDto::from(plan),
        })
    }

    pub async fn history(&self, user_id: Uuid) -> UseCaseResult<Vec<MembershipEventDto>> {
        let events = self
            .membership_repo
            .list_events(user_id, HISTORY_LIMIT)
            .await
            .map_err(|err| {
                error!(%user_id, db_error = ?err, "membership: failed to list events");
                MembershipError::Internal(err)
            })?;

        Ok(events.into_iter().map(MembershipEventDto::from).collect())
    }
}
