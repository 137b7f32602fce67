use std::sync::Arc;

use crates::domain::{
    repositories::group_classes::GroupClassRepository,
    value_objects::group_classes::{DeleteClassOutcome, GroupClassDto, GroupClassFormModel},
};
use thiserror::Error;
use tracing::{error, info};
use uuid::Uuid;

use crate::axum_http::error_responses::AppError;

#[derive(Debug, Error)]
pub enum GroupClassError {
    #[error("Title is required")]
    MissingTitle,
    #[error("Class not found")]
    NotFound,
    #[error("Cannot delete class with {0} scheduled session(s). Delete sessions first.")]
    HasSessions(i64),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl GroupClassError {
    pub fn status_code(&self) -> axum::http::StatusCode {
        use axum::http::StatusCode;
        match self {
            GroupClassError::MissingTitle => StatusCode::BAD_REQUEST,
            GroupClassError::NotFound => StatusCode::NOT_FOUND,
            GroupClassError::HasSessions(_) => StatusCode::CONFLICT,
            GroupClassError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<GroupClassError> for AppError {
    fn from(err: GroupClassError) -> Self {
        match err {
            GroupClassError::MissingTitle => AppError::Validation(err.to_string()),
            GroupClassError::NotFound => AppError::NotFound(err.to_string()),
            GroupClassError::HasSessions(_) => AppError::Conflict(err.to_string()),
            GroupClassError::Internal(inner) => AppError::Internal(inner),
        }
    }
}

pub type UseCaseResult<T> = std::result::Result<T, GroupClassError>;

pub struct GroupClassUseCase<G>
where
    G: GroupClassRepository + Send + Sync + 'static,
{
    group_class_repo: Arc<G>,
}

impl<G> GroupClassUseCase<G>
where
    G: GroupClassRepository + Send + Sync + 'static,
{
    pub fn new(group_class_repo: Arc<G>) -> Self {
        Self { group_class_repo }
    }

    pub async fn list(&self) -> UseCaseResult<Vec<GroupClassDto>> {
        let classes = self.group_class_repo.list_classes().await.map_err(|err| {
            error!(db_error = ?err, "group_classes: failed to list classes");
            GroupClassError::Internal(err)
        })?;

        Ok(classes.into_iter().map(GroupClassDto::from).collect())
    }

    pub async fn create(&self, form: &GroupClassFormModel) -> UseCaseResult<GroupClassDto> {
        let title = form.title().ok_or(GroupClassError::MissingTitle)?;

        let created = self
            .group_class_repo
            .create_class(form.to_insert_entity(title))
            .await
            .map_err(|err| {
                error!(db_error = ?err, "group_classes: failed to create class");
                GroupClassError::Internal(err)
            })?;

        info!(class_id = %created.id, "group_classes: class created");
        Ok(GroupClassDto::from(created))
    }

    pub async fn update(
        &self,
        class_id: Uuid,
        form: &GroupClassFormModel,
    ) -> UseCaseResult<GroupClassDto> {
        let title = form.title().ok_or(GroupClassError::MissingTitle)?;

        let updated = self
            .group_class_repo
            .update_class(class_id, form.to_update_entity(title))
            .await
            .map_err(|err| {
                error!(%class_id, db_error = ?err, "group_classes: failed to update class");
                GroupClassError::Internal(err)
            })?
            .ok_or(GroupClassError::NotFound)?;

        info!(%class_id, "group_classes: class updated");
        Ok(GroupClassDto::from(updated))
    }

    pub async fn delete(&self, class_id: Uuid) -> UseCaseResult<()> {
        let outcome = self
            .group_class_repo
            .delete_class(class_id)
            .await
            .map_err(|err| {
                error!(%class_id, db_error = ?err, "group_classes: failed to delete class");
                GroupClassError::Internal(err)
            })?;

        match outcome {
            DeleteClassOutcome::Deleted => {
                info!(%class_id, "group_classes: class deleted");
                Ok(())
            }
            DeleteClassOutcome::NotFound => Err(GroupClassError::NotFound),
            DeleteClassOutcome::HasSessions(count) => {
                info!(%class_id, session_count = count, "group_classes: delete refused");
                Err(GroupClassError::HasSessions(count))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use crates::domain::{
        entities::group_classes::GroupClassEntity,
        repositories::group_classes::MockGroupClassRepository,
    };
    use mockall::predicate::eq;

    fn usecase(repo: MockGroupClassRepository) -> GroupClassUseCase<MockGroupClassRepository> {
        GroupClassUseCase::new(Arc::new(repo))
    }

    fn form(title: Option<&str>, blurb: Option<&str>) -> GroupClassFormModel {
        GroupClassFormModel {
            title: title.map(str::to_string),
            blurb: blurb.map(str::to_string),
        }
    }

    #[tokio::test]
    async fn create_trims_title() {
        let mut repo = MockGroupClassRepository::new();
        repo.expect_create_class()
            .withf(|new_class| new_class.title == "Yoga" && new_class.blurb.is_none())
            .times(1)
            .returning(|new_class| {
                Ok(GroupClassEntity {
                    id: Uuid::new_v4(),
                    title: new_class.title,
                    blurb: new_class.blurb,
                    created_at: new_class.created_at,
                    updated_at: new_class.updated_at,
                })
            });

        let created = usecase(repo)
            .create(&form(Some("  Yoga "), Some("   ")))
            .await
            .unwrap();

        assert_eq!(created.title, "Yoga");
    }

    #[tokio::test]
    async fn blank_title_is_rejected() {
        let mut repo = MockGroupClassRepository::new();
        repo.expect_create_class().never();
        repo.expect_update_class().never();
        let usecase = usecase(repo);

        let err = usecase.create(&form(Some("  "), None)).await.unwrap_err();
        assert_eq!(err.to_string(), "Title is required");
        assert_eq!(err.status_code().as_u16(), 400);

        let err = usecase
            .update(Uuid::new_v4(), &form(None, Some("blurb")))
            .await
            .unwrap_err();
        assert!(matches!(err, GroupClassError::MissingTitle));
    }

    #[tokio::test]
    async fn update_of_missing_class_is_not_found() {
        let mut repo = MockGroupClassRepository::new();
        repo.expect_update_class().returning(|_, _| Ok(None));

        let err = usecase(repo)
            .update(Uuid::new_v4(), &form(Some("Pilates"), None))
            .await
            .unwrap_err();

        assert_eq!(err.status_code().as_u16(), 404);
    }

    #[tokio::test]
    async fn delete_with_sessions_is_conflict() {
        let class_id = Uuid::new_v4();
        let mut repo = MockGroupClassRepository::new();
        repo.expect_delete_class()
            .with(eq(class_id))
            .returning(|_| Ok(DeleteClassOutcome::HasSessions(3)));

        let err = usecase(repo).delete(class_id).await.unwrap_err();

        assert_eq!(
            err.to_string(),
            "Cannot delete class with 3 scheduled session(s). Delete sessions first."
        );
        assert!(matches!(AppError::from(err), AppError::Conflict(_)));
    }

    #[tokio::test]
    async fn list_maps_entities() {
        let mut repo = MockGroupClassRepository::new();
        repo.expect_list_classes().returning(|| {
            let now = Utc::now();
            Ok(vec![GroupClassEntity {
                id: Uuid::new_v4(),
                title: "Spin".to_string(),
                blurb: Some("Cardio".to_string()),
                created_at: now,
                updated_at: now,
            }])
        });

        let classes = usecase(repo).list().await.unwrap();

        assert_eq!(classes.len(), 1);
        assert_eq!(classes[0].blurb.as_deref(), Some("Cardio"));
    }
}
