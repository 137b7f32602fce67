use std::sync::Arc;

use crates::domain::{
    entities::plans::PlanEntity, repositories::plans::PlanRepository,
    value_objects::membership::PlanSelectorModel,
};
use thiserror::Error;
use tracing::{debug, error};

#[derive(Debug, Error)]
pub enum PlanResolutionError {
    #[error("planId or planName is required")]
    MissingSelector,
    #[error("Plan not found")]
    NotFound,
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

/// Resolves a plan by id, or by name when no id is given.
pub struct PlanResolver<P>
where
    P: PlanRepository + Send + Sync + 'static,
{
    plan_repo: Arc<P>,
}

impl<P> PlanResolver<P>
where
    P: PlanRepository + Send + Sync + 'static,
{
    pub fn new(plan_repo: Arc<P>) -> Self {
        Self { plan_repo }
    }

    pub async fn resolve(
        &self,
        selector: &PlanSelectorModel,
    ) -> Result<PlanEntity, PlanResolutionError> {
        if selector.is_empty() {
            return Err(PlanResolutionError::MissingSelector);
        }

        let found = match (selector.plan_id, selector.plan_name()) {
            (Some(plan_id), _) => {
                debug!(%plan_id, "plan_resolver: looking up plan by id");
                self.plan_repo.find_by_id(plan_id).await
            }
            (None, Some(plan_name)) => {
                debug!(plan_name, "plan_resolver: looking up plan by name");
                self.plan_repo.find_by_name(plan_name).await
            }
            (None, None) => return Err(PlanResolutionError::MissingSelector),
        }
        .map_err(|err| {
            error!(db_error = ?err, "plan_resolver: failed to load plan");
            PlanResolutionError::Internal(err)
        })?;

        found.ok_or(PlanResolutionError::NotFound)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crates::domain::repositories::plans::MockPlanRepository;
    use mockall::predicate::eq;
    use uuid::Uuid;

    fn sample_plan(id: Uuid, name: &str) -> PlanEntity {
        PlanEntity {
            id,
            name: name.to_string(),
            price_minor: 2900,
            currency: "usd".to_string(),
            description: None,
            features: Vec::new(),
            highlighted: false,
            stripe_price_id: Some("price_basic".to_string()),
        }
    }

    #[tokio::test]
    async fn id_wins_over_name() {
        let plan_id = Uuid::new_v4();
        let plan = sample_plan(plan_id, "Basic");
        let mut plans = MockPlanRepository::new();
        plans
            .expect_find_by_id()
            .with(eq(plan_id))
            .returning(move |_| Ok(Some(plan.clone())));
        plans.expect_find_by_name().never();

        let resolved = PlanResolver::new(Arc::new(plans))
            .resolve(&PlanSelectorModel {
                plan_id: Some(plan_id),
                plan_name: Some("Premium".to_string()),
            })
            .await
            .unwrap();

        assert_eq!(resolved.name, "Basic");
    }

    #[tokio::test]
    async fn falls_back_to_trimmed_name() {
        let mut plans = MockPlanRepository::new();
        plans
            .expect_find_by_name()
            .with(eq("Premium"))
            .returning(|name| Ok(Some(sample_plan(Uuid::new_v4(), name))));

        let resolved = PlanResolver::new(Arc::new(plans))
            .resolve(&PlanSelectorModel {
                plan_id: None,
                plan_name: Some(" Premium ".to_string()),
            })
            .await
            .unwrap();

        assert_eq!(resolved.name, "Premium");
    }

    #[tokio::test]
    async fn empty_selector_and_unknown_plan_are_rejected() {
        let mut plans = MockPlanRepository::new();
        plans.expect_find_by_name().returning(|_| Ok(None));
        let resolver = PlanResolver::new(Arc::new(plans));

        assert!(matches!(
            resolver.resolve(&PlanSelectorModel::default()).await,
            Err(PlanResolutionError::MissingSelector)
        ));
        assert!(matches!(
            resolver
                .resolve(&PlanSelectorModel {
                    plan_id: None,
                    plan_name: Some("Gold".to_string()),
                })
                .await,
            Err(PlanResolutionError::NotFound)
        ));
    }
}
