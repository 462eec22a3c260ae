use std::sync::Arc;

use async_trait::async_trait;
use pkg_types::binding::SnapshotEnvironmentBinding;
use tracing::debug;

use crate::error::{CheckError, InfrastructureError, Violation};
use crate::immutable::ImmutableFields;
use crate::store::ObjectStore;
use crate::unique::check_unique;
use crate::validator::{Validator, conclude};
use crate::verdict::Verdict;

/// At most one binding may claim an (application, environment) pair per namespace.
pub struct BindingValidator {
    store: Arc<dyn ObjectStore>,
}

impl BindingValidator {
    pub fn new(store: Arc<dyn ObjectStore>) -> Self {
        Self { store }
    }

    async fn check_pair_unclaimed(
        &self,
        binding: &SnapshotEnvironmentBinding,
        prior_name: Option<&str>,
    ) -> Result<(), CheckError> {
        let conflicting = check_unique(
            self.store.as_ref(),
            binding,
            prior_name,
            SnapshotEnvironmentBinding::claims_same_pair,
        )
        .await?;

        match conflicting {
            Some(existing) => {
                debug!(
                    "Binding {} conflicts with {}",
                    binding.metadata.key(),
                    existing.metadata.key()
                );
                Err(Violation::DuplicateBinding {
                    application: binding.spec.application.clone(),
                    environment: binding.spec.environment.clone(),
                    conflicting: existing.metadata.name,
                }
                .into())
            }
            None => Ok(()),
        }
    }

    async fn check_update(
        &self,
        old: &SnapshotEnvironmentBinding,
        new: &SnapshotEnvironmentBinding,
    ) -> Result<Vec<String>, CheckError> {
        ImmutableFields::new()
            .field("application", &old.spec.application, &new.spec.application)
            .field("environment", &old.spec.environment, &new.spec.environment)
            .field("labels", &old.metadata.labels, &new.metadata.labels)
            .check()?;

        self.check_pair_unclaimed(new, Some(&new.metadata.name))
            .await?;
        Ok(vec![])
    }
}

#[async_trait]
impl Validator for BindingValidator {
    type Resource = SnapshotEnvironmentBinding;

    async fn validate_create(
        &self,
        new: &SnapshotEnvironmentBinding,
    ) -> Result<Verdict, InfrastructureError> {
        conclude(self.check_pair_unclaimed(new, None).await.map(|()| vec![]))
    }

    async fn validate_update(
        &self,
        old: &SnapshotEnvironmentBinding,
        new: &SnapshotEnvironmentBinding,
    ) -> Result<Verdict, InfrastructureError> {
        conclude(self.check_update(old, new).await)
    }
}
