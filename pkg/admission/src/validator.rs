use async_trait::async_trait;
use pkg_types::validate::validate_dns1123_name;
use pkg_types::{Resource, ResourceKind};

use crate::error::{CheckError, InfrastructureError, Violation};
use crate::verdict::Verdict;

/// Admission checks for one resource kind.
#[async_trait]
pub trait Validator: Send + Sync {
    type Resource: Resource;

    async fn validate_create(&self, new: &Self::Resource) -> Result<Verdict, InfrastructureError>;

    async fn validate_update(
        &self,
        old: &Self::Resource,
        new: &Self::Resource,
    ) -> Result<Verdict, InfrastructureError>;

    /// Deletion is never gated for the guarded kinds.
    async fn validate_delete(
        &self,
        _existing: &Self::Resource,
    ) -> Result<Verdict, InfrastructureError> {
        Ok(Verdict::Allow)
    }
}

/// Turn the outcome of a chain of checks into a verdict.
///
/// Violations deny; the collected warnings of a passing chain are attached to
/// the allow; store failures pass through as errors.
pub(crate) fn conclude(outcome: Result<Vec<String>, CheckError>) -> Result<Verdict, InfrastructureError> {
    match outcome {
        Ok(warnings) => Ok(Verdict::allow_with(warnings)),
        Err(CheckError::Violation(violation)) => Ok(Verdict::Deny(violation.to_string())),
        Err(CheckError::Infrastructure(err)) => Err(err),
    }
}

/// `metadata.name` must follow the resource name grammar.
pub(crate) fn check_name(kind: ResourceKind, name: &str) -> Result<(), Violation> {
    validate_dns1123_name(name).map_err(|reason| Violation::InvalidName {
        kind,
        name: name.to_string(),
        reason,
    })
}
