use std::sync::Arc;

use pkg_types::AnyResource;
use tracing::{error, info, warn};

use crate::binding::BindingValidator;
use crate::component::ComponentValidator;
use crate::environment::EnvironmentValidator;
use crate::error::{InfrastructureError, Violation};
use crate::promotion_run::PromotionRunValidator;
use crate::store::ObjectStore;
use crate::validator::Validator;
use crate::verdict::Verdict;

/// One proposed change to a guarded resource.
#[derive(Debug, Clone, PartialEq)]
pub enum AdmissionRequest {
    Create(AnyResource),
    Update { old: AnyResource, new: AnyResource },
    Delete(AnyResource),
}

impl AdmissionRequest {
    pub fn operation(&self) -> &'static str {
        match self {
            AdmissionRequest::Create(_) => "CREATE",
            AdmissionRequest::Update { .. } => "UPDATE",
            AdmissionRequest::Delete(_) => "DELETE",
        }
    }

    /// The object the request is about: the proposed state, or the existing one for a delete.
    pub fn subject(&self) -> &AnyResource {
        match self {
            AdmissionRequest::Create(resource) | AdmissionRequest::Delete(resource) => resource,
            AdmissionRequest::Update { new, .. } => new,
        }
    }
}

/// Routes each admission request to the validator of its kind.
pub struct AdmissionGate {
    component: ComponentValidator,
    environment: EnvironmentValidator,
    promotion_run: PromotionRunValidator,
    binding: BindingValidator,
}

impl AdmissionGate {
    pub fn new(store: Arc<dyn ObjectStore>) -> Self {
        Self {
            component: ComponentValidator,
            environment: EnvironmentValidator,
            promotion_run: PromotionRunValidator,
            binding: BindingValidator::new(store),
        }
    }

    pub async fn admit(&self, request: &AdmissionRequest) -> Result<Verdict, InfrastructureError> {
        let outcome = self.dispatch(request).await;

        let subject = request.subject();
        match &outcome {
            Ok(Verdict::Deny(reason)) => warn!(
                "Denied {} {} {}: {}",
                request.operation(),
                subject.kind(),
                subject.metadata().key(),
                reason
            ),
            Ok(verdict) => info!(
                "Admitted {} {} {} ({})",
                request.operation(),
                subject.kind(),
                subject.metadata().key(),
                verdict
            ),
            Err(e) => error!(
                "Could not decide {} {} {}: {}",
                request.operation(),
                subject.kind(),
                subject.metadata().key(),
                e
            ),
        }
        outcome
    }

    async fn dispatch(&self, request: &AdmissionRequest) -> Result<Verdict, InfrastructureError> {
        match request {
            AdmissionRequest::Create(resource) => match resource {
                AnyResource::Component(r) => self.component.validate_create(r).await,
                AnyResource::Environment(r) => self.environment.validate_create(r).await,
                AnyResource::PromotionRun(r) => self.promotion_run.validate_create(r).await,
                AnyResource::SnapshotEnvironmentBinding(r) => self.binding.validate_create(r).await,
            },
            AdmissionRequest::Update { old, new } => match (old, new) {
                (AnyResource::Component(o), AnyResource::Component(n)) => {
                    self.component.validate_update(o, n).await
                }
                (AnyResource::Environment(o), AnyResource::Environment(n)) => {
                    self.environment.validate_update(o, n).await
                }
                (AnyResource::PromotionRun(o), AnyResource::PromotionRun(n)) => {
                    self.promotion_run.validate_update(o, n).await
                }
                (
                    AnyResource::SnapshotEnvironmentBinding(o),
                    AnyResource::SnapshotEnvironmentBinding(n),
                ) => self.binding.validate_update(o, n).await,
                _ => Ok(Verdict::Deny(
                    Violation::KindMismatch {
                        expected: new.kind(),
                        found: old.kind(),
                    }
                    .to_string(),
                )),
            },
            AdmissionRequest::Delete(resource) => match resource {
                AnyResource::Component(r) => self.component.validate_delete(r).await,
                AnyResource::Environment(r) => self.environment.validate_delete(r).await,
                AnyResource::PromotionRun(r) => self.promotion_run.validate_delete(r).await,
                AnyResource::SnapshotEnvironmentBinding(r) => self.binding.validate_delete(r).await,
            },
        }
    }
}
