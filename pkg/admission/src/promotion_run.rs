use async_trait::async_trait;
use pkg_types::promotion::PromotionRun;

use crate::error::InfrastructureError;
use crate::immutable::check_spec_unchanged;
use crate::validator::{Validator, conclude};
use crate::verdict::Verdict;

/// A promotion run is a one-shot request: accepted as submitted, frozen afterwards.
#[derive(Debug, Default, Clone, Copy)]
pub struct PromotionRunValidator;

#[async_trait]
impl Validator for PromotionRunValidator {
    type Resource = PromotionRun;

    async fn validate_create(&self, _new: &PromotionRun) -> Result<Verdict, InfrastructureError> {
        Ok(Verdict::Allow)
    }

    async fn validate_update(
        &self,
        old: &PromotionRun,
        new: &PromotionRun,
    ) -> Result<Verdict, InfrastructureError> {
        conclude(
            check_spec_unchanged(&old.spec, &new.spec)
                .map(|()| vec![])
                .map_err(Into::into),
        )
    }
}
