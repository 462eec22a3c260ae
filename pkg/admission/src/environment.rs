use async_trait::async_trait;
use pkg_types::ResourceKind;
use pkg_types::environment::{ClusterType, Environment, UnstableEnvironmentConfiguration};
use pkg_types::validate::{validate_api_url, validate_dns1123_subdomain};

use crate::error::{CheckError, InfrastructureError, Violation};
use crate::validator::{Validator, check_name, conclude};
use crate::verdict::Verdict;

/// Environments carry no immutable fields; every revision is validated in full.
#[derive(Debug, Default, Clone, Copy)]
pub struct EnvironmentValidator;

#[async_trait]
impl Validator for EnvironmentValidator {
    type Resource = Environment;

    async fn validate_create(&self, new: &Environment) -> Result<Verdict, InfrastructureError> {
        conclude(check_environment(new))
    }

    async fn validate_update(
        &self,
        _old: &Environment,
        new: &Environment,
    ) -> Result<Verdict, InfrastructureError> {
        conclude(check_environment(new))
    }
}

fn check_environment(env: &Environment) -> Result<Vec<String>, CheckError> {
    check_name(ResourceKind::Environment, &env.metadata.name)?;
    if let Some(unstable) = &env.spec.unstable_configuration_fields {
        check_cluster_credentials(unstable)?;
    }
    Ok(vec![])
}

fn check_cluster_credentials(unstable: &UnstableEnvironmentConfiguration) -> Result<(), Violation> {
    let credentials = &unstable.credentials;

    if credentials.ingress_domain.is_empty() {
        // OpenShift clusters supply a default route host.
        if unstable.cluster_type == ClusterType::Kubernetes {
            return Err(Violation::MissingIngressDomain);
        }
    } else {
        validate_dns1123_subdomain(&credentials.ingress_domain).map_err(|reason| {
            Violation::InvalidIngressDomain {
                domain: credentials.ingress_domain.clone(),
                reason,
            }
        })?;
    }

    if !credentials.api_url.is_empty() {
        validate_api_url(&credentials.api_url).map_err(Violation::InvalidApiUrl)?;
    }
    Ok(())
}
