use serde::{Deserialize, Serialize};

use crate::meta::{EnvVarPair, ObjectMeta};

/// How promotions reach this environment.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeploymentStrategy {
    #[default]
    AppStudioAutomated,
    Manual,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum EnvironmentType {
    #[default]
    #[serde(rename = "POC")]
    Poc,
    #[serde(rename = "Non-POC")]
    NonPoc,
}

/// Flavor of the cluster an environment deploys to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ClusterType {
    #[default]
    OpenShift,
    Kubernetes,
}

impl std::fmt::Display for ClusterType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ClusterType::OpenShift => write!(f, "OpenShift"),
            ClusterType::Kubernetes => write!(f, "Kubernetes"),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeploymentTargetClaimRef {
    pub claim_name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnvironmentTarget {
    pub deployment_target_claim: DeploymentTargetClaimRef,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvironmentConfiguration {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub env: Vec<EnvVarPair>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<EnvironmentTarget>,
}

/// Connection details for a cluster managed outside of AppStudio.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KubernetesClusterCredentials {
    #[serde(default)]
    pub target_namespace: String,
    #[serde(default, rename = "apiURL")]
    pub api_url: String,
    /// Required when the cluster type is Kubernetes, optional on OpenShift.
    #[serde(default)]
    pub ingress_domain: String,
    #[serde(default)]
    pub cluster_credentials_secret: String,
    #[serde(default, rename = "allowInsecureSkipTLSVerify")]
    pub allow_insecure_skip_tls_verify: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub namespaces: Vec<String>,
    #[serde(default)]
    pub cluster_resources: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnstableEnvironmentConfiguration {
    #[serde(default)]
    pub cluster_type: ClusterType,
    #[serde(default, rename = "kubernetesCredentials")]
    pub credentials: KubernetesClusterCredentials,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnvironmentSpec {
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub type_: Option<EnvironmentType>,
    #[serde(default)]
    pub display_name: String,
    #[serde(default)]
    pub deployment_strategy: DeploymentStrategy,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_environment: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    #[serde(default)]
    pub configuration: EnvironmentConfiguration,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unstable_configuration_fields: Option<UnstableEnvironmentConfiguration>,
}

/// A target runtime context that snapshots are deployed into.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Environment {
    #[serde(default)]
    pub metadata: ObjectMeta,
    #[serde(default)]
    pub spec: EnvironmentSpec,
}
