use serde::{Deserialize, Serialize};

use crate::component::ComponentStatus;
use crate::meta::{Condition, EnvVarPair, ObjectMeta};

/// Per-component overrides applied when a snapshot is deployed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BindingComponentConfiguration {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub env: Vec<EnvVarPair>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub replicas: Option<u32>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BindingComponent {
    /// Name of the component inside the snapshot.
    pub name: String,
    #[serde(default)]
    pub configuration: BindingComponentConfiguration,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotEnvironmentBindingSpec {
    pub application: String,
    pub environment: String,
    pub snapshot: String,
    #[serde(default)]
    pub components: Vec<BindingComponent>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BindingStatusGitOpsDeployment {
    pub component_name: String,
    #[serde(rename = "gitopsDeployment")]
    pub gitops_deployment: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotEnvironmentBindingStatus {
    #[serde(
        default,
        rename = "gitopsDeployments",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub gitops_deployments: Vec<BindingStatusGitOpsDeployment>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub components: Vec<ComponentStatus>,
    #[serde(
        default,
        rename = "gitopsRepoConditions",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub gitops_repo_conditions: Vec<Condition>,
}

/// Binds a snapshot of an application's components to one environment.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SnapshotEnvironmentBinding {
    #[serde(default)]
    pub metadata: ObjectMeta,
    pub spec: SnapshotEnvironmentBindingSpec,
    #[serde(default)]
    pub status: SnapshotEnvironmentBindingStatus,
}

impl SnapshotEnvironmentBinding {
    /// Whether two bindings claim the same application/environment pair.
    pub fn claims_same_pair(&self, other: &SnapshotEnvironmentBinding) -> bool {
        self.spec.application == other.spec.application
            && self.spec.environment == other.spec.environment
    }
}
