use serde::{Deserialize, Serialize};

use crate::meta::ObjectMeta;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManualPromotionConfiguration {
    pub target_environment: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AutomatedPromotionConfiguration {
    pub initial_environment: String,
}

/// Which promotion mode a run asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromotionStrategy<'a> {
    Unset,
    /// Promote to exactly one named environment.
    Manual { target_environment: &'a str },
    /// Walk the environment graph starting at `initial_environment`.
    Automated { initial_environment: &'a str },
    /// Both blocks were populated.
    Conflicting,
}

impl std::fmt::Display for PromotionStrategy<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PromotionStrategy::Unset => write!(f, "unset"),
            PromotionStrategy::Manual { target_environment } => {
                write!(f, "manual to {}", target_environment)
            }
            PromotionStrategy::Automated {
                initial_environment,
            } => write!(f, "automated from {}", initial_environment),
            PromotionStrategy::Conflicting => write!(f, "conflicting"),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromotionRunSpec {
    /// Snapshot whose images are promoted.
    pub snapshot: String,
    pub application: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub manual_promotion: Option<ManualPromotionConfiguration>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub automated_promotion: Option<AutomatedPromotionConfiguration>,
}

impl PromotionRunSpec {
    pub fn strategy(&self) -> PromotionStrategy<'_> {
        let manual = self
            .manual_promotion
            .as_ref()
            .map(|m| m.target_environment.as_str())
            .filter(|env| !env.is_empty());
        let automated = self
            .automated_promotion
            .as_ref()
            .map(|a| a.initial_environment.as_str())
            .filter(|env| !env.is_empty());
        match (manual, automated) {
            (None, None) => PromotionStrategy::Unset,
            (Some(target_environment), None) => PromotionStrategy::Manual { target_environment },
            (None, Some(initial_environment)) => PromotionStrategy::Automated {
                initial_environment,
            },
            (Some(_), Some(_)) => PromotionStrategy::Conflicting,
        }
    }
}

// --- Status ---

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum PromotionRunState {
    #[default]
    Active,
    Complete,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PromotionRunCompleteResult {
    Success,
    Failure,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromotionRunEnvironmentStatus {
    pub step: u32,
    pub environment_name: String,
    /// "Success", "In Progress" or "Failed".
    pub status: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub display_status: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromotionRunStatus {
    #[serde(default)]
    pub state: PromotionRunState,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completion_result: Option<PromotionRunCompleteResult>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub environment_status: Vec<PromotionRunEnvironmentStatus>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub active_bindings: Vec<String>,
}

/// A single-shot request to promote a snapshot.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PromotionRun {
    #[serde(default)]
    pub metadata: ObjectMeta,
    pub spec: PromotionRunSpec,
    #[serde(default)]
    pub status: PromotionRunStatus,
}
