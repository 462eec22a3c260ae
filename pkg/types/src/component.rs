use serde::{Deserialize, Serialize};

use crate::meta::{Condition, EnvVarPair, ObjectMeta, ResourceRequirements};

// --- Source ---

/// Git repository a component is built from.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GitSource {
    #[serde(default)]
    pub url: String,
    /// Branch, tag or commit to build.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub revision: Option<String>,
    /// Subdirectory of the repository holding the component.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub devfile_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dockerfile_url: Option<String>,
}

/// Wire shape of `spec.source`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ComponentSourceSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub git: Option<GitSource>,
}

/// Which source a component was declared with.
///
/// The wire format spreads this over `spec.source.git` and
/// `spec.containerImage`; every combination is representable here so the
/// validators can match on it instead of probing optional fields.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ComponentSource<'a> {
    /// Neither populated: a stub waiting for source detection.
    Unset,
    Git(&'a GitSource),
    Image(&'a str),
    GitAndImage { git: &'a GitSource, image: &'a str },
}

// --- Spec / status ---

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentSpec {
    pub component_name: String,
    pub application: String,
    /// Secret holding credentials for a private repository.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secret: Option<String>,
    #[serde(default)]
    pub source: ComponentSourceSpec,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resources: Option<ResourceRequirements>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub replicas: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_port: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub route: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub env: Vec<EnvVarPair>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub container_image: Option<String>,
    #[serde(default)]
    pub skip_git_ops_resource_generation: bool,
    /// Components whose builds are nudged when this one builds.
    #[serde(
        default,
        rename = "build-nudges-ref",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub build_nudges_ref: Vec<String>,
}

impl ComponentSpec {
    /// Classify the declared source. Empty strings count as unset.
    pub fn source(&self) -> ComponentSource<'_> {
        let image = self
            .container_image
            .as_deref()
            .filter(|image| !image.is_empty());
        match (self.source.git.as_ref(), image) {
            (None, None) => ComponentSource::Unset,
            (Some(git), None) => ComponentSource::Git(git),
            (None, Some(image)) => ComponentSource::Image(image),
            (Some(git), Some(image)) => ComponentSource::GitAndImage { git, image },
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GitOpsStatus {
    #[serde(default, rename = "repositoryURL")]
    pub repository_url: String,
    #[serde(default)]
    pub branch: String,
    #[serde(default)]
    pub context: String,
    #[serde(default)]
    pub resource_generation_skipped: bool,
    #[serde(default, rename = "commitID")]
    pub commit_id: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentStatus {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub conditions: Vec<Condition>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub webhook: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub container_image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub devfile: Option<String>,
    #[serde(default)]
    pub gitops: GitOpsStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_built_commit: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_promoted_image: Option<String>,
    #[serde(
        default,
        rename = "build-nudged-by",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub build_nudged_by: Vec<String>,
}

// --- Component ---

/// A deployable unit of an application.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Component {
    #[serde(default)]
    pub metadata: ObjectMeta,
    pub spec: ComponentSpec,
    #[serde(default)]
    pub status: ComponentStatus,
}
