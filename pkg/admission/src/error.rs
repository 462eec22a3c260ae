//! Error taxonomy of the admission gate.
//!
//! A [`Violation`] is a validation failure: the proposed state is not
//! admissible and the request is denied with its message. An
//! [`InfrastructureError`] means the gate could not reach a verdict at all
//! (the object store failed); it is returned to the caller untouched so the
//! caller can decide whether to retry the whole admission request.

use pkg_types::ResourceKind;
use pkg_types::validate::{NameError, UrlError};
use thiserror::Error;

/// A reason to deny an admission request.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Violation {
    /// `metadata.name` breaks the resource name grammar.
    #[error(
        "invalid {noun} name: {name}, {article} {noun} resource name must start with a lower case alphabetical character, be under 63 characters, and can only consist of lower case alphanumeric characters or ‘-’ ({reason})",
        noun = kind_noun(.kind),
        article = kind_article(.kind)
    )]
    InvalidName {
        kind: ResourceKind,
        name: String,
        reason: NameError,
    },

    /// Kubernetes environments have no default route host.
    #[error("ingress domain cannot be empty when the environment cluster type is Kubernetes")]
    MissingIngressDomain,

    #[error(
        "ingress domain {domain} is not a valid DNS-1123 subdomain, it must consist of lower case alphanumeric characters, '-' or '.', and must start and end with an alphanumeric character ({reason})"
    )]
    InvalidIngressDomain { domain: String, reason: NameError },

    #[error("invalid cluster API URL: {0}")]
    InvalidApiUrl(UrlError),

    #[error("{0}")]
    InvalidGitUrl(UrlError),

    /// A git block was declared without a URL and no image was given.
    #[error("{name}: a git source or an image source must be specified when creating a component")]
    MissingSource { name: String },

    /// An immutable field differs from the stored revision.
    #[error("{field} field cannot be updated to {attempted}")]
    FieldChanged {
        field: &'static str,
        attempted: String,
    },

    /// Any change to a whole-spec-immutable resource.
    #[error("spec cannot be updated to {attempted}; current spec is {current}")]
    SpecChanged { attempted: String, current: String },

    #[error(
        "duplicate combination of Application ({application}) and Environment ({environment}), already bound by SnapshotEnvironmentBinding {conflicting}"
    )]
    DuplicateBinding {
        application: String,
        environment: String,
        conflicting: String,
    },

    /// The old and new objects of an update are of different kinds.
    #[error("runtime object is not of type {expected}, found {found}")]
    KindMismatch {
        expected: ResourceKind,
        found: ResourceKind,
    },
}

fn kind_noun(kind: &ResourceKind) -> &'static str {
    match kind {
        ResourceKind::Component => "component",
        ResourceKind::Environment => "environment",
        ResourceKind::PromotionRun => "promotion run",
        ResourceKind::SnapshotEnvironmentBinding => "snapshot environment binding",
    }
}

fn kind_article(kind: &ResourceKind) -> &'static str {
    match kind {
        ResourceKind::Environment => "an",
        _ => "a",
    }
}

/// The object store could not answer a query the gate depends on.
#[derive(Error, Debug)]
#[error("failed to list existing {kind} resources in namespace {namespace}: {source}")]
pub struct InfrastructureError {
    pub kind: ResourceKind,
    pub namespace: String,
    #[source]
    pub source: Box<dyn std::error::Error + Send + Sync>,
}

/// Either outcome that stops a check early, so validator steps can use `?`.
#[derive(Error, Debug)]
pub enum CheckError {
    #[error(transparent)]
    Violation(#[from] Violation),
    #[error(transparent)]
    Infrastructure(#[from] InfrastructureError),
}
