//! Admission gate for the AppStudio promotion resources.
//!
//! Every create, update or delete of a Component, Environment, PromotionRun
//! or SnapshotEnvironmentBinding is passed to [`AdmissionGate::admit`], which
//! answers with a [`Verdict`] before the change is persisted.

pub mod binding;
pub mod component;
pub mod environment;
pub mod error;
pub mod gate;
pub mod immutable;
pub mod promotion_run;
pub mod store;
pub mod unique;
pub mod validator;
pub mod verdict;

pub use error::{InfrastructureError, Violation};
pub use gate::{AdmissionGate, AdmissionRequest};
pub use store::{InMemoryStore, ObjectStore};
pub use validator::Validator;
pub use verdict::Verdict;
