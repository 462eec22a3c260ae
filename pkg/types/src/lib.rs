//! Resource types for the AppStudio promotion workflow and the pure syntax
//! validators shared by the admission gate.

pub mod binding;
pub mod component;
pub mod config;
pub mod environment;
pub mod meta;
pub mod promotion;
pub mod resource;
pub mod validate;

pub use binding::SnapshotEnvironmentBinding;
pub use component::Component;
pub use environment::Environment;
pub use meta::ObjectMeta;
pub use promotion::PromotionRun;
pub use resource::{AnyResource, Resource, ResourceKind};
