//! State store key constants.

/// Root of every resource key. Full key = `REGISTRY_PREFIX/<plural>/<namespace>/<name>`.
pub const REGISTRY_PREFIX: &str = "/registry";
