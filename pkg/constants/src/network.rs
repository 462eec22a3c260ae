//! Network-related constants.

/// Default port for the admission server (webhook + registry).
pub const DEFAULT_API_PORT: u16 = 9443;

/// Default server address used by the CLI.
pub const DEFAULT_API_ADDR: &str = "http://127.0.0.1:9443";
