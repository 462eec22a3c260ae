pub mod auth;
pub mod handlers;
pub mod request_id;
pub mod review;
pub mod server;

use std::sync::Arc;

use pkg_admission::AdmissionGate;
use pkg_state::client::StateStore;
use tokio::sync::Mutex;

/// Shared application state injected into all Axum handlers.
#[derive(Clone)]
pub struct AppState {
    pub store: StateStore,
    pub gate: Arc<AdmissionGate>,
    /// Bearer token required on registry routes; `None` leaves them open.
    pub token: Option<String>,
    /// Held across admit-then-persist so uniqueness checks see every prior write.
    pub write_lock: Arc<Mutex<()>>,
}

impl AppState {
    pub fn new(store: StateStore, token: Option<String>) -> Self {
        let gate = AdmissionGate::new(Arc::new(store.clone()));
        Self {
            store,
            gate: Arc::new(gate),
            token,
            write_lock: Arc::new(Mutex::new(())),
        }
    }
}
