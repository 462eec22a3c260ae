use axum::{
    Router, middleware,
    routing::{get, post},
};
use pkg_constants::api::{REGISTRY_ROUTE_PREFIX, WEBHOOK_ROUTE_PREFIX};
use pkg_state::client::StateStore;
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tracing::info;

use crate::AppState;
use crate::auth::auth_middleware;
use crate::handlers::{admission, health, resources};
use crate::request_id::request_id_middleware;

/// Server configuration passed from the binary's CLI.
pub struct ServerConfig {
    pub addr: SocketAddr,
    pub data_dir: String,
    pub token: Option<String>,
}

/// All routes: token-protected registry, open webhook and health probe.
pub fn build_router(state: AppState) -> Router {
    let registry_routes = Router::new()
        .route(
            &format!("{}/namespaces/{{ns}}/{{plural}}", REGISTRY_ROUTE_PREFIX),
            post(resources::create_resource).get(resources::list_resources),
        )
        .route(
            &format!("{}/namespaces/{{ns}}/{{plural}}/{{name}}", REGISTRY_ROUTE_PREFIX),
            get(resources::get_resource)
                .put(resources::update_resource)
                .delete(resources::delete_resource),
        )
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    Router::new()
        .route("/healthz", get(health::healthz))
        .route(
            &format!("{}/{{plural}}", WEBHOOK_ROUTE_PREFIX),
            post(admission::validate_review),
        )
        .merge(registry_routes)
        .layer(middleware::from_fn(request_id_middleware))
        .with_state(state)
}

pub async fn start_server(config: ServerConfig) -> anyhow::Result<()> {
    let store = StateStore::new(&config.data_dir).await?;
    let state = AppState::new(store.clone(), config.token);
    let app = build_router(state);

    info!("Starting admission server on {}", config.addr);
    let listener = TcpListener::bind(config.addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("Shutdown signal received");
        })
        .await?;

    store.close().await?;
    Ok(())
}
