use axum::{
    extract::{Request, State},
    http::{StatusCode, header},
    middleware::Next,
    response::Response,
};
use tracing::{debug, warn};

use crate::AppState;

/// Middleware: Authenticates registry requests using a Bearer token.
/// When the server runs without a token every request is let through.
pub async fn auth_middleware(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    let Some(expected) = state.token.as_deref() else {
        return Ok(next.run(req).await);
    };

    let token = match req.headers().get(header::AUTHORIZATION) {
        Some(value) => {
            let value_str = value.to_str().map_err(|_| StatusCode::UNAUTHORIZED)?;
            value_str
                .strip_prefix("Bearer ")
                .ok_or(StatusCode::UNAUTHORIZED)?
                .to_string()
        }
        None => {
            debug!("Missing Authorization header on {}", req.uri().path());
            return Err(StatusCode::UNAUTHORIZED);
        }
    };

    if token == expected {
        Ok(next.run(req).await)
    } else {
        warn!("Invalid Bearer token provided");
        Err(StatusCode::UNAUTHORIZED)
    }
}
