use axum::{
    Json,
    body::Bytes,
    extract::{Path as AxumPath, State},
    http::{HeaderMap, HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use chrono::Utc;
use pkg_admission::{AdmissionRequest, Verdict};
use pkg_types::{AnyResource, ResourceKind};
use serde_json::Value;
use tracing::{error, info, warn};

use crate::AppState;

// ============================================================
// Helpers
// ============================================================

fn resolve_kind(plural: &str) -> Result<ResourceKind, Response> {
    ResourceKind::parse(plural).ok_or_else(|| {
        (
            StatusCode::NOT_FOUND,
            format!("Unknown resource type: {}", plural),
        )
            .into_response()
    })
}

/// Namespaces and names become single store key segments.
pub(crate) fn check_segment(field: &str, value: &str) -> Result<(), Response> {
    let reason = if value.is_empty() {
        format!("{} must not be empty", field)
    } else if value.contains('/') {
        format!("{} {} must not contain '/'", field, value)
    } else {
        return Ok(());
    };
    Err((StatusCode::BAD_REQUEST, reason).into_response())
}

/// Decode a request body as a resource of `kind` living in `namespace`.
///
/// A missing `kind` or `metadata.namespace` is filled in from the route;
/// a conflicting one is rejected.
pub(crate) fn decode_body(
    kind: ResourceKind,
    namespace: &str,
    body: &[u8],
) -> Result<AnyResource, Response> {
    let bad_request = |msg: String| (StatusCode::BAD_REQUEST, msg).into_response();
    check_segment("namespace", namespace)?;

    let mut value: Value =
        serde_json::from_slice(body).map_err(|e| bad_request(format!("Invalid JSON: {}", e)))?;
    let object = value
        .as_object_mut()
        .ok_or_else(|| bad_request("Body must be a JSON object".to_string()))?;
    object
        .entry("kind")
        .or_insert_with(|| Value::String(kind.as_str().to_string()));

    let mut resource: AnyResource = serde_json::from_value(value)
        .map_err(|e| bad_request(format!("Invalid {}: {}", kind, e)))?;
    if resource.kind() != kind {
        return Err(bad_request(format!(
            "Body is a {}, but the route is for {}",
            resource.kind(),
            kind.plural()
        )));
    }

    let meta = resource.metadata_mut();
    if meta.namespace.is_empty() {
        meta.namespace = namespace.to_string();
    } else if meta.namespace != namespace {
        return Err(bad_request(format!(
            "metadata.namespace {} does not match the route namespace {}",
            meta.namespace, namespace
        )));
    }
    Ok(resource)
}

/// One `Warning: 299` header per admission warning.
pub(crate) fn warning_headers(verdict: &Verdict) -> HeaderMap {
    let mut headers = HeaderMap::new();
    for warning in verdict.warnings() {
        let text = format!("299 - \"{}\"", warning.replace('"', "\\\""));
        match HeaderValue::from_str(&text) {
            Ok(value) => {
                headers.append(header::WARNING, value);
            }
            Err(_) => warn!("Dropping warning that is not a valid header value: {}", warning),
        }
    }
    headers
}

/// Run the gate; `Err` is the response to send instead of persisting.
async fn admit(state: &AppState, request: &AdmissionRequest) -> Result<Verdict, Response> {
    match state.gate.admit(request).await {
        Ok(Verdict::Deny(reason)) => Err((StatusCode::FORBIDDEN, reason).into_response()),
        Ok(verdict) => Ok(verdict),
        Err(e) => Err((StatusCode::SERVICE_UNAVAILABLE, e.to_string()).into_response()),
    }
}

fn store_failure(action: &str, e: anyhow::Error) -> Response {
    error!("Failed to {}: {}", action, e);
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        format!("Failed to {}", action),
    )
        .into_response()
}

// ============================================================
// Registry
// ============================================================

pub async fn create_resource(
    State(state): State<AppState>,
    AxumPath((ns, plural)): AxumPath<(String, String)>,
    body: Bytes,
) -> Response {
    let kind = match resolve_kind(&plural) {
        Ok(kind) => kind,
        Err(resp) => return resp,
    };
    let mut resource = match decode_body(kind, &ns, &body) {
        Ok(resource) => resource,
        Err(resp) => return resp,
    };
    if let Err(resp) = check_segment("metadata.name", resource.name()) {
        return resp;
    }
    resource.metadata_mut().creation_timestamp = Some(Utc::now());

    let _write = state.write_lock.lock().await;

    match state
        .store
        .get_resource(kind, &ns, resource.name())
        .await
    {
        Ok(Some(_)) => {
            return (
                StatusCode::CONFLICT,
                format!("{} {}/{} already exists", kind, ns, resource.name()),
            )
                .into_response();
        }
        Ok(None) => {}
        Err(e) => return store_failure("read existing resource", e),
    }

    let verdict = match admit(&state, &AdmissionRequest::Create(resource.clone())).await {
        Ok(verdict) => verdict,
        Err(resp) => return resp,
    };

    if let Err(e) = state.store.put_resource(&resource).await {
        return store_failure("store resource", e);
    }
    info!("Created {} {}", kind, resource.metadata().key());
    (StatusCode::CREATED, warning_headers(&verdict), Json(resource)).into_response()
}

pub async fn list_resources(
    State(state): State<AppState>,
    AxumPath((ns, plural)): AxumPath<(String, String)>,
) -> Response {
    let kind = match resolve_kind(&plural) {
        Ok(kind) => kind,
        Err(resp) => return resp,
    };
    if let Err(resp) = check_segment("namespace", &ns) {
        return resp;
    }
    match state.store.list_resources(kind, &ns).await {
        Ok(resources) => (StatusCode::OK, Json(resources)).into_response(),
        Err(e) => store_failure("list resources", e),
    }
}

pub async fn get_resource(
    State(state): State<AppState>,
    AxumPath((ns, plural, name)): AxumPath<(String, String, String)>,
) -> Response {
    let kind = match resolve_kind(&plural) {
        Ok(kind) => kind,
        Err(resp) => return resp,
    };
    match state.store.get_resource(kind, &ns, &name).await {
        Ok(Some(resource)) => (StatusCode::OK, Json(resource)).into_response(),
        Ok(None) => StatusCode::NOT_FOUND.into_response(),
        Err(e) => store_failure("read resource", e),
    }
}

pub async fn update_resource(
    State(state): State<AppState>,
    AxumPath((ns, plural, name)): AxumPath<(String, String, String)>,
    body: Bytes,
) -> Response {
    let kind = match resolve_kind(&plural) {
        Ok(kind) => kind,
        Err(resp) => return resp,
    };
    if let Err(resp) = check_segment("name", &name) {
        return resp;
    }
    let mut resource = match decode_body(kind, &ns, &body) {
        Ok(resource) => resource,
        Err(resp) => return resp,
    };
    if resource.name().is_empty() {
        resource.metadata_mut().name = name.clone();
    } else if resource.name() != name {
        return (
            StatusCode::BAD_REQUEST,
            format!(
                "metadata.name {} does not match the route name {}",
                resource.name(),
                name
            ),
        )
            .into_response();
    }

    let _write = state.write_lock.lock().await;

    let existing = match state.store.get_resource(kind, &ns, &name).await {
        Ok(Some(existing)) => existing,
        Ok(None) => return StatusCode::NOT_FOUND.into_response(),
        Err(e) => return store_failure("read existing resource", e),
    };
    resource.metadata_mut().creation_timestamp = existing.metadata().creation_timestamp;

    let request = AdmissionRequest::Update {
        old: existing,
        new: resource.clone(),
    };
    let verdict = match admit(&state, &request).await {
        Ok(verdict) => verdict,
        Err(resp) => return resp,
    };

    if let Err(e) = state.store.put_resource(&resource).await {
        return store_failure("store resource", e);
    }
    info!("Updated {} {}", kind, resource.metadata().key());
    (StatusCode::OK, warning_headers(&verdict), Json(resource)).into_response()
}

pub async fn delete_resource(
    State(state): State<AppState>,
    AxumPath((ns, plural, name)): AxumPath<(String, String, String)>,
) -> Response {
    let kind = match resolve_kind(&plural) {
        Ok(kind) => kind,
        Err(resp) => return resp,
    };

    let _write = state.write_lock.lock().await;

    let existing = match state.store.get_resource(kind, &ns, &name).await {
        Ok(Some(existing)) => existing,
        Ok(None) => return StatusCode::NOT_FOUND.into_response(),
        Err(e) => return store_failure("read existing resource", e),
    };
    let verdict = match admit(&state, &AdmissionRequest::Delete(existing.clone())).await {
        Ok(verdict) => verdict,
        Err(resp) => return resp,
    };

    if let Err(e) = state.store.delete_resource(kind, &ns, &name).await {
        return store_failure("delete resource", e);
    }
    info!("Deleted {} {}/{}", kind, ns, name);
    (StatusCode::OK, warning_headers(&verdict), Json(existing)).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;
    use pkg_state::StateStore;
    use serde_json::json;

    async fn state() -> AppState {
        AppState::new(StateStore::in_memory().await.unwrap(), None)
    }

    fn path2(ns: &str, plural: &str) -> AxumPath<(String, String)> {
        AxumPath((ns.to_string(), plural.to_string()))
    }

    fn path3(ns: &str, plural: &str, name: &str) -> AxumPath<(String, String, String)> {
        AxumPath((ns.to_string(), plural.to_string(), name.to_string()))
    }

    fn body(value: Value) -> Bytes {
        Bytes::from(serde_json::to_vec(&value).unwrap())
    }

    fn binding(name: &str, environment: &str) -> Bytes {
        body(json!({
            "kind": "SnapshotEnvironmentBinding",
            "metadata": { "name": name },
            "spec": { "application": "app-c", "environment": environment, "snapshot": "snap" }
        }))
    }

    async fn text(resp: Response) -> String {
        let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn create_persists_admitted_resource() {
        let state = state().await;
        let resp = create_resource(
            State(state.clone()),
            path2("team-a", "snapshotenvironmentbindings"),
            binding("seb-1", "env-c"),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::CREATED);

        let stored = state
            .store
            .get_resource(ResourceKind::SnapshotEnvironmentBinding, "team-a", "seb-1")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.namespace(), "team-a");
        assert!(stored.metadata().creation_timestamp.is_some());
    }

    #[tokio::test]
    async fn duplicate_pair_is_forbidden() {
        let state = state().await;
        let path = || path2("team-a", "snapshotenvironmentbindings");
        create_resource(State(state.clone()), path(), binding("seb-1", "env-c")).await;

        let resp = create_resource(State(state.clone()), path(), binding("seb-2", "env-c")).await;
        assert_eq!(resp.status(), StatusCode::FORBIDDEN);
        assert!(
            text(resp)
                .await
                .contains("duplicate combination of Application (app-c) and Environment (env-c)")
        );

        let resp = create_resource(State(state), path(), binding("seb-1", "env-d")).await;
        assert_eq!(resp.status(), StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn update_goes_through_immutability() {
        let state = state().await;
        create_resource(
            State(state.clone()),
            path2("team-a", "snapshotenvironmentbindings"),
            binding("seb-1", "env-c"),
        )
        .await;

        let resp = update_resource(
            State(state.clone()),
            path3("team-a", "snapshotenvironmentbindings", "seb-1"),
            binding("seb-1", "env-d"),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::FORBIDDEN);
        assert_eq!(
            text(resp).await,
            "environment field cannot be updated to env-d"
        );

        let resp = update_resource(
            State(state.clone()),
            path3("team-a", "snapshotenvironmentbindings", "seb-1"),
            binding("seb-1", "env-c"),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::OK);

        let resp = update_resource(
            State(state),
            path3("team-a", "snapshotenvironmentbindings", "missing"),
            binding("missing", "env-c"),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn warnings_become_headers() {
        let state = state().await;
        let resp = create_resource(
            State(state),
            path2("team-a", "components"),
            body(json!({
                "metadata": { "name": "frontend" },
                "spec": { "componentName": "frontend", "application": "shop" }
            })),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::CREATED);
        let warning = resp.headers().get(header::WARNING).unwrap().to_str().unwrap();
        assert!(warning.starts_with("299 - \"frontend: no git or image source"));
    }

    #[tokio::test]
    async fn list_get_and_delete() {
        let state = state().await;
        let path = || path2("team-a", "environments");
        for name in ["dev", "prod"] {
            let resp = create_resource(
                State(state.clone()),
                path(),
                body(json!({ "metadata": { "name": name }, "spec": {} })),
            )
            .await;
            assert_eq!(resp.status(), StatusCode::CREATED);
        }

        let resp = list_resources(State(state.clone()), path()).await;
        let listed: Vec<AnyResource> = serde_json::from_str(&text(resp).await).unwrap();
        assert_eq!(listed.len(), 2);

        let resp = get_resource(State(state.clone()), path3("team-a", "environments", "dev")).await;
        assert_eq!(resp.status(), StatusCode::OK);

        let resp =
            delete_resource(State(state.clone()), path3("team-a", "environments", "dev")).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let resp = get_resource(State(state), path3("team-a", "environments", "dev")).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn namespaces_and_names_are_single_segments() {
        let state = state().await;
        let resp = create_resource(
            State(state.clone()),
            path2("team/x", "snapshotenvironmentbindings"),
            binding("seb-1", "env-c"),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let resp = create_resource(
            State(state.clone()),
            path2("team", "snapshotenvironmentbindings"),
            binding("", "env-c"),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert_eq!(text(resp).await, "metadata.name must not be empty");

        let resp = create_resource(
            State(state.clone()),
            path2("team", "snapshotenvironmentbindings"),
            binding("a/b", "env-c"),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let resp = list_resources(State(state.clone()), path2("team/x", "promotionruns")).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        // Nothing leaked into "team", so the pair is still free there.
        let resp = create_resource(
            State(state),
            path2("team", "snapshotenvironmentbindings"),
            binding("seb-2", "env-c"),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::CREATED);
    }

    #[tokio::test]
    async fn bad_requests() {
        let state = state().await;
        let resp = create_resource(State(state.clone()), path2("team-a", "pods"), binding("x", "y")).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);

        let resp = create_resource(
            State(state.clone()),
            path2("team-a", "components"),
            binding("seb-1", "env-c"),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let resp = create_resource(
            State(state),
            path2("team-a", "environments"),
            body(json!({ "metadata": { "name": "dev", "namespace": "team-b" } })),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }
}
