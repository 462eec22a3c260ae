use axum::{
    Json,
    body::Bytes,
    extract::{Path as AxumPath, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use pkg_admission::Verdict;
use pkg_types::ResourceKind;
use tracing::{debug, error, warn};

use crate::AppState;
use crate::review::{AdmissionReview, ReviewError};

/// `POST /validate/{plural}`: answer an AdmissionReview sent by an API server.
///
/// Nothing is persisted here; the caller stores the object once allowed.
pub async fn validate_review(
    State(state): State<AppState>,
    AxumPath(plural): AxumPath<String>,
    body: Bytes,
) -> Response {
    let Some(kind) = ResourceKind::parse(&plural) else {
        return (
            StatusCode::NOT_FOUND,
            format!("Unknown resource type: {}", plural),
        )
            .into_response();
    };

    let review: AdmissionReview = match serde_json::from_slice(&body) {
        Ok(review) => review,
        Err(e) => return invalid_review(e.to_string()),
    };
    let Some(request) = review.request else {
        return invalid_review(ReviewError::MissingRequest.to_string());
    };
    debug!(
        "Reviewing {:?} of {} {}/{} (uid={})",
        request.operation,
        kind,
        request.namespace.as_deref().unwrap_or_default(),
        request.name.as_deref().unwrap_or_default(),
        request.uid
    );

    let verdict = match request.to_admission(kind) {
        Ok(Some(admission)) => match state.gate.admit(&admission).await {
            Ok(verdict) => verdict,
            Err(e) => {
                error!("Admission review {} failed: {}", request.uid, e);
                return (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response();
            }
        },
        Ok(None) => Verdict::Allow,
        Err(e) => return invalid_review(e.to_string()),
    };

    (
        StatusCode::OK,
        Json(AdmissionReview::from_verdict(&request.uid, &verdict)),
    )
        .into_response()
}

fn invalid_review(reason: String) -> Response {
    warn!("Rejecting malformed AdmissionReview: {}", reason);
    (
        StatusCode::BAD_REQUEST,
        format!("Invalid AdmissionReview: {}", reason),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;
    use pkg_state::StateStore;
    use pkg_types::AnyResource;
    use serde_json::{Value, json};

    async fn state() -> AppState {
        AppState::new(StateStore::in_memory().await.unwrap(), None)
    }

    fn review(operation: &str, object: Value, old_object: Option<Value>) -> Bytes {
        let mut request = json!({
            "uid": "uid-1",
            "operation": operation,
            "namespace": "team-a",
            "object": object,
        });
        if let Some(old) = old_object {
            request["oldObject"] = old;
        }
        let review = json!({
            "apiVersion": "admission.k8s.io/v1",
            "kind": "AdmissionReview",
            "request": request,
        });
        Bytes::from(serde_json::to_vec(&review).unwrap())
    }

    fn promotion_run(snapshot: &str) -> Value {
        json!({
            "apiVersion": "appstudio.redhat.com/v1alpha1",
            "kind": "PromotionRun",
            "metadata": { "name": "promote-a", "namespace": "team-a" },
            "spec": {
                "snapshot": snapshot,
                "application": "app-a",
                "manualPromotion": { "targetEnvironment": "env-a" }
            }
        })
    }

    async fn json_body(resp: Response) -> Value {
        let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn allowed_review() {
        let resp = validate_review(
            State(state().await),
            AxumPath("promotionruns".to_string()),
            review("CREATE", promotion_run("snap-a"), None),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::OK);
        let body = json_body(resp).await;
        assert_eq!(body["response"]["uid"], "uid-1");
        assert_eq!(body["response"]["allowed"], true);
    }

    #[tokio::test]
    async fn denied_review() {
        let resp = validate_review(
            State(state().await),
            AxumPath("promotionruns".to_string()),
            review(
                "UPDATE",
                promotion_run("snap-a-changed"),
                Some(promotion_run("snap-a")),
            ),
        )
        .await;
        let body = json_body(resp).await;
        assert_eq!(body["response"]["allowed"], false);
        assert_eq!(body["response"]["status"]["code"], 403);
        let message = body["response"]["status"]["message"].as_str().unwrap();
        assert!(message.starts_with("spec cannot be updated to"));
    }

    #[tokio::test]
    async fn review_does_not_persist() {
        let state = state().await;
        let binding = json!({
            "kind": "SnapshotEnvironmentBinding",
            "metadata": { "name": "seb-1" },
            "spec": { "application": "app-c", "environment": "env-c", "snapshot": "snap" }
        });
        for _ in 0..2 {
            let resp = validate_review(
                State(state.clone()),
                AxumPath("snapshotenvironmentbindings".to_string()),
                review("CREATE", binding.clone(), None),
            )
            .await;
            assert_eq!(json_body(resp).await["response"]["allowed"], true);
        }

        // Once the binding is stored, a second claimant is denied.
        let stored: AnyResource = serde_json::from_value(json!({
            "kind": "SnapshotEnvironmentBinding",
            "metadata": { "name": "seb-1", "namespace": "team-a" },
            "spec": { "application": "app-c", "environment": "env-c", "snapshot": "snap" }
        }))
        .unwrap();
        state.store.put_resource(&stored).await.unwrap();
        let mut other = binding.clone();
        other["metadata"]["name"] = json!("seb-2");
        let resp = validate_review(
            State(state),
            AxumPath("snapshotenvironmentbindings".to_string()),
            review("CREATE", other, None),
        )
        .await;
        assert_eq!(json_body(resp).await["response"]["allowed"], false);
    }

    #[tokio::test]
    async fn malformed_review() {
        let resp = validate_review(
            State(state().await),
            AxumPath("components".to_string()),
            Bytes::from_static(b"{not json"),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let resp = validate_review(
            State(state().await),
            AxumPath("components".to_string()),
            Bytes::from_static(br#"{"apiVersion":"admission.k8s.io/v1","kind":"AdmissionReview"}"#),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let resp = validate_review(
            State(state().await),
            AxumPath("pods".to_string()),
            review("CREATE", json!({}), None),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }
}
