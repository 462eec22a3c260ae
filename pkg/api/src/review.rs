//! `admission.k8s.io/v1` AdmissionReview wire types.
//!
//! Only the fields the gate reads or answers with are modelled; anything
//! else in an incoming review is ignored.

use pkg_admission::{AdmissionRequest, Verdict};
use pkg_constants::api::{ADMISSION_REVIEW_VERSION, DENIED_STATUS_CODE};
use pkg_types::{AnyResource, ResourceKind};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdmissionReview {
    #[serde(default)]
    pub api_version: String,
    #[serde(default)]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request: Option<ReviewRequest>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response: Option<ReviewResponse>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Operation {
    Create,
    Update,
    Delete,
    Connect,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewRequest {
    pub uid: String,
    pub operation: Operation,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub object: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub old_object: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dry_run: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewResponse {
    pub uid: String,
    pub allowed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<ReviewStatus>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewStatus {
    pub code: u16,
    pub message: String,
}

/// Why a review could not be turned into an admission request.
#[derive(Debug, Error)]
pub enum ReviewError {
    #[error("AdmissionReview has no request")]
    MissingRequest,
    #[error("{operation:?} request has no {field}")]
    MissingObject {
        operation: Operation,
        field: &'static str,
    },
    #[error("{field} is not a valid {kind}: {source}")]
    InvalidObject {
        field: &'static str,
        kind: ResourceKind,
        #[source]
        source: serde_json::Error,
    },
    #[error("{field} is a {found}, expected a {expected}")]
    WrongKind {
        field: &'static str,
        expected: ResourceKind,
        found: ResourceKind,
    },
    #[error("operation {0:?} is not handled")]
    UnsupportedOperation(Operation),
}

impl ReviewRequest {
    /// Build the gate request for a review arriving on the `kind` route.
    ///
    /// Returns `Ok(None)` for a delete without `oldObject`, which needs no decision.
    pub fn to_admission(&self, kind: ResourceKind) -> Result<Option<AdmissionRequest>, ReviewError> {
        let request = match self.operation {
            Operation::Create => {
                AdmissionRequest::Create(self.decode(kind, "object", self.object.as_ref())?)
            }
            Operation::Update => AdmissionRequest::Update {
                old: self.decode_any("oldObject", self.old_object.as_ref(), kind)?,
                new: self.decode(kind, "object", self.object.as_ref())?,
            },
            Operation::Delete => match self.old_object.as_ref() {
                Some(_) => AdmissionRequest::Delete(self.decode(
                    kind,
                    "oldObject",
                    self.old_object.as_ref(),
                )?),
                None => return Ok(None),
            },
            Operation::Connect => return Err(ReviewError::UnsupportedOperation(self.operation)),
        };
        Ok(Some(request))
    }

    /// Decode an object that must be of the route's kind.
    fn decode(
        &self,
        kind: ResourceKind,
        field: &'static str,
        value: Option<&Value>,
    ) -> Result<AnyResource, ReviewError> {
        let resource = self.decode_any(field, value, kind)?;
        if resource.kind() != kind {
            return Err(ReviewError::WrongKind {
                field,
                expected: kind,
                found: resource.kind(),
            });
        }
        Ok(resource)
    }

    /// Decode an object of any guarded kind, defaulting a missing `kind` to `fallback`.
    fn decode_any(
        &self,
        field: &'static str,
        value: Option<&Value>,
        fallback: ResourceKind,
    ) -> Result<AnyResource, ReviewError> {
        let mut value = value
            .cloned()
            .ok_or(ReviewError::MissingObject {
                operation: self.operation,
                field,
            })?;
        if let Some(object) = value.as_object_mut() {
            object
                .entry("kind")
                .or_insert_with(|| Value::String(fallback.as_str().to_string()));
        }
        let mut resource: AnyResource =
            serde_json::from_value(value).map_err(|source| ReviewError::InvalidObject {
                field,
                kind: fallback,
                source,
            })?;

        // Objects under review may omit the namespace; the request carries it.
        if resource.namespace().is_empty() {
            if let Some(namespace) = &self.namespace {
                resource.metadata_mut().namespace = namespace.clone();
            }
        }
        Ok(resource)
    }
}

impl AdmissionReview {
    /// Wrap a verdict into the response review for `uid`.
    pub fn from_verdict(uid: &str, verdict: &Verdict) -> Self {
        let response = match verdict {
            Verdict::Deny(reason) => ReviewResponse {
                uid: uid.to_string(),
                allowed: false,
                status: Some(ReviewStatus {
                    code: DENIED_STATUS_CODE,
                    message: reason.clone(),
                }),
                warnings: vec![],
            },
            _ => ReviewResponse {
                uid: uid.to_string(),
                allowed: true,
                status: None,
                warnings: verdict.warnings().to_vec(),
            },
        };
        Self {
            api_version: ADMISSION_REVIEW_VERSION.to_string(),
            kind: "AdmissionReview".to_string(),
            request: None,
            response: Some(response),
        }
    }
}
