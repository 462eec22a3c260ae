//! API group and route constants.

/// Prefix of the namespaced registry routes.
pub const REGISTRY_ROUTE_PREFIX: &str = "/apis/appstudio.redhat.com/v1alpha1";

/// Prefix of the AdmissionReview webhook routes. Full path = prefix + plural.
pub const WEBHOOK_ROUTE_PREFIX: &str = "/validate";

/// `apiVersion` of the AdmissionReview envelope.
pub const ADMISSION_REVIEW_VERSION: &str = "admission.k8s.io/v1";

/// HTTP-style code reported in a denied AdmissionResponse status.
pub const DENIED_STATUS_CODE: u16 = 403;

/// Namespace used when a manifest does not name one.
pub const DEFAULT_NAMESPACE: &str = "default";
