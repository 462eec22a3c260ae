use std::sync::Arc;

use async_trait::async_trait;
use pkg_admission::{AdmissionGate, AdmissionRequest, InMemoryStore, ObjectStore, Verdict};
use pkg_types::binding::{SnapshotEnvironmentBinding, SnapshotEnvironmentBindingSpec};
use pkg_types::component::{Component, ComponentSourceSpec, ComponentSpec, GitSource};
use pkg_types::environment::{
    ClusterType, Environment, EnvironmentSpec, KubernetesClusterCredentials,
    UnstableEnvironmentConfiguration,
};
use pkg_types::promotion::{ManualPromotionConfiguration, PromotionRun, PromotionRunSpec};
use pkg_types::{AnyResource, ObjectMeta, ResourceKind};

const NAMESPACE: &str = "team-a";

fn kubernetes_environment(name: &str, ingress_domain: &str) -> AnyResource {
    AnyResource::Environment(Environment {
        metadata: ObjectMeta::new(name, NAMESPACE),
        spec: EnvironmentSpec {
            display_name: "Kubernetes environment".to_string(),
            unstable_configuration_fields: Some(UnstableEnvironmentConfiguration {
                cluster_type: ClusterType::Kubernetes,
                credentials: KubernetesClusterCredentials {
                    target_namespace: "example-pipeline".to_string(),
                    api_url: "https://api.example.com:6443".to_string(),
                    ingress_domain: ingress_domain.to_string(),
                    cluster_credentials_secret: "cluster-credentials".to_string(),
                    ..Default::default()
                },
            }),
            ..Default::default()
        },
    })
}

fn git_component(name: &str, url: &str) -> AnyResource {
    AnyResource::Component(Component {
        metadata: ObjectMeta::new(name, NAMESPACE),
        spec: ComponentSpec {
            component_name: name.to_string(),
            application: "test-application".to_string(),
            source: ComponentSourceSpec {
                git: Some(GitSource {
                    url: url.to_string(),
                    ..Default::default()
                }),
            },
            ..Default::default()
        },
        ..Default::default()
    })
}

fn binding(name: &str, application: &str, environment: &str) -> AnyResource {
    AnyResource::SnapshotEnvironmentBinding(SnapshotEnvironmentBinding {
        metadata: ObjectMeta::new(name, NAMESPACE),
        spec: SnapshotEnvironmentBindingSpec {
            application: application.to_string(),
            environment: environment.to_string(),
            snapshot: "snapshot-c".to_string(),
            components: vec![],
        },
        ..Default::default()
    })
}

fn promotion_run(snapshot: &str) -> AnyResource {
    AnyResource::PromotionRun(PromotionRun {
        metadata: ObjectMeta::new("promote-a", NAMESPACE),
        spec: PromotionRunSpec {
            snapshot: snapshot.to_string(),
            application: "app-a".to_string(),
            manual_promotion: Some(ManualPromotionConfiguration {
                target_environment: "env-a".to_string(),
            }),
            automated_promotion: None,
        },
        ..Default::default()
    })
}

/// Admits creates against a shared store and persists whatever is allowed.
struct Registry {
    store: Arc<InMemoryStore>,
    gate: AdmissionGate,
}

impl Registry {
    fn new() -> Self {
        let store = Arc::new(InMemoryStore::new());
        let gate = AdmissionGate::new(store.clone());
        Self { store, gate }
    }

    async fn create(&self, resource: AnyResource) -> Verdict {
        let verdict = self
            .gate
            .admit(&AdmissionRequest::Create(resource.clone()))
            .await
            .unwrap();
        if verdict.is_allowed() {
            self.store.insert(resource).await;
        }
        verdict
    }

    async fn update(&self, old: AnyResource, new: AnyResource) -> Verdict {
        self.gate
            .admit(&AdmissionRequest::Update { old, new })
            .await
            .unwrap()
    }
}

#[tokio::test]
async fn kubernetes_environment_without_ingress_domain() {
    let registry = Registry::new();
    let verdict = registry
        .create(kubernetes_environment("kubernetes-environment", ""))
        .await;
    assert!(
        verdict
            .reason()
            .unwrap()
            .contains("ingress domain cannot be empty when the environment cluster type is Kubernetes")
    );
}

#[tokio::test]
async fn environment_name_with_uppercase() {
    let registry = Registry::new();
    let verdict = registry
        .create(kubernetes_environment("Kubernetes-environment", "apps.example.com"))
        .await;
    assert!(verdict.reason().unwrap().contains("invalid environment name"));
}

#[tokio::test]
async fn ssh_style_git_url() {
    let registry = Registry::new();
    let verdict = registry
        .create(git_component("frontend", "git@github.com:org/repo.git"))
        .await;
    assert!(verdict.reason().unwrap().contains("invalid URI for request"));
}

#[tokio::test]
async fn sequential_bindings_for_the_same_pair() {
    let registry = Registry::new();
    assert_eq!(
        registry.create(binding("seb-1", "app-c", "env-c")).await,
        Verdict::Allow
    );
    for name in ["seb-2", "seb-3"] {
        let verdict = registry.create(binding(name, "app-c", "env-c")).await;
        assert!(
            verdict
                .reason()
                .unwrap()
                .contains("duplicate combination of Application (app-c) and Environment (env-c)")
        );
    }
    assert_eq!(registry.store.len().await, 1);

    // The same pair in another namespace is unrelated.
    let mut elsewhere = binding("seb-1", "app-c", "env-c");
    elsewhere.metadata_mut().namespace = "team-b".to_string();
    assert_eq!(registry.create(elsewhere).await, Verdict::Allow);
}

#[tokio::test]
async fn promotion_run_snapshot_change() {
    let registry = Registry::new();
    let old = promotion_run("snap-a");
    assert_eq!(registry.create(old.clone()).await, Verdict::Allow);

    let verdict = registry.update(old, promotion_run("snap-a-changed")).await;
    let reason = verdict.reason().unwrap();
    assert!(reason.contains("snapshot: \"snap-a-changed\""));
    assert!(reason.contains("snapshot: \"snap-a\""));
    assert!(reason.contains("target_environment: \"env-a\""));
}

#[tokio::test]
async fn unchanged_update_is_allowed_for_every_kind() {
    let registry = Registry::new();
    let resources = [
        kubernetes_environment("kubernetes-environment", "apps.example.com"),
        git_component("frontend", "https://github.com/org/frontend"),
        binding("seb-1", "app-c", "env-c"),
        promotion_run("snap-a"),
    ];
    for resource in resources {
        assert!(registry.create(resource.clone()).await.is_allowed());
        assert_eq!(
            registry.update(resource.clone(), resource.clone()).await,
            Verdict::Allow,
            "{}",
            resource.kind()
        );
    }
}

#[tokio::test]
async fn mutable_fields_may_change() {
    let registry = Registry::new();

    let old = binding("seb-1", "app-c", "env-c");
    registry.create(old.clone()).await;
    let mut new = old.clone();
    if let AnyResource::SnapshotEnvironmentBinding(seb) = &mut new {
        seb.spec.snapshot = "snapshot-d".to_string();
    }
    assert_eq!(registry.update(old, new).await, Verdict::Allow);

    let old = git_component("frontend", "https://github.com/org/frontend");
    let mut new = old.clone();
    if let AnyResource::Component(component) = &mut new {
        component.spec.replicas = Some(3);
        component.spec.container_image = Some("quay.io/org/frontend:2".to_string());
    }
    assert_eq!(registry.update(old, new).await, Verdict::Allow);
}

#[tokio::test]
async fn immutable_fields_name_the_field() {
    let registry = Registry::new();
    let old = binding("seb-1", "app-c", "env-c");
    registry.create(old.clone()).await;

    let mut new = old.clone();
    if let AnyResource::SnapshotEnvironmentBinding(seb) = &mut new {
        seb.spec.environment = "env-d".to_string();
    }
    assert_eq!(
        registry.update(old, new).await,
        Verdict::Deny("environment field cannot be updated to env-d".to_string())
    );
}

struct UnreachableStore;

#[async_trait]
impl ObjectStore for UnreachableStore {
    async fn list(&self, _kind: ResourceKind, _namespace: &str) -> anyhow::Result<Vec<AnyResource>> {
        Err(anyhow::anyhow!("dial tcp 10.0.0.1:6443: connect: connection refused"))
    }
}

#[tokio::test]
async fn store_failures_surface_as_errors() {
    let gate = AdmissionGate::new(Arc::new(UnreachableStore));
    let err = gate
        .admit(&AdmissionRequest::Create(binding("seb-1", "app-c", "env-c")))
        .await
        .unwrap_err();
    assert!(err.to_string().contains("connection refused"));

    // Kinds that never consult the store are unaffected.
    let verdict = gate
        .admit(&AdmissionRequest::Create(git_component(
            "frontend",
            "https://github.com/org/frontend",
        )))
        .await
        .unwrap();
    assert_eq!(verdict, Verdict::Allow);
}
