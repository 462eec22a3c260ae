use async_trait::async_trait;
use pkg_state::StateStore;
use pkg_types::{AnyResource, ResourceKind};
use tokio::sync::RwLock;

/// Read access to existing resources, as seen by the validators.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Every stored resource of `kind` in `namespace`.
    async fn list(&self, kind: ResourceKind, namespace: &str) -> anyhow::Result<Vec<AnyResource>>;
}

#[async_trait]
impl ObjectStore for StateStore {
    async fn list(&self, kind: ResourceKind, namespace: &str) -> anyhow::Result<Vec<AnyResource>> {
        self.list_resources(kind, namespace).await
    }
}

/// Store held in process memory; used by offline checks and tests.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    resources: RwLock<Vec<AnyResource>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_resources(resources: Vec<AnyResource>) -> Self {
        Self {
            resources: RwLock::new(resources),
        }
    }

    /// Insert a resource, replacing any existing one with the same kind, namespace and name.
    pub async fn insert(&self, resource: AnyResource) {
        let mut resources = self.resources.write().await;
        resources.retain(|existing| {
            !(existing.kind() == resource.kind()
                && existing.namespace() == resource.namespace()
                && existing.name() == resource.name())
        });
        resources.push(resource);
    }

    pub async fn len(&self) -> usize {
        self.resources.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.resources.read().await.is_empty()
    }
}

#[async_trait]
impl ObjectStore for InMemoryStore {
    async fn list(&self, kind: ResourceKind, namespace: &str) -> anyhow::Result<Vec<AnyResource>> {
        let resources = self.resources.read().await;
        Ok(resources
            .iter()
            .filter(|r| r.kind() == kind && r.namespace() == namespace)
            .cloned()
            .collect())
    }
}
