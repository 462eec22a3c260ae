use pkg_constants::state::REGISTRY_PREFIX;
use pkg_types::{AnyResource, ResourceKind};
use slatedb::Db;
use slatedb::object_store::ObjectStore;
use slatedb::object_store::local::LocalFileSystem;
use slatedb::object_store::memory::InMemory;
use slatedb::object_store::path::Path;
use std::sync::Arc;
use tracing::{debug, info};

/// Key of one resource: `/registry/<plural>/<namespace>/<name>`.
pub fn resource_key(kind: ResourceKind, namespace: &str, name: &str) -> String {
    format!("{}/{}/{}/{}", REGISTRY_PREFIX, kind.plural(), namespace, name)
}

/// Prefix shared by every resource of `kind` in `namespace`.
pub fn namespace_prefix(kind: ResourceKind, namespace: &str) -> String {
    format!("{}/{}/{}/", REGISTRY_PREFIX, kind.plural(), namespace)
}

/// Persistent resource store backed by SlateDB.
///
/// Resources are stored as their kind-tagged JSON under [`resource_key`].
/// In production the local filesystem would be swapped for S3/R2/MinIO via
/// the `object_store` crate.
#[derive(Clone)]
pub struct StateStore {
    db: Db,
}

impl StateStore {
    /// Open (or create) a state store rooted at `path` on the local filesystem.
    pub async fn new(path: &str) -> anyhow::Result<Self> {
        info!("Opening SlateDB state store at {}", path);

        // Ensure the data directory exists before opening the object store
        std::fs::create_dir_all(path)
            .map_err(|e| anyhow::anyhow!("Failed to create data directory {}: {}", path, e))?;

        let object_store = Arc::new(
            LocalFileSystem::new_with_prefix(path)
                .map_err(|e| anyhow::anyhow!("Failed to create local object store: {}", e))?,
        );
        Self::open(object_store).await
    }

    /// Open a throwaway store held entirely in memory.
    pub async fn in_memory() -> anyhow::Result<Self> {
        Self::open(Arc::new(InMemory::new())).await
    }

    async fn open(object_store: Arc<dyn ObjectStore>) -> anyhow::Result<Self> {
        let db = Db::open(Path::from("/"), object_store)
            .await
            .map_err(|e| anyhow::anyhow!("Failed to open SlateDB: {}", e))?;
        Ok(Self { db })
    }

    // ─── Typed resource access ───────────────────────────────────────────

    /// Write a resource under its registry key, replacing any previous revision.
    pub async fn put_resource(&self, resource: &AnyResource) -> anyhow::Result<()> {
        check_segment("namespace", resource.namespace())?;
        check_segment("name", resource.name())?;
        let key = resource_key(resource.kind(), resource.namespace(), resource.name());
        let data = serde_json::to_vec(resource)?;
        self.put(&key, &data).await?;
        debug!("Stored {}", key);
        Ok(())
    }

    /// Fetch one resource, or `None` if it does not exist.
    pub async fn get_resource(
        &self,
        kind: ResourceKind,
        namespace: &str,
        name: &str,
    ) -> anyhow::Result<Option<AnyResource>> {
        let key = resource_key(kind, namespace, name);
        match self.get(&key).await? {
            Some(data) => Ok(Some(decode(&key, &data)?)),
            None => Ok(None),
        }
    }

    /// List every resource of `kind` in `namespace`, ordered by name.
    /// An entry that fails to decode fails the whole listing.
    pub async fn list_resources(
        &self,
        kind: ResourceKind,
        namespace: &str,
    ) -> anyhow::Result<Vec<AnyResource>> {
        let prefix = namespace_prefix(kind, namespace);
        let mut resources = Vec::new();
        for (key, data) in self.list_prefix(&prefix).await? {
            let resource = decode(&key, &data)?;
            // Keys written before segments were checked may nest under this prefix.
            if resource.namespace() == namespace {
                resources.push(resource);
            }
        }
        Ok(resources)
    }

    pub async fn delete_resource(
        &self,
        kind: ResourceKind,
        namespace: &str,
        name: &str,
    ) -> anyhow::Result<()> {
        self.delete(&resource_key(kind, namespace, name)).await
    }

    // ─── Raw key/value access ────────────────────────────────────────────

    /// Store a value under the given key.
    pub async fn put(&self, key: &str, value: &[u8]) -> anyhow::Result<()> {
        self.db
            .put(key.as_bytes(), value)
            .await
            .map(|_| ())
            .map_err(|e| anyhow::anyhow!("SlateDB put failed: {}", e))
    }

    /// Retrieve the value for a key, or `None` if it does not exist.
    pub async fn get(&self, key: &str) -> anyhow::Result<Option<Vec<u8>>> {
        match self.db.get(key.as_bytes()).await {
            Ok(Some(bytes)) => Ok(Some(bytes.to_vec())),
            Ok(None) => Ok(None),
            Err(e) => Err(anyhow::anyhow!("SlateDB get failed: {}", e)),
        }
    }

    /// Delete a key from the store.
    pub async fn delete(&self, key: &str) -> anyhow::Result<()> {
        self.db
            .delete(key.as_bytes())
            .await
            .map(|_| ())
            .map_err(|e| anyhow::anyhow!("SlateDB delete failed: {}", e))
    }

    /// List all key-value pairs whose keys start with `prefix`, in key order.
    /// A failed scan step is an error rather than a shortened listing.
    pub async fn list_prefix(&self, prefix: &str) -> anyhow::Result<Vec<(String, Vec<u8>)>> {
        let mut results = Vec::new();
        let mut iter = self
            .db
            .scan_prefix(prefix.as_bytes())
            .await
            .map_err(|e| anyhow::anyhow!("SlateDB scan_prefix failed: {}", e))?;

        while let Some(kv) = iter
            .next()
            .await
            .map_err(|e| anyhow::anyhow!("SlateDB scan failed: {}", e))?
        {
            let key = String::from_utf8_lossy(&kv.key).to_string();
            results.push((key, kv.value.to_vec()));
        }
        Ok(results)
    }

    /// Gracefully close the state store.
    pub async fn close(self) -> anyhow::Result<()> {
        info!("Closing SlateDB state store");
        self.db
            .close()
            .await
            .map_err(|e| anyhow::anyhow!("SlateDB close failed: {}", e))
    }
}

/// A namespace or name must be one non-empty key segment.
fn check_segment(field: &str, value: &str) -> anyhow::Result<()> {
    if value.is_empty() {
        anyhow::bail!("resource {} must not be empty", field);
    }
    if value.contains('/') {
        anyhow::bail!("resource {} {:?} must not contain '/'", field, value);
    }
    Ok(())
}

fn decode(key: &str, data: &[u8]) -> anyhow::Result<AnyResource> {
    serde_json::from_slice(data).map_err(|e| anyhow::anyhow!("Corrupt entry at {}: {}", key, e))
}
