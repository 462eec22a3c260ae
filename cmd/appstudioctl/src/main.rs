use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use pkg_admission::{AdmissionGate, AdmissionRequest, InMemoryStore, Verdict};
use pkg_constants::api::{DEFAULT_NAMESPACE, REGISTRY_ROUTE_PREFIX};
use pkg_constants::network::DEFAULT_API_ADDR;
use pkg_types::{AnyResource, ResourceKind};
use serde::Deserialize;
use serde_json::Value;
use tracing::info;

#[derive(Parser)]
#[command(name = "appstudioctl", about = "CLI tool for AppStudio promotion resources")]
struct Cli {
    /// Server API endpoint
    #[arg(long, default_value = DEFAULT_API_ADDR)]
    server: String,

    /// Bearer token for the registry routes
    #[arg(long)]
    token: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create or update the resources in a YAML manifest
    Apply {
        #[arg(short, long)]
        file: String,
        /// Namespace for manifests that do not name one
        #[arg(short, long, default_value = DEFAULT_NAMESPACE)]
        namespace: String,
    },
    /// List resources of a kind, or show one by name
    Get {
        kind: String,
        name: Option<String>,
        #[arg(short, long, default_value = DEFAULT_NAMESPACE)]
        namespace: String,
    },
    /// Delete a resource
    Delete {
        kind: String,
        name: String,
        #[arg(short, long, default_value = DEFAULT_NAMESPACE)]
        namespace: String,
    },
    /// Run the admission gate locally, without a server
    Check {
        /// Proposed resources
        #[arg(short, long)]
        file: String,
        /// Current revision; turns the check into an update
        #[arg(long)]
        old: Option<String>,
        /// Manifests describing resources that already exist
        #[arg(long)]
        existing: Vec<String>,
        #[arg(short, long, default_value = DEFAULT_NAMESPACE)]
        namespace: String,
    },
}

/// Parse every YAML document in `text` as a guarded resource.
fn parse_manifests(text: &str, namespace: &str) -> anyhow::Result<Vec<AnyResource>> {
    let mut resources = Vec::new();
    for document in serde_yaml::Deserializer::from_str(text) {
        let value = serde_yaml::Value::deserialize(document)?;
        if value.is_null() {
            continue;
        }
        let value: Value = serde_json::to_value(value)?;
        let mut resource: AnyResource = serde_json::from_value(value)
            .context("manifest is not a Component, Environment, PromotionRun or SnapshotEnvironmentBinding")?;
        if resource.namespace().is_empty() {
            resource.metadata_mut().namespace = namespace.to_string();
        }
        resources.push(resource);
    }
    Ok(resources)
}

fn load_manifests(path: &str, namespace: &str) -> anyhow::Result<Vec<AnyResource>> {
    let text = std::fs::read_to_string(path).with_context(|| format!("failed to read {}", path))?;
    parse_manifests(&text, namespace).with_context(|| format!("failed to parse {}", path))
}

fn parse_kind(kind: &str) -> anyhow::Result<ResourceKind> {
    ResourceKind::parse(kind).ok_or_else(|| anyhow::anyhow!("unknown resource type: {}", kind))
}

/// Pair each proposed resource with its current revision, matched by name and namespace.
fn build_requests(
    proposed: Vec<AnyResource>,
    current: Vec<AnyResource>,
) -> anyhow::Result<Vec<AdmissionRequest>> {
    if current.is_empty() {
        return Ok(proposed.into_iter().map(AdmissionRequest::Create).collect());
    }
    proposed
        .into_iter()
        .map(|new| {
            let old = current
                .iter()
                .find(|old| old.name() == new.name() && old.namespace() == new.namespace())
                .cloned()
                .ok_or_else(|| anyhow::anyhow!("no current revision of {} {}", new.kind(), new.name()))?;
            Ok(AdmissionRequest::Update { old, new })
        })
        .collect()
}

fn print_verdict(resource: &AnyResource, verdict: &Verdict) {
    let id = format!("{}/{}", resource.kind().plural(), resource.name());
    match verdict {
        Verdict::Deny(reason) => println!("{} denied: {}", id, reason),
        verdict => {
            println!("{} allowed", id);
            for warning in verdict.warnings() {
                println!("  Warning: {}", warning);
            }
        }
    }
}

struct RegistryClient {
    http: reqwest::Client,
    server: String,
    token: Option<String>,
}

impl RegistryClient {
    fn collection_url(&self, kind: ResourceKind, namespace: &str) -> String {
        format!(
            "{}{}/namespaces/{}/{}",
            self.server.trim_end_matches('/'),
            REGISTRY_ROUTE_PREFIX,
            namespace,
            kind.plural()
        )
    }

    fn item_url(&self, kind: ResourceKind, namespace: &str, name: &str) -> String {
        format!("{}/{}", self.collection_url(kind, namespace), name)
    }

    fn authorize(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.token {
            Some(token) => req.bearer_auth(token),
            None => req,
        }
    }

    /// Create the resource, or update it if it already exists.
    async fn apply(&self, resource: &AnyResource) -> anyhow::Result<()> {
        let (kind, ns, name) = (resource.kind(), resource.namespace(), resource.name());
        let existing = self
            .authorize(self.http.get(self.item_url(kind, ns, name)))
            .send()
            .await?;

        let (verb, req) = if existing.status().is_success() {
            ("configured", self.http.put(self.item_url(kind, ns, name)))
        } else {
            ("created", self.http.post(self.collection_url(kind, ns)))
        };
        let resp = self.authorize(req).json(resource).send().await?;

        for warning in resp.headers().get_all(reqwest::header::WARNING) {
            if let Ok(text) = warning.to_str() {
                eprintln!("Warning: {}", text);
            }
        }
        let status = resp.status();
        if !status.is_success() {
            let reason = resp.text().await.unwrap_or_default();
            anyhow::bail!("{}/{} rejected ({}): {}", kind.plural(), name, status, reason);
        }
        println!("{}/{} {}", kind.plural(), name, verb);
        Ok(())
    }

    async fn get(&self, kind: ResourceKind, namespace: &str, name: Option<&str>) -> anyhow::Result<()> {
        let url = match name {
            Some(name) => self.item_url(kind, namespace, name),
            None => self.collection_url(kind, namespace),
        };
        let resp = self.authorize(self.http.get(&url)).send().await?;
        if !resp.status().is_success() {
            anyhow::bail!("server returned {}", resp.status());
        }

        if name.is_some() {
            let resource: AnyResource = resp.json().await?;
            print!("{}", serde_yaml::to_string(&resource)?);
            return Ok(());
        }

        let resources: Vec<AnyResource> = resp.json().await?;
        println!("{:<40} {:<28} {}", "NAME", "KIND", "CREATED");
        for resource in &resources {
            let created = resource
                .metadata()
                .creation_timestamp
                .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
                .unwrap_or_else(|| "-".to_string());
            println!("{:<40} {:<28} {}", resource.name(), resource.kind(), created);
        }
        if resources.is_empty() {
            println!("(no {} in namespace {})", kind.plural(), namespace);
        }
        Ok(())
    }

    async fn delete(&self, kind: ResourceKind, namespace: &str, name: &str) -> anyhow::Result<()> {
        let resp = self
            .authorize(self.http.delete(self.item_url(kind, namespace, name)))
            .send()
            .await?;
        let status = resp.status();
        if !status.is_success() {
            let reason = resp.text().await.unwrap_or_default();
            anyhow::bail!("{}/{} not deleted ({}): {}", kind.plural(), name, status, reason);
        }
        println!("{}/{} deleted", kind.plural(), name);
        Ok(())
    }
}

/// Returns whether every proposed resource was allowed.
async fn check(
    file: &str,
    old: Option<&str>,
    existing: &[String],
    namespace: &str,
) -> anyhow::Result<bool> {
    let proposed = load_manifests(file, namespace)?;
    let current = match old {
        Some(path) => load_manifests(path, namespace)?,
        None => vec![],
    };

    let store = InMemoryStore::new();
    for path in existing {
        for resource in load_manifests(path, namespace)? {
            store.insert(resource).await;
        }
    }
    info!("Checking {} resource(s) against {} existing", proposed.len(), store.len().await);
    let gate = AdmissionGate::new(Arc::new(store));

    let mut all_allowed = true;
    for request in build_requests(proposed, current)? {
        let verdict = gate.admit(&request).await?;
        print_verdict(request.subject(), &verdict);
        all_allowed &= verdict.is_allowed();
    }
    Ok(all_allowed)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();
    let cli = Cli::parse();

    let client = RegistryClient {
        http: reqwest::Client::new(),
        server: cli.server,
        token: cli.token,
    };

    match &cli.command {
        Commands::Apply { file, namespace } => {
            let resources = load_manifests(file, namespace)?;
            info!("Applying {} resource(s) from {}", resources.len(), file);
            for resource in &resources {
                client.apply(resource).await?;
            }
        }
        Commands::Get {
            kind,
            name,
            namespace,
        } => {
            client
                .get(parse_kind(kind)?, namespace, name.as_deref())
                .await?;
        }
        Commands::Delete {
            kind,
            name,
            namespace,
        } => {
            client.delete(parse_kind(kind)?, namespace, name).await?;
        }
        Commands::Check {
            file,
            old,
            existing,
            namespace,
        } => {
            if !check(file, old.as_deref(), existing, namespace).await? {
                std::process::exit(1);
            }
        }
    }

    Ok(())
}
