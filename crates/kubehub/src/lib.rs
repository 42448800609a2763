//! fluxq kubehub: the backend client adapter.
//!
//! [`Backend`] is the narrow read/create surface the query service consumes.
//! [`KubeBackend`] talks to a live API server through kube-rs; [`MemoryBackend`]
//! keeps objects in process for tests and demos.

#![forbid(unsafe_code)]

use fluxq_core::{ResourceKind, ResourceRecord};

mod cluster;
mod memory;

pub use cluster::KubeBackend;
pub use memory::MemoryBackend;

/// Failure categories of the backend contract.
#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    /// The addressed object does not exist.
    #[error("{kind} {namespace}/{name} not found")]
    NotFound { kind: ResourceKind, namespace: String, name: String },
    /// Transport, authorization, decoding or any other failure.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl BackendError {
    pub fn not_found(kind: ResourceKind, namespace: &str, name: &str) -> Self {
        BackendError::NotFound { kind, namespace: namespace.to_string(), name: name.to_string() }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, BackendError::NotFound { .. })
    }
}

pub type BackendResult<T> = Result<T, BackendError>;

/// Typed access to Flux objects. Implementations must be safe to share across
/// concurrent in-flight requests.
#[async_trait::async_trait]
pub trait Backend: Send + Sync {
    /// Create an object. Setup path only; the query service never calls it.
    async fn create(&self, record: &ResourceRecord) -> BackendResult<()>;

    /// Fetch one object by exact coordinates.
    async fn get(&self, kind: ResourceKind, namespace: &str, name: &str) -> BackendResult<ResourceRecord>;

    /// List objects of `kind` in `namespace`; an empty namespace lists across all namespaces.
    /// No matches is an empty list, never `NotFound`.
    async fn list(&self, kind: ResourceKind, namespace: &str) -> BackendResult<Vec<ResourceRecord>>;

    /// Create a namespace. Setup path only.
    async fn create_namespace(&self, name: &str) -> BackendResult<()>;
}

#[async_trait::async_trait]
impl<B: Backend + ?Sized> Backend for std::sync::Arc<B> {
    async fn create(&self, record: &ResourceRecord) -> BackendResult<()> { (**self).create(record).await }

    async fn get(&self, kind: ResourceKind, namespace: &str, name: &str) -> BackendResult<ResourceRecord> {
        (**self).get(kind, namespace, name).await
    }

    async fn list(&self, kind: ResourceKind, namespace: &str) -> BackendResult<Vec<ResourceRecord>> {
        (**self).list(kind, namespace).await
    }

    async fn create_namespace(&self, name: &str) -> BackendResult<()> { (**self).create_namespace(name).await }
}

/// A namespace provisioned for one test case. The name is owned by the
/// handle; cleanup is left to the backend (namespace GC, or dropping the
/// in-memory store).
#[derive(Debug, Clone)]
pub struct TestNamespace {
    name: String,
}

impl TestNamespace {
    pub const PREFIX: &'static str = "kube-test-";

    /// Create `kube-test-<5 random chars>` on the backend.
    pub async fn create<B: Backend + ?Sized>(backend: &B) -> BackendResult<Self> {
        let name = format!("{}{}", Self::PREFIX, random_suffix(5));
        backend.create_namespace(&name).await?;
        tracing::debug!(ns = %name, "test namespace created");
        Ok(Self { name })
    }

    pub fn name(&self) -> &str { &self.name }
}

fn random_suffix(len: usize) -> String {
    let hex = uuid::Uuid::new_v4().simple().to_string();
    hex[..len.min(hex.len())].to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_message_names_coordinates() {
        let e = BackendError::not_found(ResourceKind::Kustomization, "ns1", "myapp");
        assert!(e.is_not_found());
        assert_eq!(e.to_string(), "Kustomization ns1/myapp not found");
    }

    #[test]
    fn other_wraps_cause() {
        let e: BackendError = anyhow::anyhow!("connection refused").into();
        assert!(!e.is_not_found());
        assert_eq!(e.to_string(), "connection refused");
    }

    #[test]
    fn random_suffix_is_dns_safe() {
        let s = random_suffix(5);
        assert_eq!(s.len(), 5);
        assert!(s.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit()));
    }

    #[tokio::test]
    async fn test_namespaces_are_distinct() {
        let backend = MemoryBackend::new();
        let a = TestNamespace::create(&backend).await.expect("a");
        let b = TestNamespace::create(&backend).await.expect("b");
        assert!(a.name().starts_with(TestNamespace::PREFIX));
        assert_ne!(a.name(), b.name());
    }
}
