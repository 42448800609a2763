//! In-process backend for tests and demos.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use anyhow::anyhow;
use fluxq_core::{ResourceKind, ResourceRecord};
use tokio::sync::RwLock;

use crate::{Backend, BackendError, BackendResult};

type Key = (ResourceKind, String, String);

/// Objects keyed by (kind, namespace, name). Lists come back in key order.
#[derive(Default)]
pub struct MemoryBackend {
    objects: RwLock<BTreeMap<Key, ResourceRecord>>,
    namespaces: RwLock<BTreeSet<String>>,
    /// Injected failure for reads; surfaces as `BackendError::Other`.
    failure: Mutex<Option<String>>,
    latency: Mutex<Option<Duration>>,
    reads: AtomicUsize,
    completed: AtomicUsize,
}

impl MemoryBackend {
    pub fn new() -> Self { Self::default() }

    /// Make every subsequent get/list fail with `msg`; `None` clears it.
    pub fn set_failure(&self, msg: Option<&str>) {
        if let Ok(mut f) = self.failure.lock() { *f = msg.map(|s| s.to_string()); }
    }

    /// Delay every get/list by `d` before answering.
    pub fn set_latency(&self, d: Option<Duration>) {
        if let Ok(mut l) = self.latency.lock() { *l = d; }
    }

    /// Number of get/list calls started.
    pub fn reads(&self) -> usize { self.reads.load(Ordering::SeqCst) }

    /// Number of get/list calls that ran to completion.
    pub fn completed(&self) -> usize { self.completed.load(Ordering::SeqCst) }

    async fn begin_read(&self) -> BackendResult<()> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        let latency = self.latency.lock().ok().and_then(|l| *l);
        if let Some(d) = latency {
            tokio::time::sleep(d).await;
        }
        let failure = self.failure.lock().ok().and_then(|f| f.clone());
        if let Some(msg) = failure {
            self.completed.fetch_add(1, Ordering::SeqCst);
            return Err(anyhow!(msg).into());
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl Backend for MemoryBackend {
    async fn create(&self, record: &ResourceRecord) -> BackendResult<()> {
        let (ns, name) = (record.namespace().to_string(), record.name().to_string());
        if ns.is_empty() || name.is_empty() {
            return Err(anyhow!("{} requires metadata.name and metadata.namespace", record.kind()).into());
        }
        let key = (record.kind(), ns, name);
        let mut objects = self.objects.write().await;
        if objects.contains_key(&key) {
            return Err(anyhow!("{} {}/{} already exists", key.0, key.1, key.2).into());
        }
        objects.insert(key, record.clone());
        Ok(())
    }

    async fn get(&self, kind: ResourceKind, namespace: &str, name: &str) -> BackendResult<ResourceRecord> {
        self.begin_read().await?;
        let objects = self.objects.read().await;
        let res = objects
            .get(&(kind, namespace.to_string(), name.to_string()))
            .cloned()
            .ok_or_else(|| BackendError::not_found(kind, namespace, name));
        self.completed.fetch_add(1, Ordering::SeqCst);
        res
    }

    async fn list(&self, kind: ResourceKind, namespace: &str) -> BackendResult<Vec<ResourceRecord>> {
        self.begin_read().await?;
        let objects = self.objects.read().await;
        let items = objects
            .iter()
            .filter(|((k, ns, _), _)| *k == kind && (namespace.is_empty() || ns == namespace))
            .map(|(_, rec)| rec.clone())
            .collect();
        self.completed.fetch_add(1, Ordering::SeqCst);
        Ok(items)
    }

    async fn create_namespace(&self, name: &str) -> BackendResult<()> {
        if name.is_empty() {
            return Err(anyhow!("namespace name must not be empty").into());
        }
        if !self.namespaces.write().await.insert(name.to_string()) {
            return Err(anyhow!("namespace {} already exists", name).into());
        }
        Ok(())
    }
}
