//! kube-rs backed implementation of [`Backend`].

use std::time::Instant;

use anyhow::{anyhow, Context};
use fluxq_core::{ResourceKind, ResourceRecord};
use k8s_openapi::api::core::v1::Namespace;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use kube::{
    api::{Api, ListParams, PostParams},
    config::KubeConfigOptions,
    core::{ApiResource, DynamicObject, GroupVersionKind},
    Client, Config,
};
use metrics::{counter, histogram};
use tracing::{debug, info};

use crate::{Backend, BackendError, BackendResult};

/// Backend talking to a live API server.
#[derive(Clone)]
pub struct KubeBackend {
    client: Client,
}

impl KubeBackend {
    pub fn new(client: Client) -> Self { Self { client } }

    /// Client from the ambient environment (in-cluster config or current kubeconfig context).
    pub async fn try_default() -> anyhow::Result<Self> {
        let client = Client::try_default().await.context("building kube client")?;
        Ok(Self::new(client))
    }

    /// Client for a named kubeconfig context; `None` falls back to [`KubeBackend::try_default`].
    pub async fn from_context(context: Option<&str>) -> anyhow::Result<Self> {
        let Some(ctx) = context else { return Self::try_default().await };
        let opts = KubeConfigOptions { context: Some(ctx.to_string()), ..Default::default() };
        let config = Config::from_kubeconfig(&opts).await.with_context(|| format!("loading kubeconfig context {}", ctx))?;
        let client = Client::try_from(config).context("building kube client")?;
        info!(context = %ctx, "kube client ready");
        Ok(Self::new(client))
    }

    fn api(&self, kind: ResourceKind, namespace: &str) -> Api<DynamicObject> {
        let ar = api_resource(kind);
        if namespace.is_empty() {
            Api::all_with(self.client.clone(), &ar)
        } else {
            Api::namespaced_with(self.client.clone(), namespace, &ar)
        }
    }
}

pub(crate) fn api_resource(kind: ResourceKind) -> ApiResource {
    let gvk = GroupVersionKind::gvk(kind.group(), kind.version(), kind.kind());
    ApiResource::from_gvk_with_plural(&gvk, kind.plural())
}

/// HTTP 404 from the API server means the object does not exist; everything else is opaque.
pub(crate) fn classify(err: kube::Error, kind: ResourceKind, namespace: &str, name: &str) -> BackendError {
    match err {
        kube::Error::Api(ref resp) if resp.code == 404 => BackendError::not_found(kind, namespace, name),
        other => BackendError::Other(anyhow::Error::new(other).context(format!("{} {}/{}", kind, namespace, name))),
    }
}

fn decode(kind: ResourceKind, obj: &DynamicObject) -> BackendResult<ResourceRecord> {
    let raw = serde_json::to_value(obj).context("serializing DynamicObject")?;
    let rec = ResourceRecord::from_value(kind, raw).map_err(anyhow::Error::new)?;
    Ok(rec)
}

fn observe(op: &'static str, kind: ResourceKind, t0: Instant, ok: bool) {
    counter!("backend_calls_total", 1u64, "op" => op, "kind" => kind.kind(), "ok" => if ok { "true" } else { "false" });
    histogram!("backend_call_ms", t0.elapsed().as_secs_f64() * 1000.0, "op" => op);
}

#[async_trait::async_trait]
impl Backend for KubeBackend {
    async fn create(&self, record: &ResourceRecord) -> BackendResult<()> {
        let t0 = Instant::now();
        let kind = record.kind();
        let (ns, name) = (record.namespace().to_string(), record.name().to_string());
        if ns.is_empty() {
            return Err(anyhow!("{} {} has no namespace", kind, name).into());
        }
        let raw = record.to_value().context("encoding record")?;
        let obj: DynamicObject = serde_json::from_value(raw).context("building DynamicObject")?;
        let res = self.api(kind, &ns).create(&PostParams::default(), &obj).await;
        observe("create", kind, t0, res.is_ok());
        res.map_err(|e| BackendError::Other(anyhow::Error::new(e).context(format!("creating {} {}/{}", kind, ns, name))))?;
        debug!(kind = %kind, ns = %ns, name = %name, "backend: created");
        Ok(())
    }

    async fn get(&self, kind: ResourceKind, namespace: &str, name: &str) -> BackendResult<ResourceRecord> {
        if namespace.is_empty() {
            return Err(anyhow!("namespace required to get {} {}", kind, name).into());
        }
        let t0 = Instant::now();
        let res = self.api(kind, namespace).get(name).await;
        observe("get", kind, t0, res.is_ok());
        let obj = res.map_err(|e| classify(e, kind, namespace, name))?;
        decode(kind, &obj)
    }

    async fn list(&self, kind: ResourceKind, namespace: &str) -> BackendResult<Vec<ResourceRecord>> {
        let t0 = Instant::now();
        let res = self.api(kind, namespace).list(&ListParams::default()).await;
        observe("list", kind, t0, res.is_ok());
        let list = res.map_err(|e| {
            BackendError::Other(anyhow::Error::new(e).context(format!("listing {} in {}", kind, if namespace.is_empty() { "(all)" } else { namespace })))
        })?;
        debug!(kind = %kind, ns = %namespace, count = list.items.len(), "backend: listed");
        list.items.iter().map(|o| decode(kind, o)).collect()
    }

    async fn create_namespace(&self, name: &str) -> BackendResult<()> {
        let api: Api<Namespace> = Api::all(self.client.clone());
        let ns = Namespace { metadata: ObjectMeta { name: Some(name.to_string()), ..Default::default() }, ..Default::default() };
        api.create(&PostParams::default(), &ns)
            .await
            .map_err(|e| BackendError::Other(anyhow::Error::new(e).context(format!("creating namespace {}", name))))?;
        Ok(())
    }
}
