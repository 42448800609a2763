//! fluxq query API.
//!
//! [`FluxQueryApi`] is the typed list/get surface callers (CLI, RPC server)
//! depend on. [`InProcApi`] answers it from any [`Backend`], translating
//! records into [`wire`] messages and backend failures into [`Status`].

#![forbid(unsafe_code)]

use std::sync::Arc;
use std::time::Instant;

use fluxq_core::{ResourceKind, ResourceRecord};
use fluxq_kubehub::{Backend, BackendError};
use metrics::{counter, histogram};
use tracing::{info, warn};

pub mod status;
pub mod translate;
pub mod wire;

pub use status::{ApiResult, Code, Status};
pub use wire::{
    GetHelmReleaseRequest, GetHelmReleaseResponse, GetKustomizationRequest, GetKustomizationResponse,
    ListHelmReleasesRequest, ListHelmReleasesResponse, ListKustomizationsRequest, ListKustomizationsResponse,
};

/// Query surface over Flux objects. Calls are independent and stateless;
/// dropping an in-flight future abandons the backend request.
#[async_trait::async_trait]
pub trait FluxQueryApi: Send + Sync {
    /// All Kustomizations in a namespace (all namespaces when empty). No matches is an empty success.
    async fn list_kustomizations(&self, req: ListKustomizationsRequest) -> ApiResult<ListKustomizationsResponse>;

    /// Exactly one Kustomization, or NotFound.
    async fn get_kustomization(&self, req: GetKustomizationRequest) -> ApiResult<GetKustomizationResponse>;

    /// All HelmReleases in a namespace (all namespaces when empty).
    async fn list_helm_releases(&self, req: ListHelmReleasesRequest) -> ApiResult<ListHelmReleasesResponse>;

    /// Exactly one HelmRelease, or NotFound.
    async fn get_helm_release(&self, req: GetHelmReleaseRequest) -> ApiResult<GetHelmReleaseResponse>;
}

/// In-process implementation over a shared backend handle.
pub struct InProcApi<B> {
    backend: Arc<B>,
}

impl<B> Clone for InProcApi<B> {
    fn clone(&self) -> Self { Self { backend: self.backend.clone() } }
}

impl<B: Backend> InProcApi<B> {
    pub fn new(backend: Arc<B>) -> Self { Self { backend } }

    pub fn backend(&self) -> &Arc<B> { &self.backend }

    /// List `kind` in `namespace` and translate each record. Metrics and the
    /// outcome log cover validation, the backend call and translation.
    async fn list<T>(
        &self,
        method: &'static str,
        kind: ResourceKind,
        namespace: &str,
        translate: fn(&ResourceRecord) -> ApiResult<T>,
    ) -> ApiResult<Vec<T>> {
        let t0 = Instant::now();
        let res = self.list_inner(method, kind, namespace, translate).await;
        observe(method, t0, &res);
        res
    }

    async fn list_inner<T>(
        &self,
        method: &'static str,
        kind: ResourceKind,
        namespace: &str,
        translate: fn(&ResourceRecord) -> ApiResult<T>,
    ) -> ApiResult<Vec<T>> {
        if !namespace.is_empty() {
            status::valid_namespace(namespace)?;
        }
        info!(method, kind = %kind, ns = %ns_label(namespace), "api: list start");
        let items = self.backend.list(kind, namespace).await.map_err(|e| match e {
            // A missing namespace lists as empty on the API server; NotFound here is a backend fault.
            BackendError::NotFound { .. } => Status::internal(format!("backend list failed: {}", e)),
            other => Status::from(other),
        })?;
        // Scope is enforced by the backend query; a stray object is reported, not hidden.
        if let Some(stray) = items.iter().find(|r| !namespace.is_empty() && r.namespace() != namespace) {
            warn!(method, ns = %namespace, found_ns = %stray.namespace(), name = %stray.name(), "api: backend returned object outside requested namespace");
        }
        items.iter().map(translate).collect()
    }

    /// Fetch exactly one object and translate it.
    async fn get<T>(
        &self,
        method: &'static str,
        kind: ResourceKind,
        namespace: &str,
        name: &str,
        translate: fn(&ResourceRecord) -> ApiResult<T>,
    ) -> ApiResult<T> {
        let t0 = Instant::now();
        let res = self.get_inner(method, kind, namespace, name, translate).await;
        observe(method, t0, &res);
        res
    }

    async fn get_inner<T>(
        &self,
        method: &'static str,
        kind: ResourceKind,
        namespace: &str,
        name: &str,
        translate: fn(&ResourceRecord) -> ApiResult<T>,
    ) -> ApiResult<T> {
        status::valid_namespace(namespace)?;
        status::valid_name(name)?;
        info!(method, kind = %kind, ns = %namespace, name = %name, "api: get start");
        let rec = self.backend.get(kind, namespace, name).await?;
        translate(&rec)
    }
}

fn ns_label(namespace: &str) -> &str {
    if namespace.is_empty() { "(all)" } else { namespace }
}

fn outcome_code<T>(res: &ApiResult<T>) -> &'static str {
    match res {
        Ok(_) => "ok",
        Err(e) => e.code().as_str(),
    }
}

fn observe<T>(method: &'static str, t0: Instant, res: &ApiResult<T>) {
    let code = outcome_code(res);
    counter!("query_requests_total", 1u64, "method" => method, "code" => code);
    histogram!("query_latency_ms", t0.elapsed().as_secs_f64() * 1000.0, "method" => method);
    match res {
        Ok(_) => info!(method, took_ms = %t0.elapsed().as_millis(), "api: ok"),
        Err(e) => warn!(method, code = %e.code(), error = %e.message(), took_ms = %t0.elapsed().as_millis(), "api: failed"),
    }
}

fn unexpected(requested: ResourceKind, rec: &ResourceRecord) -> Status {
    Status::internal(format!(
        "backend returned {} {}/{} for a {} request",
        rec.kind(),
        rec.namespace(),
        rec.name(),
        requested
    ))
}

fn to_kustomization(rec: &ResourceRecord) -> ApiResult<wire::Kustomization> {
    match rec {
        ResourceRecord::Kustomization(k) => Ok(translate::kustomization_to_wire(k)),
        other => Err(unexpected(ResourceKind::Kustomization, other)),
    }
}

fn to_helm_release(rec: &ResourceRecord) -> ApiResult<wire::HelmRelease> {
    match rec {
        ResourceRecord::HelmRelease(h) => Ok(translate::helm_release_to_wire(h)),
        other => Err(unexpected(ResourceKind::HelmRelease, other)),
    }
}

#[async_trait::async_trait]
impl<B: Backend> FluxQueryApi for InProcApi<B> {
    async fn list_kustomizations(&self, req: ListKustomizationsRequest) -> ApiResult<ListKustomizationsResponse> {
        let kustomizations = self.list("list_kustomizations", ResourceKind::Kustomization, &req.namespace, to_kustomization).await?;
        Ok(ListKustomizationsResponse { kustomizations })
    }

    async fn get_kustomization(&self, req: GetKustomizationRequest) -> ApiResult<GetKustomizationResponse> {
        let kustomization = self
            .get("get_kustomization", ResourceKind::Kustomization, &req.namespace, &req.name, to_kustomization)
            .await?;
        Ok(GetKustomizationResponse { kustomization })
    }

    async fn list_helm_releases(&self, req: ListHelmReleasesRequest) -> ApiResult<ListHelmReleasesResponse> {
        let helm_releases = self.list("list_helm_releases", ResourceKind::HelmRelease, &req.namespace, to_helm_release).await?;
        Ok(ListHelmReleasesResponse { helm_releases })
    }

    async fn get_helm_release(&self, req: GetHelmReleaseRequest) -> ApiResult<GetHelmReleaseResponse> {
        let helm_release = self
            .get("get_helm_release", ResourceKind::HelmRelease, &req.namespace, &req.name, to_helm_release)
            .await?;
        Ok(GetHelmReleaseResponse { helm_release })
    }
}
