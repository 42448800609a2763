//! Runs against the cluster of the current kubeconfig context with the Flux
//! CRDs installed: `cargo test -p fluxq-kubehub -- --ignored`.

#![forbid(unsafe_code)]

use fluxq_core::flux::{CrossNamespaceSourceReference, Kustomization, KustomizationSpec};
use fluxq_core::{meta, ResourceKind};
use fluxq_kubehub::{Backend, KubeBackend, TestNamespace};

#[tokio::test]
#[ignore = "needs a cluster with Flux CRDs"]
async fn create_list_get_kustomization() {
    let backend = KubeBackend::try_default().await.expect("kube client");
    let ns = TestNamespace::create(&backend).await.expect("namespace");

    let kust = Kustomization {
        metadata: meta(ns.name(), "myapp"),
        spec: KustomizationSpec {
            source_ref: CrossNamespaceSourceReference { kind: "GitRepository".into(), name: "repo".into(), ..Default::default() },
            interval: "1m".into(),
            ..Default::default()
        },
        status: None,
    };
    backend.create(&kust.into()).await.expect("create");

    let items = backend.list(ResourceKind::Kustomization, ns.name()).await.expect("list");
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].name(), "myapp");
    assert_eq!(items[0].namespace(), ns.name());

    let got = backend.get(ResourceKind::Kustomization, ns.name(), "myapp").await.expect("get");
    assert_eq!(got.kind(), ResourceKind::Kustomization);

    let missing = backend.get(ResourceKind::Kustomization, ns.name(), "somename").await.unwrap_err();
    assert!(missing.is_not_found(), "err={}", missing);
}
