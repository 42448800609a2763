//! Record → wire translation.
//!
//! Total and pure: every record translates, absent status sections become
//! empty defaults, and inventory entries keep backend order and their raw id.

use fluxq_core::flux::{self, CrossNamespaceSourceReference, DependencyReference};
use fluxq_core::inventory::ObjMetadata;

use crate::wire;

pub fn kustomization_to_wire(k: &flux::Kustomization) -> wire::Kustomization {
    let status = k.status.clone().unwrap_or_default();
    let inventory = status
        .inventory
        .as_ref()
        .map(|inv| inv.entries.iter().map(inventory_entry_to_wire).collect())
        .unwrap_or_default();
    wire::Kustomization {
        name: k.metadata.name.clone().unwrap_or_default(),
        namespace: k.metadata.namespace.clone().unwrap_or_default(),
        target_namespace: k.spec.target_namespace.clone().unwrap_or_default(),
        path: k.spec.path.clone(),
        source_ref: source_ref_to_wire(&k.spec.source_ref),
        interval: k.spec.interval.clone(),
        prune: k.spec.prune,
        suspended: k.spec.suspend,
        depends_on: k.spec.depends_on.iter().map(dependency_to_wire).collect(),
        conditions: status.conditions.iter().map(condition_to_wire).collect(),
        last_applied_revision: status.last_applied_revision,
        last_attempted_revision: status.last_attempted_revision,
        inventory,
    }
}

pub fn helm_release_to_wire(h: &flux::HelmRelease) -> wire::HelmRelease {
    let status = h.status.clone().unwrap_or_default();
    let chart = &h.spec.chart.spec;
    wire::HelmRelease {
        name: h.metadata.name.clone().unwrap_or_default(),
        namespace: h.metadata.namespace.clone().unwrap_or_default(),
        release_name: h.spec.release_name.clone().unwrap_or_default(),
        target_namespace: h.spec.target_namespace.clone().unwrap_or_default(),
        interval: h.spec.interval.clone(),
        helm_chart: wire::HelmChart {
            chart: chart.chart.clone(),
            version: chart.version.clone().unwrap_or_default(),
            source_ref: source_ref_to_wire(&chart.source_ref),
        },
        suspended: h.spec.suspend,
        depends_on: h.spec.depends_on.iter().map(dependency_to_wire).collect(),
        conditions: status.conditions.iter().map(condition_to_wire).collect(),
        last_applied_revision: status.last_applied_revision,
        last_attempted_revision: status.last_attempted_revision,
        last_release_revision: status.last_release_revision.unwrap_or_default(),
        helm_chart_name: status.helm_chart.unwrap_or_default(),
    }
}

pub fn inventory_entry_to_wire(r: &flux::ResourceRef) -> wire::InventoryEntry {
    let m = ObjMetadata::parse_id(&r.id).unwrap_or_default();
    wire::InventoryEntry {
        id: r.id.clone(),
        version: r.v.clone(),
        group: m.group,
        kind: m.kind,
        name: m.name,
        namespace: m.namespace,
    }
}

fn source_ref_to_wire(s: &CrossNamespaceSourceReference) -> wire::SourceRef {
    wire::SourceRef {
        api_version: s.api_version.clone().unwrap_or_default(),
        kind: s.kind.clone(),
        name: s.name.clone(),
        namespace: s.namespace.clone().unwrap_or_default(),
    }
}

fn condition_to_wire(c: &flux::Condition) -> wire::Condition {
    wire::Condition {
        type_: c.type_.clone(),
        status: c.status.clone(),
        reason: c.reason.clone(),
        message: c.message.clone(),
        timestamp: c.last_transition_time.clone(),
    }
}

/// `namespace/name`, or just `name` when the dependency is in the same namespace.
fn dependency_to_wire(d: &DependencyReference) -> String {
    match d.namespace.as_deref() {
        Some(ns) if !ns.is_empty() => format!("{}/{}", ns, d.name),
        _ => d.name.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fluxq_core::flux::*;
    use fluxq_core::meta;

    fn entry(v: &str, id: &str) -> ResourceRef {
        ResourceRef { id: id.to_string(), v: v.to_string() }
    }

    #[test]
    fn kustomization_without_status_translates_to_defaults() {
        let k = Kustomization {
            metadata: meta("ns", "myapp"),
            spec: KustomizationSpec {
                source_ref: CrossNamespaceSourceReference { kind: "GitRepository".into(), ..Default::default() },
                ..Default::default()
            },
            status: None,
        };
        let w = kustomization_to_wire(&k);
        assert_eq!(w.name, "myapp");
        assert_eq!(w.namespace, "ns");
        assert_eq!(w.source_ref.kind, "GitRepository");
        assert!(w.conditions.is_empty());
        assert!(w.inventory.is_empty());
        assert_eq!(w.last_applied_revision, "");
    }

    #[test]
    fn inventory_order_and_values_are_preserved() {
        let k = Kustomization {
            metadata: meta("ns", "myapp"),
            status: Some(KustomizationStatus {
                inventory: Some(ResourceInventory {
                    entries: vec![entry("v1", "ns_zeta_apps_Deployment"), entry("v1", "ns_alpha__Service"), entry("v2", "not-a-key")],
                }),
                ..Default::default()
            }),
            ..Default::default()
        };
        let inv = kustomization_to_wire(&k).inventory;
        let pairs: Vec<_> = inv.iter().map(|e| (e.version.as_str(), e.id.as_str())).collect();
        assert_eq!(pairs, vec![("v1", "ns_zeta_apps_Deployment"), ("v1", "ns_alpha__Service"), ("v2", "not-a-key")]);
        assert_eq!(inv[0].group, "apps");
        assert_eq!(inv[0].kind, "Deployment");
        assert_eq!(inv[0].name, "zeta");
        assert_eq!(inv[1].group, "");
        assert_eq!(inv[1].kind, "Service");
        // unparseable ids survive untouched with empty coordinates
        assert_eq!(inv[2].kind, "");
        assert_eq!(inv[2].name, "");
    }

    #[test]
    fn kustomization_spec_and_conditions_copied_verbatim() {
        let k = Kustomization {
            metadata: meta("flux-system", "apps"),
            spec: KustomizationSpec {
                source_ref: CrossNamespaceSourceReference {
                    api_version: Some("source.toolkit.fluxcd.io/v1beta2".into()),
                    kind: "GitRepository".into(),
                    name: "flux-system".into(),
                    namespace: Some("flux-system".into()),
                },
                path: "./apps/production".into(),
                interval: "10m0s".into(),
                prune: true,
                suspend: true,
                target_namespace: Some("prod".into()),
                depends_on: vec![
                    DependencyReference { name: "infra".into(), namespace: None },
                    DependencyReference { name: "crds".into(), namespace: Some("flux-system".into()) },
                ],
            },
            status: Some(KustomizationStatus {
                conditions: vec![Condition {
                    type_: "Ready".into(),
                    status: "False".into(),
                    reason: "BuildFailed".into(),
                    message: "kustomize build failed".into(),
                    last_transition_time: "2022-03-04T05:06:07Z".into(),
                    observed_generation: Some(2),
                }],
                last_applied_revision: "main/1234".into(),
                last_attempted_revision: "main/5678".into(),
                ..Default::default()
            }),
        };
        let w = kustomization_to_wire(&k);
        assert_eq!(w.path, "./apps/production");
        assert_eq!(w.interval, "10m0s");
        assert!(w.prune);
        assert!(w.suspended);
        assert_eq!(w.target_namespace, "prod");
        assert_eq!(w.source_ref.namespace, "flux-system");
        assert_eq!(w.source_ref.api_version, "source.toolkit.fluxcd.io/v1beta2");
        assert_eq!(w.depends_on, vec!["infra".to_string(), "flux-system/crds".to_string()]);
        assert_eq!(w.conditions.len(), 1);
        assert_eq!(w.conditions[0].reason, "BuildFailed");
        assert_eq!(w.conditions[0].timestamp, "2022-03-04T05:06:07Z");
        assert_eq!(w.last_applied_revision, "main/1234");
        assert_eq!(w.last_attempted_revision, "main/5678");
    }

    #[test]
    fn helm_release_chart_source_is_translated() {
        let h = HelmRelease {
            metadata: meta("ns", "myapp"),
            spec: HelmReleaseSpec {
                chart: HelmChartTemplate {
                    spec: HelmChartTemplateSpec {
                        chart: "podinfo".into(),
                        version: Some(">=6.0.0".into()),
                        source_ref: CrossNamespaceObjectReference { kind: "GitRepository".into(), name: "somesource".into(), ..Default::default() },
                    },
                },
                ..Default::default()
            },
            status: None,
        };
        let w = helm_release_to_wire(&h);
        assert_eq!(w.name, "myapp");
        assert_eq!(w.helm_chart.chart, "podinfo");
        assert_eq!(w.helm_chart.version, ">=6.0.0");
        assert_eq!(w.helm_chart.source_ref.kind, "GitRepository");
        assert_eq!(w.helm_chart.source_ref.name, "somesource");
        assert_eq!(w.last_release_revision, 0);
        assert_eq!(w.helm_chart_name, "");
    }

    #[test]
    fn translation_is_deterministic() {
        let h = HelmRelease { metadata: meta("ns", "x"), ..Default::default() };
        assert_eq!(helm_release_to_wire(&h), helm_release_to_wire(&h));
    }
}
