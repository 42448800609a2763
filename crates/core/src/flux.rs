//! Typed shapes of the Flux custom resources served by fluxq.
//!
//! Only the fields the query service reads are modelled; unknown fields are
//! ignored on decode. Status is optional throughout because the Flux
//! controllers fill it in after the object is created.

use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use serde::{Deserialize, Serialize};

/// Reference to a Flux source object, possibly in another namespace.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CrossNamespaceSourceReference {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_version: Option<String>,
    #[serde(default)]
    pub kind: String,
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
}

/// Helm chart source reference. Same shape as [`CrossNamespaceSourceReference`].
pub type CrossNamespaceObjectReference = CrossNamespaceSourceReference;

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DependencyReference {
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
}

/// Standard Kubernetes condition as written by the Flux controllers.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Condition {
    #[serde(default, rename = "type")]
    pub type_: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub reason: String,
    #[serde(default)]
    pub message: String,
    /// RFC3339 timestamp, kept exactly as served.
    #[serde(default)]
    pub last_transition_time: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub observed_generation: Option<i64>,
}

// ---- Kustomization ----

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Kustomization {
    #[serde(default)]
    pub metadata: ObjectMeta,
    #[serde(default)]
    pub spec: KustomizationSpec,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<KustomizationStatus>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KustomizationSpec {
    #[serde(default)]
    pub source_ref: CrossNamespaceSourceReference,
    #[serde(default)]
    pub path: String,
    /// Go duration string, e.g. `5m0s`.
    #[serde(default)]
    pub interval: String,
    #[serde(default)]
    pub prune: bool,
    #[serde(default)]
    pub suspend: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_namespace: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub depends_on: Vec<DependencyReference>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KustomizationStatus {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub observed_generation: Option<i64>,
    #[serde(default)]
    pub conditions: Vec<Condition>,
    #[serde(default)]
    pub last_applied_revision: String,
    #[serde(default)]
    pub last_attempted_revision: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inventory: Option<ResourceInventory>,
}

/// Objects applied by the last successful reconciliation.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ResourceInventory {
    #[serde(default)]
    pub entries: Vec<ResourceRef>,
}

/// One inventory entry: packed object key plus API version.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ResourceRef {
    /// `<namespace>_<name>_<group>_<kind>`
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub v: String,
}

// ---- HelmRelease ----

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HelmRelease {
    #[serde(default)]
    pub metadata: ObjectMeta,
    #[serde(default)]
    pub spec: HelmReleaseSpec,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<HelmReleaseStatus>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HelmReleaseSpec {
    #[serde(default)]
    pub chart: HelmChartTemplate,
    #[serde(default)]
    pub interval: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub release_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_namespace: Option<String>,
    #[serde(default)]
    pub suspend: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub depends_on: Vec<DependencyReference>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct HelmChartTemplate {
    #[serde(default)]
    pub spec: HelmChartTemplateSpec,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HelmChartTemplateSpec {
    #[serde(default)]
    pub chart: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(default)]
    pub source_ref: CrossNamespaceObjectReference,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HelmReleaseStatus {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub observed_generation: Option<i64>,
    #[serde(default)]
    pub conditions: Vec<Condition>,
    #[serde(default)]
    pub last_applied_revision: String,
    #[serde(default)]
    pub last_attempted_revision: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_release_revision: Option<i64>,
    /// `<namespace>/<name>` of the HelmChart object built for this release.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub helm_chart: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn helm_release_decodes_nested_chart_source() {
        let v = serde_json::json!({
            "metadata": { "name": "myapp", "namespace": "ns" },
            "spec": {
                "interval": "5m",
                "releaseName": "myapp-prod",
                "chart": { "spec": { "chart": "./charts/app", "sourceRef": { "kind": "GitRepository", "name": "somesource" } } }
            },
            "status": {
                "conditions": [ { "type": "Ready", "status": "True", "reason": "ReconciliationSucceeded", "lastTransitionTime": "2021-01-01T00:00:00Z" } ],
                "helmChart": "ns/ns-myapp"
            }
        });
        let hr: HelmRelease = serde_json::from_value(v).expect("decode");
        assert_eq!(hr.spec.chart.spec.source_ref.kind, "GitRepository");
        assert_eq!(hr.spec.chart.spec.source_ref.name, "somesource");
        assert_eq!(hr.spec.release_name.as_deref(), Some("myapp-prod"));
        let st = hr.status.expect("status");
        assert_eq!(st.conditions[0].type_, "Ready");
        assert_eq!(st.conditions[0].message, "");
        assert_eq!(st.helm_chart.as_deref(), Some("ns/ns-myapp"));
    }

    #[test]
    fn kustomization_status_without_inventory() {
        let v = serde_json::json!({ "status": { "lastAppliedRevision": "main/abc" } });
        let k: Kustomization = serde_json::from_value(v).expect("decode");
        let st = k.status.expect("status");
        assert!(st.inventory.is_none());
        assert!(st.conditions.is_empty());
        assert_eq!(st.last_applied_revision, "main/abc");
    }
}
