//! Wire messages of the query API. JSON (camelCase) is the encoding.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SourceRef {
    pub api_version: String,
    pub kind: String,
    pub name: String,
    pub namespace: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Condition {
    #[serde(rename = "type")]
    pub type_: String,
    pub status: String,
    pub reason: String,
    pub message: String,
    pub timestamp: String,
}

/// One object managed by a Kustomization.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct InventoryEntry {
    /// Packed key exactly as stored by the controller.
    pub id: String,
    pub version: String,
    pub group: String,
    pub kind: String,
    pub name: String,
    pub namespace: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Kustomization {
    pub name: String,
    pub namespace: String,
    pub target_namespace: String,
    pub path: String,
    pub source_ref: SourceRef,
    pub interval: String,
    pub prune: bool,
    pub suspended: bool,
    pub depends_on: Vec<String>,
    pub conditions: Vec<Condition>,
    pub last_applied_revision: String,
    pub last_attempted_revision: String,
    pub inventory: Vec<InventoryEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct HelmChart {
    pub chart: String,
    pub version: String,
    pub source_ref: SourceRef,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct HelmRelease {
    pub name: String,
    pub namespace: String,
    pub release_name: String,
    pub target_namespace: String,
    pub interval: String,
    pub helm_chart: HelmChart,
    pub suspended: bool,
    pub depends_on: Vec<String>,
    pub conditions: Vec<Condition>,
    pub last_applied_revision: String,
    pub last_attempted_revision: String,
    pub last_release_revision: i64,
    pub helm_chart_name: String,
}

// ---- requests / responses ----

/// An empty namespace lists across all namespaces.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ListKustomizationsRequest {
    pub namespace: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ListKustomizationsResponse {
    pub kustomizations: Vec<Kustomization>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GetKustomizationRequest {
    pub namespace: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GetKustomizationResponse {
    pub kustomization: Kustomization,
}

/// An empty namespace lists across all namespaces.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ListHelmReleasesRequest {
    pub namespace: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ListHelmReleasesResponse {
    pub helm_releases: Vec<HelmRelease>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GetHelmReleaseRequest {
    pub namespace: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GetHelmReleaseResponse {
    pub helm_release: HelmRelease,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_use_camel_case_keys() {
        let res = ListHelmReleasesResponse { helm_releases: vec![HelmRelease { name: "myapp".into(), ..Default::default() }] };
        let v = serde_json::to_value(&res).expect("encode");
        assert_eq!(v["helmReleases"][0]["name"], "myapp");
        assert!(v["helmReleases"][0].get("helmChart").is_some());
        assert!(v["helmReleases"][0].get("lastAppliedRevision").is_some());
    }

    #[test]
    fn requests_accept_missing_fields() {
        let req: ListKustomizationsRequest = serde_json::from_str("{}").expect("decode");
        assert_eq!(req.namespace, "");
        let req: GetKustomizationRequest = serde_json::from_str(r#"{"name":"myapp"}"#).expect("decode");
        assert_eq!(req.name, "myapp");
        assert_eq!(req.namespace, "");
    }
}
