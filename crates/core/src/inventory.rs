//! Flux inventory keys.

use serde::{Deserialize, Serialize};

/// Object coordinates unpacked from a Flux inventory id.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ObjMetadata {
    pub namespace: String,
    pub name: String,
    pub group: String,
    pub kind: String,
}

impl ObjMetadata {
    /// Parse `<namespace>_<name>_<group>_<kind>`. Namespace is empty for
    /// cluster-scoped objects and group is empty for the core API group.
    /// Returns `None` when the id does not have exactly four parts or lacks a name or kind.
    pub fn parse_id(id: &str) -> Option<Self> {
        let parts: Vec<&str> = id.split('_').collect();
        match parts.as_slice() {
            [namespace, name, group, kind] if !name.is_empty() && !kind.is_empty() => Some(Self {
                namespace: (*namespace).to_string(),
                name: (*name).to_string(),
                group: (*group).to_string(),
                kind: (*kind).to_string(),
            }),
            _ => None,
        }
    }

    /// Pack back into the inventory id form.
    pub fn id(&self) -> String {
        format!("{}_{}_{}_{}", self.namespace, self.name, self.group, self.kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_id_namespaced_deployment() {
        let m = ObjMetadata::parse_id("kube-test-abcde_my-deployment_apps_Deployment").expect("ok");
        assert_eq!(m.namespace, "kube-test-abcde");
        assert_eq!(m.name, "my-deployment");
        assert_eq!(m.group, "apps");
        assert_eq!(m.kind, "Deployment");
    }

    #[test]
    fn parse_id_core_group_and_cluster_scope() {
        let m = ObjMetadata::parse_id("_flux-system__Namespace").expect("ok");
        assert_eq!(m.namespace, "");
        assert_eq!(m.name, "flux-system");
        assert_eq!(m.group, "");
        assert_eq!(m.kind, "Namespace");
        assert_eq!(m.id(), "_flux-system__Namespace");
    }

    #[test]
    fn parse_id_rejects_malformed() {
        assert!(ObjMetadata::parse_id("").is_none());
        assert!(ObjMetadata::parse_id("ns_name_apps").is_none());
        assert!(ObjMetadata::parse_id("a_b_c_d_e").is_none());
        assert!(ObjMetadata::parse_id("ns__apps_Deployment").is_none());
    }
}
