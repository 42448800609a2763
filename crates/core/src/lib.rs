//! fluxq core types: supported Flux kinds and their typed records.

#![forbid(unsafe_code)]

use std::fmt;

use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use serde::{Deserialize, Serialize};

pub mod flux;
pub mod inventory;

pub use flux::{HelmRelease, Kustomization};

/// Flux custom resource kinds served by the query service.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ResourceKind {
    Kustomization,
    HelmRelease,
}

impl ResourceKind {
    pub const ALL: [ResourceKind; 2] = [ResourceKind::Kustomization, ResourceKind::HelmRelease];

    pub fn group(self) -> &'static str {
        match self {
            ResourceKind::Kustomization => "kustomize.toolkit.fluxcd.io",
            ResourceKind::HelmRelease => "helm.toolkit.fluxcd.io",
        }
    }

    pub fn version(self) -> &'static str {
        match self {
            ResourceKind::Kustomization => "v1beta2",
            ResourceKind::HelmRelease => "v2beta1",
        }
    }

    pub fn kind(self) -> &'static str {
        match self {
            ResourceKind::Kustomization => "Kustomization",
            ResourceKind::HelmRelease => "HelmRelease",
        }
    }

    pub fn plural(self) -> &'static str {
        match self {
            ResourceKind::Kustomization => "kustomizations",
            ResourceKind::HelmRelease => "helmreleases",
        }
    }

    /// `group/version`, as found in an object's `apiVersion`.
    pub fn api_version(self) -> String {
        format!("{}/{}", self.group(), self.version())
    }

    /// `group/version/Kind` key.
    pub fn gvk_key(self) -> String {
        format!("{}/{}/{}", self.group(), self.version(), self.kind())
    }

    /// Accepts the kind name, its plural, or the short alias (`ks`, `hr`), case-insensitively.
    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim().to_ascii_lowercase();
        ResourceKind::ALL.into_iter().find(|k| {
            s == k.kind().to_ascii_lowercase() || s == k.plural() || s == k.short_name()
        })
    }

    pub fn short_name(self) -> &'static str {
        match self {
            ResourceKind::Kustomization => "ks",
            ResourceKind::HelmRelease => "hr",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.kind())
    }
}

/// Errors raised while decoding raw backend JSON into a typed record.
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    #[error("expected kind {expected}, object has kind {found}")]
    KindMismatch { expected: ResourceKind, found: String },
    #[error("malformed {kind} object: {source}")]
    Malformed {
        kind: ResourceKind,
        #[source]
        source: serde_json::Error,
    },
}

/// One backend object of a supported kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ResourceRecord {
    Kustomization(Kustomization),
    HelmRelease(HelmRelease),
}

impl ResourceRecord {
    pub fn kind(&self) -> ResourceKind {
        match self {
            ResourceRecord::Kustomization(_) => ResourceKind::Kustomization,
            ResourceRecord::HelmRelease(_) => ResourceKind::HelmRelease,
        }
    }

    pub fn metadata(&self) -> &ObjectMeta {
        match self {
            ResourceRecord::Kustomization(k) => &k.metadata,
            ResourceRecord::HelmRelease(h) => &h.metadata,
        }
    }

    pub fn name(&self) -> &str {
        self.metadata().name.as_deref().unwrap_or("")
    }

    pub fn namespace(&self) -> &str {
        self.metadata().namespace.as_deref().unwrap_or("")
    }

    /// Decode a raw object (as served by the API server) into the record for `kind`.
    /// A `kind` field, when present, must match.
    pub fn from_value(kind: ResourceKind, raw: serde_json::Value) -> Result<Self, DecodeError> {
        if let Some(found) = raw.get("kind").and_then(|v| v.as_str()) {
            if found != kind.kind() {
                return Err(DecodeError::KindMismatch { expected: kind, found: found.to_string() });
            }
        }
        let malformed = |source| DecodeError::Malformed { kind, source };
        Ok(match kind {
            ResourceKind::Kustomization => ResourceRecord::Kustomization(serde_json::from_value(raw).map_err(malformed)?),
            ResourceKind::HelmRelease => ResourceRecord::HelmRelease(serde_json::from_value(raw).map_err(malformed)?),
        })
    }

    /// Raw object with `apiVersion` and `kind` set, suitable for submitting to the API server.
    pub fn to_value(&self) -> Result<serde_json::Value, serde_json::Error> {
        let mut v = match self {
            ResourceRecord::Kustomization(k) => serde_json::to_value(k)?,
            ResourceRecord::HelmRelease(h) => serde_json::to_value(h)?,
        };
        if let Some(obj) = v.as_object_mut() {
            let kind = self.kind();
            obj.insert("apiVersion".into(), serde_json::Value::String(kind.api_version()));
            obj.insert("kind".into(), serde_json::Value::String(kind.kind().to_string()));
        }
        Ok(v)
    }
}

impl From<Kustomization> for ResourceRecord {
    fn from(v: Kustomization) -> Self { ResourceRecord::Kustomization(v) }
}

impl From<HelmRelease> for ResourceRecord {
    fn from(v: HelmRelease) -> Self { ResourceRecord::HelmRelease(v) }
}

/// Build object metadata with just a name and namespace.
pub fn meta(namespace: &str, name: &str) -> ObjectMeta {
    ObjectMeta { name: Some(name.to_string()), namespace: Some(namespace.to_string()), ..Default::default() }
}

pub mod prelude {
    pub use super::flux::*;
    pub use super::inventory::ObjMetadata;
    pub use super::{meta, DecodeError, ResourceKind, ResourceRecord};
}
