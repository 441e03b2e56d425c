use serde::{Deserialize, Serialize};

/// A schema document for one document kind: the current version string plus
/// the opaque mapping body handed to the engine at index creation. Mapping
/// and settings bodies are never interpreted, only forwarded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VersionedMapping {
    pub version: String,
    pub mappings: serde_json::Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub settings: Option<serde_json::Value>,
}

/// Decoded form of a physical index name.
///
/// `inner` is the free-form disambiguating segment between the version and
/// the document kind (tenant or project scoping, for example). It may be
/// empty and may itself contain the name delimiter, as may the kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexNameParts {
    pub document_kind: String,
    pub version: String,
    pub inner: String,
}

/// A unit of pending migration work produced by discovery and consumed
/// exactly once by [`Migrator::migrate`](crate::migrator::Migrator::migrate).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Migration {
    pub alias: String,
    pub source_index: String,
    pub target_index: String,
    pub document_kind: String,
}
