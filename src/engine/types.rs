use serde::{Deserialize, Serialize};

/// Entry in the `GET /_all` catalog response. Only the mapping metadata is
/// of interest: `_meta.type` is the ownership tag that marks an index as
/// managed by this application.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct IndexInfo {
    #[serde(default)]
    pub mappings: IndexMappings,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct IndexMappings {
    #[serde(rename = "_meta", default)]
    pub meta: Option<IndexMeta>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct IndexMeta {
    #[serde(rename = "type", default)]
    pub type_: Option<String>,
}

impl IndexInfo {
    /// The ownership tag from `mappings._meta.type`, if any.
    pub fn owner_tag(&self) -> Option<&str> {
        self.mappings.meta.as_ref()?.type_.as_deref()
    }
}

// GET /{index}/_settings — nested down to the write block flag, which the
// engine reports as the string "true" rather than a boolean.

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SettingsResponse {
    #[serde(default)]
    pub settings: Option<SettingsIndex>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SettingsIndex {
    #[serde(default)]
    pub index: Option<SettingsBlocks>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SettingsBlocks {
    #[serde(default)]
    pub blocks: Option<SettingsWrite>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SettingsWrite {
    #[serde(default)]
    pub write: Option<String>,
}

impl SettingsResponse {
    pub fn write_blocked(&self) -> bool {
        self.settings
            .as_ref()
            .and_then(|s| s.index.as_ref())
            .and_then(|i| i.blocks.as_ref())
            .and_then(|b| b.write.as_deref())
            == Some("true")
    }
}

/// PUT /{index}/_block/write response.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BlockResponse {
    #[serde(default)]
    pub acknowledged: bool,
    #[serde(default)]
    pub shards_acknowledged: bool,
}

/// Response for async submissions (`wait_for_completion=false`).
#[derive(Debug, Clone, Deserialize)]
pub struct TaskCreationResponse {
    pub task: String,
}

/// GET /_tasks/{task} response.
#[derive(Debug, Clone, Deserialize)]
pub struct TaskStatus {
    #[serde(default)]
    pub completed: bool,
}

// POST /_reindex request.

#[derive(Debug, Clone, Serialize)]
pub struct ReindexRequest {
    pub conflicts: &'static str,
    pub source: ReindexSource,
    pub dest: ReindexDest,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReindexSource {
    pub index: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReindexDest {
    pub index: String,
    pub op_type: &'static str,
}

impl ReindexRequest {
    /// Copy job from `source` to `dest`: version conflicts are skipped
    /// rather than fatal, and existing destination documents are never
    /// overwritten.
    pub fn new(source: &str, dest: &str) -> Self {
        Self {
            conflicts: "proceed",
            source: ReindexSource {
                index: source.to_owned(),
            },
            dest: ReindexDest {
                index: dest.to_owned(),
                op_type: "create",
            },
        }
    }
}

// POST /_aliases request — the engine applies the whole batch atomically.

#[derive(Debug, Clone, Serialize)]
pub struct AliasActionsRequest {
    pub actions: Vec<AliasAction>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AliasAction {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub add: Option<IndexAlias>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remove: Option<IndexAlias>,
}

#[derive(Debug, Clone, Serialize)]
pub struct IndexAlias {
    pub index: String,
    pub alias: String,
}

impl AliasActionsRequest {
    /// One atomic batch that moves `alias` from `source` to `target`.
    pub fn swap(alias: &str, source: &str, target: &str) -> Self {
        Self {
            actions: vec![
                AliasAction {
                    add: None,
                    remove: Some(IndexAlias {
                        index: source.to_owned(),
                        alias: alias.to_owned(),
                    }),
                },
                AliasAction {
                    add: Some(IndexAlias {
                        index: target.to_owned(),
                        alias: alias.to_owned(),
                    }),
                    remove: None,
                },
            ],
        }
    }
}

// Engine 400 error body, used to recognize create races.

#[derive(Debug, Clone, Default, Deserialize)]
pub struct EngineErrorResponse {
    #[serde(default)]
    pub error: EngineErrorBody,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct EngineErrorBody {
    #[serde(rename = "type", default)]
    pub type_: Option<String>,
}
