use std::collections::HashMap;
use std::fs;

use crate::config::Config;
use crate::error::{GriddleError, Result};
use crate::types::{IndexNameParts, VersionedMapping};

const DELIMITER: &str = "-";

/// Registry of document kinds and their versioned mappings, plus the index
/// name grammar.
///
/// Index names follow `{prefix}-{version}-{inner}-{kind}`; aliases follow
/// `{prefix}-{inner}-{kind}`, leaving the version out so the alias stays
/// stable across migrations. Empty segments are omitted entirely — no
/// doubled delimiters.
///
/// The registry is built once by [`MappingRegistry::load`] and is read-only
/// afterwards; picking up new mapping files means constructing a new
/// registry.
#[derive(Debug)]
pub struct MappingRegistry {
    index_prefix: String,
    mappings: HashMap<String, VersionedMapping>,
}

impl MappingRegistry {
    /// Read every mapping file in `config.mappings_path` and return a
    /// ready-for-query registry.
    ///
    /// Each regular file holds one [`VersionedMapping`] as JSON; the document
    /// kind is the file name minus its extension. Subdirectories are skipped.
    ///
    /// # Errors
    ///
    /// Returns [`GriddleError::MappingLoad`] if the directory cannot be read
    /// or any file is not valid mapping JSON.
    pub fn load(config: &Config) -> Result<Self> {
        let dir = &config.mappings_path;
        let entries = fs::read_dir(dir).map_err(|e| {
            GriddleError::MappingLoad(format!(
                "error finding mappings in directory {}: {}",
                dir.display(),
                e
            ))
        })?;

        let mut mappings = HashMap::new();
        for entry in entries {
            let entry = entry
                .map_err(|e| GriddleError::MappingLoad(format!("error reading directory entry: {}", e)))?;
            let path = entry.path();
            if path.is_dir() {
                continue;
            }

            let document_kind = match path.file_stem().and_then(|s| s.to_str()) {
                Some(stem) => stem.to_owned(),
                None => continue,
            };

            let contents = fs::read_to_string(&path).map_err(|e| {
                GriddleError::MappingLoad(format!("error reading file {}: {}", path.display(), e))
            })?;
            let mapping: VersionedMapping = serde_json::from_str(&contents).map_err(|e| {
                GriddleError::MappingLoad(format!("invalid json in file {}: {}", path.display(), e))
            })?;

            tracing::debug!(
                "Loaded mapping: kind={}, version={}",
                document_kind,
                mapping.version
            );
            mappings.insert(document_kind, mapping);
        }

        Ok(Self {
            index_prefix: config.index_prefix.clone(),
            mappings,
        })
    }

    /// Full index name for a document kind at its current version.
    pub fn index_name(&self, document_kind: &str, inner: &str) -> String {
        non_empty_join(
            &[
                self.index_prefix.as_str(),
                self.version(document_kind).unwrap_or(""),
                inner,
                document_kind,
            ],
            DELIMITER,
        )
    }

    /// Alias name for a document kind. Aliases carry no version.
    pub fn alias_name(&self, document_kind: &str, inner: &str) -> String {
        non_empty_join(
            &[self.index_prefix.as_str(), inner, document_kind],
            DELIMITER,
        )
    }

    /// Current schema version for the kind, or `None` if it isn't registered.
    pub fn version(&self, document_kind: &str) -> Option<&str> {
        self.mappings.get(document_kind).map(|m| m.version.as_str())
    }

    /// Current versioned mapping for the kind, or `None` if it isn't
    /// registered.
    pub fn mapping(&self, document_kind: &str) -> Option<&VersionedMapping> {
        self.mappings.get(document_kind)
    }

    /// Decode a physical index name into its document kind, version, and
    /// inner name.
    ///
    /// Both the document kind and the inner name may contain the delimiter,
    /// so the kind is recognized as a suffix of the name rather than by
    /// splitting. When several registered kinds are valid suffixes of one
    /// another (`resource` vs `generic-resource`), the longest match wins —
    /// the choice must not depend on map iteration order.
    ///
    /// Returns `None` when no registered kind matches.
    pub fn parse_index_name(&self, index_name: &str) -> Option<IndexNameParts> {
        let remainder = index_name
            .strip_prefix(&format!("{}{}", self.index_prefix, DELIMITER))
            .unwrap_or(index_name);

        let document_kind = self
            .mappings
            .keys()
            .filter(|kind| remainder.ends_with(&format!("{}{}", DELIMITER, kind)))
            .max_by_key(|kind| kind.len())?;

        let remainder = &remainder[..remainder.len() - document_kind.len() - DELIMITER.len()];

        // What's left is `version` or `version-inner`; the version itself
        // never contains the delimiter, so split at the first one.
        let (version, inner) = match remainder.split_once(DELIMITER) {
            Some((version, inner)) => (version, inner),
            None => (remainder, ""),
        };

        Some(IndexNameParts {
            document_kind: document_kind.clone(),
            version: version.to_owned(),
            inner: inner.to_owned(),
        })
    }
}

fn non_empty_join(parts: &[&str], delimiter: &str) -> String {
    parts
        .iter()
        .filter(|p| !p.is_empty())
        .copied()
        .collect::<Vec<_>>()
        .join(delimiter)
}
