use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::engine::{CreateIndexOutcome, DeleteIndexOutcome, EngineClient};
use crate::error::{GriddleError, Result};
use crate::registry::MappingRegistry;

/// Idempotent create/delete of physical indices.
///
/// Creation pulls the mapping body for the document kind from the registry
/// and attaches the alias in the same request, so a new index is never
/// observable without its alias. Re-running either operation is safe: an
/// index that already exists (or was created by a racing instance) and a
/// delete of an index that's already gone both count as success.
pub struct IndexRepository {
    client: Arc<EngineClient>,
    registry: Arc<MappingRegistry>,
}

impl IndexRepository {
    pub fn new(client: Arc<EngineClient>, registry: Arc<MappingRegistry>) -> Self {
        Self { client, registry }
    }

    /// Create `index_name` using the mappings registered for
    /// `document_kind`, adding `alias_name` when non-empty.
    ///
    /// # Errors
    ///
    /// [`GriddleError::MappingNotFound`] when the kind isn't registered;
    /// engine/transport errors other than "already exists" are fatal.
    pub async fn create_index(
        &self,
        token: &CancellationToken,
        index_name: &str,
        alias_name: &str,
        document_kind: &str,
    ) -> Result<()> {
        if self.client.index_exists(token, index_name).await? {
            tracing::debug!("Index already exists, skipping creation: index={}", index_name);
            return Ok(());
        }

        let mapping = self
            .registry
            .mapping(document_kind)
            .ok_or_else(|| GriddleError::MappingNotFound(document_kind.to_owned()))?;

        let mut body = serde_json::Map::new();
        body.insert("mappings".into(), mapping.mappings.clone());
        if let Some(settings) = &mapping.settings {
            body.insert("settings".into(), settings.clone());
        }
        if !alias_name.is_empty() {
            body.insert(
                "aliases".into(),
                serde_json::json!({ alias_name: {} }),
            );
        }

        match self
            .client
            .create_index(token, index_name, &serde_json::Value::Object(body))
            .await?
        {
            CreateIndexOutcome::Created => {
                tracing::info!("Index created: index={}", index_name);
            }
            CreateIndexOutcome::AlreadyExists => {
                // another instance won the race; the index is there either way
                tracing::info!("Index already exists: index={}", index_name);
            }
        }

        Ok(())
    }

    /// Delete `index_name`, which also removes any associated aliases.
    pub async fn delete_index(&self, token: &CancellationToken, index_name: &str) -> Result<()> {
        match self.client.delete_index(token, index_name).await? {
            DeleteIndexOutcome::Deleted => {
                tracing::debug!("Index deleted: index={}", index_name);
            }
            DeleteIndexOutcome::NotFound => {
                tracing::debug!("Index already deleted: index={}", index_name);
            }
        }

        Ok(())
    }
}
