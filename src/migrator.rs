//! Discovery of stale indices and the per-index cutover protocol.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::config::Config;
use crate::engine::types::AliasActionsRequest;
use crate::engine::EngineClient;
use crate::error::{GriddleError, Result};
use crate::registry::MappingRegistry;
use crate::repository::IndexRepository;
use crate::types::Migration;

/// Injectable wait used between reindex polls, so tests can substitute an
/// instant sleep. The production default is [`tokio::time::sleep`].
pub type SleepFn = Arc<dyn Fn(Duration) -> Pin<Box<dyn Future<Output = ()> + Send>> + Send + Sync>;

fn default_sleep() -> SleepFn {
    Arc::new(|duration| Box::pin(tokio::time::sleep(duration)))
}

/// Finds indices whose schema version is stale and cuts each over to a new
/// index carrying the current schema, without taking the alias offline.
///
/// A migration leaves no partial state that a re-run can't pick up: the
/// write-block check and the repository's create are both idempotent, so the
/// recovery path after a crash mid-protocol is simply running discovery and
/// migration again from the top. There is no rollback.
pub struct Migrator {
    config: Arc<Config>,
    client: Arc<EngineClient>,
    registry: Arc<MappingRegistry>,
    repository: Arc<IndexRepository>,
    sleep: SleepFn,
}

impl Migrator {
    pub fn new(
        config: Arc<Config>,
        client: Arc<EngineClient>,
        registry: Arc<MappingRegistry>,
        repository: Arc<IndexRepository>,
    ) -> Self {
        Self::with_sleep(config, client, registry, repository, default_sleep())
    }

    pub fn with_sleep(
        config: Arc<Config>,
        client: Arc<EngineClient>,
        registry: Arc<MappingRegistry>,
        repository: Arc<IndexRepository>,
        sleep: SleepFn,
    ) -> Self {
        Self {
            config,
            client,
            registry,
            repository,
            sleep,
        }
    }

    /// Scan the engine's index catalog for managed indices whose name
    /// carries a version other than the registry's current one.
    ///
    /// Per-index problems (missing ownership tag, unparsable name, already
    /// current) skip that index; only a failure of the catalog fetch itself
    /// fails the call.
    pub async fn get_migrations(&self, token: &CancellationToken) -> Result<Vec<Migration>> {
        let indices = self.client.list_indices(token).await?;

        let mut migrations = Vec::new();
        for (index_name, info) in &indices {
            let managed = index_name.starts_with(&self.config.index_prefix)
                && info.owner_tag() == Some(self.config.index_prefix.as_str());
            if !managed {
                continue;
            }

            let parts = match self.registry.parse_index_name(index_name) {
                Some(parts) => parts,
                None => {
                    tracing::warn!(
                        "Discovered index matching criteria, but wasn't able to determine document kind: index={}",
                        index_name
                    );
                    continue;
                }
            };

            let current_version = self.registry.version(&parts.document_kind).unwrap_or("");
            if parts.version == current_version {
                continue;
            }

            migrations.push(Migration {
                alias: self.registry.alias_name(&parts.document_kind, &parts.inner),
                source_index: index_name.clone(),
                target_index: self.registry.index_name(&parts.document_kind, &parts.inner),
                document_kind: parts.document_kind,
            });
        }

        Ok(migrations)
    }

    /// Execute the cutover for a single migration.
    ///
    /// Steps, in order: ensure a write block on the source (snapshot
    /// boundary), create the target through the repository, reindex
    /// asynchronously and poll until completion, clean up the task document
    /// (best effort), swap the alias atomically, delete the source. The
    /// first failing step aborts the migration; nothing is rolled back.
    pub async fn migrate(&self, token: &CancellationToken, migration: &Migration) -> Result<()> {
        tracing::info!(
            "Starting migration: source={}, target={}",
            migration.source_index,
            migration.target_index
        );

        self.block_writes(token, &migration.source_index).await?;

        self.repository
            .create_index(
                token,
                &migration.target_index,
                &migration.alias,
                &migration.document_kind,
            )
            .await?;

        self.reindex(token, &migration.source_index, &migration.target_index)
            .await?;

        self.swap_alias(
            token,
            &migration.alias,
            &migration.source_index,
            &migration.target_index,
        )
        .await?;

        tracing::info!("Deleting source index: index={}", migration.source_index);
        self.client
            .delete_index(token, &migration.source_index)
            .await?;

        tracing::info!(
            "Migration complete: source={}, target={}",
            migration.source_index,
            migration.target_index
        );
        Ok(())
    }

    /// Make sure the source index rejects writes before any data is copied.
    /// An index that's already blocked (a previous attempt got this far) is
    /// left alone.
    async fn block_writes(&self, token: &CancellationToken, index: &str) -> Result<()> {
        if self.client.get_write_block(token, index).await? {
            return Ok(());
        }

        tracing::info!("Placing write block on index: index={}", index);
        let ack = self.client.add_write_block(token, index).await?;

        if !(ack.acknowledged && ack.shards_acknowledged) {
            tracing::error!(
                "Write block unsuccessful: index={}, acknowledged={}, shards_acknowledged={}",
                index,
                ack.acknowledged,
                ack.shards_acknowledged
            );
            return Err(GriddleError::WriteBlockRejected(index.to_owned()));
        }

        Ok(())
    }

    async fn reindex(&self, token: &CancellationToken, source: &str, target: &str) -> Result<()> {
        tracing::info!("Starting reindex: source={}, target={}", source, target);
        let task = self.client.start_reindex(token, source, target).await?;
        tracing::info!("Reindex started: task={}", task);

        let attempts = self.config.migration.poll_attempts;
        let mut completed = false;
        for _ in 0..attempts {
            match self.client.get_task(token, &task).await {
                Ok(true) => {
                    completed = true;
                    tracing::info!("Reindex completed: task={}", task);
                    break;
                }
                Ok(false) => {
                    tracing::debug!(
                        "Task incomplete, waiting before polling again: task={}",
                        task
                    );
                    self.wait(token).await?;
                }
                Err(GriddleError::Cancelled) => return Err(GriddleError::Cancelled),
                // a failed poll consumes an attempt but doesn't abort the loop
                Err(e) => tracing::warn!("Error getting task status: task={}, error={}", task, e),
            }
        }

        if !completed {
            return Err(GriddleError::ReindexIncomplete { attempts });
        }

        // best-effort bookkeeping; the migration outcome doesn't depend on it
        if let Err(e) = self.client.delete_task_doc(token, &task).await {
            tracing::warn!("Error deleting task document: task={}, error={}", task, e);
        }

        Ok(())
    }

    /// The protocol's only suspension point. Races the configured interval
    /// against cancellation so shutdown never waits out a full sleep.
    async fn wait(&self, token: &CancellationToken) -> Result<()> {
        tokio::select! {
            _ = token.cancelled() => Err(GriddleError::Cancelled),
            _ = (self.sleep)(self.config.migration.poll_interval) => Ok(()),
        }
    }

    async fn swap_alias(
        &self,
        token: &CancellationToken,
        alias: &str,
        source: &str,
        target: &str,
    ) -> Result<()> {
        tracing::info!(
            "Swapping alias over to new index: alias={}, source={}, target={}",
            alias,
            source,
            target
        );

        self.client
            .update_aliases(token, &AliasActionsRequest::swap(alias, source, target))
            .await
    }
}
