use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::config::Config;
use crate::engine::EngineClient;
use crate::error::Result;
use crate::migrator::Migrator;
use crate::orchestrator::MigrationOrchestrator;
use crate::registry::MappingRegistry;
use crate::repository::IndexRepository;

/// Convenience composition of the registry, repository, and orchestrator.
///
/// The three components stay independently constructible; this just wires
/// them together for callers that want the whole lifecycle in one place:
/// build (loading mappings), then [`IndexManager::initialize`] at startup to
/// bring every managed index up to the current schema version.
pub struct IndexManager {
    registry: Arc<MappingRegistry>,
    repository: Arc<IndexRepository>,
    orchestrator: MigrationOrchestrator,
}

impl std::fmt::Debug for IndexManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IndexManager").finish_non_exhaustive()
    }
}

impl IndexManager {
    /// Load the mapping registry from `config.mappings_path` and wire the
    /// engine client, repository, and orchestrator against `engine_url`.
    pub fn new(config: Config, engine_url: &str) -> Result<Self> {
        let config = Arc::new(config);
        let client = Arc::new(EngineClient::new(engine_url));
        let registry = Arc::new(MappingRegistry::load(&config)?);
        let repository = Arc::new(IndexRepository::new(client.clone(), registry.clone()));
        let migrator = Migrator::new(config, client, registry.clone(), repository.clone());

        Ok(Self {
            registry,
            repository,
            orchestrator: MigrationOrchestrator::new(migrator),
        })
    }

    /// Discover and run all pending migrations.
    pub async fn initialize(&self, token: &CancellationToken) -> Result<()> {
        self.orchestrator.run_migrations(token).await
    }

    pub fn registry(&self) -> &MappingRegistry {
        &self.registry
    }

    pub fn repository(&self) -> &IndexRepository {
        &self.repository
    }
}
