use tokio_util::sync::CancellationToken;

use crate::error::Result;
use crate::migrator::Migrator;

/// Runs the full discovered batch of migrations sequentially, failing fast.
pub struct MigrationOrchestrator {
    migrator: Migrator,
}

impl MigrationOrchestrator {
    pub fn new(migrator: Migrator) -> Self {
        Self { migrator }
    }

    /// Discover pending migrations once and run them in order.
    ///
    /// An empty batch is a logged no-op. The first migration error is
    /// returned verbatim and stops the batch; later migrations are never
    /// attempted.
    pub async fn run_migrations(&self, token: &CancellationToken) -> Result<()> {
        let migrations = self.migrator.get_migrations(token).await?;

        if migrations.is_empty() {
            tracing::info!("No migrations to run");
            return Ok(());
        }

        tracing::info!("Discovered {} migrations to run", migrations.len());
        for migration in &migrations {
            self.migrator.migrate(token, migration).await?;
        }

        Ok(())
    }
}
