//! Griddle — zero-downtime schema migrations for versioned search indices.
//!
//! Griddle manages the lifecycle of versioned index schemas on an
//! Elasticsearch-compatible engine. Physical indices are named
//! `{prefix}-{version}-{inner}-{kind}` and fronted by a stable alias
//! `{prefix}-{inner}-{kind}`; when the registered schema version for a
//! document kind moves ahead of an index's name, griddle creates a fresh
//! index with the current schema, copies the data across behind a write
//! block, and swaps the alias atomically so readers never see the index
//! offline.
//!
//! ```no_run
//! use griddle::{Config, IndexManager};
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn run() -> griddle::Result<()> {
//! let config = Config::new("myapp", "/etc/myapp/mappings");
//! let manager = IndexManager::new(config, "http://localhost:9200")?;
//! manager.initialize(&CancellationToken::new()).await?;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod engine;
pub mod error;
pub mod manager;
pub mod migrator;
pub mod orchestrator;
pub mod registry;
pub mod repository;
pub mod types;

pub use config::{Config, MigrationConfig};
pub use engine::EngineClient;
pub use error::{GriddleError, Result};
pub use manager::IndexManager;
pub use migrator::Migrator;
pub use orchestrator::MigrationOrchestrator;
pub use registry::MappingRegistry;
pub use repository::IndexRepository;
pub use types::{IndexNameParts, Migration, VersionedMapping};
