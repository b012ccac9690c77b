use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};

use log::{debug, info, warn};
use sea_orm::sea_query::Table;
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, DbErr, EntityTrait, Schema};

use super::error::{StorageError, StorageResult};
use crate::entities::{setting, task, tombstone};

/// Connection string for a private in-memory database
pub const IN_MEMORY_URL: &str = "sqlite::memory:";

/// Local storage manager for task records
pub struct LocalStorage {
    pub(crate) conn: DatabaseConnection,
    initialized: AtomicBool,
}

impl LocalStorage {
    /// Connect and create the schema.
    ///
    /// # Arguments
    /// * `database_url` - SQLite connection string, e.g. `sqlite:///path/tasks.db?mode=rwc`
    ///
    /// # Errors
    /// Returns `TransactionFailed` if the database cannot be opened or the schema created
    pub async fn new(database_url: &str) -> StorageResult<Self> {
        let storage = Self::connect(database_url).await?;
        storage.initialize().await?;
        Ok(storage)
    }

    /// Private in-memory store, used by tests and ephemeral sessions.
    pub async fn in_memory() -> StorageResult<Self> {
        Self::new(IN_MEMORY_URL).await
    }

    /// Open the database without creating the schema.
    ///
    /// Every task operation fails with `NotInitialized` until [`initialize`](Self::initialize) runs.
    pub async fn connect(database_url: &str) -> StorageResult<Self> {
        let mut options = ConnectOptions::new(database_url.to_string());
        options.sqlx_logging(false);
        if database_url.contains(":memory:") {
            // Each pooled connection would otherwise get its own empty database
            options.max_connections(1).min_connections(1);
        }

        let conn = Database::connect(options).await?;
        debug!("🗄️  Connected to local store at {database_url}");

        Ok(Self {
            conn,
            initialized: AtomicBool::new(false),
        })
    }

    /// Create all tables and indexes if they do not exist yet.
    pub async fn initialize(&self) -> StorageResult<()> {
        self.create_tables().await?;
        self.initialized.store(true, Ordering::SeqCst);
        info!("✅ Local store initialized");
        Ok(())
    }

    /// Whether schema setup has completed.
    pub fn is_initialized(&self) -> bool {
        self.initialized.load(Ordering::SeqCst)
    }

    pub(crate) fn ensure_initialized(&self) -> StorageResult<()> {
        if self.is_initialized() {
            Ok(())
        } else {
            Err(StorageError::NotInitialized)
        }
    }

    /// Destroy and recreate the task and tombstone tables.
    ///
    /// Settings are kept. The store reports `NotInitialized` while the reset runs, and
    /// stays that way if recreating the schema fails.
    pub async fn reset_schema(&self) -> StorageResult<()> {
        self.initialized.store(false, Ordering::SeqCst);
        warn!("🧹 Resetting local task store");

        let backend = self.conn.get_database_backend();
        let drop_tasks = Table::drop().table(task::Entity).if_exists().to_owned();
        let drop_tombstones = Table::drop().table(tombstone::Entity).if_exists().to_owned();
        self.conn.execute(backend.build(&drop_tasks)).await?;
        self.conn.execute(backend.build(&drop_tombstones)).await?;

        self.initialize().await
    }

    async fn create_tables(&self) -> StorageResult<()> {
        self.create_table_for(task::Entity).await?;
        self.create_table_for(tombstone::Entity).await?;
        self.create_table_for(setting::Entity).await?;
        Ok(())
    }

    async fn create_table_for<E>(&self, entity: E) -> Result<(), DbErr>
    where
        E: EntityTrait,
    {
        let backend = self.conn.get_database_backend();
        let schema = Schema::new(backend);

        let table = schema.create_table_from_entity(entity).if_not_exists().to_owned();
        self.conn.execute(backend.build(&table)).await?;

        for mut index in schema.create_index_from_entity(entity) {
            let index = index.if_not_exists().to_owned();
            self.conn.execute(backend.build(&index)).await?;
        }
        Ok(())
    }
}

/// SQLite connection string for a database file, created on first open.
pub fn database_url_for_path(path: &Path) -> String {
    format!("sqlite://{}?mode=rwc", path.display())
}
