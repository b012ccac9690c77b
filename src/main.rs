mod cli;

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use log::info;

use cli::{Cli, Command};
use tasksync::config::Config;
use tasksync::connectivity::ConnectivityMonitor;
use tasksync::logger;
use tasksync::maintenance::run_startup_maintenance;
use tasksync::remote::{HttpRemote, RemoteStore};
use tasksync::storage::db::database_url_for_path;
use tasksync::storage::LocalStorage;
use tasksync::sync::{SyncService, SyncSettings};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Writing the config needs neither a config nor a store
    if let Command::InitConfig { path } = &cli.command {
        return cli::init_config(path.clone());
    }

    let mut config = match &cli.config {
        Some(path) => Config::load_from_file(path)?,
        None => Config::load()?,
    };
    if let Some(url) = &cli.remote {
        config.remote.base_url = url.clone();
        config.validate()?;
    }

    logger::init(&config.logging)?;

    let storage = if cli.ephemeral {
        LocalStorage::in_memory().await?
    } else {
        let path = config.storage.resolve_database_path()?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create data directory: {}", parent.display()))?;
        }
        let storage = LocalStorage::new(&database_url_for_path(&path))
            .await
            .with_context(|| format!("Failed to open task database: {}", path.display()))?;
        let outcome = run_startup_maintenance(&storage, config.storage.maintenance_interval_days).await?;
        info!("🧹 Startup maintenance: {outcome:?}");
        storage
    };

    let remote: Arc<dyn RemoteStore> = Arc::new(HttpRemote::new(
        &config.remote.base_url,
        config.remote.request_timeout(),
    )?);
    let connectivity = ConnectivityMonitor::new(!cli.offline);
    let sync = SyncService::new(Arc::new(storage), remote, connectivity).with_settings(SyncSettings::from(&config.sync));

    cli::run(cli.command, &sync, cli.json).await
}
