//! Command-line interface.
//!
//! A thin driver over [`SyncService`]; each subcommand maps to one engine operation.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use tasksync::config::Config;
use tasksync::constants::{
    ERROR_SYNC_FAILED, ERROR_TASK_NOT_FOUND, INFO_REMOTE_UNREACHABLE, INFO_SYNC_SKIPPED_BUSY,
    INFO_SYNC_SKIPPED_COOLDOWN, INFO_SYNC_SKIPPED_OFFLINE, SUCCESS_SYNC_COMPLETED, SUCCESS_TASK_DELETED,
    SUCCESS_TASK_UPDATED,
};
use tasksync::image::{mime_type_for_extension, Image};
use tasksync::models::{NewTask, Priority, Task, TaskPatch};
use tasksync::storage::StorageError;
use tasksync::sync::{SkipReason, SyncError, SyncOutcome, SyncService, SyncStatus};

#[derive(Parser)]
#[command(name = "tasksync")]
#[command(about = "Offline-first task manager with remote sync")]
#[command(version)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Configuration file (defaults to ./tasksync.toml or the user config dir)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Treat the network as unavailable; everything stays local
    #[arg(long, global = true)]
    pub offline: bool,

    /// Use a throwaway in-memory store
    #[arg(long, global = true)]
    pub ephemeral: bool,

    /// Override the remote base URL
    #[arg(long, global = true)]
    pub remote: Option<String>,

    /// Output as JSON
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Add a task
    Add {
        title: String,
        #[arg(short, long)]
        description: Option<String>,
        /// low, medium or high
        #[arg(short, long)]
        priority: Option<Priority>,
        /// Attach an image file
        #[arg(long)]
        image: Option<PathBuf>,
    },
    /// List tasks
    List,
    /// Change a task
    Update {
        id: String,
        #[arg(long)]
        title: Option<String>,
        #[arg(short, long)]
        description: Option<String>,
        #[arg(short, long)]
        priority: Option<Priority>,
        #[arg(long)]
        completed: Option<bool>,
        #[arg(long, conflicts_with = "clear_image")]
        image: Option<PathBuf>,
        #[arg(long)]
        clear_image: bool,
    },
    /// Flip a task between open and completed
    Toggle { id: String },
    /// Delete a task
    Delete { id: String },
    /// Push local changes now
    Sync,
    /// Show task counts
    Stats,
    /// Show sync state and pending changes
    Status,
    /// Keep running and sync on connectivity and timer triggers until Ctrl-C
    Watch,
    /// Write a default configuration file
    InitConfig {
        /// Target path (defaults to the user config dir)
        path: Option<PathBuf>,
    },
}

pub async fn run(command: Command, sync: &SyncService, json: bool) -> Result<()> {
    match command {
        Command::Add {
            title,
            description,
            priority,
            image,
        } => {
            let mut new_task = NewTask::new(title);
            if let Some(description) = description {
                new_task = new_task.with_description(description);
            }
            if let Some(priority) = priority {
                new_task = new_task.with_priority(priority);
            }
            if let Some(path) = image {
                new_task = new_task.with_image(read_image(&path)?);
            }
            let task = sync.add_task(new_task).await?;
            print_task(&task, json)?;
        }
        Command::List => {
            let tasks = sync.get_tasks().await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&tasks)?);
            } else if tasks.is_empty() {
                println!("No tasks");
            } else {
                for task in &tasks {
                    println!("{}", task_line(task));
                }
            }
        }
        Command::Update {
            id,
            title,
            description,
            priority,
            completed,
            image,
            clear_image,
        } => {
            let image = match (image, clear_image) {
                (Some(path), _) => Some(Some(read_image(&path)?)),
                (None, true) => Some(None),
                (None, false) => None,
            };
            let patch = TaskPatch {
                title,
                description,
                completed,
                priority,
                image,
            };
            if patch.is_empty() {
                anyhow::bail!("Nothing to update; pass at least one field");
            }
            let task = not_found_hint(sync.update_task(&id, patch).await, &id)?;
            if !json {
                println!("{SUCCESS_TASK_UPDATED}");
            }
            print_task(&task, json)?;
        }
        Command::Toggle { id } => {
            let task = not_found_hint(sync.toggle_complete(&id).await, &id)?;
            print_task(&task, json)?;
        }
        Command::Delete { id } => {
            sync.delete_task(&id).await?;
            println!("{SUCCESS_TASK_DELETED}: {id}");
        }
        Command::Sync => {
            let outcome = sync.request_manual_sync().await;
            println!("{}", describe_outcome(&outcome));
            if let SyncOutcome::Failed { message } = outcome {
                anyhow::bail!(message);
            }
        }
        Command::Stats => {
            let stats = sync.get_stats().await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&stats)?);
            } else {
                println!("Total:         {}", stats.total);
                println!("Completed:     {}", stats.completed);
                println!("Pending:       {}", stats.pending);
                println!("High priority: {}", stats.high_priority);
            }
        }
        Command::Status => {
            let online = sync.connectivity().is_online();
            let unsynced = sync.storage().count_unsynced().await?;
            let pending_deletes = sync.storage().list_tombstones().await?.len();
            println!("Online:          {}", if online { "yes" } else { "no" });
            println!("Unsynced tasks:  {unsynced}");
            println!("Pending deletes: {pending_deletes}");
            match sync.status().await {
                SyncStatus::Idle => println!("Last sync:       never (this session)"),
                SyncStatus::InProgress => println!("Last sync:       in progress"),
                SyncStatus::Success => {
                    if let Some(time) = sync.last_sync_time().await {
                        println!("Last sync:       {}", time.format("%Y-%m-%d %H:%M:%S"));
                    }
                }
                SyncStatus::Error { message } => println!("Last sync:       failed: {message}"),
            }
        }
        Command::Watch => {
            let handle = sync.spawn_trigger_loop();
            sync.connectivity().request_background_sync();
            println!("Watching for sync triggers, press Ctrl-C to stop");
            tokio::signal::ctrl_c().await.context("Failed to listen for Ctrl-C")?;
            handle.abort();
        }
        Command::InitConfig { path } => init_config(path)?,
    }
    Ok(())
}

/// Write the default configuration file.
pub fn init_config(path: Option<PathBuf>) -> Result<()> {
    let path = match path {
        Some(path) => path,
        None => Config::get_default_config_path()?,
    };
    if path.exists() {
        anyhow::bail!("Config file already exists: {}", path.display());
    }
    Config::generate_default_config(&path)
}

fn read_image(path: &Path) -> Result<Image> {
    let extension = path.extension().and_then(|ext| ext.to_str()).unwrap_or_default();
    let mime_type = mime_type_for_extension(extension)
        .with_context(|| format!("Unsupported image file type: {}", path.display()))?;
    let bytes = std::fs::read(path).with_context(|| format!("Failed to read image: {}", path.display()))?;
    Ok(Image::from_bytes(&bytes, mime_type))
}

fn not_found_hint(result: Result<Task, SyncError>, id: &str) -> Result<Task> {
    match result {
        Err(SyncError::Storage(StorageError::NotFound(_))) => anyhow::bail!("{ERROR_TASK_NOT_FOUND}: {id}"),
        other => Ok(other?),
    }
}

fn print_task(task: &Task, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(task)?);
    } else {
        println!("{}", task_line(task));
    }
    Ok(())
}

fn task_line(task: &Task) -> String {
    let check = if task.completed { "x" } else { " " };
    let mut line = format!("[{check}] {:<40} {:<6} {}", task.title, task.priority, task.id);
    if task.image.is_some() {
        line.push_str(" 📷");
    }
    if !task.synced {
        line.push_str(" (not synced)");
    }
    line
}

fn describe_outcome(outcome: &SyncOutcome) -> String {
    match outcome {
        SyncOutcome::Skipped(SkipReason::Offline) => INFO_SYNC_SKIPPED_OFFLINE.to_string(),
        SyncOutcome::Skipped(SkipReason::AlreadySyncing) => INFO_SYNC_SKIPPED_BUSY.to_string(),
        SyncOutcome::Skipped(SkipReason::Cooldown) => INFO_SYNC_SKIPPED_COOLDOWN.to_string(),
        SyncOutcome::Unreachable => INFO_REMOTE_UNREACHABLE.to_string(),
        SyncOutcome::Completed(report) => format!(
            "{}: {} pushed, {} failed, {} changed during push, {} deletions confirmed",
            SUCCESS_SYNC_COMPLETED,
            report.pushed,
            report.failed,
            report.deferred,
            report.tombstones_cleared
        ),
        SyncOutcome::Failed { message } => format!("{}: {message}", ERROR_SYNC_FAILED),
    }
}
