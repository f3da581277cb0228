//! Invoice drafts CLI
//!
//! Command-line interface for inspecting and maintaining autosaved invoice
//! drafts in a local store.

#![allow(clippy::print_stdout)]

use std::{path::PathBuf, sync::Arc};

use anyhow::{Context, bail};
use application::services::DraftAutosaveService;
use chrono::SecondsFormat;
use clap::{Parser, Subcommand};
use domain::{DraftId, DraftMetadata, InvoicePayload};
use infrastructure::{
    AppConfig, DRAFT_CLEANUP_TASK, StorageBackend, SystemClock, create_draft_cleanup_task,
    init_telemetry, open_store, spawn_periodic_task,
};
use tracing::info;

/// Invoice drafts CLI
#[derive(Parser)]
#[command(name = "drafts-cli")]
#[command(version, about = "Manage autosaved invoice drafts", long_about = None)]
struct Cli {
    /// Verbosity level
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Configuration file (default: ./drafts.toml if present)
    #[arg(short, long, env = "DRAFTS_CONFIG")]
    config: Option<PathBuf>,

    /// Draft database file; overrides the configured store
    #[arg(short, long)]
    store: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List stored drafts, most recent first
    List {
        /// Print the full drafts as JSON instead of a summary
        #[arg(long)]
        full: bool,
    },

    /// Print the stored form data of a draft as JSON
    Show {
        /// Draft id, e.g. "new-invoice" or "edit-invoice-42"
        id: DraftId,
    },

    /// Save form data from a JSON file as a draft
    ///
    /// Example: drafts-cli save edit-invoice-42 --file form.json
    Save {
        /// Draft id
        id: DraftId,

        /// JSON file holding the invoice form data
        #[arg(short, long)]
        file: PathBuf,

        /// Maximum number of drafts to keep (default from configuration)
        #[arg(long)]
        max_drafts: Option<usize>,

        /// Go through the debounced path and wait for it to fire
        #[arg(long)]
        debounce: bool,
    },

    /// Delete a single draft
    Delete {
        /// Draft id
        id: DraftId,
    },

    /// Delete all drafts
    Clear,

    /// Remove drafts older than the retention period
    Cleanup {
        /// Age limit in days (default from configuration)
        #[arg(long)]
        max_age_days: Option<u32>,

        /// Keep running and repeat the cleanup on the configured interval
        #[arg(long)]
        watch: bool,
    },

    /// Show how long ago a draft was saved
    Age {
        /// Draft id
        id: DraftId,
    },

    /// Regenerate the metadata listing from the stored drafts
    Repair,
}

/// Determine log filter level from verbosity count
const fn log_filter_from_verbosity(verbose: u8) -> &'static str {
    match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    }
}

/// One summary line per draft
fn format_metadata_line(metadata: &DraftMetadata) -> String {
    format!(
        "{:<24} {}  {}",
        metadata.id.as_str(),
        metadata
            .timestamp
            .to_rfc3339_opts(SecondsFormat::Secs, true),
        metadata.description
    )
}

fn format_age(minutes: i64) -> String {
    match minutes {
        0 => "saved less than a minute ago".to_string(),
        1 => "saved 1 minute ago".to_string(),
        m if m < 0 => "saved in the future (clock skew)".to_string(),
        m => format!("saved {m} minutes ago"),
    }
}

fn load_config(cli: &Cli) -> anyhow::Result<AppConfig> {
    let mut config = AppConfig::load_from(cli.config.as_deref())
        .context("Failed to load configuration")?;
    if let Some(store) = &cli.store {
        config.storage.backend = StorageBackend::Redb;
        config.storage.path.clone_from(store);
    }
    if cli.verbose > 0 {
        config.telemetry.log_filter = log_filter_from_verbosity(cli.verbose).to_string();
    }
    config.validate()?;
    Ok(config)
}

// Scheduled saves fire on this thread, so once none are pending their
// writes have completed.
#[tokio::main(flavor = "current_thread")]
#[allow(clippy::too_many_lines)]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = load_config(&cli)?;
    init_telemetry(&config.telemetry)?;

    let store = open_store(&config.storage)?;
    let service = DraftAutosaveService::new(store, Arc::new(SystemClock::new()));
    let policy = config.autosave.policy();

    match cli.command {
        Commands::List { full } => {
            if full {
                println!("{}", serde_json::to_string_pretty(&service.list_drafts())?);
            } else {
                let metadata = service.list_metadata();
                if metadata.is_empty() {
                    println!("No drafts stored");
                }
                for entry in &metadata {
                    println!("{}", format_metadata_line(entry));
                }
            }
        },

        Commands::Show { id } => {
            let Some(payload) = service.load_draft(&id) else {
                bail!("No draft stored for '{id}'");
            };
            println!("{}", serde_json::to_string_pretty(&payload)?);
        },

        Commands::Save {
            id,
            file,
            max_drafts,
            debounce,
        } => {
            let raw = std::fs::read_to_string(&file)
                .with_context(|| format!("Failed to read {}", file.display()))?;
            let payload: InvoicePayload = serde_json::from_str(&raw)
                .with_context(|| format!("{} is not valid invoice form JSON", file.display()))?;
            let max_drafts = max_drafts.unwrap_or(policy.max_drafts);

            if debounce {
                if !service.schedule_save(id.clone(), payload, policy.delay, max_drafts) {
                    bail!("Could not schedule the save");
                }
                info!(delay_ms = policy.delay.as_millis(), "Waiting for debounced save");
                while service.pending_saves() > 0 {
                    tokio::time::sleep(policy.delay / 4).await;
                }
                match service.get_draft(&id) {
                    Some(draft) => println!("{}", format_metadata_line(&draft.metadata())),
                    None => println!("Nothing saved"),
                }
            } else {
                match service.save_now(&id, payload, max_drafts) {
                    Some(metadata) => println!("{}", format_metadata_line(&metadata)),
                    None => println!("Nothing saved"),
                }
            }
        },

        Commands::Delete { id } => {
            if service.delete_draft(&id) {
                println!("Deleted draft '{id}'");
            } else {
                println!("No draft stored for '{id}'");
            }
        },

        Commands::Clear => {
            service.clear_all();
            println!("All drafts cleared");
        },

        Commands::Cleanup {
            max_age_days,
            watch,
        } => {
            let max_age_days = max_age_days.unwrap_or(policy.max_age_days);

            if watch {
                let task = create_draft_cleanup_task(service.clone(), max_age_days);
                let handle = spawn_periodic_task(
                    DRAFT_CLEANUP_TASK,
                    config.autosave.cleanup_interval(),
                    task,
                );
                println!("Cleaning up drafts older than {max_age_days} day(s); Ctrl-C to stop");
                tokio::signal::ctrl_c()
                    .await
                    .context("Failed to listen for Ctrl-C")?;
                handle.abort();
            } else {
                let removed = service.cleanup_older_than(max_age_days);
                println!("Removed {removed} draft(s) older than {max_age_days} day(s)");
            }
        },

        Commands::Age { id } => match service.draft_age_minutes(&id) {
            Some(minutes) => println!("{id}: {}", format_age(minutes)),
            None => bail!("No draft stored for '{id}'"),
        },

        Commands::Repair => {
            let entries = service.rebuild_metadata();
            println!("Metadata rebuilt for {entries} draft(s)");
        },
    }

    Ok(())
}
