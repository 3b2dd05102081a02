use clap::{Parser, Subcommand};
use shiny_dex::{
    catalog::Catalog,
    config::{default_storage_path, RemoteConfig},
    documents::{ExportFile, ImportFile},
    progress::{open_backend, BackendMode, LocalStorage, ProgressStore, ReplaceSource},
    view::Stats,
    Status, Tracing,
};
use std::{path::PathBuf, time::Duration};
use tracing::warn;

/// Shiny Dex util for inspecting and moving progress without the web page.
#[derive(Parser)]
struct Opts {
    /// Catalog JSON file or http(s) URL.
    #[clap(long, default_value = "pokemon_data.json")]
    catalog: String,

    /// Device storage file. Defaults to the user's local data directory.
    #[clap(long)]
    storage: Option<PathBuf>,

    #[clap(long)]
    local_only: bool,

    #[clap(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Prints the caught count and completion percentage.
    Stats,

    /// Writes the progress file.
    Export {
        /// Defaults to `shiny-dex-<date>.json` in the working directory.
        #[clap(long)]
        output: Option<PathBuf>,
    },

    /// Replaces the progress with the ids of a progress file.
    Import { file: PathBuf },
}

#[tokio::main]
async fn main() -> Result<(), Status> {
    Tracing::setup("utils/dex_progress")?;

    let opts: Opts = Opts::parse();
    let catalog = Catalog::load(&opts.catalog).await?;

    let storage = LocalStorage::open(opts.storage.unwrap_or_else(default_storage_path))?;
    let backend = open_backend(&RemoteConfig::from_env(), storage, opts.local_only).await;
    let mut store = ProgressStore::new(backend, catalog.len());

    let mut notifications = store.initialize().await?;
    if store.mode() == BackendMode::Shared {
        match tokio::time::timeout(SNAPSHOT_TIMEOUT, notifications.recv()).await {
            Ok(Some(notification)) => {
                store.apply(notification);
            }
            Ok(None) => warn!("shared progress subscription closed"),
            Err(_) => warn!("no shared progress received, using an empty set"),
        }
    }

    match opts.command {
        Command::Stats => {
            let stats = Stats::new(&catalog, store.snapshot());
            println!(
                "{} / {} caught ({}%)",
                stats.caught, stats.total, stats.percentage
            );
        }
        Command::Export { output } => {
            let stats = Stats::new(&catalog, store.snapshot());
            let file = ExportFile::new(
                store.snapshot(),
                stats.caught,
                stats.total,
                stats.percentage,
            );
            let output = output.unwrap_or_else(|| PathBuf::from(file.file_name()));
            tokio::fs::write(&output, serde_json::to_vec_pretty(&file)?).await?;
            println!("exported {} ids to '{}'", file.pokemon_ids.len(), output.display());
        }
        Command::Import { file } => {
            let bytes = tokio::fs::read(&file).await?;
            let import = ImportFile::parse(&bytes)?;
            store.replace(import.pokemon_ids, ReplaceSource::Import);
            println!("✅ {} Pokémon imported", store.len());
        }
    }

    store.flush().await;
    Ok(())
}

const SNAPSHOT_TIMEOUT: Duration = Duration::from_secs(10);
