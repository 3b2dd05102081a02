use clap::Parser;
use shiny_dex::{
    catalog::Catalog,
    config::{default_storage_path, RemoteConfig},
    http,
    progress::{open_backend, BackendMode, LocalStorage, ProgressStore},
    session::{self, Session, TokioClock},
    Status, Tracing,
};
use std::{env, path::PathBuf, sync::Arc};
use tracing::{error, info};

#[derive(Parser)]
struct Opts {
    /// Port number to use for listening to HTTP requests.
    #[clap(short, long, default_value = "8080")]
    port: u16,

    /// Catalog JSON file or http(s) URL.
    #[clap(long, default_value = "pokemon_data.json")]
    catalog: String,

    /// Device storage file. Defaults to the user's local data directory.
    #[clap(long)]
    storage: Option<PathBuf>,

    /// Keep progress on this device even if a shared backend is configured.
    #[clap(long)]
    local_only: bool,

    #[clap(long)]
    prod_tracing: bool,
}

#[tokio::main]
async fn main() -> Result<(), Status> {
    let opts: Opts = Opts::parse();
    let config = RemoteConfig::from_env();

    match opts.prod_tracing {
        false => Tracing::setup("shiny-dex")?,
        true => Tracing::setup_prod(&config.project_id, "dex_logs")?,
    }

    // Let ENV VAR override flag.
    let port: u16 = match env::var("PORT") {
        Ok(port) => match port.parse::<u16>() {
            Ok(port) => port,
            Err(_) => opts.port,
        },
        Err(_) => opts.port,
    };

    let catalog = Catalog::load(&opts.catalog).await;
    let total = catalog.as_ref().map(Catalog::len).unwrap_or_default();

    let storage = LocalStorage::open(opts.storage.unwrap_or_else(default_storage_path))?;
    let backend = open_backend(&config, storage, opts.local_only).await;

    let mut store = ProgressStore::new(backend, total);
    let notifications = store.initialize_or_detach().await;
    match store.mode() {
        BackendMode::Shared => info!("🌐 Shared mode: progress is synchronized with every player"),
        BackendMode::Local => info!("💾 Local mode: progress is saved on this device only"),
    }
    info!("💡 Tip: press Ctrl+K to search");

    let (handle, task) = session::start(Session::new(catalog, store, TokioClock), notifications);
    let handle = Arc::new(handle);

    let stopping = Arc::clone(&handle);
    let (addr, server) = warp::serve(http::routes::routes(Arc::clone(&handle)))
        .try_bind_with_graceful_shutdown(([127, 0, 0, 1], port), async move {
            let _ = tokio::signal::ctrl_c().await;
            info!("shutting down");
            // Open event streams end once the session stops.
            if let Err(status) = stopping.shutdown().await {
                error!("Failed to stop session: {status}");
            }
        })
        .map_err(|e| Status::new("Failed to bind server", e))?;

    info!("shiny dex served at http://{addr}");
    server.await;

    if let Err(e) = task.await {
        error!("session task failed: {e}");
    }
    Ok(())
}
