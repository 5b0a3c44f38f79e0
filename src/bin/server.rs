//! Tipboard service binary.
//!
//! Boots the tip service: loads configuration, probes the document
//! store with a bounded readiness check, then serves the framed
//! protocol over plaintext TCP (debug) or TLS until Ctrl-C.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tokio::net::TcpListener;

use tipboard::{
    error::{AppError, Result},
    models::Config,
    preview::PreviewExtractor,
    server,
    service::TipService,
    store::{MongoTipStore, TipStore},
    tls,
};

/// Tipboard - bookmark service over a framed TCP protocol
#[derive(Parser, Debug)]
#[command(name = "tipboard-server", version, about = "Tipboard bookmark service")]
struct Cli {
    /// Path to the configuration file
    #[arg(short, long, default_value = "config.toml")]
    config: PathBuf,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

/// Initialize logging based on verbosity flag.
fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .init();
}

/// Probe the deployment with a fixed attempt budget, failing fast
/// instead of waiting forever on a store that never comes up.
async fn wait_for_store(store: &MongoTipStore, attempts: u32, delay: Duration) -> Result<()> {
    for attempt in 1..=attempts {
        match store.ping().await {
            Ok(()) => return Ok(()),
            Err(e) => {
                log::warn!("store ping {attempt}/{attempts} failed: {e}");
                if attempt < attempts {
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }
    Err(AppError::config(format!(
        "document store not reachable after {attempts} attempts"
    )))
}

/// Main entry point for the service binary.
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    log::info!("Tipboard server starting...");

    let config = Config::load_or_default(&cli.config);
    config.validate()?;

    let store = MongoTipStore::connect(&config.db).await?;
    wait_for_store(
        &store,
        config.db.ready_attempts,
        Duration::from_millis(config.db.ready_delay_ms),
    )
    .await?;
    log::info!(
        "Connected to MongoDB (collection: {})",
        store.collection_name()
    );

    let extractor = PreviewExtractor::new(&config.preview)?;
    let service = Arc::new(TipService::new(
        Arc::new(store) as Arc<dyn TipStore>,
        extractor,
        &config.server,
    ));

    let acceptor = if config.server.debug {
        log::warn!("debug mode: serving plaintext");
        None
    } else {
        Some(tls::acceptor(
            &config.server.cert_file,
            &config.server.key_file,
        )?)
    };

    let address = format!("0.0.0.0:{}", config.server.port);
    let listener = TcpListener::bind(&address).await?;
    log::info!("Server started! (listening on {address})");

    tokio::select! {
        result = server::serve(listener, acceptor, service) => result,
        _ = tokio::signal::ctrl_c() => {
            log::info!("Server stopped.");
            Ok(())
        }
    }
}
