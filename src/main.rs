//! Marginalia API Server
//!
//! Run with: cargo run --bin marginalia
//!
//! Configuration is read from the first of
//! `~/.config/marginalia/config.toml`, `/etc/marginalia/config.toml` and
//! `./config.toml`, with `MARGINALIA_*` environment overrides. `RUST_LOG`
//! takes precedence over the configured log level.

use std::fs::File;
use std::sync::{Arc, Mutex};

use marginalia::api::{serve, AppState};
use marginalia::config::{Config, LoggingConfig};
use marginalia::groups::blacklist;
use marginalia::storage::Database;
use std::path::Path;
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load_default();
    init_tracing(&config.logging)?;

    tracing::info!("Starting Marginalia API server v{}", env!("CARGO_PKG_VERSION"));

    let database_path = config.storage.database_path();
    tracing::info!("Database: {:?}", database_path);
    let db = Arc::new(Database::open(&database_path)?);
    tracing::info!("Database opened, {} annotations", db.annotation_count()?);

    let blacklist = blacklist::init(Path::new(&config.groups.blacklist_path));

    let state = AppState::new(db, blacklist, config.api.clone())
        .page_size(config.activity.page_size);

    serve(state, &config.api).await?;

    Ok(())
}

fn init_tracing(config: &LoggingConfig) -> std::io::Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        format!("marginalia={},tower_http=debug", config.level).into()
    });

    let writer = match &config.file {
        Some(path) => {
            let file = File::options().create(true).append(true).open(path)?;
            BoxMakeWriter::new(Mutex::new(file))
        }
        None => BoxMakeWriter::new(std::io::stdout),
    };

    let registry = tracing_subscriber::registry().with(filter);
    if config.format == "json" {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(writer))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(writer))
            .init();
    }

    Ok(())
}
