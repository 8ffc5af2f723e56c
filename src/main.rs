//! CLI entry point for the vulnscan tool.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{debug, info, warn};
use url::Url;
use vulnscan_core::api::{self, AppState};
use vulnscan_core::fetch::{GithubSource, GithubSourceConfig};
use vulnscan_core::ingest::{Batch, DEFAULT_CONCURRENCY, IngestEngine, ItemProcessor, RetryPolicy};
use vulnscan_core::store::{ScanStore, StoredFinding};
use vulnscan_core::{Database, DatabaseOptions, Finding};

mod app_config;
mod cli;

use app_config::{DEFAULT_BIND_ADDRESS, DEFAULT_DATABASE_PATH, FileConfig, load_config};
use cli::{Cli, Command};

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI arguments first (before tracing, so --help works without logs)
    let cli = Cli::parse();

    // Priority: RUST_LOG env var > quiet flag > verbose flag > default (info)
    let default_level = if cli.quiet {
        "error"
    } else {
        match cli.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    };

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));

    // Logs go to stderr so `ingest` / `query` output stays pipeable
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    debug!(?cli, "CLI arguments parsed");

    let loaded = load_config(cli.config.as_deref())?;
    if loaded.loaded_from_file {
        debug!(path = ?loaded.path, "loaded config file");
    }
    let config = loaded.config;

    // Failing to open storage is the only fatal startup condition
    let db_path = cli
        .db
        .clone()
        .or_else(|| config.database_path.clone())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_DATABASE_PATH));
    let db = Database::new_with_options(&db_path, database_options(&config))
        .await
        .with_context(|| format!("Failed to open database '{}'", db_path.display()))?;
    info!(path = %db_path.display(), "database ready");

    let store = ScanStore::new(db.clone());

    let result = match cli.command {
        Command::Serve { bind } => serve(bind, &config, store).await,
        Command::Ingest { repo, items } => ingest(repo, items, &config, &store).await,
        Command::Query { severity } => query(&severity, &store).await,
    };

    db.close().await;
    result
}

fn database_options(config: &FileConfig) -> DatabaseOptions {
    let defaults = DatabaseOptions::default();
    DatabaseOptions {
        max_connections: config.db_max_connections.unwrap_or(defaults.max_connections),
        busy_timeout_ms: config.db_busy_timeout_ms.unwrap_or(defaults.busy_timeout_ms),
    }
}

fn source_config(config: &FileConfig) -> Result<GithubSourceConfig> {
    let mut source = GithubSourceConfig::default();
    if let Some(branch) = &config.branch {
        source.branch.clone_from(branch);
    }
    if let Some(raw) = &config.raw_base_url {
        source.raw_base_url =
            Some(Url::parse(raw).with_context(|| format!("Invalid raw_base_url '{raw}'"))?);
    }
    if let Some(secs) = config.fetch_connect_timeout_secs {
        source.connect_timeout = Duration::from_secs(secs);
    }
    if let Some(secs) = config.fetch_read_timeout_secs {
        source.read_timeout = Duration::from_secs(secs);
    }
    Ok(source)
}

fn build_engine(config: &FileConfig, store: &ScanStore) -> Result<IngestEngine> {
    let source =
        GithubSource::new(source_config(config)?).context("Failed to build HTTP client")?;
    let processor = ItemProcessor::new(
        Arc::new(source),
        Arc::new(store.writer()),
        RetryPolicy::default(),
    );
    Ok(IngestEngine::new(DEFAULT_CONCURRENCY, processor)?)
}

async fn serve(bind: Option<SocketAddr>, config: &FileConfig, store: ScanStore) -> Result<()> {
    let addr: SocketAddr = match bind {
        Some(addr) => addr,
        None => config
            .bind_address
            .as_deref()
            .unwrap_or(DEFAULT_BIND_ADDRESS)
            .parse()
            .context("Invalid bind address")?,
    };

    let engine = build_engine(config, &store)?;
    let app = api::router(AppState::new(engine, store));

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    info!(addr = %listener.local_addr()?, "HTTP server listening");
    info!("Press Ctrl+C to shutdown");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server failed")?;

    info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "failed to listen for Ctrl+C");
        std::future::pending::<()>().await;
    }
}

async fn ingest(
    repo: String,
    items: Vec<String>,
    config: &FileConfig,
    store: &ScanStore,
) -> Result<()> {
    let engine = build_engine(config, store)?;
    let report = engine.dispatch(&Batch::new(repo, items)).await;

    info!(
        succeeded = report.succeeded.len(),
        failed = report.failed.len(),
        "ingest complete"
    );
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

async fn query(severity: &str, store: &ScanStore) -> Result<()> {
    let findings: Vec<Finding> = store
        .findings_by_severity(severity)
        .await
        .context("Query failed")?
        .into_iter()
        .map(StoredFinding::into_finding)
        .collect();

    debug!(severity, matches = findings.len(), "query complete");
    println!("{}", serde_json::to_string_pretty(&findings)?);
    Ok(())
}
