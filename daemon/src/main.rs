//! Presence daemon: entry point for running the check-in service.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use presence_rpc::{build_router, cors_layer, AppState, RpcMetrics, RpcServer, ServiceConfig};
use presence_store::{CheckinStore, VenueStore};
use presence_store_lmdb::{check_integrity, LmdbEnvironment};
use presence_types::{SystemClock, VenueId};
use presence_utils::{format_duration, init_tracing, LogFormat};
use presence_verification::{
    CheckinEngine, CheckinEvent, EngineDeps, EventBus, ReceiptEvidence, ReceiptScoreError,
    ReceiptScorer,
};

/// Named databases: venues, checkins, meta, plus headroom.
const MAX_DBS: u32 = 8;

#[derive(Parser)]
#[command(name = "presence-daemon", about = "Triple Verification check-in service")]
struct Cli {
    /// Data directory for the LMDB environment.
    #[arg(long, env = "PRESENCE_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// HTTP API port.
    #[arg(long, env = "PRESENCE_RPC_PORT")]
    port: Option<u16>,

    /// Log level: "trace", "debug", "info", "warn", "error".
    #[arg(long, env = "PRESENCE_LOG_LEVEL")]
    log_level: Option<String>,

    /// Log format: "human" or "json".
    #[arg(long, env = "PRESENCE_LOG_FORMAT")]
    log_format: Option<String>,

    /// Allowed CORS origins (comma-separated, "*" for any).
    #[arg(long, env = "PRESENCE_CORS_ORIGINS", value_delimiter = ',')]
    cors_origins: Vec<String>,

    /// Disable the Prometheus metrics endpoint.
    #[arg(long, env = "PRESENCE_DISABLE_METRICS")]
    disable_metrics: bool,

    /// Path to a TOML configuration file. If provided, file settings
    /// are used as the base; CLI flags and env vars override them.
    #[arg(long, env = "PRESENCE_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(clap::Subcommand)]
enum Command {
    /// Serve the check-in API.
    Run,
    /// Print the code a venue display should show right now.
    Code {
        /// Venue id.
        #[arg(long)]
        venue: String,
    },
    /// List the check-ins recorded at a venue.
    Checkins {
        /// Venue id.
        #[arg(long)]
        venue: String,
    },
}

/// Receipt scorer used when no external scorer is wired in: every receipt
/// counts as zero, so check-ins rely on location and code.
struct UnconfiguredReceiptScorer;

impl ReceiptScorer for UnconfiguredReceiptScorer {
    fn score(&self, _evidence: &ReceiptEvidence, _venue: &VenueId) -> Result<u8, ReceiptScoreError> {
        Err(ReceiptScoreError::Unavailable(
            "no receipt scorer configured".into(),
        ))
    }
}

fn load_config(cli: &Cli) -> anyhow::Result<ServiceConfig> {
    let mut config = match &cli.config {
        Some(path) => ServiceConfig::from_toml_file(path)
            .with_context(|| format!("loading config from {}", path.display()))?,
        None => ServiceConfig::default(),
    };
    if let Some(dir) = &cli.data_dir {
        config.data_dir = dir.clone();
    }
    if let Some(port) = cli.port {
        config.rpc_port = port;
    }
    if let Some(level) = &cli.log_level {
        config.log_level = level.clone();
    }
    if let Some(format) = &cli.log_format {
        config.log_format = format.clone();
    }
    if !cli.cors_origins.is_empty() {
        config.cors_allow_origins = cli.cors_origins.clone();
    }
    if cli.disable_metrics {
        config.enable_metrics = false;
    }
    Ok(config)
}

fn event_bus() -> EventBus {
    let mut bus = EventBus::new();
    bus.subscribe(Box::new(|event| match event {
        CheckinEvent::Passed { record } => tracing::info!(
            checkin = %record.id,
            user = %record.user_id,
            venue = %record.venue_id,
            total = record.total_score,
            "check-in passed"
        ),
        CheckinEvent::Failed { record } => tracing::debug!(
            user = %record.user_id,
            venue = %record.venue_id,
            total = record.total_score,
            "check-in attempt below threshold"
        ),
    }));
    bus
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = load_config(&cli)?;

    let log_format: LogFormat = config.log_format.parse().map_err(anyhow::Error::msg)?;
    init_tracing(log_format, &config.log_level);
    if let Some(path) = &cli.config {
        tracing::info!("Loaded config from {}", path.display());
    }
    config.validate()?;

    let lmdb = LmdbEnvironment::open(&config.data_dir, MAX_DBS, config.map_size_bytes())
        .with_context(|| format!("opening data dir {}", config.data_dir.display()))?;
    let report = check_integrity(&lmdb)?;
    if !report.is_healthy() {
        for error in &report.errors {
            tracing::error!("integrity: {error}");
        }
        anyhow::bail!(
            "integrity check failed with {} error(s)",
            report.errors.len()
        );
    }
    tracing::info!(
        databases = report.databases_checked,
        entries = report.total_entries,
        "integrity check passed"
    );

    let venues = Arc::new(lmdb.venue_store());
    for venue in config.seed_venues()? {
        venues
            .put_venue(&venue)
            .with_context(|| format!("seeding venue {}", venue.id))?;
    }
    if !config.venues.is_empty() {
        tracing::info!(count = config.venues.len(), "seeded venues from config");
    }

    let checkins = Arc::new(lmdb.checkin_store());
    tracing::info!(
        venues = venues.venue_count()?,
        checkins = checkins.checkin_count()?,
        "store opened"
    );

    let engine = Arc::new(CheckinEngine::new(
        EngineDeps {
            venues,
            checkins: checkins.clone(),
            receipts: Arc::new(UnconfiguredReceiptScorer),
            clock: Arc::new(SystemClock),
            events: Arc::new(event_bus()),
        },
        &config.verification,
    )?);

    match cli.command {
        Command::Code { venue } => {
            let venue = VenueId::parse(venue)?;
            let display = engine.display_code(&venue)?;
            println!(
                "{}  (rotates in {})",
                display.code,
                format_duration(display.remaining_seconds)
            );
        }
        Command::Checkins { venue } => {
            let venue = VenueId::parse(venue)?;
            let records = checkins.checkins_for_venue(&venue)?;
            for r in &records {
                println!(
                    "{}  {}  gps={} qr={} receipt={} total={} {}  at {}",
                    r.id,
                    r.user_id,
                    r.gps_score,
                    r.qr_score,
                    r.receipt_score,
                    r.total_score,
                    if r.passed { "passed" } else { "failed" },
                    r.verified_at
                );
            }
            println!("{} check-in(s) at {venue}", records.len());
        }
        Command::Run => {
            let metrics = Arc::new(RpcMetrics::new()?);
            let state = Arc::new(AppState::new(engine, metrics));
            let router = build_router(
                state,
                config.enable_metrics,
                cors_layer(&config.cors_allow_origins)?,
            );
            tracing::info!(
                "Starting presence service (API:{}, metrics:{})",
                config.rpc_port,
                if config.enable_metrics { "on" } else { "off" }
            );
            RpcServer::new(config.rpc_port, router)
                .start(async {
                    if let Err(e) = tokio::signal::ctrl_c().await {
                        tracing::warn!("failed to listen for shutdown signal: {e}");
                        std::future::pending::<()>().await;
                    }
                })
                .await?;
            tracing::info!("presence daemon exited cleanly");
        }
    }

    Ok(())
}
