#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Crowd density simulator process.
//!
//! Resolves settings from flags and environment variables, loads the
//! mobility extract (building it from the raw report on first start),
//! connects to the configured store, and runs the simulation cycle until
//! stopped.
//!
//! # Environment Variables
//!
//! | Variable | Flag | Description |
//! |---|---|---|
//! | `CROWDBREAK_DATASET` | `--dataset` | Cached country extract |
//! | `CROWDBREAK_RAW_DATASET` | `--raw-dataset` | Raw global report |
//! | `CROWDBREAK_COUNTRY` | `--country` | Country kept in the extract |
//! | `CROWDBREAK_STORE` | `--store` | `realtime-db` or `file` |
//! | `CROWDBREAK_DATABASE_URL` | `--database-url` | Realtime Database base URL |
//! | `CROWDBREAK_AUTH_TOKEN` | `--auth-token` | Realtime Database auth token |
//! | `CROWDBREAK_STATE_DIR` | `--state-dir` | Directory for the file store |

use std::path::PathBuf;
use std::str::FromStr as _;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use crowdbreak_geography::RegionCatalog;
use crowdbreak_mobility::{MobilityDataset, MobilityError, load_or_prepare};
use crowdbreak_simulation::publisher::DEFAULT_INTERVAL;
use crowdbreak_simulation::{CyclePublisher, RunSummary, ScenarioError, ScenarioTable};
use crowdbreak_simulation_models::Mode;
use crowdbreak_store::file::JsonFileStore;
use crowdbreak_store::realtime_db::{DEFAULT_CONFIG_PATH, DEFAULT_SNAPSHOT_PATH, RealtimeDbStore};
use crowdbreak_store::{ConfigSource, SnapshotSink, WriteMode};
use strum_macros::{AsRefStr, Display, EnumString};

/// Errors that stop the simulator.
#[derive(Debug, thiserror::Error)]
pub enum SimulatorError {
    /// Mobility data could not be prepared or loaded.
    #[error("Mobility data unavailable: {0}")]
    Mobility(#[from] MobilityError),

    /// The scenario table override is invalid.
    #[error("Scenario table error: {0}")]
    Scenario(#[from] ScenarioError),

    /// A blocking startup task panicked or was cancelled.
    #[error("Startup task failed: {0}")]
    Join(#[from] tokio::task::JoinError),

    /// Settings are missing or inconsistent.
    #[error("Configuration error: {message}")]
    Config {
        /// Description of what went wrong.
        message: String,
    },
}

/// Which store backend to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Display, EnumString, AsRefStr)]
#[strum(serialize_all = "kebab-case", ascii_case_insensitive)]
pub enum StoreKind {
    /// Hosted Realtime Database over REST.
    RealtimeDb,
    /// JSON files in a local directory.
    #[default]
    File,
}

/// Command-line flags. Unset flags fall back to environment variables,
/// then to defaults.
#[derive(Debug, Parser)]
#[command(
    name = "crowdbreak_simulator",
    about = "Publishes simulated crowd density snapshots from historical mobility data"
)]
pub struct Cli {
    /// Cached country extract of the mobility report
    #[arg(long)]
    pub dataset: Option<PathBuf>,
    /// Raw global mobility report, filtered into `--dataset` when the cache is missing
    #[arg(long)]
    pub raw_dataset: Option<PathBuf>,
    /// Country kept when building the extract
    #[arg(long)]
    pub country: Option<String>,
    /// Store backend: `realtime-db` or `file`
    #[arg(long)]
    pub store: Option<String>,
    /// Realtime Database base URL (required for `realtime-db`)
    #[arg(long)]
    pub database_url: Option<String>,
    /// Realtime Database auth token
    #[arg(long)]
    pub auth_token: Option<String>,
    /// Node/file name of the simulation config
    #[arg(long, default_value = DEFAULT_CONFIG_PATH)]
    pub config_path: String,
    /// Node/file name receiving snapshots
    #[arg(long, default_value = DEFAULT_SNAPSHOT_PATH)]
    pub snapshot_path: String,
    /// Directory for the file store
    #[arg(long)]
    pub state_dir: Option<PathBuf>,
    /// How snapshots combine with stored state: `merge` or `replace`.
    ///
    /// `merge` only overwrites this cycle's keys, so readers keep seeing
    /// zones from earlier cycles that had no data this cycle next to the
    /// current risk entry. `replace` publishes exactly this cycle's zones.
    #[arg(long, default_value = "merge")]
    pub write_mode: String,
    /// Seconds to pause between cycles
    #[arg(long, default_value_t = DEFAULT_INTERVAL.as_secs())]
    pub interval_secs: u64,
    /// TOML scenario table replacing the built-in one
    #[arg(long)]
    pub scenarios: Option<PathBuf>,
    /// Seed for scenario date sampling
    #[arg(long)]
    pub seed: Option<u64>,
    /// Stop after this many cycles instead of running forever
    #[arg(long)]
    pub cycles: Option<u64>,
}

/// Fully resolved settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    /// Cached country extract.
    pub dataset: PathBuf,
    /// Raw global report.
    pub raw_dataset: PathBuf,
    /// Country kept in the extract.
    pub country: String,
    /// Store backend.
    pub store: StoreKind,
    /// Realtime Database base URL.
    pub database_url: Option<String>,
    /// Realtime Database auth token.
    pub auth_token: Option<String>,
    /// Config node/file name.
    pub config_path: String,
    /// Snapshot node/file name.
    pub snapshot_path: String,
    /// File store directory.
    pub state_dir: PathBuf,
    /// Sink write semantics.
    pub write_mode: WriteMode,
    /// Pause between cycles.
    pub interval: Duration,
    /// Scenario table override.
    pub scenarios: Option<PathBuf>,
    /// Sampling seed.
    pub seed: Option<u64>,
    /// Cycle limit.
    pub cycles: Option<u64>,
}

impl Settings {
    /// Resolves flags against environment lookups.
    ///
    /// `env` is usually `|k| std::env::var(k).ok()`.
    ///
    /// # Errors
    ///
    /// Returns [`SimulatorError::Config`] for an unknown store kind or
    /// write mode, or a `realtime-db` store without a database URL.
    pub fn resolve(cli: Cli, env: impl Fn(&str) -> Option<String>) -> Result<Self, SimulatorError> {
        let path = |flag: Option<PathBuf>, var: &str, default: &str| {
            flag.or_else(|| env(var).map(PathBuf::from))
                .unwrap_or_else(|| PathBuf::from(default))
        };

        let store_name = cli
            .store
            .or_else(|| env("CROWDBREAK_STORE"))
            .unwrap_or_else(|| StoreKind::default().to_string());
        let store = StoreKind::from_str(store_name.trim()).map_err(|_| SimulatorError::Config {
            message: format!("Unknown store '{store_name}'. Use 'realtime-db' or 'file'."),
        })?;

        let write_mode =
            WriteMode::from_str(cli.write_mode.trim()).map_err(|_| SimulatorError::Config {
                message: format!(
                    "Unknown write mode '{}'. Use 'merge' or 'replace'.",
                    cli.write_mode
                ),
            })?;

        let database_url = cli
            .database_url
            .or_else(|| env("CROWDBREAK_DATABASE_URL"))
            .filter(|u| !u.trim().is_empty());
        if store == StoreKind::RealtimeDb && database_url.is_none() {
            return Err(SimulatorError::Config {
                message: "CROWDBREAK_DATABASE_URL (or --database-url) is required for the realtime-db store"
                    .to_string(),
            });
        }

        Ok(Self {
            dataset: path(cli.dataset, "CROWDBREAK_DATASET", "data/india_only_final.csv"),
            raw_dataset: path(
                cli.raw_dataset,
                "CROWDBREAK_RAW_DATASET",
                "data/Global_Mobility_Report.csv",
            ),
            country: cli
                .country
                .or_else(|| env("CROWDBREAK_COUNTRY"))
                .unwrap_or_else(|| "India".to_string()),
            store,
            database_url,
            auth_token: cli.auth_token.or_else(|| env("CROWDBREAK_AUTH_TOKEN")),
            config_path: cli.config_path,
            snapshot_path: cli.snapshot_path,
            state_dir: path(cli.state_dir, "CROWDBREAK_STATE_DIR", "data/state"),
            write_mode,
            interval: Duration::from_secs(cli.interval_secs),
            scenarios: cli.scenarios,
            seed: cli.seed,
            cycles: cli.cycles,
        })
    }
}

/// Builds the configured store backend. The same instance serves as
/// config source and snapshot sink.
fn build_store(settings: &Settings) -> (Arc<dyn ConfigSource>, Arc<dyn SnapshotSink>) {
    log::info!("Snapshot write mode: {}", settings.write_mode);

    match settings.store {
        StoreKind::RealtimeDb => {
            let url = settings.database_url.as_deref().unwrap_or_default();
            log::info!("Using Realtime Database store at {url}");
            let store = Arc::new(
                RealtimeDbStore::new(url)
                    .with_auth_token(settings.auth_token.clone())
                    .with_config_path(&settings.config_path)
                    .with_snapshot_path(&settings.snapshot_path)
                    .with_write_mode(settings.write_mode),
            );
            (store.clone(), store)
        }
        StoreKind::File => {
            log::info!("Using file store in {}", settings.state_dir.display());
            let store = Arc::new(JsonFileStore::new(
                &settings.state_dir,
                &settings.config_path,
                &settings.snapshot_path,
                settings.write_mode,
            ));
            (store.clone(), store)
        }
    }
}

/// Logs scenario dates the dataset has no rows for.
fn check_coverage(scenarios: &ScenarioTable, dataset: &MobilityDataset) {
    for mode in Mode::all() {
        for date in scenarios.candidates(*mode) {
            if !dataset.has_date(*date) {
                log::warn!("Dataset has no rows for {mode} scenario date {date}");
            }
        }
    }
}

/// Loads data, connects the store, and runs the simulation.
///
/// Returns only when a cycle limit is set.
///
/// # Errors
///
/// Returns [`SimulatorError`] if the mobility data or scenario table
/// cannot be loaded. Failures inside a cycle are logged and never end
/// the run.
pub async fn run(settings: Settings) -> Result<RunSummary, SimulatorError> {
    let dataset = {
        let cached = settings.dataset.clone();
        let raw = settings.raw_dataset.clone();
        let country = settings.country.clone();
        tokio::task::spawn_blocking(move || load_or_prepare(&cached, &raw, &country)).await??
    };

    let scenarios = match &settings.scenarios {
        Some(path) => {
            log::info!("Loading scenario table from {}", path.display());
            ScenarioTable::from_path(path)?
        }
        None => ScenarioTable::builtin(),
    };
    check_coverage(&scenarios, &dataset);

    let (config, sink) = build_store(&settings);

    let mut publisher = CyclePublisher::new(RegionCatalog::india(), Arc::new(dataset), config, sink)
        .with_scenarios(scenarios)
        .with_interval(settings.interval);
    if let Some(seed) = settings.seed {
        publisher = publisher.with_seed(seed);
    }

    Ok(publisher.run(settings.cycles).await)
}
