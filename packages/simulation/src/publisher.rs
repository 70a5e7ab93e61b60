//! The repeating simulation cycle.
//!
//! One cycle: read the mode, pick a scenario date, compute a zone for every
//! region with data on that date, rank the zones, assess risk from the top
//! three, and publish the snapshot. Cycles never overlap: the next one
//! starts only after the previous publish has completed and the pacer has
//! paused for the configured interval.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDate;
use crowdbreak_geography::RegionCatalog;
use crowdbreak_mobility_models::MobilityLookup;
use crowdbreak_simulation_models::{Mode, RankedRegion, RiskLevel, Snapshot};
use crowdbreak_store::{ConfigSource, SnapshotSink};
use rand::SeedableRng as _;
use rand::rngs::StdRng;

use crate::{Pacer, ScenarioTable, TokioPacer, density, risk};

/// Pause between cycles unless overridden.
pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(5);

/// Outcome of one cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CycleReport {
    /// Mode the cycle ran under.
    pub mode: Mode,
    /// Scenario date sampled.
    pub date: NaiveDate,
    /// Number of zones in the snapshot.
    pub zones_published: usize,
    /// Regions left out for lack of data.
    pub regions_skipped: usize,
    /// Published risk level.
    pub risk_level: RiskLevel,
    /// Whether the sink accepted the snapshot.
    pub published: bool,
}

/// Totals for a run of cycles.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Cycles executed.
    pub cycles: u64,
    /// Cycles whose publish failed.
    pub failed_publishes: u64,
}

/// Drives simulation cycles against injected collaborators.
pub struct CyclePublisher {
    catalog: RegionCatalog,
    mobility: Arc<dyn MobilityLookup>,
    config: Arc<dyn ConfigSource>,
    sink: Arc<dyn SnapshotSink>,
    pacer: Arc<dyn Pacer>,
    scenarios: ScenarioTable,
    interval: Duration,
    rng: StdRng,
}

impl CyclePublisher {
    /// Creates a publisher with the built-in scenario table, the default
    /// interval, a tokio pacer, and an entropy-seeded RNG.
    #[must_use]
    pub fn new(
        catalog: RegionCatalog,
        mobility: Arc<dyn MobilityLookup>,
        config: Arc<dyn ConfigSource>,
        sink: Arc<dyn SnapshotSink>,
    ) -> Self {
        Self {
            catalog,
            mobility,
            config,
            sink,
            pacer: Arc::new(TokioPacer),
            scenarios: ScenarioTable::builtin(),
            interval: DEFAULT_INTERVAL,
            rng: StdRng::from_os_rng(),
        }
    }

    /// Replaces the scenario table.
    #[must_use]
    pub fn with_scenarios(mut self, scenarios: ScenarioTable) -> Self {
        self.scenarios = scenarios;
        self
    }

    /// Sets the pause between cycles.
    #[must_use]
    pub const fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Replaces the pacer.
    #[must_use]
    pub fn with_pacer(mut self, pacer: Arc<dyn Pacer>) -> Self {
        self.pacer = pacer;
        self
    }

    /// Seeds scenario sampling for reproducible runs.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    /// Reads the current mode. Read failures and missing config both
    /// resolve to [`Mode::Normal`].
    async fn resolve_mode(&self) -> Mode {
        match self.config.fetch_config().await {
            Ok(Some(config)) => {
                let mode = config.mode();
                match config.signal() {
                    None => log::debug!("No mode set, using '{mode}'"),
                    Some(signal) if !signal.eq_ignore_ascii_case(mode.as_ref()) => {
                        log::warn!("Unrecognized mode '{signal}', falling back to '{mode}'");
                    }
                    Some(_) => {}
                }
                mode
            }
            Ok(None) => {
                log::debug!("No simulation config stored, using '{}'", Mode::Normal);
                Mode::Normal
            }
            Err(e) => {
                log::warn!("Failed to read simulation config ({e}), using '{}'", Mode::Normal);
                Mode::Normal
            }
        }
    }

    /// Computes the snapshot for `mode` on `date`.
    ///
    /// Returns the snapshot and the number of regions skipped for lack of
    /// data.
    #[must_use]
    pub fn build_snapshot(&self, mode: Mode, date: NaiveDate) -> (Snapshot, usize) {
        let mut zones = BTreeMap::new();
        let mut ranking = Vec::with_capacity(self.catalog.len());
        let mut skipped = 0;

        for region in &self.catalog {
            let Some(deviation) = self.mobility.lookup(&region.name, date) else {
                log::debug!("No data for {} on {date}, skipping", region.name);
                skipped += 1;
                continue;
            };

            let zone = density::compute_zone(region, deviation, mode);
            ranking.push(RankedRegion {
                name: region.name.clone(),
                density: zone.density,
            });
            zones.insert(region.id.clone(), zone);
        }

        risk::rank(&mut ranking);
        let assessment = risk::assess(risk::top(&ranking), mode, &self.scenarios);

        (
            Snapshot {
                mode,
                date,
                zones,
                risk: assessment,
            },
            skipped,
        )
    }

    /// Runs one full cycle. Publish failures are logged, not returned.
    pub async fn run_cycle(&mut self) -> CycleReport {
        let mode = self.resolve_mode().await;
        log::info!("Current mode: {mode}");

        let date = self.scenarios.select_date(mode, &mut self.rng);
        let (snapshot, skipped) = self.build_snapshot(mode, date);

        if snapshot.zones.is_empty() {
            log::warn!("No region has mobility data for {date}; publishing no-data assessment");
        }

        let published = match self.sink.publish(&snapshot).await {
            Ok(()) => {
                log::info!(
                    "Updated {} zones ({mode}, {date}) - risk: {}",
                    snapshot.zones.len(),
                    snapshot.risk.level
                );
                true
            }
            Err(e) => {
                log::error!("Failed to publish snapshot for {mode} ({date}): {e}");
                false
            }
        };

        CycleReport {
            mode,
            date,
            zones_published: snapshot.zones.len(),
            regions_skipped: skipped,
            risk_level: snapshot.risk.level,
            published,
        }
    }

    /// Runs cycles back to back with a pause in between.
    ///
    /// With `max_cycles` of `None` this never returns. Otherwise it stops
    /// after that many cycles, without pausing after the last one.
    pub async fn run(&mut self, max_cycles: Option<u64>) -> RunSummary {
        log::info!(
            "Simulation running over {} regions every {:?}",
            self.catalog.len(),
            self.interval
        );

        let mut summary = RunSummary::default();
        loop {
            let report = self.run_cycle().await;
            summary.cycles += 1;
            if !report.published {
                summary.failed_publishes += 1;
            }

            if max_cycles.is_some_and(|max| summary.cycles >= max) {
                return summary;
            }

            self.pacer.pause(self.interval).await;
        }
    }
}
