//! Sequential runs of several scenarios against one target
use crate::scenario::{ScenarioRunner, ScenarioVerdict};
use crate::scenarios::ScenarioKind;
use crate::Target;
use authstress_core::{
    ConfigError, ScenarioConfig, Threshold, DEFAULT_CONCURRENT_GROUPS,
    DEFAULT_REQUESTS_PER_GROUP, DEFAULT_SCENARIO_PAUSE,
};
use std::collections::BTreeMap;
use std::time::Duration;
#[allow(unused_imports)]
use tracing::{debug, error, info, instrument, trace, warn};

#[derive(Debug, Clone, PartialEq)]
pub struct SuiteConfig {
    /// Scenarios to run, in order.
    pub scenarios: Vec<ScenarioKind>,
    pub concurrent_groups: usize,
    pub requests_per_group: usize,
    /// Pause between two consecutive scenarios.
    pub pause: Duration,
    /// Success rate floor overrides (percent).
    pub floors: BTreeMap<ScenarioKind, f64>,
    pub ceilings: BTreeMap<ScenarioKind, Duration>,
}

impl Default for SuiteConfig {
    fn default() -> Self {
        Self {
            scenarios: ScenarioKind::ALL.to_vec(),
            concurrent_groups: DEFAULT_CONCURRENT_GROUPS,
            requests_per_group: DEFAULT_REQUESTS_PER_GROUP,
            pause: DEFAULT_SCENARIO_PAUSE,
            floors: BTreeMap::new(),
            ceilings: BTreeMap::new(),
        }
    }
}

impl SuiteConfig {
    /// The fully configured scenario for `kind`, overrides applied.
    pub fn scenario_config(&self, kind: ScenarioKind) -> ScenarioConfig {
        let mut config = kind.config();
        config.concurrent_groups = self.concurrent_groups;
        config.requests_per_group = self.requests_per_group;

        if let Some(&floor) = self.floors.get(&kind) {
            match config.threshold {
                Threshold::AtLeast(_) => config.threshold = Threshold::AtLeast(floor),
                Threshold::ExactlyZero => {
                    warn!("Ignoring floor override for {kind}, it expects every request to fail.")
                }
            }
        }

        if let Some(&ceiling) = self.ceilings.get(&kind) {
            config.wall_clock_ceiling = ceiling;
        }

        config
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SuiteReport {
    pub verdicts: Vec<ScenarioVerdict>,
}

impl SuiteReport {
    pub fn passed(&self) -> bool {
        self.verdicts.iter().all(|verdict| verdict.passed)
    }

    pub fn failed(&self) -> impl Iterator<Item = &ScenarioVerdict> {
        self.verdicts.iter().filter(|verdict| !verdict.passed)
    }
}

/// Run the configured scenarios one after the other.
///
/// Every scenario is validated before the first one starts, so a bad override aborts the suite
/// without sending anything.
#[instrument(name = "suite", skip_all, fields(target = %target.base_url()))]
pub async fn run_suite(target: &Target, config: &SuiteConfig) -> Result<SuiteReport, ConfigError> {
    let configs: Vec<_> = config
        .scenarios
        .iter()
        .map(|kind| config.scenario_config(*kind))
        .collect();

    for scenario in &configs {
        scenario.validate()?;
    }

    let mut verdicts = Vec::with_capacity(configs.len());
    for (i, scenario) in configs.iter().enumerate() {
        if i > 0 && !config.pause.is_zero() {
            debug!("Pausing {:?} before {}", config.pause, scenario.name);
            tokio::time::sleep(config.pause).await;
        }

        let verdict = ScenarioRunner::new(target.clone()).run(scenario).await?;
        info!(
            "{}: {} ({:.2}% success)",
            verdict.name,
            if verdict.passed { "passed" } else { "failed" },
            verdict.aggregate.success_rate_percent
        );
        verdicts.push(verdict);
    }

    Ok(SuiteReport { verdicts })
}
