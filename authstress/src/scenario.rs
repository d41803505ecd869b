//! Scenario runner and verdicts
use crate::dispatcher;
use crate::recorder::Recorder;
use crate::Target;
use authstress_core::{
    AccountSpec, AggregateResult, ConfigError, ScenarioConfig, Threshold,
};
use std::{
    future::Future,
    pin::Pin,
    task::{Context, Poll},
    time::Duration,
};
#[allow(unused_imports)]
use tracing::{debug, error, info, instrument, trace, warn, Instrument};

/// The judgment of one scenario run.
#[derive(Debug, Clone, PartialEq)]
pub struct ScenarioVerdict {
    pub name: String,
    pub threshold: Threshold,
    pub aggregate: AggregateResult,
    pub passed: bool,
    /// One line per check, in evaluation order, stating whether it was met.
    pub reasons: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    NotStarted,
    Dispatching,
    Aggregating,
    Evaluated { passed: bool },
}

/// Runs a single scenario against a target.
///
/// A runner is single-use: it walks `NotStarted -> Dispatching -> Aggregating -> Evaluated` once
/// and refuses to run again.
pub struct ScenarioRunner {
    target: Target,
    state: RunState,
}

impl ScenarioRunner {
    pub fn new(target: Target) -> Self {
        Self {
            target,
            state: RunState::NotStarted,
        }
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    #[instrument(name = "scenario", skip_all, fields(name = %config.name))]
    pub async fn run(&mut self, config: &ScenarioConfig) -> Result<ScenarioVerdict, ConfigError> {
        if self.state != RunState::NotStarted {
            return Err(ConfigError::AlreadyRun(config.name.clone()));
        }

        info!("Running {} with config {:?}", config.name, config);
        let batch = dispatcher::prepare(config)?;

        if let Some(account) = &config.precondition {
            ensure_account(&self.target, account).await;
        }

        let recorder = Recorder::new();
        self.transition(RunState::Dispatching);
        batch.issue(&self.target, &recorder).await;

        self.transition(RunState::Aggregating);
        let aggregate = recorder.snapshot();

        let (passed, reasons) = evaluate(config, &aggregate);
        self.transition(RunState::Evaluated { passed });

        info!("Scenario complete");
        Ok(ScenarioVerdict {
            name: config.name.clone(),
            threshold: config.threshold,
            aggregate,
            passed,
            reasons,
        })
    }

    fn transition(&mut self, next: RunState) {
        debug!("{:?} -> {:?}", self.state, next);
        self.state = next;
    }
}

/// Register the fixed identity a scenario depends on.
///
/// Any failure is swallowed: an "already exists" rejection means the account is present, and
/// anything else surfaces as failures of the scenario itself.
async fn ensure_account(target: &Target, account: &AccountSpec) {
    let url = target.endpoint("/register");
    match target.client().post(&url).json(account).send().await {
        Ok(response) if response.status().is_success() => {
            debug!("Registered precondition account {}", account.email);
        }
        Ok(response) if response.status().is_client_error() => {
            debug!(
                "Precondition account {} not created ({}), assuming it already exists",
                account.email,
                response.status()
            );
        }
        Ok(response) => {
            warn!(
                "Precondition account {} not created: status {}",
                account.email,
                response.status()
            );
        }
        Err(err) => {
            warn!("Precondition account {} not created: {err}", account.email);
        }
    }
}

/// Judge an aggregate against the thresholds of `config`.
pub fn evaluate(config: &ScenarioConfig, aggregate: &AggregateResult) -> (bool, Vec<String>) {
    let mut passed = true;
    let mut reasons = vec![];
    let rate = aggregate.success_rate_percent;

    match config.threshold {
        Threshold::AtLeast(floor) => {
            let met = rate >= floor;
            passed &= met;
            reasons.push(if met {
                format!("success rate {rate:.2}% meets the floor of {floor:.2}%")
            } else {
                format!("success rate {rate:.2}% is below the floor of {floor:.2}%")
            });
        }
        Threshold::ExactlyZero => {
            let met = aggregate.success_count == 0;
            passed &= met;
            reasons.push(if met {
                "success rate is 0% as expected".to_string()
            } else {
                format!(
                    "success rate {rate:.2}% ({} successful requests), expected 0%",
                    aggregate.success_count
                )
            });

            let met = aggregate.error_count == aggregate.total_requests;
            passed &= met;
            reasons.push(if met {
                format!("all {} requests failed as expected", aggregate.total_requests)
            } else {
                format!(
                    "{} of {} requests failed, expected all of them",
                    aggregate.error_count, aggregate.total_requests
                )
            });
        }
    }

    let expected = config.total_requests() as u64;
    if aggregate.total_requests != expected {
        passed = false;
        reasons.push(format!(
            "recorded {} outcomes for {expected} dispatched requests",
            aggregate.total_requests
        ));
    }

    let ceiling = config.wall_clock_ceiling;
    let met = aggregate.total_elapsed < ceiling;
    passed &= met;
    reasons.push(if met {
        format!(
            "finished in {}ms, under the ceiling of {}",
            aggregate.total_elapsed.as_millis(),
            humantime::format_duration(ceiling)
        )
    } else {
        format!(
            "took {}ms, exceeding the ceiling of {}",
            aggregate.total_elapsed.as_millis(),
            humantime::format_duration(ceiling)
        )
    });

    if config.expect_token {
        let met = aggregate.missing_token_count == 0;
        passed &= met;
        reasons.push(if met {
            "every successful response carried a token".to_string()
        } else {
            format!(
                "{} successful responses carried no token",
                aggregate.missing_token_count
            )
        });
    }

    (passed, reasons)
}

/// Load test scenario structure
///
/// Pairs a target with a [`ScenarioConfig`]. Configure it through [`ConfigurableScenario`] and
/// `.await` it to run.
#[pin_project::pin_project]
pub struct Scenario {
    target: Target,
    config: ScenarioConfig,
    runner_fut: Option<Pin<Box<dyn Future<Output = Result<ScenarioVerdict, ConfigError>> + Send>>>,
}

impl Scenario {
    pub fn new(target: Target, config: ScenarioConfig) -> Self {
        Self {
            target,
            config,
            runner_fut: None,
        }
    }

    pub fn config(&self) -> &ScenarioConfig {
        &self.config
    }
}

impl Future for Scenario {
    type Output = Result<ScenarioVerdict, ConfigError>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        if self.runner_fut.is_none() {
            let target = self.target.clone();
            let config = self.config.clone();
            self.runner_fut = Some(Box::pin(async move {
                ScenarioRunner::new(target).run(&config).await
            }));
        }

        if let Some(runner) = &mut self.runner_fut {
            runner.as_mut().poll(cx)
        } else {
            unreachable!()
        }
    }
}

pub trait ConfigurableScenario: Future<Output = Result<ScenarioVerdict, ConfigError>> + Sized + Send {
    fn groups(self, concurrent_groups: usize) -> Self;
    fn requests_per_group(self, requests_per_group: usize) -> Self;
    fn delay(self, delay: Duration) -> Self;
    fn at_least(self, floor_percent: f64) -> Self;
    fn exactly_zero(self) -> Self;
    fn ceiling(self, ceiling: Duration) -> Self;
    fn expect_token(self) -> Self;
    fn precondition(self, account: AccountSpec) -> Self;
}

impl ConfigurableScenario for Scenario {
    /// Number of concurrent groups. The scenario issues `groups * requests_per_group` requests.
    fn groups(mut self, concurrent_groups: usize) -> Self {
        self.config.concurrent_groups = concurrent_groups;
        self
    }

    fn requests_per_group(mut self, requests_per_group: usize) -> Self {
        self.config.requests_per_group = requests_per_group;
        self
    }

    /// Wait `delay` before issuing each successive request.
    ///
    /// # Example
    /// ```ignore
    /// use authstress::prelude::*;
    /// use std::time::Duration;
    ///
    /// #[tokio::main]
    /// async fn main() {
    ///     let target = Target::new("http://localhost:3001/auth").unwrap();
    ///     Scenario::new(target, scenarios::login())
    ///         .delay(Duration::from_millis(20))
    ///         .await
    ///         .unwrap();
    /// }
    /// ```
    fn delay(mut self, delay: Duration) -> Self {
        self.config.inter_request_delay = delay;
        self
    }

    /// Pass only if at least `floor_percent` percent of requests succeed.
    fn at_least(mut self, floor_percent: f64) -> Self {
        self.config.threshold = Threshold::AtLeast(floor_percent);
        self
    }

    /// Pass only if every request fails.
    ///
    /// # Example
    /// ```ignore
    /// use authstress::prelude::*;
    ///
    /// #[tokio::main]
    /// async fn main() {
    ///     let target = Target::new("http://localhost:3001/auth").unwrap();
    ///     let verdict = Scenario::new(target, scenarios::login_malformed())
    ///         .exactly_zero()
    ///         .await
    ///         .unwrap();
    ///     assert!(verdict.passed);
    /// }
    /// ```
    fn exactly_zero(mut self) -> Self {
        self.config.threshold = Threshold::ExactlyZero;
        self
    }

    fn ceiling(mut self, ceiling: Duration) -> Self {
        self.config.wall_clock_ceiling = ceiling;
        self
    }

    /// Require a truthy `token` field in every successful response.
    fn expect_token(mut self) -> Self {
        self.config.expect_token = true;
        self
    }

    /// Register `account` once before dispatching.
    fn precondition(mut self, account: AccountSpec) -> Self {
        self.config.precondition = Some(account);
        self
    }
}
