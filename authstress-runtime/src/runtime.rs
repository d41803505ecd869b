//! Default authstress runtime
//!
//! Runs the scenario suite (or the connectivity probe) against one target and prints the
//! reports to stdout.
use crate::cli::{Cli, Command};
use crate::error::RuntimeError;
use authstress::probe::probe;
use authstress::suite::{run_suite, SuiteConfig};
use authstress::Target;
use authstress_core::{DEFAULT_BASE_URL, DEFAULT_REQUEST_TIMEOUT};
use clap::Parser;
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use std::time::Duration;
#[allow(unused)]
use tracing::{debug, error, info, instrument, warn};

/// # Example
///
/// ```ignore
/// use authstress_runtime::AuthstressRuntime;
///
/// #[tokio::main]
/// async fn main() -> anyhow::Result<()> {
///     let passed = AuthstressRuntime::new()
///         .with_args()
///         .run()
///         .await?;
///     assert!(passed);
///     Ok(())
/// }
/// ```
#[derive(Debug, Clone)]
pub struct AuthstressRuntime {
    base_url: String,
    timeout: Duration,
    suite: SuiteConfig,
    metrics_addr: Option<SocketAddr>,
    probe_only: bool,
}

impl Default for AuthstressRuntime {
    fn default() -> Self {
        Self::new()
    }
}

impl AuthstressRuntime {
    pub fn new() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: DEFAULT_REQUEST_TIMEOUT,
            suite: SuiteConfig::default(),
            metrics_addr: None,
            probe_only: false,
        }
    }

    /// Apply the command line arguments (and their `AUTHSTRESS_*` environment fallbacks).
    ///
    /// # Example
    /// ```ignore
    /// $ authstress --groups 20 --scenario register --floor register=75
    /// $ AUTHSTRESS_BASE_URL=http://staging:3001/auth authstress probe
    /// ```
    pub fn with_args(self) -> Self {
        self.with_cli(Cli::parse())
    }

    fn with_cli(mut self, cli: Cli) -> Self {
        self.base_url = cli.base_url;
        self.timeout = cli.timeout;
        self.metrics_addr = cli.metrics_addr;
        self.probe_only = cli.command == Some(Command::Probe);

        self.suite.concurrent_groups = cli.groups;
        self.suite.requests_per_group = cli.requests;
        self.suite.pause = cli.pause;
        if !cli.scenarios.is_empty() {
            self.suite.scenarios = cli.scenarios;
        }
        self.suite.floors.extend(cli.floors);
        self.suite.ceilings.extend(cli.ceilings);
        self
    }

    pub fn base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.to_string();
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn suite(mut self, suite: SuiteConfig) -> Self {
        self.suite = suite;
        self
    }

    pub fn metrics_addr(mut self, addr: SocketAddr) -> Self {
        self.metrics_addr = Some(addr);
        self
    }

    pub fn probe_only(mut self) -> Self {
        self.probe_only = true;
        self
    }

    /// Returns whether every scenario passed, or for a probe, whether the target could
    /// authenticate.
    #[instrument(name = "authstress", skip_all, fields(target = %self.base_url))]
    pub async fn run(self) -> Result<bool, RuntimeError> {
        if let Some(addr) = self.metrics_addr {
            PrometheusBuilder::new()
                .with_http_listener(addr)
                .install()?;
            info!("Serving metrics on {addr}");
        }

        let target = Target::with_timeout(&self.base_url, self.timeout)?;

        if self.probe_only {
            let report = probe(&target).await;
            println!("{report}");
            return Ok(report.can_authenticate());
        }

        info!(
            "Running {} scenario(s) with {} groups of {} requests",
            self.suite.scenarios.len(),
            self.suite.concurrent_groups,
            self.suite.requests_per_group
        );
        let report = run_suite(&target, &self.suite).await?;
        println!("{report}");

        if !report.passed() {
            for verdict in report.failed() {
                error!("Scenario {} failed", verdict.name);
            }
        }
        Ok(report.passed())
    }
}
