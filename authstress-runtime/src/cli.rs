use authstress::scenarios::ScenarioKind;
use authstress_core::{DEFAULT_BASE_URL, DEFAULT_CONCURRENT_GROUPS, DEFAULT_REQUESTS_PER_GROUP};
use clap::{Parser, Subcommand};
use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(
    name = "authstress",
    version,
    about = "Floods an authentication service with concurrent register and login requests."
)]
pub(crate) struct Cli {
    /// Base URL of the auth routes.
    #[arg(long, env = "AUTHSTRESS_BASE_URL", default_value = DEFAULT_BASE_URL)]
    pub base_url: String,

    /// Number of concurrent groups per scenario.
    #[arg(short, long, env = "AUTHSTRESS_GROUPS", default_value_t = DEFAULT_CONCURRENT_GROUPS)]
    pub groups: usize,

    /// Requests issued sequentially by each group.
    #[arg(short, long, env = "AUTHSTRESS_REQUESTS", default_value_t = DEFAULT_REQUESTS_PER_GROUP)]
    pub requests: usize,

    /// Per-request timeout, e.g. `10s` or `500ms`.
    #[arg(long, env = "AUTHSTRESS_TIMEOUT", default_value = "10s", value_parser = humantime::parse_duration)]
    pub timeout: Duration,

    /// Pause between two scenarios.
    #[arg(long, default_value = "2s", value_parser = humantime::parse_duration)]
    pub pause: Duration,

    /// Scenario to run. May be repeated; all scenarios run when omitted.
    #[arg(short, long = "scenario")]
    pub scenarios: Vec<ScenarioKind>,

    /// Success rate floor override, e.g. `register=75`.
    #[arg(long = "floor", value_parser = parse_floor)]
    pub floors: Vec<(ScenarioKind, f64)>,

    /// Wall-clock ceiling override, e.g. `login=20s`.
    #[arg(long = "ceiling", value_parser = parse_ceiling)]
    pub ceilings: Vec<(ScenarioKind, Duration)>,

    /// Serve Prometheus metrics on this address while running.
    #[arg(long, env = "AUTHSTRESS_METRICS_ADDR")]
    pub metrics_addr: Option<SocketAddr>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Command {
    /// Check connectivity and authentication against the target instead of load testing it.
    Probe,
}

fn parse_override<T>(s: &str) -> Result<(ScenarioKind, T), String>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    let (name, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected `<scenario>=<value>`, got `{s}`"))?;
    let kind = name.trim().parse::<ScenarioKind>()?;
    let value = value
        .trim()
        .parse::<T>()
        .map_err(|err| format!("invalid value for {kind}: {err}"))?;
    Ok((kind, value))
}

fn parse_floor(s: &str) -> Result<(ScenarioKind, f64), String> {
    parse_override(s)
}

fn parse_ceiling(s: &str) -> Result<(ScenarioKind, Duration), String> {
    parse_override::<humantime::Duration>(s).map(|(kind, ceiling)| (kind, ceiling.into()))
}
