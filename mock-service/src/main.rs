use clap::Parser;
use mock_service::MockConfig;
use std::net::SocketAddr;
use std::num::NonZeroU32;
use std::time::Duration;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

/// In-memory auth service to point the harness at.
#[derive(Parser, Debug)]
#[command(name = "mock-service", version)]
struct MockCli {
    #[arg(long, env = "MOCK_ADDR", default_value = "0.0.0.0:3001")]
    addr: SocketAddr,

    /// Percentage of register/login requests handled normally; the rest get 503.
    #[arg(long, env = "MOCK_SUCCESS_PERCENT", default_value_t = 100)]
    success_percent: u32,

    /// Added to every register/login request, e.g. `50ms`.
    #[arg(long, env = "MOCK_DELAY", default_value = "0s", value_parser = humantime::parse_duration)]
    delay: Duration,

    /// Requests above this rate get 429.
    #[arg(long, env = "MOCK_MAX_TPS")]
    max_tps: Option<NonZeroU32>,

    /// Answer successful logins without a token.
    #[arg(long, env = "MOCK_OMIT_TOKEN")]
    omit_token: bool,
}

impl MockCli {
    fn config(&self) -> MockConfig {
        MockConfig {
            delay: self.delay,
            success_percent: self.success_percent,
            omit_token: self.omit_token,
            max_tps: self.max_tps,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("mock_service=debug,tower_http=info")),
        )
        .init();

    let cli = MockCli::parse();
    let config = cli.config();
    tracing::info!("Mock auth service listening on {} with {config:?}", cli.addr);
    mock_service::run(cli.addr, config).await
}
