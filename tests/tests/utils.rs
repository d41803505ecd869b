use authstress::Target;
use mock_service::{MockConfig, MockService};
use std::sync::OnceLock;
use std::time::Duration;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[allow(unused)]
pub fn init() {
    static ONCE_LOCK: OnceLock<()> = OnceLock::new();

    ONCE_LOCK.get_or_init(|| {
        let _ = FmtSubscriber::builder()
            .with_env_filter(
                EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| EnvFilter::new("authstress=debug,mock_service=debug")),
            )
            .try_init();
    });
}

/// Spawn a mock service and a target pointing at its auth routes.
#[allow(unused)]
pub async fn mock(config: MockConfig) -> (MockService, Target) {
    let service = MockService::spawn(config).await.unwrap();
    let target = Target::new(&service.base_url()).unwrap();
    (service, target)
}

#[allow(unused)]
pub async fn mock_with_timeout(config: MockConfig, timeout: Duration) -> (MockService, Target) {
    let service = MockService::spawn(config).await.unwrap();
    let target = Target::with_timeout(&service.base_url(), timeout).unwrap();
    (service, target)
}
