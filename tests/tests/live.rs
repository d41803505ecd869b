mod utils;
#[allow(unused)]
use utils::*;

// Run against a service on localhost:3001, e.g. `cargo run -p mock-service`.
#[cfg(feature = "integration")]
mod tests {
    use super::*;

    use authstress::prelude::*;
    use authstress::probe::probe;
    use authstress_core::DEFAULT_BASE_URL;

    #[tokio::test]
    async fn live_target_can_authenticate() {
        init();
        let target = Target::new(DEFAULT_BASE_URL).unwrap();

        let report = probe(&target).await;
        assert!(report.can_authenticate(), "{report}");
    }

    #[tokio::test]
    async fn live_suite() {
        init();
        let target = Target::new(DEFAULT_BASE_URL).unwrap();

        let report = run_suite(&target, &SuiteConfig::default()).await.unwrap();
        assert!(report.passed(), "{report}");
    }
}
