mod utils;
#[allow(unused)]
use utils::*;

use authstress::prelude::*;
use mock_service::MockConfig;
use std::time::Duration;

fn quick_suite() -> SuiteConfig {
    SuiteConfig {
        concurrent_groups: 3,
        requests_per_group: 2,
        pause: Duration::ZERO,
        ..Default::default()
    }
}

#[tokio::test]
async fn healthy_service_passes_every_scenario() {
    init();
    let (service, target) = mock(MockConfig::default()).await;

    let report = run_suite(&target, &quick_suite()).await.unwrap();

    let names: Vec<_> = report.verdicts.iter().map(|v| v.name.as_str()).collect();
    assert_eq!(
        names,
        vec![
            "register",
            "login",
            "login-invalid-credentials",
            "login-malformed"
        ]
    );
    assert!(report.passed(), "{report}");
    assert!(report
        .verdicts
        .iter()
        .all(|verdict| verdict.aggregate.total_requests == 6));
    // Four floods plus the login precondition.
    assert_eq!(service.request_count(), 25);
    assert!(report.to_string().ends_with("All 4 scenarios passed"));
}

#[tokio::test]
async fn failures_are_reported_per_scenario() {
    init();
    let config = MockConfig {
        omit_token: true,
        ..Default::default()
    };
    let (_service, target) = mock(config).await;

    let mut suite = quick_suite();
    suite.scenarios = vec![ScenarioKind::Register, ScenarioKind::Login];

    let report = run_suite(&target, &suite).await.unwrap();

    assert!(!report.passed());
    let failed: Vec<_> = report.failed().map(|v| v.name.as_str()).collect();
    assert_eq!(failed, vec!["login"]);
    assert!(report.to_string().ends_with("1 of 2 scenarios failed"));
}

#[tokio::test]
async fn pause_separates_scenarios() {
    init();
    let (_service, target) = mock(MockConfig::default()).await;

    let mut suite = quick_suite();
    suite.scenarios = vec![ScenarioKind::LoginMalformed, ScenarioKind::LoginMalformed];
    suite.pause = Duration::from_millis(200);

    let start = std::time::Instant::now();
    let report = run_suite(&target, &suite).await.unwrap();

    assert!(report.passed());
    assert!(start.elapsed() >= Duration::from_millis(200));
}
