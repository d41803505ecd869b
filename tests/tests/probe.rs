mod utils;
#[allow(unused)]
use utils::*;

use authstress::probe::{probe, ProbeStatus};
use mock_service::MockConfig;

#[tokio::test]
async fn probe_healthy_service() {
    init();
    let (service, target) = mock(MockConfig::default()).await;

    let report = probe(&target).await;

    let names: Vec<_> = report.steps.iter().map(|step| step.name).collect();
    assert_eq!(names, vec!["service root", "base url", "register", "login"]);
    assert_eq!(report.steps[0].status, ProbeStatus::Responded(200));
    // The mock only routes below the base URL.
    assert_eq!(report.steps[1].status, ProbeStatus::Responded(404));
    assert!(report.steps[2].succeeded());
    assert_eq!(report.steps[3].has_token, Some(true));
    assert!(report.reachable());
    assert!(report.can_authenticate());
    assert!(service.user("debug@test.com").is_some());
}

#[tokio::test]
async fn probe_without_token() {
    init();
    let config = MockConfig {
        omit_token: true,
        ..Default::default()
    };
    let (_service, target) = mock(config).await;

    let report = probe(&target).await;

    assert!(report.reachable());
    assert!(report.steps[3].succeeded());
    assert_eq!(report.steps[3].has_token, Some(false));
    assert!(!report.can_authenticate());
    assert!(report
        .to_string()
        .ends_with("Reachable: true, can authenticate: false"));
}
