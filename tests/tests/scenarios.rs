mod utils;
#[allow(unused)]
use utils::*;

use authstress::prelude::*;
use mock_service::MockConfig;
use std::time::Duration;
use tracing_test::traced_test;

fn flaky(success_percent: u32) -> MockConfig {
    MockConfig {
        success_percent,
        ..Default::default()
    }
}

#[tokio::test]
async fn register_passes_above_floor() {
    let (service, target) = mock(flaky(70)).await;

    let verdict = Scenario::new(target, scenarios::register()).await.unwrap();

    assert_eq!(verdict.aggregate.total_requests, 50);
    assert_eq!(verdict.aggregate.success_count, 35);
    assert_eq!(verdict.aggregate.success_rate_percent, 70.);
    assert!(verdict.passed, "{verdict}");
    assert_eq!(service.user_count(), 35);
}

#[tokio::test]
async fn register_fails_below_floor() {
    let (_service, target) = mock(flaky(70)).await;

    let verdict = Scenario::new(target, scenarios::register())
        .at_least(80.)
        .await
        .unwrap();

    assert_eq!(verdict.aggregate.success_rate_percent, 70.);
    assert!(!verdict.passed);
    assert!(verdict.reasons[0].contains("below the floor"));
    assert_eq!(verdict.aggregate.error_samples.len(), 3);
    assert!(verdict
        .aggregate
        .error_samples
        .iter()
        .all(|sample| sample.status_code == Some(503)));
}

#[tokio::test]
#[traced_test]
async fn login_registers_its_account_first() {
    let (service, target) = mock(MockConfig::default()).await;

    let verdict = Scenario::new(target, scenarios::login()).await.unwrap();

    assert!(verdict.passed, "{verdict}");
    assert_eq!(verdict.aggregate.success_rate_percent, 100.);
    assert_eq!(verdict.aggregate.missing_token_count, 0);
    assert!(service.user(scenarios::LOGIN_ACCOUNT_EMAIL).is_some());
    // One registration plus the login flood.
    assert_eq!(service.request_count(), 51);
    assert!(logs_contain("Registered precondition account"));
}

#[tokio::test]
async fn login_tolerates_existing_account() {
    let (service, target) = mock(MockConfig::default()).await;

    let first = Scenario::new(target.clone(), scenarios::login()).await.unwrap();
    let second = Scenario::new(target, scenarios::login()).await.unwrap();

    assert!(first.passed);
    assert!(second.passed, "{second}");
    assert_eq!(service.user_count(), 1);
}

#[tokio::test]
async fn login_without_token_fails() {
    let config = MockConfig {
        omit_token: true,
        ..Default::default()
    };
    let (_service, target) = mock(config).await;

    let verdict = Scenario::new(target, scenarios::login()).await.unwrap();

    assert_eq!(verdict.aggregate.success_rate_percent, 100.);
    assert_eq!(verdict.aggregate.missing_token_count, 50);
    assert!(!verdict.passed);
    assert!(verdict
        .reasons
        .iter()
        .any(|reason| reason.contains("carried no token")));
}

#[tokio::test]
async fn invalid_credentials_are_always_rejected() {
    let (_service, target) = mock(MockConfig::default()).await;

    let verdict = Scenario::new(target, scenarios::login_invalid_credentials())
        .await
        .unwrap();

    assert!(verdict.passed, "{verdict}");
    assert_eq!(verdict.aggregate.success_count, 0);
    assert_eq!(verdict.aggregate.error_count, 50);
    assert_eq!(verdict.aggregate.error_samples[0].status_code, Some(401));
}

#[tokio::test]
async fn malformed_logins_are_always_rejected() {
    let (_service, target) = mock(MockConfig::default()).await;

    let verdict = Scenario::new(target, scenarios::login_malformed())
        .groups(5)
        .requests_per_group(2)
        .await
        .unwrap();

    assert!(verdict.passed, "{verdict}");
    assert_eq!(verdict.aggregate.total_requests, 10);
    assert_eq!(verdict.aggregate.error_samples[0].status_code, Some(400));
}

#[tokio::test]
async fn exactly_zero_fails_on_a_single_success() {
    let (_service, target) = mock(MockConfig::default()).await;

    // Valid registrations succeed, which an all-failures scenario must reject.
    let verdict = Scenario::new(target, scenarios::register())
        .groups(2)
        .requests_per_group(2)
        .exactly_zero()
        .await
        .unwrap();

    assert!(!verdict.passed);
    assert_eq!(verdict.aggregate.success_count, 4);
}

#[tokio::test]
async fn exceeding_the_ceiling_fails() {
    let config = MockConfig {
        delay: Duration::from_millis(150),
        ..Default::default()
    };
    let (_service, target) = mock(config).await;

    let verdict = Scenario::new(target, scenarios::login_malformed())
        .groups(2)
        .requests_per_group(1)
        .ceiling(Duration::from_millis(50))
        .await
        .unwrap();

    // Every request was rejected as expected, but too slowly.
    assert_eq!(verdict.aggregate.success_count, 0);
    assert!(verdict.aggregate.total_elapsed >= Duration::from_millis(150));
    assert!(!verdict.passed);
    assert!(verdict
        .reasons
        .iter()
        .any(|reason| reason.contains("exceeding the ceiling")));
}

#[tokio::test]
async fn unreachable_target_fails_floor_scenarios() {
    let addr = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap()
    };
    let target = Target::new(&format!("http://{addr}/auth")).unwrap();

    let verdict = Scenario::new(target, scenarios::register())
        .groups(2)
        .requests_per_group(2)
        .await
        .unwrap();

    assert!(!verdict.passed);
    assert_eq!(verdict.aggregate.error_count, 4);
    assert!(verdict
        .aggregate
        .error_samples
        .iter()
        .all(|sample| sample.status_code.is_none()));
}
