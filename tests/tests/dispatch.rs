mod utils;
#[allow(unused)]
use utils::*;

use authstress::dispatcher::dispatch;
use authstress::prelude::*;
use mock_service::MockConfig;
use serde_json::json;
use std::time::Duration;

#[tokio::test]
async fn every_slot_is_recorded_once() {
    init();
    let (service, target) = mock(MockConfig::default()).await;

    let mut config = scenarios::register();
    config.concurrent_groups = 4;
    config.requests_per_group = 3;

    let recorder = Recorder::new();
    let aggregate = dispatch(&target, &config, &recorder).await.unwrap();

    assert_eq!(aggregate.total_requests, 12);
    assert_eq!(aggregate.success_count, 12);
    assert_eq!(aggregate.success_rate_percent, 100.);
    assert_eq!(service.request_count(), 12);
    assert_eq!(service.user_count(), 12);

    let indices: Vec<_> = recorder
        .outcomes()
        .iter()
        .map(|outcome| outcome.sequence_index)
        .collect();
    assert_eq!(indices, (0..12).collect::<Vec<_>>());
    assert_eq!(recorder.snapshot(), aggregate);
}

#[tokio::test]
async fn rejections_keep_their_status() {
    init();
    let (_service, target) = mock(MockConfig::default()).await;

    let mut config = scenarios::login_malformed();
    config.concurrent_groups = 2;
    config.requests_per_group = 2;

    let aggregate = dispatch(&target, &config, &Recorder::new()).await.unwrap();

    assert_eq!(aggregate.total_requests, 4);
    assert_eq!(aggregate.error_count, 4);
    assert_eq!(aggregate.success_rate_percent, 0.);
    assert_eq!(aggregate.error_samples.len(), 3);
    for sample in &aggregate.error_samples {
        assert_eq!(sample.status_code, Some(400));
        assert_eq!(sample.message, "Request failed with status code 400");
    }
}

#[tokio::test]
async fn timeouts_become_transport_failures() {
    init();
    let config = MockConfig {
        delay: Duration::from_millis(500),
        ..Default::default()
    };
    let (_service, target) = mock_with_timeout(config, Duration::from_millis(50)).await;

    let mut config = scenarios::login_malformed();
    config.concurrent_groups = 2;
    config.requests_per_group = 1;

    let recorder = Recorder::new();
    let aggregate = dispatch(&target, &config, &recorder).await.unwrap();

    assert_eq!(aggregate.total_requests, 2);
    assert_eq!(aggregate.error_count, 2);
    for outcome in recorder.outcomes() {
        assert_eq!(outcome.status_code, None);
        assert!(outcome
            .error_message
            .as_deref()
            .is_some_and(|message| message.starts_with("timeout")));
    }
}

fn slow_service() -> MockConfig {
    MockConfig {
        delay: Duration::from_millis(300),
        ..Default::default()
    }
}

#[tokio::test]
async fn slots_are_in_flight_together() {
    init();
    let (service, target) = mock(slow_service()).await;

    let mut config = scenarios::login_malformed();
    config.concurrent_groups = 4;
    config.requests_per_group = 5;

    let aggregate = dispatch(&target, &config, &Recorder::new()).await.unwrap();

    assert_eq!(aggregate.total_requests, 20);
    assert_eq!(service.request_count(), 20);
    // One at a time would take 20 x 300ms.
    assert!(aggregate.total_elapsed >= Duration::from_millis(300));
    assert!(
        aggregate.total_elapsed < Duration::from_millis(1_500),
        "took {:?}",
        aggregate.total_elapsed
    );
}

#[tokio::test]
async fn delay_paces_issuing_only() {
    init();
    let (_service, target) = mock(slow_service()).await;

    let mut config = scenarios::login_malformed();
    config.concurrent_groups = 4;
    config.requests_per_group = 5;
    config.inter_request_delay = Duration::from_millis(10);

    let aggregate = dispatch(&target, &config, &Recorder::new()).await.unwrap();

    assert_eq!(aggregate.total_requests, 20);
    // The last slot is issued 19 ticks in and still takes the full service delay.
    assert!(aggregate.total_elapsed >= Duration::from_millis(490));
    // Waiting for each response before the next tick would take 20 x 310ms.
    assert!(
        aggregate.total_elapsed < Duration::from_millis(2_000),
        "took {:?}",
        aggregate.total_elapsed
    );
}

#[tokio::test]
async fn payload_failure_sends_nothing() {
    init();
    let (service, target) = mock(MockConfig::default()).await;

    let payload = PayloadBuilder::new(|index| {
        if index == 3 {
            Err("no body for slot 3".to_string())
        } else {
            Ok(json!({ "email": format!("u{index}@test.com"), "password": "TestPass123!" }))
        }
    });
    let mut config = ScenarioConfig::new("broken", "/login", payload);
    config.concurrent_groups = 2;
    config.requests_per_group = 2;

    let res = dispatch(&target, &config, &Recorder::new()).await;

    assert_eq!(
        res,
        Err(ConfigError::Payload {
            name: "broken".to_string(),
            index: 3,
            reason: "no body for slot 3".to_string(),
        })
    );
    assert_eq!(service.request_count(), 0);
}
