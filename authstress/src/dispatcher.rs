//! Concurrent issuance of a scenario's request slots
mod pacer;

use crate::recorder::Recorder;
use crate::Target;
use authstress_core::{AggregateResult, ConfigError, RequestOutcome, ScenarioConfig};
use pacer::Pacer;
use reqwest::Client;
use serde_json::Value;
use std::time::{Duration, Instant};
use tokio::task::JoinHandle;
#[allow(unused_imports)]
use tracing::{debug, error, info, instrument, trace, warn, Instrument};

#[cfg(feature = "metrics")]
const SUCCESS_METRIC: &str = "authstress_requests_success";
#[cfg(feature = "metrics")]
const ERROR_METRIC: &str = "authstress_requests_error";
#[cfg(feature = "metrics")]
const LATENCY_METRIC: &str = "authstress_request_latency";

/// Issue every request slot of `config` concurrently, wait for all of them and return the
/// aggregate.
///
/// Per-request failures are recorded as outcomes. The only error is an invalid config, which is
/// reported before anything is sent.
pub async fn dispatch(
    target: &Target,
    config: &ScenarioConfig,
    recorder: &Recorder,
) -> Result<AggregateResult, ConfigError> {
    prepare(config)?.issue(target, recorder).await;
    Ok(recorder.snapshot())
}

/// Validate `config` and build the body of every slot.
pub fn prepare(config: &ScenarioConfig) -> Result<Batch, ConfigError> {
    config.validate()?;

    // Slots are laid out group-major, so issuing them in index order walks the groups one after
    // the other.
    let payloads = (0..config.concurrent_groups)
        .flat_map(|group| {
            (0..config.requests_per_group).map(move |request| config.slot_index(group, request))
        })
        .map(|index| {
            config
                .payload
                .build(index)
                .map_err(|reason| ConfigError::Payload {
                    name: config.name.clone(),
                    index,
                    reason,
                })
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Batch {
        name: config.name.clone(),
        target_path: config.target_path.clone(),
        delay: config.inter_request_delay,
        expect_token: config.expect_token,
        payloads,
    })
}

/// A validated scenario with every request body built, ready to be issued.
#[derive(Debug)]
pub struct Batch {
    name: String,
    target_path: String,
    delay: Duration,
    expect_token: bool,
    payloads: Vec<Value>,
}

impl Batch {
    /// Fan out one task per slot and join them all. Every slot ends up with exactly one outcome
    /// in `recorder`, including slots whose task panicked or was cancelled.
    #[instrument(name = "dispatch", skip_all, fields(name = %self.name, slots = self.payloads.len()))]
    pub async fn issue(self, target: &Target, recorder: &Recorder) {
        let url = target.endpoint(&self.target_path);
        let start = Instant::now();
        let mut pacer = Pacer::new(self.delay);
        let mut tasks = Vec::with_capacity(self.payloads.len());

        for (index, body) in self.payloads.into_iter().enumerate() {
            pacer.wait().await;

            let slot = Slot {
                index,
                client: target.client().clone(),
                url: url.clone(),
                body,
                expect_token: self.expect_token,
                #[cfg(feature = "metrics")]
                scenario: self.name.clone(),
            };
            let recorder = recorder.clone();
            let handle = tokio::spawn(
                async move {
                    let outcome = slot.send(start).await;
                    recorder.record(outcome);
                }
                .in_current_span(),
            );
            tasks.push((index, handle));
        }
        debug!("Issued {} requests in {:?}", tasks.len(), start.elapsed());

        join_slots(tasks, recorder, start).await;
        debug!("All requests completed in {:?}", start.elapsed());
    }
}

/// Wait for every slot task. A task that panicked or was cancelled never recorded its outcome,
/// so a transport failure is recorded in its place.
async fn join_slots(tasks: Vec<(usize, JoinHandle<()>)>, recorder: &Recorder, start: Instant) {
    for (index, handle) in tasks {
        if let Err(err) = handle.await {
            warn!("Request task of slot {index} did not complete: {err}");
            recorder.record(RequestOutcome::transport_failure(
                index,
                format!("request task did not complete: {err}"),
                start.elapsed(),
                Duration::ZERO,
            ));
        }
    }
}

struct Slot {
    index: usize,
    client: Client,
    url: String,
    body: Value,
    expect_token: bool,
    #[cfg(feature = "metrics")]
    scenario: String,
}

impl Slot {
    async fn send(self, batch_start: Instant) -> RequestOutcome {
        let sent = Instant::now();
        let res = self.client.post(&self.url).json(&self.body).send().await;

        let outcome = match res {
            Ok(response) if response.status().is_success() => {
                let status = response.status().as_u16();
                if self.expect_token {
                    let has_token = match response.json::<Value>().await {
                        Ok(body) => has_token(&body),
                        Err(err) => {
                            debug!("Slot {} returned an unreadable body: {err}", self.index);
                            false
                        }
                    };
                    RequestOutcome::success(
                        self.index,
                        status,
                        batch_start.elapsed(),
                        sent.elapsed(),
                    )
                    .with_token(has_token)
                } else {
                    RequestOutcome::success(
                        self.index,
                        status,
                        batch_start.elapsed(),
                        sent.elapsed(),
                    )
                }
            }
            Ok(response) => {
                let status = response.status().as_u16();
                trace!("Slot {} failed with status {status}", self.index);
                RequestOutcome::application_failure(
                    self.index,
                    status,
                    format!("Request failed with status code {status}"),
                    batch_start.elapsed(),
                    sent.elapsed(),
                )
            }
            Err(err) => {
                trace!("Slot {} failed in transport: {err}", self.index);
                RequestOutcome::transport_failure(
                    self.index,
                    describe_transport_error(&err),
                    batch_start.elapsed(),
                    sent.elapsed(),
                )
            }
        };

        #[cfg(feature = "metrics")]
        record_metrics(&self.scenario, &outcome);

        outcome
    }
}

fn describe_transport_error(err: &reqwest::Error) -> String {
    if err.is_timeout() {
        format!("timeout: {err}")
    } else if err.is_connect() {
        format!("connection failed: {err}")
    } else {
        err.to_string()
    }
}

/// Whether a response body carries a truthy `token` field.
pub(crate) fn has_token(body: &Value) -> bool {
    match body.get("token") {
        None | Some(Value::Null) => false,
        Some(Value::Bool(b)) => *b,
        Some(Value::Number(n)) => n.as_f64().is_some_and(|n| n != 0. && !n.is_nan()),
        Some(Value::String(s)) => !s.is_empty(),
        Some(Value::Array(_)) | Some(Value::Object(_)) => true,
    }
}

#[cfg(feature = "metrics")]
fn record_metrics(scenario: &str, outcome: &RequestOutcome) {
    let scenario = scenario.to_string();
    metrics::histogram!(LATENCY_METRIC, "scenario" => scenario.clone())
        .record(outcome.latency.as_secs_f64());

    if outcome.succeeded {
        metrics::counter!(SUCCESS_METRIC, "scenario" => scenario).increment(1);
    } else {
        metrics::counter!(ERROR_METRIC, "scenario" => scenario).increment(1);
    }
}
