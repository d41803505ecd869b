use pdatastructs::tdigest::{TDigest, K1};
use std::fmt;
use std::time::Duration;
use tracing::error;

const TDIGEST_BACKLOG_SIZE: usize = 100;
const ERROR_SAMPLE_COUNT: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutcomeKind {
    Success,
    /// Connection refused, DNS failure, timeout. No status code was received.
    TransportFailure,
    /// The target answered with a non-2xx status.
    ApplicationFailure(u16),
}

/// The result of one completed request attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestOutcome {
    pub succeeded: bool,
    pub status_code: Option<u16>,
    pub error_message: Option<String>,
    /// Time from the start of the batch until this request completed.
    pub elapsed: Duration,
    /// Round-trip time of this request alone.
    pub latency: Duration,
    pub sequence_index: usize,
    /// Only set on successful outcomes of token-bearing scenarios.
    pub has_token: Option<bool>,
}

impl RequestOutcome {
    pub fn success(sequence_index: usize, status: u16, elapsed: Duration, latency: Duration) -> Self {
        Self {
            succeeded: true,
            status_code: Some(status),
            error_message: None,
            elapsed,
            latency,
            sequence_index,
            has_token: None,
        }
    }

    pub fn application_failure(
        sequence_index: usize,
        status: u16,
        message: String,
        elapsed: Duration,
        latency: Duration,
    ) -> Self {
        Self {
            succeeded: false,
            status_code: Some(status),
            error_message: Some(message),
            elapsed,
            latency,
            sequence_index,
            has_token: None,
        }
    }

    pub fn transport_failure(
        sequence_index: usize,
        message: String,
        elapsed: Duration,
        latency: Duration,
    ) -> Self {
        Self {
            succeeded: false,
            status_code: None,
            error_message: Some(message),
            elapsed,
            latency,
            sequence_index,
            has_token: None,
        }
    }

    pub fn with_token(mut self, has_token: bool) -> Self {
        if self.succeeded {
            self.has_token = Some(has_token);
        }
        self
    }

    pub fn kind(&self) -> OutcomeKind {
        match (self.succeeded, self.status_code) {
            (true, _) => OutcomeKind::Success,
            (false, Some(status)) => OutcomeKind::ApplicationFailure(status),
            (false, None) => OutcomeKind::TransportFailure,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorSample {
    pub sequence_index: usize,
    pub status_code: Option<u16>,
    pub message: String,
}

/// Summary statistics over the outcomes of one scenario run.
#[derive(Debug, Clone, PartialEq)]
pub struct AggregateResult {
    pub success_count: u64,
    pub error_count: u64,
    pub total_requests: u64,
    /// Completion time of the last outcome, relative to the batch start.
    pub total_elapsed: Duration,
    pub success_rate_percent: f64,
    /// Successful outcomes flagged as lacking a token.
    pub missing_token_count: u64,
    pub latency_p50: Duration,
    pub latency_p90: Duration,
    pub latency_p99: Duration,
    /// The first failing outcomes, in sequence order.
    pub error_samples: Vec<ErrorSample>,
}

impl AggregateResult {
    pub fn from_outcomes<'a, I>(outcomes: I) -> Self
    where
        I: IntoIterator<Item = &'a RequestOutcome>,
    {
        let mut success_count = 0;
        let mut error_count = 0;
        let mut missing_token_count = 0;
        let mut total_elapsed = Duration::ZERO;
        let mut latencies = vec![];
        let mut errors = vec![];

        for outcome in outcomes {
            if outcome.succeeded {
                success_count += 1;
                if outcome.has_token == Some(false) {
                    missing_token_count += 1;
                }
            } else {
                error_count += 1;
                errors.push(ErrorSample {
                    sequence_index: outcome.sequence_index,
                    status_code: outcome.status_code,
                    message: outcome.error_message.clone().unwrap_or_default(),
                });
            }
            total_elapsed = total_elapsed.max(outcome.elapsed);
            latencies.push(outcome.latency);
        }

        errors.sort_by_key(|sample| sample.sequence_index);
        errors.truncate(ERROR_SAMPLE_COUNT);

        let total_requests = success_count + error_count;
        let success_rate_percent = if total_requests == 0 {
            0.
        } else {
            100. * success_count as f64 / total_requests as f64
        };

        // NOTE: Sorted so the digest does not depend on the order outcomes were recorded in.
        latencies.sort();
        let digest = latency_digest(&latencies);

        Self {
            success_count,
            error_count,
            total_requests,
            total_elapsed,
            success_rate_percent,
            missing_token_count,
            latency_p50: quantile(&digest, latencies.len(), 0.5),
            latency_p90: quantile(&digest, latencies.len(), 0.9),
            latency_p99: quantile(&digest, latencies.len(), 0.99),
            error_samples: errors,
        }
    }

    /// Wall-clock time divided by the number of requests.
    pub fn average_response(&self) -> Duration {
        if self.total_requests == 0 {
            Duration::ZERO
        } else {
            Duration::from_secs_f64(self.total_elapsed.as_secs_f64() / self.total_requests as f64)
        }
    }

    pub fn requests_per_second(&self) -> f64 {
        let secs = self.total_elapsed.as_secs_f64();
        if secs == 0. {
            0.
        } else {
            self.total_requests as f64 / secs
        }
    }
}

impl fmt::Display for AggregateResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Total requests: {}", self.total_requests)?;
        writeln!(f, "Successful: {}", self.success_count)?;
        writeln!(f, "Errors: {}", self.error_count)?;
        writeln!(f, "Total time: {}ms", self.total_elapsed.as_millis())?;
        writeln!(
            f,
            "Average response time: {:.2}ms",
            self.average_response().as_secs_f64() * 1e3
        )?;
        writeln!(f, "Requests per second: {:.2}", self.requests_per_second())?;
        writeln!(f, "Success rate: {:.2}%", self.success_rate_percent)?;
        write!(
            f,
            "Latency: p50={:?}, p90={:?}, p99={:?}",
            self.latency_p50, self.latency_p90, self.latency_p99
        )?;

        if !self.error_samples.is_empty() {
            write!(f, "\nError samples:")?;
            for (i, sample) in self.error_samples.iter().enumerate() {
                let status = match sample.status_code {
                    Some(status) => status.to_string(),
                    None => "ERROR".to_string(),
                };
                write!(
                    f,
                    "\n  {}. Status: {}, Error: {}",
                    i + 1,
                    status,
                    sample.message
                )?;
            }
        }

        Ok(())
    }
}

fn latency_digest(latencies: &[Duration]) -> TDigest<K1> {
    let mut digest = TDigest::new(K1::new(10.), TDIGEST_BACKLOG_SIZE);
    for latency in latencies {
        digest.insert(latency.as_secs_f64());
    }
    digest
}

fn quantile(digest: &TDigest<K1>, count: usize, quantile: f64) -> Duration {
    if count == 0 {
        return Duration::ZERO;
    }

    let secs = digest.quantile(quantile);
    if secs.is_finite() && secs >= 0. {
        Duration::from_secs_f64(secs)
    } else {
        error!("Non-finite latency quantile {quantile} over {count} samples.");
        Duration::ZERO
    }
}
