use crate::{
    ConfigError, DEFAULT_CONCURRENT_GROUPS, DEFAULT_REQUESTS_PER_GROUP,
    DEFAULT_SUCCESS_RATE_FLOOR, DEFAULT_WALL_CLOCK_CEILING,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Duration;

type PayloadFn = dyn Fn(usize) -> Result<Value, String> + Send + Sync;

/// Builds the JSON request body of a request slot from its sequence index.
///
/// Builders for endpoints with uniqueness constraints (registration) must embed the index, and
/// something run-specific such as a timestamp, into the unique field.
#[derive(Clone)]
pub struct PayloadBuilder(Arc<PayloadFn>);

impl PayloadBuilder {
    pub fn new<F>(func: F) -> Self
    where
        F: Fn(usize) -> Result<Value, String> + Send + Sync + 'static,
    {
        Self(Arc::new(func))
    }

    /// A builder producing the same body for every slot.
    pub fn fixed(body: Value) -> Self {
        Self::new(move |_| Ok(body.clone()))
    }

    /// Body of slot `index`. A builder that panics is reported as an error, like one returning
    /// `Err`.
    pub fn build(&self, index: usize) -> Result<Value, String> {
        panic::catch_unwind(AssertUnwindSafe(|| (self.0)(index))).unwrap_or_else(|panic| {
            Err(format!(
                "payload builder panicked: {}",
                panic_message(&*panic)
            ))
        })
    }
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> &str {
    if let Some(message) = panic.downcast_ref::<&str>() {
        message
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message
    } else {
        "unknown cause"
    }
}

impl fmt::Debug for PayloadBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("PayloadBuilder(..)")
    }
}

/// How the success rate of a scenario is judged.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Threshold {
    /// Success rate (percent) must be greater than or equal to the floor.
    AtLeast(f64),
    /// Every request must fail: zero successes and as many errors as requests.
    ExactlyZero,
}

impl fmt::Display for Threshold {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Threshold::AtLeast(floor) => write!(f, ">= {floor:.2}%"),
            Threshold::ExactlyZero => write!(f, "exactly 0%"),
        }
    }
}

/// Identity registered once before a scenario which needs an existing account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountSpec {
    pub email: String,
    pub password: String,
    #[serde(rename = "fullName")]
    pub full_name: String,
    pub roles: String,
}

impl AccountSpec {
    pub fn new(email: &str, password: &str, full_name: &str) -> Self {
        Self {
            email: email.to_string(),
            password: password.to_string(),
            full_name: full_name.to_string(),
            roles: "user".to_string(),
        }
    }
}

#[derive(Clone, Debug)]
pub struct ScenarioConfig {
    pub name: String,
    pub target_path: String,
    pub concurrent_groups: usize,
    pub requests_per_group: usize,
    pub inter_request_delay: Duration,
    pub threshold: Threshold,
    pub wall_clock_ceiling: Duration,
    pub payload: PayloadBuilder,
    /// Successful responses must carry a truthy `token` field.
    pub expect_token: bool,
    pub precondition: Option<AccountSpec>,
}

impl ScenarioConfig {
    pub fn new(name: &str, target_path: &str, payload: PayloadBuilder) -> Self {
        Self {
            name: name.to_string(),
            target_path: target_path.to_string(),
            concurrent_groups: DEFAULT_CONCURRENT_GROUPS,
            requests_per_group: DEFAULT_REQUESTS_PER_GROUP,
            inter_request_delay: Duration::ZERO,
            threshold: Threshold::AtLeast(DEFAULT_SUCCESS_RATE_FLOOR),
            wall_clock_ceiling: DEFAULT_WALL_CLOCK_CEILING,
            payload,
            expect_token: false,
            precondition: None,
        }
    }

    /// Number of request slots, `concurrent_groups * requests_per_group`.
    ///
    /// Saturates instead of overflowing; [`ScenarioConfig::validate`] rejects such configs.
    pub fn total_requests(&self) -> usize {
        self.concurrent_groups
            .saturating_mul(self.requests_per_group)
    }

    pub fn slot_index(&self, group: usize, request: usize) -> usize {
        group * self.requests_per_group + request
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.concurrent_groups == 0 {
            return Err(ConfigError::NoGroups(self.name.clone()));
        }

        if self.requests_per_group == 0 {
            return Err(ConfigError::NoRequests(self.name.clone()));
        }

        if self
            .concurrent_groups
            .checked_mul(self.requests_per_group)
            .is_none()
        {
            return Err(ConfigError::TooManySlots {
                name: self.name.clone(),
                groups: self.concurrent_groups,
                per_group: self.requests_per_group,
            });
        }

        if let Threshold::AtLeast(floor) = self.threshold {
            if !(0. ..=100.).contains(&floor) {
                return Err(ConfigError::InvalidFloor {
                    name: self.name.clone(),
                    floor,
                });
            }
        }

        if self.wall_clock_ceiling.is_zero() {
            return Err(ConfigError::NoCeiling(self.name.clone()));
        }

        Ok(())
    }
}
