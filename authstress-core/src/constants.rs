use std::time::Duration;

/// Base URL of the authentication service when none is configured.
pub const DEFAULT_BASE_URL: &str = "http://localhost:3001/auth";

pub const DEFAULT_CONCURRENT_GROUPS: usize = 10;
pub const DEFAULT_REQUESTS_PER_GROUP: usize = 5;

/// Per-request timeout. A hung request becomes a recorded failure after this long.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// The default floor used by scenarios that expect requests to succeed.
pub const DEFAULT_SUCCESS_RATE_FLOOR: f64 = 80.;

pub const DEFAULT_WALL_CLOCK_CEILING: Duration = Duration::from_secs(60);

/// Pause between two scenarios of a suite.
pub const DEFAULT_SCENARIO_PAUSE: Duration = Duration::from_secs(2);
