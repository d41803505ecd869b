use thiserror::Error;

/// Invalid scenario parameters.
///
/// This is the only error that aborts a run. It is always raised before the first request of the
/// scenario is issued, and is never recorded as a per-request outcome.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("Scenario `{0}` needs at least one concurrent group")]
    NoGroups(String),

    #[error("Scenario `{0}` needs at least one request per group")]
    NoRequests(String),

    #[error("Scenario `{name}` declares {groups}x{per_group} request slots, which overflows")]
    TooManySlots {
        name: String,
        groups: usize,
        per_group: usize,
    },

    #[error("Scenario `{name}` has a success rate floor of {floor}%, expected a value in [0, 100]")]
    InvalidFloor { name: String, floor: f64 },

    #[error("Scenario `{0}` needs a non-zero wall-clock ceiling")]
    NoCeiling(String),

    #[error("Payload builder of scenario `{name}` failed for slot {index}: {reason}")]
    Payload {
        name: String,
        index: usize,
        reason: String,
    },

    #[error("Invalid target: {0}")]
    Target(String),

    #[error("Scenario `{0}` was already run; runners are single-use")]
    AlreadyRun(String),
}
