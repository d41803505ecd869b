#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

pub mod dispatcher;
mod error;
pub mod probe;
pub mod recorder;
pub mod report;
pub mod scenario;
pub mod scenarios;
pub mod suite;
mod target;

pub use authstress_core as core;
pub use error::TargetError;
pub use scenario::{Scenario, ScenarioVerdict};
pub use target::Target;

pub mod prelude {
    pub use crate::recorder::Recorder;
    pub use crate::scenario::{ConfigurableScenario, Scenario, ScenarioRunner, ScenarioVerdict};
    pub use crate::scenarios::{self, ScenarioKind};
    pub use crate::suite::{run_suite, SuiteConfig, SuiteReport};
    pub use crate::Target;

    pub use authstress_core::{
        AccountSpec, AggregateResult, ConfigError, PayloadBuilder, RequestOutcome, ScenarioConfig,
        Threshold,
    };
}
