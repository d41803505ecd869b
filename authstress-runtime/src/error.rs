use authstress::TargetError;
use authstress_core::ConfigError;
use metrics_exporter_prometheus::BuildError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error(transparent)]
    Target(#[from] TargetError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Failed to install the Prometheus exporter: {0}")]
    Metrics(#[from] BuildError),
}
