use authstress_core::ConfigError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TargetError {
    #[error("Invalid target URL: {0}")]
    Url(#[from] url::ParseError),

    #[error("Unsupported URL scheme `{0}`, expected http or https")]
    Scheme(String),

    #[error("Failed to build the HTTP client: {0}")]
    Client(#[from] reqwest::Error),
}

impl From<TargetError> for ConfigError {
    fn from(err: TargetError) -> Self {
        ConfigError::Target(err.to_string())
    }
}
