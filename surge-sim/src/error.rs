use surge_sim_core::ConfigError;
use thiserror::Error;

/// Errors that stop a run before any traffic is sent.
#[derive(Debug, Error)]
pub enum SimError {
    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("Unable to build HTTP client: {0}")]
    Client(#[from] reqwest::Error),
}
