use thiserror::Error;

/// Startup configuration errors. These are raised before any phase runs.
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("Invalid point `{0}`, expected `lat,lng`")]
    InvalidPoint(String),

    #[error("At least one point is required")]
    NoPoints,

    #[error("At least one driver is required")]
    NoDrivers,

    #[error("Drop ratio must be within [0, 1], got {0}")]
    InvalidDropRatio(f64),

    #[error("Invalid duration for `{name}`: {value}")]
    InvalidDuration { name: &'static str, value: f64 },
}
