use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Rejected configuration. Raised before the control loop starts; nothing in
/// the steady-state tick path returns this.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("tick interval must be positive and finite, got dt = {0}")]
    TickRate(f64),

    #[error("{name} must be non-negative, got {value}")]
    NegativeDamping { name: &'static str, value: f64 },

    #[error("max speed must be positive, got {0}")]
    MaxSpeed(f64),

    #[error("invalid parameter {name} = {value}")]
    InvalidParameter { name: &'static str, value: f64 },

    #[error("invalid endpoint '{0}'")]
    Endpoint(String),

    #[error("failed to access config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),
}

/// A remote command update that could not be used.
#[derive(Error, Debug)]
pub enum CommandError {
    #[error("malformed command: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("command {0} is not finite after conversion")]
    NonFinite(&'static str),
}

#[derive(Error, Debug)]
pub enum LinkError {
    #[error("socket error: {0}")]
    Io(#[from] io::Error),

    #[error(transparent)]
    Config(#[from] ConfigError),
}
