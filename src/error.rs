//! Error types for SonarPilot

use crate::core::types::{MotorId, SensorId};

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// SonarPilot error types
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration could not be parsed or is inconsistent
    #[error("Configuration error: {0}")]
    Config(String),

    /// Unknown device type in configuration
    #[error("Unknown device type: {0}")]
    UnknownDevice(String),

    /// Range sensor failed to produce a ping
    #[error("Sensor fault on {sensor}: {reason}")]
    SensorFault {
        /// Sensor that failed
        sensor: SensorId,
        /// Collaborator-supplied reason
        reason: String,
    },

    /// Motor driver rejected a command
    #[error("Motor fault on {motor}: {reason}")]
    MotorFault {
        /// Motor that failed
        motor: MotorId,
        /// Collaborator-supplied reason
        reason: String,
    },

    /// Status display write failed
    #[error("Display fault: {0}")]
    DisplayFault(String),

    /// Generic error with message
    #[error("{0}")]
    Other(String),
}

impl From<toml::de::Error> for Error {
    fn from(e: toml::de::Error) -> Self {
        Error::Config(e.to_string())
    }
}
