use std::error::Error;
use std::fmt;

#[derive(Debug)]
pub enum MileHubError {
    // Connection errors
    ConnectionError(String),
    Timeout(String),

    // Messages errors
    MessageTooLarge(usize),
    SerializationError(String),

    // Hub errors
    HubStopped,

    // Storage errors
    PlayerNotFound(String),

    // Validation errors
    ValidationError(String),

    // Configuration errors
    ConfigError(String),
}

impl fmt::Display for MileHubError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ConnectionError(msg) => write!(f, "Connection error: {}", msg),
            Self::Timeout(msg) => write!(f, "Timed out: {}", msg),
            Self::MessageTooLarge(size) => write!(f, "Message too large: {} bytes", size),
            Self::SerializationError(msg) => write!(f, "Serialization error: {}", msg),
            Self::HubStopped => write!(f, "Hub control loop is not running"),
            Self::PlayerNotFound(id) => write!(f, "Player not found: {}", id),
            Self::ValidationError(msg) => write!(f, "Validation error: {}", msg),
            Self::ConfigError(msg) => write!(f, "Configuration error: {}", msg),
        }
    }
}

impl Error for MileHubError {}

impl From<serde_json::Error> for MileHubError {
    fn from(err: serde_json::Error) -> Self {
        MileHubError::SerializationError(err.to_string())
    }
}

// Generic result type for the hub
pub type Result<T> = std::result::Result<T, MileHubError>;
