//! Server configuration module
//! Handles the tunables of the HTTP server and the ranking hub

use crate::constants::{
    DEFAULT_HOST, DEFAULT_MAX_MESSAGE_SIZE, DEFAULT_OUTBOX_CAPACITY, DEFAULT_PONG_WAIT_SECS,
    DEFAULT_PORT, DEFAULT_WRITE_WAIT_SECS,
};
use crate::error::{MileHubError, Result};
use std::env;
use std::str::FromStr;
use std::time::Duration;

/// Per-connection tunables shared by the hub and every peer it accepts
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HubSettings {
    /// Time allowed to write a single frame to the peer
    pub write_wait: Duration,
    /// Read deadline; every pong from the peer pushes it forward by this much
    pub pong_wait: Duration,
    /// Largest inbound message accepted from a peer, in bytes
    pub max_message_size: usize,
    /// Number of pending outbound messages before a peer is evicted
    pub outbox_capacity: usize,
}

impl Default for HubSettings {
    fn default() -> Self {
        Self {
            write_wait: Duration::from_secs(DEFAULT_WRITE_WAIT_SECS),
            pong_wait: Duration::from_secs(DEFAULT_PONG_WAIT_SECS),
            max_message_size: DEFAULT_MAX_MESSAGE_SIZE,
            outbox_capacity: DEFAULT_OUTBOX_CAPACITY,
        }
    }
}

impl HubSettings {
    /// Keepalive period. Must stay inside the read deadline the remote enforces.
    pub fn ping_period(&self) -> Duration {
        self.pong_wait * 9 / 10
    }

    /// Reject settings that would make the hub misbehave
    pub fn validate(&self) -> Result<()> {
        if self.pong_wait.is_zero() {
            return Err(MileHubError::ConfigError(
                "pong wait must be greater than zero".to_string(),
            ));
        }
        if self.write_wait.is_zero() {
            return Err(MileHubError::ConfigError(
                "write wait must be greater than zero".to_string(),
            ));
        }
        if self.max_message_size == 0 {
            return Err(MileHubError::ConfigError(
                "max message size must be greater than zero".to_string(),
            ));
        }
        if self.outbox_capacity == 0 {
            return Err(MileHubError::ConfigError(
                "outbox capacity must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

/// Server configuration parameters
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub hub: HubSettings,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            hub: HubSettings::default(),
        }
    }
}

/// Parse an optional variable. A present but malformed value is an error.
fn parse_var<T: FromStr>(name: &str) -> Result<Option<T>> {
    match env::var(name) {
        Ok(raw) => raw.trim().parse().map(Some).map_err(|_| {
            MileHubError::ConfigError(format!("{} has an invalid value: '{}'", name, raw))
        }),
        Err(_) => Ok(None),
    }
}

impl ServerConfig {
    /// Load configuration from environment variables if available
    pub fn from_env() -> Result<Self> {
        let host = env::var("MILE_HUB_HOST").unwrap_or(DEFAULT_HOST.to_string());

        // PORT is what most hosting platforms inject
        let port = match parse_var("MILE_HUB_PORT")? {
            Some(port) => port,
            None => parse_var("PORT")?.unwrap_or(DEFAULT_PORT),
        };

        let write_wait_secs =
            parse_var("MILE_HUB_WRITE_WAIT_SECS")?.unwrap_or(DEFAULT_WRITE_WAIT_SECS);
        let pong_wait_secs = parse_var("MILE_HUB_PONG_WAIT_SECS")?.unwrap_or(DEFAULT_PONG_WAIT_SECS);
        let max_message_size =
            parse_var("MILE_HUB_MAX_MESSAGE_SIZE")?.unwrap_or(DEFAULT_MAX_MESSAGE_SIZE);
        let outbox_capacity =
            parse_var("MILE_HUB_OUTBOX_CAPACITY")?.unwrap_or(DEFAULT_OUTBOX_CAPACITY);

        let hub = HubSettings {
            write_wait: Duration::from_secs(write_wait_secs),
            pong_wait: Duration::from_secs(pong_wait_secs),
            max_message_size,
            outbox_capacity,
        };
        hub.validate()?;

        Ok(Self { host, port, hub })
    }

    /// Socket address string for binding
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings() {
        let settings = HubSettings::default();
        assert_eq!(settings.pong_wait, Duration::from_secs(60));
        assert_eq!(settings.write_wait, Duration::from_secs(10));
        assert_eq!(settings.max_message_size, 512 * 1024);
        assert_eq!(settings.outbox_capacity, 256);
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_ping_period_is_nine_tenths_of_pong_wait() {
        let settings = HubSettings::default();
        assert_eq!(settings.ping_period(), Duration::from_secs(54));

        let short = HubSettings {
            pong_wait: Duration::from_millis(100),
            ..HubSettings::default()
        };
        assert_eq!(short.ping_period(), Duration::from_millis(90));
    }

    #[test]
    fn test_validate_rejects_zero_capacity() {
        let settings = HubSettings {
            outbox_capacity: 0,
            ..HubSettings::default()
        };
        let err = settings.validate().unwrap_err();
        assert!(err.to_string().contains("outbox capacity"));
    }

    #[test]
    fn test_validate_rejects_zero_pong_wait() {
        let settings = HubSettings {
            pong_wait: Duration::ZERO,
            ..HubSettings::default()
        };
        assert!(settings.validate().is_err());
    }

    // All environment handling lives in one test so parallel tests never race on it
    #[test]
    fn test_from_env() {
        env::remove_var("MILE_HUB_PORT");
        env::remove_var("PORT");
        env::remove_var("MILE_HUB_OUTBOX_CAPACITY");
        let config = ServerConfig::from_env().unwrap();
        assert_eq!(config.port, DEFAULT_PORT);
        assert_eq!(config.hub, HubSettings::default());

        env::set_var("PORT", "9090");
        assert_eq!(ServerConfig::from_env().unwrap().port, 9090);

        env::set_var("MILE_HUB_PORT", "9191");
        assert_eq!(ServerConfig::from_env().unwrap().port, 9191);

        env::set_var("MILE_HUB_OUTBOX_CAPACITY", "lots");
        let err = ServerConfig::from_env().unwrap_err();
        assert!(err.to_string().contains("MILE_HUB_OUTBOX_CAPACITY"));

        env::remove_var("MILE_HUB_OUTBOX_CAPACITY");
        env::remove_var("MILE_HUB_PORT");
        env::remove_var("PORT");
    }
}
