//! Client connection configuration

use crate::{FeedbusError, Result};
use feedbus_proto::MAX_PAYLOAD_SIZE;
use std::fmt;

/// Default broker host
pub const DEFAULT_HOST: &str = "localhost";

/// Default broker port
pub const DEFAULT_PORT: u16 = 30011;

/// Environment variable naming the broker host
pub const HOST_ENV: &str = "FEEDBUS_HOST";

/// Environment variable naming the broker port
pub const PORT_ENV: &str = "FEEDBUS_PORT";

/// Environment variable overriding the max payload size
pub const MAX_PAYLOAD_SIZE_ENV: &str = "FEEDBUS_MAX_PAYLOAD_SIZE";

/// Connection settings for a feed bus client
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Broker host name or address
    pub host: String,
    /// Broker port
    pub port: u16,
    /// Largest data payload accepted in either direction
    pub max_payload_size: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            max_payload_size: MAX_PAYLOAD_SIZE,
        }
    }
}

impl ClientConfig {
    /// Create a configuration for the given broker
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            ..Default::default()
        }
    }

    /// Read the configuration from `FEEDBUS_*` environment variables.
    ///
    /// Unset variables fall back to the defaults.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(host) = lookup(HOST_ENV) {
            config.host = host;
        }

        if let Some(port) = lookup(PORT_ENV) {
            config.port = port
                .parse()
                .map_err(|_| FeedbusError::Config(format!("{} is not a valid port: {:?}", PORT_ENV, port)))?;
        }

        if let Some(size) = lookup(MAX_PAYLOAD_SIZE_ENV) {
            config.max_payload_size = size.parse().map_err(|_| {
                FeedbusError::Config(format!("{} is not a valid size: {:?}", MAX_PAYLOAD_SIZE_ENV, size))
            })?;
        }

        Ok(config)
    }

    /// Parse a `host[:port]` address, using the default port when omitted
    pub fn parse_address(address: &str) -> Result<Self> {
        if address.is_empty() {
            return Err(FeedbusError::Config("empty address".to_string()));
        }

        if let Some(host) = address.strip_prefix('[').and_then(|rest| rest.strip_suffix(']')) {
            return Ok(Self::new(host, DEFAULT_PORT));
        }

        match address.rsplit_once(':') {
            Some((host, port)) if !host.contains(':') || host.starts_with('[') => {
                let port = port
                    .parse()
                    .map_err(|_| FeedbusError::Config(format!("invalid port in address: {}", address)))?;
                let host = host.trim_start_matches('[').trim_end_matches(']');
                Ok(Self::new(host, port))
            }
            _ => Ok(Self::new(address, DEFAULT_PORT)),
        }
    }

    /// Set the broker host
    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    /// Set the broker port
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Set the max payload size
    pub fn with_max_payload_size(mut self, max_payload_size: usize) -> Self {
        self.max_payload_size = max_payload_size;
        self
    }

    /// The `host:port` string passed to the resolver
    pub fn address(&self) -> String {
        if self.host.contains(':') {
            format!("[{}]:{}", self.host, self.port)
        } else {
            format!("{}:{}", self.host, self.port)
        }
    }
}

impl fmt::Display for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Host={}, Port={}, MaxPayloadSize={}",
            self.host, self.port, self.max_payload_size
        )
    }
}
