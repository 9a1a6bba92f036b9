//! Configuration for energenie
//!
//! Centralized configuration with sensible defaults.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use crate::error::EnergenieError;

/// Default device address
pub const DEFAULT_ADDRESS: &str = "192.168.3.200";

/// Default TCP port of the native protocol
pub const DEFAULT_PORT: u16 = 5000;

/// Factory password of the device
pub const DEFAULT_PASSWORD: &str = "1";

/// Main configuration for talking to one power strip
#[derive(Debug, Clone)]
pub struct Config {
    // -------------------------------------------------------------------------
    // Device Configuration
    // -------------------------------------------------------------------------
    /// Host name or IP address of the power strip
    pub address: String,

    /// Port used by the native protocol (ignored by the HTTP transport)
    pub port: u16,

    /// Login password, at most 8 bytes for the native protocol
    pub password: String,

    /// Which transport to talk to the device with
    pub transport: Transport,

    // -------------------------------------------------------------------------
    // Network Configuration
    // -------------------------------------------------------------------------
    /// TCP connect timeout (milliseconds, must be > 0)
    pub connect_timeout_ms: u64,

    /// Per-read deadline inside a session (milliseconds, 0 = blocking)
    ///
    /// The HTTP transport has a single per-request deadline, the sum of the
    /// read and write timeouts; it is disabled if either of them is 0.
    pub read_timeout_ms: u64,

    /// Per-write deadline inside a session (milliseconds, 0 = blocking)
    pub write_timeout_ms: u64,
}

/// Transport used to reach the device
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Transport {
    /// Binary challenge-response protocol over TCP
    #[default]
    Native,

    /// HTML scraping of the device's web interface
    Http,
}

impl FromStr for Transport {
    type Err = EnergenieError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "native" => Ok(Transport::Native),
            "http" => Ok(Transport::Http),
            other => Err(EnergenieError::Config(format!(
                "Unsupported protocol {:?}. Valid values are \"native\" and \"http\"",
                other
            ))),
        }
    }
}

impl fmt::Display for Transport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Transport::Native => f.write_str("native"),
            Transport::Http => f.write_str("http"),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            address: DEFAULT_ADDRESS.to_string(),
            port: DEFAULT_PORT,
            password: DEFAULT_PASSWORD.to_string(),
            transport: Transport::Native,
            connect_timeout_ms: 4000,
            read_timeout_ms: 5000,
            write_timeout_ms: 5000,
        }
    }
}

impl Config {
    /// Create a new config builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// Check the settings that cannot be caught by types alone
    pub fn validate(&self) -> Result<(), EnergenieError> {
        if self.connect_timeout_ms == 0 {
            return Err(EnergenieError::Config(
                "connect timeout must be greater than 0 ms".to_string(),
            ));
        }
        Ok(())
    }

    /// Deadline for one whole HTTP request, `None` when reads or writes block
    pub fn http_request_timeout(&self) -> Option<Duration> {
        if self.read_timeout_ms == 0 || self.write_timeout_ms == 0 {
            None
        } else {
            Some(Duration::from_millis(
                self.read_timeout_ms.saturating_add(self.write_timeout_ms),
            ))
        }
    }
}

/// Builder for Config
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Set the device address
    pub fn address(mut self, address: impl Into<String>) -> Self {
        self.config.address = address.into();
        self
    }

    /// Set the native protocol port
    pub fn port(mut self, port: u16) -> Self {
        self.config.port = port;
        self
    }

    /// Set the login password
    pub fn password(mut self, password: impl Into<String>) -> Self {
        self.config.password = password.into();
        self
    }

    /// Set the transport
    pub fn transport(mut self, transport: Transport) -> Self {
        self.config.transport = transport;
        self
    }

    /// Set the connect timeout (in milliseconds)
    pub fn connect_timeout_ms(mut self, ms: u64) -> Self {
        self.config.connect_timeout_ms = ms;
        self
    }

    /// Set the read timeout (in milliseconds)
    pub fn read_timeout_ms(mut self, ms: u64) -> Self {
        self.config.read_timeout_ms = ms;
        self
    }

    /// Set the write timeout (in milliseconds)
    pub fn write_timeout_ms(mut self, ms: u64) -> Self {
        self.config.write_timeout_ms = ms;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}
