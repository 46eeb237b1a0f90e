//! Process configuration
//!
//! All settings come from the environment (a `.env` file is honored when
//! present, loaded by the binary). Configuration is explicit: structs are
//! built once at process entry and passed into constructors, and a missing
//! required variable fails startup instead of silently defaulting.

use std::time::Duration;

use sqlx::postgres::PgConnectOptions;

use crate::error::{BridgeError, Result};

/// Pause between reconnection attempts after a session fault
pub const DEFAULT_RECONNECT_DELAY: Duration = Duration::from_secs(3);

/// Limit on establishing the manager TCP connection
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Manager interface endpoint and login credentials
#[derive(Debug, Clone)]
pub struct AmiConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub secret: String,
}

impl AmiConfig {
    /// `host:port` form, for connecting and for log lines
    pub fn endpoint(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Postgres endpoint and credentials for the durable store
#[derive(Debug, Clone)]
pub struct StoreConfig {
    pub host: String,
    pub port: u16,
    pub database: String,
    pub user: String,
    pub password: String,
}

impl StoreConfig {
    /// Connection options for the sqlx pool
    pub fn connect_options(&self) -> PgConnectOptions {
        PgConnectOptions::new()
            .host(&self.host)
            .port(self.port)
            .database(&self.database)
            .username(&self.user)
            .password(&self.password)
    }

    /// `host:port/database` form for log lines (never includes the password)
    pub fn endpoint(&self) -> String {
        format!("{}:{}/{}", self.host, self.port, self.database)
    }
}

/// Top-level bridge configuration
#[derive(Debug, Clone)]
pub struct BridgeConfig {
    pub ami: AmiConfig,
    pub store: StoreConfig,
    pub reconnect_delay: Duration,
    pub connect_timeout: Duration,
}

impl BridgeConfig {
    /// Build a configuration with the default timing parameters
    pub fn new(ami: AmiConfig, store: StoreConfig) -> Self {
        Self {
            ami,
            store,
            reconnect_delay: DEFAULT_RECONNECT_DELAY,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
        }
    }

    /// Read the full configuration from the process environment
    ///
    /// Reads `AMI_HOST`, `AMI_PORT`, `AMI_USER`, `AMI_PASS` for the manager
    /// side and `PG_HOST`, `PG_PORT`, `PG_DB`, `PG_USER`, `PG_PASS` for the
    /// store. `AMI_HOST` falls back to loopback; everything else is
    /// required, and a missing variable or unparsable port is a
    /// [`BridgeError::Configuration`].
    pub fn from_env() -> Result<Self> {
        let ami = AmiConfig {
            host: optional("AMI_HOST").unwrap_or_else(|| "127.0.0.1".to_string()),
            port: required_port("AMI_PORT")?,
            username: required("AMI_USER")?,
            secret: required("AMI_PASS")?,
        };
        let store = StoreConfig {
            host: required("PG_HOST")?,
            port: required_port("PG_PORT")?,
            database: required("PG_DB")?,
            user: required("PG_USER")?,
            password: required("PG_PASS")?,
        };
        Ok(Self::new(ami, store))
    }

    /// Set the pause between reconnection attempts
    ///
    /// Tests drive this close to zero; production keeps the 3 s default.
    pub fn with_reconnect_delay(mut self, delay: Duration) -> Self {
        self.reconnect_delay = delay;
        self
    }

    /// Set the TCP connect timeout for the manager endpoint
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }
}

fn optional(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn required(name: &str) -> Result<String> {
    optional(name).ok_or_else(|| BridgeError::config(format!("{name} is not set")))
}

fn required_port(name: &str) -> Result<u16> {
    let raw = required(name)?;
    raw.trim()
        .parse()
        .map_err(|_| BridgeError::config(format!("{name} is not a valid port: {raw}")))
}
