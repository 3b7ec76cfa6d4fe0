//! TOML loading
//!
//! ```toml
//! [bus]
//! address = 0x42
//! sda = 17
//! scl = 21
//! speed_kbps = 400       # or: bit_delay = 23
//! stretch_timeout = 100000
//! nack_policy = "ignore"
//! ```
//!
//! Every key is optional; missing keys keep their [`BusConfig::default`]
//! value. An explicit `bit_delay` wins over `speed_kbps`.
//!
//! Only built with the `toml` feature, tests included: run them with
//! `cargo test-all` or `cargo test -p bitbus-core --features toml`.

use bitbus_hal::BusSpeed;
use serde::Deserialize;

use super::types::{BusConfig, NackPolicy};
use crate::error::Error;

/// Configuration loading errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    /// Input is not valid TOML or has keys of the wrong type
    Parse,
    /// `speed_kbps` is not one of the presets
    UnknownSpeed(u32),
    /// Values parsed but break a bus invariant
    Invalid(Error),
}

impl From<Error> for ConfigError {
    fn from(e: Error) -> Self {
        ConfigError::Invalid(e)
    }
}

impl core::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            ConfigError::Parse => f.write_str("malformed bus configuration"),
            ConfigError::UnknownSpeed(kbps) => write!(f, "no speed preset for {kbps} kbit/s"),
            ConfigError::Invalid(e) => write!(f, "invalid bus configuration: {e}"),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct BusTable {
    address: Option<u8>,
    sda: Option<u8>,
    scl: Option<u8>,
    speed_kbps: Option<u32>,
    bit_delay: Option<u32>,
    stretch_timeout: Option<u32>,
    nack_policy: Option<NackPolicy>,
}

#[derive(Debug, Default, Deserialize)]
struct Document {
    #[serde(default)]
    bus: BusTable,
}

impl BusConfig {
    /// Load and validate a configuration from a TOML document
    pub fn from_toml(input: &str) -> Result<Self, ConfigError> {
        let document: Document = toml::from_str(input).map_err(|_| {
            warn!("bus config is not valid TOML");
            ConfigError::Parse
        })?;
        let table = document.bus;

        let mut config = BusConfig::default();
        if let Some(address) = table.address {
            config.address = address;
        }
        if let Some(sda) = table.sda {
            config.sda = sda;
        }
        if let Some(scl) = table.scl {
            config.scl = scl;
        }
        if let Some(kbps) = table.speed_kbps {
            let speed = BusSpeed::from_kbps(kbps).ok_or(ConfigError::UnknownSpeed(kbps))?;
            config = config.with_speed(speed);
        }
        if let Some(bit_delay) = table.bit_delay {
            config.bit_delay = bit_delay;
        }
        if let Some(stretch_timeout) = table.stretch_timeout {
            config.stretch_timeout = stretch_timeout;
        }
        if let Some(nack_policy) = table.nack_policy {
            config.nack_policy = nack_policy;
        }

        config.validate()?;
        debug!(
            "loaded bus config: addr {=u8:#x}, sda {}, scl {}, delay {}",
            config.address, config.sda, config.scl, config.bit_delay
        );
        Ok(config)
    }
}
