//! Configuration type definitions

use bitbus_hal::BusSpeed;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::timing::Timing;

/// Highest valid 7-bit address
pub const MAX_ADDRESS: u8 = 0x7F;

/// Default stretch budget in samples
pub const DEFAULT_STRETCH_TIMEOUT: u32 = 1_000_000;

/// Default SDA line
pub const DEFAULT_SDA: u8 = 2;

/// Default SCL line
pub const DEFAULT_SCL: u8 = 3;

/// What a session helper does when a byte is not acknowledged
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum NackPolicy {
    /// Issue STOP and fail with [`Error::Nack`]
    #[default]
    Abort,
    /// Log a warning and carry on with the transaction
    Ignore,
}

/// Bus configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct BusConfig {
    /// 7-bit peripheral address
    pub address: u8,
    /// Data line GPIO number
    pub sda: u8,
    /// Clock line GPIO number
    pub scl: u8,
    /// Delay between line transitions, in units
    pub bit_delay: u32,
    /// Extra samples allowed while waiting for a line to go high
    pub stretch_timeout: u32,
    /// NACK handling in the session helpers
    pub nack_policy: NackPolicy,
}

impl Default for BusConfig {
    fn default() -> Self {
        Self::new(0, DEFAULT_SDA, DEFAULT_SCL)
    }
}

impl BusConfig {
    /// Standard-mode bus on the given lines
    pub const fn new(address: u8, sda: u8, scl: u8) -> Self {
        Self {
            address,
            sda,
            scl,
            bit_delay: BusSpeed::STANDARD.bit_delay(),
            stretch_timeout: DEFAULT_STRETCH_TIMEOUT,
            nack_policy: NackPolicy::Abort,
        }
    }

    /// Use a speed preset's bit delay
    pub const fn with_speed(mut self, speed: BusSpeed) -> Self {
        self.bit_delay = speed.bit_delay();
        self
    }

    pub const fn with_bit_delay(mut self, bit_delay: u32) -> Self {
        self.bit_delay = bit_delay;
        self
    }

    pub const fn with_stretch_timeout(mut self, stretch_timeout: u32) -> Self {
        self.stretch_timeout = stretch_timeout;
        self
    }

    pub const fn with_nack_policy(mut self, nack_policy: NackPolicy) -> Self {
        self.nack_policy = nack_policy;
        self
    }

    /// Timing parameters for the wire layer
    pub const fn timing(&self) -> Timing {
        Timing::new(self.bit_delay, self.stretch_timeout)
    }

    /// Check the invariants a bus handle relies on
    pub fn validate(&self) -> Result<(), Error> {
        check_address(self.address)?;
        if self.sda == self.scl {
            return Err(Error::SharedLine(self.sda));
        }
        if self.bit_delay == 0 {
            return Err(Error::ZeroBitDelay);
        }
        Ok(())
    }
}

/// Reject addresses that do not fit in 7 bits
pub fn check_address(address: u8) -> Result<u8, Error> {
    if address > MAX_ADDRESS {
        Err(Error::InvalidAddress(address))
    } else {
        Ok(address)
    }
}
