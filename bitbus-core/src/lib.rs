//! Bit-banged I2C master
//!
//! This crate drives the I2C protocol entirely in software over two GPIO
//! lines, for hardware whose I2C peripheral cannot cope with clock
//! stretching. It is board-agnostic: the platform provides a
//! [`bitbus_hal::GpioSubsystem`] and a [`bitbus_hal::UnitDelay`].
//!
//! Components, leaf to root:
//!
//! - [`line`] - open-drain emulation (drive low / release)
//! - [`timing`] - bit delays and bounded polling budgets
//! - [`gate`] - clock-stretch aware clock release
//! - [`condition`] - START, repeated START and STOP
//! - [`transfer`] - byte send/receive with the ACK bit
//! - [`session`] - whole transactions, scanning and bus recovery
//!
//! # Example
//!
//! ```ignore
//! use bitbus_core::{BusConfig, BusHandle};
//!
//! let config = BusConfig::new(0x21, 17, 21).with_bit_delay(300);
//! let mut bus = BusHandle::open(gpio, delay, config)?;
//! bus.write_buffer(&[0x01, 0x01])?;
//! let report = bus.scan(0x10, 0xE0)?;
//! ```

#![no_std]
#![deny(unsafe_code)]

#[cfg(any(test, feature = "sim"))]
extern crate alloc;

// proptest's assertion macros expect `format!` in scope
#[cfg(test)]
#[macro_use]
extern crate std;

// Must come first so the logging macros are visible to every module
mod fmt;

pub mod condition;
pub mod config;
pub mod error;
pub mod gate;
pub mod line;
pub mod session;
pub mod timing;
pub mod transfer;
pub mod wire;

#[cfg(any(test, feature = "sim"))]
pub mod sim;

#[cfg(feature = "toml")]
pub use config::ConfigError;
pub use config::{BusConfig, NackPolicy};
pub use error::{Error, NackSource};
pub use line::{Line, LineState};
pub use session::{BusHandle, Recovery, ScanReport};
pub use timing::Timing;
pub use transfer::Ack;
pub use wire::Wire;

pub use bitbus_hal::{BusSpeed, Direction, GpioSubsystem, I2cBus, Level, UnitDelay};
