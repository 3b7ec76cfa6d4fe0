//! bitbus Hardware Abstraction Layer
//!
//! This crate defines the narrow platform interface the bit-banged I2C
//! engine consumes. Chip-specific crates (RP2040, host simulator, etc.)
//! implement these traits so the same protocol code runs everywhere.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │  Device drivers / applications          │
//! └─────────────────────────────────────────┘
//!                     │
//!                     ▼
//! ┌─────────────────────────────────────────┐
//! │  bitbus-core (protocol engine)          │
//! └─────────────────────────────────────────┘
//!                     │
//!                     ▼
//! ┌─────────────────────────────────────────┐
//! │  bitbus-hal (this crate - traits)       │
//! └─────────────────────────────────────────┘
//!                     │
//!         ┌───────────┴───────────┐
//!         ▼                       ▼
//! ┌───────────────┐       ┌───────────────┐
//! │  bitbus-hal-  │       │  bitbus-core  │
//! │    rp2040     │       │  ::sim (host) │
//! └───────────────┘       └───────────────┘
//! ```
//!
//! # Traits
//!
//! - [`gpio::GpioSubsystem`] - Line direction and level control
//! - [`delay::UnitDelay`] - Calibrated busy-wait in platform units
//! - [`i2c::I2cBus`] - I2C master operations

#![no_std]
#![deny(unsafe_code)]

pub mod delay;
pub mod gpio;
pub mod i2c;

// Re-export key traits at crate root for convenience
pub use delay::{CalibratedDelay, UnitDelay};
pub use gpio::{Direction, GpioSubsystem, Level};
pub use i2c::{BusSpeed, I2cBus};
