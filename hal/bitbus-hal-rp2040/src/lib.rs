//! RP2040 backend for the bit-banged I2C master
//!
//! This crate provides RP2040-specific implementations of the shared
//! `bitbus-hal` traits:
//!
//! - [`FlexBank`]: flexible (input/output switchable) pins by GPIO number,
//!   implementing `GpioSubsystem`
//! - [`CycleDelay`]: CPU-cycle-counted busy wait, implementing `UnitDelay`
//! - Pin-string parsing for config-driven line assignment
//!
//! ```ignore
//! let p = embassy_rp::init(Default::default());
//! let mut bank = FlexBank::new();
//! bank.insert(p.PIN_17.into())?;
//! bank.insert(p.PIN_21.into())?;
//! let bus = BusHandle::open(bank, CycleDelay::from_clocks(), BusConfig::new(0x42, 17, 21))?;
//! ```

#![no_std]

pub mod delay;
pub mod gpio;
pub mod pins;

pub use delay::CycleDelay;
pub use gpio::{parse_pin_string, GPIO_COUNT};
pub use pins::{FlexBank, PinError};

// Re-export shared traits from bitbus-hal for convenience
pub use bitbus_hal::{GpioSubsystem, UnitDelay};
