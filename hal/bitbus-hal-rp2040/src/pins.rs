//! Flexible pins held by GPIO number
//!
//! The bus engine addresses lines by number and switches them between
//! input and output at every bit, so each line is kept as an
//! [`embassy_rp::gpio::Flex`] pin.

use bitbus_hal::{Direction, GpioSubsystem, Level};
use embassy_rp::gpio::{AnyPin, Flex, Pin, Pull};
use embassy_rp::Peri;

use crate::gpio::GPIO_COUNT;

/// Error when adding a pin to the bank
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PinError {
    /// Pin number out of range (0-29 valid)
    InvalidPin,
    /// A pin with this number is already in the bank
    AlreadyTaken,
}

/// Pin bank that owns the bus lines and serves them by number
pub struct FlexBank {
    pins: [Option<Flex<'static>>; GPIO_COUNT],
    internal_pull_up: bool,
}

impl Default for FlexBank {
    fn default() -> Self {
        Self::new()
    }
}

impl FlexBank {
    /// Create an empty bank
    pub fn new() -> Self {
        Self {
            pins: [const { None }; GPIO_COUNT],
            internal_pull_up: false,
        }
    }

    /// Enable the RP2040's internal pull-ups on every line at `init`
    ///
    /// They are weak (~50 kΩ); only useful for short buses or bring-up
    /// without external resistors.
    pub fn with_internal_pull_up(mut self) -> Self {
        self.internal_pull_up = true;
        self
    }

    /// Add a pin, keyed by its GPIO number
    pub fn insert(&mut self, pin: Peri<'static, AnyPin>) -> Result<u8, PinError> {
        let pin_num = pin.pin();
        let slot = self
            .pins
            .get_mut(pin_num as usize)
            .ok_or(PinError::InvalidPin)?;
        if slot.is_some() {
            return Err(PinError::AlreadyTaken);
        }
        *slot = Some(Flex::new(pin));
        Ok(pin_num)
    }

    /// Remove a pin from the bank
    pub fn remove(&mut self, pin_num: u8) -> Option<Flex<'static>> {
        self.pins.get_mut(pin_num as usize)?.take()
    }

    /// Check if a pin is held
    pub fn contains(&self, pin_num: u8) -> bool {
        self.pins
            .get(pin_num as usize)
            .is_some_and(Option::is_some)
    }

    /// Number of held pins
    pub fn len(&self) -> usize {
        self.pins.iter().filter(|pin| pin.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn get_mut(&mut self, pin_num: u8) -> Option<&mut Flex<'static>> {
        let pin = self.pins.get_mut(pin_num as usize)?.as_mut();
        if pin.is_none() {
            #[cfg(feature = "defmt")]
            defmt::warn!("GPIO{} is not in the bank", pin_num);
        }
        pin
    }
}

impl GpioSubsystem for FlexBank {
    fn init(&mut self) -> bool {
        if self.is_empty() {
            #[cfg(feature = "defmt")]
            defmt::error!("no pins in the bank");
            return false;
        }

        let pull = if self.internal_pull_up {
            Pull::Up
        } else {
            Pull::None
        };
        for pin in self.pins.iter_mut().flatten() {
            pin.set_pull(pull);
            pin.set_as_input();
        }
        true
    }

    fn set_direction(&mut self, line: u8, direction: Direction) {
        if let Some(pin) = self.get_mut(line) {
            match direction {
                Direction::Output => pin.set_as_output(),
                Direction::Input => pin.set_as_input(),
            }
        }
    }

    fn write_level(&mut self, line: u8, level: Level) {
        if let Some(pin) = self.get_mut(line) {
            match level {
                Level::Low => pin.set_low(),
                Level::High => pin.set_high(),
            }
        }
    }

    fn read_level(&mut self, line: u8) -> Level {
        // A line we don't hold floats up to its pull-up
        self.get_mut(line)
            .map_or(Level::High, |pin| Level::from(pin.is_high()))
    }
}
