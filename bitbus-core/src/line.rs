//! Open-drain line driver
//!
//! A line is never driven high. "Low" means output with the latch at low;
//! "high" means input, letting the external pull-up (or a peripheral that
//! is stretching the clock) decide the level.

use bitbus_hal::{Direction, GpioSubsystem, Level};

/// What the master is currently doing with a line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LineState {
    /// Direction never configured
    Unset,
    /// Output, latch low
    DrivingLow,
    /// Input; the pull-up or a peripheral sets the level
    Released,
}

/// One open-drain line
#[derive(Debug, Clone)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Line {
    pin: u8,
    state: LineState,
}

impl Line {
    /// Create a line on a GPIO number; no hardware is touched yet
    pub const fn new(pin: u8) -> Self {
        Self {
            pin,
            state: LineState::Unset,
        }
    }

    /// GPIO number of this line
    pub fn pin(&self) -> u8 {
        self.pin
    }

    /// Current master-side state
    pub fn state(&self) -> LineState {
        self.state
    }

    /// Latch the output low and release the line
    ///
    /// This is the resting state set when a bus is opened. Every later
    /// `drive_low` relies on the latch already being low.
    pub fn park<G: GpioSubsystem>(&mut self, gpio: &mut G) {
        gpio.write_level(self.pin, Level::Low);
        gpio.set_direction(self.pin, Direction::Input);
        self.state = LineState::Released;
    }

    /// Pull the line low
    pub fn drive_low<G: GpioSubsystem>(&mut self, gpio: &mut G) {
        // Latch first so the switch to output can never glitch high
        gpio.write_level(self.pin, Level::Low);
        gpio.set_direction(self.pin, Direction::Output);
        self.state = LineState::DrivingLow;
    }

    /// Let the line float up to the pull-up level
    pub fn release<G: GpioSubsystem>(&mut self, gpio: &mut G) {
        gpio.set_direction(self.pin, Direction::Input);
        self.state = LineState::Released;
    }

    /// Release for `true`, drive low for `false`
    pub fn set<G: GpioSubsystem>(&mut self, gpio: &mut G, high: bool) {
        if high {
            self.release(gpio);
        } else {
            self.drive_low(gpio);
        }
    }

    /// Sample the level actually present on the line
    pub fn level<G: GpioSubsystem>(&self, gpio: &mut G) -> Level {
        debug_assert!(
            self.state != LineState::Unset,
            "sampled a line whose direction was never set"
        );
        gpio.read_level(self.pin)
    }

    /// Sample the line and check for high
    pub fn is_high<G: GpioSubsystem>(&self, gpio: &mut G) -> bool {
        self.level(gpio).is_high()
    }
}
