//! The two-wire bus as seen by the master
//!
//! [`Wire`] owns the GPIO subsystem, the delay and the SDA/SCL line state.
//! The clock gate, condition generator and byte engine are implemented as
//! `impl` blocks on it in their own modules.

use bitbus_hal::{GpioSubsystem, UnitDelay};

use crate::line::{Line, LineState};
use crate::timing::Timing;

/// Bit-level access to SDA and SCL
pub struct Wire<G, D> {
    pub(crate) gpio: G,
    pub(crate) delay: D,
    pub(crate) sda: Line,
    pub(crate) scl: Line,
    pub(crate) timing: Timing,
}

impl<G: GpioSubsystem, D: UnitDelay> Wire<G, D> {
    /// Wrap an initialized GPIO subsystem; lines stay untouched until [`Wire::park`]
    pub fn new(gpio: G, delay: D, sda: u8, scl: u8, timing: Timing) -> Self {
        Self {
            gpio,
            delay,
            sda: Line::new(sda),
            scl: Line::new(scl),
            timing,
        }
    }

    /// Latch both lines low and release them (idle bus)
    pub fn park(&mut self) {
        self.sda.park(&mut self.gpio);
        self.scl.park(&mut self.gpio);
    }

    /// Wait one bit delay
    pub fn wait(&mut self) {
        self.delay.delay_units(self.timing.bit_delay);
    }

    /// Wait half a bit delay
    pub fn wait_half(&mut self) {
        self.delay.delay_units(self.timing.half_bit());
    }

    /// Drive SCL low
    pub fn lower_clock(&mut self) {
        self.scl.drive_low(&mut self.gpio);
    }

    /// Release SDA for a 1 bit, drive it low for a 0 bit
    pub fn set_data(&mut self, high: bool) {
        self.sda.set(&mut self.gpio, high);
    }

    /// Release SDA
    pub fn release_data(&mut self) {
        self.sda.release(&mut self.gpio);
    }

    /// Drive SDA low
    pub fn lower_data(&mut self) {
        self.sda.drive_low(&mut self.gpio);
    }

    /// Sample SDA
    pub fn data_is_high(&mut self) -> bool {
        self.sda.is_high(&mut self.gpio)
    }

    /// Sample SCL
    pub fn clock_is_high(&mut self) -> bool {
        self.scl.is_high(&mut self.gpio)
    }

    /// Single sample: both lines high
    pub fn is_free(&mut self) -> bool {
        self.sda.is_high(&mut self.gpio) && self.scl.is_high(&mut self.gpio)
    }

    /// Release both lines without any sequencing
    pub fn release_all(&mut self) {
        self.sda.release(&mut self.gpio);
        self.scl.release(&mut self.gpio);
    }

    /// Master is pulling at least one line low
    pub fn is_holding(&self) -> bool {
        self.sda.state() == LineState::DrivingLow || self.scl.state() == LineState::DrivingLow
    }
}

impl<G, D> Wire<G, D> {
    pub fn sda(&self) -> &Line {
        &self.sda
    }

    pub fn scl(&self) -> &Line {
        &self.scl
    }

    pub fn timing(&self) -> Timing {
        self.timing
    }

    pub fn gpio(&self) -> &G {
        &self.gpio
    }

    pub fn gpio_mut(&mut self) -> &mut G {
        &mut self.gpio
    }

    pub fn delay(&self) -> &D {
        &self.delay
    }

    /// Give back the GPIO subsystem and delay
    pub fn into_parts(self) -> (G, D) {
        (self.gpio, self.delay)
    }
}
