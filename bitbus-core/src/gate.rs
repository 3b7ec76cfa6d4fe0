//! Clock-stretch gate
//!
//! Every clock-high transition goes through [`Wire::raise_clock`]. A
//! peripheral may hold SCL low at any bit boundary, so the check happens
//! per bit rather than per byte.

use bitbus_hal::{GpioSubsystem, UnitDelay};

use crate::error::Error;
use crate::wire::Wire;

impl<G: GpioSubsystem, D: UnitDelay> Wire<G, D> {
    /// Release SCL and wait until it actually reads high
    ///
    /// Samples SCL at most `stretch_timeout + 1` times. Returns
    /// [`Error::ClockHeld`] if every sample read low; SCL is left released.
    pub fn raise_clock(&mut self) -> Result<(), Error> {
        let Wire {
            gpio,
            scl,
            timing,
            ..
        } = self;

        scl.release(gpio);
        if timing.poll(|| scl.is_high(gpio)) {
            Ok(())
        } else {
            warn!(
                "SCL held low past {} samples",
                timing.stretch_timeout.saturating_add(1)
            );
            Err(Error::ClockHeld)
        }
    }
}
