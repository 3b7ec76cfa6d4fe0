//! Hung bus recovery
//!
//! A peripheral interrupted mid-read keeps SDA low while it waits for the
//! rest of the clocks. Clocking SCL until it lets go, then issuing STOP,
//! brings it back to idle.

use bitbus_hal::{GpioSubsystem, UnitDelay};

use super::BusHandle;
use crate::error::Error;

/// Clock pulses that always finish a stuck byte plus its ACK bit
pub const RECOVERY_CLOCKS: u32 = 9;

/// Successful outcome of [`BusHandle::recover`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Recovery {
    /// Bus was already free; nothing was clocked
    NotHung,
    /// SDA was held low and the bus is free again
    Unstuck,
}

impl<G: GpioSubsystem, D: UnitDelay> BusHandle<G, D> {
    /// Free a bus left hung by an interrupted transfer
    ///
    /// Returns [`Error::BusNotFree`] if SDA is still low after
    /// [`RECOVERY_CLOCKS`] pulses and a STOP, or [`Error::ClockHeld`] if a
    /// peripheral holds SCL itself. Both lines are released in every case.
    pub fn recover(&mut self) -> Result<Recovery, Error> {
        let result = self.unhang();
        if result.is_err() {
            self.wire.release_all();
        }
        result
    }

    fn unhang(&mut self) -> Result<Recovery, Error> {
        let wire = &mut self.wire;
        wire.release_all();
        wire.wait();
        if wire.wait_bus_free().is_ok() {
            return Ok(Recovery::NotHung);
        }
        wire.raise_clock()?;

        let mut pulses = 0;
        while pulses < RECOVERY_CLOCKS && !wire.data_is_high() {
            wire.lower_clock();
            wire.wait();
            wire.raise_clock()?;
            wire.wait();
            pulses += 1;
        }
        debug!("clocked {} pulses to free SDA", pulses);

        wire.lower_clock();
        wire.wait();
        wire.stop()?;

        if wire.wait_bus_free().is_ok() {
            warn!("hung bus recovered");
            Ok(Recovery::Unstuck)
        } else {
            warn!("SDA still held after recovery");
            Err(Error::BusNotFree)
        }
    }
}
