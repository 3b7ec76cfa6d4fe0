//! START, repeated START and STOP conditions
//!
//! ```text
//!          START        RESTART            STOP
//! SDA  ‾‾‾‾\______   __/‾‾‾‾\____    ____/‾‾‾‾
//! SCL  ‾‾‾‾‾‾‾\___   ____/‾‾‾‾\__    __/‾‾‾‾‾‾
//! ```
//!
//! START and RESTART leave both lines driven low with the bus owned.
//! STOP leaves both lines released.

use bitbus_hal::{GpioSubsystem, UnitDelay};

use crate::error::Error;
use crate::wire::Wire;

impl<G: GpioSubsystem, D: UnitDelay> Wire<G, D> {
    /// Wait until both lines read high, within the stretch budget
    pub fn wait_bus_free(&mut self) -> Result<(), Error> {
        let Wire {
            gpio,
            sda,
            scl,
            timing,
            ..
        } = self;

        if timing.poll(|| sda.is_high(gpio) && scl.is_high(gpio)) {
            Ok(())
        } else {
            debug!("bus not free");
            Err(Error::BusNotFree)
        }
    }

    /// Generate a START condition on an idle bus
    pub fn start(&mut self) -> Result<(), Error> {
        self.wait_bus_free()?;

        // SDA falls while SCL is high
        self.lower_data();
        self.wait_half();
        self.lower_clock();
        self.wait();
        Ok(())
    }

    /// Generate a repeated START while the bus is owned (SCL low)
    ///
    /// SDA is released first so it is high when SCL rises; then the usual
    /// START edge is produced with SCL high.
    pub fn restart(&mut self) -> Result<(), Error> {
        self.release_data();
        self.wait();
        self.raise_clock()?;
        self.wait();
        self.wait_bus_free()?;

        self.lower_data();
        self.wait();
        self.lower_clock();
        self.wait();
        Ok(())
    }

    /// Generate a STOP condition, ending with both lines released
    ///
    /// Returns [`Error::BusNotFree`] if a peripheral still pulls SDA low
    /// once it is released: the STOP edge never happened.
    pub fn stop(&mut self) -> Result<(), Error> {
        self.lower_data();
        self.wait();
        self.raise_clock()?;
        self.wait();

        // SDA rises while SCL is high
        self.release_data();
        self.wait();
        if !self.data_is_high() {
            warn!("SDA held low through STOP");
            return Err(Error::BusNotFree);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bitbus_hal::Level;

    use crate::line::LineState;
    use crate::sim::{BusEvent, SimBus, SimDelay};
    use crate::timing::Timing;

    fn wire(bus: SimBus) -> Wire<SimBus, SimDelay> {
        let mut wire = Wire::new(bus, SimDelay::new(), 2, 3, Timing::new(10, 16));
        wire.park();
        wire
    }

    #[test]
    fn test_start_takes_the_bus() {
        let mut wire = wire(SimBus::new(2, 3));
        wire.start().unwrap();

        assert_eq!(wire.sda().state(), LineState::DrivingLow);
        assert_eq!(wire.scl().state(), LineState::DrivingLow);
        assert_eq!(wire.gpio().transcript(), &[BusEvent::Start]);
        // Half bit before the clock falls, a full bit after
        assert_eq!(wire.delay().total_units(), 15);
    }

    #[test]
    fn test_start_then_stop() {
        let mut wire = wire(SimBus::new(2, 3));
        wire.start().unwrap();
        wire.stop().unwrap();

        assert_eq!(
            wire.gpio().transcript(),
            &[BusEvent::Start, BusEvent::Stop]
        );
        assert_eq!(wire.sda().state(), LineState::Released);
        assert_eq!(wire.scl().state(), LineState::Released);
        assert!(wire.is_free());
    }

    #[test]
    fn test_start_edge_order() {
        let mut wire = wire(SimBus::new(2, 3));
        wire.start().unwrap();

        // SDA must fall first, with SCL still high
        let trace = wire.gpio().trace();
        assert_eq!(trace[0], (Level::High, Level::High));
        assert_eq!(trace[1], (Level::Low, Level::High));
        assert_eq!(trace[2], (Level::Low, Level::Low));
    }

    #[test]
    fn test_start_fails_when_sda_held() {
        let mut wire = wire(SimBus::new(2, 3));
        wire.gpio_mut().hold_sda_low(true);

        assert_eq!(wire.start(), Err(Error::BusNotFree));
        // Nothing was driven
        assert!(!wire.is_holding());
        assert!(wire.gpio().transcript().is_empty());
    }

    #[test]
    fn test_start_fails_when_scl_held() {
        let mut wire = wire(SimBus::new(2, 3));
        wire.gpio_mut().hold_scl_low(true);
        assert_eq!(wire.start(), Err(Error::BusNotFree));
        assert!(!wire.is_holding());
    }

    #[test]
    fn test_restart_produces_start_edge() {
        let mut wire = wire(SimBus::new(2, 3));
        wire.start().unwrap();
        wire.restart().unwrap();
        wire.stop().unwrap();

        assert_eq!(
            wire.gpio().transcript(),
            &[BusEvent::Start, BusEvent::Restart, BusEvent::Stop]
        );
    }

    #[test]
    fn test_restart_fails_when_peer_keeps_sda() {
        let mut wire = wire(SimBus::new(2, 3));
        wire.start().unwrap();
        wire.gpio_mut().hold_sda_low(true);

        assert_eq!(wire.restart(), Err(Error::BusNotFree));
    }

    #[test]
    fn test_stop_reports_held_clock() {
        let mut wire = wire(SimBus::new(2, 3));
        wire.start().unwrap();
        wire.gpio_mut().hold_scl_low(true);

        assert_eq!(wire.stop(), Err(Error::ClockHeld));
    }

    #[test]
    fn test_stop_reports_sda_kept_low() {
        let mut wire = wire(SimBus::new(2, 3));
        wire.start().unwrap();
        wire.gpio_mut().hold_sda_low(true);

        assert_eq!(wire.stop(), Err(Error::BusNotFree));
        assert_eq!(wire.gpio().transcript(), &[BusEvent::Start]);
        // Master let go of both lines anyway
        assert!(!wire.is_holding());
    }
}
