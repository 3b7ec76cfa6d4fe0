//! Calibrated busy-wait delays
//!
//! Bus timing is expressed in abstract *units*. The protocol engine only
//! decides how many units to wait between line transitions; how long one
//! unit lasts is a platform constant fixed when the delay is constructed.

use embedded_hal::delay::DelayNs;

/// Nanoseconds per unit that reproduces the reference bus speeds
///
/// With this calibration, 250 units per half-bit gives roughly 100 kHz.
pub const REFERENCE_NS_PER_UNIT: u32 = 20;

/// Blocking delay measured in platform units
pub trait UnitDelay {
    /// Busy-wait for approximately `units` units
    fn delay_units(&mut self, units: u32);
}

impl<T: UnitDelay + ?Sized> UnitDelay for &mut T {
    fn delay_units(&mut self, units: u32) {
        (**self).delay_units(units)
    }
}

/// Unit delay on top of any `embedded-hal` nanosecond delay
#[derive(Debug, Clone)]
pub struct CalibratedDelay<D> {
    delay: D,
    ns_per_unit: u32,
}

impl<D: DelayNs> CalibratedDelay<D> {
    /// Create a delay where one unit lasts `ns_per_unit` nanoseconds
    pub fn new(delay: D, ns_per_unit: u32) -> Self {
        Self { delay, ns_per_unit }
    }

    /// Create a delay using [`REFERENCE_NS_PER_UNIT`]
    pub fn reference(delay: D) -> Self {
        Self::new(delay, REFERENCE_NS_PER_UNIT)
    }

    /// Nanoseconds per unit
    pub fn ns_per_unit(&self) -> u32 {
        self.ns_per_unit
    }

    /// Give back the wrapped delay
    pub fn into_inner(self) -> D {
        self.delay
    }
}

impl<D: DelayNs> UnitDelay for CalibratedDelay<D> {
    fn delay_units(&mut self, units: u32) {
        if units == 0 {
            return;
        }
        // u64 so long budgets at slow calibrations don't wrap
        let mut remaining = units as u64 * self.ns_per_unit as u64;
        while remaining > 0 {
            let chunk = remaining.min(u32::MAX as u64) as u32;
            self.delay.delay_ns(chunk);
            remaining -= chunk as u64;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct RecordingDelay {
        total_ns: u64,
        calls: u32,
    }

    impl DelayNs for RecordingDelay {
        fn delay_ns(&mut self, ns: u32) {
            self.total_ns += ns as u64;
            self.calls += 1;
        }
    }

    #[test]
    fn test_reference_calibration() {
        let mut delay = CalibratedDelay::reference(RecordingDelay {
            total_ns: 0,
            calls: 0,
        });
        delay.delay_units(250);
        assert_eq!(delay.into_inner().total_ns, 5_000);
    }

    #[test]
    fn test_zero_units_is_free() {
        let mut delay = CalibratedDelay::new(
            RecordingDelay {
                total_ns: 0,
                calls: 0,
            },
            1_000,
        );
        delay.delay_units(0);
        assert_eq!(delay.into_inner().calls, 0);
    }

    #[test]
    fn test_long_delay_is_split() {
        let mut delay = CalibratedDelay::new(
            RecordingDelay {
                total_ns: 0,
                calls: 0,
            },
            1_000_000,
        );
        delay.delay_units(10_000);
        let inner = delay.into_inner();
        assert_eq!(inner.total_ns, 10_000_000_000);
        assert!(inner.calls > 1);
    }
}
