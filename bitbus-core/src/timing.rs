//! Bus timing parameters
//!
//! Both values are plain counts. `bit_delay` is in [`bitbus_hal::UnitDelay`]
//! units; `stretch_timeout` is a number of extra line samples.

/// Timing knobs for one bus
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Timing {
    /// Delay between line transitions, in units
    pub bit_delay: u32,
    /// Extra samples allowed while waiting for a line to go high
    pub stretch_timeout: u32,
}

impl Timing {
    pub const fn new(bit_delay: u32, stretch_timeout: u32) -> Self {
        Self {
            bit_delay,
            stretch_timeout,
        }
    }

    /// Delay used between the START edge and the first clock low
    pub const fn half_bit(&self) -> u32 {
        self.bit_delay / 2
    }

    /// Poll `probe` until it returns true, within the stretch budget
    pub fn poll<F: FnMut() -> bool>(&self, probe: F) -> bool {
        poll_within(self.stretch_timeout, probe)
    }
}

/// Sample once, then up to `budget` more times; stop at the first `true`
///
/// Returns `false` only after `budget + 1` samples all came back false.
pub fn poll_within<F: FnMut() -> bool>(budget: u32, mut probe: F) -> bool {
    if probe() {
        return true;
    }
    for _ in 0..budget {
        if probe() {
            return true;
        }
    }
    false
}
