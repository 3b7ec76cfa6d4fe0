//! Cycle-counted delay
//!
//! Busy-waits with `cortex_m::asm::delay`, so one unit lasts a fixed number
//! of CPU cycles. The cycle count is derived from the system clock so a
//! unit stays close to [`REFERENCE_NS_PER_UNIT`] at any clock setting.

use bitbus_hal::delay::REFERENCE_NS_PER_UNIT;
use bitbus_hal::UnitDelay;

/// RP2040 default system clock
pub const DEFAULT_SYS_CLK_HZ: u32 = 125_000_000;

/// `UnitDelay` for Cortex-M0+ cores
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct CycleDelay {
    /// CPU cycles per 1000 units
    millicycles_per_unit: u32,
}

impl CycleDelay {
    /// Delay calibrated for a system clock of `sys_clk_hz`
    pub const fn new(sys_clk_hz: u32) -> Self {
        Self {
            millicycles_per_unit: millicycles_per_unit(sys_clk_hz, REFERENCE_NS_PER_UNIT),
        }
    }

    /// Delay calibrated for the clock embassy configured
    pub fn from_clocks() -> Self {
        Self::new(embassy_rp::clocks::clk_sys_freq())
    }

    /// Cycles spent for `units`
    pub const fn cycles(&self, units: u32) -> u32 {
        let cycles = units as u64 * self.millicycles_per_unit as u64 / 1000;
        if cycles > u32::MAX as u64 {
            u32::MAX
        } else {
            cycles as u32
        }
    }
}

impl Default for CycleDelay {
    fn default() -> Self {
        Self::new(DEFAULT_SYS_CLK_HZ)
    }
}

impl UnitDelay for CycleDelay {
    fn delay_units(&mut self, units: u32) {
        let cycles = self.cycles(units);
        if cycles > 0 {
            cortex_m::asm::delay(cycles);
        }
    }
}

const fn millicycles_per_unit(sys_clk_hz: u32, ns_per_unit: u32) -> u32 {
    // cycles/unit = Hz * ns / 1e9; scaled by 1000
    (sys_clk_hz as u64 * ns_per_unit as u64 / 1_000_000) as u32
}
