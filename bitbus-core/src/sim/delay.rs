use bitbus_hal::UnitDelay;

/// Delay that only counts the units it was asked to wait
#[derive(Debug, Clone, Default)]
pub struct SimDelay {
    total_units: u64,
    calls: u32,
}

impl SimDelay {
    pub const fn new() -> Self {
        Self {
            total_units: 0,
            calls: 0,
        }
    }

    /// Sum of every requested delay
    pub fn total_units(&self) -> u64 {
        self.total_units
    }

    pub fn calls(&self) -> u32 {
        self.calls
    }
}

impl UnitDelay for SimDelay {
    fn delay_units(&mut self, units: u32) {
        self.total_units += u64::from(units);
        self.calls += 1;
    }
}
