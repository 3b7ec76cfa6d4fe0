//! I2C bus abstractions
//!
//! Provides the master-side trait implemented by the bit-banged bus and
//! the speed presets used to pick a bit delay.

/// I2C bus master
///
/// Provides basic I2C read/write operations for communicating with
/// peripheral devices.
pub trait I2cBus {
    /// Error type for I2C operations
    type Error;

    /// Write data to a device at the given address
    ///
    /// # Arguments
    /// * `address` - 7-bit I2C address
    /// * `data` - Bytes to write
    fn write(&mut self, address: u8, data: &[u8]) -> Result<(), Self::Error>;

    /// Read data from a device at the given address
    ///
    /// # Arguments
    /// * `address` - 7-bit I2C address
    /// * `buf` - Buffer to read into
    fn read(&mut self, address: u8, buf: &mut [u8]) -> Result<(), Self::Error>;

    /// Write then read in a single transaction (repeated start)
    ///
    /// This is commonly used to write a register address then read data.
    ///
    /// # Arguments
    /// * `address` - 7-bit I2C address
    /// * `write_data` - Bytes to write (typically register address)
    /// * `read_buf` - Buffer to read into
    fn write_read(
        &mut self,
        address: u8,
        write_data: &[u8],
        read_buf: &mut [u8],
    ) -> Result<(), Self::Error>;
}

/// Bus speed presets
///
/// Each preset maps to a bit delay in units, calibrated against
/// [`crate::delay::REFERENCE_NS_PER_UNIT`]. The mapping is not linear
/// because per-bit software overhead dominates at the faster settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BusSpeed {
    Kbps50,
    #[default]
    Kbps100,
    Kbps200,
    Kbps300,
    Kbps400,
}

impl BusSpeed {
    /// Standard mode (100 kHz)
    pub const STANDARD: Self = Self::Kbps100;

    /// Fast mode (400 kHz)
    pub const FAST: Self = Self::Kbps400;

    /// Bit delay in units for this preset
    pub const fn bit_delay(self) -> u32 {
        match self {
            BusSpeed::Kbps50 => 500,
            BusSpeed::Kbps100 => 250,
            BusSpeed::Kbps200 => 100,
            BusSpeed::Kbps300 => 50,
            BusSpeed::Kbps400 => 23,
        }
    }

    /// Nominal clock frequency in Hz
    pub const fn frequency(self) -> u32 {
        match self {
            BusSpeed::Kbps50 => 50_000,
            BusSpeed::Kbps100 => 100_000,
            BusSpeed::Kbps200 => 200_000,
            BusSpeed::Kbps300 => 300_000,
            BusSpeed::Kbps400 => 400_000,
        }
    }

    /// Look up a preset by its kbit/s figure
    pub fn from_kbps(kbps: u32) -> Option<Self> {
        match kbps {
            50 => Some(BusSpeed::Kbps50),
            100 => Some(BusSpeed::Kbps100),
            200 => Some(BusSpeed::Kbps200),
            300 => Some(BusSpeed::Kbps300),
            400 => Some(BusSpeed::Kbps400),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preset_delays() {
        assert_eq!(BusSpeed::from_kbps(50).map(BusSpeed::bit_delay), Some(500));
        assert_eq!(BusSpeed::from_kbps(100).map(BusSpeed::bit_delay), Some(250));
        assert_eq!(BusSpeed::from_kbps(200).map(BusSpeed::bit_delay), Some(100));
        assert_eq!(BusSpeed::from_kbps(300).map(BusSpeed::bit_delay), Some(50));
        assert_eq!(BusSpeed::from_kbps(400).map(BusSpeed::bit_delay), Some(23));
    }

    #[test]
    fn test_unknown_speed() {
        assert_eq!(BusSpeed::from_kbps(0), None);
        assert_eq!(BusSpeed::from_kbps(1000), None);
    }

    #[test]
    fn test_slower_means_longer_delay() {
        let presets = [
            BusSpeed::Kbps50,
            BusSpeed::Kbps100,
            BusSpeed::Kbps200,
            BusSpeed::Kbps300,
            BusSpeed::Kbps400,
        ];
        for pair in presets.windows(2) {
            assert!(pair[0].bit_delay() > pair[1].bit_delay());
            assert!(pair[0].frequency() < pair[1].frequency());
        }
        assert_eq!(BusSpeed::default(), BusSpeed::STANDARD);
    }
}
