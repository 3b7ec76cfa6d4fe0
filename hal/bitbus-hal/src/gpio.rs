//! GPIO subsystem abstraction
//!
//! The bus engine never drives a line high. It only switches a line between
//! "output, latched low" and "input", and reads the resulting level. That is
//! the whole surface a platform has to provide.

/// Logic level on a line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Level {
    Low,
    High,
}

impl Level {
    /// Check if this is the high level
    pub const fn is_high(self) -> bool {
        matches!(self, Level::High)
    }

    /// Check if this is the low level
    pub const fn is_low(self) -> bool {
        matches!(self, Level::Low)
    }
}

impl From<bool> for Level {
    fn from(high: bool) -> Self {
        if high {
            Level::High
        } else {
            Level::Low
        }
    }
}

/// Pin direction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Direction {
    /// Pin drives its output latch onto the line
    Output,
    /// Pin is high-impedance; the line follows the pull-up or other drivers
    Input,
}

/// GPIO subsystem used by the bit-banged bus
///
/// Lines are identified by their platform GPIO number. Implementations
/// must tolerate any call order; the bus engine guarantees it only ever
/// writes `Level::Low` to a line before switching it to output.
pub trait GpioSubsystem {
    /// One-time initialization
    ///
    /// Returns `false` if the subsystem could not be brought up (missing
    /// register mapping, pins not owned, etc.).
    fn init(&mut self) -> bool;

    /// Configure the direction of a line
    fn set_direction(&mut self, line: u8, direction: Direction);

    /// Set the output latch of a line
    ///
    /// Only visible on the bus while the line is configured as output.
    fn write_level(&mut self, line: u8, level: Level);

    /// Read the current level of a line
    ///
    /// Valid regardless of the configured direction. Takes `&mut self`
    /// because some platforms (and the simulator) have side effects on read.
    fn read_level(&mut self, line: u8) -> Level;
}

impl<T: GpioSubsystem + ?Sized> GpioSubsystem for &mut T {
    fn init(&mut self) -> bool {
        (**self).init()
    }

    fn set_direction(&mut self, line: u8, direction: Direction) {
        (**self).set_direction(line, direction)
    }

    fn write_level(&mut self, line: u8, level: Level) {
        (**self).write_level(line, level)
    }

    fn read_level(&mut self, line: u8) -> Level {
        (**self).read_level(line)
    }
}
