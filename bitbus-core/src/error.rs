//! Bus error types

use embedded_hal::i2c::{ErrorKind, NoAcknowledgeSource};

/// Which byte of a transaction was not acknowledged
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum NackSource {
    /// The address byte (no device answered)
    Address,
    /// A data byte after the address
    Data,
}

/// Errors raised by the bit-banged bus
///
/// All of these are recoverable: none of them leave the handle unusable,
/// and the handle releases both lines before returning a mid-transaction
/// failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error {
    /// GPIO subsystem could not be initialized
    SubsystemInitFailed,
    /// SDA and SCL did not both read high within the stretch budget
    BusNotFree,
    /// A peripheral kept SCL low for longer than the stretch budget
    ClockHeld,
    /// A peripheral did not acknowledge a byte
    Nack(NackSource),
    /// Address does not fit in 7 bits
    InvalidAddress(u8),
    /// SDA and SCL were assigned the same GPIO line
    SharedLine(u8),
    /// Bit delay must be at least one unit
    ZeroBitDelay,
}

impl core::fmt::Display for Error {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Error::SubsystemInitFailed => f.write_str("GPIO subsystem initialization failed"),
            Error::BusNotFree => f.write_str("bus not free"),
            Error::ClockHeld => f.write_str("clock line held low by peripheral"),
            Error::Nack(NackSource::Address) => f.write_str("address not acknowledged"),
            Error::Nack(NackSource::Data) => f.write_str("data not acknowledged"),
            Error::InvalidAddress(addr) => write!(f, "invalid 7-bit address {addr:#04x}"),
            Error::SharedLine(line) => write!(f, "SDA and SCL both assigned to line {line}"),
            Error::ZeroBitDelay => f.write_str("bit delay must be non-zero"),
        }
    }
}

impl From<NackSource> for NoAcknowledgeSource {
    fn from(source: NackSource) -> Self {
        match source {
            NackSource::Address => NoAcknowledgeSource::Address,
            NackSource::Data => NoAcknowledgeSource::Data,
        }
    }
}

impl embedded_hal::i2c::Error for Error {
    fn kind(&self) -> ErrorKind {
        match self {
            Error::BusNotFree => ErrorKind::Bus,
            Error::Nack(source) => ErrorKind::NoAcknowledge((*source).into()),
            _ => ErrorKind::Other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use embedded_hal::i2c::Error as _;

    #[test]
    fn test_error_kind_mapping() {
        assert_eq!(Error::BusNotFree.kind(), ErrorKind::Bus);
        assert_eq!(
            Error::Nack(NackSource::Address).kind(),
            ErrorKind::NoAcknowledge(NoAcknowledgeSource::Address)
        );
        assert_eq!(
            Error::Nack(NackSource::Data).kind(),
            ErrorKind::NoAcknowledge(NoAcknowledgeSource::Data)
        );
        assert_eq!(Error::ClockHeld.kind(), ErrorKind::Other);
    }

    #[test]
    fn test_display() {
        use alloc::string::ToString;

        assert_eq!(
            Error::InvalidAddress(0x80).to_string(),
            "invalid 7-bit address 0x80"
        );
        assert_eq!(
            Error::ClockHeld.to_string(),
            "clock line held low by peripheral"
        );
    }
}
