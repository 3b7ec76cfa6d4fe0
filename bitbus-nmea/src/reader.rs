//! Polling sentence reader
//!
//! Pulls bytes from a [`ByteSource`] until a sentence completes or the
//! source reports it is idle, so a caller can poll on a timer and sleep in
//! between.

use bitbus_core::config::{DEFAULT_SCL, DEFAULT_SDA};
use bitbus_core::{BusConfig, BusHandle, BusSpeed, GpioSubsystem, UnitDelay};

use crate::parser::{SentenceParser, IDLE_FILLER};
use crate::sentence::{Sentence, SentenceError, MAX_SENTENCE_LEN};

/// DDC (I2C) address of u-blox GNSS receivers
pub const UBLOX_DDC_ADDRESS: u8 = 0x42;

/// Bus configuration for a u-blox receiver on the default lines
pub fn ddc_config(speed: BusSpeed) -> BusConfig {
    BusConfig::new(UBLOX_DDC_ADDRESS, DEFAULT_SDA, DEFAULT_SCL).with_speed(speed)
}

/// Something that yields one byte per call
pub trait ByteSource {
    type Error;

    fn next_byte(&mut self) -> Result<u8, Self::Error>;
}

impl<T: ByteSource + ?Sized> ByteSource for &mut T {
    type Error = T::Error;

    fn next_byte(&mut self) -> Result<u8, Self::Error> {
        (**self).next_byte()
    }
}

/// One single-byte read transaction per byte, as the DDC port expects
impl<G: GpioSubsystem, D: UnitDelay> ByteSource for BusHandle<G, D> {
    type Error = bitbus_core::Error;

    fn next_byte(&mut self) -> Result<u8, Self::Error> {
        self.read_byte()
    }
}

/// Errors from [`NmeaReader`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ReadError<E> {
    /// The byte source failed
    Source(E),
    /// A line was received but is not a valid sentence
    Sentence(SentenceError),
}

impl<E> From<SentenceError> for ReadError<E> {
    fn from(e: SentenceError) -> Self {
        ReadError::Sentence(e)
    }
}

impl<E: core::fmt::Display> core::fmt::Display for ReadError<E> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            ReadError::Source(e) => write!(f, "byte source error: {e}"),
            ReadError::Sentence(e) => write!(f, "{e}"),
        }
    }
}

/// Reads NMEA sentences from a byte source
pub struct NmeaReader<S> {
    source: S,
    parser: SentenceParser,
}

impl<S: ByteSource> NmeaReader<S> {
    pub fn new(source: S) -> Self {
        Self {
            source,
            parser: SentenceParser::new(),
        }
    }

    /// Read until a line ends or the source goes idle
    ///
    /// Returns `Ok(None)` when the source answered with idle filler before
    /// a line was complete. The line is returned unchecked.
    pub fn poll_line(&mut self) -> Result<Option<Sentence>, ReadError<S::Error>> {
        // A full line plus its CR LF
        for _ in 0..MAX_SENTENCE_LEN + 2 {
            let byte = self.source.next_byte().map_err(ReadError::Source)?;
            if let Some(sentence) = self.parser.feed(byte)? {
                return Ok(Some(sentence));
            }
            if byte == IDLE_FILLER {
                return Ok(None);
            }
        }
        Ok(None)
    }

    /// Like [`NmeaReader::poll_line`], but only returns sentences whose
    /// start marker and checksum are valid
    pub fn poll(&mut self) -> Result<Option<Sentence>, ReadError<S::Error>> {
        match self.poll_line()? {
            Some(sentence) => {
                sentence.validate()?;
                Ok(Some(sentence))
            }
            None => Ok(None),
        }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn source_mut(&mut self) -> &mut S {
        &mut self.source
    }

    /// Give back the byte source, dropping any partial line
    pub fn into_inner(self) -> S {
        self.source
    }
}
