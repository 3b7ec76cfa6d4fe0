//! NMEA-0183 over a bit-banged I2C bus
//!
//! GNSS receivers such as the u-blox family expose their NMEA stream on an
//! I2C port (DDC). This crate turns the byte stream into checked sentences.
//!
//! # Stream Overview
//!
//! ```text
//! ┌───┬──────────────────────────────┬───┬────┬──────┐
//! │ $ │ GPGGA,123519,4807.038,N,...  │ * │ HH │ \r\n │
//! └───┴──────────────────────────────┴───┴────┴──────┘
//!       body (XOR-summed)                  hex checksum
//! ```
//!
//! An idle DDC port reads as 0xFF, which ends a poll.
//!
//! ```ignore
//! use bitbus_core::{BusHandle, BusSpeed};
//! use bitbus_nmea::{ddc_config, NmeaReader};
//!
//! let bus = BusHandle::open(gpio, delay, ddc_config(BusSpeed::STANDARD))?;
//! let mut reader = NmeaReader::new(bus);
//! loop {
//!     if let Ok(Some(sentence)) = reader.poll() {
//!         // ...
//!     }
//!     // sleep ~100 ms
//! }
//! ```

#![no_std]
#![deny(unsafe_code)]

// proptest's assertion macros expect `format!` in scope
#[cfg(test)]
#[macro_use]
extern crate std;

pub mod parser;
pub mod reader;
pub mod sentence;

pub use parser::{SentenceParser, IDLE_FILLER};
pub use reader::{ddc_config, ByteSource, NmeaReader, ReadError, UBLOX_DDC_ADDRESS};
pub use sentence::{checksum, Sentence, SentenceError, MAX_SENTENCE_LEN};
