//! Bus scan
//!
//! Probes each 7-bit address with an address-only write transaction and
//! records which ones acknowledge. A NACK here is an answer, not an error.
//!
//! [`BusHandle::scan`] takes its range as 8-bit wire addresses, the way
//! i2cdetect-style tools are usually driven; [`BusHandle::scan_addresses`]
//! takes 7-bit addresses directly.

use core::fmt;

use bitbus_hal::{GpioSubsystem, UnitDelay};

use super::{address_byte, BusHandle};
use crate::config::MAX_ADDRESS;
use crate::error::Error;

/// Addresses that answered a scan, plus the range that was probed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ScanReport {
    present: u128,
    first: u8,
    last: u8,
}

impl ScanReport {
    /// Empty report for `first..=last`, with `last` clamped to 0x7F
    pub fn new(first: u8, last: u8) -> Self {
        Self {
            present: 0,
            first,
            last: last.min(MAX_ADDRESS),
        }
    }

    /// First probed address
    pub fn first(&self) -> u8 {
        self.first
    }

    /// Last probed address
    pub fn last(&self) -> u8 {
        self.last
    }

    /// Address lies inside the probed range
    pub fn in_range(&self, address: u8) -> bool {
        (self.first..=self.last).contains(&address)
    }

    pub fn is_present(&self, address: u8) -> bool {
        address <= MAX_ADDRESS && self.present & (1u128 << address) != 0
    }

    pub(crate) fn mark(&mut self, address: u8) {
        if self.in_range(address) {
            self.present |= 1u128 << address;
        }
    }

    /// Present addresses in ascending order
    pub fn iter(&self) -> impl Iterator<Item = u8> + '_ {
        (0..=MAX_ADDRESS).filter(move |&address| self.is_present(address))
    }

    /// Number of present addresses
    pub fn count(&self) -> usize {
        self.present.count_ones() as usize
    }

    pub fn is_empty(&self) -> bool {
        self.present == 0
    }

    /// Present addresses collected into a fixed-capacity list
    pub fn addresses(&self) -> heapless::Vec<u8, 128> {
        self.iter().collect()
    }
}

/// i2cdetect-style grid: `--` for silence, the address for an answer,
/// blanks outside the probed range
impl fmt::Display for ScanReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("     0  1  2  3  4  5  6  7  8  9  a  b  c  d  e  f\n")?;
        for row in (0..=MAX_ADDRESS).step_by(16) {
            write!(f, "{row:02x}: ")?;
            for address in row..row + 16 {
                if !self.in_range(address) {
                    f.write_str("   ")?;
                } else if self.is_present(address) {
                    write!(f, "{address:02x} ")?;
                } else {
                    f.write_str("-- ")?;
                }
            }
            f.write_str("\n")?;
        }
        Ok(())
    }
}

impl<G: GpioSubsystem, D: UnitDelay> BusHandle<G, D> {
    /// Probe every device whose write address byte lies in `first..=last`
    ///
    /// Only even wire bytes are sent; an odd one is the read form of the
    /// address below it. `scan(0x10, 0xE0)` covers 7-bit 0x08 to 0x70.
    pub fn scan(&mut self, first: u8, last: u8) -> Result<ScanReport, Error> {
        let first = (first >> 1) + (first & 1);
        self.scan_addresses(first, last >> 1)
    }

    /// Probe every 7-bit address in `first..=last`
    ///
    /// `last` is clamped to 0x7F. Only bus faults (`BusNotFree`,
    /// `ClockHeld`) are errors; absent devices just don't show up.
    pub fn scan_addresses(&mut self, first: u8, last: u8) -> Result<ScanReport, Error> {
        let mut report = ScanReport::new(first, last);
        if first > report.last() {
            return Ok(report);
        }

        for address in first..=report.last() {
            let ack = self.guarded(|bus| {
                bus.wire.start()?;
                let ack = bus.wire.send(address_byte(address, false))?;
                bus.wire.stop()?;
                Ok(ack)
            })?;

            if ack.is_ack() {
                debug!("device at {=u8:#04x}", address);
                report.mark(address);
            }
        }

        info!("scan found {} device(s)", report.count());
        Ok(report)
    }
}
