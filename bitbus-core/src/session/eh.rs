//! `embedded-hal` I2C implementation
//!
//! Lets ecosystem device drivers run on the bit-banged bus. Adjacent
//! operations of the same direction share one address phase; each change
//! of direction gets a repeated START and a fresh address byte. Empty reads
//! are skipped: a read group has to end on a NACKed byte or the peripheral
//! keeps driving SDA.

use bitbus_hal::{GpioSubsystem, UnitDelay};
use embedded_hal::i2c::{ErrorType, I2c, Operation};

use super::BusHandle;
use crate::config::check_address;
use crate::error::Error;

fn is_read(op: &Operation<'_>) -> bool {
    matches!(op, Operation::Read(_))
}

fn is_empty_read(op: &Operation<'_>) -> bool {
    matches!(op, Operation::Read(buf) if buf.is_empty())
}

impl<G: GpioSubsystem, D: UnitDelay> ErrorType for BusHandle<G, D> {
    type Error = Error;
}

impl<G: GpioSubsystem, D: UnitDelay> I2c for BusHandle<G, D> {
    fn transaction(
        &mut self,
        address: u8,
        operations: &mut [Operation<'_>],
    ) -> Result<(), Self::Error> {
        check_address(address)?;
        if operations.iter().all(|op| is_empty_read(op)) {
            return Ok(());
        }

        self.guarded(|bus| {
            let mut direction = None;
            for index in 0..operations.len() {
                if is_empty_read(&operations[index]) {
                    continue;
                }
                let reading = is_read(&operations[index]);
                // A read group only NACKs its last byte when the group ends here
                let next_reads = operations[index + 1..]
                    .iter()
                    .find(|op| !is_empty_read(op))
                    .is_some_and(is_read);

                if direction != Some(reading) {
                    if direction.is_none() {
                        bus.wire.start()?;
                    } else {
                        bus.wire.restart()?;
                    }
                    bus.address_phase(address, reading)?;
                    direction = Some(reading);
                }

                match &mut operations[index] {
                    Operation::Write(bytes) => bus.send_all(bytes)?,
                    Operation::Read(buf) => bus.recv_all(buf, !next_reads)?,
                }
            }
            bus.wire.stop()
        })
    }
}
