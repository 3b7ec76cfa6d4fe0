//! Byte transfer engine
//!
//! Bytes go out MSB first, followed by a ninth clock carrying the
//! acknowledge bit from the receiver. Both directions expect SCL low on
//! entry and leave it low on return, so the bus stays owned.

use bitbus_hal::{GpioSubsystem, Level, UnitDelay};

use crate::error::Error;
use crate::wire::Wire;

/// Acknowledge bit on the ninth clock
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Ack {
    /// SDA pulled low by the receiver
    Ack,
    /// SDA left high by the receiver
    Nack,
}

impl Ack {
    /// Decode the sampled SDA level (low = ACK)
    pub const fn from_level(level: Level) -> Self {
        match level {
            Level::Low => Ack::Ack,
            Level::High => Ack::Nack,
        }
    }

    /// Raw bit value on the wire: 0 for ACK, 1 for NACK
    pub const fn bit(self) -> u8 {
        match self {
            Ack::Ack => 0,
            Ack::Nack => 1,
        }
    }

    pub const fn is_ack(self) -> bool {
        matches!(self, Ack::Ack)
    }

    pub const fn is_nack(self) -> bool {
        matches!(self, Ack::Nack)
    }
}

impl<G: GpioSubsystem, D: UnitDelay> Wire<G, D> {
    /// Clock out one byte and return the receiver's acknowledge bit
    pub fn send(&mut self, byte: u8) -> Result<Ack, Error> {
        for bit in (0..8).rev() {
            self.wait();
            self.set_data(byte & (1 << bit) != 0);
            self.raise_clock()?;
            self.wait();
            self.lower_clock();
        }

        // Hand SDA to the receiver for the acknowledge bit
        self.release_data();
        self.wait();
        self.raise_clock()?;
        self.wait();
        let ack = Ack::from_level(self.sda.level(&mut self.gpio));
        self.lower_clock();

        trace!("sent {=u8:#x}, ack bit {}", byte, ack.bit());
        Ok(ack)
    }

    /// Clock in one byte, then answer with `ack`
    ///
    /// Use [`Ack::Ack`] when more bytes are wanted and [`Ack::Nack`] on the
    /// last byte of a read.
    pub fn recv(&mut self, ack: Ack) -> Result<u8, Error> {
        self.release_data();

        let mut byte = 0u8;
        for _ in 0..8 {
            self.wait();
            self.raise_clock()?;
            self.wait();
            byte <<= 1;
            if self.data_is_high() {
                byte |= 1;
            }
            self.lower_clock();
        }

        self.wait();
        self.set_data(ack.is_nack());
        self.wait();
        self.raise_clock()?;
        self.wait();
        self.lower_clock();
        self.release_data();

        trace!("received {=u8:#x}, answered ack bit {}", byte, ack.bit());
        Ok(byte)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    use crate::sim::{BusEvent, SimBus, SimDelay, SimDevice};
    use crate::timing::Timing;

    fn wire(bus: SimBus) -> Wire<SimBus, SimDelay> {
        let mut wire = Wire::new(bus, SimDelay::new(), 2, 3, Timing::new(4, 16));
        wire.park();
        wire
    }

    #[test]
    fn test_ack_from_level() {
        assert_eq!(Ack::from_level(Level::Low), Ack::Ack);
        assert_eq!(Ack::from_level(Level::High), Ack::Nack);
        assert_eq!(Ack::Ack.bit(), 0);
        assert_eq!(Ack::Nack.bit(), 1);
    }

    #[test]
    fn test_send_address_to_present_device() {
        let mut wire = wire(SimBus::new(2, 3).with_device(SimDevice::new(0x21)));
        wire.start().unwrap();
        assert_eq!(wire.send(0x42), Ok(Ack::Ack));
        wire.stop().unwrap();

        assert_eq!(
            wire.gpio().transcript(),
            &[BusEvent::Start, BusEvent::Write(0x42, Ack::Ack), BusEvent::Stop]
        );
    }

    #[test]
    fn test_send_address_to_empty_bus() {
        let mut wire = wire(SimBus::new(2, 3));
        wire.start().unwrap();
        assert_eq!(wire.send(0x42), Ok(Ack::Nack));
    }

    #[test]
    fn test_send_leaves_clock_low_and_sda_released() {
        let mut wire = wire(SimBus::new(2, 3).with_device(SimDevice::new(0x21)));
        wire.start().unwrap();
        wire.send(0x42).unwrap();

        assert!(!wire.clock_is_high());
        assert_eq!(wire.sda().state(), crate::line::LineState::Released);
    }

    #[test]
    fn test_send_checks_stretch_on_every_bit() {
        let mut wire = wire(SimBus::new(2, 3).with_device(SimDevice::new(0x21)));
        wire.start().unwrap();
        wire.gpio_mut().set_clock_stretch(3);
        let before = wire.gpio().clock_samples();

        wire.send(0x42).unwrap();
        // 9 clocks, each held for 3 samples and seen high on the 4th
        assert_eq!(wire.gpio().clock_samples() - before, 9 * 4);
    }

    #[test]
    fn test_recv_ack_drives_sda_before_latch() {
        let device = SimDevice::new(0x21).with_response(&[0xA5, 0x5A]);
        let mut wire = wire(SimBus::new(2, 3).with_device(device));
        wire.start().unwrap();
        wire.send(0x43).unwrap();

        assert_eq!(wire.recv(Ack::Ack), Ok(0xA5));
        // SDA level at the last SCL rising edge is the ACK the master gave
        assert_eq!(wire.gpio().sda_at_clock_rises().last(), Some(&Level::Low));

        assert_eq!(wire.recv(Ack::Nack), Ok(0x5A));
        assert_eq!(wire.gpio().sda_at_clock_rises().last(), Some(&Level::High));
        wire.stop().unwrap();

        assert_eq!(
            wire.gpio().transcript(),
            &[
                BusEvent::Start,
                BusEvent::Write(0x43, Ack::Ack),
                BusEvent::Read(0xA5, Ack::Ack),
                BusEvent::Read(0x5A, Ack::Nack),
                BusEvent::Stop,
            ]
        );
    }

    #[test]
    fn test_recv_reports_clock_held() {
        let mut wire = wire(SimBus::new(2, 3).with_device(SimDevice::new(0x21)));
        wire.start().unwrap();
        wire.send(0x43).unwrap();
        wire.gpio_mut().hold_scl_low(true);

        assert_eq!(wire.recv(Ack::Nack), Err(Error::ClockHeld));
    }

    proptest! {
        #[test]
        fn prop_send_reaches_peer_msb_first(byte in any::<u8>()) {
            let mut wire = wire(SimBus::new(2, 3).with_device(SimDevice::new(0x21)));
            wire.start().unwrap();
            wire.send(0x42).unwrap();
            prop_assert_eq!(wire.send(byte), Ok(Ack::Ack));
            wire.stop().unwrap();

            prop_assert_eq!(wire.gpio().device(0x21).unwrap().received(), &[byte][..]);
        }

        #[test]
        fn prop_recv_reassembles_peer_byte(byte in any::<u8>()) {
            let device = SimDevice::new(0x21).with_response(&[byte]);
            let mut wire = wire(SimBus::new(2, 3).with_device(device));
            wire.start().unwrap();
            wire.send(0x43).unwrap();
            prop_assert_eq!(wire.recv(Ack::Nack), Ok(byte));
            wire.stop().unwrap();
        }
    }
}
