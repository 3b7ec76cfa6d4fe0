//! Bus session helpers
//!
//! [`BusHandle`] is the public face of the crate: it owns the wire, remembers
//! the target address and runs whole transactions. Any failure after START
//! ends the transaction on the spot (STOP attempt, then both lines
//! released) before the error reaches the caller.

mod eh;
mod recover;
mod scan;

pub use recover::Recovery;
pub use scan::ScanReport;

use bitbus_hal::{GpioSubsystem, I2cBus, UnitDelay};

use crate::config::{check_address, BusConfig, NackPolicy};
use crate::error::{Error, NackSource};
use crate::timing::Timing;
use crate::transfer::Ack;
use crate::wire::Wire;

/// Address byte on the wire: 7-bit address plus R/W in the LSB
pub const fn address_byte(address: u8, read: bool) -> u8 {
    (address << 1) | read as u8
}

/// An open bit-banged bus targeting one peripheral
pub struct BusHandle<G, D> {
    wire: Wire<G, D>,
    address: u8,
    nack_policy: NackPolicy,
}

impl<G: GpioSubsystem, D: UnitDelay> BusHandle<G, D> {
    /// Validate `config`, initialize the GPIO subsystem and idle the bus
    ///
    /// Both lines end up released with their output latch low.
    pub fn open(mut gpio: G, delay: D, config: BusConfig) -> Result<Self, Error> {
        config.validate()?;

        if !gpio.init() {
            error!("GPIO subsystem init failed");
            return Err(Error::SubsystemInitFailed);
        }

        let mut wire = Wire::new(gpio, delay, config.sda, config.scl, config.timing());
        wire.park();

        info!(
            "bus open: addr {=u8:#x}, sda {}, scl {}, bit delay {}",
            config.address, config.sda, config.scl, config.bit_delay
        );

        Ok(Self {
            wire,
            address: config.address,
            nack_policy: config.nack_policy,
        })
    }

    /// Retarget the handle at another peripheral
    pub fn set_address(&mut self, address: u8) -> Result<(), Error> {
        self.address = check_address(address)?;
        Ok(())
    }

    pub fn set_nack_policy(&mut self, policy: NackPolicy) {
        self.nack_policy = policy;
    }

    /// START, address (write), `value`, STOP
    pub fn write_byte(&mut self, value: u8) -> Result<(), Error> {
        self.write_to(self.address, &[value])
    }

    /// START, address (write), every byte of `bytes`, STOP
    pub fn write_buffer(&mut self, bytes: &[u8]) -> Result<(), Error> {
        self.write_to(self.address, bytes)
    }

    /// START, address (read), one byte answered with NACK, STOP
    pub fn read_byte(&mut self) -> Result<u8, Error> {
        let mut buf = [0u8];
        self.read_from(self.address, &mut buf)?;
        Ok(buf[0])
    }

    /// Fill `buf`, acknowledging every byte but the last
    ///
    /// An empty `buf` puts nothing on the bus.
    pub fn read_buffer(&mut self, buf: &mut [u8]) -> Result<(), Error> {
        self.read_from(self.address, buf)
    }

    /// Read `buf.len() - 1` bytes and NUL-terminate them
    ///
    /// Returns the number of bytes read. An empty buffer reads nothing; a
    /// one-byte buffer only gets the NUL.
    pub fn read_buffer_nul(&mut self, buf: &mut [u8]) -> Result<usize, Error> {
        let Some((terminator, data)) = buf.split_last_mut() else {
            return Ok(0);
        };
        self.read_from(self.address, data)?;
        *terminator = 0;
        Ok(data.len())
    }

    /// Write `bytes`, then read into `buf` after a repeated START
    pub fn write_read(&mut self, bytes: &[u8], buf: &mut [u8]) -> Result<(), Error> {
        self.write_read_at(self.address, bytes, buf)
    }

    fn write_to(&mut self, address: u8, bytes: &[u8]) -> Result<(), Error> {
        check_address(address)?;
        self.guarded(|bus| {
            bus.begin(address, false)?;
            bus.send_all(bytes)?;
            bus.wire.stop()
        })
    }

    fn read_from(&mut self, address: u8, buf: &mut [u8]) -> Result<(), Error> {
        check_address(address)?;
        // An addressed read must end on a NACKed byte or the peer keeps SDA
        if buf.is_empty() {
            return Ok(());
        }
        self.guarded(|bus| {
            bus.begin(address, true)?;
            bus.recv_all(buf, true)?;
            bus.wire.stop()
        })
    }

    fn write_read_at(&mut self, address: u8, bytes: &[u8], buf: &mut [u8]) -> Result<(), Error> {
        if buf.is_empty() {
            return self.write_to(address, bytes);
        }
        check_address(address)?;
        self.guarded(|bus| {
            bus.begin(address, false)?;
            bus.send_all(bytes)?;
            bus.wire.restart()?;
            bus.address_phase(address, true)?;
            bus.recv_all(buf, true)?;
            bus.wire.stop()
        })
    }

    /// START followed by the address byte
    fn begin(&mut self, address: u8, read: bool) -> Result<(), Error> {
        self.wire.start()?;
        self.address_phase(address, read)
    }

    fn address_phase(&mut self, address: u8, read: bool) -> Result<(), Error> {
        let ack = self.wire.send(address_byte(address, read))?;
        self.check_ack(ack, NackSource::Address)
    }

    fn send_all(&mut self, bytes: &[u8]) -> Result<(), Error> {
        for &byte in bytes {
            let ack = self.wire.send(byte)?;
            self.check_ack(ack, NackSource::Data)?;
        }
        Ok(())
    }

    /// Receive into `buf`; with `nack_last` the final byte is answered with NACK
    fn recv_all(&mut self, buf: &mut [u8], nack_last: bool) -> Result<(), Error> {
        let last = buf.len().saturating_sub(1);
        for (index, slot) in buf.iter_mut().enumerate() {
            let ack = if nack_last && index == last {
                Ack::Nack
            } else {
                Ack::Ack
            };
            *slot = self.wire.recv(ack)?;
        }
        Ok(())
    }

    fn check_ack(&self, ack: Ack, source: NackSource) -> Result<(), Error> {
        if ack.is_ack() {
            return Ok(());
        }
        match self.nack_policy {
            NackPolicy::Abort => Err(Error::Nack(source)),
            NackPolicy::Ignore => {
                warn!("ignoring NACK on {} byte", source);
                Ok(())
            }
        }
    }

    /// Run a transaction, cleaning up the bus if it fails midway
    fn guarded<T>(&mut self, op: impl FnOnce(&mut Self) -> Result<T, Error>) -> Result<T, Error> {
        let result = op(self);
        if let Err(e) = result {
            debug!("transaction failed: {}", e);
            self.abort();
        }
        result
    }

    /// Best-effort STOP, then release both lines
    ///
    /// Nothing happens if the master is not holding either line (the
    /// transaction never got past the bus-free check).
    fn abort(&mut self) {
        if !self.wire.is_holding() {
            return;
        }
        self.wire.lower_clock();
        self.wire.wait();
        if self.wire.stop().is_err() {
            warn!("STOP failed while aborting, releasing lines");
        }
        self.wire.release_all();
    }
}

impl<G, D> BusHandle<G, D> {
    /// Current 7-bit target address
    pub fn address(&self) -> u8 {
        self.address
    }

    pub fn nack_policy(&self) -> NackPolicy {
        self.nack_policy
    }

    pub fn timing(&self) -> Timing {
        self.wire.timing()
    }

    pub fn wire(&self) -> &Wire<G, D> {
        &self.wire
    }

    /// Bit-level access for sequences the helpers don't cover
    pub fn wire_mut(&mut self) -> &mut Wire<G, D> {
        &mut self.wire
    }

    pub fn gpio(&self) -> &G {
        self.wire.gpio()
    }

    pub fn gpio_mut(&mut self) -> &mut G {
        self.wire.gpio_mut()
    }

    /// Close the handle and give back the GPIO subsystem and delay
    pub fn release(self) -> (G, D) {
        self.wire.into_parts()
    }
}

impl<G: GpioSubsystem, D: UnitDelay> I2cBus for BusHandle<G, D> {
    type Error = Error;

    fn write(&mut self, address: u8, data: &[u8]) -> Result<(), Self::Error> {
        self.write_to(address, data)
    }

    fn read(&mut self, address: u8, buf: &mut [u8]) -> Result<(), Self::Error> {
        self.read_from(address, buf)
    }

    fn write_read(
        &mut self,
        address: u8,
        write_data: &[u8],
        read_buf: &mut [u8],
    ) -> Result<(), Self::Error> {
        self.write_read_at(address, write_data, read_buf)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bitbus_hal::{Direction, Level};
    use proptest::prelude::*;

    use crate::line::LineState;
    use crate::sim::{BusEvent, SimBus, SimDelay, SimDevice};

    fn open(bus: SimBus, config: BusConfig) -> BusHandle<SimBus, SimDelay> {
        BusHandle::open(bus, SimDelay::new(), config).unwrap()
    }

    fn config() -> BusConfig {
        BusConfig::new(0x21, 2, 3).with_bit_delay(300).with_stretch_timeout(16)
    }

    #[test]
    fn test_write_buffer_end_to_end() {
        let config = BusConfig::new(0x21, 2, 3)
            .with_bit_delay(300)
            .with_stretch_timeout(1_000_000);
        let mut bus = open(SimBus::new(2, 3).with_device(SimDevice::new(0x21)), config);

        bus.write_buffer(&[0x01, 0x01]).unwrap();

        assert_eq!(
            bus.gpio().transcript(),
            &[
                BusEvent::Start,
                BusEvent::Write(0x42, Ack::Ack),
                BusEvent::Write(0x01, Ack::Ack),
                BusEvent::Write(0x01, Ack::Ack),
                BusEvent::Stop,
            ]
        );
        assert_eq!(bus.gpio().device(0x21).unwrap().received(), &[0x01, 0x01]);
        assert_eq!(bus.gpio().unset_reads(), 0);
    }

    #[test]
    fn test_open_parks_lines() {
        let bus = open(SimBus::new(2, 3), config());

        assert_eq!(bus.gpio().init_calls(), 1);
        for pin in [2, 3] {
            assert_eq!(bus.gpio().latch(pin), Some(Level::Low));
            assert_eq!(bus.gpio().direction(pin), Some(Direction::Input));
        }
        assert_eq!(bus.wire().sda().state(), LineState::Released);
        assert_eq!(bus.address(), 0x21);
        assert_eq!(bus.timing(), Timing::new(300, 16));
    }

    #[test]
    fn test_open_reports_init_failure() {
        let result = BusHandle::open(SimBus::new(2, 3).with_failing_init(), SimDelay::new(), config());
        assert!(matches!(result, Err(Error::SubsystemInitFailed)));
    }

    #[test]
    fn test_open_rejects_bad_config() {
        let result = BusHandle::open(SimBus::new(2, 2), SimDelay::new(), BusConfig::new(0x21, 2, 2));
        assert!(matches!(result, Err(Error::SharedLine(2))));

        let result = BusHandle::open(SimBus::new(2, 3), SimDelay::new(), BusConfig::new(0x90, 2, 3));
        assert!(matches!(result, Err(Error::InvalidAddress(0x90))));
    }

    #[test]
    fn test_read_buffer_nacks_last_byte() {
        let device = SimDevice::new(0x21).with_response(&[1, 2, 3]);
        let mut bus = open(SimBus::new(2, 3).with_device(device), config());

        let mut buf = [0u8; 3];
        bus.read_buffer(&mut buf).unwrap();
        assert_eq!(buf, [1, 2, 3]);
        assert_eq!(
            bus.gpio().transcript(),
            &[
                BusEvent::Start,
                BusEvent::Write(0x43, Ack::Ack),
                BusEvent::Read(1, Ack::Ack),
                BusEvent::Read(2, Ack::Ack),
                BusEvent::Read(3, Ack::Nack),
                BusEvent::Stop,
            ]
        );
    }

    #[test]
    fn test_read_buffer_nul_terminates() {
        let device = SimDevice::new(0x21).with_response(b"hi!");
        let mut bus = open(SimBus::new(2, 3).with_device(device), config());

        let mut buf = [0xAAu8; 4];
        assert_eq!(bus.read_buffer_nul(&mut buf), Ok(3));
        assert_eq!(&buf, b"hi!\0");

        assert_eq!(bus.read_buffer_nul(&mut []), Ok(0));
    }

    #[test]
    fn test_empty_reads_stay_off_the_bus() {
        // A peripheral that would pull SDA low for its first bit
        let device = SimDevice::new(0x21).with_response(&[0x00, 0x00]);
        let mut bus = open(SimBus::new(2, 3).with_device(device), config());

        assert_eq!(bus.read_buffer(&mut []), Ok(()));
        let mut buf = [0xAAu8; 1];
        assert_eq!(bus.read_buffer_nul(&mut buf), Ok(0));
        assert_eq!(buf, [0]);
        assert!(bus.gpio().transcript().is_empty());

        assert_eq!(bus.write_byte(1), Ok(()));
        assert!(bus.wire_mut().is_free());
    }

    #[test]
    fn test_write_read_without_read_part() {
        let device = SimDevice::new(0x21).with_response(&[0x00]);
        let mut bus = open(SimBus::new(2, 3).with_device(device), config());

        assert_eq!(bus.write_read(&[0x10], &mut []), Ok(()));
        assert_eq!(
            bus.gpio().transcript(),
            &[
                BusEvent::Start,
                BusEvent::Write(0x42, Ack::Ack),
                BusEvent::Write(0x10, Ack::Ack),
                BusEvent::Stop,
            ]
        );
        assert!(bus.wire_mut().is_free());
    }

    #[test]
    fn test_peer_holding_sda_fails_the_stop() {
        let mut bus = open(SimBus::new(2, 3).with_device(SimDevice::new(0x21)), config());
        bus.write_byte(1).unwrap();

        // Wire-level access: leave the peripheral mid-read, driving a 0 bit
        bus.gpio_mut().device_mut(0x21).unwrap().queue_response(&[0x00]);
        let wire = bus.wire_mut();
        wire.start().unwrap();
        assert_eq!(wire.send(address_byte(0x21, true)), Ok(Ack::Ack));
        assert_eq!(wire.stop(), Err(Error::BusNotFree));
    }

    #[test]
    fn test_read_byte_from_idle_ddc_port() {
        // Nothing queued: the peripheral leaves SDA released
        let mut bus = open(SimBus::new(2, 3).with_device(SimDevice::new(0x21)), config());
        assert_eq!(bus.read_byte(), Ok(0xFF));
    }

    #[test]
    fn test_write_read_uses_repeated_start() {
        let device = SimDevice::new(0x21).with_response(&[0xBE, 0xEF]);
        let mut bus = open(SimBus::new(2, 3).with_device(device), config());

        let mut buf = [0u8; 2];
        bus.write_read(&[0x10], &mut buf).unwrap();
        assert_eq!(buf, [0xBE, 0xEF]);
        assert_eq!(
            bus.gpio().transcript(),
            &[
                BusEvent::Start,
                BusEvent::Write(0x42, Ack::Ack),
                BusEvent::Write(0x10, Ack::Ack),
                BusEvent::Restart,
                BusEvent::Write(0x43, Ack::Ack),
                BusEvent::Read(0xBE, Ack::Ack),
                BusEvent::Read(0xEF, Ack::Nack),
                BusEvent::Stop,
            ]
        );
    }

    #[test]
    fn test_address_nack_aborts() {
        let mut bus = open(SimBus::new(2, 3), config());

        assert_eq!(bus.write_byte(0x55), Err(Error::Nack(NackSource::Address)));
        assert_eq!(
            bus.gpio().transcript(),
            &[BusEvent::Start, BusEvent::Write(0x42, Ack::Nack), BusEvent::Stop]
        );
        assert!(!bus.wire().is_holding());
        assert!(bus.wire_mut().is_free());
    }

    #[test]
    fn test_data_nack_aborts() {
        let device = SimDevice::new(0x21).with_write_limit(1);
        let mut bus = open(SimBus::new(2, 3).with_device(device), config());

        assert_eq!(bus.write_buffer(&[1, 2, 3]), Err(Error::Nack(NackSource::Data)));
        assert_eq!(
            bus.gpio().transcript(),
            &[
                BusEvent::Start,
                BusEvent::Write(0x42, Ack::Ack),
                BusEvent::Write(1, Ack::Ack),
                BusEvent::Write(2, Ack::Nack),
                BusEvent::Stop,
            ]
        );
    }

    #[test]
    fn test_ignore_policy_carries_on() {
        let device = SimDevice::new(0x21).with_write_limit(1);
        let config = config().with_nack_policy(NackPolicy::Ignore);
        let mut bus = open(SimBus::new(2, 3).with_device(device), config);

        assert_eq!(bus.write_buffer(&[1, 2, 3]), Ok(()));
        assert_eq!(
            bus.gpio().transcript(),
            &[
                BusEvent::Start,
                BusEvent::Write(0x42, Ack::Ack),
                BusEvent::Write(1, Ack::Ack),
                BusEvent::Write(2, Ack::Nack),
                BusEvent::Write(3, Ack::Nack),
                BusEvent::Stop,
            ]
        );

        // Nobody home, still no error
        bus.set_address(0x30).unwrap();
        assert_eq!(bus.write_byte(0), Ok(()));
    }

    #[test]
    fn test_busy_bus_is_left_alone() {
        let mut bus = open(SimBus::new(2, 3).with_device(SimDevice::new(0x21)), config());
        bus.gpio_mut().hold_sda_low(true);

        assert_eq!(bus.write_byte(1), Err(Error::BusNotFree));
        assert!(bus.gpio().transcript().is_empty());
        assert!(!bus.wire().is_holding());
    }

    #[test]
    fn test_clock_held_mid_byte_releases_lines() {
        let sim = SimBus::new(2, 3)
            .with_device(SimDevice::new(0x21))
            .with_clock_stretch(40);
        let mut bus = open(sim, config());

        assert_eq!(bus.write_byte(1), Err(Error::ClockHeld));
        assert!(!bus.wire().is_holding());
        assert_eq!(bus.wire().scl().state(), LineState::Released);
        assert_eq!(bus.wire().sda().state(), LineState::Released);
    }

    #[test]
    fn test_set_address_validates() {
        let mut bus = open(SimBus::new(2, 3), config());
        assert_eq!(bus.set_address(0x80), Err(Error::InvalidAddress(0x80)));
        assert_eq!(bus.address(), 0x21);
        assert_eq!(bus.set_address(0x50), Ok(()));
        assert_eq!(bus.address(), 0x50);
    }

    #[test]
    fn test_i2c_bus_trait_uses_call_address() {
        let device = SimDevice::new(0x50).with_response(&[7]);
        let mut bus = open(SimBus::new(2, 3).with_device(device), config());

        I2cBus::write(&mut bus, 0x50, &[9]).unwrap();
        let mut buf = [0u8; 1];
        I2cBus::read(&mut bus, 0x50, &mut buf).unwrap();
        assert_eq!(buf, [7]);
        assert_eq!(
            I2cBus::write(&mut bus, 0x90, &[9]),
            Err(Error::InvalidAddress(0x90))
        );
        // The handle's own target is untouched
        assert_eq!(bus.address(), 0x21);
    }

    #[test]
    fn test_release_returns_parts() {
        let bus = open(SimBus::new(2, 3), config());
        let (gpio, _delay) = bus.release();
        assert_eq!(gpio.direction(2), Some(Direction::Input));
    }

    proptest! {
        #[test]
        fn prop_address_byte_on_wire(address in 0u8..=0x7F) {
            let device = SimDevice::new(address).with_response(&[0x5A]);
            let config = BusConfig::new(address, 2, 3).with_bit_delay(2).with_stretch_timeout(4);
            let mut bus = open(SimBus::new(2, 3).with_device(device), config);

            bus.write_byte(0).unwrap();
            prop_assert_eq!(bus.gpio().transcript()[1], BusEvent::Write(address << 1, Ack::Ack));

            bus.gpio_mut().clear_transcript();
            prop_assert_eq!(bus.read_byte(), Ok(0x5A));
            prop_assert_eq!(
                bus.gpio().transcript()[1],
                BusEvent::Write((address << 1) | 1, Ack::Ack)
            );
        }
    }
}
