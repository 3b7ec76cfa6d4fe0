//! Simulated two-wire bus for tests
//!
//! [`SimBus`] implements [`GpioSubsystem`] for exactly two lines and
//! resolves them like a wired-AND with pull-ups: a line is low if the
//! master drives it low, a peripheral pulls it, or a test holds it.
//! Every change of the resolved levels is appended to a line trace and fed
//! to a decoder that turns edges into a transcript of [`BusEvent`]s and
//! plays the peripheral side for any attached [`SimDevice`].
//!
//! Edges caused by test-injected faults (`hold_*`) are traced but not
//! decoded.

mod delay;
mod device;

pub use delay::SimDelay;
pub use device::SimDevice;

use alloc::collections::BTreeMap;
use alloc::vec::Vec;

use bitbus_hal::{Direction, GpioSubsystem, Level};

use crate::transfer::Ack;

/// Decoded bus activity
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BusEvent {
    Start,
    Restart,
    Stop,
    /// Byte driven by the master, with the ACK bit seen on the ninth clock
    Write(u8, Ack),
    /// Byte driven by the peripheral, with the master's ACK bit
    Read(u8, Ack),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Idle,
    Address,
    Write,
    Read,
    /// Nobody answers; bytes are still decoded
    Ignore,
}

/// Wire-level I2C bus model
#[derive(Debug, Clone)]
pub struct SimBus {
    sda_pin: u8,
    scl_pin: u8,
    directions: BTreeMap<u8, Direction>,
    latches: BTreeMap<u8, Level>,

    fail_init: bool,
    init_calls: u32,

    sda_hold: bool,
    scl_hold: bool,
    clock_stretch: u32,
    stretch_remaining: u32,
    sda_stall: u32,

    levels: (Level, Level),
    trace: Vec<(Level, Level)>,
    sda_at_rises: Vec<Level>,
    clock_samples: u32,
    unset_reads: u32,

    devices: Vec<SimDevice>,
    transcript: Vec<BusEvent>,
    phase: Phase,
    shift: u8,
    bits: u8,
    reading: bool,
    target: Option<usize>,
    outgoing: u8,
    device_sda: bool,
}

impl SimBus {
    /// An idle bus with nothing attached
    pub fn new(sda: u8, scl: u8) -> Self {
        Self {
            sda_pin: sda,
            scl_pin: scl,
            directions: BTreeMap::new(),
            latches: BTreeMap::new(),
            fail_init: false,
            init_calls: 0,
            sda_hold: false,
            scl_hold: false,
            clock_stretch: 0,
            stretch_remaining: 0,
            sda_stall: 0,
            levels: (Level::High, Level::High),
            trace: alloc::vec![(Level::High, Level::High)],
            sda_at_rises: Vec::new(),
            clock_samples: 0,
            unset_reads: 0,
            devices: Vec::new(),
            transcript: Vec::new(),
            phase: Phase::Idle,
            shift: 0,
            bits: 0,
            reading: false,
            target: None,
            outgoing: 0xFF,
            device_sda: false,
        }
    }

    pub fn with_device(mut self, device: SimDevice) -> Self {
        self.devices.push(device);
        self
    }

    /// Hold SCL low for `samples` reads after every clock release
    pub fn with_clock_stretch(mut self, samples: u32) -> Self {
        self.clock_stretch = samples;
        self
    }

    /// Make `init` report failure
    pub fn with_failing_init(mut self) -> Self {
        self.fail_init = true;
        self
    }

    /// A peripheral stuck mid-byte: SDA stays low until SCL has fallen
    /// `clocks` times
    pub fn with_stuck_sda(mut self, clocks: u32) -> Self {
        self.sda_stall = clocks;
        self.settle(false);
        self
    }

    pub fn set_clock_stretch(&mut self, samples: u32) {
        self.clock_stretch = samples;
    }

    pub fn hold_sda_low(&mut self, hold: bool) {
        self.sda_hold = hold;
        self.settle(false);
    }

    pub fn hold_scl_low(&mut self, hold: bool) {
        self.scl_hold = hold;
        self.settle(false);
    }

    /// Last level written to a pin's output latch
    pub fn latch(&self, pin: u8) -> Option<Level> {
        self.latches.get(&pin).copied()
    }

    /// Last direction configured on a pin
    pub fn direction(&self, pin: u8) -> Option<Direction> {
        self.directions.get(&pin).copied()
    }

    /// Resolved (SDA, SCL) levels, one entry per change
    pub fn trace(&self) -> &[(Level, Level)] {
        &self.trace
    }

    /// SDA level at every SCL rising edge
    pub fn sda_at_clock_rises(&self) -> &[Level] {
        &self.sda_at_rises
    }

    pub fn transcript(&self) -> &[BusEvent] {
        &self.transcript
    }

    pub fn clear_transcript(&mut self) {
        self.transcript.clear();
    }

    /// Number of times SCL was sampled
    pub fn clock_samples(&self) -> u32 {
        self.clock_samples
    }

    /// Reads of a bus line whose direction was never configured
    pub fn unset_reads(&self) -> u32 {
        self.unset_reads
    }

    pub fn init_calls(&self) -> u32 {
        self.init_calls
    }

    pub fn device(&self, address: u8) -> Option<&SimDevice> {
        self.devices.iter().find(|d| d.address() == address)
    }

    pub fn device_mut(&mut self, address: u8) -> Option<&mut SimDevice> {
        self.devices.iter_mut().find(|d| d.address() == address)
    }

    fn master_low(&self, pin: u8) -> bool {
        self.directions.get(&pin) == Some(&Direction::Output)
            && self.latches.get(&pin) == Some(&Level::Low)
    }

    fn resolve(&self) -> (Level, Level) {
        let sda_low = self.master_low(self.sda_pin)
            || self.sda_hold
            || self.sda_stall > 0
            || self.device_sda;
        let scl_low =
            self.master_low(self.scl_pin) || self.scl_hold || self.stretch_remaining > 0;
        (Level::from(!sda_low), Level::from(!scl_low))
    }

    /// Recompute the line levels and react to whatever edge happened
    fn settle(&mut self, decode: bool) {
        let (sda, scl) = self.resolve();
        let (old_sda, old_scl) = self.levels;
        if (sda, scl) == self.levels {
            return;
        }
        self.levels = (sda, scl);
        self.trace.push((sda, scl));

        if scl != old_scl {
            if scl.is_high() {
                self.sda_at_rises.push(sda);
                if decode {
                    self.on_clock_rise(sda);
                }
            } else {
                if self.sda_stall > 0 {
                    self.sda_stall -= 1;
                }
                if decode {
                    self.on_clock_fall();
                }
            }
            // Peripheral reactions take effect while SCL is low
            self.settle(decode);
        } else if sda != old_sda && scl.is_high() && decode {
            if sda.is_low() {
                self.on_start();
            } else {
                self.on_stop();
            }
        }
    }

    fn on_start(&mut self) {
        let event = if self.phase == Phase::Idle {
            BusEvent::Start
        } else {
            BusEvent::Restart
        };
        self.transcript.push(event);
        self.phase = Phase::Address;
        self.shift = 0;
        self.bits = 0;
        self.target = None;
    }

    fn on_stop(&mut self) {
        self.transcript.push(BusEvent::Stop);
        self.phase = Phase::Idle;
        self.target = None;
        self.device_sda = false;
    }

    fn on_clock_rise(&mut self, sda: Level) {
        if self.phase == Phase::Idle {
            return;
        }
        if self.bits < 8 {
            self.shift = (self.shift << 1) | u8::from(sda.is_high());
            self.bits += 1;
            return;
        }

        let ack = Ack::from_level(sda);
        let byte = self.shift;
        self.shift = 0;
        self.bits = 0;

        match self.phase {
            Phase::Address => {
                self.transcript.push(BusEvent::Write(byte, ack));
                self.reading = byte & 1 == 1;
                match self.target {
                    Some(index) if ack.is_ack() => {
                        if self.reading {
                            self.phase = Phase::Read;
                            self.outgoing = self.devices[index].next_response();
                        } else {
                            self.phase = Phase::Write;
                        }
                    }
                    _ => self.phase = Phase::Ignore,
                }
            }
            Phase::Write => {
                self.transcript.push(BusEvent::Write(byte, ack));
                if let (Some(index), true) = (self.target, ack.is_ack()) {
                    self.devices[index].push_received(byte);
                }
            }
            Phase::Read => {
                self.transcript.push(BusEvent::Read(byte, ack));
                match self.target {
                    Some(index) if ack.is_ack() => {
                        self.outgoing = self.devices[index].next_response();
                    }
                    _ => self.phase = Phase::Ignore,
                }
            }
            Phase::Ignore => {
                let event = if self.reading {
                    BusEvent::Read(byte, ack)
                } else {
                    BusEvent::Write(byte, ack)
                };
                self.transcript.push(event);
            }
            Phase::Idle => {}
        }
    }

    fn on_clock_fall(&mut self) {
        self.device_sda = match self.phase {
            Phase::Idle | Phase::Ignore => false,
            _ if self.bits == 8 => match self.phase {
                Phase::Address => {
                    let address = self.shift >> 1;
                    self.target = self.devices.iter().position(|d| d.address() == address);
                    self.target.is_some()
                }
                Phase::Write => self
                    .target
                    .map_or(false, |index| self.devices[index].accepts_write()),
                _ => false,
            },
            Phase::Read => self.outgoing & (0x80 >> self.bits) == 0,
            _ => false,
        };
    }
}

impl GpioSubsystem for SimBus {
    fn init(&mut self) -> bool {
        self.init_calls += 1;
        !self.fail_init
    }

    fn set_direction(&mut self, line: u8, direction: Direction) {
        let was_driving_low = self.master_low(line);
        self.directions.insert(line, direction);
        if line == self.scl_pin && was_driving_low && direction == Direction::Input {
            self.stretch_remaining = self.clock_stretch;
        }
        self.settle(true);
    }

    fn write_level(&mut self, line: u8, level: Level) {
        self.latches.insert(line, level);
        self.settle(true);
    }

    fn read_level(&mut self, line: u8) -> Level {
        if line != self.sda_pin && line != self.scl_pin {
            return Level::High;
        }
        if !self.directions.contains_key(&line) {
            self.unset_reads += 1;
        }
        if line == self.sda_pin {
            return self.levels.0;
        }

        self.clock_samples += 1;
        if self.stretch_remaining > 0 {
            self.stretch_remaining -= 1;
            let level = self.levels.1;
            self.settle(true);
            return level;
        }
        self.levels.1
    }
}
