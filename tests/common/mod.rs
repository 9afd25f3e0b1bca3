//! Shared test doubles for the integration tests.

#![allow(dead_code)]

use std::cell::Cell;
use std::collections::VecDeque;
use std::convert::Infallible;
use std::rc::Rc;

use embedded_hal::digital::{ErrorType, OutputPin};
use peristaltic_stepper::config::BoardConfig;
use peristaltic_stepper::driver::{Register, RegisterBus};
use peristaltic_stepper::motor::{ChannelId, MotorChannel, MotorChannelBuilder, CHANNEL_COUNT};
use peristaltic_stepper::{PumpController, Scheduler, Ticks, Transport};

/// Output pin whose level and rising-edge count can be observed through a
/// clone.
#[derive(Clone, Default)]
pub struct ProbePin {
    level: Rc<Cell<bool>>,
    rises: Rc<Cell<u32>>,
}

impl ProbePin {
    pub fn is_high(&self) -> bool {
        self.level.get()
    }

    pub fn rises(&self) -> u32 {
        self.rises.get()
    }
}

impl ErrorType for ProbePin {
    type Error = Infallible;
}

impl OutputPin for ProbePin {
    fn set_low(&mut self) -> Result<(), Infallible> {
        self.level.set(false);
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Infallible> {
        if !self.level.get() {
            self.rises.set(self.rises.get() + 1);
        }
        self.level.set(true);
        Ok(())
    }
}

/// Probes for one channel's outputs.
#[derive(Clone, Default)]
pub struct ChannelProbes {
    pub step: ProbePin,
    pub dir: ProbePin,
    pub enable: ProbePin,
}

pub type Channel = MotorChannel<ProbePin, ProbePin, ProbePin>;

/// Build one channel, returning probes on its pins.
pub fn channel(id: ChannelId, config: &BoardConfig) -> (Channel, ChannelProbes) {
    let probes = ChannelProbes::default();
    let channel = MotorChannelBuilder::new(id)
        .step_pin(probes.step.clone())
        .dir_pin(probes.dir.clone())
        .enable_pin(probes.enable.clone())
        .from_config(config)
        .build()
        .unwrap();
    (channel, probes)
}

/// Build all four channels.
pub fn channels(config: &BoardConfig) -> ([Channel; CHANNEL_COUNT], [ChannelProbes; CHANNEL_COUNT]) {
    let mut probes: [ChannelProbes; CHANNEL_COUNT] = Default::default();
    let channels = ChannelId::ALL.map(|id| {
        let (channel, p) = channel(id, config);
        probes[id.index()] = p;
        channel
    });
    (channels, probes)
}

/// In-memory host link.
#[derive(Debug)]
pub struct MockLink {
    pub rx: VecDeque<u8>,
    pub written: Vec<u8>,
    pub complete: bool,
    pub active: bool,
}

impl Default for MockLink {
    fn default() -> Self {
        Self {
            rx: VecDeque::new(),
            written: Vec::new(),
            complete: true,
            active: false,
        }
    }
}

impl MockLink {
    pub fn feed(&mut self, bytes: &[u8]) {
        self.rx.extend(bytes.iter().copied());
    }
}

impl Transport for MockLink {
    fn bytes_available(&self) -> usize {
        self.rx.len()
    }

    fn read_byte(&mut self) -> Option<u8> {
        self.rx.pop_front()
    }

    fn write_ready(&self) -> bool {
        true
    }

    fn write_bytes(&mut self, bytes: &[u8]) -> usize {
        self.written.extend_from_slice(bytes);
        bytes.len()
    }

    fn write_complete(&self) -> bool {
        self.complete
    }

    fn is_alternate_transport_active(&self) -> bool {
        self.active
    }
}

/// Register bus that records every write.
#[derive(Debug, Default)]
pub struct RecordingBus {
    pub writes: Vec<(u8, Register, u32)>,
}

impl RegisterBus for RecordingBus {
    type Error = Infallible;

    fn write_register(&mut self, address: u8, register: Register, value: u32) -> Result<(), Infallible> {
        self.writes.push((address, register, value));
        Ok(())
    }
}

/// Byte sink standing in for the driver-chip UART.
#[derive(Debug, Default)]
pub struct ByteSink {
    pub bytes: Vec<u8>,
    pub flushes: usize,
}

impl embedded_io::ErrorType for ByteSink {
    type Error = Infallible;
}

impl embedded_io::Write for ByteSink {
    fn write(&mut self, buf: &[u8]) -> Result<usize, Infallible> {
        self.bytes.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> Result<(), Infallible> {
        self.flushes += 1;
        Ok(())
    }
}

pub type TestScheduler = Scheduler<ProbePin, ProbePin, ProbePin, RecordingBus, MockLink, MockLink>;

/// A booted board with probes on every channel.
pub struct Bench {
    pub scheduler: TestScheduler,
    pub probes: [ChannelProbes; CHANNEL_COUNT],
    pub now: u32,
}

impl Bench {
    pub fn new(config: &BoardConfig) -> Self {
        let (channels, probes) = channels(config);
        let bus = config.has_driver_chip().then(RecordingBus::default);
        let controller = PumpController::new(config, channels, bus).unwrap();
        let mut scheduler = Scheduler::new(config, controller, MockLink::default(), MockLink::default());
        scheduler.boot().unwrap();
        Self {
            scheduler,
            probes,
            now: 0,
        }
    }

    /// Run `n` loop iterations, one tick apart.
    pub fn run(&mut self, n: u32) {
        for _ in 0..n {
            self.scheduler.run_once(Ticks(self.now)).unwrap();
            self.now = self.now.wrapping_add(1);
        }
    }

    /// Jump the clock forward without running the loop.
    pub fn advance(&mut self, ticks: u32) {
        self.now = self.now.wrapping_add(ticks);
    }

    /// Send a request on the UART and run until its response has drained.
    pub fn exchange(&mut self, request: [u8; 6]) -> [u8; 6] {
        let start = self.scheduler.uart().written.len();
        self.scheduler.uart_mut().feed(&request);
        for _ in 0..100 {
            self.run(1);
            let written = &self.scheduler.uart().written;
            if written.len() >= start + 6 && !self.scheduler.session().is_busy() {
                let mut out = [0; 6];
                out.copy_from_slice(&written[start..start + 6]);
                return out;
            }
        }
        panic!("no response to {request:?}");
    }
}
