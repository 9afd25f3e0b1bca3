//! Command dispatch over the four motor channels.
//!
//! [`PumpController`] owns the channels and the optional driver-chip bank
//! and turns decoded requests into state changes and responses.

use embedded_hal::digital::OutputPin;

use crate::config::units::{MicrostepExponent, Ticks};
use crate::config::{BoardConfig, DriverConfig, TimingConstraints};
use crate::driver::{DriverChip, RegisterBus};
use crate::error::{MotorError, Result};
use crate::motor::{ChannelId, MotorChannel, TickEvent, CHANNEL_COUNT};
use crate::protocol::{ChannelRegister, Command, Frame, Response, Signal};
use crate::transport::TransportSession;

/// Four motor channels plus an optional bank of UART-configured driver
/// chips.
///
/// Generic over:
/// - `STEP`, `DIR`, `EN`: channel output pins
/// - `BUS`: driver-chip register bus ([`NoRegisterBus`](crate::driver::NoRegisterBus)
///   on boards with pin-strapped drivers)
pub struct PumpController<STEP, DIR, EN, BUS>
where
    STEP: OutputPin,
    DIR: OutputPin,
    EN: OutputPin,
    BUS: RegisterBus,
{
    channels: [MotorChannel<STEP, DIR, EN>; CHANNEL_COUNT],
    driver: Option<DriverChip<BUS>>,
    timing: TimingConstraints,
}

impl<STEP, DIR, EN, BUS> PumpController<STEP, DIR, EN, BUS>
where
    STEP: OutputPin,
    DIR: OutputPin,
    EN: OutputPin,
    BUS: RegisterBus,
{
    /// Assemble a controller.
    ///
    /// `channels[n]` must be channel `n`. Supplying `bus` makes the driver
    /// chips configurable, using the board's `[driver]` settings or the
    /// defaults when that section is absent.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid or a channel sits at
    /// the wrong index.
    pub fn new(config: &BoardConfig, channels: [MotorChannel<STEP, DIR, EN>; CHANNEL_COUNT], bus: Option<BUS>) -> Result<Self> {
        crate::config::validate_config(config)?;

        for (index, channel) in channels.iter().enumerate() {
            if channel.id().index() != index {
                return Err(MotorError::InvalidChannel(channel.id().index() as u8).into());
            }
        }

        let driver = bus.map(|bus| match config.driver {
            Some(ref driver_config) => DriverChip::new(bus, driver_config),
            None => DriverChip::new(bus, &DriverConfig::default()),
        });

        Ok(Self {
            channels,
            driver,
            timing: TimingConstraints::from_config(config),
        })
    }

    /// Drive every channel to its boot state and configure the driver chips.
    ///
    /// # Errors
    ///
    /// Returns the first pin or register bus failure.
    pub fn init(&mut self) -> Result<()> {
        for channel in self.channels.iter_mut() {
            channel.init()?;
        }
        if let Some(driver) = self.driver.as_mut() {
            driver.init()?;
        }
        Ok(())
    }

    /// Advance every channel to `now`, reporting finished moves on `session`.
    ///
    /// A completion is only reported while the session is idle, so at most
    /// one channel reports per call.
    ///
    /// # Errors
    ///
    /// Returns `MotorError::PinError` if a step pin write fails.
    pub fn tick(&mut self, now: Ticks, session: &mut TransportSession) -> Result<()> {
        let min_pulse_width = self.timing.min_pulse_width;
        for channel in self.channels.iter_mut() {
            if channel.tick(now, min_pulse_width, session.is_busy())? == TickEvent::MotionComplete {
                debug!("motor {} finished", channel.id());
                session.respond(Signal::MotionComplete(channel.id()).into());
            }
        }
        Ok(())
    }

    /// Validate, decode and execute a received frame.
    ///
    /// Bad checksums answer 255 and unknown opcodes 254; neither touches any
    /// channel.
    ///
    /// # Errors
    ///
    /// Returns `MotorError::PinError` if a direction or enable write fails.
    pub fn handle_frame(&mut self, now: Ticks, frame: &Frame) -> Result<Response> {
        if frame.validate().is_err() {
            warn!("checksum mismatch on opcode {=u8}", frame.opcode());
            return Ok(Signal::ChecksumError.into());
        }

        match Command::decode(frame.opcode()) {
            Ok(command) => self.execute(now, command, frame),
            Err(_) => {
                warn!("unknown opcode {=u8}", frame.opcode());
                Ok(Signal::InvalidCommand.into())
            }
        }
    }

    /// Execute a decoded command with the arguments in `frame`.
    ///
    /// # Errors
    ///
    /// Returns `MotorError::PinError` if a direction or enable write fails.
    pub fn execute(&mut self, now: Ticks, command: Command, frame: &Frame) -> Result<Response> {
        let opcode = frame.opcode();

        let response = match command {
            Command::Get { channel, register } => self.read_register(opcode, channel, register),
            Command::Set { channel, register } => {
                self.write_register(now, channel, register, frame)?;
                Signal::Acknowledge.into()
            }
            Command::MicrostepSupport(_) => Response::Byte {
                opcode,
                value: self.driver.is_some() as u8,
            },
            Command::GetMicrostepExponent(channel) => Response::Byte {
                opcode,
                value: self.microstep_exponent(channel).value(),
            },
            Command::SetMicrostepExponent(channel) => self.set_microstep_exponent(channel, frame.byte_arg()),
            Command::SubMicrosecondDivider => Response::Word {
                opcode,
                value: self.timing.sub_us_divider,
            },
        };

        trace!("opcode {=u8} handled", opcode);
        Ok(response)
    }

    fn read_register(&self, opcode: u8, channel: ChannelId, register: ChannelRegister) -> Response {
        let ch = &self.channels[channel.index()];
        let value = match register {
            ChannelRegister::Running => ch.is_running() as u32,
            ChannelRegister::Steps => ch.steps_remaining(),
            ChannelRegister::TargetSteps => ch.target_steps(),
            ChannelRegister::StepInterval => ch.step_interval().value(),
            ChannelRegister::FiniteMode => ch.is_finite() as u32,
            ChannelRegister::Direction => ch.direction() as u32,
            ChannelRegister::Enabled => ch.is_enabled() as u32,
        };

        if register.is_word() {
            Response::Word { opcode, value }
        } else {
            Response::Byte {
                opcode,
                value: value as u8,
            }
        }
    }

    fn write_register(&mut self, now: Ticks, channel: ChannelId, register: ChannelRegister, frame: &Frame) -> Result<()> {
        let ch = &mut self.channels[channel.index()];
        match register {
            ChannelRegister::Running => ch.set_running(now, frame.bool_arg())?,
            ChannelRegister::Steps => ch.set_steps(frame.word_arg()),
            ChannelRegister::TargetSteps => ch.set_target_steps(frame.word_arg()),
            ChannelRegister::StepInterval => ch.set_step_interval(Ticks(frame.word_arg())),
            ChannelRegister::FiniteMode => ch.set_finite_mode(frame.bool_arg()),
            ChannelRegister::Direction => ch.set_direction(frame.bool_arg())?,
            ChannelRegister::Enabled => ch.set_enabled(frame.bool_arg())?,
        }
        Ok(())
    }

    fn set_microstep_exponent(&mut self, channel: ChannelId, raw: u8) -> Response {
        let Some(driver) = self.driver.as_mut() else {
            return Signal::InvalidCommand.into();
        };
        let Ok(exponent) = MicrostepExponent::new(raw) else {
            return Signal::InvalidCommand.into();
        };

        if driver.set_microstep_exponent(channel, exponent).is_err() {
            warn!("resolution write to driver {} failed", channel);
        }
        Signal::Acknowledge.into()
    }

    /// Current resolution of a channel. Boards without driver chips report
    /// full step.
    pub fn microstep_exponent(&self, channel: ChannelId) -> MicrostepExponent {
        self.driver
            .as_ref()
            .map(|driver| driver.microstep_exponent(channel))
            .unwrap_or(MicrostepExponent::FULL)
    }

    /// Borrow a channel.
    #[inline]
    pub fn channel(&self, id: ChannelId) -> &MotorChannel<STEP, DIR, EN> {
        &self.channels[id.index()]
    }

    /// Mutably borrow a channel.
    #[inline]
    pub fn channel_mut(&mut self, id: ChannelId) -> &mut MotorChannel<STEP, DIR, EN> {
        &mut self.channels[id.index()]
    }

    /// Driver-chip bank, if the board has one.
    #[inline]
    pub fn driver(&self) -> Option<&DriverChip<BUS>> {
        self.driver.as_ref()
    }

    /// Tick-domain constants.
    #[inline]
    pub fn timing(&self) -> &TimingConstraints {
        &self.timing
    }

    /// Give back the channels and the register bus.
    pub fn release(self) -> ([MotorChannel<STEP, DIR, EN>; CHANNEL_COUNT], Option<BUS>) {
        (self.channels, self.driver.map(DriverChip::release))
    }
}
