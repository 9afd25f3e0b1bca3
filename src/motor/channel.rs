//! Per-channel step-pulse state machine.
//!
//! Generic over embedded-hal 1.0 pin types. Nothing here blocks: each call to
//! [`MotorChannel::tick`] looks at the elapsed ticks since the last rising
//! edge and changes at most one pin.

use embedded_hal::digital::{OutputPin, PinState};

use crate::config::units::Ticks;
use crate::error::MotorError;

use super::state::ChannelPhase;
use super::ChannelId;

/// What a single tick did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TickEvent {
    /// No pin changed.
    None,
    /// Rising edge on the step output.
    StepRaised,
    /// Falling edge on the step output.
    StepLowered,
    /// Finite move finished; the channel stopped itself.
    MotionComplete,
}

/// One stepper channel: step, direction and active-low enable outputs plus
/// the counters the host reads and writes.
///
/// Generic over:
/// - `STEP`: STEP pin type (must implement `OutputPin`)
/// - `DIR`: DIR pin type (must implement `OutputPin`)
/// - `EN`: enable pin type, driven low to enable the driver
pub struct MotorChannel<STEP, DIR, EN>
where
    STEP: OutputPin,
    DIR: OutputPin,
    EN: OutputPin,
{
    id: ChannelId,

    step_pin: STEP,
    dir_pin: DIR,
    enable_pin: EN,

    running: bool,
    steps_remaining: u32,
    target_steps: u32,
    step_interval: Ticks,
    finite_mode: bool,

    /// Step output is high; it must be held for the minimum pulse width.
    pulse_high: bool,

    /// Tick of the last rising edge.
    last_edge: Ticks,

    direction: bool,
    enabled: bool,
}

fn drive<P: OutputPin>(pin: &mut P, high: bool) -> Result<(), MotorError> {
    pin.set_state(PinState::from(high)).map_err(|_| MotorError::PinError)
}

impl<STEP, DIR, EN> MotorChannel<STEP, DIR, EN>
where
    STEP: OutputPin,
    DIR: OutputPin,
    EN: OutputPin,
{
    /// Create a channel in its boot state. Pins are untouched until
    /// [`init`](Self::init).
    pub(crate) fn new(id: ChannelId, step_pin: STEP, dir_pin: DIR, enable_pin: EN, step_interval: Ticks) -> Self {
        Self {
            id,
            step_pin,
            dir_pin,
            enable_pin,
            running: false,
            steps_remaining: 0,
            target_steps: 0,
            step_interval,
            finite_mode: true,
            pulse_high: false,
            last_edge: Ticks(0),
            direction: true,
            enabled: false,
        }
    }

    /// Drive the outputs to the boot state: driver disabled, direction
    /// forward, step low.
    ///
    /// # Errors
    ///
    /// Returns `MotorError::PinError` if any pin write fails.
    pub fn init(&mut self) -> Result<(), MotorError> {
        drive(&mut self.enable_pin, !self.enabled)?;
        drive(&mut self.dir_pin, self.direction)?;
        drive(&mut self.step_pin, false)?;
        self.pulse_high = false;
        Ok(())
    }

    /// Advance the state machine to `now`.
    ///
    /// `link_busy` holds off the completion report while a previous
    /// response still owns the transmit buffer.
    ///
    /// # Errors
    ///
    /// Returns `MotorError::PinError` if the step pin write fails.
    pub fn tick(&mut self, now: Ticks, min_pulse_width: Ticks, link_busy: bool) -> Result<TickEvent, MotorError> {
        if !self.running {
            return Ok(TickEvent::None);
        }

        let elapsed = now.since(self.last_edge);

        if self.steps_remaining != 0 {
            if self.pulse_high {
                if elapsed >= min_pulse_width {
                    drive(&mut self.step_pin, false)?;
                    self.pulse_high = false;
                    return Ok(TickEvent::StepLowered);
                }
            } else if elapsed >= self.step_interval {
                drive(&mut self.step_pin, true)?;
                self.pulse_high = true;
                self.last_edge = now;
                if self.finite_mode {
                    self.steps_remaining -= 1;
                }
                return Ok(TickEvent::StepRaised);
            }
        } else if self.pulse_high {
            if elapsed >= min_pulse_width {
                drive(&mut self.step_pin, false)?;
                self.pulse_high = false;
                return Ok(TickEvent::StepLowered);
            }
        } else if !link_busy {
            self.running = false;
            return Ok(TickEvent::MotionComplete);
        }

        Ok(TickEvent::None)
    }

    /// Start or stop stepping.
    ///
    /// Setting the current value again changes nothing. Starting resets the
    /// pulse and back-dates the last edge by one interval so the next tick
    /// raises the first pulse. Stopping only clears the flag.
    ///
    /// # Errors
    ///
    /// Returns `MotorError::PinError` if forcing the step pin low fails.
    pub fn set_running(&mut self, now: Ticks, running: bool) -> Result<(), MotorError> {
        if self.running == running {
            return Ok(());
        }

        if running {
            drive(&mut self.step_pin, false)?;
            self.pulse_high = false;
            self.last_edge = now - self.step_interval;
        }
        self.running = running;
        Ok(())
    }

    /// Load a move: sets both the remaining and the target step count.
    #[inline]
    pub fn set_steps(&mut self, steps: u32) {
        self.steps_remaining = steps;
        self.target_steps = steps;
    }

    /// Overwrite the target step count only.
    #[inline]
    pub fn set_target_steps(&mut self, steps: u32) {
        self.target_steps = steps;
    }

    /// Set the tick count between rising edges.
    #[inline]
    pub fn set_step_interval(&mut self, interval: Ticks) {
        self.step_interval = interval;
    }

    /// Count steps down (`true`) or step forever (`false`).
    #[inline]
    pub fn set_finite_mode(&mut self, finite: bool) {
        self.finite_mode = finite;
    }

    /// Set the direction output.
    ///
    /// # Errors
    ///
    /// Returns `MotorError::PinError` if the pin write fails.
    pub fn set_direction(&mut self, forward: bool) -> Result<(), MotorError> {
        drive(&mut self.dir_pin, forward)?;
        self.direction = forward;
        Ok(())
    }

    /// Enable or disable the driver. The enable output is active-low.
    ///
    /// # Errors
    ///
    /// Returns `MotorError::PinError` if the pin write fails.
    pub fn set_enabled(&mut self, enabled: bool) -> Result<(), MotorError> {
        drive(&mut self.enable_pin, !enabled)?;
        self.enabled = enabled;
        Ok(())
    }

    /// Channel identifier.
    #[inline]
    pub fn id(&self) -> ChannelId {
        self.id
    }

    /// Whether the channel is stepping.
    #[inline]
    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Steps left in the current move.
    #[inline]
    pub fn steps_remaining(&self) -> u32 {
        self.steps_remaining
    }

    /// Step count of the last move request.
    #[inline]
    pub fn target_steps(&self) -> u32 {
        self.target_steps
    }

    /// Ticks between rising edges.
    #[inline]
    pub fn step_interval(&self) -> Ticks {
        self.step_interval
    }

    /// Whether steps are counted down.
    #[inline]
    pub fn is_finite(&self) -> bool {
        self.finite_mode
    }

    /// Direction output level.
    #[inline]
    pub fn direction(&self) -> bool {
        self.direction
    }

    /// Logical enable state.
    #[inline]
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Whether the step output is currently high.
    #[inline]
    pub fn is_pulse_high(&self) -> bool {
        self.pulse_high
    }

    /// Tick of the last rising edge.
    #[inline]
    pub fn last_edge(&self) -> Ticks {
        self.last_edge
    }

    /// Derived phase.
    pub fn phase(&self) -> ChannelPhase {
        match (self.running, self.steps_remaining != 0, self.pulse_high) {
            (false, _, _) => ChannelPhase::Idle,
            (true, true, _) => ChannelPhase::Stepping,
            (true, false, true) => ChannelPhase::PulseFalling,
            (true, false, false) => ChannelPhase::Completing,
        }
    }

    /// Give back the pins.
    pub fn release(self) -> (STEP, DIR, EN) {
        (self.step_pin, self.dir_pin, self.enable_pin)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::convert::Infallible;
    use std::cell::Cell;
    use std::rc::Rc;

    /// Pin that records its level and counts rising edges.
    #[derive(Clone, Default)]
    struct ProbePin {
        high: Rc<Cell<bool>>,
        rising: Rc<Cell<u32>>,
    }

    impl embedded_hal::digital::ErrorType for ProbePin {
        type Error = Infallible;
    }

    impl OutputPin for ProbePin {
        fn set_low(&mut self) -> Result<(), Self::Error> {
            self.high.set(false);
            Ok(())
        }

        fn set_high(&mut self) -> Result<(), Self::Error> {
            if !self.high.get() {
                self.rising.set(self.rising.get() + 1);
            }
            self.high.set(true);
            Ok(())
        }
    }

    /// Pin whose writes always fail.
    struct BrokenPin;

    impl embedded_hal::digital::ErrorType for BrokenPin {
        type Error = embedded_hal::digital::ErrorKind;
    }

    impl OutputPin for BrokenPin {
        fn set_low(&mut self) -> Result<(), Self::Error> {
            Err(embedded_hal::digital::ErrorKind::Other)
        }

        fn set_high(&mut self) -> Result<(), Self::Error> {
            Err(embedded_hal::digital::ErrorKind::Other)
        }
    }

    const MIN_PULSE: Ticks = Ticks(3);

    fn channel(interval: u32) -> (MotorChannel<ProbePin, ProbePin, ProbePin>, ProbePin, ProbePin, ProbePin) {
        let step = ProbePin::default();
        let dir = ProbePin::default();
        let en = ProbePin::default();
        let mut ch = MotorChannel::new(ChannelId::M0, step.clone(), dir.clone(), en.clone(), Ticks(interval));
        ch.init().unwrap();
        (ch, step, dir, en)
    }

    #[test]
    fn test_boot_state() {
        let (ch, step, dir, en) = channel(4000);

        assert!(!ch.is_running());
        assert!(!ch.is_enabled());
        assert!(ch.direction());
        assert!(ch.is_finite());
        assert_eq!(ch.step_interval(), Ticks(4000));
        assert_eq!(ch.steps_remaining(), 0);
        assert!(!step.high.get());
        assert!(dir.high.get());
        // active-low enable: disabled means high
        assert!(en.high.get());
        assert_eq!(ch.phase(), ChannelPhase::Idle);
    }

    #[test]
    fn test_first_pulse_on_next_tick() {
        let (mut ch, step, _, _) = channel(10);
        ch.set_steps(1);
        ch.set_running(Ticks(100), true).unwrap();

        assert_eq!(ch.last_edge(), Ticks(90));
        assert_eq!(ch.tick(Ticks(100), MIN_PULSE, false).unwrap(), TickEvent::StepRaised);
        assert!(step.high.get());
        assert_eq!(ch.steps_remaining(), 0);
    }

    #[test]
    fn test_pulse_held_for_min_width() {
        let (mut ch, step, _, _) = channel(10);
        ch.set_steps(5);
        ch.set_running(Ticks(0), true).unwrap();
        ch.tick(Ticks(0), MIN_PULSE, false).unwrap();

        assert_eq!(ch.tick(Ticks(1), MIN_PULSE, false).unwrap(), TickEvent::None);
        assert_eq!(ch.tick(Ticks(2), MIN_PULSE, false).unwrap(), TickEvent::None);
        assert!(step.high.get());
        assert_eq!(ch.tick(Ticks(3), MIN_PULSE, false).unwrap(), TickEvent::StepLowered);
        assert!(!step.high.get());
    }

    #[test]
    fn test_finite_move_completes_once() {
        let (mut ch, step, _, _) = channel(10);
        ch.set_steps(3);
        ch.set_running(Ticks(0), true).unwrap();

        let mut completions = 0;
        for t in 0..200 {
            if ch.tick(Ticks(t), MIN_PULSE, false).unwrap() == TickEvent::MotionComplete {
                completions += 1;
            }
        }

        assert_eq!(step.rising.get(), 3);
        assert_eq!(completions, 1);
        assert!(!ch.is_running());
        assert!(!step.high.get());
    }

    #[test]
    fn test_completion_waits_for_link() {
        let (mut ch, _, _, _) = channel(10);
        ch.set_steps(1);
        ch.set_running(Ticks(0), true).unwrap();
        ch.tick(Ticks(0), MIN_PULSE, true).unwrap();
        ch.tick(Ticks(5), MIN_PULSE, true).unwrap();

        assert_eq!(ch.phase(), ChannelPhase::Completing);
        assert_eq!(ch.tick(Ticks(6), MIN_PULSE, true).unwrap(), TickEvent::None);
        assert!(ch.is_running());
        assert_eq!(ch.tick(Ticks(7), MIN_PULSE, false).unwrap(), TickEvent::MotionComplete);
    }

    #[test]
    fn test_continuous_mode_keeps_stepping() {
        let (mut ch, step, _, _) = channel(10);
        ch.set_finite_mode(false);
        ch.set_steps(1);
        ch.set_running(Ticks(0), true).unwrap();

        for t in 0..1000 {
            assert_ne!(ch.tick(Ticks(t), MIN_PULSE, false).unwrap(), TickEvent::MotionComplete);
        }

        assert_eq!(step.rising.get(), 100);
        assert_eq!(ch.steps_remaining(), 1);
        assert!(ch.is_running());
    }

    #[test]
    fn test_rising_edges_across_counter_wrap() {
        let (mut ch, step, _, _) = channel(10);
        ch.set_steps(4);
        let start = Ticks(u32::MAX - 15);
        ch.set_running(start, true).unwrap();

        let mut now = start;
        for _ in 0..40 {
            ch.tick(now, MIN_PULSE, false).unwrap();
            now = now + Ticks(1);
        }

        assert_eq!(step.rising.get(), 4);
    }

    #[test]
    fn test_set_running_idempotent() {
        let (mut ch, _, _, _) = channel(10);
        ch.set_steps(10);
        ch.set_running(Ticks(0), true).unwrap();
        ch.tick(Ticks(0), MIN_PULSE, false).unwrap();
        let edge = ch.last_edge();

        ch.set_running(Ticks(5), true).unwrap();

        assert_eq!(ch.last_edge(), edge);
        assert!(ch.is_pulse_high());
    }

    #[test]
    fn test_failed_start_leaves_channel_stopped() {
        let mut ch = MotorChannel::new(ChannelId::M1, BrokenPin, ProbePin::default(), ProbePin::default(), Ticks(10));
        ch.set_steps(5);

        assert_eq!(ch.set_running(Ticks(100_000), true), Err(MotorError::PinError));

        assert!(!ch.is_running());
        assert!(!ch.is_pulse_high());
        assert_eq!(ch.last_edge(), Ticks(0));
        assert_eq!(ch.phase(), ChannelPhase::Idle);
        assert_eq!(ch.tick(Ticks(100_010), MIN_PULSE, false), Ok(TickEvent::None));
        assert_eq!(ch.steps_remaining(), 5);
    }

    #[test]
    fn test_stop_leaves_pulse_phase() {
        let (mut ch, step, _, _) = channel(10);
        ch.set_steps(10);
        ch.set_running(Ticks(0), true).unwrap();
        ch.tick(Ticks(0), MIN_PULSE, false).unwrap();

        ch.set_running(Ticks(1), false).unwrap();

        assert!(ch.is_pulse_high());
        assert!(step.high.get());
        assert_eq!(ch.tick(Ticks(50), MIN_PULSE, false).unwrap(), TickEvent::None);
    }

    #[test]
    fn test_set_steps_sets_target() {
        let (mut ch, _, _, _) = channel(10);
        ch.set_steps(u32::MAX);
        assert_eq!(ch.steps_remaining(), u32::MAX);
        assert_eq!(ch.target_steps(), u32::MAX);

        ch.set_target_steps(7);
        assert_eq!(ch.steps_remaining(), u32::MAX);
        assert_eq!(ch.target_steps(), 7);
    }

    #[test]
    fn test_enable_is_active_low() {
        let (mut ch, _, _, en) = channel(10);
        ch.set_enabled(true).unwrap();
        assert!(ch.is_enabled());
        assert!(!en.high.get());

        ch.set_enabled(false).unwrap();
        assert!(en.high.get());
    }
}
