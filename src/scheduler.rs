//! The cooperative super-loop.
//!
//! One iteration ticks every motor channel, then makes at most one unit of
//! progress on the host link. Nothing in an iteration blocks.

use embedded_hal::digital::OutputPin;

use crate::config::units::Ticks;
use crate::config::{BoardConfig, TimingConstraints};
use crate::controller::PumpController;
use crate::driver::RegisterBus;
use crate::error::Result;
use crate::protocol::Signal;
use crate::transport::{Link, PollOutcome, Transport, TransportSession};

/// Controller, session and both host links.
///
/// The USB link is used whenever it reports itself active; otherwise the
/// UART is. The choice is re-evaluated every iteration and any change drops
/// the exchange in flight.
pub struct Scheduler<STEP, DIR, EN, BUS, UART, USB>
where
    STEP: OutputPin,
    DIR: OutputPin,
    EN: OutputPin,
    BUS: RegisterBus,
    UART: Transport,
    USB: Transport,
{
    controller: PumpController<STEP, DIR, EN, BUS>,
    session: TransportSession,
    uart: UART,
    usb: USB,
    signal_on_boot: bool,
}

impl<STEP, DIR, EN, BUS, UART, USB> Scheduler<STEP, DIR, EN, BUS, UART, USB>
where
    STEP: OutputPin,
    DIR: OutputPin,
    EN: OutputPin,
    BUS: RegisterBus,
    UART: Transport,
    USB: Transport,
{
    /// Wire a controller to its links.
    pub fn new(config: &BoardConfig, controller: PumpController<STEP, DIR, EN, BUS>, uart: UART, usb: USB) -> Self {
        let timing = TimingConstraints::from_config(config);
        Self {
            controller,
            session: TransportSession::new(&timing, config.protocol.scrub_response_payload),
            uart,
            usb,
            signal_on_boot: config.protocol.signal_on_boot,
        }
    }

    /// Initialise pins and driver chips, then queue the boot signal if the
    /// board asks for one.
    ///
    /// # Errors
    ///
    /// Returns the first pin or register bus failure.
    pub fn boot(&mut self) -> Result<()> {
        self.controller.init()?;
        if self.signal_on_boot {
            self.session.respond(Signal::Boot.into());
        }
        info!("controller ready");
        Ok(())
    }

    /// Run one loop iteration at tick `now`.
    ///
    /// # Errors
    ///
    /// Returns `MotorError::PinError` if a channel output fails.
    pub fn run_once(&mut self, now: Ticks) -> Result<PollOutcome> {
        let link = if self.usb.is_alternate_transport_active() {
            Link::Usb
        } else {
            Link::Uart
        };
        self.session.select_link(link);

        self.controller.tick(now, &mut self.session)?;

        let outcome = match link {
            Link::Usb => self.session.poll(now, &mut self.usb),
            Link::Uart => self.session.poll(now, &mut self.uart),
        };

        if let PollOutcome::Request(frame) = outcome {
            let response = self.controller.handle_frame(now, &frame)?;
            self.session.respond(response);
        }

        Ok(outcome)
    }

    /// Loop forever, reading the tick counter from `clock` each iteration.
    ///
    /// # Errors
    ///
    /// Returns only if an iteration fails.
    pub fn run<C>(&mut self, mut clock: C) -> Result<core::convert::Infallible>
    where
        C: FnMut() -> Ticks,
    {
        loop {
            self.run_once(clock())?;
        }
    }

    /// Borrow the controller.
    #[inline]
    pub fn controller(&self) -> &PumpController<STEP, DIR, EN, BUS> {
        &self.controller
    }

    /// Mutably borrow the controller.
    #[inline]
    pub fn controller_mut(&mut self) -> &mut PumpController<STEP, DIR, EN, BUS> {
        &mut self.controller
    }

    /// Borrow the session.
    #[inline]
    pub fn session(&self) -> &TransportSession {
        &self.session
    }

    /// Borrow the UART link.
    #[inline]
    pub fn uart(&self) -> &UART {
        &self.uart
    }

    /// Mutably borrow the UART link.
    #[inline]
    pub fn uart_mut(&mut self) -> &mut UART {
        &mut self.uart
    }

    /// Borrow the USB link.
    #[inline]
    pub fn usb(&self) -> &USB {
        &self.usb
    }

    /// Mutably borrow the USB link.
    #[inline]
    pub fn usb_mut(&mut self) -> &mut USB {
        &mut self.usb
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::NoRegisterBus;
    use crate::motor::{ChannelId, MotorChannelBuilder};
    use crate::transport::session::mocks::MockLink;
    use core::convert::Infallible;

    struct NullPin;

    impl embedded_hal::digital::ErrorType for NullPin {
        type Error = Infallible;
    }

    impl OutputPin for NullPin {
        fn set_low(&mut self) -> core::result::Result<(), Infallible> {
            Ok(())
        }

        fn set_high(&mut self) -> core::result::Result<(), Infallible> {
            Ok(())
        }
    }

    type TestScheduler = Scheduler<NullPin, NullPin, NullPin, NoRegisterBus, MockLink, MockLink>;

    fn scheduler(config: &BoardConfig) -> TestScheduler {
        let channels = ChannelId::ALL.map(|id| {
            MotorChannelBuilder::new(id)
                .step_pin(NullPin)
                .dir_pin(NullPin)
                .enable_pin(NullPin)
                .from_config(config)
                .build()
                .unwrap()
        });
        let controller = PumpController::new(config, channels, None).unwrap();
        let mut s = Scheduler::new(config, controller, MockLink::default(), MockLink::default());
        s.boot().unwrap();
        s
    }

    fn run(s: &mut TestScheduler, from: u32, to: u32) {
        for t in from..to {
            s.run_once(Ticks(t)).unwrap();
        }
    }

    #[test]
    fn test_request_answered_on_uart() {
        let mut s = scheduler(&BoardConfig::rp2350());
        s.uart_mut().feed(&[2, 0, 0, 0, 0, 2]);

        run(&mut s, 0, 20);

        assert_eq!(s.uart().written, vec![2, 0, 0, 0, 0, 2]);
        assert!(s.usb().written.is_empty());
    }

    #[test]
    fn test_boot_signal_opt_in() {
        let mut config = BoardConfig::rp2350();
        config.protocol.signal_on_boot = true;
        let mut s = scheduler(&config);

        run(&mut s, 0, 3);

        assert_eq!(s.uart().written, vec![252; 6]);
    }

    #[test]
    fn test_usb_takes_over() {
        let mut s = scheduler(&BoardConfig::rp2350());
        s.uart_mut().feed(&[2, 0, 0]);
        run(&mut s, 0, 3);
        assert_eq!(s.session().received(), 3);

        s.usb_mut().alternate_active = true;
        s.usb_mut().feed(&[2, 0, 0, 0, 0, 2]);
        run(&mut s, 3, 20);

        assert_eq!(s.session().link(), Link::Usb);
        assert_eq!(s.usb().written, vec![2, 0, 0, 0, 0, 2]);
        assert!(s.uart().written.is_empty());
    }

    #[test]
    fn test_divider_query() {
        let mut s = scheduler(&BoardConfig::rp2350());
        s.uart_mut().feed(&[68, 0, 0, 0, 0, 68]);

        run(&mut s, 0, 10);

        assert_eq!(s.uart().written, vec![68, 1, 0, 0, 0, 69]);
    }
}
