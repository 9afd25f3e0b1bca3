//! Driver-chip bank: four chips on one register bus.

use crate::config::units::MicrostepExponent;
use crate::config::DriverConfig;
use crate::error::DriverError;
use crate::motor::{ChannelId, CHANNEL_COUNT};

use super::registers::{DriverShadow, Register};
use super::RegisterBus;

/// The driver chips behind the four motor channels.
///
/// Chip `n` sits at bus address `n` and drives channel `n`. Every write goes
/// through the shadow first so read-back never touches the bus.
pub struct DriverChip<BUS>
where
    BUS: RegisterBus,
{
    bus: BUS,
    shadows: [DriverShadow; CHANNEL_COUNT],
}

impl<BUS> DriverChip<BUS>
where
    BUS: RegisterBus,
{
    /// Create a bank with shadows holding the boot values from `config`.
    /// Nothing is written until [`init`](Self::init).
    pub fn new(bus: BUS, config: &DriverConfig) -> Self {
        Self {
            bus,
            shadows: [DriverShadow::from_config(config); CHANNEL_COUNT],
        }
    }

    /// Write the boot register sequence to every chip, chip 0 first.
    ///
    /// # Errors
    ///
    /// Returns `DriverError::Bus` for the first write the UART refuses.
    pub fn init(&mut self) -> Result<(), DriverError> {
        for channel in ChannelId::ALL {
            let address = channel.index() as u8;
            for (register, value) in self.shadows[channel.index()].boot_sequence() {
                self.write(address, register, value)?;
            }
            debug!("driver {=u8} configured", address);
        }
        info!("{=usize} driver chips configured", CHANNEL_COUNT);
        Ok(())
    }

    /// Current resolution of a channel, from the shadow.
    pub fn microstep_exponent(&self, channel: ChannelId) -> MicrostepExponent {
        self.shadows[channel.index()].chopconf.exponent()
    }

    /// Change the resolution of a channel.
    ///
    /// The shadow is updated before the write, so it holds the requested
    /// value even if the bus fails.
    ///
    /// # Errors
    ///
    /// Returns `DriverError::Bus` if the UART refuses the datagram.
    pub fn set_microstep_exponent(&mut self, channel: ChannelId, exponent: MicrostepExponent) -> Result<(), DriverError> {
        let shadow = &mut self.shadows[channel.index()];
        shadow.chopconf = shadow.chopconf.with_exponent(exponent);
        let value = shadow.chopconf.0;
        self.write(channel.index() as u8, Register::Chopconf, value)
    }

    /// Shadow of one chip.
    #[inline]
    pub fn shadow(&self, channel: ChannelId) -> &DriverShadow {
        &self.shadows[channel.index()]
    }

    /// Borrow the bus.
    #[inline]
    pub fn bus(&self) -> &BUS {
        &self.bus
    }

    /// Give back the bus.
    pub fn release(self) -> BUS {
        self.bus
    }

    fn write(&mut self, address: u8, register: Register, value: u32) -> Result<(), DriverError> {
        trace!("driver {=u8} reg {=u8:#x} <- {=u32:#x}", address, register.address(), value);
        self.bus
            .write_register(address, register, value)
            .map_err(|_| DriverError::Bus {
                address,
                register: register.address(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::registers::ChopConf;
    use crate::driver::testing::RecordingBus;

    #[test]
    fn test_init_writes_boot_sequence_per_chip() {
        let mut chip = DriverChip::new(RecordingBus::default(), &DriverConfig::default());
        chip.init().unwrap();

        let writes = &chip.bus().writes;
        assert_eq!(writes.len(), 36);
        for (n, block) in writes.chunks(9).enumerate() {
            assert!(block.iter().all(|(address, _, _)| *address == n as u8));
            assert_eq!(block[0], (n as u8, Register::Gstat, 0x07));
            assert_eq!(block[1], (n as u8, Register::Gconf, 0x1D3));
            assert_eq!(block[2], (n as u8, Register::Pwmconf, 0xC12D_0024));
            assert_eq!(block[3], (n as u8, Register::Chopconf, 0x1800_0053));
            assert_eq!(block[4], (n as u8, Register::IholdIrun, 0x0001_1F00));
            assert_eq!(block[5], (n as u8, Register::Tcoolthrs, 0));
            assert_eq!(block[6], (n as u8, Register::Tpwmthrs, 0));
            assert_eq!(block[7], (n as u8, Register::Tpowerdown, 255));
            assert_eq!(block[8], (n as u8, Register::Vactual, 0));
        }
    }

    #[test]
    fn test_init_stops_at_first_failure() {
        let bus = RecordingBus {
            fail_after: Some(10),
            ..Default::default()
        };
        let mut chip = DriverChip::new(bus, &DriverConfig::default());

        assert_eq!(
            chip.init(),
            Err(DriverError::Bus {
                address: 1,
                register: Register::Gconf.address()
            })
        );
        assert_eq!(chip.bus().writes.len(), 10);
    }

    #[test]
    fn test_set_exponent_writes_chopconf() {
        let mut chip = DriverChip::new(RecordingBus::default(), &DriverConfig::default());
        assert_eq!(chip.microstep_exponent(ChannelId::M2), MicrostepExponent::FULL);

        chip.set_microstep_exponent(ChannelId::M2, MicrostepExponent::SIXTEENTH)
            .unwrap();

        assert_eq!(chip.microstep_exponent(ChannelId::M2), MicrostepExponent::SIXTEENTH);
        assert_eq!(chip.microstep_exponent(ChannelId::M1), MicrostepExponent::FULL);
        assert_eq!(chip.bus().writes, vec![(2, Register::Chopconf, 0x1400_0053)]);
    }

    #[test]
    fn test_shadow_updated_even_if_bus_fails() {
        let bus = RecordingBus {
            fail_after: Some(0),
            ..Default::default()
        };
        let mut chip = DriverChip::new(bus, &DriverConfig::default());

        assert!(chip.set_microstep_exponent(ChannelId::M0, MicrostepExponent::MAX).is_err());
        assert_eq!(chip.shadow(ChannelId::M0).chopconf, ChopConf(0x1000_0053));
    }
}
