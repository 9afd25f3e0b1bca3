//! Driver-chip register map.
//!
//! Each configuration register is a `u32` newtype with accessors for the
//! fields this crate touches. Unlisted bits are carried through untouched.

use crate::config::units::MicrostepExponent;
use crate::config::{DriverConfig, Freewheel};

/// Register addresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum Register {
    /// Global configuration.
    Gconf = 0x00,
    /// Global status flags (write 1 to clear).
    Gstat = 0x01,
    /// Run and hold current.
    IholdIrun = 0x10,
    /// Standstill power-down delay.
    Tpowerdown = 0x11,
    /// Measured time between steps (read only).
    Tstep = 0x12,
    /// StealthChop upper velocity threshold.
    Tpwmthrs = 0x13,
    /// CoolStep lower velocity threshold.
    Tcoolthrs = 0x14,
    /// Internal step generator velocity.
    Vactual = 0x22,
    /// Microstep counter (read only).
    Mscnt = 0x6A,
    /// Chopper and resolution configuration.
    Chopconf = 0x6C,
    /// Driver status (read only).
    DrvStatus = 0x6F,
    /// StealthChop PWM configuration.
    Pwmconf = 0x70,
    /// Automatically tuned PWM values (read only).
    Pwmauto = 0x72,
}

impl Register {
    /// Register address on the wire (without the write bit).
    #[inline]
    pub const fn address(self) -> u8 {
        self as u8
    }

    /// Look up a register by address.
    pub fn from_address(address: u8) -> Option<Self> {
        use Register::*;
        [
            Gconf, Gstat, IholdIrun, Tpowerdown, Tstep, Tpwmthrs, Tcoolthrs, Vactual, Mscnt, Chopconf, DrvStatus,
            Pwmconf, Pwmauto,
        ]
        .into_iter()
        .find(|r| r.address() == address)
    }
}

#[inline]
const fn field(raw: u32, shift: u32, width: u32) -> u32 {
    (raw >> shift) & ((1 << width) - 1)
}

#[inline]
const fn with_field(raw: u32, shift: u32, width: u32, value: u32) -> u32 {
    let mask = ((1 << width) - 1) << shift;
    (raw & !mask) | ((value << shift) & mask)
}

#[inline]
const fn with_bit(raw: u32, bit: u32, set: bool) -> u32 {
    with_field(raw, bit, 1, set as u32)
}

/// GCONF (0x00).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct GConf(pub u32);

impl GConf {
    const I_SCALE_ANALOG: u32 = 0;
    const INTERNAL_RSENSE: u32 = 1;
    const EN_SPREAD_CYCLE: u32 = 2;
    const INDEX_OTPW: u32 = 4;
    const PDN_DISABLE: u32 = 6;
    const MSTEP_REG_SELECT: u32 = 7;
    const MULTISTEP_FILT: u32 = 8;

    /// Boot value: analog current scaling, internal sense resistors,
    /// overtemperature warning on INDEX, UART owns PDN and resolution,
    /// step pulse filtering on.
    pub const fn boot(spread_cycle: bool) -> Self {
        let mut raw = 0;
        raw = with_bit(raw, Self::I_SCALE_ANALOG, true);
        raw = with_bit(raw, Self::INTERNAL_RSENSE, true);
        raw = with_bit(raw, Self::EN_SPREAD_CYCLE, spread_cycle);
        raw = with_bit(raw, Self::INDEX_OTPW, true);
        raw = with_bit(raw, Self::PDN_DISABLE, true);
        raw = with_bit(raw, Self::MSTEP_REG_SELECT, true);
        raw = with_bit(raw, Self::MULTISTEP_FILT, true);
        Self(raw)
    }

    /// SpreadCycle selected instead of StealthChop.
    #[inline]
    pub const fn spread_cycle(self) -> bool {
        field(self.0, Self::EN_SPREAD_CYCLE, 1) != 0
    }

    /// Resolution taken from CHOPCONF instead of the MS pins.
    #[inline]
    pub const fn mstep_reg_select(self) -> bool {
        field(self.0, Self::MSTEP_REG_SELECT, 1) != 0
    }

    /// PDN_UART pin used for UART only.
    #[inline]
    pub const fn pdn_disable(self) -> bool {
        field(self.0, Self::PDN_DISABLE, 1) != 0
    }
}

/// GSTAT (0x01).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct GStat(pub u32);

impl GStat {
    /// Writing ones clears every latched flag.
    pub const CLEAR_ALL: Self = Self(0b111);

    /// Chip was reset since the last clear.
    #[inline]
    pub const fn reset(self) -> bool {
        field(self.0, 0, 1) != 0
    }

    /// Driver shut down on overtemperature or short.
    #[inline]
    pub const fn drv_err(self) -> bool {
        field(self.0, 1, 1) != 0
    }

    /// Charge pump undervoltage.
    #[inline]
    pub const fn uv_cp(self) -> bool {
        field(self.0, 2, 1) != 0
    }
}

/// CHOPCONF (0x6C).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ChopConf(pub u32);

impl ChopConf {
    /// Chip reset value (toff 3, hstrt 5, interpolation on, 1/256 step).
    pub const RESET: Self = Self(0x1000_0053);

    const MRES_SHIFT: u32 = 24;
    const MRES_WIDTH: u32 = 4;
    const INTPOL: u32 = 28;

    /// Largest resolution code (full step).
    pub const MRES_FULL_STEP: u8 = 8;

    /// Exponent reported for codes outside 0..=8.
    pub const FALLBACK_EXPONENT: MicrostepExponent = MicrostepExponent::SIXTEENTH;

    /// Boot value at the given resolution, interpolation on.
    pub fn boot(exponent: MicrostepExponent) -> Self {
        Self::RESET.with_intpol(true).with_exponent(exponent)
    }

    /// Off time setting.
    #[inline]
    pub const fn toff(self) -> u8 {
        field(self.0, 0, 4) as u8
    }

    /// Raw resolution code (8 = full step, 0 = 1/256).
    #[inline]
    pub const fn mres(self) -> u8 {
        field(self.0, Self::MRES_SHIFT, Self::MRES_WIDTH) as u8
    }

    /// Replace the resolution code.
    #[inline]
    pub const fn with_mres(self, code: u8) -> Self {
        Self(with_field(self.0, Self::MRES_SHIFT, Self::MRES_WIDTH, code as u32))
    }

    /// Interpolation to 256 microsteps.
    #[inline]
    pub const fn intpol(self) -> bool {
        field(self.0, Self::INTPOL, 1) != 0
    }

    /// Set interpolation.
    #[inline]
    pub const fn with_intpol(self, on: bool) -> Self {
        Self(with_bit(self.0, Self::INTPOL, on))
    }

    /// Resolution as an exponent.
    pub fn exponent(self) -> MicrostepExponent {
        exponent_for_mres(self.mres())
    }

    /// Replace the resolution.
    pub fn with_exponent(self, exponent: MicrostepExponent) -> Self {
        self.with_mres(mres_for_exponent(exponent))
    }
}

/// Resolution code for a microstep exponent (0 -> 8, 8 -> 0).
#[inline]
pub fn mres_for_exponent(exponent: MicrostepExponent) -> u8 {
    ChopConf::MRES_FULL_STEP - exponent.value()
}

/// Microstep exponent for a resolution code. Codes past full step read as
/// 1/16.
pub fn exponent_for_mres(code: u8) -> MicrostepExponent {
    ChopConf::MRES_FULL_STEP
        .checked_sub(code)
        .and_then(|e| MicrostepExponent::new(e).ok())
        .unwrap_or(ChopConf::FALLBACK_EXPONENT)
}

/// PWMCONF (0x70).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PwmConf(pub u32);

impl PwmConf {
    /// Chip reset value.
    pub const RESET: Self = Self(0xC10D_0024);

    const FREEWHEEL_SHIFT: u32 = 20;
    const FREEWHEEL_WIDTH: u32 = 2;

    /// Boot value with the given standstill mode.
    pub const fn boot(freewheel: Freewheel) -> Self {
        Self::RESET.with_freewheel(freewheel)
    }

    /// Raw freewheel field.
    #[inline]
    pub const fn freewheel_bits(self) -> u32 {
        field(self.0, Self::FREEWHEEL_SHIFT, Self::FREEWHEEL_WIDTH)
    }

    /// Replace the freewheel field.
    #[inline]
    pub const fn with_freewheel(self, freewheel: Freewheel) -> Self {
        Self(with_field(
            self.0,
            Self::FREEWHEEL_SHIFT,
            Self::FREEWHEEL_WIDTH,
            freewheel.bits(),
        ))
    }

    /// PWM amplitude offset.
    #[inline]
    pub const fn pwm_ofs(self) -> u8 {
        field(self.0, 0, 8) as u8
    }

    /// Automatic amplitude scaling.
    #[inline]
    pub const fn pwm_autoscale(self) -> bool {
        field(self.0, 18, 1) != 0
    }
}

/// IHOLD_IRUN (0x10).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct IholdIrun(pub u32);

impl IholdIrun {
    /// Pack the three fields. Out-of-range values are masked.
    pub const fn new(hold_current: u8, run_current: u8, hold_delay: u8) -> Self {
        let mut raw = 0;
        raw = with_field(raw, 0, 5, hold_current as u32);
        raw = with_field(raw, 8, 5, run_current as u32);
        raw = with_field(raw, 16, 4, hold_delay as u32);
        Self(raw)
    }

    /// Standstill current scale.
    #[inline]
    pub const fn ihold(self) -> u8 {
        field(self.0, 0, 5) as u8
    }

    /// Motor run current scale.
    #[inline]
    pub const fn irun(self) -> u8 {
        field(self.0, 8, 5) as u8
    }

    /// Run-to-hold ramp delay.
    #[inline]
    pub const fn iholddelay(self) -> u8 {
        field(self.0, 16, 4) as u8
    }
}

/// Last value written to each configuration register of one chip.
///
/// Registers on this chip are write-only over a single-wire bus, so the
/// shadow is the only read-back path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DriverShadow {
    /// GCONF.
    pub gconf: GConf,
    /// GSTAT as last written.
    pub gstat: GStat,
    /// PWMCONF.
    pub pwmconf: PwmConf,
    /// CHOPCONF.
    pub chopconf: ChopConf,
    /// IHOLD_IRUN.
    pub ihold_irun: IholdIrun,
    /// TCOOLTHRS.
    pub tcoolthrs: u32,
    /// TPWMTHRS.
    pub tpwmthrs: u32,
    /// TPOWERDOWN.
    pub tpowerdown: u32,
    /// VACTUAL.
    pub vactual: u32,
}

impl DriverShadow {
    /// Register values written at boot, in write order.
    pub fn from_config(config: &DriverConfig) -> Self {
        Self {
            gconf: GConf::boot(config.spread_cycle),
            gstat: GStat::CLEAR_ALL,
            pwmconf: PwmConf::boot(config.freewheel),
            chopconf: ChopConf::boot(config.initial_microstep_exponent),
            ihold_irun: IholdIrun::new(config.hold_current, config.run_current, config.hold_delay),
            tcoolthrs: 0,
            tpwmthrs: 0,
            tpowerdown: config.power_down_delay as u32,
            vactual: 0,
        }
    }

    /// The boot write sequence.
    pub fn boot_sequence(&self) -> [(Register, u32); 9] {
        [
            (Register::Gstat, self.gstat.0),
            (Register::Gconf, self.gconf.0),
            (Register::Pwmconf, self.pwmconf.0),
            (Register::Chopconf, self.chopconf.0),
            (Register::IholdIrun, self.ihold_irun.0),
            (Register::Tcoolthrs, self.tcoolthrs),
            (Register::Tpwmthrs, self.tpwmthrs),
            (Register::Tpowerdown, self.tpowerdown),
            (Register::Vactual, self.vactual),
        ]
    }
}

impl Default for DriverShadow {
    fn default() -> Self {
        Self::from_config(&DriverConfig::default())
    }
}
