//! Error types for peristaltic-stepper.
//!
//! Provides unified error handling across configuration, motor channels, the
//! driver-chip register bus and the framed serial protocol.
//!
//! Errors that the host can recover from (bad checksum, unknown opcode,
//! unsupported command) never leave the crate as `Err`: they are answered on
//! the wire with an error frame. The variants below cover what the embedding
//! firmware has to deal with itself.

use core::fmt;

/// Result type alias using the library's Error type.
pub type Result<T> = core::result::Result<T, Error>;

/// Unified error type for all peristaltic-stepper operations.
#[derive(Debug, Clone, PartialEq)]
pub enum Error {
    /// Configuration parsing or validation error
    Config(ConfigError),
    /// Motor channel (GPIO) error
    Motor(MotorError),
    /// Driver-chip register bus error
    Driver(DriverError),
    /// Frame decoding error
    Protocol(ProtocolError),
}

/// Configuration-related errors.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// Failed to parse TOML configuration
    ParseError(heapless::String<128>),
    /// A required builder field was not supplied
    MissingField(&'static str),
    /// Invalid microstep exponent (must be 0-8)
    InvalidMicrostepExponent(u8),
    /// Tick divider must be non-zero
    InvalidDivider(u32),
    /// Minimum pulse width must be at least one tick
    InvalidPulseWidth(u32),
    /// Interbyte timeout must be at least one tick
    InvalidTimeout(u32),
    /// Default step interval shorter than the minimum pulse width
    StepIntervalTooShort {
        /// Configured interval in ticks
        interval: u32,
        /// Minimum pulse width in ticks
        min_pulse_width: u32,
    },
    /// Driver current scale out of range (0-31)
    InvalidCurrent {
        /// Offending field name
        field: &'static str,
        /// Configured value
        value: u8,
    },
    /// Driver hold delay out of range (0-15)
    InvalidHoldDelay(u8),
    /// File I/O error (std only)
    #[cfg(feature = "std")]
    IoError(heapless::String<128>),
}

/// Motor channel errors.
#[derive(Debug, Clone, PartialEq)]
pub enum MotorError {
    /// Pin operation failed
    PinError,
    /// Channel index outside 0-3
    InvalidChannel(u8),
}

/// Driver-chip register bus errors.
#[derive(Debug, Clone, PartialEq)]
pub enum DriverError {
    /// The UART refused a register write
    Bus {
        /// Chip address (0-3)
        address: u8,
        /// Register address
        register: u8,
    },
}

/// Frame decoding errors.
#[derive(Debug, Clone, PartialEq)]
pub enum ProtocolError {
    /// Checksum byte does not match the XOR of the leading five bytes
    ChecksumMismatch {
        /// Checksum computed over bytes 0..5
        expected: u8,
        /// Checksum carried in byte 5
        found: u8,
    },
    /// Opcode has no entry in the command table
    UnknownOpcode(u8),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Config(e) => write!(f, "Configuration error: {}", e),
            Error::Motor(e) => write!(f, "Motor error: {}", e),
            Error::Driver(e) => write!(f, "Driver error: {}", e),
            Error::Protocol(e) => write!(f, "Protocol error: {}", e),
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::ParseError(msg) => write!(f, "Parse error: {}", msg),
            ConfigError::MissingField(field) => write!(f, "{} is required", field),
            ConfigError::InvalidMicrostepExponent(v) => {
                write!(f, "Invalid microstep exponent: {}. Valid values: 0-8", v)
            }
            ConfigError::InvalidDivider(v) => write!(f, "Invalid sub-microsecond divider: {}. Must be > 0", v),
            ConfigError::InvalidPulseWidth(v) => write!(f, "Invalid minimum pulse width: {} ticks. Must be > 0", v),
            ConfigError::InvalidTimeout(v) => write!(f, "Invalid interbyte timeout: {} ticks. Must be > 0", v),
            ConfigError::StepIntervalTooShort { interval, min_pulse_width } => write!(
                f,
                "Step interval {} ticks is shorter than the minimum pulse width {} ticks",
                interval, min_pulse_width
            ),
            ConfigError::InvalidCurrent { field, value } => {
                write!(f, "Invalid {}: {}. Must be 0-31", field, value)
            }
            ConfigError::InvalidHoldDelay(v) => write!(f, "Invalid hold delay: {}. Must be 0-15", v),
            #[cfg(feature = "std")]
            ConfigError::IoError(msg) => write!(f, "I/O error: {}", msg),
        }
    }
}

impl fmt::Display for MotorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MotorError::PinError => write!(f, "GPIO pin operation failed"),
            MotorError::InvalidChannel(ch) => write!(f, "Invalid motor channel {}", ch),
        }
    }
}

impl fmt::Display for DriverError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DriverError::Bus { address, register } => {
                write!(f, "Register write 0x{:02X} to chip {} failed", register, address)
            }
        }
    }
}

impl fmt::Display for ProtocolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProtocolError::ChecksumMismatch { expected, found } => {
                write!(f, "Checksum mismatch: expected 0x{:02X}, found 0x{:02X}", expected, found)
            }
            ProtocolError::UnknownOpcode(op) => write!(f, "Unknown opcode {}", op),
        }
    }
}

// Conversion impls
impl From<ConfigError> for Error {
    fn from(e: ConfigError) -> Self {
        Error::Config(e)
    }
}

impl From<MotorError> for Error {
    fn from(e: MotorError) -> Self {
        Error::Motor(e)
    }
}

impl From<DriverError> for Error {
    fn from(e: DriverError) -> Self {
        Error::Driver(e)
    }
}

impl From<ProtocolError> for Error {
    fn from(e: ProtocolError) -> Self {
        Error::Protocol(e)
    }
}

#[cfg(feature = "std")]
impl std::error::Error for Error {}

#[cfg(feature = "std")]
impl std::error::Error for ConfigError {}

#[cfg(feature = "std")]
impl std::error::Error for MotorError {}

#[cfg(feature = "std")]
impl std::error::Error for DriverError {}

#[cfg(feature = "std")]
impl std::error::Error for ProtocolError {}
