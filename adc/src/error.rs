//! Driver status codes

use core::fmt;

use f1_hal::HalError;

/// Errors returned to callers of the ADC device
///
/// Hardware-identity and clock mistakes are not represented here; those halt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdcError {
    /// Device already open
    Busy,
    /// Lock wait exceeded its bound
    Timeout,
    /// Channel not wired on this instance or beyond the configured channel count
    InvalidChannel(u8),
    /// Malformed parameters
    InvalidArgument,
    /// Converter or pin programming rejected the parameters
    ConfigurationFailed,
    /// Channel sampled before being configured
    ChannelNotConfigured(u8),
    /// Calibration did not succeed within the configured attempts
    CalibrationFailed,
    /// Converter refused to start a conversion
    StartFailed,
    /// Converter reported an error while converting
    ConversionFailed,
    /// End of conversion not observed within the polling bound
    ConversionTimeout,
    /// Acquisition mode not available in this version
    NotImplemented,
}

impl fmt::Display for AdcError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Busy => write!(f, "device busy"),
            Self::Timeout => write!(f, "timed out waiting for device"),
            Self::InvalidChannel(ch) => write!(f, "invalid channel {ch}"),
            Self::InvalidArgument => write!(f, "invalid argument"),
            Self::ConfigurationFailed => write!(f, "channel configuration failed"),
            Self::ChannelNotConfigured(ch) => write!(f, "channel {ch} not configured"),
            Self::CalibrationFailed => write!(f, "calibration failed"),
            Self::StartFailed => write!(f, "conversion start failed"),
            Self::ConversionFailed => write!(f, "conversion failed"),
            Self::ConversionTimeout => write!(f, "conversion timed out"),
            Self::NotImplemented => write!(f, "not implemented"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for AdcError {}

#[cfg(feature = "defmt")]
impl defmt::Format for AdcError {
    fn format(&self, fmt: defmt::Formatter) {
        match self {
            Self::Busy => defmt::write!(fmt, "Busy"),
            Self::Timeout => defmt::write!(fmt, "Timeout"),
            Self::InvalidChannel(ch) => defmt::write!(fmt, "InvalidChannel({})", ch),
            Self::InvalidArgument => defmt::write!(fmt, "InvalidArgument"),
            Self::ConfigurationFailed => defmt::write!(fmt, "ConfigurationFailed"),
            Self::ChannelNotConfigured(ch) => defmt::write!(fmt, "ChannelNotConfigured({})", ch),
            Self::CalibrationFailed => defmt::write!(fmt, "CalibrationFailed"),
            Self::StartFailed => defmt::write!(fmt, "StartFailed"),
            Self::ConversionFailed => defmt::write!(fmt, "ConversionFailed"),
            Self::ConversionTimeout => defmt::write!(fmt, "ConversionTimeout"),
            Self::NotImplemented => defmt::write!(fmt, "NotImplemented"),
        }
    }
}

/// Programming primitives that reject their input surface as a configuration failure.
impl From<HalError> for AdcError {
    fn from(_: HalError) -> Self {
        Self::ConfigurationFailed
    }
}

/// Result type used throughout the driver
pub type AdcResult<T> = Result<T, AdcError>;
