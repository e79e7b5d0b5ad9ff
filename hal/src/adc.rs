//! ADC (Analog-to-Digital Converter) vendor HAL seam

use core::fmt;

use crate::error::{HalError, HalResult};

/// Channel wired to the on-chip temperature sensor.
pub const CHANNEL_TEMPSENSOR: u8 = 16;

/// Channel wired to the internal reference voltage.
pub const CHANNEL_VREFINT: u8 = 17;

/// Highest channel number any STM32F1 converter accepts.
pub const MAX_CHANNEL: u8 = CHANNEL_VREFINT;

/// Returns `true` for the two channels that sample on-chip sensors rather than a pin.
pub const fn is_internal_channel(channel: u8) -> bool {
    channel == CHANNEL_TEMPSENSOR || channel == CHANNEL_VREFINT
}

/// Converter instance identity
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum AdcInstance {
    Adc1,
    Adc2,
    Adc3,
}

impl AdcInstance {
    /// One-based instance number as printed in the reference manual
    pub const fn number(self) -> u8 {
        match self {
            Self::Adc1 => 1,
            Self::Adc2 => 2,
            Self::Adc3 => 3,
        }
    }

    /// Only ADC1 has the temperature sensor and VREFINT connected.
    pub const fn has_internal_channels(self) -> bool {
        matches!(self, Self::Adc1)
    }

    /// Whether `channel` is part of this instance's legal channel set.
    pub const fn is_legal_channel(self, channel: u8) -> bool {
        if is_internal_channel(channel) {
            self.has_internal_channels()
        } else {
            channel < CHANNEL_TEMPSENSOR
        }
    }
}

impl fmt::Display for AdcInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ADC{}", self.number())
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for AdcInstance {
    fn format(&self, fmt: defmt::Formatter) {
        defmt::write!(fmt, "ADC{}", self.number());
    }
}

/// ADC sampling time, in ADC clock cycles
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SampleTime {
    /// 1.5 cycles
    #[default]
    Cycles1_5,
    /// 7.5 cycles
    Cycles7_5,
    /// 13.5 cycles
    Cycles13_5,
    /// 28.5 cycles
    Cycles28_5,
    /// 41.5 cycles
    Cycles41_5,
    /// 55.5 cycles
    Cycles55_5,
    /// 71.5 cycles
    Cycles71_5,
    /// 239.5 cycles
    Cycles239_5,
}

impl SampleTime {
    /// Value written to the SMPx field
    pub const fn bits(self) -> u8 {
        match self {
            Self::Cycles1_5 => 0,
            Self::Cycles7_5 => 1,
            Self::Cycles13_5 => 2,
            Self::Cycles28_5 => 3,
            Self::Cycles41_5 => 4,
            Self::Cycles55_5 => 5,
            Self::Cycles71_5 => 6,
            Self::Cycles239_5 => 7,
        }
    }
}

/// Per-channel parameters handed to the converter programming primitive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ChannelParams {
    /// Channel number (0-17)
    pub channel: u8,
    /// Position in the regular sequence (1-16)
    pub rank: u8,
    pub sample_time: SampleTime,
}

impl ChannelParams {
    /// Highest rank in the regular sequence.
    pub const MAX_RANK: u8 = 16;

    /// Parameters for `channel` as the only conversion in the sequence.
    pub const fn single(channel: u8, sample_time: SampleTime) -> Self {
        Self {
            channel,
            rank: 1,
            sample_time,
        }
    }
}

/// Data register alignment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DataAlign {
    #[default]
    Right,
    Left,
}

/// Source that starts a regular conversion
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ExternalTrigger {
    Timer1Cc1,
    Timer1Cc2,
    Timer1Cc3,
    Timer2Cc2,
    Timer3Trgo,
    Timer4Cc4,
    Exti11,
    /// Conversion started by writing SWSTART
    #[default]
    SoftwareStart,
}

/// Converter-wide initialisation parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ConverterInit {
    pub data_align: DataAlign,
    pub scan_mode: bool,
    pub continuous: bool,
    pub discontinuous: bool,
    pub external_trigger: ExternalTrigger,
    /// Length of the regular sequence (1-16)
    pub conversions: u8,
}

impl Default for ConverterInit {
    fn default() -> Self {
        Self {
            data_align: DataAlign::Right,
            scan_mode: false,
            continuous: false,
            discontinuous: false,
            external_trigger: ExternalTrigger::SoftwareStart,
            conversions: 1,
        }
    }
}

/// Error flags latched by the vendor HAL after a failed operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ErrorCode(pub u32);

impl ErrorCode {
    pub const NONE: Self = Self(0x00);
    /// ADC IP internal error
    pub const INTERNAL: Self = Self(0x01);
    /// Overrun
    pub const OVERRUN: Self = Self(0x02);
    /// DMA transfer error
    pub const DMA: Self = Self(0x04);

    /// Returns `true` if every flag in `other` is set.
    pub const fn contains(self, other: Self) -> bool {
        other.0 != 0 && self.0 & other.0 == other.0
    }

    pub const fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for ErrorCode {
    fn format(&self, fmt: defmt::Formatter) {
        defmt::write!(fmt, "ErrorCode({=u32:#x})", self.0);
    }
}

/// Converter handle as exposed by the vendor HAL
///
/// Every method maps onto one vendor call. Implementations do no sequencing of
/// their own; calibrate/start/poll/stop ordering is the driver's job.
pub trait AdcPeripheral {
    /// Which converter this handle drives
    fn instance(&self) -> AdcInstance;

    /// Program converter-wide registers
    fn init(&mut self, init: &ConverterInit) -> HalResult<()>;

    /// Program one channel of the regular sequence
    fn config_channel(&mut self, params: &ChannelParams) -> HalResult<()>;

    /// Run the self-calibration sequence
    fn calibrate(&mut self) -> HalResult<()>;

    /// Start a regular conversion
    fn start(&mut self) -> HalResult<()>;

    /// Check for end of conversion
    ///
    /// Returns `WouldBlock` while the conversion is still running.
    fn poll_conversion(&mut self) -> nb::Result<(), HalError>;

    /// Read the data register
    fn value(&mut self) -> u32;

    /// Stop conversions and power the converter down
    fn stop(&mut self) -> HalResult<()>;

    /// Error flags from the last failed operation
    fn error_code(&self) -> ErrorCode;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_adc1_accepts_internal_channels() {
        assert!(AdcInstance::Adc1.is_legal_channel(CHANNEL_TEMPSENSOR));
        assert!(AdcInstance::Adc1.is_legal_channel(CHANNEL_VREFINT));
        assert!(!AdcInstance::Adc2.is_legal_channel(CHANNEL_TEMPSENSOR));
        assert!(!AdcInstance::Adc3.is_legal_channel(CHANNEL_VREFINT));
    }

    #[test]
    fn channels_above_17_are_illegal_everywhere() {
        for instance in [AdcInstance::Adc1, AdcInstance::Adc2, AdcInstance::Adc3] {
            assert!(instance.is_legal_channel(0));
            assert!(instance.is_legal_channel(15));
            assert!(!instance.is_legal_channel(18));
            assert!(!instance.is_legal_channel(u8::MAX));
        }
    }

    #[test]
    fn error_code_flags() {
        let code = ErrorCode::OVERRUN.union(ErrorCode::INTERNAL);
        assert!(code.contains(ErrorCode::OVERRUN));
        assert!(code.contains(ErrorCode::INTERNAL));
        assert!(!code.contains(ErrorCode::DMA));
        assert!(!code.contains(ErrorCode::NONE));
    }

    #[test]
    fn sample_time_bits_follow_register_encoding() {
        assert_eq!(SampleTime::Cycles1_5.bits(), 0);
        assert_eq!(SampleTime::Cycles239_5.bits(), 7);
    }
}
