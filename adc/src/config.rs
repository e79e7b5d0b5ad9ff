//! Device descriptors and driver tuning

use core::num::NonZeroU32;

use f1_hal::adc::{AdcInstance, ConverterInit};
use f1_hal::clock::{ClockTreeConfig, ClockTreeFlag, CLOCK_TREE_CONFIGURED};

/// Static description of one channel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ChannelConfig {
    /// Result width in bits
    pub resolution: u8,
    /// Reference voltage in millivolts
    pub reference_mv: u16,
}

impl ChannelConfig {
    pub const fn new(resolution: u8, reference_mv: u16) -> Self {
        Self {
            resolution,
            reference_mv,
        }
    }
}

impl Default for ChannelConfig {
    /// 12-bit result against a 3.3 V reference.
    fn default() -> Self {
        Self::new(12, 3300)
    }
}

/// Externally supplied device descriptor
///
/// `channels` is indexed by channel number; its length is the channel count.
#[derive(Debug, Clone, Copy)]
pub struct AdcDeviceConfig<'a> {
    pub instance: AdcInstance,
    pub init: ConverterInit,
    pub channels: &'a [ChannelConfig],
}

impl<'a> AdcDeviceConfig<'a> {
    pub const fn new(instance: AdcInstance, init: ConverterInit, channels: &'a [ChannelConfig]) -> Self {
        Self {
            instance,
            init,
            channels,
        }
    }

    pub const fn channel_count(&self) -> usize {
        self.channels.len()
    }
}

/// Acquisition capabilities of the driver
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[non_exhaustive]
pub enum AcquisitionMode {
    /// One blocking conversion per request
    #[default]
    SingleBlocking,
}

impl AcquisitionMode {
    /// Whether caller-supplied sample buffers can be used
    pub const fn supports_buffers(self) -> bool {
        match self {
            Self::SingleBlocking => false,
        }
    }
}

/// Default end-of-conversion bound.
pub const DEFAULT_CONVERSION_TIMEOUT_MS: u32 = 10_000;

/// Default spacing between end-of-conversion polls.
pub const DEFAULT_POLL_INTERVAL_US: u32 = 1_000;

/// Driver tuning
#[derive(Debug, Clone, Copy)]
pub struct DriverConfig {
    pub conversion_timeout_ms: u32,
    pub poll_interval_us: u32,
    /// `None` retries calibration until it succeeds
    pub calibration_attempts: Option<NonZeroU32>,
    pub clock_tree: ClockTreeConfig,
    /// Set by whichever subsystem configured the clock tree first
    pub clock_flag: &'static ClockTreeFlag,
    pub mode: AcquisitionMode,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            conversion_timeout_ms: DEFAULT_CONVERSION_TIMEOUT_MS,
            poll_interval_us: DEFAULT_POLL_INTERVAL_US,
            calibration_attempts: None,
            clock_tree: ClockTreeConfig::default(),
            clock_flag: &CLOCK_TREE_CONFIGURED,
            mode: AcquisitionMode::SingleBlocking,
        }
    }
}

impl DriverConfig {
    /// Creates a new driver configuration builder.
    pub fn builder() -> DriverConfigBuilder {
        DriverConfigBuilder::default()
    }

    pub(crate) fn conversion_timeout_us(&self) -> u64 {
        u64::from(self.conversion_timeout_ms) * 1_000
    }
}

/// Builder for [`DriverConfig`]
#[derive(Debug, Clone, Default)]
pub struct DriverConfigBuilder {
    config: DriverConfig,
}

impl DriverConfigBuilder {
    /// Sets the end-of-conversion bound in milliseconds.
    pub fn conversion_timeout_ms(mut self, ms: u32) -> Self {
        self.config.conversion_timeout_ms = ms;
        self
    }

    /// Sets the spacing between end-of-conversion polls.
    pub fn poll_interval_us(mut self, us: u32) -> Self {
        self.config.poll_interval_us = us;
        self
    }

    /// Gives up calibration after `attempts` failures.
    pub fn calibration_attempts(mut self, attempts: NonZeroU32) -> Self {
        self.config.calibration_attempts = Some(attempts);
        self
    }

    /// Retries calibration until it succeeds.
    pub fn unbounded_calibration(mut self) -> Self {
        self.config.calibration_attempts = None;
        self
    }

    /// Sets the clock tree applied on first enable.
    pub fn clock_tree(mut self, tree: ClockTreeConfig) -> Self {
        self.config.clock_tree = tree;
        self
    }

    /// Uses a different shared clock-tree flag.
    pub fn clock_flag(mut self, flag: &'static ClockTreeFlag) -> Self {
        self.config.clock_flag = flag;
        self
    }

    pub fn mode(mut self, mode: AcquisitionMode) -> Self {
        self.config.mode = mode;
        self
    }

    /// Builds the driver configuration.
    pub fn build(self) -> DriverConfig {
        self.config
    }
}
