//! STM32F1 ADC device driver
//!
//! Exposes the on-chip analog-to-digital converters as lockable,
//! channel-addressable devices. A device is registered once with its
//! hardware, opened for exclusive use, has channels configured on it, and is
//! sampled one blocking conversion at a time:
//!
//! 1. [`AdcDevice::register`] binds an [`AdcDeviceConfig`] to the converter,
//!    GPIO, clock and wait collaborators.
//! 2. [`AdcDevice::open`] takes the device lock, gates the clock on and
//!    initialises the converter.
//! 3. [`AdcSession::configure_channel`] programs a channel and binds its pin.
//! 4. [`AdcSession::read_channel`] calibrates, converts and returns the raw
//!    result.
//! 5. Dropping the session (or [`AdcSession::close`]) releases pins, gates the
//!    clock off and unlocks the device.
//!
//! Conditions that indicate a broken build (an absent converter, a clock the
//! part cannot produce, failed converter initialisation) halt with a panic
//! rather than surfacing as [`AdcError`].

#![cfg_attr(not(any(test, feature = "std")), no_std)]

pub mod channel;
pub mod clock;
pub mod config;
pub mod device;
pub mod error;
pub mod pins;
pub mod sample;
pub mod stats;
pub mod wait;

pub use clock::ClockGate;
pub use config::{
    AcquisitionMode, AdcDeviceConfig, ChannelConfig, DriverConfig, DriverConfigBuilder,
    DEFAULT_CONVERSION_TIMEOUT_MS, DEFAULT_POLL_INTERVAL_US,
};
pub use device::{AdcDevice, AdcSession, ChannelState, LifecycleState, Peripherals, MAX_CHANNELS};
pub use error::{AdcError, AdcResult};
pub use pins::resolve;
pub use sample::buffer_size;
pub use stats::{AdcStats, StatsSnapshot};
pub use wait::{BusyPoll, Cooperative, WaitStrategy};

#[cfg(feature = "cortex-m")]
pub use wait::CycleWait;

pub use f1_hal::adc::{SampleTime, CHANNEL_TEMPSENSOR, CHANNEL_VREFINT};
pub use f1_hal::{AdcInstance, ChannelParams, ConverterInit, ErrorCode, WaitPolicy};
