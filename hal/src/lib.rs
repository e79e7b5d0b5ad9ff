//! Hardware seams for the STM32F1 ADC driver
//!
//! This crate describes the collaborators the ADC driver talks to without
//! owning: the vendor HAL that programs the converter registers, GPIO pin
//! setup, the clock tree, and the host OS mutex. Board support code implements
//! these traits on real hardware; the `mock` feature provides scripted
//! implementations for host tests.

#![cfg_attr(not(any(test, feature = "std")), no_std)]

pub mod error;
pub mod adc;
pub mod gpio;
pub mod clock;
pub mod os;

#[cfg(feature = "mock")]
pub mod mock;

// Re-export commonly used types
pub use error::{HalError, HalResult};
pub use adc::{AdcInstance, AdcPeripheral, ChannelParams, ConverterInit, ErrorCode};
pub use gpio::{GpioController, PinConfig, PinId};
pub use clock::{ClockControl, ClockTreeConfig, ClockTreeFlag};
pub use os::{OsError, OsMutex, SpinOsMutex, TaskId, WaitPolicy};
