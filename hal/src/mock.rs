//! Scripted HAL implementations for host-side tests
//!
//! Each mock is a cheap `Clone` handle over shared state: hand one clone to the
//! driver and keep another to script behaviour and inspect what happened.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use embedded_hal::delay::DelayNs;

use crate::adc::{AdcInstance, AdcPeripheral, ChannelParams, ConverterInit, ErrorCode};
use crate::clock::{ClockControl, ClockTreeConfig};
use crate::error::{HalError, HalResult};
use crate::gpio::{GpioController, PinConfig, PinId};

/// Converter state visible to tests
#[derive(Debug)]
pub struct AdcState {
    pub init_calls: u32,
    pub fail_init: bool,
    pub last_init: Option<ConverterInit>,
    /// Every successful `config_channel`, in order
    pub programmed: Vec<ChannelParams>,
    /// Channels whose programming is rejected
    pub reject_channels: Vec<u8>,
    /// Number of upcoming calibration attempts that fail
    pub calibration_failures: u32,
    pub calibration_attempts: u32,
    pub fail_start: bool,
    pub starts: u32,
    pub stops: u32,
    pub running: bool,
    /// Polls returning `WouldBlock` before completion; `None` never completes
    pub polls_to_complete: Option<u32>,
    pub polls: u32,
    remaining: Option<u32>,
    /// Error latched on the next poll
    pub poll_error: Option<ErrorCode>,
    /// Values returned by successive reads; `value` once drained
    pub values: VecDeque<u32>,
    pub value: u32,
    pub error_code: ErrorCode,
}

impl AdcState {
    fn new() -> Self {
        Self {
            init_calls: 0,
            fail_init: false,
            last_init: None,
            programmed: Vec::new(),
            reject_channels: Vec::new(),
            calibration_failures: 0,
            calibration_attempts: 0,
            fail_start: false,
            starts: 0,
            stops: 0,
            running: false,
            polls_to_complete: Some(0),
            polls: 0,
            remaining: None,
            poll_error: None,
            values: VecDeque::new(),
            value: 0,
            error_code: ErrorCode::NONE,
        }
    }

    /// Channel of the most recent `config_channel`
    pub fn active_channel(&self) -> Option<u8> {
        self.programmed.last().map(|p| p.channel)
    }
}

/// Scripted converter
#[derive(Debug, Clone)]
pub struct MockAdc {
    instance: AdcInstance,
    state: Arc<Mutex<AdcState>>,
}

impl MockAdc {
    pub fn new(instance: AdcInstance) -> Self {
        Self {
            instance,
            state: Arc::new(Mutex::new(AdcState::new())),
        }
    }

    pub fn state(&self) -> MutexGuard<'_, AdcState> {
        self.state.lock().unwrap()
    }
}

impl AdcPeripheral for MockAdc {
    fn instance(&self) -> AdcInstance {
        self.instance
    }

    fn init(&mut self, init: &ConverterInit) -> HalResult<()> {
        let mut state = self.state();
        state.init_calls += 1;
        if state.fail_init {
            state.error_code = ErrorCode::INTERNAL;
            return Err(HalError::Error);
        }
        state.last_init = Some(*init);
        Ok(())
    }

    fn config_channel(&mut self, params: &ChannelParams) -> HalResult<()> {
        let mut state = self.state();
        if state.reject_channels.contains(&params.channel) {
            return Err(HalError::InvalidParameter);
        }
        state.programmed.push(*params);
        Ok(())
    }

    fn calibrate(&mut self) -> HalResult<()> {
        let mut state = self.state();
        state.calibration_attempts += 1;
        if state.calibration_failures > 0 {
            state.calibration_failures -= 1;
            return Err(HalError::Error);
        }
        Ok(())
    }

    fn start(&mut self) -> HalResult<()> {
        let mut state = self.state();
        if state.fail_start {
            state.error_code = ErrorCode::INTERNAL;
            return Err(HalError::Error);
        }
        state.starts += 1;
        state.running = true;
        state.remaining = state.polls_to_complete;
        Ok(())
    }

    fn poll_conversion(&mut self) -> nb::Result<(), HalError> {
        let mut state = self.state();
        state.polls += 1;
        if !state.running {
            return Err(nb::Error::Other(HalError::Error));
        }
        if let Some(code) = state.poll_error.take() {
            state.error_code = code;
            return Err(nb::Error::Other(HalError::Error));
        }
        match state.remaining {
            None => Err(nb::Error::WouldBlock),
            Some(0) => Ok(()),
            Some(n) => {
                state.remaining = Some(n - 1);
                Err(nb::Error::WouldBlock)
            }
        }
    }

    fn value(&mut self) -> u32 {
        let mut state = self.state();
        match state.values.pop_front() {
            Some(value) => value,
            None => state.value,
        }
    }

    fn stop(&mut self) -> HalResult<()> {
        let mut state = self.state();
        state.stops += 1;
        state.running = false;
        Ok(())
    }

    fn error_code(&self) -> ErrorCode {
        self.state().error_code
    }
}

/// One recorded pin operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GpioEvent {
    Init(PinConfig),
    Deinit(PinConfig),
}

#[derive(Debug, Default)]
pub struct GpioState {
    pub events: Vec<GpioEvent>,
    pub fail_init: Vec<PinId>,
    pub fail_deinit: Vec<PinId>,
}

impl GpioState {
    /// Pins initialised and not yet deinitialised
    pub fn bound_pins(&self) -> Vec<PinId> {
        let mut pins = Vec::new();
        for event in &self.events {
            match event {
                GpioEvent::Init(cfg) => pins.push(cfg.pin),
                GpioEvent::Deinit(cfg) => pins.retain(|p| *p != cfg.pin),
            }
        }
        pins
    }
}

/// Recording GPIO controller
#[derive(Debug, Clone, Default)]
pub struct MockGpio {
    state: Arc<Mutex<GpioState>>,
}

impl MockGpio {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> MutexGuard<'_, GpioState> {
        self.state.lock().unwrap()
    }
}

impl GpioController for MockGpio {
    fn init(&mut self, config: &PinConfig) -> HalResult<()> {
        let mut state = self.state();
        if state.fail_init.contains(&config.pin) {
            return Err(HalError::Error);
        }
        state.events.push(GpioEvent::Init(*config));
        Ok(())
    }

    fn deinit(&mut self, config: &PinConfig) -> HalResult<()> {
        let mut state = self.state();
        if state.fail_deinit.contains(&config.pin) {
            return Err(HalError::Error);
        }
        state.events.push(GpioEvent::Deinit(*config));
        Ok(())
    }
}

#[derive(Debug)]
pub struct ClockState {
    /// Instances that exist on the simulated part
    pub present: Vec<AdcInstance>,
    pub fail_tree: bool,
    pub tree_configs: Vec<ClockTreeConfig>,
    pub enabled: Vec<AdcInstance>,
    pub enable_calls: u32,
    pub disable_calls: u32,
}

/// Recording RCC
#[derive(Debug, Clone)]
pub struct MockClock {
    state: Arc<Mutex<ClockState>>,
}

impl MockClock {
    /// RCC of a high-density part with all three converters.
    pub fn new() -> Self {
        Self::with_instances(&[AdcInstance::Adc1, AdcInstance::Adc2, AdcInstance::Adc3])
    }

    pub fn with_instances(present: &[AdcInstance]) -> Self {
        Self {
            state: Arc::new(Mutex::new(ClockState {
                present: present.to_vec(),
                fail_tree: false,
                tree_configs: Vec::new(),
                enabled: Vec::new(),
                enable_calls: 0,
                disable_calls: 0,
            })),
        }
    }

    pub fn state(&self) -> MutexGuard<'_, ClockState> {
        self.state.lock().unwrap()
    }
}

impl Default for MockClock {
    fn default() -> Self {
        Self::new()
    }
}

impl ClockControl for MockClock {
    fn configure_clock_tree(&mut self, config: &ClockTreeConfig) -> HalResult<()> {
        let mut state = self.state();
        if state.fail_tree {
            return Err(HalError::Error);
        }
        state.tree_configs.push(*config);
        Ok(())
    }

    fn enable_adc_clock(&mut self, instance: AdcInstance) -> HalResult<()> {
        let mut state = self.state();
        if !state.present.contains(&instance) {
            return Err(HalError::NotSupported);
        }
        state.enable_calls += 1;
        if !state.enabled.contains(&instance) {
            state.enabled.push(instance);
        }
        Ok(())
    }

    fn disable_adc_clock(&mut self, instance: AdcInstance) -> HalResult<()> {
        let mut state = self.state();
        if !state.present.contains(&instance) {
            return Err(HalError::NotSupported);
        }
        state.disable_calls += 1;
        state.enabled.retain(|i| *i != instance);
        Ok(())
    }
}

/// Delay that only accumulates the requested time
#[derive(Debug, Clone, Default)]
pub struct MockDelay {
    elapsed_ns: Arc<AtomicU64>,
}

impl MockDelay {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn elapsed_us(&self) -> u64 {
        self.elapsed_ns.load(Ordering::Relaxed) / 1_000
    }
}

impl DelayNs for MockDelay {
    fn delay_ns(&mut self, ns: u32) {
        self.elapsed_ns.fetch_add(ns as u64, Ordering::Relaxed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gpio::Port;

    #[test]
    fn conversion_completes_after_scripted_polls() {
        let mut adc = MockAdc::new(AdcInstance::Adc1);
        adc.state().polls_to_complete = Some(2);
        adc.state().value = 1234;

        adc.start().unwrap();
        assert_eq!(adc.poll_conversion(), Err(nb::Error::WouldBlock));
        assert_eq!(adc.poll_conversion(), Err(nb::Error::WouldBlock));
        assert_eq!(adc.poll_conversion(), Ok(()));
        assert_eq!(adc.value(), 1234);
    }

    #[test]
    fn bound_pins_track_init_and_deinit() {
        let mut gpio = MockGpio::new();
        let a0 = PinConfig::analog(PinId::new(Port::A, 0));
        let b1 = PinConfig::analog(PinId::new(Port::B, 1));
        gpio.init(&a0).unwrap();
        gpio.init(&b1).unwrap();
        gpio.deinit(&a0).unwrap();

        assert_eq!(gpio.state().bound_pins(), vec![b1.pin]);
    }

    #[test]
    fn absent_instance_is_not_supported() {
        let mut clock = MockClock::with_instances(&[AdcInstance::Adc1]);
        assert_eq!(
            clock.enable_adc_clock(AdcInstance::Adc3),
            Err(HalError::NotSupported)
        );
    }

    #[test]
    fn delay_accumulates() {
        let mut delay = MockDelay::new();
        delay.delay_us(250);
        delay.delay_ms(1);
        assert_eq!(delay.elapsed_us(), 1_250);
    }
}
