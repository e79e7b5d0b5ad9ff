//! Shared bench for driver integration tests.

#![allow(dead_code)]

use adc_stm32f1::{
    AdcDevice, AdcDeviceConfig, BusyPoll, ChannelConfig, DriverConfig, Peripherals, MAX_CHANNELS,
};
use f1_hal::clock::ClockTreeFlag;
use f1_hal::mock::{MockAdc, MockClock, MockDelay, MockGpio};
use f1_hal::{AdcInstance, ConverterInit, SpinOsMutex};
use std::sync::atomic::{AtomicU32, Ordering};

pub type Lock = &'static SpinOsMutex<MockDelay>;

pub type Device = AdcDevice<'static, MockAdc, MockGpio, MockClock, BusyPoll<MockDelay>, Lock>;

/// A registered device plus handles onto every mock behind it
pub struct Bench {
    pub adc: MockAdc,
    pub gpio: MockGpio,
    pub clock: MockClock,
    /// Time spent between end-of-conversion polls
    pub delay: MockDelay,
    pub lock: Lock,
    pub flag: &'static ClockTreeFlag,
    pub device: Device,
}

impl Bench {
    pub fn new(instance: AdcInstance) -> Self {
        Self::with(instance, MAX_CHANNELS, DriverConfig::default(), MockClock::new())
    }

    pub fn with_driver(instance: AdcInstance, driver: DriverConfig) -> Self {
        Self::with(instance, MAX_CHANNELS, driver, MockClock::new())
    }

    pub fn with(instance: AdcInstance, count: usize, mut driver: DriverConfig, clock: MockClock) -> Self {
        let flag: &'static ClockTreeFlag = Box::leak(Box::new(ClockTreeFlag::new()));
        driver.clock_flag = flag;

        let adc = MockAdc::new(instance);
        let gpio = MockGpio::new();
        let delay = MockDelay::new();
        let lock = new_lock();

        let device = AdcDevice::register(
            device_config(instance, count),
            driver,
            Peripherals {
                adc: adc.clone(),
                gpio: gpio.clone(),
                rcc: clock.clone(),
                wait: BusyPoll::new(delay.clone()),
            },
            lock,
        )
        .expect("register device");

        Self {
            adc,
            gpio,
            clock,
            delay,
            lock,
            flag,
            device,
        }
    }
}

/// Each test thread stands in for one OS task.
pub fn thread_task_id() -> u32 {
    static NEXT: AtomicU32 = AtomicU32::new(1);
    thread_local! {
        static ID: u32 = NEXT.fetch_add(1, Ordering::Relaxed);
    }
    ID.with(|id| *id)
}

pub fn new_lock() -> Lock {
    Box::leak(Box::new(SpinOsMutex::with_task_id(MockDelay::new(), thread_task_id)))
}

pub fn device_config(instance: AdcInstance, count: usize) -> &'static AdcDeviceConfig<'static> {
    let channels: &'static [ChannelConfig] =
        Box::leak(vec![ChannelConfig::default(); count].into_boxed_slice());
    Box::leak(Box::new(AdcDeviceConfig::new(
        instance,
        ConverterInit::default(),
        channels,
    )))
}
