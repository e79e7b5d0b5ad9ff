//! Open/close lifecycle of a registered device.

mod common;

use std::thread;
use std::time::Duration;

use adc_stm32f1::{
    AdcDevice, AdcError, BusyPoll, ChannelParams, DriverConfig, LifecycleState, Peripherals,
    SampleTime, StatsSnapshot, CHANNEL_TEMPSENSOR,
};
use common::{device_config, new_lock, Bench, Device, Lock};
use f1_hal::adc::ExternalTrigger;
use f1_hal::gpio::{PinConfig, PinId, Port};
use f1_hal::mock::{GpioEvent, MockAdc, MockClock, MockDelay, MockGpio};
use f1_hal::{AdcInstance, ConverterInit, WaitPolicy};

fn params(channel: u8) -> ChannelParams {
    ChannelParams::single(channel, SampleTime::Cycles28_5)
}

fn register(
    config: &'static adc_stm32f1::AdcDeviceConfig<'static>,
    driver: DriverConfig,
    instance: AdcInstance,
) -> Result<Device, AdcError> {
    let lock: Lock = new_lock();
    AdcDevice::register(
        config,
        driver,
        Peripherals {
            adc: MockAdc::new(instance),
            gpio: MockGpio::new(),
            rcc: MockClock::new(),
            wait: BusyPoll::new(MockDelay::new()),
        },
        lock,
    )
}

#[test]
fn open_close_round_trip() {
    let bench = Bench::new(AdcInstance::Adc1);
    assert_eq!(bench.device.state(), LifecycleState::Closed);

    let session = bench.device.open(WaitPolicy::NoWait).unwrap();
    assert_eq!(bench.device.state(), LifecycleState::Open);
    assert!(bench.lock.is_locked());
    assert_eq!(bench.clock.state().enabled, vec![AdcInstance::Adc1]);
    assert_eq!(bench.adc.state().init_calls, 1);
    assert_eq!(bench.adc.state().last_init, Some(ConverterInit::default()));

    session.close().unwrap();
    assert_eq!(bench.device.state(), LifecycleState::Closed);
    assert!(!bench.lock.is_locked());
    assert!(bench.clock.state().enabled.is_empty());
}

#[test]
fn dropping_session_closes_device() {
    let bench = Bench::new(AdcInstance::Adc2);
    {
        let _session = bench.device.open(WaitPolicy::Forever).unwrap();
        assert_eq!(bench.device.state(), LifecycleState::Open);
    }
    assert_eq!(bench.device.state(), LifecycleState::Closed);
    assert!(!bench.lock.is_locked());
    assert_eq!(bench.clock.state().disable_calls, 1);
}

#[test]
fn second_open_is_busy_and_changes_nothing() {
    let bench = Bench::new(AdcInstance::Adc1);
    let _session = bench.device.open(WaitPolicy::NoWait).unwrap();

    assert_eq!(bench.device.open(WaitPolicy::NoWait).err(), Some(AdcError::Busy));

    assert_eq!(bench.device.state(), LifecycleState::Open);
    assert_eq!(bench.device.stats(), StatsSnapshot::default());
    assert_eq!(bench.clock.state().enable_calls, 1);
    assert_eq!(bench.adc.state().init_calls, 1);
}

#[test]
fn holder_reopening_with_forever_wait_is_busy() {
    let bench = Bench::new(AdcInstance::Adc1);
    let _session = bench.device.open(WaitPolicy::NoWait).unwrap();

    assert_eq!(bench.device.open(WaitPolicy::Forever).err(), Some(AdcError::Busy));
    assert!(bench.lock.is_locked());
    assert_eq!(bench.clock.state().enable_calls, 1);
    assert_eq!(bench.adc.state().init_calls, 1);
}

#[test]
fn holder_reopening_with_bounded_wait_is_busy() {
    let bench = Bench::new(AdcInstance::Adc1);
    let _session = bench.device.open(WaitPolicy::NoWait).unwrap();

    assert_eq!(
        bench.device.open(WaitPolicy::Bounded(3)).err(),
        Some(AdcError::Busy)
    );
    assert_eq!(bench.device.state(), LifecycleState::Open);
    assert_eq!(bench.device.stats(), StatsSnapshot::default());
}

#[test]
fn second_open_before_scheduler_start_is_busy() {
    let bench = Bench::new(AdcInstance::Adc1);
    bench.lock.set_scheduler_started(false);

    let session = bench.device.open(WaitPolicy::NoWait).unwrap();
    assert!(!bench.lock.is_locked());
    assert_eq!(bench.device.open(WaitPolicy::Forever).err(), Some(AdcError::Busy));
    assert_eq!(bench.clock.state().enable_calls, 1);

    drop(session);
    assert!(!bench.lock.is_locked());
    assert_eq!(bench.device.state(), LifecycleState::Closed);
}

#[test]
fn bounded_wait_on_device_held_elsewhere_times_out() {
    let bench = Bench::new(AdcInstance::Adc1);
    let _session = bench.device.open(WaitPolicy::NoWait).unwrap();

    let other = thread::scope(|s| {
        s.spawn(|| bench.device.open(WaitPolicy::Bounded(5)).err())
            .join()
            .unwrap()
    });
    assert_eq!(other, Some(AdcError::Timeout));
    assert_eq!(bench.device.state(), LifecycleState::Open);
    assert!(bench.lock.is_locked());
}

#[test]
fn waiting_open_proceeds_after_close() {
    let bench = Bench::new(AdcInstance::Adc1);
    let session = bench.device.open(WaitPolicy::NoWait).unwrap();

    thread::scope(|s| {
        let waiter = s.spawn(|| {
            let session = bench.device.open(WaitPolicy::Forever).unwrap();
            session.device().state()
        });
        thread::sleep(Duration::from_millis(20));
        drop(session);
        assert_eq!(waiter.join().unwrap(), LifecycleState::Open);
    });

    assert_eq!(bench.device.state(), LifecycleState::Closed);
    assert_eq!(bench.adc.state().init_calls, 2);
}

#[test]
fn clock_tree_configured_once_across_reopens() {
    let bench = Bench::new(AdcInstance::Adc1);
    for _ in 0..3 {
        bench.device.open(WaitPolicy::NoWait).unwrap().close().unwrap();
    }

    let clock = bench.clock.state();
    assert_eq!(clock.tree_configs.len(), 1);
    assert_eq!(clock.enable_calls, 3);
    assert_eq!(clock.disable_calls, 3);
    assert!(!bench.flag.is_set());
}

#[test]
fn preconfigured_clock_tree_is_left_alone() {
    let bench = Bench::new(AdcInstance::Adc1);
    bench.flag.set();

    let _session = bench.device.open(WaitPolicy::NoWait).unwrap();
    assert!(bench.clock.state().tree_configs.is_empty());
    assert_eq!(bench.clock.state().enabled, vec![AdcInstance::Adc1]);
}

#[test]
fn close_releases_pins_of_configured_channels() {
    let bench = Bench::new(AdcInstance::Adc1);
    let mut session = bench.device.open(WaitPolicy::NoWait).unwrap();
    session.configure_channel(0, &params(0)).unwrap();
    session.configure_channel(9, &params(9)).unwrap();
    session
        .configure_channel(CHANNEL_TEMPSENSOR, &params(CHANNEL_TEMPSENSOR))
        .unwrap();
    assert_eq!(bench.gpio.state().bound_pins().len(), 2);

    session.close().unwrap();

    let gpio = bench.gpio.state();
    assert!(gpio.bound_pins().is_empty());
    let deinits = gpio
        .events
        .iter()
        .filter(|e| matches!(e, GpioEvent::Deinit(_)))
        .count();
    assert_eq!(deinits, 2);
}

#[test]
fn pin_release_failure_does_not_abort_close() {
    let bench = Bench::new(AdcInstance::Adc1);
    bench.gpio.state().fail_deinit.push(PinId::new(Port::A, 0));

    let mut session = bench.device.open(WaitPolicy::NoWait).unwrap();
    session.configure_channel(0, &params(0)).unwrap();
    session.configure_channel(1, &params(1)).unwrap();
    assert_eq!(session.close(), Ok(()));

    assert_eq!(bench.device.state(), LifecycleState::Closed);
    assert!(!bench.lock.is_locked());
    assert!(bench.clock.state().enabled.is_empty());
    assert_eq!(bench.gpio.state().bound_pins(), vec![PinId::new(Port::A, 0)]);
    assert!(bench
        .gpio
        .state()
        .events
        .contains(&GpioEvent::Deinit(PinConfig::analog(PinId::new(Port::A, 1)))));
}

#[test]
fn reopened_device_starts_unconfigured() {
    let bench = Bench::new(AdcInstance::Adc1);
    let mut session = bench.device.open(WaitPolicy::NoWait).unwrap();
    session.configure_channel(4, &params(4)).unwrap();
    assert!(session.channel(4).unwrap().configured);
    session.close().unwrap();

    let mut session = bench.device.open(WaitPolicy::NoWait).unwrap();
    let state = session.channel(4).unwrap();
    assert!(!state.configured);
    assert_eq!(state.params, None);
    assert_eq!(
        session.read_channel(4),
        Err(AdcError::ChannelNotConfigured(4))
    );
}

#[test]
#[should_panic(expected = "ADC1 initialisation failed")]
fn converter_init_failure_halts() {
    let bench = Bench::new(AdcInstance::Adc1);
    bench.adc.state().fail_init = true;
    let _session = bench.device.open(WaitPolicy::NoWait);
}

#[test]
#[should_panic(expected = "cannot enable ADC3 clock")]
fn absent_converter_halts_on_open() {
    let clock = MockClock::with_instances(&[AdcInstance::Adc1, AdcInstance::Adc2]);
    let bench = Bench::with(AdcInstance::Adc3, 16, DriverConfig::default(), clock);
    let _session = bench.device.open(WaitPolicy::NoWait);
}

#[test]
fn registration_rejects_mismatched_instance() {
    let result = register(
        device_config(AdcInstance::Adc1, 4),
        DriverConfig::default(),
        AdcInstance::Adc2,
    );
    assert_eq!(result.err(), Some(AdcError::InvalidArgument));
}

#[test]
fn registration_rejects_bad_channel_counts() {
    for count in [0, 19] {
        let result = register(
            device_config(AdcInstance::Adc1, count),
            DriverConfig::default(),
            AdcInstance::Adc1,
        );
        assert_eq!(result.err(), Some(AdcError::InvalidArgument), "count {count}");
    }
}

#[test]
fn registration_requires_software_trigger() {
    let mut config = *device_config(AdcInstance::Adc1, 4);
    config.init = ConverterInit {
        external_trigger: ExternalTrigger::Timer3Trgo,
        ..ConverterInit::default()
    };
    let config = Box::leak(Box::new(config));

    let result = register(config, DriverConfig::default(), AdcInstance::Adc1);
    assert_eq!(result.err(), Some(AdcError::InvalidArgument));
}

#[test]
fn registration_requires_poll_interval() {
    let driver = DriverConfig::builder().poll_interval_us(0).build();
    let result = register(device_config(AdcInstance::Adc1, 4), driver, AdcInstance::Adc1);
    assert_eq!(result.err(), Some(AdcError::InvalidArgument));
}
