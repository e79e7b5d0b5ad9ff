//! Device registration and open/close lifecycle

use heapless::Vec;

use f1_hal::adc::{
    is_internal_channel, AdcInstance, AdcPeripheral, ChannelParams, ErrorCode, ExternalTrigger,
    MAX_CHANNEL,
};
use f1_hal::clock::ClockControl;
use f1_hal::gpio::GpioController;
use f1_hal::os::{OsMutex, WaitPolicy};

use crate::clock::ClockGate;
use crate::config::{AdcDeviceConfig, DriverConfig};
use crate::error::{AdcError, AdcResult};
use crate::pins;
use crate::stats::{AdcStats, StatsSnapshot};
use crate::wait::WaitStrategy;

/// Channels addressable on one converter, internal sensors included.
pub const MAX_CHANNELS: usize = MAX_CHANNEL as usize + 1;

/// Device lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LifecycleState {
    Closed,
    Opening,
    Open,
    Closing,
}

/// Runtime state of one channel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ChannelState {
    pub configured: bool,
    /// Result width in bits
    pub resolution: u8,
    pub reference_mv: u16,
    pub channel: u8,
    /// Parameters last programmed for this channel
    pub params: Option<ChannelParams>,
}

impl ChannelState {
    pub(crate) const fn unconfigured(channel: u8) -> Self {
        Self {
            configured: false,
            resolution: 0,
            reference_mv: 0,
            channel,
            params: None,
        }
    }
}

/// Hardware handed to the device at registration
pub struct Peripherals<A, G, C, W> {
    pub adc: A,
    pub gpio: G,
    pub rcc: C,
    pub wait: W,
}

pub(crate) struct Inner<A, G, C, W> {
    pub(crate) state: LifecycleState,
    pub(crate) adc: A,
    pub(crate) gpio: G,
    pub(crate) clock: ClockGate<C>,
    pub(crate) wait: W,
    pub(crate) channels: Vec<ChannelState, MAX_CHANNELS>,
    /// Channel currently programmed into the regular sequence
    pub(crate) active_channel: Option<u8>,
    /// A software-triggered conversion may still be running
    pub(crate) triggered: bool,
}

/// An ADC exposed as a lockable, channel-addressable device
///
/// Callers obtain an [`AdcSession`] from [`open`](Self::open); every channel
/// operation goes through the session, and dropping it closes the device.
pub struct AdcDevice<'a, A, G, C, W, M> {
    pub(crate) config: &'a AdcDeviceConfig<'a>,
    pub(crate) driver: DriverConfig,
    lock: M,
    pub(crate) stats: AdcStats,
    pub(crate) inner: spin::Mutex<Inner<A, G, C, W>>,
}

impl<'a, A, G, C, W, M> AdcDevice<'a, A, G, C, W, M>
where
    A: AdcPeripheral,
    G: GpioController,
    C: ClockControl,
    W: WaitStrategy,
    M: OsMutex,
{
    /// Bind a device configuration to its hardware.
    ///
    /// Fails with `InvalidArgument` if the converter handle is for another
    /// instance, the channel count is outside `1..=MAX_CHANNELS`, the converter
    /// is not software triggered, or the polling interval is zero.
    pub fn register(
        config: &'a AdcDeviceConfig<'a>,
        driver: DriverConfig,
        peripherals: Peripherals<A, G, C, W>,
        lock: M,
    ) -> AdcResult<Self> {
        let count = config.channel_count();
        if count == 0 || count > MAX_CHANNELS {
            return Err(AdcError::InvalidArgument);
        }
        if peripherals.adc.instance() != config.instance {
            return Err(AdcError::InvalidArgument);
        }
        let init = &config.init;
        if init.external_trigger != ExternalTrigger::SoftwareStart
            || init.conversions == 0
            || init.conversions > ChannelParams::MAX_RANK
        {
            return Err(AdcError::InvalidArgument);
        }
        if driver.poll_interval_us == 0 {
            return Err(AdcError::InvalidArgument);
        }

        let mut channels = Vec::new();
        for channel in 0..count as u8 {
            channels
                .push(ChannelState::unconfigured(channel))
                .map_err(|_| AdcError::InvalidArgument)?;
        }

        let Peripherals {
            adc,
            gpio,
            rcc,
            wait,
        } = peripherals;
        let clock = ClockGate::new(rcc, driver.clock_tree, driver.clock_flag);

        Ok(Self {
            config,
            driver,
            lock,
            stats: AdcStats::new(),
            inner: spin::Mutex::new(Inner {
                state: LifecycleState::Closed,
                adc,
                gpio,
                clock,
                wait,
                channels,
                active_channel: None,
                triggered: false,
            }),
        })
    }

    /// Open the device for exclusive use.
    ///
    /// Once the scheduler runs, the device lock is pended under `wait`:
    /// `NoWait` fails with `Busy`, an expired `Bounded` wait with `Timeout`.
    /// A device that is already open yields `Busy` and is left untouched; the
    /// task holding the lock gets `Busy` whatever its wait policy.
    ///
    /// # Panics
    ///
    /// If the converter clock cannot be enabled or initialisation fails.
    pub fn open(&self, wait: WaitPolicy) -> AdcResult<AdcSession<'_, A, G, C, W, M>> {
        let pended = self.lock.scheduler_started();
        if pended {
            if self.lock.held_by_caller() {
                return Err(AdcError::Busy);
            }
            self.lock.pend(wait).map_err(|_| match wait {
                WaitPolicy::NoWait => AdcError::Busy,
                _ => AdcError::Timeout,
            })?;
        }

        let instance = self.config.instance;
        let mut inner = self.inner.lock();
        if inner.state != LifecycleState::Closed {
            drop(inner);
            if pended {
                self.release_lock();
            }
            return Err(AdcError::Busy);
        }

        inner.state = LifecycleState::Opening;
        inner.clock.enable(instance);
        if let Err(err) = inner.adc.init(&self.config.init) {
            panic!("{instance} initialisation failed: {err}");
        }
        inner.state = LifecycleState::Open;
        log::debug!("{instance} opened");

        Ok(AdcSession {
            device: self,
            pended,
        })
    }

    /// Converter error callback.
    ///
    /// Safe to call from any context; only the statistics are touched.
    pub fn on_error(&self, code: ErrorCode) {
        self.stats.record_error(code);
    }

    pub fn stats(&self) -> StatsSnapshot {
        self.stats.snapshot()
    }

    pub fn state(&self) -> LifecycleState {
        self.inner.lock().state
    }

    pub fn instance(&self) -> AdcInstance {
        self.config.instance
    }

    pub fn config(&self) -> &AdcDeviceConfig<'a> {
        self.config
    }

    fn release_lock(&self) {
        if let Err(err) = self.lock.release() {
            log::error!("{}: lock release failed: {}", self.config.instance, err);
        }
    }
}

/// Exclusive access to an open [`AdcDevice`]
///
/// Dropping the session closes the device.
#[must_use = "dropping the session closes the device"]
pub struct AdcSession<'d, A, G, C, W, M>
where
    A: AdcPeripheral,
    G: GpioController,
    C: ClockControl,
    W: WaitStrategy,
    M: OsMutex,
{
    pub(crate) device: &'d AdcDevice<'d, A, G, C, W, M>,
    pended: bool,
}

impl<'d, A, G, C, W, M> AdcSession<'d, A, G, C, W, M>
where
    A: AdcPeripheral,
    G: GpioController,
    C: ClockControl,
    W: WaitStrategy,
    M: OsMutex,
{
    pub fn device(&self) -> &'d AdcDevice<'d, A, G, C, W, M> {
        self.device
    }

    /// Runtime state of `channel`, `None` beyond the channel count.
    pub fn channel(&self, channel: u8) -> Option<ChannelState> {
        self.device
            .inner
            .lock()
            .channels
            .get(usize::from(channel))
            .copied()
    }

    /// Close the device.
    ///
    /// Teardown is best effort and always completes, so the result is always
    /// `Ok`. Pins that cannot be released are logged and left bound.
    pub fn close(self) -> AdcResult<()> {
        drop(self);
        Ok(())
    }

    fn teardown(&mut self) {
        let device = self.device;
        let instance = device.config.instance;
        let mut guard = device.inner.lock();
        let inner = &mut *guard;
        inner.state = LifecycleState::Closing;

        if inner.triggered {
            if let Err(err) = inner.adc.stop() {
                log::warn!("{instance}: stop failed during close: {err}");
            }
            inner.triggered = false;
        }

        for ch in inner.channels.iter_mut() {
            if ch.configured && !is_internal_channel(ch.channel) {
                release_pin(&mut inner.gpio, instance, ch.channel);
            }
            *ch = ChannelState::unconfigured(ch.channel);
        }

        inner.clock.disable(instance);
        inner.active_channel = None;
        inner.state = LifecycleState::Closed;
        drop(guard);

        if self.pended {
            device.release_lock();
        }
        log::debug!("{instance} closed");
    }
}

impl<A, G, C, W, M> Drop for AdcSession<'_, A, G, C, W, M>
where
    A: AdcPeripheral,
    G: GpioController,
    C: ClockControl,
    W: WaitStrategy,
    M: OsMutex,
{
    fn drop(&mut self) {
        self.teardown();
    }
}

fn release_pin<G: GpioController>(gpio: &mut G, instance: AdcInstance, channel: u8) {
    match pins::resolve(instance, channel) {
        Ok(pin) => {
            if let Err(err) = gpio.deinit(&pin) {
                log::error!("{instance} channel {channel}: cannot release {}: {err}", pin.pin);
            }
        }
        Err(err) => log::error!("{instance} channel {channel}: {err}"),
    }
}
