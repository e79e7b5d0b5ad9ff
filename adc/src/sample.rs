//! Blocking single-channel conversions

use f1_hal::adc::AdcPeripheral;
use f1_hal::clock::ClockControl;
use f1_hal::gpio::GpioController;
use f1_hal::os::OsMutex;

use crate::config::DriverConfig;
use crate::device::AdcSession;
use crate::error::{AdcError, AdcResult};
use crate::stats::AdcStats;
use crate::wait::WaitStrategy;

/// Bytes of sample storage for `channels` channels of `samples` samples each.
///
/// `None` if the size does not fit in `usize`.
pub const fn buffer_size(channels: usize, samples: usize) -> Option<usize> {
    match channels.checked_mul(samples) {
        Some(count) => count.checked_mul(core::mem::size_of::<u32>()),
        None => None,
    }
}

/// One calibrate/start/poll/read/stop cycle on a programmed converter
pub(crate) struct Sampler<'s, A, W> {
    pub(crate) adc: &'s mut A,
    pub(crate) wait: &'s mut W,
    pub(crate) config: &'s DriverConfig,
    pub(crate) stats: &'s AdcStats,
}

impl<A: AdcPeripheral, W: WaitStrategy> Sampler<'_, A, W> {
    pub(crate) fn convert(&mut self) -> AdcResult<u32> {
        self.calibrate()?;
        self.start()?;
        self.await_completion()?;
        let raw = self.adc.value();
        self.halt();
        self.stats.record_event();
        Ok(raw)
    }

    fn calibrate(&mut self) -> AdcResult<()> {
        let mut failures: u32 = 0;
        loop {
            match self.adc.calibrate() {
                Ok(()) => return Ok(()),
                Err(err) => {
                    failures = failures.saturating_add(1);
                    log::trace!("calibration attempt {failures} failed: {err}");
                    if let Some(limit) = self.config.calibration_attempts {
                        if failures >= limit.get() {
                            log::error!("calibration failed after {failures} attempts");
                            return Err(AdcError::CalibrationFailed);
                        }
                    }
                }
            }
        }
    }

    pub(crate) fn start(&mut self) -> AdcResult<()> {
        match self.adc.start() {
            Ok(()) => Ok(()),
            Err(err) => {
                self.stats.record_start_error();
                log::error!("conversion start failed: {err}");
                self.halt();
                Err(AdcError::StartFailed)
            }
        }
    }

    fn await_completion(&mut self) -> AdcResult<()> {
        let timeout_us = self.config.conversion_timeout_us();
        let interval_us = self.config.poll_interval_us;
        let mut waited_us: u64 = 0;
        loop {
            match self.adc.poll_conversion() {
                Ok(()) => return Ok(()),
                Err(nb::Error::WouldBlock) => {
                    if waited_us >= timeout_us {
                        log::error!("no end of conversion after {} ms", self.config.conversion_timeout_ms);
                        self.halt();
                        return Err(AdcError::ConversionTimeout);
                    }
                    self.wait.pause(interval_us);
                    waited_us += u64::from(interval_us);
                }
                Err(nb::Error::Other(err)) => {
                    self.stats.record_error(self.adc.error_code());
                    log::error!("conversion failed: {err}");
                    self.halt();
                    return Err(AdcError::ConversionFailed);
                }
            }
        }
    }

    pub(crate) fn halt(&mut self) {
        if let Err(err) = self.adc.stop() {
            log::warn!("converter stop failed: {err}");
        }
    }
}

impl<A, G, C, W, M> AdcSession<'_, A, G, C, W, M>
where
    A: AdcPeripheral,
    G: GpioController,
    C: ClockControl,
    W: WaitStrategy,
    M: OsMutex,
{
    /// Convert `channel` once and return the raw result.
    ///
    /// The channel is re-programmed first if another channel was converted
    /// last. The converter is left stopped whatever the outcome.
    pub fn read_channel(&mut self, channel: u8) -> AdcResult<u32> {
        let device = self.device;
        let mut guard = device.inner.lock();
        let inner = &mut *guard;

        let state = inner
            .channels
            .get(usize::from(channel))
            .copied()
            .ok_or(AdcError::InvalidChannel(channel))?;
        let params = match state.params {
            Some(params) if state.configured => params,
            _ => return Err(AdcError::ChannelNotConfigured(channel)),
        };

        if inner.active_channel != Some(channel) {
            if let Err(err) = inner.adc.config_channel(&params) {
                inner.active_channel = None;
                log::error!("{} channel {channel}: re-programming failed: {err}", device.config.instance);
                return Err(err.into());
            }
            inner.active_channel = Some(channel);
        }

        let mut sampler = Sampler {
            adc: &mut inner.adc,
            wait: &mut inner.wait,
            config: &device.driver,
            stats: &device.stats,
        };
        if inner.triggered {
            sampler.halt();
            inner.triggered = false;
        }
        sampler.convert()
    }

    /// Software-trigger a conversion of the programmed sequence.
    ///
    /// Collect the result with [`fetch`](Self::fetch).
    pub fn sample(&mut self) -> AdcResult<()> {
        let device = self.device;
        let mut guard = device.inner.lock();
        let inner = &mut *guard;
        if inner.active_channel.is_none() {
            return Err(AdcError::InvalidArgument);
        }

        let mut sampler = Sampler {
            adc: &mut inner.adc,
            wait: &mut inner.wait,
            config: &device.driver,
            stats: &device.stats,
        };
        sampler.start()?;
        inner.triggered = true;
        Ok(())
    }

    /// Non-blocking completion of a conversion started by [`sample`](Self::sample).
    pub fn fetch(&mut self) -> nb::Result<u32, AdcError> {
        let device = self.device;
        let mut guard = device.inner.lock();
        let inner = &mut *guard;
        if !inner.triggered {
            return Err(nb::Error::Other(AdcError::InvalidArgument));
        }

        match inner.adc.poll_conversion() {
            Ok(()) => {
                let raw = inner.adc.value();
                inner.triggered = false;
                if let Err(err) = inner.adc.stop() {
                    log::warn!("converter stop failed: {err}");
                }
                device.stats.record_event();
                Ok(raw)
            }
            Err(nb::Error::WouldBlock) => Err(nb::Error::WouldBlock),
            Err(nb::Error::Other(err)) => {
                device.stats.record_error(inner.adc.error_code());
                inner.triggered = false;
                if let Err(stop_err) = inner.adc.stop() {
                    log::warn!("converter stop failed: {stop_err}");
                }
                log::error!("conversion failed: {err}");
                Err(nb::Error::Other(AdcError::ConversionFailed))
            }
        }
    }

    /// Sample at `offset` of a buffer previously filled by the driver.
    ///
    /// # Panics
    ///
    /// If `offset` is outside `buffer`.
    pub fn read_buffer(&self, buffer: &[u32], offset: usize) -> AdcResult<u32> {
        assert!(
            offset < buffer.len(),
            "read_buffer offset {offset} outside buffer of {}",
            buffer.len()
        );
        Ok(buffer[offset])
    }

    /// Hand the driver buffers for continuous acquisition.
    ///
    /// # Panics
    ///
    /// Always: buffered acquisition is not part of this driver yet.
    pub fn set_buffer(&mut self, _primary: &mut [u32], _secondary: Option<&mut [u32]>) -> AdcResult<()> {
        self.buffers_unsupported("set_buffer")
    }

    /// # Panics
    ///
    /// Always, see [`set_buffer`](Self::set_buffer).
    pub fn release_buffer(&mut self, _buffer: &mut [u32]) -> AdcResult<()> {
        self.buffers_unsupported("release_buffer")
    }

    /// Bytes of buffer needed for `channels` channels of `samples` samples.
    pub fn size_buffer(&self, channels: usize, samples: usize) -> Option<usize> {
        buffer_size(channels, samples)
    }

    fn buffers_unsupported(&self, op: &str) -> ! {
        let mode = self.device.driver.mode;
        debug_assert!(!mode.supports_buffers());
        panic!("{op}: {} in {mode:?} mode", AdcError::NotImplemented);
    }
}
