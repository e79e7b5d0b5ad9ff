//! Channel configuration

use f1_hal::adc::{is_internal_channel, AdcPeripheral, ChannelParams};
use f1_hal::clock::ClockControl;
use f1_hal::gpio::GpioController;
use f1_hal::os::OsMutex;

use crate::config::AdcDeviceConfig;
use crate::device::{AdcSession, ChannelState};
use crate::error::{AdcError, AdcResult};
use crate::pins;
use crate::wait::WaitStrategy;

/// Program `channel` into the converter and bind its pin.
///
/// `channels` is only written once every step has succeeded.
pub(crate) fn configure<A, G>(
    adc: &mut A,
    gpio: &mut G,
    config: &AdcDeviceConfig<'_>,
    channels: &mut [ChannelState],
    channel: u8,
    params: &ChannelParams,
) -> AdcResult<()>
where
    A: AdcPeripheral,
    G: GpioController,
{
    let instance = config.instance;
    let index = usize::from(channel);
    if !instance.is_legal_channel(channel) || index >= channels.len() {
        return Err(AdcError::InvalidChannel(channel));
    }
    if params.channel != channel || params.rank == 0 || params.rank > ChannelParams::MAX_RANK {
        return Err(AdcError::InvalidArgument);
    }

    if let Err(err) = adc.config_channel(params) {
        log::error!("{instance} channel {channel}: programming rejected: {err}");
        return Err(err.into());
    }

    if !is_internal_channel(channel) {
        let pin = pins::resolve(instance, channel).map_err(|_| AdcError::ConfigurationFailed)?;
        if let Err(err) = gpio.init(&pin) {
            log::error!("{instance} channel {channel}: cannot bind {}: {err}", pin.pin);
            return Err(err.into());
        }
    }

    let meta = config.channels[index];
    channels[index] = ChannelState {
        configured: true,
        resolution: meta.resolution,
        reference_mv: meta.reference_mv,
        channel,
        params: Some(*params),
    };
    log::debug!("{instance} channel {channel} configured");
    Ok(())
}

impl<A, G, C, W, M> AdcSession<'_, A, G, C, W, M>
where
    A: AdcPeripheral,
    G: GpioController,
    C: ClockControl,
    W: WaitStrategy,
    M: OsMutex,
{
    /// Configure `channel` with `params`.
    ///
    /// Reconfiguring a channel replaces its parameters. On failure the
    /// channel keeps whatever state it had before the call.
    pub fn configure_channel(&mut self, channel: u8, params: &ChannelParams) -> AdcResult<()> {
        let device = self.device;
        let mut guard = device.inner.lock();
        let inner = &mut *guard;
        let result = configure(
            &mut inner.adc,
            &mut inner.gpio,
            device.config,
            &mut inner.channels,
            channel,
            params,
        );
        inner.active_channel = match result {
            Ok(()) => Some(channel),
            Err(_) => None,
        };
        result
    }
}
