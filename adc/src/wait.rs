//! How the sampling engine passes time between end-of-conversion polls

use embedded_hal::delay::DelayNs;

/// Wait strategy used between polls
///
/// The engine accounts elapsed time itself from `interval_us`; a strategy only
/// decides what the caller's thread does meanwhile.
pub trait WaitStrategy {
    fn pause(&mut self, interval_us: u32);
}

/// Busy-wait on a delay provider. The scheduler does not run meanwhile.
pub struct BusyPoll<D> {
    delay: D,
}

impl<D: DelayNs> BusyPoll<D> {
    pub fn new(delay: D) -> Self {
        Self { delay }
    }

    pub fn into_inner(self) -> D {
        self.delay
    }
}

impl<D: DelayNs> WaitStrategy for BusyPoll<D> {
    fn pause(&mut self, interval_us: u32) {
        self.delay.delay_us(interval_us);
    }
}

/// Hands each interval to a scheduler hook, e.g. an OS sleep, so other tasks
/// can run while the conversion completes.
pub struct Cooperative<F> {
    yield_for: F,
}

impl<F: FnMut(u32)> Cooperative<F> {
    pub fn new(yield_for: F) -> Self {
        Self { yield_for }
    }
}

impl<F: FnMut(u32)> WaitStrategy for Cooperative<F> {
    fn pause(&mut self, interval_us: u32) {
        (self.yield_for)(interval_us);
    }
}

/// Cycle-counted busy wait for Cortex-M targets without a delay provider.
#[cfg(feature = "cortex-m")]
pub struct CycleWait {
    cycles_per_us: u32,
}

#[cfg(feature = "cortex-m")]
impl CycleWait {
    pub const fn new(sysclk_hz: u32) -> Self {
        Self {
            cycles_per_us: sysclk_hz / 1_000_000,
        }
    }
}

#[cfg(feature = "cortex-m")]
impl WaitStrategy for CycleWait {
    fn pause(&mut self, interval_us: u32) {
        cortex_m::asm::delay(interval_us.saturating_mul(self.cycles_per_us));
    }
}
