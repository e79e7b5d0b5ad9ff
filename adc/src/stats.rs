//! Diagnostic counters

use core::sync::atomic::{AtomicU32, Ordering};

use f1_hal::adc::ErrorCode;

/// Per-device event and error counters
///
/// Counters only ever increase. They are bumped through `&self` so error
/// callbacks running outside the caller's context can use them.
#[derive(Debug, Default)]
pub struct AdcStats {
    events: AtomicU32,
    errors: AtomicU32,
    dma_xfer_failed: AtomicU32,
    dma_xfer_aborted: AtomicU32,
    dma_xfer_complete: AtomicU32,
    dma_start_error: AtomicU32,
    dma_overrun: AtomicU32,
    internal_error: AtomicU32,
}

/// Point-in-time copy of [`AdcStats`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct StatsSnapshot {
    /// Completed conversions
    pub events: u32,
    pub errors: u32,
    pub dma_xfer_failed: u32,
    pub dma_xfer_aborted: u32,
    pub dma_xfer_complete: u32,
    /// Conversion start refused
    pub dma_start_error: u32,
    pub dma_overrun: u32,
    pub internal_error: u32,
}

fn bump(counter: &AtomicU32) {
    counter.fetch_add(1, Ordering::Relaxed);
}

impl AdcStats {
    pub const fn new() -> Self {
        Self {
            events: AtomicU32::new(0),
            errors: AtomicU32::new(0),
            dma_xfer_failed: AtomicU32::new(0),
            dma_xfer_aborted: AtomicU32::new(0),
            dma_xfer_complete: AtomicU32::new(0),
            dma_start_error: AtomicU32::new(0),
            dma_overrun: AtomicU32::new(0),
            internal_error: AtomicU32::new(0),
        }
    }

    pub(crate) fn record_event(&self) {
        bump(&self.events);
    }

    pub(crate) fn record_start_error(&self) {
        bump(&self.dma_start_error);
    }

    /// Account for a converter error callback.
    ///
    /// Counts one generic error plus, at most, one class: DMA before overrun
    /// before internal.
    pub(crate) fn record_error(&self, code: ErrorCode) {
        bump(&self.errors);
        if code.contains(ErrorCode::DMA) {
            bump(&self.dma_xfer_failed);
        } else if code.contains(ErrorCode::OVERRUN) {
            bump(&self.dma_overrun);
        } else if code.contains(ErrorCode::INTERNAL) {
            bump(&self.internal_error);
        }
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            events: self.events.load(Ordering::Relaxed),
            errors: self.errors.load(Ordering::Relaxed),
            dma_xfer_failed: self.dma_xfer_failed.load(Ordering::Relaxed),
            dma_xfer_aborted: self.dma_xfer_aborted.load(Ordering::Relaxed),
            dma_xfer_complete: self.dma_xfer_complete.load(Ordering::Relaxed),
            dma_start_error: self.dma_start_error.load(Ordering::Relaxed),
            dma_overrun: self.dma_overrun.load(Ordering::Relaxed),
            internal_error: self.internal_error.load(Ordering::Relaxed),
        }
    }
}
