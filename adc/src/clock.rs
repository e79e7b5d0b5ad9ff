//! Converter clock gating

use f1_hal::adc::AdcInstance;
use f1_hal::clock::{ClockControl, ClockTreeConfig, ClockTreeFlag};

/// Turns a converter's clock domain on and off
///
/// The first `enable` also configures the clock tree, unless another subsystem
/// has already set the shared [`ClockTreeFlag`]. The flag is only ever read.
pub struct ClockGate<C> {
    rcc: C,
    tree: ClockTreeConfig,
    shared: &'static ClockTreeFlag,
    tree_configured: bool,
}

impl<C: ClockControl> ClockGate<C> {
    pub fn new(rcc: C, tree: ClockTreeConfig, shared: &'static ClockTreeFlag) -> Self {
        Self {
            rcc,
            tree,
            shared,
            tree_configured: false,
        }
    }

    /// # Panics
    ///
    /// If clock tree configuration fails or `instance` does not exist on this
    /// target. Both are build configuration mistakes.
    pub fn enable(&mut self, instance: AdcInstance) {
        self.configure_tree();
        if let Err(err) = self.rcc.enable_adc_clock(instance) {
            panic!("cannot enable {instance} clock: {err}");
        }
        log::debug!("{instance} clock enabled");
    }

    /// # Panics
    ///
    /// If `instance` does not exist on this target.
    pub fn disable(&mut self, instance: AdcInstance) {
        if let Err(err) = self.rcc.disable_adc_clock(instance) {
            panic!("cannot disable {instance} clock: {err}");
        }
        log::debug!("{instance} clock disabled");
    }

    fn configure_tree(&mut self) {
        if self.tree_configured || self.shared.is_set() {
            return;
        }
        if let Err(err) = self.rcc.configure_clock_tree(&self.tree) {
            panic!("clock tree configuration failed: {err}");
        }
        self.tree_configured = true;
        log::debug!("clock tree configured: {:?}", self.tree);
    }
}
