//! Clock tree (RCC) seam

use core::cell::Cell;
use core::fmt;

use critical_section::Mutex;

use crate::adc::AdcInstance;
use crate::error::HalResult;

/// System clock source
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SysClkSource {
    Hsi,
    Hse,
    Pll,
}

/// APB2 prescaler (PCLK2 = HCLK / n). The ADC prescaler divides PCLK2 further.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ApbDivider {
    Div1,
    Div2,
    Div4,
    Div8,
    Div16,
}

impl ApbDivider {
    pub const fn divisor(self) -> u32 {
        match self {
            Self::Div1 => 1,
            Self::Div2 => 2,
            Self::Div4 => 4,
            Self::Div8 => 8,
            Self::Div16 => 16,
        }
    }
}

/// Clock tree settings applied once before the first ADC clock enable
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ClockTreeConfig {
    pub sysclk: SysClkSource,
    pub apb2_divider: ApbDivider,
    /// Flash wait states
    pub flash_latency: u8,
}

impl Default for ClockTreeConfig {
    /// PLL at 64 MHz from HSI/2, APB2 = 64 / 8 = 8 MHz. The ADC clock must not exceed 14 MHz.
    fn default() -> Self {
        Self {
            sysclk: SysClkSource::Pll,
            apb2_divider: ApbDivider::Div8,
            flash_latency: 2,
        }
    }
}

/// RCC operations needed by the ADC driver
pub trait ClockControl {
    /// Select the system clock source and bus dividers
    fn configure_clock_tree(&mut self, config: &ClockTreeConfig) -> HalResult<()>;

    /// Gate the converter's clock on
    ///
    /// Returns `NotSupported` if the instance does not exist on this target.
    fn enable_adc_clock(&mut self, instance: AdcInstance) -> HalResult<()>;

    /// Gate the converter's clock off
    fn disable_adc_clock(&mut self, instance: AdcInstance) -> HalResult<()>;
}

/// System-wide marker that the clock tree has been configured
///
/// Subsystems that configure the clock tree themselves (the RTC, typically)
/// set the flag so that later peripherals leave their settings alone.
pub struct ClockTreeFlag {
    configured: Mutex<Cell<bool>>,
}

impl ClockTreeFlag {
    pub const fn new() -> Self {
        Self {
            configured: Mutex::new(Cell::new(false)),
        }
    }

    pub fn is_set(&self) -> bool {
        critical_section::with(|cs| self.configured.borrow(cs).get())
    }

    pub fn set(&self) {
        critical_section::with(|cs| self.configured.borrow(cs).set(true));
    }
}

impl Default for ClockTreeFlag {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ClockTreeFlag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ClockTreeFlag").field(&self.is_set()).finish()
    }
}

/// The flag shared by every subsystem of the firmware image.
pub static CLOCK_TREE_CONFIGURED: ClockTreeFlag = ClockTreeFlag::new();
