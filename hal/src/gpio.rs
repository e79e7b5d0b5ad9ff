//! GPIO (General Purpose Input/Output) seam

use core::fmt;

use crate::error::HalResult;

/// GPIO port
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Port {
    A,
    B,
    C,
    D,
    E,
    F,
    G,
}

impl Port {
    const fn index(self) -> u16 {
        match self {
            Self::A => 0,
            Self::B => 1,
            Self::C => 2,
            Self::D => 3,
            Self::E => 4,
            Self::F => 5,
            Self::G => 6,
        }
    }

    const fn letter(self) -> char {
        match self {
            Self::A => 'A',
            Self::B => 'B',
            Self::C => 'C',
            Self::D => 'D',
            Self::E => 'E',
            Self::F => 'F',
            Self::G => 'G',
        }
    }
}

/// Physical pin identity (port + line 0-15)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PinId {
    pub port: Port,
    pub line: u8,
}

impl PinId {
    pub const fn new(port: Port, line: u8) -> Self {
        Self { port, line }
    }

    /// Flat pin number, 16 lines per port.
    pub const fn number(self) -> u16 {
        self.port.index() * 16 + self.line as u16
    }
}

impl fmt::Display for PinId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "P{}{}", self.port.letter(), self.line)
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for PinId {
    fn format(&self, fmt: defmt::Formatter) {
        defmt::write!(fmt, "P{}{}", self.port, self.line);
    }
}

/// GPIO pin modes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PinMode {
    /// Input (floating)
    Input,
    /// Output (push-pull)
    Output,
    /// Output (open-drain)
    OutputOpenDrain,
    /// Analog input, digital path disconnected
    Analog,
}

/// Pull resistor selection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Pull {
    None,
    Up,
    Down,
}

/// Complete pin setup handed to [`GpioController::init`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PinConfig {
    pub pin: PinId,
    pub mode: PinMode,
    pub pull: Pull,
}

impl PinConfig {
    /// Analog input with no pull resistor, as required for ADC inputs.
    pub const fn analog(pin: PinId) -> Self {
        Self {
            pin,
            mode: PinMode::Analog,
            pull: Pull::None,
        }
    }
}

/// Pin init/deinit routines of the board support package
pub trait GpioController {
    /// Configure a pin
    fn init(&mut self, config: &PinConfig) -> HalResult<()>;

    /// Return a pin to its reset state
    fn deinit(&mut self, config: &PinConfig) -> HalResult<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pin_numbers_are_sixteen_per_port() {
        assert_eq!(PinId::new(Port::A, 0).number(), 0);
        assert_eq!(PinId::new(Port::B, 1).number(), 17);
        assert_eq!(PinId::new(Port::F, 10).number(), 90);
    }

    #[test]
    fn analog_config_has_no_pull() {
        let cfg = PinConfig::analog(PinId::new(Port::C, 4));
        assert_eq!(cfg.mode, PinMode::Analog);
        assert_eq!(cfg.pull, Pull::None);
    }
}
