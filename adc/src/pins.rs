//! Channel-to-pin resolution
//!
//! Each converter instance maps its external channels onto GPIO pins through a
//! static table. ADC1 and ADC2 are wired identically; the pins they share with
//! ADC3 (channels 0-3 and 10-13) live in the ADC3 table, which ADC1/ADC2
//! lookups fall through into once their own entries are exhausted.

use f1_hal::adc::{is_internal_channel, AdcInstance, CHANNEL_TEMPSENSOR};
use f1_hal::gpio::{PinConfig, PinId, Port};

use crate::error::{AdcError, AdcResult};

struct PinTable {
    entries: &'static [(u8, PinId)],
    fallthrough: Option<&'static PinTable>,
}

impl PinTable {
    const fn lookup(&self, channel: u8) -> Option<PinId> {
        let mut i = 0;
        while i < self.entries.len() {
            let (ch, pin) = self.entries[i];
            if ch == channel {
                return Some(pin);
            }
            i += 1;
        }
        match self.fallthrough {
            Some(next) => next.lookup(channel),
            None => None,
        }
    }

    /// Every external channel resolves and no channel appears twice in one table.
    const fn is_well_formed(&self) -> bool {
        let mut i = 0;
        while i < self.entries.len() {
            let mut j = i + 1;
            while j < self.entries.len() {
                if self.entries[i].0 == self.entries[j].0 {
                    return false;
                }
                j += 1;
            }
            i += 1;
        }
        let mut ch = 0;
        while ch < CHANNEL_TEMPSENSOR {
            if self.lookup(ch).is_none() {
                return false;
            }
            ch += 1;
        }
        true
    }
}

const fn pin(port: Port, line: u8) -> PinId {
    PinId::new(port, line)
}

const ADC3_PINS: PinTable = PinTable {
    entries: &[
        (0, pin(Port::A, 0)),
        (1, pin(Port::A, 1)),
        (2, pin(Port::A, 2)),
        (3, pin(Port::A, 3)),
        (4, pin(Port::F, 6)),
        (5, pin(Port::F, 7)),
        (6, pin(Port::F, 8)),
        (7, pin(Port::F, 9)),
        (8, pin(Port::F, 10)),
        (9, pin(Port::F, 3)),
        (10, pin(Port::C, 0)),
        (11, pin(Port::C, 1)),
        (12, pin(Port::C, 2)),
        (13, pin(Port::C, 3)),
        (14, pin(Port::F, 4)),
        (15, pin(Port::F, 5)),
    ],
    fallthrough: None,
};

const ADC12_PINS: PinTable = PinTable {
    entries: &[
        (4, pin(Port::A, 4)),
        (5, pin(Port::A, 5)),
        (6, pin(Port::A, 6)),
        (7, pin(Port::A, 7)),
        (8, pin(Port::B, 0)),
        (9, pin(Port::B, 1)),
        (14, pin(Port::C, 4)),
        (15, pin(Port::C, 5)),
    ],
    fallthrough: Some(&ADC3_PINS),
};

const _: () = assert!(ADC3_PINS.is_well_formed(), "ADC3 pin table incomplete");
const _: () = assert!(ADC12_PINS.is_well_formed(), "ADC1/ADC2 pin table incomplete");

const fn table(instance: AdcInstance) -> &'static PinTable {
    match instance {
        AdcInstance::Adc1 | AdcInstance::Adc2 => &ADC12_PINS,
        AdcInstance::Adc3 => &ADC3_PINS,
    }
}

/// Resolve the analog pin that feeds `channel` on `instance`.
///
/// Internal-sensor channels have no pin and are rejected along with every
/// channel outside the instance's legal set.
pub fn resolve(instance: AdcInstance, channel: u8) -> AdcResult<PinConfig> {
    if is_internal_channel(channel) || !instance.is_legal_channel(channel) {
        return Err(AdcError::InvalidChannel(channel));
    }
    table(instance)
        .lookup(channel)
        .map(PinConfig::analog)
        .ok_or(AdcError::InvalidChannel(channel))
}
