//! Build-time hardware parameters.

use crate::store::ScriptLayout;
use crate::types::CarrierTiming;

/// Hardware parameters for a bridge build.
///
/// The defaults match an 8 MHz 8-pin part with one stored script.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct BridgeConfig {
    /// Timer clock used by the carrier frequency conversion.
    pub clock_hz: u32,

    /// Carrier timing until a `#` command changes it.
    pub carrier: CarrierTiming,

    /// Ticks that make up one `w` wait unit.
    pub ticks_per_wait_unit: u16,

    /// Bus address used when the stored one is invalid.
    pub default_bus_address: u8,

    /// Script slots in the store.
    pub layout: ScriptLayout,
}

impl BridgeConfig {
    /// 8-pin part: carrier on timer 1, 38 kHz at 8 MHz.
    pub const fn tiny85() -> Self {
        Self {
            clock_hz: 8_000_000,
            carrier: CarrierTiming::new(210, 210 / 3),
            ticks_per_wait_unit: 153,
            default_bus_address: 0x09,
            layout: ScriptLayout::new(1),
        }
    }

    /// 14-pin part: phase-correct PWM halves the timer top.
    pub const fn tiny84() -> Self {
        Self {
            carrier: CarrierTiming::new(105, 105 / 3),
            ..Self::tiny85()
        }
    }
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self::tiny85()
    }
}
