mod relay_expander;
mod relay_pin;
mod switch_pins;

use embedded_hal::digital::PinState;

pub use relay_expander::{EXPANDER_CHANNELS, ExpanderRelay};
pub use relay_pin::PinRelay;
pub use switch_pins::SwitchPins;

/// Output level that energizes a relay
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RelayPolarity {
    #[default]
    ActiveHigh,
    ActiveLow,
}

impl RelayPolarity {
    /// Line level for the requested relay state
    pub const fn level(self, on: bool) -> PinState {
        match (self, on) {
            (RelayPolarity::ActiveHigh, true) | (RelayPolarity::ActiveLow, false) => PinState::High,
            (RelayPolarity::ActiveHigh, false) | (RelayPolarity::ActiveLow, true) => PinState::Low,
        }
    }
}
