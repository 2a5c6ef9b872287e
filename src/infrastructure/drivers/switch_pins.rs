use embedded_hal::digital::{InputPin, PinState};

use crate::domain::ports::{HardwareError, SwitchInput};

/// Wall switches wired to GPIO inputs, one pin per channel
pub struct SwitchPins<P: InputPin, const N: usize> {
    pins: [P; N],
}

impl<P: InputPin, const N: usize> SwitchPins<P, N> {
    pub fn new(pins: [P; N]) -> Self {
        Self { pins }
    }
}

impl<P: InputPin, const N: usize> SwitchInput for SwitchPins<P, N> {
    fn read_level(&mut self, channel: usize) -> Result<PinState, HardwareError> {
        let pin = self
            .pins
            .get_mut(channel)
            .ok_or(HardwareError::InvalidChannel)?;

        pin.is_high()
            .map(PinState::from)
            .map_err(|_| HardwareError::Pin)
    }
}
