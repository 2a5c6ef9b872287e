//! Single relay wired to a GPIO pin.

use embedded_hal::digital::OutputPin;

use super::RelayPolarity;
use crate::domain::ports::{HardwareError, RelayDriver};

/// Relay backend for single channel boards
pub struct PinRelay<P: OutputPin> {
    pin: P,
    polarity: RelayPolarity,
}

impl<P: OutputPin> PinRelay<P> {
    pub fn new(pin: P, polarity: RelayPolarity) -> Self {
        Self { pin, polarity }
    }

    pub fn release(self) -> P {
        self.pin
    }
}

impl<P: OutputPin> RelayDriver for PinRelay<P> {
    fn capacity(&self) -> usize {
        1
    }

    fn write(&mut self, channel: usize, on: bool) -> Result<(), HardwareError> {
        if channel != 0 {
            return Err(HardwareError::InvalidChannel);
        }

        self.pin
            .set_state(self.polarity.level(on))
            .map_err(|_| HardwareError::Pin)
    }
}
