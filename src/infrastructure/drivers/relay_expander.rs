//! Relays behind an 8-bit I2C port expander (PCF8574 style).
//!
//! The expander has no register map: every write sets all eight lines at
//! once, so the driver keeps a shadow of the output port and only changes the
//! bit of the addressed channel.

use embedded_hal::digital::PinState;
use embedded_hal::i2c::I2c;

use super::RelayPolarity;
use crate::domain::ports::{HardwareError, RelayDriver};

/// Number of lines on the expander
pub const EXPANDER_CHANNELS: usize = 8;

/// Relay backend for multi channel boards
pub struct ExpanderRelay<I: I2c> {
    bus: I,
    address: u8,
    polarity: RelayPolarity,
    port: u8,
}

impl<I: I2c> ExpanderRelay<I> {
    /// Create the backend. No bus transfer happens until the first write.
    pub fn new(bus: I, address: u8, polarity: RelayPolarity) -> Self {
        let port = match polarity.level(false) {
            PinState::High => 0xFF,
            PinState::Low => 0x00,
        };
        Self {
            bus,
            address,
            polarity,
            port,
        }
    }

    /// Last value written to the output port
    pub fn port(&self) -> u8 {
        self.port
    }

    pub fn release(self) -> I {
        self.bus
    }
}

impl<I: I2c> RelayDriver for ExpanderRelay<I> {
    fn capacity(&self) -> usize {
        EXPANDER_CHANNELS
    }

    fn write(&mut self, channel: usize, on: bool) -> Result<(), HardwareError> {
        if channel >= EXPANDER_CHANNELS {
            return Err(HardwareError::InvalidChannel);
        }

        let mask = 1u8 << channel;
        let port = match self.polarity.level(on) {
            PinState::High => self.port | mask,
            PinState::Low => self.port & !mask,
        };

        self.bus
            .write(self.address, &[port])
            .map_err(|_| HardwareError::Bus)?;
        self.port = port;
        Ok(())
    }
}
