use core::fmt;

use embassy_time::Instant;
use embedded_hal::digital::PinState;

use crate::domain::entity::Channel;

/// Error type for the hardware operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HardwareError {
    /// The backend has no line for the requested channel
    InvalidChannel,
    /// Direct pin access failed
    Pin,
    /// Shared bus transfer failed
    Bus,
}

impl fmt::Display for HardwareError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HardwareError::InvalidChannel => write!(f, "Invalid channel"),
            HardwareError::Pin => write!(f, "Pin access failed"),
            HardwareError::Bus => write!(f, "Bus transfer failed"),
        }
    }
}

/// Raw digital input of the wall switches
pub trait SwitchInput {
    /// Read the raw level of the channel's switch
    fn read_level(&mut self, channel: usize) -> Result<PinState, HardwareError>;
}

/// Hardware output driving the relays
pub trait RelayDriver {
    /// Number of channels the backend can address
    fn capacity(&self) -> usize;

    /// Drive the relay of the channel on or off
    fn write(&mut self, channel: usize, on: bool) -> Result<(), HardwareError>;
}

/// Monotonic time source
pub trait Clock {
    fn now(&self) -> Instant;
}

impl<F: Fn() -> Instant> Clock for F {
    fn now(&self) -> Instant {
        self()
    }
}

/// Receiver of relay state changes
pub trait StateObserver {
    /// Called after every relay write, including redundant ones
    fn on_state_changed(&mut self, channel: &mut Channel);
}
