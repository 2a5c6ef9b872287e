use core::fmt;

use log::error;

use crate::domain::ports::{HardwareError, RelayDriver, StateObserver};
use crate::domain::{ChannelStore, ConfirmedEdge};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelayError {
    /// Channel index outside of the configured channel count
    InvalidChannel,
    Hardware(HardwareError),
}

impl fmt::Display for RelayError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RelayError::InvalidChannel => write!(f, "Invalid channel"),
            RelayError::Hardware(e) => write!(f, "Hardware error: {e}"),
        }
    }
}

impl From<HardwareError> for RelayError {
    fn from(e: HardwareError) -> Self {
        RelayError::Hardware(e)
    }
}

/// Applies relay states to the hardware and keeps the channel store in sync.
///
/// The backend is chosen once when the controller is built, callers only
/// deal with channel indices.
pub struct RelayController<R: RelayDriver> {
    driver: R,
}

impl<R: RelayDriver> RelayController<R> {
    pub fn new(driver: R) -> Self {
        Self { driver }
    }

    /// Number of channels the backend can address
    pub fn capacity(&self) -> usize {
        self.driver.capacity()
    }

    pub fn driver(&self) -> &R {
        &self.driver
    }

    /// Stored state of the relay, the hardware is not read back
    pub fn get<const N: usize>(
        &self,
        channels: &ChannelStore<N>,
        index: usize,
    ) -> Result<bool, RelayError> {
        channels
            .get(index)
            .map(|channel| channel.is_on())
            .ok_or(RelayError::InvalidChannel)
    }

    /// Drive the relay and announce the new state.
    ///
    /// Writing the current state again still drives the line and notifies
    /// the observer.
    pub fn set<const N: usize, O: StateObserver>(
        &mut self,
        channels: &mut ChannelStore<N>,
        observer: &mut O,
        index: usize,
        on: bool,
    ) -> Result<(), RelayError> {
        let channel = channels.get_mut(index).ok_or(RelayError::InvalidChannel)?;
        self.driver.write(index, on).inspect_err(|e| {
            error!("relay: channel {} write failed: {}", index, e);
        })?;

        channel.set_on(on);
        observer.on_state_changed(channel);
        Ok(())
    }

    /// Flip the relay of the channel that produced the edge
    pub fn toggle<const N: usize, O: StateObserver>(
        &mut self,
        channels: &mut ChannelStore<N>,
        observer: &mut O,
        edge: ConfirmedEdge,
    ) -> Result<(), RelayError> {
        let on = !self.get(channels, edge.channel)?;
        self.set(channels, observer, edge.channel, on)
    }

    /// Drive a line without touching the channel store
    pub(crate) fn drive(&mut self, index: usize, on: bool) -> Result<(), RelayError> {
        Ok(self.driver.write(index, on)?)
    }
}
