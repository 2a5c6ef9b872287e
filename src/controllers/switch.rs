//! Wall switch debouncing.
//!
//! A raw level that differs from the channel's last stable level opens a
//! settle window. When the window has elapsed the input is read once more:
//! if it is still displaced the edge is confirmed, otherwise the change is
//! dropped as noise. A confirmed edge starts a hold-off during which the
//! channel input is not looked at, so contact bounce can not toggle twice.
//!
//! Windows are deadlines against the monotonic clock; polling never waits.

use embassy_time::{Duration, Instant};
use embedded_hal::digital::PinState;
use log::{debug, info, warn};

use crate::config::RelayTimings;
use crate::domain::ports::SwitchInput;
use crate::domain::{ChannelStore, ConfirmedEdge};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Window {
    Idle,
    Settling { deadline: Instant },
    HoldOff { until: Instant },
}

pub struct SwitchDebouncer<I: SwitchInput, const N: usize> {
    input: I,
    windows: [Window; N],
    settle: Duration,
    holdoff: Duration,
}

impl<I: SwitchInput, const N: usize> SwitchDebouncer<I, N> {
    pub fn new(input: I, timings: &RelayTimings) -> Self {
        Self {
            input,
            windows: [Window::Idle; N],
            settle: timings.settle,
            holdoff: timings.holdoff,
        }
    }

    /// Take the current input levels as the stable levels of the channels
    pub fn prime(&mut self, channels: &mut ChannelStore<N>) {
        for index in 0..N {
            let level = self.read(index).unwrap_or(PinState::Low);
            if let Some(channel) = channels.get_mut(index) {
                channel.set_stable_level(level);
            }
            self.windows[index] = Window::Idle;
        }
    }

    /// Poll the input of a channel. Returns an edge once a level change has
    /// persisted across the settle window.
    pub fn poll(
        &mut self,
        index: usize,
        channels: &mut ChannelStore<N>,
        now: Instant,
    ) -> Option<ConfirmedEdge> {
        let window = *self.windows.get(index)?;
        let stable = channels.get(index)?.stable_level();

        match window {
            Window::HoldOff { until } if now < until => return None,
            Window::Settling { deadline } if now < deadline => return None,
            Window::Settling { .. } => {
                self.windows[index] = Window::Idle;
                let level = self.read(index)?;
                if level == stable {
                    debug!("switch: channel {} noise rejected", index);
                    return None;
                }

                channels.get_mut(index)?.set_stable_level(level);
                self.windows[index] = Window::HoldOff {
                    until: now + self.holdoff,
                };
                info!("switch: channel {} confirmed edge to {:?}", index, level);
                return Some(ConfirmedEdge {
                    channel: index,
                    level,
                });
            }
            Window::HoldOff { .. } | Window::Idle => {}
        }

        self.windows[index] = Window::Idle;
        let level = self.read(index)?;
        if level != stable {
            self.windows[index] = Window::Settling {
                deadline: now + self.settle,
            };
        }
        None
    }

    fn read(&mut self, index: usize) -> Option<PinState> {
        match self.input.read_level(index) {
            Ok(level) => Some(level),
            Err(e) => {
                warn!("switch: channel {} read failed: {}", index, e);
                None
            }
        }
    }
}
