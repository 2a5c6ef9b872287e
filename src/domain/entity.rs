use embedded_hal::digital::PinState;

use super::dto::TopicKind;
use super::topic::{Topic, topic_for};
use crate::config::{ChannelLabels, MAX_CHANNELS};

/// One physical switch/relay pair
#[derive(Debug, Clone)]
pub struct Channel {
    index: usize,
    labels: ChannelLabels,
    command_topic: Topic,
    state_topic: Topic,
    stable_level: PinState,
    relay_on: bool,
    announce_pending: bool,
}

impl Channel {
    pub fn new(index: usize, labels: ChannelLabels) -> Self {
        let mut channel = Self {
            index,
            labels,
            command_topic: Topic::new(),
            state_topic: Topic::new(),
            stable_level: PinState::Low,
            relay_on: false,
            announce_pending: false,
        };
        channel.update_topics();
        channel
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn labels(&self) -> &ChannelLabels {
        &self.labels
    }

    pub fn command_topic(&self) -> &str {
        self.command_topic.as_str()
    }

    pub fn state_topic(&self) -> &str {
        self.state_topic.as_str()
    }

    /// Last input level accepted by the debouncer
    pub fn stable_level(&self) -> PinState {
        self.stable_level
    }

    /// Current relay output state
    pub fn is_on(&self) -> bool {
        self.relay_on
    }

    /// Whether the current state still has to be announced
    pub fn is_announce_pending(&self) -> bool {
        self.announce_pending
    }

    pub(crate) fn set_stable_level(&mut self, level: PinState) {
        self.stable_level = level;
    }

    pub(crate) fn set_on(&mut self, on: bool) {
        self.relay_on = on;
    }

    pub(crate) fn set_announce_pending(&mut self, pending: bool) {
        self.announce_pending = pending;
    }

    pub(crate) fn relabel(&mut self, labels: ChannelLabels) {
        self.labels = labels;
        self.update_topics();
    }

    fn update_topics(&mut self) {
        let room = self.labels.room.as_str();
        let device_type = self.labels.device_type.as_str();
        self.command_topic = topic_for(room, device_type, TopicKind::Command);
        self.state_topic = topic_for(room, device_type, TopicKind::State);
    }
}

/// Per-channel state of the device. Exactly `N` channels exist for the
/// lifetime of the store.
#[derive(Debug, Clone)]
pub struct ChannelStore<const N: usize> {
    channels: [Channel; N],
}

impl<const N: usize> ChannelStore<N> {
    pub fn new(labels: &[ChannelLabels; N]) -> Self {
        const { assert!(N >= 1 && N <= MAX_CHANNELS, "channel count must be within 1..=8") };

        Self {
            channels: core::array::from_fn(|index| Channel::new(index, labels[index].clone())),
        }
    }

    pub const fn count(&self) -> usize {
        N
    }

    pub fn get(&self, index: usize) -> Option<&Channel> {
        self.channels.get(index)
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut Channel> {
        self.channels.get_mut(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Channel> {
        self.channels.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Channel> {
        self.channels.iter_mut()
    }

    /// Replace labels of every channel, keeping relay and input state
    pub fn apply_labels(&mut self, labels: &[ChannelLabels; N]) {
        for (channel, labels) in self.channels.iter_mut().zip(labels) {
            channel.relabel(labels.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DeviceConfig;

    #[test]
    fn channels_derive_topics_from_labels() {
        let config: DeviceConfig<2> = DeviceConfig::default();
        let store = ChannelStore::new(&config.channels);

        let channel = store.get(1).unwrap();
        assert_eq!(channel.index(), 1);
        assert_eq!(channel.command_topic(), "bathroom/heating/com");
        assert_eq!(channel.state_topic(), "bathroom/heating/state");
        assert!(!channel.is_on());
        assert!(store.get(2).is_none());
    }

    #[test]
    fn relabel_keeps_relay_state() {
        let config: DeviceConfig<1> = DeviceConfig::default();
        let mut store = ChannelStore::new(&config.channels);
        store.get_mut(0).unwrap().set_on(true);

        let labels = [ChannelLabels::new("kitchen", "kettle").unwrap()];
        store.apply_labels(&labels);

        let channel = store.get(0).unwrap();
        assert!(channel.is_on());
        assert_eq!(channel.command_topic(), "kitchen/kettle/com");
    }
}
