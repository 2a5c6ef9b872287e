use log::{debug, error, warn};

use crate::app::RelayController;
use crate::domain::dto::state_payload;
use crate::domain::ports::{MqttSession, RelayDriver, SessionError, StateObserver};
use crate::domain::{Channel, ChannelStore, RelayCommand, Topic, TopicKind, topic_for};

/// Routes messages between the broker session and the channels.
///
/// The router borrows the session for the duration of one operation, the
/// channel store and the relays are passed in explicitly.
pub struct TopicRouter<'s, M: MqttSession> {
    session: &'s mut M,
}

impl<'s, M: MqttSession> TopicRouter<'s, M> {
    pub fn new(session: &'s mut M) -> Self {
        Self { session }
    }

    /// Topic of a channel identified by its labels
    pub fn topic_for(room: &str, device_type: &str, kind: TopicKind) -> Topic {
        topic_for(room, device_type, kind)
    }

    /// Dispatch an inbound message to every channel whose command topic
    /// matches. Commands matching the current relay state are dropped, so
    /// retained or duplicated messages cause no hardware writes.
    pub fn on_message<R: RelayDriver, const N: usize>(
        &mut self,
        topic: &str,
        payload: &[u8],
        channels: &mut ChannelStore<N>,
        relays: &mut RelayController<R>,
    ) {
        for index in 0..N {
            let Some(channel) = channels.get(index) else {
                continue;
            };
            if channel.command_topic() != topic {
                continue;
            }

            let Some(command) = RelayCommand::parse(payload) else {
                debug!("mqtt: ignoring malformed command on {}", topic);
                continue;
            };
            if channel.is_on() == command.is_on() {
                debug!("mqtt: channel {} already {:?}", index, command);
                continue;
            }

            if let Err(e) = relays.set(channels, self, index, command.is_on()) {
                error!("mqtt: channel {} command failed: {}", index, e);
            }
        }
    }

    /// Subscribe the command topic of every channel
    pub fn resubscribe_all<const N: usize>(
        &mut self,
        channels: &ChannelStore<N>,
    ) -> Result<(), SessionError> {
        let mut result = Ok(());
        for channel in channels.iter() {
            if let Err(e) = self.session.subscribe(channel.command_topic()) {
                warn!("mqtt: subscribe to {} failed: {}", channel.command_topic(), e);
                result = Err(e);
            }
        }
        result
    }

    /// Announce the state of every channel
    pub fn announce_all<const N: usize>(&mut self, channels: &mut ChannelStore<N>) {
        for channel in channels.iter_mut() {
            channel.set_announce_pending(true);
        }
        self.flush_pending(channels);
    }

    /// Publish states that could not be delivered earlier
    pub fn flush_pending<const N: usize>(&mut self, channels: &mut ChannelStore<N>) {
        for channel in channels.iter_mut() {
            if channel.is_announce_pending() {
                self.publish_state(channel);
            }
        }
    }

    fn publish_state(&mut self, channel: &mut Channel) {
        let payload = state_payload(channel.is_on());
        match self.session.publish(channel.state_topic(), payload) {
            Ok(()) => channel.set_announce_pending(false),
            Err(e) => {
                debug!("mqtt: state of channel {} deferred: {}", channel.index(), e);
                channel.set_announce_pending(true);
            }
        }
    }
}

impl<M: MqttSession> StateObserver for TopicRouter<'_, M> {
    fn on_state_changed(&mut self, channel: &mut Channel) {
        self.publish_state(channel);
    }
}
