use embassy_time::Instant;
use embedded_storage::Storage;
use log::{error, info, warn};
use rand_core::RngCore;

use super::relay::{RelayController, RelayError};
use super::self_test::{SelfTest, SelfTestAction};
use crate::config::{DeviceConfig, RelayTimings};
use crate::controllers::{
    ConnectionSupervisor, SessionState, SupervisorEvent, SwitchDebouncer, TopicRouter,
};
use crate::domain::ports::{Clock, MqttSession, RelayDriver, SwitchInput};
use crate::domain::{Channel, ChannelStore};
use crate::infrastructure::repositories::{ConfigError, ConfigStore};

/// Collaborators a [`Device`] is assembled from
pub struct DeviceParts<I, R, M, S: Storage, C, G> {
    pub switches: I,
    pub relays: R,
    pub session: M,
    pub store: ConfigStore<S>,
    pub clock: C,
    pub rng: G,
}

/// The relay switch device.
///
/// Owns the channel store, the configuration and every collaborator. The
/// board calls [`Device::tick`] once per loop iteration and forwards inbound
/// broker messages to [`Device::on_message`].
pub struct Device<const N: usize, I, R, M, S, C, G>
where
    I: SwitchInput,
    R: RelayDriver,
    M: MqttSession,
    S: Storage,
    C: Clock,
    G: RngCore,
{
    channels: ChannelStore<N>,
    config: DeviceConfig<N>,
    debouncer: SwitchDebouncer<I, N>,
    relays: RelayController<R>,
    session: M,
    supervisor: ConnectionSupervisor,
    store: ConfigStore<S>,
    clock: C,
    rng: G,
    timings: RelayTimings,
    self_test: Option<SelfTest<N>>,
}

impl<const N: usize, I, R, M, S, C, G> Device<N, I, R, M, S, C, G>
where
    I: SwitchInput,
    R: RelayDriver,
    M: MqttSession,
    S: Storage,
    C: Clock,
    G: RngCore,
{
    /// Load the configuration, sample the switches and drive every relay off.
    ///
    /// Fails if the relay backend can not address `N` channels.
    pub fn new(
        parts: DeviceParts<I, R, M, S, C, G>,
        timings: &RelayTimings,
    ) -> Result<Self, RelayError> {
        let DeviceParts {
            switches,
            relays,
            session,
            mut store,
            clock,
            rng,
        } = parts;

        let mut relays = RelayController::new(relays);
        if relays.capacity() < N {
            error!("relay: backend has {} lines, {} required", relays.capacity(), N);
            return Err(RelayError::InvalidChannel);
        }

        let config = store.load::<N>();
        let mut channels = ChannelStore::new(&config.channels);
        let mut debouncer = SwitchDebouncer::new(switches, timings);
        debouncer.prime(&mut channels);

        for index in 0..N {
            if let Err(e) = relays.drive(index, false) {
                error!("relay: channel {} init failed: {}", index, e);
            }
        }

        info!("relay: {} channels ready", N);
        Ok(Self {
            channels,
            config,
            debouncer,
            relays,
            session,
            supervisor: ConnectionSupervisor::new(timings),
            store,
            clock,
            rng,
            timings: *timings,
            self_test: None,
        })
    }

    pub const fn channel_count(&self) -> usize {
        N
    }

    pub fn channel(&self, index: usize) -> Option<&Channel> {
        self.channels.get(index)
    }

    pub fn get_state(&self, index: usize) -> Result<bool, RelayError> {
        self.relays.get(&self.channels, index)
    }

    /// Switch a relay and announce its state, even if it is unchanged
    pub fn set_state(&mut self, index: usize, on: bool) -> Result<(), RelayError> {
        let mut router = TopicRouter::new(&mut self.session);
        self.relays.set(&mut self.channels, &mut router, index, on)
    }

    /// Configuration currently in effect
    pub fn config(&self) -> &DeviceConfig<N> {
        &self.config
    }

    /// Read the persisted configuration, defaults if none is stored
    pub fn load_config(&mut self) -> DeviceConfig<N> {
        self.store.load()
    }

    /// Persist a new configuration and apply it.
    ///
    /// Channel topics change right away. A changed broker address or login
    /// drops the session so the next tick reconnects with the new settings.
    pub fn save_config(&mut self, config: DeviceConfig<N>) -> Result<(), ConfigError> {
        self.store.save(&config).inspect_err(|e| {
            error!("config: save refused: {}", e);
        })?;

        let broker_changed = config.mqtt != self.config.mqtt;
        self.channels.apply_labels(&config.channels);
        self.config = config;

        if broker_changed {
            info!("config: broker settings changed, reconnecting");
            self.session.disconnect();
            self.supervisor.reset();
        } else if self.supervisor.state() == SessionState::Connected {
            let mut router = TopicRouter::new(&mut self.session);
            if let Err(e) = router.resubscribe_all(&self.channels) {
                warn!("mqtt: resubscribe after config change failed: {}", e);
            }
            router.announce_all(&mut self.channels);
        }
        Ok(())
    }

    /// Inbound broker message
    pub fn on_message(&mut self, topic: &str, payload: &[u8]) {
        TopicRouter::new(&mut self.session).on_message(
            topic,
            payload,
            &mut self.channels,
            &mut self.relays,
        );
    }

    /// Run one iteration of the control loop
    pub fn tick(&mut self) {
        let now = self.clock.now();

        for index in 0..N {
            if let Some(edge) = self.debouncer.poll(index, &mut self.channels, now) {
                let mut router = TopicRouter::new(&mut self.session);
                if let Err(e) = self.relays.toggle(&mut self.channels, &mut router, edge) {
                    error!("switch: channel {} toggle failed: {}", index, e);
                }
            }
        }

        let event = self
            .supervisor
            .tick(&mut self.session, &self.config.mqtt, &mut self.rng, now);
        let mut router = TopicRouter::new(&mut self.session);
        if event == SupervisorEvent::Connected {
            if let Err(e) = router.resubscribe_all(&self.channels) {
                warn!("mqtt: resubscribe failed: {}", e);
            }
            router.announce_all(&mut self.channels);
        } else if self.supervisor.state() == SessionState::Connected {
            router.flush_pending(&mut self.channels);
        }

        self.step_self_test(now);
    }

    /// Start the relay self-test, it advances with every tick
    pub fn start_self_test(&mut self) {
        info!("relay: self-test started");
        self.self_test = Some(SelfTest::new(self.clock.now()));
    }

    pub fn is_self_testing(&self) -> bool {
        self.self_test.is_some()
    }

    pub fn session_state(&self) -> SessionState {
        self.supervisor.state()
    }

    pub fn is_connected(&self) -> bool {
        self.supervisor.state() == SessionState::Connected
    }

    fn step_self_test(&mut self, now: Instant) {
        let Some(test) = self.self_test.as_mut() else {
            return;
        };

        match test.poll(now, self.timings.self_test_step) {
            None => {}
            Some(SelfTestAction::Drive { channel, on }) => {
                if let Err(e) = self.relays.drive(channel, on) {
                    warn!("relay: self-test on channel {} failed: {}", channel, e);
                }
            }
            Some(SelfTestAction::Finish) => {
                self.self_test = None;
                for channel in self.channels.iter() {
                    if let Err(e) = self.relays.drive(channel.index(), channel.is_on()) {
                        error!("relay: channel {} restore failed: {}", channel.index(), e);
                    }
                }
                info!("relay: self-test finished");
            }
        }
    }
}
