use core::fmt::Write;

use embassy_time::{Duration, Instant};
use heapless::String;
use log::{info, warn};
use rand_core::RngCore;

use crate::config::{MqttConfig, RelayTimings};
use crate::domain::ports::{ConnectOptions, MqttSession};

pub const CLIENT_ID_PREFIX: &str = "myrtio-relay-";

pub type ClientId = String<24>;

/// Generate a broker client identifier with a random 16-bit suffix
pub fn client_id<G: RngCore>(rng: &mut G) -> ClientId {
    let mut id = ClientId::new();
    let _ = write!(id, "{CLIENT_ID_PREFIX}{:04X}", rng.next_u32() & 0xFFFF);
    id
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Disconnected,
    Connecting,
    Connected,
}

/// Outcome of a supervisor tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SupervisorEvent {
    /// Session is up, nothing to do
    Idle,
    /// Session is down and the next attempt is not due yet
    Waiting,
    /// A connection was just established
    Connected,
    /// A connection attempt failed
    ConnectFailed,
}

/// Keeps the broker session alive.
///
/// The first attempt happens on the first tick. After a failure the next
/// attempt waits until both the idle tick count and the backoff deadline
/// have passed. A lost connection is retried right away.
pub struct ConnectionSupervisor {
    state: SessionState,
    idle_ticks: u32,
    retry_ticks: u32,
    backoff: Duration,
    retry_not_before: Option<Instant>,
}

impl ConnectionSupervisor {
    pub fn new(timings: &RelayTimings) -> Self {
        Self {
            state: SessionState::Disconnected,
            idle_ticks: 0,
            retry_ticks: timings.retry_ticks,
            backoff: timings.connect_backoff,
            retry_not_before: None,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Forget the retry schedule, the next tick attempts a connection
    pub fn reset(&mut self) {
        self.state = SessionState::Disconnected;
        self.idle_ticks = 0;
        self.retry_not_before = None;
    }

    pub fn tick<M: MqttSession, G: RngCore>(
        &mut self,
        session: &mut M,
        config: &MqttConfig,
        rng: &mut G,
        now: Instant,
    ) -> SupervisorEvent {
        if self.state == SessionState::Connected {
            if session.is_connected() {
                return SupervisorEvent::Idle;
            }
            warn!("mqtt: connection lost");
            self.state = SessionState::Disconnected;
            self.retry_not_before = None;
        }

        if !self.is_due(now) {
            self.idle_ticks = self.idle_ticks.saturating_add(1);
            return SupervisorEvent::Waiting;
        }

        self.connect(session, config, rng, now)
    }

    fn is_due(&self, now: Instant) -> bool {
        match self.retry_not_before {
            None => true,
            Some(deadline) => self.idle_ticks >= self.retry_ticks && now >= deadline,
        }
    }

    fn connect<M: MqttSession, G: RngCore>(
        &mut self,
        session: &mut M,
        config: &MqttConfig,
        rng: &mut G,
        now: Instant,
    ) -> SupervisorEvent {
        self.state = SessionState::Connecting;
        let id = client_id(rng);
        let mut options = ConnectOptions::new(id.as_str(), config.host.as_str(), config.port);
        if !config.username.is_empty() {
            options = options.with_credentials(config.username.as_str(), config.password.as_str());
        }

        info!("mqtt: connecting to {}:{} as {}", config.host, config.port, id);
        match session.connect(&options) {
            Ok(()) => {
                info!("mqtt: connected");
                self.state = SessionState::Connected;
                self.idle_ticks = 0;
                self.retry_not_before = None;
                SupervisorEvent::Connected
            }
            Err(e) => {
                warn!("mqtt: connect failed: {}", e);
                self.state = SessionState::Disconnected;
                self.idle_ticks = 0;
                self.retry_not_before = Some(now + self.backoff);
                SupervisorEvent::ConnectFailed
            }
        }
    }
}
