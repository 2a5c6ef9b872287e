//! Mock board collaborators shared by the integration tests.
//!
//! Every mock keeps its state behind an `Rc<RefCell<_>>` so a test can hand
//! the mock to the device and still observe and steer it.

#![allow(dead_code)]

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use embassy_time::{Duration, Instant};
use embedded_hal::digital::PinState;
use embedded_storage::{ReadStorage, Storage};
use myrtio_esp_relay::config::{CONFIG_REGION_SIZE, RelayTimings};
use myrtio_esp_relay::domain::ports::{
    Clock, ConnectOptions, HardwareError, MqttSession, RelayDriver, SessionError, SwitchInput,
};
use myrtio_esp_relay::infrastructure::repositories::ConfigStore;
use myrtio_esp_relay::{DEFAULT_TIMINGS, Device, DeviceParts};
use rand_core::RngCore;

// -----------------------------------------------------------------------------
// Switches
// -----------------------------------------------------------------------------

#[derive(Clone)]
pub struct SharedSwitches(pub Rc<RefCell<Vec<PinState>>>);

impl SharedSwitches {
    pub fn new(count: usize) -> Self {
        Self(Rc::new(RefCell::new(vec![PinState::Low; count])))
    }

    pub fn set(&self, channel: usize, level: PinState) {
        self.0.borrow_mut()[channel] = level;
    }
}

impl SwitchInput for SharedSwitches {
    fn read_level(&mut self, channel: usize) -> Result<PinState, HardwareError> {
        self.0
            .borrow()
            .get(channel)
            .copied()
            .ok_or(HardwareError::InvalidChannel)
    }
}

// -----------------------------------------------------------------------------
// Relays
// -----------------------------------------------------------------------------

#[derive(Default)]
pub struct RelayLog {
    pub writes: Vec<(usize, bool)>,
    pub lines: Vec<bool>,
}

#[derive(Clone)]
pub struct RecordingRelays(pub Rc<RefCell<RelayLog>>);

impl RecordingRelays {
    pub fn new(capacity: usize) -> Self {
        Self(Rc::new(RefCell::new(RelayLog {
            writes: Vec::new(),
            lines: vec![false; capacity],
        })))
    }

    pub fn writes(&self) -> Vec<(usize, bool)> {
        self.0.borrow().writes.clone()
    }

    pub fn line(&self, channel: usize) -> bool {
        self.0.borrow().lines[channel]
    }

    pub fn clear(&self) {
        self.0.borrow_mut().writes.clear();
    }
}

impl RelayDriver for RecordingRelays {
    fn capacity(&self) -> usize {
        self.0.borrow().lines.len()
    }

    fn write(&mut self, channel: usize, on: bool) -> Result<(), HardwareError> {
        let mut log = self.0.borrow_mut();
        let line = log
            .lines
            .get_mut(channel)
            .ok_or(HardwareError::InvalidChannel)?;
        *line = on;
        log.writes.push((channel, on));
        Ok(())
    }
}

// -----------------------------------------------------------------------------
// Broker session
// -----------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    Connect {
        client_id: String,
        host: String,
        port: u16,
        credentials: Option<(String, String)>,
    },
    Disconnect,
    Subscribe(String),
    Publish(String, String),
}

#[derive(Default)]
pub struct SessionLog {
    pub accept: bool,
    pub connected: bool,
    pub events: Vec<SessionEvent>,
}

#[derive(Clone, Default)]
pub struct MockSession(pub Rc<RefCell<SessionLog>>);

impl MockSession {
    pub fn accepting() -> Self {
        let session = Self::default();
        session.0.borrow_mut().accept = true;
        session
    }

    pub fn set_accept(&self, accept: bool) {
        self.0.borrow_mut().accept = accept;
    }

    /// Simulate a dropped connection
    pub fn drop_connection(&self) {
        self.0.borrow_mut().connected = false;
    }

    pub fn events(&self) -> Vec<SessionEvent> {
        self.0.borrow().events.clone()
    }

    pub fn clear(&self) {
        self.0.borrow_mut().events.clear();
    }

    pub fn connects(&self) -> usize {
        self.events()
            .iter()
            .filter(|event| matches!(event, SessionEvent::Connect { .. }))
            .count()
    }

    pub fn subscriptions(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                SessionEvent::Subscribe(topic) => Some(topic),
                _ => None,
            })
            .collect()
    }

    pub fn publishes(&self) -> Vec<(String, String)> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                SessionEvent::Publish(topic, payload) => Some((topic, payload)),
                _ => None,
            })
            .collect()
    }
}

impl MqttSession for MockSession {
    fn connect(&mut self, options: &ConnectOptions<'_>) -> Result<(), SessionError> {
        let mut log = self.0.borrow_mut();
        log.events.push(SessionEvent::Connect {
            client_id: options.client_id.to_string(),
            host: options.host.to_string(),
            port: options.port,
            credentials: options
                .credentials
                .map(|(user, pass)| (user.to_string(), pass.to_string())),
        });
        if log.accept {
            log.connected = true;
            Ok(())
        } else {
            Err(SessionError::Refused)
        }
    }

    fn disconnect(&mut self) {
        let mut log = self.0.borrow_mut();
        log.connected = false;
        log.events.push(SessionEvent::Disconnect);
    }

    fn is_connected(&mut self) -> bool {
        self.0.borrow().connected
    }

    fn subscribe(&mut self, topic: &str) -> Result<(), SessionError> {
        let mut log = self.0.borrow_mut();
        if !log.connected {
            return Err(SessionError::NotConnected);
        }
        log.events.push(SessionEvent::Subscribe(topic.to_string()));
        Ok(())
    }

    fn publish(&mut self, topic: &str, payload: &[u8]) -> Result<(), SessionError> {
        let mut log = self.0.borrow_mut();
        if !log.connected {
            return Err(SessionError::NotConnected);
        }
        log.events.push(SessionEvent::Publish(
            topic.to_string(),
            String::from_utf8_lossy(payload).into_owned(),
        ));
        Ok(())
    }
}

// -----------------------------------------------------------------------------
// Storage
// -----------------------------------------------------------------------------

#[derive(Clone)]
pub struct MemoryStorage(pub Rc<RefCell<Vec<u8>>>);

impl MemoryStorage {
    /// Erased storage, every byte reads as zero
    pub fn new() -> Self {
        Self(Rc::new(RefCell::new(vec![0; CONFIG_REGION_SIZE])))
    }

    pub fn with_bytes(bytes: &[u8]) -> Self {
        let storage = Self::new();
        storage.0.borrow_mut()[..bytes.len()].copy_from_slice(bytes);
        storage
    }

    pub fn bytes(&self) -> Vec<u8> {
        self.0.borrow().clone()
    }
}

impl ReadStorage for MemoryStorage {
    type Error = ();

    fn read(&mut self, offset: u32, bytes: &mut [u8]) -> Result<(), Self::Error> {
        let offset = offset as usize;
        let data = self.0.borrow();
        let source = data.get(offset..offset + bytes.len()).ok_or(())?;
        bytes.copy_from_slice(source);
        Ok(())
    }

    fn capacity(&self) -> usize {
        self.0.borrow().len()
    }
}

impl Storage for MemoryStorage {
    fn write(&mut self, offset: u32, bytes: &[u8]) -> Result<(), Self::Error> {
        let offset = offset as usize;
        let mut data = self.0.borrow_mut();
        let target = data.get_mut(offset..offset + bytes.len()).ok_or(())?;
        target.copy_from_slice(bytes);
        Ok(())
    }
}

// -----------------------------------------------------------------------------
// Time and entropy
// -----------------------------------------------------------------------------

#[derive(Clone, Default)]
pub struct TestClock(pub Rc<Cell<u64>>);

impl TestClock {
    pub fn advance(&self, duration: Duration) {
        self.0.set(self.0.get() + duration.as_millis());
    }

    pub fn advance_ms(&self, ms: u64) {
        self.advance(Duration::from_millis(ms));
    }
}

impl Clock for TestClock {
    fn now(&self) -> Instant {
        Instant::from_millis(self.0.get())
    }
}

/// Counts up from a seed, one step per generated word
pub struct SeqRng(pub u32);

impl RngCore for SeqRng {
    fn next_u32(&mut self) -> u32 {
        let value = self.0;
        self.0 = self.0.wrapping_add(1);
        value
    }

    fn next_u64(&mut self) -> u64 {
        u64::from(self.next_u32())
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        for byte in dest {
            *byte = self.next_u32() as u8;
        }
    }

    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), rand_core::Error> {
        self.fill_bytes(dest);
        Ok(())
    }
}

// -----------------------------------------------------------------------------
// Device harness
// -----------------------------------------------------------------------------

pub type TestDevice<const N: usize> =
    Device<N, SharedSwitches, RecordingRelays, MockSession, MemoryStorage, TestClock, SeqRng>;

pub struct Harness<const N: usize> {
    pub device: TestDevice<N>,
    pub switches: SharedSwitches,
    pub relays: RecordingRelays,
    pub session: MockSession,
    pub storage: MemoryStorage,
    pub clock: TestClock,
}

/// Timings with a short retry cadence so reconnect tests stay small
pub const TEST_TIMINGS: RelayTimings = RelayTimings {
    retry_ticks: 5,
    ..DEFAULT_TIMINGS
};

impl<const N: usize> Harness<N> {
    pub fn new(session: MockSession, storage: MemoryStorage) -> Self {
        Self::with_switches(session, storage, SharedSwitches::new(N))
    }

    pub fn with_switches(
        session: MockSession,
        storage: MemoryStorage,
        switches: SharedSwitches,
    ) -> Self {
        let relays = RecordingRelays::new(N);
        let clock = TestClock::default();
        let parts = DeviceParts {
            switches: switches.clone(),
            relays: relays.clone(),
            session: session.clone(),
            store: ConfigStore::new(storage.clone(), 0),
            clock: clock.clone(),
            rng: SeqRng(0x1234),
        };
        let device = Device::new(parts, &TEST_TIMINGS).expect("device");

        Self {
            device,
            switches,
            relays,
            session,
            storage,
            clock,
        }
    }

    /// Connected device with every relay off and the logs cleared
    pub fn connected() -> Self {
        let mut harness = Self::new(MockSession::accepting(), MemoryStorage::new());
        harness.device.tick();
        assert!(harness.device.is_connected());
        harness.session.clear();
        harness.relays.clear();
        harness
    }

    /// Advance the clock by `ms` and run one tick
    pub fn tick_after(&mut self, ms: u64) {
        self.clock.advance_ms(ms);
        self.device.tick();
    }

    /// Press a switch and tick until the edge is confirmed
    pub fn flip_switch(&mut self, channel: usize, level: PinState) {
        self.switches.set(channel, level);
        self.device.tick();
        self.tick_after(TEST_TIMINGS.settle.as_millis());
    }
}
