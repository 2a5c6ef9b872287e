use embassy_time::Duration;
use heapless::String;

/// Maximum number of channels. Bounded by the bit width of the bus expander.
pub const MAX_CHANNELS: usize = 8;

/// Maximum length of a room or type label
pub const LABEL_MAX_LEN: usize = 32;

/// Capacity of a topic string, fits `{room}/{type}/state`
pub const MAX_TOPIC_LEN: usize = 2 * LABEL_MAX_LEN + 8;

/// Maximum length of the encoded configuration record.
/// The length is stored in a single byte in front of the record.
pub const CONFIG_RECORD_MAX_LEN: usize = 255;

/// Size of the persistent configuration region (length byte + record)
pub const CONFIG_REGION_SIZE: usize = CONFIG_RECORD_MAX_LEN + 1;

pub const MQTT_HOST_MAX_LEN: usize = 64;
pub const MQTT_USERNAME_MAX_LEN: usize = 32;
pub const MQTT_PASSWORD_MAX_LEN: usize = 64;

pub const DEFAULT_MQTT_HOST: &str = "192.168.1.10";
pub const DEFAULT_MQTT_PORT: u16 = 1883;
pub const DEFAULT_ROOM: &str = "bathroom";
pub const DEFAULT_TYPES: [&str; MAX_CHANNELS] = [
    "lights", "heating", "lamps", "fan", "relay4", "relay5", "relay6", "relay7",
];

/// Room or type label of a channel
pub type Label = String<LABEL_MAX_LEN>;

/// Timing parameters of the control loop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RelayTimings {
    /// Time a raw level change must persist to become a confirmed edge
    pub settle: Duration,
    /// Time a channel ignores its input after a confirmed edge
    pub holdoff: Duration,
    /// Idle loop iterations between connection attempts
    pub retry_ticks: u32,
    /// Minimum time between a failed connection attempt and the next one
    pub connect_backoff: Duration,
    /// Duration of a single self-test step
    pub self_test_step: Duration,
}

pub const DEFAULT_TIMINGS: RelayTimings = RelayTimings {
    settle: Duration::from_millis(10),
    holdoff: Duration::from_millis(50),
    retry_ticks: 60_000,
    connect_backoff: Duration::from_secs(5),
    self_test_step: Duration::from_millis(500),
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MqttConfig {
    pub host: String<MQTT_HOST_MAX_LEN>,
    pub port: u16,
    pub username: String<MQTT_USERNAME_MAX_LEN>,
    pub password: String<MQTT_PASSWORD_MAX_LEN>,
}

impl Default for MqttConfig {
    fn default() -> Self {
        Self {
            host: String::try_from(DEFAULT_MQTT_HOST).unwrap_or_default(),
            port: DEFAULT_MQTT_PORT,
            username: String::new(),
            password: String::new(),
        }
    }
}

/// Room and type labels of a single channel.
///
/// Both labels are non-empty and at most [`LABEL_MAX_LEN`] characters long.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelLabels {
    pub room: Label,
    pub device_type: Label,
}

impl ChannelLabels {
    /// Create labels, returns `None` if either label is empty or too long
    pub fn new(room: &str, device_type: &str) -> Option<Self> {
        if room.is_empty() || device_type.is_empty() {
            return None;
        }

        Some(Self {
            room: Label::try_from(room).ok()?,
            device_type: Label::try_from(device_type).ok()?,
        })
    }

    /// Built-in labels of the channel at `index`
    pub fn default_for(index: usize) -> Self {
        let device_type = DEFAULT_TYPES.get(index).copied().unwrap_or("relay");
        Self {
            room: Label::try_from(DEFAULT_ROOM).unwrap_or_default(),
            device_type: Label::try_from(device_type).unwrap_or_default(),
        }
    }
}

/// Runtime configuration of the device, persisted as a single record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceConfig<const N: usize> {
    pub mqtt: MqttConfig,
    pub channels: [ChannelLabels; N],
}

impl<const N: usize> DeviceConfig<N> {
    pub fn new(mqtt: MqttConfig, channels: [ChannelLabels; N]) -> Self {
        Self { mqtt, channels }
    }
}

impl<const N: usize> Default for DeviceConfig<N> {
    fn default() -> Self {
        Self {
            mqtt: MqttConfig::default(),
            channels: core::array::from_fn(ChannelLabels::default_for),
        }
    }
}
