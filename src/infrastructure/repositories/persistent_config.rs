//! Persistent device configuration.
//!
//! The configuration lives in a fixed region of the persistent storage:
//!
//! | offset  | content                                   |
//! |---------|-------------------------------------------|
//! | 0       | record length `L`, `0` when nothing saved |
//! | 1..=L   | ASCII `key=value` pairs joined by `,`     |
//!
//! Keys are `mqttServer`, `mqttPort`, `mqttUser`, `mqttPass` and, for every
//! channel `i`, `{i}A` (room) and `{i}B` (type). There is no checksum and no
//! version: any record that parses into a complete configuration is accepted.

use core::fmt::{self, Write};

use embedded_storage::Storage;
use heapless::String;
use log::{info, warn};

use crate::config::{
    CONFIG_RECORD_MAX_LEN, CONFIG_REGION_SIZE, ChannelLabels, DeviceConfig, Label,
    MQTT_HOST_MAX_LEN, MQTT_PASSWORD_MAX_LEN, MQTT_USERNAME_MAX_LEN, MqttConfig,
};

const KEY_HOST: &str = "mqttServer";
const KEY_PORT: &str = "mqttPort";
const KEY_USERNAME: &str = "mqttUser";
const KEY_PASSWORD: &str = "mqttPass";

/// Longer than any known key, so a truncated key never matches one
const KEY_MAX_LEN: usize = 16;

pub type EncodedRecord = String<CONFIG_RECORD_MAX_LEN>;

/// Error type for the configuration persistence
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// Encoded record does not fit into the length byte
    RecordTooLarge,
    /// A value can not be represented in the record
    InvalidValue,
    /// Stored record does not decode into a complete configuration
    InvalidRecord,
    /// Storage driver failure
    Storage,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::RecordTooLarge => write!(f, "Record too large"),
            ConfigError::InvalidValue => write!(f, "Invalid value"),
            ConfigError::InvalidRecord => write!(f, "Invalid record"),
            ConfigError::Storage => write!(f, "Storage error"),
        }
    }
}

/// Configuration record stored in a region of a byte-addressable storage
pub struct ConfigStore<S: Storage> {
    storage: S,
    offset: u32,
}

impl<S: Storage> ConfigStore<S> {
    pub fn new(storage: S, offset: u32) -> Self {
        Self { storage, offset }
    }

    /// Load the configuration, falling back to the built-in defaults when
    /// nothing is saved or the stored record is unusable.
    pub fn load<const N: usize>(&mut self) -> DeviceConfig<N> {
        match self.try_load() {
            Ok(Some(config)) => config,
            Ok(None) => {
                info!("config: nothing saved, using defaults");
                DeviceConfig::default()
            }
            Err(e) => {
                warn!("config: stored record unusable ({}), using defaults", e);
                DeviceConfig::default()
            }
        }
    }

    /// Load the stored configuration. `Ok(None)` means nothing is saved.
    pub fn try_load<const N: usize>(&mut self) -> Result<Option<DeviceConfig<N>>, ConfigError> {
        let mut length = [0u8; 1];
        self.storage
            .read(self.offset, &mut length)
            .map_err(|_| ConfigError::Storage)?;

        let length = usize::from(length[0]);
        if length == 0 {
            return Ok(None);
        }

        let mut record = [0u8; CONFIG_RECORD_MAX_LEN];
        self.storage
            .read(self.offset + 1, &mut record[..length])
            .map_err(|_| ConfigError::Storage)?;

        decode_config(&record[..length]).map(Some)
    }

    /// Encode and write the configuration. Nothing is written when the
    /// configuration does not fit into a record.
    pub fn save<const N: usize>(&mut self, config: &DeviceConfig<N>) -> Result<(), ConfigError> {
        let record = encode_config(config)?;
        let length = record.len();

        let mut region = [0u8; CONFIG_REGION_SIZE];
        region[0] = u8::try_from(length).map_err(|_| ConfigError::RecordTooLarge)?;
        region[1..=length].copy_from_slice(record.as_bytes());

        self.storage
            .write(self.offset, &region[..=length])
            .map_err(|_| ConfigError::Storage)
    }

    pub fn release(self) -> S {
        self.storage
    }
}

/// Encode the configuration into a record.
///
/// Keys are always written in the same order: broker settings first, then
/// room and type of every channel. A configuration the decoder would reject
/// (empty host, port `0`, empty label) is refused.
pub fn encode_config<const N: usize>(
    config: &DeviceConfig<N>,
) -> Result<EncodedRecord, ConfigError> {
    let mqtt = &config.mqtt;
    let labels_set = config
        .channels
        .iter()
        .all(|labels| !labels.room.is_empty() && !labels.device_type.is_empty());
    if mqtt.host.is_empty() || mqtt.port == 0 || !labels_set {
        return Err(ConfigError::InvalidValue);
    }

    let values = [mqtt.host.as_str(), mqtt.username.as_str(), mqtt.password.as_str()];
    let labels = config
        .channels
        .iter()
        .flat_map(|labels| [labels.room.as_str(), labels.device_type.as_str()]);
    if !values.into_iter().chain(labels).all(is_encodable) {
        return Err(ConfigError::InvalidValue);
    }

    let mut record = EncodedRecord::new();
    write!(
        record,
        "{KEY_HOST}={},{KEY_PORT}={},{KEY_USERNAME}={},{KEY_PASSWORD}={}",
        mqtt.host, mqtt.port, mqtt.username, mqtt.password
    )
    .map_err(|_| ConfigError::RecordTooLarge)?;

    for (index, labels) in config.channels.iter().enumerate() {
        write!(record, ",{index}A={},{index}B={}", labels.room, labels.device_type)
            .map_err(|_| ConfigError::RecordTooLarge)?;
    }

    Ok(record)
}

/// Decode a record into a configuration.
///
/// Unknown keys are ignored and the last occurrence of a key wins. A
/// trailing pair without a closing `,` is still applied.
pub fn decode_config<const N: usize>(record: &[u8]) -> Result<DeviceConfig<N>, ConfigError> {
    let mut draft = ConfigDraft::<N>::new();
    let mut key: String<KEY_MAX_LEN> = String::new();
    let mut value: String<CONFIG_RECORD_MAX_LEN> = String::new();
    let mut in_value = false;

    for &byte in record {
        if !byte.is_ascii() {
            return Err(ConfigError::InvalidRecord);
        }
        let ch = char::from(byte);

        if in_value {
            if ch == ',' {
                draft.apply(&key, &value);
                key.clear();
                value.clear();
                in_value = false;
            } else {
                let _ = value.push(ch);
            }
        } else if ch == '=' {
            in_value = true;
        } else {
            let _ = key.push(ch);
        }
    }

    if in_value {
        draft.apply(&key, &value);
    }

    draft.finish()
}

fn is_encodable(value: &str) -> bool {
    value.is_ascii() && !value.contains(',')
}

/// Decoded value of a single key
#[derive(Debug, Default)]
enum Slot<T> {
    #[default]
    Missing,
    Invalid,
    Value(T),
}

impl<T> Slot<T> {
    fn from_option(value: Option<T>) -> Self {
        value.map_or(Slot::Invalid, Slot::Value)
    }

    fn is_value(&self) -> bool {
        matches!(self, Slot::Value(_))
    }

    fn into_value(self) -> Option<T> {
        match self {
            Slot::Value(value) => Some(value),
            Slot::Missing | Slot::Invalid => None,
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum LabelField {
    Room,
    DeviceType,
}

/// Configuration being assembled from decoded pairs
struct ConfigDraft<const N: usize> {
    host: Slot<String<MQTT_HOST_MAX_LEN>>,
    port: Slot<u16>,
    username: Slot<String<MQTT_USERNAME_MAX_LEN>>,
    password: Slot<String<MQTT_PASSWORD_MAX_LEN>>,
    rooms: [Slot<Label>; N],
    device_types: [Slot<Label>; N],
}

impl<const N: usize> ConfigDraft<N> {
    fn new() -> Self {
        Self {
            host: Slot::Missing,
            port: Slot::Missing,
            username: Slot::Missing,
            password: Slot::Missing,
            rooms: core::array::from_fn(|_| Slot::Missing),
            device_types: core::array::from_fn(|_| Slot::Missing),
        }
    }

    fn apply(&mut self, key: &str, value: &str) {
        match key {
            KEY_HOST => self.host = Slot::from_option(non_empty(value)),
            KEY_PORT => {
                self.port = Slot::from_option(value.parse::<u16>().ok().filter(|port| *port != 0));
            }
            KEY_USERNAME => self.username = Slot::from_option(String::try_from(value).ok()),
            KEY_PASSWORD => self.password = Slot::from_option(String::try_from(value).ok()),
            _ => {
                let Some((index, field)) = parse_channel_key(key) else {
                    return;
                };
                let slot = match field {
                    LabelField::Room => self.rooms.get_mut(index),
                    LabelField::DeviceType => self.device_types.get_mut(index),
                };
                if let Some(slot) = slot {
                    *slot = Slot::from_option(non_empty(value));
                }
            }
        }
    }

    fn finish(self) -> Result<DeviceConfig<N>, ConfigError> {
        let Self {
            host,
            port,
            username,
            password,
            mut rooms,
            mut device_types,
        } = self;

        let labels_complete = rooms.iter().chain(device_types.iter()).all(Slot::is_value);
        let credentials_invalid =
            matches!(username, Slot::Invalid) || matches!(password, Slot::Invalid);
        if !labels_complete || credentials_invalid {
            return Err(ConfigError::InvalidRecord);
        }
        let (Slot::Value(host), Slot::Value(port)) = (host, port) else {
            return Err(ConfigError::InvalidRecord);
        };

        let mqtt = MqttConfig {
            host,
            port,
            username: username.into_value().unwrap_or_default(),
            password: password.into_value().unwrap_or_default(),
        };
        let channels = core::array::from_fn(|index| ChannelLabels {
            room: core::mem::take(&mut rooms[index]).into_value().unwrap_or_default(),
            device_type: core::mem::take(&mut device_types[index])
                .into_value()
                .unwrap_or_default(),
        });

        Ok(DeviceConfig::new(mqtt, channels))
    }
}

fn non_empty<const M: usize>(value: &str) -> Option<String<M>> {
    if value.is_empty() {
        return None;
    }
    String::try_from(value).ok()
}

/// Parse `{index}A` / `{index}B` keys
fn parse_channel_key(key: &str) -> Option<(usize, LabelField)> {
    let (index, field) = if let Some(index) = key.strip_suffix('A') {
        (index, LabelField::Room)
    } else {
        (key.strip_suffix('B')?, LabelField::DeviceType)
    };

    if index.is_empty() || !index.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    index.parse().ok().map(|index| (index, field))
}
