mod persistent_config;

pub use persistent_config::{ConfigError, ConfigStore, EncodedRecord, decode_config, encode_config};
