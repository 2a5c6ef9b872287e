#![cfg_attr(not(test), no_std)]

//! Relay switch firmware core.
//!
//! Reconciles debounced wall switches with relay outputs, exposes every relay
//! as an MQTT-controllable channel and keeps the device configuration in a
//! small persistent record.
//!
//! Layers:
//! - `config` - build-time constants and the persisted [`DeviceConfig`]
//! - `domain` - channel entities, DTOs and the ports the board implements
//! - `controllers` - switch debouncing, topic routing, broker supervision
//! - `app` - the [`Device`] aggregate driving everything from one `tick`
//! - `infrastructure` - relay backends, switch pins, config persistence
//!
//! Everything runs on one cooperative thread; nothing here blocks.

pub mod app;
pub mod config;
pub mod controllers;
pub mod domain;
pub mod infrastructure;

pub use app::{Device, DeviceParts, RelayController};
pub use config::{ChannelLabels, DEFAULT_TIMINGS, DeviceConfig, MqttConfig, RelayTimings};
