//! Domain layer - channel entities, messages and ports
//!
//! Ports are implemented by the board (GPIO, I2C, flash, network) and
//! consumed by the controllers and the device aggregate.

pub mod dto;
pub mod entity;
pub mod ports;
pub mod topic;

pub use dto::{ConfirmedEdge, RelayCommand, TopicKind};
pub use entity::{Channel, ChannelStore};
pub use topic::{Topic, topic_for};
