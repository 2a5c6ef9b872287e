pub mod hardware;
pub mod mqtt;

pub use hardware::*;
pub use mqtt::*;
