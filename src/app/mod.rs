//! Application layer - the device aggregate and relay control

mod device;
mod relay;

pub use device::{Device, DeviceParts};
pub use relay::{RelayController, RelayError};
pub use self_test::{SelfTest, SelfTestAction};
