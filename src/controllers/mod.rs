pub mod mqtt;
pub mod switch;

pub use mqtt::{ConnectionSupervisor, SessionState, SupervisorEvent, TopicRouter};
pub use switch::SwitchDebouncer;
