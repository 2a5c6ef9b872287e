//! Broker side of the device
//!
//! `TopicRouter` maps channels to topics and dispatches commands,
//! `ConnectionSupervisor` keeps the session alive.

mod router;
mod supervisor;

pub use router::TopicRouter;
pub use supervisor::{
    CLIENT_ID_PREFIX, ClientId, ConnectionSupervisor, SessionState, SupervisorEvent, client_id,
};
