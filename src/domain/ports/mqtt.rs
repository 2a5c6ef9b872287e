use core::fmt;

/// Error type for the broker session operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionError {
    /// No session is established
    NotConnected,
    /// The broker rejected the connection
    Refused,
    /// Network transport failure
    Transport,
}

impl fmt::Display for SessionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionError::NotConnected => write!(f, "Not connected"),
            SessionError::Refused => write!(f, "Connection refused"),
            SessionError::Transport => write!(f, "Transport error"),
        }
    }
}

/// Options for a single connection attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConnectOptions<'a> {
    pub client_id: &'a str,
    pub host: &'a str,
    pub port: u16,
    /// Username and password, `None` for an anonymous session
    pub credentials: Option<(&'a str, &'a str)>,
}

impl<'a> ConnectOptions<'a> {
    pub const fn new(client_id: &'a str, host: &'a str, port: u16) -> Self {
        Self {
            client_id,
            host,
            port,
            credentials: None,
        }
    }

    #[must_use]
    pub const fn with_credentials(mut self, username: &'a str, password: &'a str) -> Self {
        self.credentials = Some((username, password));
        self
    }
}

/// Session with the message broker.
///
/// Implemented by the board's MQTT client. Inbound messages are delivered
/// by the client through [`crate::Device::on_message`].
pub trait MqttSession {
    /// Try to establish a session
    fn connect(&mut self, options: &ConnectOptions<'_>) -> Result<(), SessionError>;

    /// Drop the current session, if any
    fn disconnect(&mut self);

    /// Whether the session is still alive
    fn is_connected(&mut self) -> bool;

    fn subscribe(&mut self, topic: &str) -> Result<(), SessionError>;

    fn publish(&mut self, topic: &str, payload: &[u8]) -> Result<(), SessionError>;
}
