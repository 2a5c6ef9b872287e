use embedded_hal::digital::PinState;

/// A debounced, accepted transition of a channel's physical input
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConfirmedEdge {
    pub channel: usize,
    /// Input level after the transition
    pub level: PinState,
}

/// Kind of a channel topic
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TopicKind {
    /// Inbound on/off commands
    Command,
    /// Outbound relay state announcements
    State,
}

impl TopicKind {
    pub const fn suffix(self) -> &'static str {
        match self {
            TopicKind::Command => "com",
            TopicKind::State => "state",
        }
    }
}

/// Relay command received on a command topic
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelayCommand {
    On,
    Off,
}

impl RelayCommand {
    /// Parse a command payload. Only the first byte is significant:
    /// `'1'` is on, `'0'` is off, anything else is not a command.
    pub fn parse(payload: &[u8]) -> Option<Self> {
        match payload.first() {
            Some(b'1') => Some(RelayCommand::On),
            Some(b'0') => Some(RelayCommand::Off),
            _ => None,
        }
    }

    pub const fn is_on(self) -> bool {
        matches!(self, RelayCommand::On)
    }
}

/// Payload announcing a relay state
pub const fn state_payload(on: bool) -> &'static [u8] {
    if on { b"1" } else { b"0" }
}
