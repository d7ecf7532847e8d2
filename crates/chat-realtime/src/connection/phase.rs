//! Connection lifecycle phases.

use std::fmt;

/// Where a connection is in its lifecycle. Phases only move forward:
/// `Connecting -> Authenticated -> Active -> Closed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum ConnectionPhase {
    /// Upgrade received, credential not yet checked.
    Connecting = 0,
    /// Credential verified, not yet in the presence registry.
    Authenticated = 1,
    /// Registered; receives and sends events.
    Active = 2,
    /// Removed from presence; the socket is being torn down.
    Closed = 3,
}

impl ConnectionPhase {
    /// Decode a stored discriminant. Unknown values read as `Closed`.
    pub fn from_u8(value: u8) -> Self {
        match value {
            0 => Self::Connecting,
            1 => Self::Authenticated,
            2 => Self::Active,
            _ => Self::Closed,
        }
    }

    /// Return the phase as a lowercase string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Connecting => "connecting",
            Self::Authenticated => "authenticated",
            Self::Active => "active",
            Self::Closed => "closed",
        }
    }
}

impl fmt::Display for ConnectionPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
