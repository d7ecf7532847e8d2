//! JSON encoding for relay frames.

use super::types::{ClientEvent, ServerEvent};

/// Serialize a server event to a text frame.
pub fn serialize_outbound(event: &ServerEvent) -> Result<String, serde_json::Error> {
    serde_json::to_string(event)
}

/// Parse a client text frame.
pub fn deserialize_inbound(text: &str) -> Result<ClientEvent, serde_json::Error> {
    serde_json::from_str(text)
}

/// Serialize a client event (used by the client transport).
pub fn serialize_client(event: &ClientEvent) -> Result<String, serde_json::Error> {
    serde_json::to_string(event)
}

/// Parse a server text frame (used by the client transport).
pub fn deserialize_server(text: &str) -> Result<ServerEvent, serde_json::Error> {
    serde_json::from_str(text)
}
