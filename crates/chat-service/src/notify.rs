//! Push seam between the HTTP write path and live relay connections.
//!
//! Services call the notifier only after the store accepted the write.
//! Delivery is best effort: recipients without a live connection are
//! skipped and nothing is reported back.

use chat_core::types::id::{MessageId, UserId};
use chat_entity::message::Message;

/// Receives committed message writes.
pub trait MessageNotifier: Send + Sync + 'static {
    /// A message was persisted.
    fn message_created(&self, message: &Message);

    /// `reader_id` acknowledged `message_ids` sent by `sender_id`.
    fn messages_read(&self, sender_id: UserId, reader_id: UserId, message_ids: &[MessageId]);
}

/// Notifier that drops everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopNotifier;

impl MessageNotifier for NoopNotifier {
    fn message_created(&self, _message: &Message) {}

    fn messages_read(&self, _sender_id: UserId, _reader_id: UserId, _message_ids: &[MessageId]) {}
}
