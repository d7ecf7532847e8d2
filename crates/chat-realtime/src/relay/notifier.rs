//! Pushes triggered by the HTTP message path.

use std::collections::HashSet;

use tracing::debug;

use chat_core::types::id::{MessageId, UserId};
use chat_entity::message::Message;
use chat_service::notify::MessageNotifier;

use super::event_relay::EventRelay;
use crate::message::types::ServerEvent;

impl MessageNotifier for EventRelay {
    /// `newMessage` to every handle of the receiver and of the sender,
    /// once per connection even if both sides share a handle list.
    fn message_created(&self, message: &Message) {
        let mut seen = HashSet::new();
        let targets = self
            .registry()
            .lookup(&message.receiver_id)
            .into_iter()
            .chain(self.registry().lookup(&message.sender_id))
            .filter(|handle| seen.insert(handle.id));

        let event = ServerEvent::NewMessage(message.clone());
        let mut delivered = 0usize;
        for handle in targets {
            let ok = handle.send(event.clone());
            self.metrics().record_send(ok);
            delivered += usize::from(ok);
        }
        debug!(
            message_id = %message.id,
            sender_id = %message.sender_id,
            receiver_id = %message.receiver_id,
            delivered,
            "Pushed newMessage"
        );
    }

    /// `messageRead` to the original sender only, and only when something
    /// actually flipped.
    fn messages_read(&self, sender_id: UserId, reader_id: UserId, message_ids: &[MessageId]) {
        if message_ids.is_empty() {
            return;
        }
        let event = ServerEvent::MessageRead {
            message_ids: message_ids.to_vec(),
            user_id: reader_id,
        };
        let delivered = self.send_to_user(&sender_id, &event);
        debug!(
            sender_id = %sender_id,
            reader_id = %reader_id,
            count = message_ids.len(),
            delivered,
            "Pushed messageRead"
        );
    }
}
