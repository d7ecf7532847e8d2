//! The client's model of contacts, chats, messages, and presence.

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};

use chat_core::types::id::{MessageId, UserId};
use chat_entity::conversation::ChatPartner;
use chat_entity::message::Message;
use chat_entity::user::{PresenceStatus, User};

use super::chat_list::{ChatListEntry, MessageRef, Preview, sort_chat_list};
use super::pending::{PendingMessage, PendingOverlay, TempId};

/// One message as the conversation view shows it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageView {
    /// Persisted by the server.
    Confirmed(Message),
    /// Still waiting for the send request to finish.
    Pending(PendingMessage),
}

impl MessageView {
    /// Author.
    pub fn sender_id(&self) -> UserId {
        match self {
            Self::Confirmed(m) => m.sender_id,
            Self::Pending(p) => p.sender_id,
        }
    }

    /// Text body.
    pub fn text(&self) -> Option<&str> {
        match self {
            Self::Confirmed(m) => m.text.as_deref(),
            Self::Pending(p) => p.text.as_deref(),
        }
    }

    /// Provisional messages are never read.
    pub fn is_read(&self) -> bool {
        matches!(self, Self::Confirmed(m) if m.read)
    }

    /// Whether this is a provisional message.
    pub fn is_pending(&self) -> bool {
        matches!(self, Self::Pending(_))
    }

    /// Creation time.
    pub fn created_at(&self) -> DateTime<Utc> {
        match self {
            Self::Confirmed(m) => m.created_at,
            Self::Pending(p) => p.created_at,
        }
    }
}

/// Outcome of applying a pushed `newMessage`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Incoming {
    /// The message was already known; nothing changed.
    pub duplicate: bool,
    /// The message is an unread arrival in the open conversation, so a
    /// read acknowledgment should be scheduled.
    pub ack_needed: bool,
    /// The counterpart has no chat-list row and no known profile; the
    /// chat list should be fetched again.
    pub refresh_chats: bool,
}

/// Confirmed store, pending overlay, chat list, and presence for one
/// signed-in user.
#[derive(Debug, Clone)]
pub struct ConversationState {
    me: UserId,
    contacts: Vec<User>,
    chats: Vec<ChatListEntry>,
    confirmed: HashMap<UserId, Vec<Message>>,
    pending: PendingOverlay,
    open: Option<UserId>,
    online: HashSet<UserId>,
}

impl ConversationState {
    /// Empty state for `me`.
    pub fn new(me: UserId) -> Self {
        Self {
            me,
            contacts: Vec::new(),
            chats: Vec::new(),
            confirmed: HashMap::new(),
            pending: PendingOverlay::new(),
            open: None,
            online: HashSet::new(),
        }
    }

    /// The signed-in user.
    pub fn me(&self) -> UserId {
        self.me
    }

    /// Replace the chat list with a fresh fetch.
    pub fn load_chats(&mut self, partners: Vec<ChatPartner>) {
        self.chats = partners.into_iter().map(ChatListEntry::from).collect();
        sort_chat_list(&mut self.chats);
    }

    /// Replace the contact list.
    pub fn load_contacts(&mut self, contacts: Vec<User>) {
        self.contacts = contacts;
    }

    /// All users except self.
    pub fn contacts(&self) -> &[User] {
        &self.contacts
    }

    /// Chat list, newest first.
    pub fn chat_list(&self) -> &[ChatListEntry] {
        &self.chats
    }

    /// Chat-list row for `partner`.
    pub fn chat(&self, partner: UserId) -> Option<&ChatListEntry> {
        self.chats.iter().find(|e| e.partner.id == partner)
    }

    /// Open a conversation with its fetched history. Returns whether it has
    /// unread messages, i.e. whether a read acknowledgment is due.
    pub fn open_conversation(&mut self, partner: UserId, history: Vec<Message>) -> bool {
        let slot = self.confirmed.entry(partner).or_default();
        // Pushes that raced the history fetch are kept.
        let fetched: HashSet<MessageId> = history.iter().map(|m| m.id).collect();
        let raced: Vec<Message> = slot
            .drain(..)
            .filter(|m| !fetched.contains(&m.id))
            .collect();
        *slot = history;
        slot.extend(raced);
        slot.sort_by_key(|m| m.created_at);

        self.open = Some(partner);
        !self.unread_in_open().is_empty()
    }

    /// Close the open conversation.
    pub fn close_conversation(&mut self) -> Option<UserId> {
        self.open.take()
    }

    /// Partner of the open conversation.
    pub fn open_partner(&self) -> Option<UserId> {
        self.open
    }

    /// Confirmed messages followed by provisional ones, oldest first.
    pub fn messages(&self, partner: UserId) -> Vec<MessageView> {
        let confirmed = self
            .confirmed
            .get(&partner)
            .into_iter()
            .flatten()
            .cloned()
            .map(MessageView::Confirmed);
        let pending = self
            .pending
            .for_partner(partner)
            .cloned()
            .map(MessageView::Pending);
        confirmed.chain(pending).collect()
    }

    /// Ids of messages from the open partner to me that are still unread.
    pub fn unread_in_open(&self) -> Vec<MessageId> {
        let Some(partner) = self.open else {
            return Vec::new();
        };
        self.confirmed
            .get(&partner)
            .into_iter()
            .flatten()
            .filter(|m| !m.read && m.receiver_id == self.me && m.sender_id == partner)
            .map(|m| m.id)
            .collect()
    }

    /// Append a provisional message to `receiver`'s conversation.
    pub fn begin_send(
        &mut self,
        receiver: UserId,
        text: Option<String>,
        image: Option<String>,
    ) -> TempId {
        let pending = PendingMessage {
            temp_id: TempId::generate(),
            sender_id: self.me,
            receiver_id: receiver,
            text,
            image,
            created_at: Utc::now(),
        };
        let temp_id = pending.temp_id.clone();
        let preview = Preview::from(&pending);
        self.pending.push(pending);
        self.touch_chat(receiver, preview);
        temp_id
    }

    /// Replace a provisional message with the server's copy. A `newMessage`
    /// push for the same id may already have landed; it is not duplicated.
    pub fn commit_send(&mut self, temp_id: &TempId, message: Message) {
        self.pending.commit(temp_id);
        let partner = message.receiver_id;
        let preview = Preview::from(&message);
        self.insert_confirmed(message);

        if let Some(entry) = self.chats.iter_mut().find(|e| e.partner.id == partner) {
            let showing_temp = matches!(
                &entry.last_message,
                Some(Preview { id: MessageRef::Pending(id), .. }) if id == temp_id
            );
            if showing_temp {
                entry.last_message = Some(preview);
            }
        }
        sort_chat_list(&mut self.chats);
    }

    /// Drop a provisional message whose send failed.
    pub fn rollback_send(&mut self, temp_id: &TempId) -> Option<PendingMessage> {
        let removed = self.pending.rollback(temp_id)?;
        let partner = removed.receiver_id;
        let latest = self.latest_preview(partner);
        if let Some(entry) = self.chats.iter_mut().find(|e| e.partner.id == partner) {
            let showing_temp = matches!(
                &entry.last_message,
                Some(Preview { id: MessageRef::Pending(id), .. }) if id == temp_id
            );
            if showing_temp {
                entry.last_message = latest;
            }
        }
        sort_chat_list(&mut self.chats);
        Some(removed)
    }

    /// Apply a relayed `newMessage`.
    pub fn apply_incoming(&mut self, message: Message) -> Incoming {
        if !message.involves(self.me) {
            return Incoming::default();
        }
        let partner = message.counterpart(self.me);
        if self.has_confirmed(partner, message.id) {
            return Incoming {
                duplicate: true,
                ..Incoming::default()
            };
        }

        let inbound = message.sender_id == partner && message.receiver_id == self.me;
        let in_open = self.open == Some(partner);
        let preview = Preview::from(&message);
        let unread = inbound && !message.read;
        self.insert_confirmed(message);

        let known = self.touch_chat(partner, preview);
        if unread && !in_open {
            if let Some(entry) = self.chats.iter_mut().find(|e| e.partner.id == partner) {
                entry.unread_count += 1;
            }
        }

        Incoming {
            duplicate: false,
            ack_needed: unread && in_open,
            refresh_chats: !known,
        }
    }

    /// The server confirmed a read acknowledgment for `partner`.
    pub fn confirm_read(&mut self, partner: UserId, ids: &[MessageId]) {
        let me = self.me;
        if let Some(messages) = self.confirmed.get_mut(&partner) {
            for m in messages.iter_mut() {
                if m.receiver_id == me && ids.contains(&m.id) {
                    m.read = true;
                }
            }
        }
        if let Some(entry) = self.chats.iter_mut().find(|e| e.partner.id == partner) {
            entry.unread_count = 0;
        }
    }

    /// A partner read messages I sent.
    pub fn apply_message_read(&mut self, reader: UserId, ids: &[MessageId]) {
        let me = self.me;
        if let Some(messages) = self.confirmed.get_mut(&reader) {
            for m in messages.iter_mut() {
                if m.sender_id == me && ids.contains(&m.id) {
                    m.read = true;
                }
            }
        }
    }

    /// Replace the online set.
    pub fn set_online(&mut self, users: Vec<UserId>) {
        self.online = users.into_iter().collect();
    }

    /// Forget presence, e.g. after the relay connection dropped.
    pub fn clear_online(&mut self) {
        self.online.clear();
    }

    /// Whether `user` is online.
    pub fn is_online(&self, user: UserId) -> bool {
        self.online.contains(&user)
    }

    /// Presence of `user` as last broadcast.
    pub fn presence(&self, user: UserId) -> PresenceStatus {
        self.is_online(user).into()
    }

    /// Number of provisional messages.
    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    fn has_confirmed(&self, partner: UserId, id: MessageId) -> bool {
        self.confirmed
            .get(&partner)
            .is_some_and(|ms| ms.iter().any(|m| m.id == id))
    }

    fn insert_confirmed(&mut self, message: Message) {
        let partner = message.counterpart(self.me);
        let slot = self.confirmed.entry(partner).or_default();
        if slot.iter().any(|m| m.id == message.id) {
            return;
        }
        let at = slot.partition_point(|m| m.created_at <= message.created_at);
        slot.insert(at, message);
    }

    fn latest_preview(&self, partner: UserId) -> Option<Preview> {
        let confirmed = self
            .confirmed
            .get(&partner)
            .and_then(|ms| ms.last())
            .map(Preview::from);
        let pending = self.pending.for_partner(partner).last().map(Preview::from);
        match (confirmed, pending) {
            (Some(c), Some(p)) => Some(if p.created_at >= c.created_at { p } else { c }),
            (c, p) => c.or(p),
        }
    }

    /// Move `preview` into `partner`'s row, creating the row from the
    /// contact list if needed. Returns `false` when the partner is unknown.
    fn touch_chat(&mut self, partner: UserId, preview: Preview) -> bool {
        let known = match self.chats.iter_mut().find(|e| e.partner.id == partner) {
            Some(entry) => {
                let newer = entry
                    .last_activity()
                    .is_none_or(|at| preview.created_at >= at);
                if newer {
                    entry.last_message = Some(preview);
                }
                true
            }
            None => match self.contacts.iter().find(|u| u.id == partner) {
                Some(user) => {
                    let mut entry = ChatListEntry::empty(user.clone());
                    entry.last_message = Some(preview);
                    self.chats.push(entry);
                    true
                }
                None => false,
            },
        };
        sort_chat_list(&mut self.chats);
        known
    }
}
