//! The client driver: applies fetch results, optimistic writes, and relay
//! pushes to [`ConversationState`], and owns the timers around them.

use std::sync::Arc;

use serde_json::Value;
use tokio::sync::{Mutex, mpsc};
use tokio::time::Instant;
use tracing::{debug, info, warn};

use chat_core::types::id::UserId;
use chat_entity::message::Message;
use chat_realtime::message::{ClientEvent, ServerEvent};
use chat_service::call_log::CallLogView;
use chat_service::message::SendMessageRequest;

use crate::call::session::{CallPhase, CallSession};
use crate::config::ClientConfig;
use crate::error::ClientError;
use crate::state::conversation::ConversationState;
use crate::state::pending::TempId;
use crate::state::read_ack::ReadAckDebounce;
use crate::state::typing::{LocalTypingEmitter, TypingTracker};
use crate::transport::api::ChatApi;
use crate::transport::http::HttpChatApi;
use crate::transport::relay::RelayConnection;

/// Things the UI should surface that are not part of the state itself.
#[derive(Debug, Clone, PartialEq)]
pub enum ClientNotice {
    /// An optimistic message was removed because the send failed.
    SendFailed {
        /// The removed provisional message.
        temp_id: TempId,
        /// Intended receiver.
        receiver: UserId,
        /// What went wrong.
        error: String,
    },
    /// The read acknowledgment for a conversation failed.
    ReadAckFailed {
        /// Partner of the conversation.
        partner: UserId,
        /// What went wrong.
        error: String,
    },
    /// Someone is calling. Hand `offer` to the media layer before
    /// [`ChatClient::accept_call`].
    IncomingCall {
        caller_id: UserId,
        caller_name: String,
        offer: Value,
    },
    /// The callee answered an outgoing call; apply `answer` to the local
    /// peer connection.
    CallAccepted { answer: Value },
    /// The relay could not reach the call peer.
    CallFailed {
        /// `receiver-offline`, `peer-offline`, or `relay-disconnected`.
        reason: String,
    },
    /// A network candidate from the call peer, for the media layer.
    RemoteCandidate(Value),
}

/// Receivers handed out by [`ChatClient::new`].
#[derive(Debug)]
pub struct ClientChannels {
    /// Notices for the UI.
    pub notices: mpsc::UnboundedReceiver<ClientNotice>,
    /// Events to write to the relay connection.
    pub outbound: mpsc::UnboundedReceiver<ClientEvent>,
}

#[derive(Debug)]
struct Shared {
    conversation: ConversationState,
    remote_typing: TypingTracker,
    local_typing: LocalTypingEmitter,
    read_ack: ReadAckDebounce,
    call: CallSession,
}

/// Chat client for one signed-in user.
pub struct ChatClient<A: ChatApi> {
    api: Arc<A>,
    config: Arc<ClientConfig>,
    shared: Arc<Mutex<Shared>>,
    outbound: mpsc::UnboundedSender<ClientEvent>,
    notices: mpsc::UnboundedSender<ClientNotice>,
}

impl<A: ChatApi> Clone for ChatClient<A> {
    fn clone(&self) -> Self {
        Self {
            api: Arc::clone(&self.api),
            config: Arc::clone(&self.config),
            shared: Arc::clone(&self.shared),
            outbound: self.outbound.clone(),
            notices: self.notices.clone(),
        }
    }
}

impl ChatClient<HttpChatApi> {
    /// Connect to a server: load contacts and chats over HTTP, open the
    /// relay, and pump events until the relay drops.
    pub async fn connect(
        config: ClientConfig,
        token: &str,
        me: UserId,
    ) -> Result<(Self, mpsc::UnboundedReceiver<ClientNotice>), ClientError> {
        let api = HttpChatApi::new(config.base_url.clone(), token);
        let (relay, mut events) = RelayConnection::connect(&config.relay_url(), token).await?;
        let (client, channels) = ChatClient::new(api, config, me);
        client.load().await?;

        let ClientChannels {
            notices,
            mut outbound,
        } = channels;
        let driver = client.clone();
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    Some(event) = outbound.recv() => {
                        if relay.send(&event).is_err() {
                            break;
                        }
                    }
                    event = events.recv() => match event {
                        Some(event) => driver.handle_event(event).await,
                        None => break,
                    },
                }
            }
            driver.relay_disconnected().await;
            relay.close().await;
        });

        info!(user_id = %me, "Chat client connected");
        Ok((client, notices))
    }
}

impl<A: ChatApi> ChatClient<A> {
    /// Build a client over `api` for user `me`.
    pub fn new(api: A, config: ClientConfig, me: UserId) -> (Self, ClientChannels) {
        let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();
        let (notice_tx, notice_rx) = mpsc::unbounded_channel();
        let shared = Shared {
            conversation: ConversationState::new(me),
            remote_typing: TypingTracker::new(config.typing_expiry),
            local_typing: LocalTypingEmitter::new(config.typing_idle),
            read_ack: ReadAckDebounce::new(config.read_ack_debounce),
            call: CallSession::new(),
        };
        let client = Self {
            api: Arc::new(api),
            config: Arc::new(config),
            shared: Arc::new(Mutex::new(shared)),
            outbound: outbound_tx,
            notices: notice_tx,
        };
        (
            client,
            ClientChannels {
                notices: notice_rx,
                outbound: outbound_rx,
            },
        )
    }

    /// Client settings.
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Read the conversation state.
    pub async fn view<R>(&self, f: impl FnOnce(&ConversationState) -> R) -> R {
        let shared = self.shared.lock().await;
        f(&shared.conversation)
    }

    /// Fetch contacts and the chat list.
    pub async fn load(&self) -> Result<(), ClientError> {
        let (contacts, chats) = tokio::try_join!(self.api.contacts(), self.api.chats())?;
        let mut shared = self.shared.lock().await;
        shared.conversation.load_contacts(contacts);
        shared.conversation.load_chats(chats);
        Ok(())
    }

    /// Open the conversation with `partner`. Unread messages are
    /// acknowledged after the debounce unless it is closed first.
    pub async fn open(&self, partner: UserId) -> Result<(), ClientError> {
        let history = self.api.conversation(partner).await?;
        let mut shared = self.shared.lock().await;
        if let Some(previous) = shared.conversation.open_partner() {
            if previous != partner {
                self.stop_typing(&mut shared, previous);
            }
        }
        shared.read_ack.cancel();
        if shared.conversation.open_conversation(partner, history) {
            self.schedule_read_ack(&mut shared, partner);
        }
        Ok(())
    }

    /// Close the open conversation.
    pub async fn close(&self) {
        let mut shared = self.shared.lock().await;
        shared.read_ack.cancel();
        if let Some(partner) = shared.conversation.close_conversation() {
            self.stop_typing(&mut shared, partner);
        }
    }

    /// Send a message to the open conversation. Text is trimmed, and a
    /// message left with neither text nor an image is refused before
    /// anything is shown. The provisional copy is visible until the server
    /// answers; on failure it is removed and a [`ClientNotice::SendFailed`]
    /// is emitted. There is no retry.
    pub async fn send(
        &self,
        text: Option<String>,
        image: Option<String>,
    ) -> Result<Message, ClientError> {
        let text = text
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty());
        let image = image.filter(|i| !i.trim().is_empty());
        if text.is_none() && image.is_none() {
            return Err(ClientError::EmptyMessage);
        }

        let (receiver, temp_id) = {
            let mut shared = self.shared.lock().await;
            let receiver = shared
                .conversation
                .open_partner()
                .ok_or(ClientError::NoOpenConversation)?;
            self.stop_typing(&mut shared, receiver);
            let temp_id = shared
                .conversation
                .begin_send(receiver, text.clone(), image.clone());
            (receiver, temp_id)
        };

        let request = SendMessageRequest { text, image };
        match self.api.send(receiver, &request).await {
            Ok(message) => {
                let mut shared = self.shared.lock().await;
                shared.conversation.commit_send(&temp_id, message.clone());
                Ok(message)
            }
            Err(e) => {
                warn!(receiver = %receiver, temp_id = %temp_id, error = %e, "Send failed");
                self.shared.lock().await.conversation.rollback_send(&temp_id);
                let _ = self.notices.send(ClientNotice::SendFailed {
                    temp_id,
                    receiver,
                    error: e.to_string(),
                });
                Err(e)
            }
        }
    }

    /// The local user typed in the open conversation.
    pub async fn keystroke(&self) {
        let mut shared = self.shared.lock().await;
        let Some(receiver) = shared.conversation.open_partner() else {
            return;
        };
        if shared.local_typing.keystroke(Instant::now()).is_none() {
            return;
        }
        self.emit(ClientEvent::Typing {
            receiver_id: receiver,
            is_typing: true,
        });

        let client = self.clone();
        tokio::spawn(async move {
            loop {
                let deadline = {
                    let shared = client.shared.lock().await;
                    match shared.local_typing.deadline() {
                        Some(deadline) => deadline,
                        None => return,
                    }
                };
                tokio::time::sleep_until(deadline).await;
                let mut shared = client.shared.lock().await;
                if shared.local_typing.poll(Instant::now()).is_some() {
                    client.emit(ClientEvent::Typing {
                        receiver_id: receiver,
                        is_typing: false,
                    });
                    return;
                }
            }
        });
    }

    /// Whether `user` is typing to us.
    pub async fn is_typing(&self, user: UserId) -> bool {
        self.shared.lock().await.remote_typing.is_typing(user)
    }

    /// Everyone currently typing to us. Lapsed flags are dropped first.
    pub async fn typing_users(&self) -> Vec<UserId> {
        let mut shared = self.shared.lock().await;
        shared.remote_typing.expire(Instant::now());
        shared.remote_typing.active()
    }

    /// Apply one relay event.
    pub async fn handle_event(&self, event: ServerEvent) {
        debug!(event = event.name(), "Relay event");
        match event {
            ServerEvent::GetOnlineUsers(users) => {
                self.shared.lock().await.conversation.set_online(users);
            }
            ServerEvent::NewMessage(message) => self.apply_new_message(message).await,
            ServerEvent::MessageRead {
                message_ids,
                user_id,
            } => {
                let mut shared = self.shared.lock().await;
                shared
                    .conversation
                    .apply_message_read(user_id, &message_ids);
            }
            ServerEvent::UserTyping { user_id, is_typing } => {
                let mut shared = self.shared.lock().await;
                shared.remote_typing.expire(Instant::now());
                shared.remote_typing.apply(user_id, is_typing);
            }
            ServerEvent::IncomingCall {
                caller_id,
                caller_name,
                offer,
            } => {
                let ringing = self
                    .shared
                    .lock()
                    .await
                    .call
                    .on_incoming(caller_id, caller_name.clone(), offer.clone());
                match ringing {
                    Ok(()) => {
                        let _ = self.notices.send(ClientNotice::IncomingCall {
                            caller_id,
                            caller_name,
                            offer,
                        });
                    }
                    Err(_) => {
                        debug!(caller = %caller_id, "Busy, declining incoming call");
                        self.emit(ClientEvent::RejectCall { caller_id });
                    }
                }
            }
            ServerEvent::CallAccepted { answer } => {
                let accepted = self.shared.lock().await.call.on_accepted(answer.clone());
                match accepted {
                    Ok(()) => {
                        let _ = self.notices.send(ClientNotice::CallAccepted { answer });
                    }
                    Err(e) => debug!(error = %e, "Ignoring call-accepted"),
                }
            }
            ServerEvent::CallRejected => {
                let result = self.shared.lock().await.call.on_rejected();
                self.after_call_event(result).await;
            }
            ServerEvent::IceCandidate { candidate } => {
                let _ = self.notices.send(ClientNotice::RemoteCandidate(candidate));
            }
            ServerEvent::CallEnded => {
                let result = self.shared.lock().await.call.on_ended();
                self.after_call_event(result).await;
            }
            ServerEvent::CallFailed { reason } => {
                let result = self.shared.lock().await.call.on_failed(reason.clone());
                if result.is_ok() {
                    let _ = self.notices.send(ClientNotice::CallFailed { reason });
                }
                self.after_call_event(result).await;
            }
            // Answered by the relay transport before it gets here.
            ServerEvent::Ping { .. } => {}
            ServerEvent::Error { code, message } => {
                warn!(code = %code, message = %message, "Relay rejected a frame");
            }
        }
    }

    /// The relay connection dropped: presence is unknown and any live call
    /// is over.
    pub async fn relay_disconnected(&self) {
        let result = {
            let mut shared = self.shared.lock().await;
            shared.conversation.clear_online();
            shared.remote_typing.clear();
            if shared.call.phase().is_terminal() {
                None
            } else {
                Some(shared.call.on_failed("relay-disconnected"))
            }
        };
        if let Some(result) = result {
            let _ = self.notices.send(ClientNotice::CallFailed {
                reason: "relay-disconnected".to_string(),
            });
            self.after_call_event(result).await;
        }
    }

    /// Current call phase.
    pub async fn call_phase(&self) -> CallPhase {
        self.shared.lock().await.call.phase()
    }

    /// Copy of the current or last call: peer, caller name, remote offer
    /// and answer.
    pub async fn call_session(&self) -> CallSession {
        self.shared.lock().await.call.clone()
    }

    /// Call history for the signed-in user, newest first.
    pub async fn call_history(&self) -> Result<Vec<CallLogView>, ClientError> {
        self.api.call_logs().await
    }

    /// Place a call to `peer`.
    pub async fn place_call(&self, peer: UserId, offer: Value) -> Result<(), ClientError> {
        let event = self.shared.lock().await.call.start_outgoing(peer, offer)?;
        self.emit(event);
        Ok(())
    }

    /// Accept the ringing incoming call.
    pub async fn accept_call(&self, answer: Value) -> Result<(), ClientError> {
        let event = self.shared.lock().await.call.accept(answer)?;
        self.emit(event);
        Ok(())
    }

    /// Decline the ringing incoming call.
    pub async fn reject_call(&self) -> Result<(), ClientError> {
        let event = {
            let mut shared = self.shared.lock().await;
            let event = shared.call.reject()?;
            shared.call.settle();
            event
        };
        self.emit(event);
        Ok(())
    }

    /// Media for the current call is flowing.
    pub async fn media_connected(&self) -> Result<(), ClientError> {
        self.shared.lock().await.call.media_connected()
    }

    /// Forward a local network candidate.
    pub async fn send_candidate(&self, candidate: Value) -> Result<(), ClientError> {
        let event = self.shared.lock().await.call.ice_candidate(candidate)?;
        self.emit(event);
        Ok(())
    }

    /// Hang up the current call.
    pub async fn hang_up(&self) -> Result<(), ClientError> {
        let event = self.shared.lock().await.call.hang_up()?;
        self.emit(event);
        self.record_call_log().await;
        Ok(())
    }

    async fn apply_new_message(&self, message: Message) {
        let sender = message.sender_id;
        let outcome = {
            let mut shared = self.shared.lock().await;
            let outcome = shared.conversation.apply_incoming(message);
            if !outcome.duplicate {
                shared.remote_typing.apply(sender, false);
            }
            if outcome.ack_needed {
                self.schedule_read_ack(&mut shared, sender);
            }
            outcome
        };

        if outcome.refresh_chats {
            match self.api.chats().await {
                Ok(chats) => self.shared.lock().await.conversation.load_chats(chats),
                Err(e) => warn!(error = %e, "Chat list refresh failed"),
            }
        }
    }

    fn schedule_read_ack(&self, shared: &mut Shared, partner: UserId) {
        let ticket = shared.read_ack.schedule(partner);
        let client = self.clone();
        tokio::spawn(async move {
            if !ticket.wait().await {
                return;
            }
            if client.shared.lock().await.conversation.open_partner() != Some(partner) {
                return;
            }
            match client.api.mark_as_read(partner).await {
                Ok(result) => {
                    debug!(partner = %partner, count = result.message_ids.len(), "Read acknowledged");
                    client
                        .shared
                        .lock()
                        .await
                        .conversation
                        .confirm_read(partner, &result.message_ids);
                }
                Err(e) => {
                    warn!(partner = %partner, error = %e, "Read acknowledgment failed");
                    let _ = client.notices.send(ClientNotice::ReadAckFailed {
                        partner,
                        error: e.to_string(),
                    });
                }
            }
        });
    }

    fn stop_typing(&self, shared: &mut Shared, receiver: UserId) {
        if shared.local_typing.stop().is_some() {
            self.emit(ClientEvent::Typing {
                receiver_id: receiver,
                is_typing: false,
            });
        }
    }

    async fn after_call_event(&self, result: Result<(), ClientError>) {
        match result {
            Ok(()) => self.record_call_log().await,
            Err(e) => debug!(error = %e, "Ignoring call event"),
        }
    }

    /// Write the caller's log entry once the session has ended, then let a
    /// rejected call settle into `Ended`.
    async fn record_call_log(&self) {
        let draft = {
            let mut shared = self.shared.lock().await;
            let draft = shared.call.log_draft();
            shared.call.settle();
            draft
        };
        let Some(draft) = draft else {
            return;
        };
        if let Err(e) = self.api.record_call(&draft).await {
            warn!(receiver = %draft.receiver_id, error = %e, "Failed to record call log");
        }
    }

    fn emit(&self, event: ClientEvent) {
        if self.outbound.send(event).is_err() {
            debug!("Relay outbound closed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex as StdMutex;
    use std::time::Duration;

    use async_trait::async_trait;
    use chrono::Utc;
    use serde_json::json;

    use chat_core::types::id::{CallLogId, MessageId};
    use chat_entity::call_log::{CallDirection, CallLog, CallLogEntry, CallOutcome, NewCallLog};
    use chat_entity::conversation::ChatPartner;
    use chat_entity::message::NewMessage;
    use chat_entity::user::User;
    use chat_service::call_log::{CallLogView, RecordCallLogRequest};
    use chat_service::message::MarkReadResult;

    #[derive(Default)]
    struct FakeApi {
        me: UserId,
        contacts: Vec<User>,
        chats: Vec<ChatPartner>,
        history: Vec<Message>,
        fail_send: bool,
        call_log: Vec<CallLogView>,
        sent: StdMutex<Vec<SendMessageRequest>>,
        mark_calls: StdMutex<Vec<UserId>>,
        recorded_calls: StdMutex<Vec<RecordCallLogRequest>>,
    }

    #[async_trait]
    impl ChatApi for FakeApi {
        async fn contacts(&self) -> Result<Vec<User>, ClientError> {
            Ok(self.contacts.clone())
        }

        async fn chats(&self) -> Result<Vec<ChatPartner>, ClientError> {
            Ok(self.chats.clone())
        }

        async fn conversation(&self, _partner: UserId) -> Result<Vec<Message>, ClientError> {
            Ok(self.history.clone())
        }

        async fn send(
            &self,
            receiver: UserId,
            request: &SendMessageRequest,
        ) -> Result<Message, ClientError> {
            self.sent.lock().unwrap().push(request.clone());
            if self.fail_send {
                return Err(ClientError::Api {
                    status: 500,
                    code: "INTERNAL_ERROR".into(),
                    message: "Internal server error".into(),
                });
            }
            Ok(
                NewMessage::new(self.me, receiver, request.text.clone(), request.image.clone())
                    .into_message(MessageId::new(), Utc::now()),
            )
        }

        async fn mark_as_read(&self, partner: UserId) -> Result<MarkReadResult, ClientError> {
            self.mark_calls.lock().unwrap().push(partner);
            let message_ids = self
                .history
                .iter()
                .filter(|m| m.is_unread_for(self.me) && m.sender_id == partner)
                .map(|m| m.id)
                .collect();
            Ok(MarkReadResult { message_ids })
        }

        async fn record_call(&self, request: &RecordCallLogRequest) -> Result<CallLog, ClientError> {
            self.recorded_calls.lock().unwrap().push(request.clone());
            Ok(NewCallLog {
                caller_id: self.me,
                receiver_id: request.receiver_id,
                duration_seconds: request.duration_seconds,
                outcome: request.outcome,
            }
            .into_call_log(CallLogId::new(), Utc::now()))
        }

        async fn call_logs(&self) -> Result<Vec<CallLogView>, ClientError> {
            Ok(self.call_log.clone())
        }
    }

    fn text(from: UserId, to: UserId, body: &str) -> Message {
        NewMessage::new(from, to, Some(body.into()), None)
            .into_message(MessageId::new(), Utc::now())
    }

    #[tokio::test(start_paused = true)]
    async fn test_read_receipt_scenario() {
        let alice = User::new("Alice");
        let bob = User::new("Bob");

        // Bob has one unread message from Alice.
        let unread = text(alice.id, bob.id, "are you there?");
        let api = FakeApi {
            me: bob.id,
            contacts: vec![alice.clone()],
            chats: vec![ChatPartner {
                user: alice.clone(),
                last_message: Some(unread.clone()),
                unread_count: 1,
            }],
            history: vec![unread.clone()],
            ..FakeApi::default()
        };
        let (bob_client, _bob_channels) = ChatClient::new(api, ClientConfig::default(), bob.id);
        bob_client.load().await.unwrap();
        bob_client.open(alice.id).await.unwrap();

        tokio::time::sleep(Duration::from_millis(1000)).await;
        assert!(bob_client.api.mark_calls.lock().unwrap().is_empty());
        assert_eq!(
            bob_client.view(|s| s.chat(alice.id).map(|e| e.unread_count)).await,
            Some(1)
        );

        tokio::time::sleep(Duration::from_millis(600)).await;
        assert_eq!(*bob_client.api.mark_calls.lock().unwrap(), vec![alice.id]);
        assert!(bob_client.view(|s| s.unread_in_open().is_empty()).await);
        assert_eq!(
            bob_client.view(|s| s.chat(alice.id).map(|e| e.unread_count)).await,
            Some(0)
        );

        // Alice's side receives the relayed receipt.
        let alice_api = FakeApi {
            me: alice.id,
            history: vec![unread.clone()],
            ..FakeApi::default()
        };
        let (alice_client, _alice_channels) =
            ChatClient::new(alice_api, ClientConfig::default(), alice.id);
        alice_client.open(bob.id).await.unwrap();
        assert!(!alice_client.view(|s| s.messages(bob.id)[0].is_read()).await);
        alice_client
            .handle_event(ServerEvent::MessageRead {
                message_ids: vec![unread.id],
                user_id: bob.id,
            })
            .await;
        assert!(alice_client.view(|s| s.messages(bob.id)[0].is_read()).await);
    }

    #[tokio::test(start_paused = true)]
    async fn test_close_cancels_pending_read_ack() {
        let alice = User::new("Alice");
        let me = UserId::new();
        let api = FakeApi {
            me,
            history: vec![text(alice.id, me, "hi")],
            ..FakeApi::default()
        };
        let (client, _channels) = ChatClient::new(api, ClientConfig::default(), me);
        client.open(alice.id).await.unwrap();

        tokio::time::sleep(Duration::from_millis(500)).await;
        client.close().await;
        tokio::time::sleep(Duration::from_secs(3)).await;
        assert!(client.api.mark_calls.lock().unwrap().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_incoming_in_open_conversation_is_acknowledged() {
        let alice = User::new("Alice");
        let me = UserId::new();
        let api = FakeApi {
            me,
            contacts: vec![alice.clone()],
            ..FakeApi::default()
        };
        let (client, _channels) = ChatClient::new(api, ClientConfig::default(), me);
        client.load().await.unwrap();
        client.open(alice.id).await.unwrap();

        client
            .handle_event(ServerEvent::NewMessage(text(alice.id, me, "ping")))
            .await;
        tokio::time::sleep(Duration::from_secs(2)).await;
        assert_eq!(*client.api.mark_calls.lock().unwrap(), vec![alice.id]);
    }

    #[tokio::test]
    async fn test_failed_send_removes_optimistic_message() {
        let alice = User::new("Alice");
        let me = UserId::new();
        let api = FakeApi {
            me,
            contacts: vec![alice.clone()],
            fail_send: true,
            ..FakeApi::default()
        };
        let (client, mut channels) = ChatClient::new(api, ClientConfig::default(), me);
        client.load().await.unwrap();
        client.open(alice.id).await.unwrap();

        let err = client.send(Some("hello".into()), None).await.unwrap_err();
        assert_eq!(err.status(), Some(500));
        assert!(client.view(|s| s.messages(alice.id).is_empty()).await);
        assert_eq!(client.view(|s| s.pending_count()).await, 0);

        match channels.notices.recv().await {
            Some(ClientNotice::SendFailed { receiver, .. }) => assert_eq!(receiver, alice.id),
            other => panic!("unexpected notice: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_successful_send_moves_chat_to_top() {
        let alice = User::new("Alice");
        let bob = User::new("Bob");
        let me = UserId::new();
        let api = FakeApi {
            me,
            contacts: vec![alice.clone(), bob.clone()],
            chats: vec![ChatPartner {
                user: bob.clone(),
                last_message: Some(text(bob.id, me, "old")),
                unread_count: 0,
            }],
            ..FakeApi::default()
        };
        let (client, _channels) = ChatClient::new(api, ClientConfig::default(), me);
        client.load().await.unwrap();
        client.open(alice.id).await.unwrap();

        let sent = client.send(Some("hi".into()), None).await.unwrap();
        let (top, views) = client
            .view(|s| (s.chat_list()[0].partner.id, s.messages(alice.id)))
            .await;
        assert_eq!(top, alice.id);
        assert_eq!(views, vec![crate::state::MessageView::Confirmed(sent)]);
    }

    #[tokio::test]
    async fn test_send_trims_and_refuses_blank_text() {
        let alice = User::new("Alice");
        let me = UserId::new();
        let api = FakeApi {
            me,
            contacts: vec![alice.clone()],
            ..FakeApi::default()
        };
        let (client, _channels) = ChatClient::new(api, ClientConfig::default(), me);
        client.load().await.unwrap();
        client.open(alice.id).await.unwrap();

        for blank in ["", "   ", "\n\t "] {
            assert!(matches!(
                client.send(Some(blank.into()), None).await,
                Err(ClientError::EmptyMessage)
            ));
        }
        assert!(matches!(
            client.send(None, Some("  ".into())).await,
            Err(ClientError::EmptyMessage)
        ));
        assert!(client.api.sent.lock().unwrap().is_empty());
        assert_eq!(client.view(|s| s.pending_count()).await, 0);
        assert!(client.view(|s| s.messages(alice.id).is_empty()).await);

        let sent = client.send(Some("  hi there \n".into()), None).await.unwrap();
        assert_eq!(sent.text.as_deref(), Some("hi there"));
        let requests = client.api.sent.lock().unwrap().clone();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].text.as_deref(), Some("hi there"));

        // An image alone is enough; blank text next to it is dropped.
        client
            .send(Some(" ".into()), Some("https://img.example/cat.png".into()))
            .await
            .unwrap();
        let requests = client.api.sent.lock().unwrap().clone();
        assert_eq!(requests[1].text, None);
    }

    #[tokio::test]
    async fn test_send_requires_open_conversation() {
        let (client, _channels) =
            ChatClient::new(FakeApi::default(), ClientConfig::default(), UserId::new());
        assert!(matches!(
            client.send(Some("x".into()), None).await,
            Err(ClientError::NoOpenConversation)
        ));
    }

    #[tokio::test]
    async fn test_call_to_offline_user_records_missed() {
        let me = UserId::new();
        let bob = UserId::new();
        let api = FakeApi {
            me,
            ..FakeApi::default()
        };
        let (client, mut channels) = ChatClient::new(api, ClientConfig::default(), me);
        client.place_call(bob, json!({"sdp": "o"})).await.unwrap();
        assert!(matches!(
            channels.outbound.recv().await,
            Some(ClientEvent::CallUser { receiver_id, .. }) if receiver_id == bob
        ));

        client
            .handle_event(ServerEvent::CallFailed {
                reason: "receiver-offline".into(),
            })
            .await;
        assert_eq!(client.call_phase().await, CallPhase::Ended);
        assert_eq!(
            channels.notices.recv().await,
            Some(ClientNotice::CallFailed {
                reason: "receiver-offline".into()
            })
        );
        let recorded = client.api.recorded_calls.lock().unwrap().clone();
        assert_eq!(recorded.len(), 1);
        assert_eq!(recorded[0].outcome, CallOutcome::Missed);
    }

    #[tokio::test]
    async fn test_call_payloads_reach_the_app() {
        let alice = UserId::new();
        let bob = UserId::new();

        // Callee side: caller name and offer arrive as a notice and stay on
        // the session.
        let (callee, mut callee_channels) =
            ChatClient::new(FakeApi::default(), ClientConfig::default(), bob);
        callee
            .handle_event(ServerEvent::IncomingCall {
                caller_id: alice,
                caller_name: "Alice".into(),
                offer: json!({"sdp": "OFFER"}),
            })
            .await;
        assert_eq!(
            callee_channels.notices.try_recv().ok(),
            Some(ClientNotice::IncomingCall {
                caller_id: alice,
                caller_name: "Alice".into(),
                offer: json!({"sdp": "OFFER"}),
            })
        );
        let session = callee.call_session().await;
        assert_eq!(session.peer(), Some(alice));
        assert_eq!(session.peer_name(), Some("Alice"));
        assert_eq!(session.remote_offer(), Some(&json!({"sdp": "OFFER"})));

        // Caller side: the answer arrives as a notice and stays on the
        // session.
        let (caller, mut caller_channels) =
            ChatClient::new(FakeApi::default(), ClientConfig::default(), alice);
        caller.place_call(bob, json!({"sdp": "OFFER"})).await.unwrap();
        caller
            .handle_event(ServerEvent::CallAccepted {
                answer: json!({"sdp": "ANSWER"}),
            })
            .await;
        assert_eq!(
            caller_channels.notices.try_recv().ok(),
            Some(ClientNotice::CallAccepted {
                answer: json!({"sdp": "ANSWER"})
            })
        );
        assert_eq!(caller.call_phase().await, CallPhase::Connecting);
        assert_eq!(
            caller.call_session().await.remote_answer(),
            Some(&json!({"sdp": "ANSWER"}))
        );

        // An answer with no ringing call is not surfaced.
        caller
            .handle_event(ServerEvent::CallAccepted {
                answer: json!({"sdp": "LATE"}),
            })
            .await;
        assert!(caller_channels.notices.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_declined_call_ends_on_both_sides() {
        let alice = UserId::new();
        let bob = UserId::new();

        let api = FakeApi {
            me: alice,
            ..FakeApi::default()
        };
        let (caller, _caller_channels) = ChatClient::new(api, ClientConfig::default(), alice);
        caller.place_call(bob, json!({})).await.unwrap();
        caller.handle_event(ServerEvent::CallRejected).await;
        assert_eq!(caller.call_phase().await, CallPhase::Ended);
        assert!(caller.call_session().await.was_declined());
        let recorded = caller.api.recorded_calls.lock().unwrap().clone();
        assert_eq!(recorded.len(), 1);
        assert_eq!(recorded[0].outcome, CallOutcome::Declined);

        let (callee, mut callee_channels) =
            ChatClient::new(FakeApi::default(), ClientConfig::default(), bob);
        callee
            .handle_event(ServerEvent::IncomingCall {
                caller_id: alice,
                caller_name: "Alice".into(),
                offer: json!({}),
            })
            .await;
        callee.reject_call().await.unwrap();
        assert_eq!(
            callee_channels.outbound.recv().await,
            Some(ClientEvent::RejectCall { caller_id: alice })
        );
        assert_eq!(callee.call_phase().await, CallPhase::Ended);
        assert!(callee.api.recorded_calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_call_history_comes_from_the_api() {
        let me = UserId::new();
        let bob = User::new("Bob");
        let log = NewCallLog {
            caller_id: me,
            receiver_id: bob.id,
            duration_seconds: 30,
            outcome: CallOutcome::Completed,
        }
        .into_call_log(CallLogId::new(), Utc::now());
        let api = FakeApi {
            me,
            call_log: vec![CallLogView {
                entry: CallLogEntry::for_viewer(log, me).unwrap(),
                contact: Some(bob.clone()),
            }],
            ..FakeApi::default()
        };
        let (client, _channels) = ChatClient::new(api, ClientConfig::default(), me);

        let history = client.call_history().await.unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].entry.direction, CallDirection::Outgoing);
        assert_eq!(history[0].entry.log.duration_seconds, 30);
        assert_eq!(history[0].contact.as_ref().map(|u| u.id), Some(bob.id));
    }

    #[tokio::test]
    async fn test_ping_is_left_to_the_transport() {
        let (client, mut channels) =
            ChatClient::new(FakeApi::default(), ClientConfig::default(), UserId::new());
        client
            .handle_event(ServerEvent::Ping { timestamp: 42 })
            .await;
        assert!(channels.outbound.try_recv().is_err());
        assert!(channels.notices.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_busy_callee_declines_second_call() {
        let me = UserId::new();
        let (client, mut channels) = ChatClient::new(FakeApi::default(), ClientConfig::default(), me);
        let first = UserId::new();
        let second = UserId::new();

        client
            .handle_event(ServerEvent::IncomingCall {
                caller_id: first,
                caller_name: "First".into(),
                offer: json!({}),
            })
            .await;
        client
            .handle_event(ServerEvent::IncomingCall {
                caller_id: second,
                caller_name: "Second".into(),
                offer: json!({}),
            })
            .await;

        assert_eq!(client.call_phase().await, CallPhase::Ringing);
        assert_eq!(
            channels.outbound.recv().await,
            Some(ClientEvent::RejectCall { caller_id: second })
        );
        assert!(client.api.recorded_calls.lock().unwrap().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_typing_flags_and_presence() {
        let me = UserId::new();
        let alice = UserId::new();
        let (client, _channels) = ChatClient::new(FakeApi::default(), ClientConfig::default(), me);

        client
            .handle_event(ServerEvent::GetOnlineUsers(vec![alice]))
            .await;
        client
            .handle_event(ServerEvent::UserTyping {
                user_id: alice,
                is_typing: true,
            })
            .await;
        assert!(client.view(|s| s.is_online(alice)).await);
        assert!(client.is_typing(alice).await);

        assert_eq!(client.typing_users().await, vec![alice]);

        tokio::time::sleep(Duration::from_secs(3)).await;
        assert!(!client.is_typing(alice).await);
        assert!(client.typing_users().await.is_empty());

        client.relay_disconnected().await;
        assert!(!client.view(|s| s.is_online(alice)).await);
    }

    #[tokio::test(start_paused = true)]
    async fn test_local_typing_emits_true_then_false() {
        let me = UserId::new();
        let alice = UserId::new();
        let (client, mut channels) = ChatClient::new(FakeApi::default(), ClientConfig::default(), me);
        client.open(alice).await.unwrap();

        client.keystroke().await;
        client.keystroke().await;
        assert_eq!(
            channels.outbound.recv().await,
            Some(ClientEvent::Typing {
                receiver_id: alice,
                is_typing: true
            })
        );

        tokio::time::sleep(Duration::from_millis(2100)).await;
        assert_eq!(
            channels.outbound.recv().await,
            Some(ClientEvent::Typing {
                receiver_id: alice,
                is_typing: false
            })
        );
        assert!(channels.outbound.try_recv().is_err());
    }
}
