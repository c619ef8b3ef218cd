//! Notification reconciliation.
//!
//! A pull fetches one batch, decodes all of it up front, then applies each
//! notification on its own: a failure is logged and skipped, and the rest of
//! the batch still lands.

use sigilix_shared::crypto;
use sigilix_shared::protocol::{
    GetNotificationsRequest, IncomingNotification, InitChatFromInitializerNotification,
    InitChatFromReceiverNotification, Notification, PublicUserInfo, SendMessageNotification,
    UpdateChatRsaKeyNotification,
};
use sigilix_shared::types::{ChatRole, MessageId};
use sigilix_store::{Chat, ChatStore, Message};

use crate::api::SigilixApi;
use crate::error::{ClientError, Result};
use crate::events::{ChatSummary, ClientEvent};
use crate::messaging::raise_last_message_id;
use crate::session::{default_chat_title, Session};

impl<A: SigilixApi, S: ChatStore> Session<A, S> {
    /// Fetch pending notifications and fold them into local state.
    ///
    /// Fails as a whole only when the fetch fails or an envelope cannot be
    /// decoded; in both cases nothing has been applied.
    pub async fn pull_notifications(&mut self) -> Result<Vec<ClientEvent>> {
        let resp = self
            .api
            .get_notifications(&GetNotificationsRequest {
                limit: self.notification_limit,
            })
            .await?;

        let batch = resp
            .notifications
            .into_iter()
            .map(IncomingNotification::decode)
            .collect::<std::result::Result<Vec<_>, _>>()?;

        tracing::debug!(count = batch.len(), "applying notifications");

        let mut events = Vec::with_capacity(batch.len());
        for incoming in &batch {
            let notification = &incoming.notification;
            match self.apply_notification(notification) {
                Ok(Some(event)) => events.push(event),
                Ok(None) => {}
                Err(e) => {
                    tracing::warn!(
                        kind = %notification.kind(),
                        chat_id = %notification.chat_id(),
                        error = %e,
                        "skipping notification"
                    );
                }
            }
        }
        Ok(events)
    }

    /// Apply one decoded notification.
    pub fn apply_notification(&mut self, notification: &Notification) -> Result<Option<ClientEvent>> {
        match notification {
            Notification::ChatProposed(n) => self.on_chat_proposed(n),
            Notification::ChatAccepted(n) => self.on_chat_accepted(n),
            Notification::PeerKeyRotated(n) => self.on_peer_key_rotated(n).map(|()| None),
            Notification::MessageDelivered(n) => self.on_message_delivered(n),
            Notification::FileDelivered(n) => {
                tracing::debug!(
                    chat_id = %n.chat_id,
                    message_id = %n.message_id,
                    "file notification ignored"
                );
                Ok(None)
            }
        }
    }

    fn on_chat_proposed(
        &mut self,
        n: &InitChatFromInitializerNotification,
    ) -> Result<Option<ClientEvent>> {
        if self.store.get_chat(n.chat_id)?.is_some() {
            tracing::debug!(chat_id = %n.chat_id, "chat already known, proposal ignored");
            return Ok(None);
        }

        let info = &n.initializer_user_info;
        validate_peer_keys(info)?;

        let chat = Chat {
            chat_id: n.chat_id,
            other_user_id: info.user_id,
            last_message_id: MessageId::default(),
            role: ChatRole::Receiver,
            accepted: false,
            other_user_rsa_public: Some(info.initial_rsa_public_key.to_vec()),
            other_user_ecdsa_public: Some(info.ecdsa_public_key.to_vec()),
            my_rsa_private: self.identity.encryption_private_key_der()?,
            title: default_chat_title(info.user_id),
        };
        self.store.insert_chat(&chat)?;

        tracing::info!(chat_id = %chat.chat_id, peer = %chat.other_user_id, "incoming chat");
        Ok(Some(ClientEvent::ChatProposedByPeer {
            chat: ChatSummary::from(&chat),
        }))
    }

    fn on_chat_accepted(
        &mut self,
        n: &InitChatFromReceiverNotification,
    ) -> Result<Option<ClientEvent>> {
        let stored = self.require_chat(n.chat_id)?;
        if stored.role != ChatRole::Initiator {
            return Err(ClientError::WrongRole(n.chat_id));
        }

        let info = &n.receiver_user_info;
        validate_peer_keys(info)?;

        let mut chat = stored.clone();
        chat.accepted = true;
        chat.other_user_rsa_public = Some(info.initial_rsa_public_key.to_vec());
        chat.other_user_ecdsa_public = Some(info.ecdsa_public_key.to_vec());

        if chat == stored {
            return Ok(None);
        }
        self.store.update_chat(&chat)?;

        tracing::info!(chat_id = %chat.chat_id, peer = %chat.other_user_id, "chat accepted by peer");
        Ok(Some(ClientEvent::ChatWasAccepted {
            chat: ChatSummary::from(&chat),
        }))
    }

    fn on_peer_key_rotated(&mut self, n: &UpdateChatRsaKeyNotification) -> Result<()> {
        let mut chat = self.require_chat(n.chat_id)?;
        if n.user_id != chat.other_user_id {
            return Err(ClientError::NotChatPeer {
                chat_id: n.chat_id,
                user_id: n.user_id,
            });
        }

        crypto::encryption_public_key_from_der(&n.rsa_public_key)?;
        chat.other_user_rsa_public = Some(n.rsa_public_key.to_vec());
        self.store.update_chat(&chat)?;

        tracing::debug!(chat_id = %n.chat_id, "peer key rotated");
        Ok(())
    }

    fn on_message_delivered(
        &mut self,
        n: &SendMessageNotification,
    ) -> Result<Option<ClientEvent>> {
        let mut chat = self.require_chat(n.chat_id)?;
        if !chat.accepted {
            return Err(ClientError::ChatNotAccepted(n.chat_id));
        }
        if n.sender_user_id != chat.other_user_id {
            return Err(ClientError::NotChatPeer {
                chat_id: n.chat_id,
                user_id: n.sender_user_id,
            });
        }
        if self.store.get_message(n.chat_id, n.message_id)?.is_some() {
            tracing::debug!(chat_id = %n.chat_id, message_id = %n.message_id, "duplicate message");
            return Ok(None);
        }

        let peer_key = chat
            .other_user_ecdsa_public_key()?
            .ok_or(ClientError::MissingPeerKey(n.chat_id))?;
        let my_key = chat.my_rsa_private_key()?;

        let plaintext = crypto::decrypt_chunked(&my_key, &n.encrypted_message)?;
        if !crypto::verify(&peer_key, &plaintext, &n.message_ecdsa_signature)? {
            return Err(ClientError::SignatureMismatch);
        }
        let content = String::from_utf8(plaintext)?;

        let message = Message {
            message_id: n.message_id,
            chat_id: n.chat_id,
            sender_id: n.sender_user_id,
            content,
        };
        self.store.insert_message(&message)?;
        // Already stored, so a redelivery is a no-op: the event goes out now or never.
        if let Err(e) = raise_last_message_id(&mut self.store, &mut chat, message.message_id) {
            tracing::warn!(
                chat_id = %n.chat_id,
                message_id = %n.message_id,
                error = %e,
                "could not advance last message id"
            );
        }

        Ok(Some(ClientEvent::NewMessage {
            chat_id: n.chat_id,
            message,
        }))
    }
}

/// Both advertised keys must parse before they are stored.
fn validate_peer_keys(info: &PublicUserInfo) -> Result<()> {
    crypto::signing_public_key_from_bytes(&info.ecdsa_public_key)?;
    crypto::encryption_public_key_from_der(&info.initial_rsa_public_key)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use sigilix_shared::crypto::RsaPublicKey;
    use sigilix_shared::protocol::{RawNotification, SendFileNotification};
    use sigilix_shared::types::{Base64Bytes, ChatId, UserId};
    use sigilix_store::{MemoryStore, StoreError};

    use super::*;
    use crate::loopback::LoopbackServer;
    use crate::testing::{accepted_pair, join, TestSession};

    /// Drain a session's inbox without applying anything.
    async fn take_raw(session: &TestSession) -> Vec<RawNotification> {
        session
            .api()
            .get_notifications(&GetNotificationsRequest { limit: 100 })
            .await
            .unwrap()
            .notifications
    }

    fn raw(notification: Notification) -> RawNotification {
        IncomingNotification::new(notification).encode().unwrap()
    }

    /// The public half of `session`'s own key for `chat_id`.
    fn chat_key(session: &TestSession, chat_id: ChatId) -> RsaPublicKey {
        session
            .chat(chat_id)
            .unwrap()
            .unwrap()
            .my_rsa_private_key()
            .unwrap()
            .to_public_key()
    }

    /// A message from `sender`, encrypted to `recipient_key` and signed over `plaintext`.
    fn sealed_message(
        sender: &TestSession,
        chat_id: ChatId,
        message_id: u64,
        plaintext: &[u8],
        recipient_key: &RsaPublicKey,
    ) -> SendMessageNotification {
        SendMessageNotification {
            chat_id,
            message_id: MessageId(message_id),
            sender_user_id: sender.user_id(),
            encrypted_message: crypto::encrypt_chunked(recipient_key, plaintext)
                .unwrap()
                .into(),
            message_ecdsa_signature: sender.identity().sign(plaintext).unwrap().to_vec().into(),
        }
    }

    fn contents(session: &TestSession, chat_id: ChatId) -> Vec<String> {
        session
            .chat_messages(chat_id)
            .unwrap()
            .into_iter()
            .map(|m| m.content)
            .collect()
    }

    /// Pull once and expect exactly the real "hello" to have landed.
    async fn expect_only_hello(bob: &mut TestSession, chat_id: ChatId) {
        let events = bob.pull_notifications().await.unwrap();
        assert!(matches!(
            &events[..],
            [ClientEvent::NewMessage { message, .. }] if message.content == "hello"
        ));
        assert_eq!(contents(bob, chat_id), ["hello"]);
        assert_eq!(
            bob.chat(chat_id).unwrap().unwrap().last_message_id,
            MessageId(1)
        );
    }

    /// Chat updates always fail; everything else goes to the inner store.
    struct FrozenChats(MemoryStore);

    impl ChatStore for FrozenChats {
        fn insert_chat(&mut self, chat: &Chat) -> sigilix_store::Result<()> {
            self.0.insert_chat(chat)
        }

        fn get_chat(&self, chat_id: ChatId) -> sigilix_store::Result<Option<Chat>> {
            self.0.get_chat(chat_id)
        }

        fn update_chat(&mut self, _chat: &Chat) -> sigilix_store::Result<()> {
            Err(StoreError::Io(std::io::ErrorKind::PermissionDenied.into()))
        }

        fn delete_chat(&mut self, chat_id: ChatId) -> sigilix_store::Result<bool> {
            self.0.delete_chat(chat_id)
        }

        fn list_chats(&self) -> sigilix_store::Result<Vec<Chat>> {
            self.0.list_chats()
        }

        fn insert_message(&mut self, message: &Message) -> sigilix_store::Result<bool> {
            self.0.insert_message(message)
        }

        fn get_message(
            &self,
            chat_id: ChatId,
            message_id: MessageId,
        ) -> sigilix_store::Result<Option<Message>> {
            self.0.get_message(chat_id, message_id)
        }

        fn list_messages(&self, chat_id: ChatId) -> sigilix_store::Result<Vec<Message>> {
            self.0.list_messages(chat_id)
        }

        fn update_message(&mut self, message: &Message) -> sigilix_store::Result<()> {
            self.0.update_message(message)
        }
    }

    #[tokio::test]
    async fn test_handshake_events() {
        let server = LoopbackServer::new();
        let mut alice = join(&server).await;
        let mut bob = join(&server).await;

        let proposed = alice.propose_chat(bob.user_id()).await.unwrap();

        let events = bob.pull_notifications().await.unwrap();
        assert_eq!(events.len(), 1);
        let ClientEvent::ChatProposedByPeer { chat } = &events[0] else {
            panic!("unexpected event {:?}", events[0]);
        };
        assert_eq!(chat.chat_id, proposed.chat_id);
        assert_eq!(chat.other_user_id, alice.user_id());
        assert!(!chat.am_i_initiator);
        assert!(!chat.accepted);

        let stored = bob.chat(proposed.chat_id).unwrap().unwrap();
        assert_eq!(stored.role, ChatRole::Receiver);
        assert!(stored.has_peer_keys());

        bob.accept_chat(proposed.chat_id).await.unwrap();
        let events = alice.pull_notifications().await.unwrap();
        assert!(matches!(
            &events[..],
            [ClientEvent::ChatWasAccepted { chat }] if chat.accepted && chat.am_i_initiator
        ));
    }

    #[tokio::test]
    async fn test_duplicate_proposal_is_ignored() {
        let server = LoopbackServer::new();
        let mut alice = join(&server).await;
        let mut bob = join(&server).await;

        alice.propose_chat(bob.user_id()).await.unwrap();
        let proposal = take_raw(&bob).await.remove(0);
        server.push_raw(bob.user_id(), proposal.clone()).await;
        server.push_raw(bob.user_id(), proposal).await;

        let events = bob.pull_notifications().await.unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(bob.chats().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_repeated_acceptance_emits_once() {
        let server = LoopbackServer::new();
        let mut alice = join(&server).await;
        let mut bob = join(&server).await;

        let chat = alice.propose_chat(bob.user_id()).await.unwrap();
        bob.pull_notifications().await.unwrap();
        bob.accept_chat(chat.chat_id).await.unwrap();

        let acceptance = take_raw(&alice).await.remove(0);
        server.push_raw(alice.user_id(), acceptance.clone()).await;
        server.push_raw(alice.user_id(), acceptance).await;

        let events = alice.pull_notifications().await.unwrap();
        assert_eq!(events.len(), 1);
        assert!(alice.chat(chat.chat_id).unwrap().unwrap().accepted);
    }

    #[tokio::test]
    async fn test_unknown_type_aborts_whole_batch() {
        let server = LoopbackServer::new();
        let mut alice = join(&server).await;
        let mut bob = join(&server).await;

        alice.propose_chat(bob.user_id()).await.unwrap();
        server
            .push_raw(
                bob.user_id(),
                RawNotification {
                    kind: "DeleteEverything".into(),
                    notification: serde_json::json!({}),
                    ecdsa_signature: None,
                },
            )
            .await;

        let err = bob.pull_notifications().await.unwrap_err();
        assert!(matches!(err, ClientError::Protocol(_)));
        assert!(bob.chats().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_bad_signature_is_isolated() {
        let (server, mut alice, mut bob) = accepted_pair().await;
        let chat_id = alice.chats().unwrap()[0].chat_id;

        for text in ["one", "two", "three"] {
            alice.send_message(chat_id, text).await.unwrap();
        }

        let mut batch = take_raw(&bob).await;
        let mut second = IncomingNotification::decode(batch[1].clone()).unwrap();
        let Notification::MessageDelivered(n) = &mut second.notification else {
            panic!("expected a message");
        };
        n.message_ecdsa_signature.0[10] ^= 0x01;
        batch[1] = second.encode().unwrap();
        for raw in batch {
            server.push_raw(bob.user_id(), raw).await;
        }

        let events = bob.pull_notifications().await.unwrap();
        assert_eq!(events.len(), 2);

        let contents: Vec<_> = bob
            .chat_messages(chat_id)
            .unwrap()
            .into_iter()
            .map(|m| m.content)
            .collect();
        assert_eq!(contents, ["one", "three"]);
        assert_eq!(
            bob.chat(chat_id).unwrap().unwrap().last_message_id,
            MessageId(3)
        );
    }

    #[tokio::test]
    async fn test_redelivered_message_is_stored_once() {
        let (server, mut alice, mut bob) = accepted_pair().await;
        let chat_id = alice.chats().unwrap()[0].chat_id;
        alice.send_message(chat_id, "hello").await.unwrap();

        let message = take_raw(&bob).await.remove(0);
        server.push_raw(bob.user_id(), message.clone()).await;
        server.push_raw(bob.user_id(), message.clone()).await;

        let events = bob.pull_notifications().await.unwrap();
        assert!(matches!(
            &events[..],
            [ClientEvent::NewMessage { message, .. }] if message.content == "hello"
        ));

        server.push_raw(bob.user_id(), message).await;
        assert!(bob.pull_notifications().await.unwrap().is_empty());
        assert_eq!(bob.chat_messages(chat_id).unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_message_for_unaccepted_chat_is_skipped() {
        let server = LoopbackServer::new();
        let mut alice = join(&server).await;
        let mut bob = join(&server).await;

        let chat = alice.propose_chat(bob.user_id()).await.unwrap();
        bob.pull_notifications().await.unwrap();

        let text = b"sneaky";
        let forged = SendMessageNotification {
            chat_id: chat.chat_id,
            message_id: MessageId(1),
            sender_user_id: alice.user_id(),
            encrypted_message: crypto::encrypt_chunked(
                &bob.identity().encryption_public_key(),
                text,
            )
            .unwrap()
            .into(),
            message_ecdsa_signature: alice.identity().sign(text).unwrap().to_vec().into(),
        };
        server
            .push_raw(bob.user_id(), raw(Notification::MessageDelivered(forged)))
            .await;

        assert!(bob.pull_notifications().await.unwrap().is_empty());
        assert!(bob.chat_messages(chat.chat_id).unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_key_rotation_from_stranger_is_rejected() {
        let (server, alice, mut bob) = accepted_pair().await;
        let chat_id = bob.chats().unwrap()[0].chat_id;
        let before = bob.chat(chat_id).unwrap().unwrap();

        let stranger_key = crypto::encryption_public_key_to_der(
            &crypto::generate_encryption_key().unwrap().to_public_key(),
        )
        .unwrap();
        server
            .push_raw(
                bob.user_id(),
                raw(Notification::PeerKeyRotated(UpdateChatRsaKeyNotification {
                    chat_id,
                    user_id: UserId(alice.user_id().0 ^ 1),
                    rsa_public_key: stranger_key.into(),
                })),
            )
            .await;

        assert!(bob.pull_notifications().await.unwrap().is_empty());
        assert_eq!(bob.chat(chat_id).unwrap().unwrap(), before);
    }

    #[tokio::test]
    async fn test_file_notification_is_acknowledged_only() {
        let (server, alice, mut bob) = accepted_pair().await;
        let chat_id = bob.chats().unwrap()[0].chat_id;

        server
            .push_raw(
                bob.user_id(),
                raw(Notification::FileDelivered(SendFileNotification {
                    chat_id,
                    message_id: MessageId(1),
                    sender_user_id: alice.user_id(),
                    encrypted_file: Base64Bytes(vec![1, 2, 3]),
                    encrypted_mime_type: Base64Bytes(vec![4]),
                    file_ecdsa_signature: Base64Bytes(vec![0; 64]),
                })),
            )
            .await;

        assert!(bob.pull_notifications().await.unwrap().is_empty());
        assert!(bob.chat_messages(chat_id).unwrap().is_empty());
        assert_eq!(server.pending(bob.user_id()).await, 0);
    }

    #[tokio::test]
    async fn test_notification_for_unknown_chat_is_skipped() {
        let server = LoopbackServer::new();
        let alice = join(&server).await;
        let mut bob = join(&server).await;

        server
            .push_raw(
                bob.user_id(),
                raw(Notification::ChatAccepted(InitChatFromReceiverNotification {
                    chat_id: ChatId(77),
                    receiver_user_info: PublicUserInfo {
                        user_id: alice.user_id(),
                        ecdsa_public_key: alice.identity().signing_public_key_bytes().into(),
                        username: String::new(),
                        initial_rsa_public_key: alice
                            .identity()
                            .encryption_public_key_der()
                            .unwrap()
                            .into(),
                    },
                })),
            )
            .await;

        assert!(bob.pull_notifications().await.unwrap().is_empty());
        assert!(bob.chats().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_batch_limit_is_respected() {
        let (server, mut alice, bob) = accepted_pair().await;
        let chat_id = alice.chats().unwrap()[0].chat_id;
        let mut bob = bob.with_notification_limit(2);

        for text in ["a", "b", "c"] {
            alice.send_message(chat_id, text).await.unwrap();
        }

        assert_eq!(bob.pull_notifications().await.unwrap().len(), 2);
        assert_eq!(server.pending(bob.user_id()).await, 1);
        assert_eq!(bob.pull_notifications().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_undecryptable_messages_are_isolated() {
        let (server, mut alice, mut bob) = accepted_pair().await;
        let chat_id = alice.chats().unwrap()[0].chat_id;

        // Encrypted to the sender's own key.
        let own_key = chat_key(&alice, chat_id);
        let misdirected = sealed_message(&alice, chat_id, 50, b"misdirected", &own_key);
        // Not a whole number of RSA blocks.
        let bob_key = chat_key(&bob, chat_id);
        let mut truncated = sealed_message(&alice, chat_id, 51, b"truncated", &bob_key);
        truncated.encrypted_message.0.truncate(100);

        for n in [misdirected, truncated] {
            server
                .push_raw(bob.user_id(), raw(Notification::MessageDelivered(n)))
                .await;
        }
        alice.send_message(chat_id, "hello").await.unwrap();

        expect_only_hello(&mut bob, chat_id).await;
    }

    #[tokio::test]
    async fn test_message_from_non_peer_is_isolated() {
        let (server, mut alice, mut bob) = accepted_pair().await;
        let chat_id = alice.chats().unwrap()[0].chat_id;

        let bob_key = chat_key(&bob, chat_id);
        let mut spoofed = sealed_message(&alice, chat_id, 50, b"spoofed", &bob_key);
        spoofed.sender_user_id = UserId(alice.user_id().0 ^ 1);
        server
            .push_raw(bob.user_id(), raw(Notification::MessageDelivered(spoofed)))
            .await;
        alice.send_message(chat_id, "hello").await.unwrap();

        expect_only_hello(&mut bob, chat_id).await;
    }

    #[tokio::test]
    async fn test_non_utf8_message_is_isolated() {
        let (server, mut alice, mut bob) = accepted_pair().await;
        let chat_id = alice.chats().unwrap()[0].chat_id;

        let bob_key = chat_key(&bob, chat_id);
        let binary = sealed_message(&alice, chat_id, 50, &[0xff, 0xfe, 0xfd], &bob_key);
        server
            .push_raw(bob.user_id(), raw(Notification::MessageDelivered(binary)))
            .await;
        alice.send_message(chat_id, "hello").await.unwrap();

        expect_only_hello(&mut bob, chat_id).await;
    }

    #[tokio::test]
    async fn test_acceptance_for_receiver_chat_is_isolated() {
        let (server, mut alice, mut bob) = accepted_pair().await;
        let chat_id = alice.chats().unwrap()[0].chat_id;
        let before = bob.chat(chat_id).unwrap().unwrap();
        assert_eq!(before.role, ChatRole::Receiver);

        let other_key = crypto::encryption_public_key_to_der(
            &crypto::generate_encryption_key().unwrap().to_public_key(),
        )
        .unwrap();
        server
            .push_raw(
                bob.user_id(),
                raw(Notification::ChatAccepted(InitChatFromReceiverNotification {
                    chat_id,
                    receiver_user_info: PublicUserInfo {
                        user_id: alice.user_id(),
                        ecdsa_public_key: alice.identity().signing_public_key_bytes().into(),
                        username: String::new(),
                        initial_rsa_public_key: other_key.into(),
                    },
                })),
            )
            .await;
        alice.send_message(chat_id, "hello").await.unwrap();

        expect_only_hello(&mut bob, chat_id).await;
        let after = bob.chat(chat_id).unwrap().unwrap();
        assert_eq!(after.other_user_rsa_public, before.other_user_rsa_public);
        assert_eq!(after.role, ChatRole::Receiver);
    }

    #[tokio::test]
    async fn test_proposal_with_unparsable_keys_is_isolated() {
        let server = LoopbackServer::new();
        let mut alice = join(&server).await;
        let mut bob = join(&server).await;

        let info = PublicUserInfo {
            user_id: alice.user_id(),
            ecdsa_public_key: alice.identity().signing_public_key_bytes().into(),
            username: String::new(),
            initial_rsa_public_key: alice.identity().encryption_public_key_der().unwrap().into(),
        };
        let mut bad_rsa = info.clone();
        bad_rsa.initial_rsa_public_key = Base64Bytes(vec![1, 2, 3]);
        let mut bad_ecdsa = info;
        bad_ecdsa.ecdsa_public_key = Base64Bytes(vec![4; 65]);

        for (id, initializer_user_info) in [(900, bad_rsa), (901, bad_ecdsa)] {
            server
                .push_raw(
                    bob.user_id(),
                    raw(Notification::ChatProposed(InitChatFromInitializerNotification {
                        chat_id: ChatId(id),
                        initializer_user_info,
                    })),
                )
                .await;
        }
        let proposed = alice.propose_chat(bob.user_id()).await.unwrap();

        let events = bob.pull_notifications().await.unwrap();
        assert!(matches!(
            &events[..],
            [ClientEvent::ChatProposedByPeer { chat }] if chat.chat_id == proposed.chat_id
        ));
        let chats = bob.chats().unwrap();
        assert_eq!(chats.len(), 1);
        assert_eq!(chats[0].chat_id, proposed.chat_id);
    }

    #[tokio::test]
    async fn test_message_event_survives_failed_chat_update() {
        let (_server, mut alice, bob) = accepted_pair().await;
        let chat_id = alice.chats().unwrap()[0].chat_id;
        let mut bob = Session::new(bob.identity, bob.profile, bob.api, FrozenChats(bob.store));

        alice.send_message(chat_id, "hello").await.unwrap();

        let events = bob.pull_notifications().await.unwrap();
        assert!(matches!(
            &events[..],
            [ClientEvent::NewMessage { message, .. }] if message.content == "hello"
        ));
        assert_eq!(bob.store().0.message_count(), 1);
        assert_eq!(
            bob.chat(chat_id).unwrap().unwrap().last_message_id,
            MessageId(0)
        );
    }
}
