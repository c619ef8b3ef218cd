//! Chat handshake: proposal, acceptance and per-chat key rotation.
//!
//! ```text
//!   propose_chat ──► Proposed (initiator) ──ChatAccepted──► Accepted
//!   ChatProposed ──► AwaitingAcceptance (receiver) ──accept_chat──► Accepted
//! ```
//!
//! The inbound transitions are applied by [`reconcile`](crate::reconcile).

use sigilix_shared::crypto;
use sigilix_shared::protocol::{
    InitChatFromInitializerRequest, InitChatFromReceiverRequest, UpdateChatRsaKeyRequest,
};
use sigilix_shared::types::{ChatId, ChatRole, MessageId, UserId};
use sigilix_store::{Chat, ChatStore};

use crate::api::SigilixApi;
use crate::error::{ClientError, Result};
use crate::session::{default_chat_title, Session};

impl<A: SigilixApi, S: ChatStore> Session<A, S> {
    /// Propose a chat to `target`. The chat starts unaccepted and without
    /// peer keys; both arrive with the peer's acceptance.
    pub async fn propose_chat(&mut self, target: UserId) -> Result<Chat> {
        let resp = self
            .api
            .init_chat_from_initializer(&InitChatFromInitializerRequest {
                target_user_id: target,
            })
            .await?;

        let chat = Chat {
            chat_id: resp.chat_id,
            other_user_id: target,
            last_message_id: MessageId::default(),
            role: ChatRole::Initiator,
            accepted: false,
            other_user_rsa_public: None,
            other_user_ecdsa_public: None,
            my_rsa_private: self.identity.encryption_private_key_der()?,
            title: default_chat_title(target),
        };
        self.store.insert_chat(&chat)?;

        tracing::info!(chat_id = %chat.chat_id, %target, "chat proposed");
        Ok(chat)
    }

    /// Accept a chat a peer proposed to us.
    ///
    /// The local chat must exist and be a receiver chat; both are checked
    /// before anything is sent.
    pub async fn accept_chat(&mut self, chat_id: ChatId) -> Result<Chat> {
        let mut chat = self.require_chat(chat_id)?;
        if chat.role != ChatRole::Receiver {
            return Err(ClientError::WrongRole(chat_id));
        }

        self.api
            .init_chat_from_receiver(&InitChatFromReceiverRequest { chat_id })
            .await?;

        chat.accepted = true;
        self.store.update_chat(&chat)?;

        tracing::info!(%chat_id, peer = %chat.other_user_id, "chat accepted");
        Ok(chat)
    }

    /// Replace our RSA key for one chat. The new public half is published
    /// first; the private half is stored only once the server took it.
    pub async fn rotate_chat_key(&mut self, chat_id: ChatId) -> Result<Chat> {
        let mut chat = self.require_chat(chat_id)?;

        let key = crypto::generate_encryption_key()?;
        let public_der = crypto::encryption_public_key_to_der(&key.to_public_key())?;

        self.api
            .update_chat_rsa_key(&UpdateChatRsaKeyRequest {
                chat_id,
                rsa_public_key: public_der.into(),
            })
            .await?;

        chat.my_rsa_private = crypto::encryption_private_key_to_der(&key)?;
        self.store.update_chat(&chat)?;

        tracing::info!(%chat_id, "chat key rotated");
        Ok(chat)
    }

    /// Propose a chat to a user given either a decimal user id or a username.
    pub async fn request_chat(&mut self, user_id_or_username: &str) -> Result<Chat> {
        let target = match user_id_or_username.parse::<UserId>() {
            Ok(id) => id,
            Err(_) => self
                .search_by_username(user_id_or_username)
                .await?
                .ok_or_else(|| ClientError::UserNotFound(user_id_or_username.to_string()))?,
        };
        self.propose_chat(target).await
    }

    pub fn rename_chat(&mut self, chat_id: ChatId, title: &str) -> Result<Chat> {
        let mut chat = self.require_chat(chat_id)?;
        chat.title = title.to_string();
        self.store.update_chat(&chat)?;
        Ok(chat)
    }

    /// Delete a chat and its messages locally. The server is not told.
    pub fn delete_chat(&mut self, chat_id: ChatId) -> Result<()> {
        if !self.store.delete_chat(chat_id)? {
            return Err(ClientError::ChatNotFound(chat_id));
        }
        tracing::info!(%chat_id, "chat deleted");
        Ok(())
    }
}
