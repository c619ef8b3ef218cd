//! Outgoing messages and local chat/message queries.

use sigilix_shared::crypto;
use sigilix_shared::protocol::SendMessageRequest;
use sigilix_shared::types::{ChatId, MessageId};
use sigilix_store::{Chat, ChatStore, Message};

use crate::api::SigilixApi;
use crate::error::{ClientError, Result};
use crate::session::Session;

impl<A: SigilixApi, S: ChatStore> Session<A, S> {
    /// Sign, encrypt and send `text`, then store it under the server-assigned id.
    pub async fn send_message(&mut self, chat_id: ChatId, text: &str) -> Result<Message> {
        let mut chat = self.require_chat(chat_id)?;
        if !chat.accepted {
            return Err(ClientError::ChatNotAccepted(chat_id));
        }
        let peer_key = chat
            .other_user_rsa_public_key()?
            .ok_or(ClientError::MissingPeerKey(chat_id))?;

        let signature = self.identity.sign(text.as_bytes())?;
        let encrypted = crypto::encrypt_chunked(&peer_key, text.as_bytes())?;

        let resp = self
            .api
            .send_message(&SendMessageRequest {
                chat_id,
                encrypted_message: encrypted.into(),
                message_ecdsa_signature: signature.to_vec().into(),
            })
            .await?;

        let message = Message {
            message_id: resp.message_id,
            chat_id,
            sender_id: self.user_id(),
            content: text.to_string(),
        };
        self.store.insert_message(&message)?;
        raise_last_message_id(&mut self.store, &mut chat, message.message_id)?;

        tracing::debug!(%chat_id, message_id = %message.message_id, "message sent");
        Ok(message)
    }

    pub fn chats(&self) -> Result<Vec<Chat>> {
        Ok(self.store.list_chats()?)
    }

    pub fn chat(&self, chat_id: ChatId) -> Result<Option<Chat>> {
        Ok(self.store.get_chat(chat_id)?)
    }

    pub fn chat_messages(&self, chat_id: ChatId) -> Result<Vec<Message>> {
        self.require_chat(chat_id)?;
        Ok(self.store.list_messages(chat_id)?)
    }

    /// Replace the local content of a stored message.
    pub fn correct_message(
        &mut self,
        chat_id: ChatId,
        message_id: MessageId,
        content: &str,
    ) -> Result<Message> {
        let mut message = self
            .store
            .get_message(chat_id, message_id)?
            .ok_or(ClientError::MessageNotFound {
                chat_id,
                message_id,
            })?;
        message.content = content.to_string();
        self.store.update_message(&message)?;
        Ok(message)
    }
}

/// Move `last_message_id` forward, never back.
pub(crate) fn raise_last_message_id<S: ChatStore>(
    store: &mut S,
    chat: &mut Chat,
    message_id: MessageId,
) -> Result<()> {
    if message_id > chat.last_message_id {
        chat.last_message_id = message_id;
        store.update_chat(chat)?;
    }
    Ok(())
}
