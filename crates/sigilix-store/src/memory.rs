//! In-memory [`ChatStore`], for tests and embedders that keep state elsewhere.

use std::collections::BTreeMap;

use sigilix_shared::types::{ChatId, MessageId};

use crate::error::{Result, StoreError};
use crate::gateway::ChatStore;
use crate::models::{Chat, Message};

#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    chats: BTreeMap<ChatId, Chat>,
    messages: BTreeMap<(ChatId, MessageId), Message>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn message_count(&self) -> usize {
        self.messages.len()
    }
}

impl ChatStore for MemoryStore {
    fn insert_chat(&mut self, chat: &Chat) -> Result<()> {
        if self.chats.contains_key(&chat.chat_id) {
            return Err(StoreError::AlreadyExists);
        }
        self.chats.insert(chat.chat_id, chat.clone());
        Ok(())
    }

    fn get_chat(&self, chat_id: ChatId) -> Result<Option<Chat>> {
        Ok(self.chats.get(&chat_id).cloned())
    }

    fn update_chat(&mut self, chat: &Chat) -> Result<()> {
        let stored = self
            .chats
            .get_mut(&chat.chat_id)
            .ok_or(StoreError::NotFound)?;
        *stored = chat.clone();
        Ok(())
    }

    fn delete_chat(&mut self, chat_id: ChatId) -> Result<bool> {
        let removed = self.chats.remove(&chat_id).is_some();
        // Mirrors ON DELETE CASCADE.
        self.messages.retain(|(chat, _), _| *chat != chat_id);
        Ok(removed)
    }

    fn list_chats(&self) -> Result<Vec<Chat>> {
        Ok(self.chats.values().cloned().collect())
    }

    fn insert_message(&mut self, message: &Message) -> Result<bool> {
        if !self.chats.contains_key(&message.chat_id) {
            return Err(StoreError::NotFound);
        }
        let key = (message.chat_id, message.message_id);
        if self.messages.contains_key(&key) {
            return Ok(false);
        }
        self.messages.insert(key, message.clone());
        Ok(true)
    }

    fn get_message(&self, chat_id: ChatId, message_id: MessageId) -> Result<Option<Message>> {
        Ok(self.messages.get(&(chat_id, message_id)).cloned())
    }

    fn list_messages(&self, chat_id: ChatId) -> Result<Vec<Message>> {
        Ok(self
            .messages
            .range((chat_id, MessageId(0))..=(chat_id, MessageId(u64::MAX)))
            .map(|(_, m)| m.clone())
            .collect())
    }

    fn update_message(&mut self, message: &Message) -> Result<()> {
        let stored = self
            .messages
            .get_mut(&(message.chat_id, message.message_id))
            .ok_or(StoreError::NotFound)?;
        *stored = message.clone();
        Ok(())
    }
}
