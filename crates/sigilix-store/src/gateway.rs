//! The persistence contract the protocol engine is written against.
//!
//! Implementations only need single-record atomicity: the engine never relies
//! on two writes landing together.

use sigilix_shared::types::{ChatId, MessageId};

use crate::database::Database;
use crate::error::Result;
use crate::models::{Chat, Message};

pub trait ChatStore {
    /// Insert a new chat. Fails with [`StoreError::AlreadyExists`] when the id
    /// is taken.
    ///
    /// [`StoreError::AlreadyExists`]: crate::StoreError::AlreadyExists
    fn insert_chat(&mut self, chat: &Chat) -> Result<()>;

    fn get_chat(&self, chat_id: ChatId) -> Result<Option<Chat>>;

    /// Overwrite every column of an existing chat.
    fn update_chat(&mut self, chat: &Chat) -> Result<()>;

    /// Delete a chat and its messages. Returns `true` if a chat was removed.
    fn delete_chat(&mut self, chat_id: ChatId) -> Result<bool>;

    /// All chats, ordered by chat id.
    fn list_chats(&self) -> Result<Vec<Chat>>;

    /// Append a message. Returns `false` (and changes nothing) when the
    /// `(chat_id, message_id)` pair is already stored.
    fn insert_message(&mut self, message: &Message) -> Result<bool>;

    fn get_message(&self, chat_id: ChatId, message_id: MessageId) -> Result<Option<Message>>;

    /// Messages of one chat, ordered by message id.
    fn list_messages(&self, chat_id: ChatId) -> Result<Vec<Message>>;

    /// Replace sender and content of an existing message.
    fn update_message(&mut self, message: &Message) -> Result<()>;
}

impl ChatStore for Database {
    fn insert_chat(&mut self, chat: &Chat) -> Result<()> {
        Database::insert_chat(self, chat)
    }

    fn get_chat(&self, chat_id: ChatId) -> Result<Option<Chat>> {
        Database::get_chat(self, chat_id)
    }

    fn update_chat(&mut self, chat: &Chat) -> Result<()> {
        Database::update_chat(self, chat)
    }

    fn delete_chat(&mut self, chat_id: ChatId) -> Result<bool> {
        Database::delete_chat(self, chat_id)
    }

    fn list_chats(&self) -> Result<Vec<Chat>> {
        Database::list_chats(self)
    }

    fn insert_message(&mut self, message: &Message) -> Result<bool> {
        Database::insert_message(self, message)
    }

    fn get_message(&self, chat_id: ChatId, message_id: MessageId) -> Result<Option<Message>> {
        Database::get_message(self, chat_id, message_id)
    }

    fn list_messages(&self, chat_id: ChatId) -> Result<Vec<Message>> {
        Database::list_messages(self, chat_id)
    }

    fn update_message(&mut self, message: &Message) -> Result<()> {
        Database::update_message(self, message)
    }
}
