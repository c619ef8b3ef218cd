//! # sigilix-store
//!
//! Local chat and message persistence for the Sigilix client.
//!
//! The protocol engine talks to storage through the [`ChatStore`] trait. Two
//! implementations ship here: [`Database`], a per-identity SQLite file
//! (SQLCipher-keyed with the `sqlcipher` feature), and [`MemoryStore`].

pub mod chats;
pub mod database;
pub mod gateway;
pub mod memory;
pub mod messages;
pub mod migrations;
pub mod models;

mod error;

pub use database::Database;
pub use error::{Result, StoreError};
pub use gateway::ChatStore;
pub use memory::MemoryStore;
pub use models::*;

#[cfg(test)]
pub(crate) mod tests {
    use sigilix_shared::types::{ChatId, ChatRole, MessageId, UserId};

    use crate::models::{Chat, Message};

    pub fn sample_chat(id: u64) -> Chat {
        Chat {
            chat_id: ChatId(id),
            other_user_id: UserId(42),
            last_message_id: MessageId(0),
            role: ChatRole::Initiator,
            accepted: false,
            other_user_rsa_public: None,
            other_user_ecdsa_public: None,
            my_rsa_private: vec![0x30, 0x82, id as u8],
            title: format!("Chat {id}"),
        }
    }

    pub fn sample_message(chat: u64, id: u64, content: &str) -> Message {
        Message {
            message_id: MessageId(id),
            chat_id: ChatId(chat),
            sender_id: UserId(42),
            content: content.to_string(),
        }
    }
}
