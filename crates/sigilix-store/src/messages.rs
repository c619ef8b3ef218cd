use rusqlite::{params, OptionalExtension};

use sigilix_shared::types::{ChatId, MessageId, UserId};

use crate::chats::map_constraint;
use crate::database::Database;
use crate::error::{Result, StoreError};
use crate::models::Message;

impl Database {
    /// Returns `false` when `(chat_id, message_id)` is already stored.
    pub fn insert_message(&self, message: &Message) -> Result<bool> {
        let affected = self
            .conn()
            .execute(
                "INSERT OR IGNORE INTO messages (chat_id, message_id, sender_id, content)
                 VALUES (?1, ?2, ?3, ?4)",
                params![
                    message.chat_id.0 as i64,
                    message.message_id.0 as i64,
                    message.sender_id.0 as i64,
                    message.content,
                ],
            )
            .map_err(|e| match map_constraint(e) {
                // OR IGNORE swallows key conflicts, so a constraint error here
                // is the foreign key.
                StoreError::AlreadyExists => StoreError::NotFound,
                other => other,
            })?;
        Ok(affected > 0)
    }

    pub fn get_message(&self, chat_id: ChatId, message_id: MessageId) -> Result<Option<Message>> {
        let message = self
            .conn()
            .query_row(
                "SELECT chat_id, message_id, sender_id, content
                 FROM messages WHERE chat_id = ?1 AND message_id = ?2",
                params![chat_id.0 as i64, message_id.0 as i64],
                row_to_message,
            )
            .optional()?;
        Ok(message)
    }

    pub fn list_messages(&self, chat_id: ChatId) -> Result<Vec<Message>> {
        let mut stmt = self.conn().prepare(
            "SELECT chat_id, message_id, sender_id, content
             FROM messages
             WHERE chat_id = ?1
             ORDER BY message_id < 0, message_id",
        )?;

        let rows = stmt.query_map(params![chat_id.0 as i64], row_to_message)?;

        let mut messages = Vec::new();
        for row in rows {
            messages.push(row?);
        }
        Ok(messages)
    }

    pub fn update_message(&self, message: &Message) -> Result<()> {
        let affected = self.conn().execute(
            "UPDATE messages SET sender_id = ?3, content = ?4
             WHERE chat_id = ?1 AND message_id = ?2",
            params![
                message.chat_id.0 as i64,
                message.message_id.0 as i64,
                message.sender_id.0 as i64,
                message.content,
            ],
        )?;
        if affected == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }
}

fn row_to_message(row: &rusqlite::Row<'_>) -> rusqlite::Result<Message> {
    let chat_id: i64 = row.get(0)?;
    let message_id: i64 = row.get(1)?;
    let sender_id: i64 = row.get(2)?;

    Ok(Message {
        chat_id: ChatId(chat_id as u64),
        message_id: MessageId(message_id as u64),
        sender_id: UserId(sender_id as u64),
        content: row.get(3)?,
    })
}
