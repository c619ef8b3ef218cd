use rusqlite::{params, OptionalExtension};

use sigilix_shared::types::{ChatId, ChatRole, MessageId, UserId};

use crate::database::Database;
use crate::error::{Result, StoreError};
use crate::models::Chat;

const CHAT_COLUMNS: &str = "chat_id, other_user_id, last_message_id, role, accepted, \
     other_user_rsa_public, other_user_ecdsa_public, my_rsa_private, title";

impl Database {
    pub fn insert_chat(&self, chat: &Chat) -> Result<()> {
        self.conn()
            .execute(
                &format!("INSERT INTO chats ({CHAT_COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)"),
                params![
                    chat.chat_id.0 as i64,
                    chat.other_user_id.0 as i64,
                    chat.last_message_id.0 as i64,
                    role_to_str(chat.role),
                    chat.accepted,
                    chat.other_user_rsa_public,
                    chat.other_user_ecdsa_public,
                    chat.my_rsa_private,
                    chat.title,
                ],
            )
            .map_err(map_constraint)?;
        Ok(())
    }

    pub fn get_chat(&self, chat_id: ChatId) -> Result<Option<Chat>> {
        let chat = self
            .conn()
            .query_row(
                &format!("SELECT {CHAT_COLUMNS} FROM chats WHERE chat_id = ?1"),
                params![chat_id.0 as i64],
                row_to_chat,
            )
            .optional()?;
        Ok(chat)
    }

    pub fn update_chat(&self, chat: &Chat) -> Result<()> {
        let affected = self.conn().execute(
            "UPDATE chats SET other_user_id = ?2, last_message_id = ?3, role = ?4, accepted = ?5,
                 other_user_rsa_public = ?6, other_user_ecdsa_public = ?7, my_rsa_private = ?8,
                 title = ?9
             WHERE chat_id = ?1",
            params![
                chat.chat_id.0 as i64,
                chat.other_user_id.0 as i64,
                chat.last_message_id.0 as i64,
                role_to_str(chat.role),
                chat.accepted,
                chat.other_user_rsa_public,
                chat.other_user_ecdsa_public,
                chat.my_rsa_private,
                chat.title,
            ],
        )?;
        if affected == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    pub fn delete_chat(&self, chat_id: ChatId) -> Result<bool> {
        let affected = self.conn().execute(
            "DELETE FROM chats WHERE chat_id = ?1",
            params![chat_id.0 as i64],
        )?;
        Ok(affected > 0)
    }

    pub fn list_chats(&self) -> Result<Vec<Chat>> {
        // Ids are stored bit-cast to i64; negative values are the upper half of u64.
        let mut stmt = self.conn().prepare(&format!(
            "SELECT {CHAT_COLUMNS} FROM chats ORDER BY chat_id < 0, chat_id"
        ))?;

        let rows = stmt.query_map([], row_to_chat)?;

        let mut chats = Vec::new();
        for row in rows {
            chats.push(row?);
        }
        Ok(chats)
    }
}

pub(crate) fn map_constraint(e: rusqlite::Error) -> StoreError {
    match e {
        rusqlite::Error::SqliteFailure(ref err, _)
            if err.code == rusqlite::ErrorCode::ConstraintViolation =>
        {
            StoreError::AlreadyExists
        }
        other => StoreError::Sqlite(other),
    }
}

fn role_to_str(role: ChatRole) -> &'static str {
    match role {
        ChatRole::Initiator => "initiator",
        ChatRole::Receiver => "receiver",
    }
}

fn row_to_chat(row: &rusqlite::Row<'_>) -> rusqlite::Result<Chat> {
    let chat_id: i64 = row.get(0)?;
    let other_user_id: i64 = row.get(1)?;
    let last_message_id: i64 = row.get(2)?;
    let role_str: String = row.get(3)?;

    let role = match role_str.as_str() {
        "initiator" => ChatRole::Initiator,
        "receiver" => ChatRole::Receiver,
        other => {
            return Err(rusqlite::Error::FromSqlConversionFailure(
                3,
                rusqlite::types::Type::Text,
                format!("unknown chat role {other:?}").into(),
            ))
        }
    };

    Ok(Chat {
        chat_id: ChatId(chat_id as u64),
        other_user_id: UserId(other_user_id as u64),
        last_message_id: MessageId(last_message_id as u64),
        role,
        accepted: row.get(4)?,
        other_user_rsa_public: row.get(5)?,
        other_user_ecdsa_public: row.get(6)?,
        my_rsa_private: row.get(7)?,
        title: row.get(8)?,
    })
}
