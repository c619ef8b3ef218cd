//! v001 -- Initial schema creation: `chats` and `messages`.
//!
//! Ids are unsigned 64-bit on the wire and stored as SQLite INTEGER (i64)
//! with a bit-preserving cast.

use rusqlite::Connection;

const UP_SQL: &str = r#"
-- ----------------------------------------------------------------
-- Chats
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS chats (
    chat_id                 INTEGER PRIMARY KEY NOT NULL,
    other_user_id           INTEGER NOT NULL,
    last_message_id         INTEGER NOT NULL DEFAULT 0,
    role                    TEXT NOT NULL,               -- 'initiator' | 'receiver'
    accepted                INTEGER NOT NULL DEFAULT 0,  -- boolean 0/1
    other_user_rsa_public   BLOB,                        -- SPKI DER
    other_user_ecdsa_public BLOB,                        -- SEC1 uncompressed
    my_rsa_private          BLOB NOT NULL,               -- PKCS#1 DER
    title                   TEXT NOT NULL
);

-- ----------------------------------------------------------------
-- Messages
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS messages (
    chat_id    INTEGER NOT NULL,
    message_id INTEGER NOT NULL,
    sender_id  INTEGER NOT NULL,
    content    TEXT NOT NULL,

    PRIMARY KEY (chat_id, message_id),
    FOREIGN KEY (chat_id) REFERENCES chats(chat_id) ON DELETE CASCADE
);
"#;

/// Apply the initial migration.
pub fn up(conn: &Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(UP_SQL)
}
