use thiserror::Error;

use sigilix_shared::error::{CryptoError, IdentityError, KeyFileError, ProtocolError};
use sigilix_shared::types::{ChatId, MessageId, UserId};
use sigilix_store::StoreError;

use crate::api::TransportError;

/// Errors surfaced by [`Client`](crate::Client) and [`Session`](crate::Session).
#[derive(Error, Debug)]
pub enum ClientError {
    /// The operation needs an unlocked session.
    #[error("Client is locked")]
    Locked,

    #[error("No identity file found, sign up first")]
    NotSignedUp,

    #[error("An identity file already exists")]
    AlreadySignedUp,

    #[error("Chat {0} not found")]
    ChatNotFound(ChatId),

    #[error("Message {message_id} not found in chat {chat_id}")]
    MessageNotFound {
        chat_id: ChatId,
        message_id: MessageId,
    },

    #[error("Chat {0} has not been accepted")]
    ChatNotAccepted(ChatId),

    /// The chat exists but we are on the wrong side of the handshake.
    #[error("Chat {0} is not in the expected role for this operation")]
    WrongRole(ChatId),

    /// A notification names a user other than the chat's peer.
    #[error("User {user_id} is not the peer of chat {chat_id}")]
    NotChatPeer { chat_id: ChatId, user_id: UserId },

    #[error("Chat {0} has no peer key")]
    MissingPeerKey(ChatId),

    #[error("User not found: {0}")]
    UserNotFound(String),

    /// The server assigned a different id than the one derived locally.
    #[error("Server user id {server} does not match local user id {local}")]
    UserIdMismatch { local: UserId, server: UserId },

    #[error("Identity file holds a {0}-byte password hash, expected 32")]
    MalformedPasswordHash(usize),

    #[error("Message signature does not match the sender key")]
    SignatureMismatch,

    #[error("Message is not valid UTF-8")]
    InvalidUtf8(#[from] std::string::FromUtf8Error),

    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Crypto error: {0}")]
    Crypto(#[from] CryptoError),

    #[error("Identity error: {0}")]
    Identity(#[from] IdentityError),

    #[error("Protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    #[error("Identity file error: {0}")]
    KeyFile(#[from] KeyFileError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ClientError>;
