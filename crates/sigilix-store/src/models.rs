//! Domain model structs persisted by a [`ChatStore`](crate::ChatStore).

use serde::{Deserialize, Serialize};

use sigilix_shared::crypto::{self, RsaPrivateKey, RsaPublicKey, VerifyingKey};
use sigilix_shared::error::CryptoError;
use sigilix_shared::types::{ChatId, ChatRole, MessageId, UserId};

// ---------------------------------------------------------------------------
// Chat
// ---------------------------------------------------------------------------

/// Local record of a proposed or established two-party chat.
///
/// Key material is kept in its wire encoding and parsed on use, so a corrupt
/// column surfaces as a [`CryptoError`] at the call site rather than at load.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chat {
    /// Server-assigned chat id.
    pub chat_id: ChatId,
    /// The other participant.
    pub other_user_id: UserId,
    /// Highest message id stored for this chat (0 when empty).
    pub last_message_id: MessageId,
    /// Which side of the handshake we are on.
    pub role: ChatRole,
    /// Set once both sides have completed the handshake.
    pub accepted: bool,
    /// Peer RSA public key, DER SubjectPublicKeyInfo.
    pub other_user_rsa_public: Option<Vec<u8>>,
    /// Peer P-256 public key, SEC1 uncompressed.
    pub other_user_ecdsa_public: Option<Vec<u8>>,
    /// Our RSA private key for this chat, PKCS#1 DER.
    pub my_rsa_private: Vec<u8>,
    /// Display title.
    pub title: String,
}

impl Chat {
    pub fn other_user_rsa_public_key(&self) -> Result<Option<RsaPublicKey>, CryptoError> {
        self.other_user_rsa_public
            .as_deref()
            .map(crypto::encryption_public_key_from_der)
            .transpose()
    }

    pub fn other_user_ecdsa_public_key(&self) -> Result<Option<VerifyingKey>, CryptoError> {
        self.other_user_ecdsa_public
            .as_deref()
            .map(crypto::signing_public_key_from_bytes)
            .transpose()
    }

    pub fn my_rsa_private_key(&self) -> Result<RsaPrivateKey, CryptoError> {
        crypto::encryption_private_key_from_der(&self.my_rsa_private)
    }

    pub fn has_peer_keys(&self) -> bool {
        self.other_user_rsa_public.is_some() && self.other_user_ecdsa_public.is_some()
    }
}

// ---------------------------------------------------------------------------
// Message
// ---------------------------------------------------------------------------

/// A decrypted chat message. `(chat_id, message_id)` is the key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub message_id: MessageId,
    pub chat_id: ChatId,
    pub sender_id: UserId,
    pub content: String,
}
