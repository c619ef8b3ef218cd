//! JSON request/response bodies and the notification envelope.
//!
//! Notifications arrive as `{ "notification": {...}, "type": "<kind>" }`. The
//! envelope is first read as a [`RawNotification`] and then decoded by its
//! discriminator into the closed [`Notification`] enum; an unknown
//! discriminator is a [`ProtocolError`], never a silently ignored default.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::ProtocolError;
use crate::types::{Base64Bytes, ChatId, MessageId, UserId};

// ---------------------------------------------------------------------------
// Users
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PublicUserInfo {
    pub user_id: UserId,
    pub ecdsa_public_key: Base64Bytes,
    #[serde(default)]
    pub username: String,
    pub initial_rsa_public_key: Base64Bytes,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PrivateUserInfo {
    pub public_info: Option<PublicUserInfo>,
    #[serde(default)]
    pub search_by_username_allowed: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub client_ecdsa_public_key: Base64Bytes,
    pub client_rsa_public_key: Base64Bytes,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginResponse {
    pub private_info: Option<PrivateUserInfo>,
    pub user_id: UserId,
    pub server_ecdsa_public_key: Base64Bytes,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SetUsernameConfigRequest {
    pub username: String,
    pub search_by_username_allowed: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SetUsernameConfigResponse {
    pub success: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchByUsernameRequest {
    pub username: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchByUsernameResponse {
    pub public_info: Option<PublicUserInfo>,
}

// ---------------------------------------------------------------------------
// Chats
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InitChatFromInitializerRequest {
    pub target_user_id: UserId,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InitChatFromInitializerResponse {
    pub chat_id: ChatId,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InitChatFromReceiverRequest {
    pub chat_id: ChatId,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InitChatFromReceiverResponse {
    pub chat_id: ChatId,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateChatRsaKeyRequest {
    pub chat_id: ChatId,
    pub rsa_public_key: Base64Bytes,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateChatRsaKeyResponse {
    pub chat_id: ChatId,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SendMessageRequest {
    pub chat_id: ChatId,
    pub encrypted_message: Base64Bytes,
    pub message_ecdsa_signature: Base64Bytes,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SendMessageResponse {
    pub chat_id: ChatId,
    pub message_id: MessageId,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GetNotificationsRequest {
    pub limit: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GetNotificationsResponse {
    #[serde(default)]
    pub notifications: Vec<RawNotification>,
}

/// Body of every non-2xx response.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ErrorResponse {
    pub code: i64,
    pub message: String,
}

// ---------------------------------------------------------------------------
// Notifications
// ---------------------------------------------------------------------------

/// A peer proposed a chat to us.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct InitChatFromInitializerNotification {
    pub chat_id: ChatId,
    pub initializer_user_info: PublicUserInfo,
}

/// The peer we proposed to accepted.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct InitChatFromReceiverNotification {
    pub chat_id: ChatId,
    pub receiver_user_info: PublicUserInfo,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UpdateChatRsaKeyNotification {
    pub chat_id: ChatId,
    pub user_id: UserId,
    pub rsa_public_key: Base64Bytes,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SendMessageNotification {
    pub chat_id: ChatId,
    pub message_id: MessageId,
    pub sender_user_id: UserId,
    /// Chunked RSA-OAEP ciphertext of the UTF-8 text
    pub encrypted_message: Base64Bytes,
    /// Sender's signature over the plaintext
    pub message_ecdsa_signature: Base64Bytes,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SendFileNotification {
    pub chat_id: ChatId,
    pub message_id: MessageId,
    pub sender_user_id: UserId,
    pub encrypted_file: Base64Bytes,
    pub encrypted_mime_type: Base64Bytes,
    pub file_ecdsa_signature: Base64Bytes,
}

/// Wire discriminators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationKind {
    InitChatFromInitializer,
    InitChatFromReceiver,
    UpdateChatRsaKey,
    SendMessage,
    SendFile,
}

impl NotificationKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::InitChatFromInitializer => "InitChatFromInitializer",
            Self::InitChatFromReceiver => "InitChatFromReceiver",
            Self::UpdateChatRsaKey => "UpdateChatRsaKey",
            Self::SendMessage => "SendMessage",
            Self::SendFile => "SendFile",
        }
    }

    pub fn parse(s: &str) -> Result<Self, ProtocolError> {
        match s {
            "InitChatFromInitializer" => Ok(Self::InitChatFromInitializer),
            "InitChatFromReceiver" => Ok(Self::InitChatFromReceiver),
            "UpdateChatRsaKey" => Ok(Self::UpdateChatRsaKey),
            "SendMessage" => Ok(Self::SendMessage),
            "SendFile" => Ok(Self::SendFile),
            other => Err(ProtocolError::UnknownNotificationType(other.to_string())),
        }
    }
}

impl std::fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// All notification payloads, one variant per discriminator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notification {
    /// `InitChatFromInitializer`
    ChatProposed(InitChatFromInitializerNotification),
    /// `InitChatFromReceiver`
    ChatAccepted(InitChatFromReceiverNotification),
    /// `UpdateChatRsaKey`
    PeerKeyRotated(UpdateChatRsaKeyNotification),
    /// `SendMessage`
    MessageDelivered(SendMessageNotification),
    /// `SendFile`
    FileDelivered(SendFileNotification),
}

impl Notification {
    pub fn kind(&self) -> NotificationKind {
        match self {
            Self::ChatProposed(_) => NotificationKind::InitChatFromInitializer,
            Self::ChatAccepted(_) => NotificationKind::InitChatFromReceiver,
            Self::PeerKeyRotated(_) => NotificationKind::UpdateChatRsaKey,
            Self::MessageDelivered(_) => NotificationKind::SendMessage,
            Self::FileDelivered(_) => NotificationKind::SendFile,
        }
    }

    pub fn chat_id(&self) -> ChatId {
        match self {
            Self::ChatProposed(n) => n.chat_id,
            Self::ChatAccepted(n) => n.chat_id,
            Self::PeerKeyRotated(n) => n.chat_id,
            Self::MessageDelivered(n) => n.chat_id,
            Self::FileDelivered(n) => n.chat_id,
        }
    }
}

/// Envelope as it appears on the wire, before discriminator dispatch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawNotification {
    #[serde(rename = "type")]
    pub kind: String,
    pub notification: serde_json::Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ecdsa_signature: Option<Base64Bytes>,
}

/// A decoded envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IncomingNotification {
    pub notification: Notification,
    /// Server signature over the payload, when the server provides one
    pub ecdsa_signature: Option<Base64Bytes>,
}

impl IncomingNotification {
    pub fn new(notification: Notification) -> Self {
        Self {
            notification,
            ecdsa_signature: None,
        }
    }

    pub fn decode(raw: RawNotification) -> Result<Self, ProtocolError> {
        let kind = NotificationKind::parse(&raw.kind)?;
        let body = raw.notification;

        let notification = match kind {
            NotificationKind::InitChatFromInitializer => {
                Notification::ChatProposed(decode_body(kind, body)?)
            }
            NotificationKind::InitChatFromReceiver => {
                Notification::ChatAccepted(decode_body(kind, body)?)
            }
            NotificationKind::UpdateChatRsaKey => {
                Notification::PeerKeyRotated(decode_body(kind, body)?)
            }
            NotificationKind::SendMessage => {
                Notification::MessageDelivered(decode_body(kind, body)?)
            }
            NotificationKind::SendFile => Notification::FileDelivered(decode_body(kind, body)?),
        };

        Ok(Self {
            notification,
            ecdsa_signature: raw.ecdsa_signature,
        })
    }

    pub fn encode(&self) -> Result<RawNotification, ProtocolError> {
        let notification = match &self.notification {
            Notification::ChatProposed(n) => serde_json::to_value(n)?,
            Notification::ChatAccepted(n) => serde_json::to_value(n)?,
            Notification::PeerKeyRotated(n) => serde_json::to_value(n)?,
            Notification::MessageDelivered(n) => serde_json::to_value(n)?,
            Notification::FileDelivered(n) => serde_json::to_value(n)?,
        };
        Ok(RawNotification {
            kind: self.notification.kind().as_str().to_string(),
            notification,
            ecdsa_signature: self.ecdsa_signature.clone(),
        })
    }
}

fn decode_body<T: DeserializeOwned>(
    kind: NotificationKind,
    body: serde_json::Value,
) -> Result<T, ProtocolError> {
    serde_json::from_value(body).map_err(|source| ProtocolError::MalformedNotification {
        kind: kind.as_str(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_send_message_envelope() {
        let json = r#"{
            "notification": {
                "chat_id": 5,
                "message_id": 9,
                "sender_user_id": 42,
                "encrypted_message": "AQID",
                "message_ecdsa_signature": "BAU="
            },
            "type": "SendMessage"
        }"#;

        let raw: RawNotification = serde_json::from_str(json).unwrap();
        let decoded = IncomingNotification::decode(raw).unwrap();

        let Notification::MessageDelivered(n) = decoded.notification else {
            panic!("expected MessageDelivered");
        };
        assert_eq!(n.chat_id, ChatId(5));
        assert_eq!(n.message_id, MessageId(9));
        assert_eq!(n.sender_user_id, UserId(42));
        assert_eq!(&*n.encrypted_message, &[1, 2, 3]);
        assert_eq!(&*n.message_ecdsa_signature, &[4, 5]);
        assert!(decoded.ecdsa_signature.is_none());
    }

    #[test]
    fn test_unknown_discriminator_is_an_error() {
        let raw = RawNotification {
            kind: "DeleteEverything".to_string(),
            notification: serde_json::json!({}),
            ecdsa_signature: None,
        };
        assert!(matches!(
            IncomingNotification::decode(raw),
            Err(ProtocolError::UnknownNotificationType(t)) if t == "DeleteEverything"
        ));
    }

    #[test]
    fn test_body_not_matching_discriminator_is_an_error() {
        let raw = RawNotification {
            kind: "InitChatFromReceiver".to_string(),
            notification: serde_json::json!({ "chat_id": 1, "user_id": 2, "rsa_public_key": "" }),
            ecdsa_signature: None,
        };
        assert!(matches!(
            IncomingNotification::decode(raw),
            Err(ProtocolError::MalformedNotification { kind: "InitChatFromReceiver", .. })
        ));
    }

    #[test]
    fn test_encode_uses_wire_discriminator() {
        let incoming = IncomingNotification {
            notification: Notification::PeerKeyRotated(UpdateChatRsaKeyNotification {
                chat_id: ChatId(3),
                user_id: UserId(4),
                rsa_public_key: Base64Bytes(vec![0xff]),
            }),
            ecdsa_signature: Some(Base64Bytes(vec![1])),
        };

        let raw = incoming.encode().unwrap();
        let json = serde_json::to_value(&raw).unwrap();
        assert_eq!(json["type"], "UpdateChatRsaKey");
        assert_eq!(json["notification"]["rsa_public_key"], "/w==");
        assert_eq!(json["ecdsa_signature"], "AQ==");

        let back = IncomingNotification::decode(serde_json::from_value(json).unwrap()).unwrap();
        assert_eq!(back, incoming);
    }

    #[test]
    fn test_request_field_names() {
        let req = SendMessageRequest {
            chat_id: ChatId(1),
            encrypted_message: Base64Bytes(vec![0]),
            message_ecdsa_signature: Base64Bytes(vec![1]),
        };
        let json = serde_json::to_string(&req).unwrap();
        assert_eq!(
            json,
            r#"{"chat_id":1,"encrypted_message":"AA==","message_ecdsa_signature":"AQ=="}"#
        );
    }
}
