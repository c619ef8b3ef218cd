//! User-facing events produced by notification reconciliation.
//!
//! Serialized as `{ "type": "...", "notification": {...} }`, the shape the
//! desktop shell consumes.

use serde::Serialize;

use sigilix_shared::types::{ChatId, MessageId, UserId};
use sigilix_store::{Chat, Message};

pub const EVENT_NEW_INCOMING_CHAT: &str = "new_incoming_chat";
pub const EVENT_CHAT_ACCEPTED: &str = "chat_accepted";
pub const EVENT_NEW_MESSAGE: &str = "new_message";

/// Chat metadata safe to hand to a UI: no key material.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChatSummary {
    pub chat_id: ChatId,
    pub other_user_id: UserId,
    pub last_message_id: MessageId,
    pub am_i_initiator: bool,
    pub accepted: bool,
    pub title: String,
}

impl From<&Chat> for ChatSummary {
    fn from(c: &Chat) -> Self {
        Self {
            chat_id: c.chat_id,
            other_user_id: c.other_user_id,
            last_message_id: c.last_message_id,
            am_i_initiator: c.role.is_initiator(),
            accepted: c.accepted,
            title: c.title.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", content = "notification")]
pub enum ClientEvent {
    #[serde(rename = "new_incoming_chat")]
    ChatProposedByPeer { chat: ChatSummary },

    #[serde(rename = "chat_accepted")]
    ChatWasAccepted { chat: ChatSummary },

    #[serde(rename = "new_message")]
    NewMessage { chat_id: ChatId, message: Message },
}

impl ClientEvent {
    pub fn name(&self) -> &'static str {
        match self {
            Self::ChatProposedByPeer { .. } => EVENT_NEW_INCOMING_CHAT,
            Self::ChatWasAccepted { .. } => EVENT_CHAT_ACCEPTED,
            Self::NewMessage { .. } => EVENT_NEW_MESSAGE,
        }
    }

    pub fn chat_id(&self) -> ChatId {
        match self {
            Self::ChatProposedByPeer { chat } | Self::ChatWasAccepted { chat } => chat.chat_id,
            Self::NewMessage { chat_id, .. } => *chat_id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_wire_shape() {
        let event = ClientEvent::NewMessage {
            chat_id: ChatId(3),
            message: Message {
                message_id: MessageId(1),
                chat_id: ChatId(3),
                sender_id: UserId(42),
                content: "hi".into(),
            },
        };

        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], EVENT_NEW_MESSAGE);
        assert_eq!(json["notification"]["chat_id"], 3);
        assert_eq!(json["notification"]["message"]["content"], "hi");
        assert_eq!(event.name(), EVENT_NEW_MESSAGE);
        assert_eq!(event.chat_id(), ChatId(3));
    }
}
