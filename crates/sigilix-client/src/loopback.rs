//! In-process implementation of the server API.
//!
//! [`LoopbackServer`] keeps users, chats and per-user notification queues in
//! memory and routes every call the way the relay does: a proposal queues an
//! `InitChatFromInitializer` for the target, an acceptance queues an
//! `InitChatFromReceiver` for the initiator, and so on. Each participant
//! talks to it through its own [`LoopbackApi`] handle. Used by the test
//! suites and handy for driving two clients without a network.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use tokio::sync::Mutex;

use sigilix_shared::identity::user_id_from_public_key_bytes;
use sigilix_shared::protocol::{
    GetNotificationsRequest, GetNotificationsResponse, IncomingNotification,
    InitChatFromInitializerNotification, InitChatFromInitializerRequest,
    InitChatFromInitializerResponse, InitChatFromReceiverNotification,
    InitChatFromReceiverRequest, InitChatFromReceiverResponse, LoginRequest, LoginResponse,
    Notification, PrivateUserInfo, PublicUserInfo, RawNotification, SearchByUsernameRequest,
    SearchByUsernameResponse, SendMessageNotification, SendMessageRequest, SendMessageResponse,
    SetUsernameConfigRequest, SetUsernameConfigResponse, UpdateChatRsaKeyNotification,
    UpdateChatRsaKeyRequest, UpdateChatRsaKeyResponse,
};
use sigilix_shared::types::{Base64Bytes, ChatId, MessageId, UserId};

use crate::api::{SigilixApi, TransportError};

const CODE_BAD_REQUEST: i64 = 400;
const CODE_FORBIDDEN: i64 = 403;
const CODE_NOT_FOUND: i64 = 404;

#[derive(Debug)]
struct UserRecord {
    info: PublicUserInfo,
    search_allowed: bool,
}

#[derive(Debug)]
struct ChatRecord {
    initiator: UserId,
    receiver: UserId,
    accepted: bool,
    last_message_id: u64,
}

impl ChatRecord {
    fn peer_of(&self, user: UserId) -> Option<UserId> {
        if user == self.initiator {
            Some(self.receiver)
        } else if user == self.receiver {
            Some(self.initiator)
        } else {
            None
        }
    }
}

#[derive(Debug, Default)]
struct ServerState {
    users: HashMap<UserId, UserRecord>,
    chats: HashMap<ChatId, ChatRecord>,
    next_chat_id: u64,
    inboxes: HashMap<UserId, VecDeque<RawNotification>>,
}

impl ServerState {
    fn user(&self, id: UserId) -> Result<&UserRecord, TransportError> {
        self.users
            .get(&id)
            .ok_or_else(|| api_error(CODE_NOT_FOUND, format!("user {id} not found")))
    }

    fn chat_mut(&mut self, id: ChatId) -> Result<&mut ChatRecord, TransportError> {
        self.chats
            .get_mut(&id)
            .ok_or_else(|| api_error(CODE_NOT_FOUND, format!("chat {id} not found")))
    }

    fn notify(&mut self, to: UserId, notification: Notification) -> Result<(), TransportError> {
        let raw = IncomingNotification::new(notification)
            .encode()
            .map_err(|e| TransportError::Decode(e.to_string()))?;
        self.inboxes.entry(to).or_default().push_back(raw);
        Ok(())
    }
}

fn api_error(code: i64, message: String) -> TransportError {
    TransportError::Api { code, message }
}

#[derive(Debug, Clone, Default)]
pub struct LoopbackServer {
    state: Arc<Mutex<ServerState>>,
}

impl LoopbackServer {
    pub fn new() -> Self {
        Self::default()
    }

    /// A handle that authenticates every call as `user_id`.
    pub fn connect(&self, user_id: UserId) -> LoopbackApi {
        LoopbackApi {
            server: self.clone(),
            user_id,
        }
    }

    /// Queue a raw envelope for `user`, bypassing all routing.
    pub async fn push_raw(&self, user: UserId, raw: RawNotification) {
        let mut state = self.state.lock().await;
        state.inboxes.entry(user).or_default().push_back(raw);
    }

    /// Register a user record directly, as another server-side client would.
    pub async fn insert_user(&self, info: PublicUserInfo, search_allowed: bool) {
        let mut state = self.state.lock().await;
        state.users.insert(
            info.user_id,
            UserRecord {
                info,
                search_allowed,
            },
        );
    }

    pub async fn pending(&self, user: UserId) -> usize {
        let state = self.state.lock().await;
        state.inboxes.get(&user).map_or(0, VecDeque::len)
    }
}

#[derive(Debug, Clone)]
pub struct LoopbackApi {
    server: LoopbackServer,
    user_id: UserId,
}

impl LoopbackApi {
    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    pub fn server(&self) -> &LoopbackServer {
        &self.server
    }
}

impl SigilixApi for LoopbackApi {
    async fn login(&self, req: &LoginRequest) -> Result<LoginResponse, TransportError> {
        let user_id = user_id_from_public_key_bytes(&req.client_ecdsa_public_key);
        let mut state = self.server.state.lock().await;

        let record = state.users.entry(user_id).or_insert_with(|| UserRecord {
            info: PublicUserInfo {
                user_id,
                ecdsa_public_key: req.client_ecdsa_public_key.clone(),
                username: String::new(),
                initial_rsa_public_key: req.client_rsa_public_key.clone(),
            },
            search_allowed: false,
        });

        Ok(LoginResponse {
            private_info: Some(PrivateUserInfo {
                public_info: Some(record.info.clone()),
                search_by_username_allowed: record.search_allowed,
            }),
            user_id,
            server_ecdsa_public_key: Base64Bytes::default(),
        })
    }

    async fn set_username_config(
        &self,
        req: &SetUsernameConfigRequest,
    ) -> Result<SetUsernameConfigResponse, TransportError> {
        let mut state = self.server.state.lock().await;

        let taken = state
            .users
            .values()
            .any(|u| u.info.user_id != self.user_id && u.info.username == req.username);
        if taken && !req.username.is_empty() {
            return Err(api_error(CODE_BAD_REQUEST, "username taken".into()));
        }

        let record = state
            .users
            .get_mut(&self.user_id)
            .ok_or_else(|| api_error(CODE_FORBIDDEN, "not logged in".into()))?;
        record.info.username = req.username.clone();
        record.search_allowed = req.search_by_username_allowed;

        Ok(SetUsernameConfigResponse { success: true })
    }

    async fn search_by_username(
        &self,
        req: &SearchByUsernameRequest,
    ) -> Result<SearchByUsernameResponse, TransportError> {
        let state = self.server.state.lock().await;
        let public_info = state
            .users
            .values()
            .find(|u| u.search_allowed && !req.username.is_empty() && u.info.username == req.username)
            .map(|u| u.info.clone());
        Ok(SearchByUsernameResponse { public_info })
    }

    async fn init_chat_from_initializer(
        &self,
        req: &InitChatFromInitializerRequest,
    ) -> Result<InitChatFromInitializerResponse, TransportError> {
        let mut state = self.server.state.lock().await;
        let initializer_user_info = state.user(self.user_id)?.info.clone();
        state.user(req.target_user_id)?;

        state.next_chat_id += 1;
        let chat_id = ChatId(state.next_chat_id);
        state.chats.insert(
            chat_id,
            ChatRecord {
                initiator: self.user_id,
                receiver: req.target_user_id,
                accepted: false,
                last_message_id: 0,
            },
        );

        state.notify(
            req.target_user_id,
            Notification::ChatProposed(InitChatFromInitializerNotification {
                chat_id,
                initializer_user_info,
            }),
        )?;

        Ok(InitChatFromInitializerResponse { chat_id })
    }

    async fn init_chat_from_receiver(
        &self,
        req: &InitChatFromReceiverRequest,
    ) -> Result<InitChatFromReceiverResponse, TransportError> {
        let mut state = self.server.state.lock().await;
        let receiver_user_info = state.user(self.user_id)?.info.clone();

        let chat = state.chat_mut(req.chat_id)?;
        if chat.receiver != self.user_id {
            return Err(api_error(CODE_FORBIDDEN, "not the receiver of this chat".into()));
        }
        chat.accepted = true;
        let initiator = chat.initiator;

        state.notify(
            initiator,
            Notification::ChatAccepted(InitChatFromReceiverNotification {
                chat_id: req.chat_id,
                receiver_user_info,
            }),
        )?;

        Ok(InitChatFromReceiverResponse {
            chat_id: req.chat_id,
        })
    }

    async fn update_chat_rsa_key(
        &self,
        req: &UpdateChatRsaKeyRequest,
    ) -> Result<UpdateChatRsaKeyResponse, TransportError> {
        let mut state = self.server.state.lock().await;
        let peer = state
            .chat_mut(req.chat_id)?
            .peer_of(self.user_id)
            .ok_or_else(|| api_error(CODE_FORBIDDEN, "not a member of this chat".into()))?;

        state.notify(
            peer,
            Notification::PeerKeyRotated(UpdateChatRsaKeyNotification {
                chat_id: req.chat_id,
                user_id: self.user_id,
                rsa_public_key: req.rsa_public_key.clone(),
            }),
        )?;

        Ok(UpdateChatRsaKeyResponse {
            chat_id: req.chat_id,
        })
    }

    async fn send_message(
        &self,
        req: &SendMessageRequest,
    ) -> Result<SendMessageResponse, TransportError> {
        let mut state = self.server.state.lock().await;
        let chat = state.chat_mut(req.chat_id)?;
        let peer = chat
            .peer_of(self.user_id)
            .ok_or_else(|| api_error(CODE_FORBIDDEN, "not a member of this chat".into()))?;
        if !chat.accepted {
            return Err(api_error(CODE_BAD_REQUEST, "chat not accepted".into()));
        }
        chat.last_message_id += 1;
        let message_id = MessageId(chat.last_message_id);

        state.notify(
            peer,
            Notification::MessageDelivered(SendMessageNotification {
                chat_id: req.chat_id,
                message_id,
                sender_user_id: self.user_id,
                encrypted_message: req.encrypted_message.clone(),
                message_ecdsa_signature: req.message_ecdsa_signature.clone(),
            }),
        )?;

        Ok(SendMessageResponse {
            chat_id: req.chat_id,
            message_id,
        })
    }

    async fn get_notifications(
        &self,
        req: &GetNotificationsRequest,
    ) -> Result<GetNotificationsResponse, TransportError> {
        let mut state = self.server.state.lock().await;
        let inbox = state.inboxes.entry(self.user_id).or_default();
        let take = inbox.len().min(req.limit as usize);
        Ok(GetNotificationsResponse {
            notifications: inbox.drain(..take).collect(),
        })
    }
}
