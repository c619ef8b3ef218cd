//! The server API the protocol engine is written against.
//!
//! [`HttpApi`](crate::http::HttpApi) is the production implementation;
//! `LoopbackServer`, behind the `loopback` feature, runs the same contract
//! in process.

use thiserror::Error;

use sigilix_shared::protocol::{
    GetNotificationsRequest, GetNotificationsResponse, InitChatFromInitializerRequest,
    InitChatFromInitializerResponse, InitChatFromReceiverRequest, InitChatFromReceiverResponse,
    LoginRequest, LoginResponse, SearchByUsernameRequest, SearchByUsernameResponse,
    SendMessageRequest, SendMessageResponse, SetUsernameConfigRequest, SetUsernameConfigResponse,
    UpdateChatRsaKeyRequest, UpdateChatRsaKeyResponse,
};

pub const PATH_LOGIN: &str = "users/login";
pub const PATH_SET_USERNAME_CONFIG: &str = "users/set_username_config";
pub const PATH_SEARCH_BY_USERNAME: &str = "users/search_by_username";
pub const PATH_INIT_CHAT_FROM_INITIALIZER: &str = "messages/init_chat_from_initializer";
pub const PATH_INIT_CHAT_FROM_RECEIVER: &str = "messages/init_chat_from_receiver";
pub const PATH_UPDATE_CHAT_RSA_KEY: &str = "messages/update_chat_rsa_key";
pub const PATH_SEND_MESSAGE: &str = "messages/send_message";
pub const PATH_GET_NOTIFICATIONS: &str = "messages/get_notifications";

#[derive(Error, Debug)]
pub enum TransportError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The server answered with a structured error body.
    #[error("Server error {code}: {message}")]
    Api { code: i64, message: String },

    /// Non-2xx status without a readable error body.
    #[error("Server responded with status {0}")]
    Status(u16),

    #[error("Failed to decode response: {0}")]
    Decode(String),

    #[error("Failed to sign request")]
    Signing,
}

/// One method per endpoint. Every call is a single authenticated
/// request/response exchange.
#[allow(async_fn_in_trait)]
pub trait SigilixApi {
    async fn login(&self, req: &LoginRequest) -> Result<LoginResponse, TransportError>;

    async fn set_username_config(
        &self,
        req: &SetUsernameConfigRequest,
    ) -> Result<SetUsernameConfigResponse, TransportError>;

    async fn search_by_username(
        &self,
        req: &SearchByUsernameRequest,
    ) -> Result<SearchByUsernameResponse, TransportError>;

    async fn init_chat_from_initializer(
        &self,
        req: &InitChatFromInitializerRequest,
    ) -> Result<InitChatFromInitializerResponse, TransportError>;

    async fn init_chat_from_receiver(
        &self,
        req: &InitChatFromReceiverRequest,
    ) -> Result<InitChatFromReceiverResponse, TransportError>;

    async fn update_chat_rsa_key(
        &self,
        req: &UpdateChatRsaKeyRequest,
    ) -> Result<UpdateChatRsaKeyResponse, TransportError>;

    async fn send_message(
        &self,
        req: &SendMessageRequest,
    ) -> Result<SendMessageResponse, TransportError>;

    async fn get_notifications(
        &self,
        req: &GetNotificationsRequest,
    ) -> Result<GetNotificationsResponse, TransportError>;
}
