//! Signed JSON-over-HTTPS transport.
//!
//! Every request is a `POST` of a JSON body to `<api_url><path>`. The exact
//! body bytes are signed with the identity key and the signature travels in
//! `X-Sigilix-Signature` next to the caller's id in `X-Sigilix-User-Id`.

use reqwest::header::CONTENT_TYPE;
use serde::de::DeserializeOwned;
use serde::Serialize;

use sigilix_shared::constants::{HEADER_SIGNATURE, HEADER_USER_ID};
use sigilix_shared::crypto::{self, SigningKey};
use sigilix_shared::protocol::{
    ErrorResponse, GetNotificationsRequest, GetNotificationsResponse,
    InitChatFromInitializerRequest, InitChatFromInitializerResponse, InitChatFromReceiverRequest,
    InitChatFromReceiverResponse, LoginRequest, LoginResponse, SearchByUsernameRequest,
    SearchByUsernameResponse, SendMessageRequest, SendMessageResponse, SetUsernameConfigRequest,
    SetUsernameConfigResponse, UpdateChatRsaKeyRequest, UpdateChatRsaKeyResponse,
};
use sigilix_shared::types::UserId;

use crate::api::{self, SigilixApi, TransportError};

pub struct HttpApi {
    client: reqwest::Client,
    base_url: String,
    signing_key: SigningKey,
    user_id: UserId,
}

impl HttpApi {
    pub fn new(base_url: impl Into<String>, signing_key: SigningKey, user_id: UserId) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
            signing_key,
            user_id,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Serialize and sign a request body. Returns `(body, base64 signature)`.
    fn signed_body<Req: Serialize>(&self, body: &Req) -> Result<(Vec<u8>, String), TransportError> {
        let encoded =
            serde_json::to_vec(body).map_err(|e| TransportError::Decode(e.to_string()))?;
        let signature =
            crypto::sign(&self.signing_key, &encoded).map_err(|_| TransportError::Signing)?;
        Ok((encoded, crypto::base64_encode(&signature)))
    }

    async fn post<Req, Resp>(&self, path: &str, body: &Req) -> Result<Resp, TransportError>
    where
        Req: Serialize,
        Resp: DeserializeOwned,
    {
        let url = format!("{}{}", self.base_url, path);
        let (encoded, signature) = self.signed_body(body)?;

        tracing::debug!(%url, len = encoded.len(), "sending request");

        let resp = self
            .client
            .post(&url)
            .header(CONTENT_TYPE, "application/json")
            .header(HEADER_SIGNATURE, signature)
            .header(HEADER_USER_ID, self.user_id.to_string())
            .body(encoded)
            .send()
            .await?;

        let status = resp.status();
        let bytes = resp.bytes().await?;

        if status.as_u16() > 299 {
            return Err(match serde_json::from_slice::<ErrorResponse>(&bytes) {
                Ok(err) => {
                    tracing::warn!(%url, code = err.code, message = %err.message, "server error");
                    TransportError::Api {
                        code: err.code,
                        message: err.message,
                    }
                }
                Err(_) => TransportError::Status(status.as_u16()),
            });
        }

        serde_json::from_slice(&bytes).map_err(|e| TransportError::Decode(e.to_string()))
    }
}

impl SigilixApi for HttpApi {
    async fn login(&self, req: &LoginRequest) -> Result<LoginResponse, TransportError> {
        self.post(api::PATH_LOGIN, req).await
    }

    async fn set_username_config(
        &self,
        req: &SetUsernameConfigRequest,
    ) -> Result<SetUsernameConfigResponse, TransportError> {
        self.post(api::PATH_SET_USERNAME_CONFIG, req).await
    }

    async fn search_by_username(
        &self,
        req: &SearchByUsernameRequest,
    ) -> Result<SearchByUsernameResponse, TransportError> {
        self.post(api::PATH_SEARCH_BY_USERNAME, req).await
    }

    async fn init_chat_from_initializer(
        &self,
        req: &InitChatFromInitializerRequest,
    ) -> Result<InitChatFromInitializerResponse, TransportError> {
        self.post(api::PATH_INIT_CHAT_FROM_INITIALIZER, req).await
    }

    async fn init_chat_from_receiver(
        &self,
        req: &InitChatFromReceiverRequest,
    ) -> Result<InitChatFromReceiverResponse, TransportError> {
        self.post(api::PATH_INIT_CHAT_FROM_RECEIVER, req).await
    }

    async fn update_chat_rsa_key(
        &self,
        req: &UpdateChatRsaKeyRequest,
    ) -> Result<UpdateChatRsaKeyResponse, TransportError> {
        self.post(api::PATH_UPDATE_CHAT_RSA_KEY, req).await
    }

    async fn send_message(
        &self,
        req: &SendMessageRequest,
    ) -> Result<SendMessageResponse, TransportError> {
        self.post(api::PATH_SEND_MESSAGE, req).await
    }

    async fn get_notifications(
        &self,
        req: &GetNotificationsRequest,
    ) -> Result<GetNotificationsResponse, TransportError> {
        self.post(api::PATH_GET_NOTIFICATIONS, req).await
    }
}
