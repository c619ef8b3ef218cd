//! The unlocked protocol context.
//!
//! A [`Session`] owns everything an operation needs: the identity, the
//! profile, the transport and the chat store. Every protocol operation takes
//! `&mut self`, so one session never has two operations in flight.
//! Operations live next to their concern in [`handshake`](crate::handshake),
//! [`messaging`](crate::messaging) and [`reconcile`](crate::reconcile).

use chrono::Local;

use sigilix_shared::constants::DEFAULT_NOTIFICATION_LIMIT;
use sigilix_shared::protocol::{SearchByUsernameRequest, SetUsernameConfigRequest};
use sigilix_shared::types::{ChatId, UserId};
use sigilix_shared::Identity;
use sigilix_store::{Chat, ChatStore};

use crate::api::SigilixApi;
use crate::error::{ClientError, Result};
use crate::profile::Profile;

pub struct Session<A, S> {
    pub(crate) identity: Identity,
    pub(crate) profile: Profile,
    pub(crate) api: A,
    pub(crate) store: S,
    pub(crate) notification_limit: u32,
}

impl<A: SigilixApi, S: ChatStore> Session<A, S> {
    pub fn new(identity: Identity, profile: Profile, api: A, store: S) -> Self {
        Self {
            identity,
            profile,
            api,
            store,
            notification_limit: DEFAULT_NOTIFICATION_LIMIT,
        }
    }

    pub fn with_notification_limit(mut self, limit: u32) -> Self {
        self.notification_limit = limit;
        self
    }

    pub fn user_id(&self) -> UserId {
        self.identity.user_id()
    }

    pub fn username(&self) -> &str {
        &self.profile.username
    }

    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    pub fn profile(&self) -> &Profile {
        &self.profile
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Resolve a username to a user id. `Ok(None)` when nobody matches or the
    /// user does not allow username search. A zero user id also means no match.
    pub async fn search_by_username(&mut self, username: &str) -> Result<Option<UserId>> {
        let resp = self
            .api
            .search_by_username(&SearchByUsernameRequest {
                username: username.to_string(),
            })
            .await?;
        Ok(resp
            .public_info
            .filter(|info| info.user_id.0 != 0)
            .map(|info| info.user_id))
    }

    /// Publish username settings and mirror them into the in-memory profile.
    /// Persisting the profile is up to the owner of the identity file.
    pub async fn set_username_config(&mut self, username: &str, searchable: bool) -> Result<()> {
        self.api
            .set_username_config(&SetUsernameConfigRequest {
                username: username.to_string(),
                search_by_username_allowed: searchable,
            })
            .await?;

        tracing::info!(user_id = %self.user_id(), %username, searchable, "username config updated");

        self.profile.username = username.to_string();
        self.profile.search_by_username = searchable;
        Ok(())
    }

    pub(crate) fn require_chat(&self, chat_id: ChatId) -> Result<Chat> {
        self.store
            .get_chat(chat_id)?
            .ok_or(ClientError::ChatNotFound(chat_id))
    }
}

/// Default title of a freshly created chat.
pub(crate) fn default_chat_title(other: UserId) -> String {
    format!(
        "Chat with {}, {}",
        other,
        Local::now().format("%Y-%m-%d %H:%M:%S")
    )
}
