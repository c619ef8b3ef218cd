//! Sign-up and unlock lifecycle.
//!
//! A [`Client`] is either locked (no session) or unlocked (one [`Session`]
//! over the on-disk identity). Everything that talks to the server or the
//! chat store goes through [`Client::session_mut`], which is where the
//! "not unlocked" precondition lives.

use sigilix_shared::keyfile::hash_password;
use sigilix_shared::protocol::LoginRequest;
use sigilix_shared::Identity;
use sigilix_store::Database;

use crate::api::SigilixApi;
use crate::config::ClientConfig;
use crate::error::{ClientError, Result};
use crate::http::HttpApi;
use crate::profile::Profile;
use crate::session::Session;

pub struct Client<A = HttpApi> {
    config: ClientConfig,
    session: Option<Session<A, Database>>,
}

impl<A: SigilixApi> Client<A> {
    pub fn new(config: ClientConfig) -> Self {
        Self {
            config,
            session: None,
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn is_signed_up(&self) -> bool {
        self.config.identity_path().exists()
    }

    pub fn is_unlocked(&self) -> bool {
        self.session.is_some()
    }

    /// Generate a new identity and write it, encrypted under `password`.
    pub fn sign_up(&self, password: &str) -> Result<Profile> {
        if self.is_signed_up() {
            return Err(ClientError::AlreadySignedUp);
        }
        std::fs::create_dir_all(&self.config.data_dir)?;

        let identity = Identity::generate()?;
        let profile = Profile::new(&identity, hash_password(password))?;
        profile.save(&self.config.identity_path())?;

        tracing::info!(user_id = %profile.user_id, "signed up");
        Ok(profile)
    }

    /// Decrypt the identity, log in through the API built by `connect` and
    /// open the user's database.
    pub async fn unlock_with<F>(&mut self, password: &str, connect: F) -> Result<()>
    where
        F: FnOnce(&ClientConfig, &Identity) -> A,
    {
        if !self.is_signed_up() {
            return Err(ClientError::NotSignedUp);
        }

        let password_hash = hash_password(password);
        let profile = Profile::load(&self.config.identity_path(), &password_hash)?;
        let identity = profile.identity()?;
        let db_key = profile.db_key()?;
        let local = identity.user_id();

        let api = connect(&self.config, &identity);
        let login = api
            .login(&LoginRequest {
                client_ecdsa_public_key: identity.signing_public_key_bytes().into(),
                client_rsa_public_key: identity.encryption_public_key_der()?.into(),
            })
            .await?;
        if login.user_id != local || profile.user_id != local {
            return Err(ClientError::UserIdMismatch {
                local,
                server: login.user_id,
            });
        }

        let store = Database::open_for_user(&self.config.data_dir, local, &db_key)?;

        tracing::info!(user_id = %local, "unlocked");
        self.session = Some(
            Session::new(identity, profile, api, store)
                .with_notification_limit(self.config.notification_batch_limit),
        );
        Ok(())
    }

    /// Drop the session and every key it holds.
    pub fn lock(&mut self) {
        if self.session.take().is_some() {
            tracing::info!("locked");
        }
    }

    pub fn session(&self) -> Result<&Session<A, Database>> {
        self.session.as_ref().ok_or(ClientError::Locked)
    }

    pub fn session_mut(&mut self) -> Result<&mut Session<A, Database>> {
        self.session.as_mut().ok_or(ClientError::Locked)
    }

    /// Publish username settings and persist them in the identity file.
    pub async fn set_username_config(&mut self, username: &str, searchable: bool) -> Result<()> {
        let path = self.config.identity_path();
        let session = self.session.as_mut().ok_or(ClientError::Locked)?;
        session.set_username_config(username, searchable).await?;
        session.profile().save(&path)
    }
}

impl Client<HttpApi> {
    /// A locked client configured from the environment.
    pub fn from_env() -> Self {
        Self::new(ClientConfig::from_env())
    }

    /// Unlock against the configured HTTP API.
    pub async fn unlock(&mut self, password: &str) -> Result<()> {
        self.unlock_with(password, |config, identity| {
            HttpApi::new(
                config.api_url.clone(),
                identity.signing_key().clone(),
                identity.user_id(),
            )
        })
        .await
    }
}
