//! The decrypted content of the identity file.

use std::path::Path;

use serde::{Deserialize, Serialize};

use sigilix_shared::keyfile;
use sigilix_shared::types::{Base64Bytes, UserId};
use sigilix_shared::{Identity, IdentityExport};

use crate::error::{ClientError, Result};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Profile {
    pub user_id: UserId,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub search_by_username: bool,
    #[serde(flatten)]
    pub keys: IdentityExport,
    /// Iterated SHA-256 of the password, also the database key.
    #[serde(rename = "pasword_hash")]
    pub password_hash: Base64Bytes,
}

impl Profile {
    pub fn new(identity: &Identity, password_hash: [u8; 32]) -> Result<Self> {
        Ok(Self {
            user_id: identity.user_id(),
            username: String::new(),
            search_by_username: false,
            keys: identity.to_export()?,
            password_hash: password_hash.to_vec().into(),
        })
    }

    pub fn load(path: &Path, password_hash: &[u8; 32]) -> Result<Self> {
        Ok(keyfile::read_encrypted(path, password_hash)?)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        keyfile::write_encrypted(path, &self.password_hash, self)?;
        Ok(())
    }

    pub fn identity(&self) -> Result<Identity> {
        Ok(Identity::from_export(&self.keys)?)
    }

    /// The database key: the stored password hash.
    pub fn db_key(&self) -> Result<[u8; 32]> {
        <[u8; 32]>::try_from(self.password_hash.0.as_slice())
            .map_err(|_| ClientError::MalformedPasswordHash(self.password_hash.len()))
    }
}
