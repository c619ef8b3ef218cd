//! # sigilix-shared
//!
//! Protocol primitives shared by the Sigilix client crates: identifiers,
//! the long-term identity, the signing/encryption codec, JSON wire types and
//! the password-protected identity file.

pub mod constants;
pub mod crypto;
pub mod error;
pub mod identity;
pub mod keyfile;
pub mod protocol;
pub mod types;

pub use error::{CryptoError, IdentityError, KeyFileError, ProtocolError, SigilixError};
pub use identity::{derive_user_id, Identity, IdentityExport};
pub use types::{Base64Bytes, ChatId, ChatRole, MessageId, UserId};
