use p256::ecdsa::{SigningKey, VerifyingKey};
use rand::rngs::OsRng;
use rsa::{RsaPrivateKey, RsaPublicKey};
use serde::{Deserialize, Serialize};

use crate::constants::SIGNATURE_SIZE;
use crate::crypto;
use crate::error::{CryptoError, IdentityError};
use crate::types::{Base64Bytes, UserId};

/// A user's long-term identity: a P-256 signing key and the "initial"
/// RSA-2048 encryption key used for every new chat until rotated.
#[derive(Clone)]
pub struct Identity {
    signing_key: SigningKey,
    encryption_key: RsaPrivateKey,
}

/// Serializable key material. Field names are the historical on-disk ones.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdentityExport {
    /// PKCS#1 DER
    #[serde(rename = "initial_rsa_rivate_key")]
    pub encryption_key: Base64Bytes,
    /// Scalar followed by the uncompressed public point
    #[serde(rename = "initial_ecdsa_private_key")]
    pub signing_key: Base64Bytes,
}

impl Identity {
    /// Generate a fresh identity. Only fails when key generation itself fails.
    pub fn generate() -> Result<Self, IdentityError> {
        let signing_key = SigningKey::random(&mut OsRng);
        let encryption_key = crypto::generate_encryption_key()
            .map_err(|e| IdentityError::GenerationFailed(e.to_string()))?;
        Ok(Self {
            signing_key,
            encryption_key,
        })
    }

    pub fn from_keys(signing_key: SigningKey, encryption_key: RsaPrivateKey) -> Self {
        Self {
            signing_key,
            encryption_key,
        }
    }

    /// Restore an identity from its serialized key material.
    pub fn from_export(export: &IdentityExport) -> Result<Self, IdentityError> {
        let signing_key = crypto::signing_private_key_from_bytes(&export.signing_key)?;
        let encryption_key = crypto::encryption_private_key_from_der(&export.encryption_key)?;
        Ok(Self::from_keys(signing_key, encryption_key))
    }

    pub fn to_export(&self) -> Result<IdentityExport, IdentityError> {
        Ok(IdentityExport {
            encryption_key: crypto::encryption_private_key_to_der(&self.encryption_key)?.into(),
            signing_key: crypto::signing_private_key_to_bytes(&self.signing_key).into(),
        })
    }

    pub fn user_id(&self) -> UserId {
        derive_user_id(self.signing_key.verifying_key())
    }

    pub fn signing_key(&self) -> &SigningKey {
        &self.signing_key
    }

    pub fn verifying_key(&self) -> &VerifyingKey {
        self.signing_key.verifying_key()
    }

    /// SEC1 uncompressed signing public key.
    pub fn signing_public_key_bytes(&self) -> Vec<u8> {
        crypto::signing_public_key_to_bytes(self.signing_key.verifying_key())
    }

    pub fn encryption_key(&self) -> &RsaPrivateKey {
        &self.encryption_key
    }

    pub fn encryption_public_key(&self) -> RsaPublicKey {
        self.encryption_key.to_public_key()
    }

    /// DER SubjectPublicKeyInfo of the initial encryption key.
    pub fn encryption_public_key_der(&self) -> Result<Vec<u8>, CryptoError> {
        crypto::encryption_public_key_to_der(&self.encryption_public_key())
    }

    /// PKCS#1 DER of the initial encryption key, as stored per chat.
    pub fn encryption_private_key_der(&self) -> Result<Vec<u8>, CryptoError> {
        crypto::encryption_private_key_to_der(&self.encryption_key)
    }

    pub fn sign(&self, data: &[u8]) -> Result<[u8; SIGNATURE_SIZE], CryptoError> {
        crypto::sign(&self.signing_key, data)
    }
}

/// User id of a signing public key: the first four bytes of
/// `SHA-256(sec1_uncompressed(key))`, big-endian, zero-extended to 64 bits.
pub fn derive_user_id(key: &VerifyingKey) -> UserId {
    user_id_from_public_key_bytes(&crypto::signing_public_key_to_bytes(key))
}

/// Same derivation over already serialized public key bytes.
pub fn user_id_from_public_key_bytes(bytes: &[u8]) -> UserId {
    let digest = crypto::hash(bytes);
    let prefix = [digest[0], digest[1], digest[2], digest[3]];
    UserId(u64::from(u32::from_be_bytes(prefix)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::tests::test_rsa_key;

    fn test_identity() -> Identity {
        Identity::from_keys(SigningKey::random(&mut OsRng), test_rsa_key().clone())
    }

    #[test]
    fn test_user_id_known_vector() {
        // SHA-256("") = e3b0c442...
        assert_eq!(user_id_from_public_key_bytes(b""), UserId(0xe3b0_c442));
    }

    #[test]
    fn test_user_id_deterministic_and_32_bit() {
        let id = test_identity();
        assert_eq!(id.user_id(), derive_user_id(id.verifying_key()));
        assert_eq!(
            id.user_id(),
            user_id_from_public_key_bytes(&id.signing_public_key_bytes())
        );
        assert!(id.user_id().0 <= u64::from(u32::MAX));
    }

    #[test]
    fn test_distinct_keys_distinct_ids() {
        let ids: std::collections::HashSet<_> = (0..16)
            .map(|_| derive_user_id(SigningKey::random(&mut OsRng).verifying_key()))
            .collect();
        assert_eq!(ids.len(), 16);
    }

    #[test]
    fn test_identity_export_roundtrip() {
        let id = test_identity();
        let export = id.to_export().unwrap();
        assert_eq!(export.signing_key.len(), 97);

        let restored = Identity::from_export(&export).unwrap();
        assert_eq!(restored.user_id(), id.user_id());
        assert_eq!(restored.encryption_key(), id.encryption_key());
    }

    #[test]
    fn test_corrupt_export_is_an_error() {
        let mut export = test_identity().to_export().unwrap();
        export.signing_key.0.truncate(40);
        assert!(Identity::from_export(&export).is_err());

        let mut export = test_identity().to_export().unwrap();
        export.encryption_key.0[5] ^= 0xff;
        assert!(Identity::from_export(&export).is_err());
    }

    #[test]
    fn test_sign_with_identity() {
        let id = test_identity();
        let signature = id.sign(b"Hello, Sigilix!").unwrap();
        assert!(crypto::verify(id.verifying_key(), b"Hello, Sigilix!", &signature).unwrap());
    }
}
