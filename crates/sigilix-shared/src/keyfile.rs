//! Password-protected identity file.
//!
//! Layout on disk: `nonce (12) || AES-256-GCM(JSON)`. The file key is
//! `PBKDF2-HMAC-SHA256(password_hash, "salt", 4096)`, where `password_hash` is
//! SHA-256 iterated 100 times over the password. The salt is a fixed constant.

use std::fs;
use std::path::Path;

use aes_gcm::{
    aead::{Aead, KeyInit},
    Aes256Gcm, Nonce,
};
use rand::RngCore;
use serde::de::DeserializeOwned;
use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::constants::{KDF_ITERATIONS, KDF_SALT, NONCE_SIZE, PASSWORD_HASH_ROUNDS};
use crate::error::KeyFileError;

pub type FileKey = [u8; 32];

/// SHA-256 applied [`PASSWORD_HASH_ROUNDS`] times.
pub fn hash_password(password: &str) -> [u8; 32] {
    let mut digest: [u8; 32] = Sha256::digest(password.as_bytes()).into();
    for _ in 1..PASSWORD_HASH_ROUNDS {
        digest = Sha256::digest(digest).into();
    }
    digest
}

pub fn derive_file_key(password_hash: &[u8]) -> FileKey {
    let mut key = [0u8; 32];
    pbkdf2::pbkdf2_hmac::<Sha256>(password_hash, KDF_SALT, KDF_ITERATIONS, &mut key);
    key
}

// Returns nonce || ciphertext
pub fn seal(password_hash: &[u8], plaintext: &[u8]) -> Result<Vec<u8>, KeyFileError> {
    let key = derive_file_key(password_hash);
    let cipher = Aes256Gcm::new((&key).into());

    let mut nonce_bytes = [0u8; NONCE_SIZE];
    rand::rngs::OsRng.fill_bytes(&mut nonce_bytes);

    let ciphertext = cipher
        .encrypt(Nonce::from_slice(&nonce_bytes), plaintext)
        .map_err(|_| KeyFileError::EncryptionFailed)?;

    let mut output = Vec::with_capacity(NONCE_SIZE + ciphertext.len());
    output.extend_from_slice(&nonce_bytes);
    output.extend_from_slice(&ciphertext);
    Ok(output)
}

pub fn open(password_hash: &[u8], data: &[u8]) -> Result<Vec<u8>, KeyFileError> {
    if data.len() < NONCE_SIZE {
        return Err(KeyFileError::Truncated);
    }

    let (nonce_bytes, ciphertext) = data.split_at(NONCE_SIZE);
    let key = derive_file_key(password_hash);
    let cipher = Aes256Gcm::new((&key).into());

    cipher
        .decrypt(Nonce::from_slice(nonce_bytes), ciphertext)
        .map_err(|_| KeyFileError::DecryptionFailed)
}

/// Serialize `value` to JSON, encrypt it and write it to `path`.
pub fn write_encrypted<T: Serialize>(
    path: &Path,
    password_hash: &[u8],
    value: &T,
) -> Result<(), KeyFileError> {
    let json = serde_json::to_vec(value)?;
    let sealed = seal(password_hash, &json)?;
    fs::write(path, sealed)?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(path, fs::Permissions::from_mode(0o600))?;
    }

    Ok(())
}

pub fn read_encrypted<T: DeserializeOwned>(
    path: &Path,
    password_hash: &[u8],
) -> Result<T, KeyFileError> {
    let data = fs::read(path)?;
    let json = open(password_hash, &data)?;
    Ok(serde_json::from_slice(&json)?)
}

#[cfg(test)]
mod tests {
    use serde::Deserialize;

    use super::*;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Sample {
        user_id: u64,
        name: String,
    }

    #[test]
    fn test_password_hash_is_iterated() {
        let once: [u8; 32] = Sha256::digest(b"hunter2").into();
        let hashed = hash_password("hunter2");
        assert_ne!(hashed, once);
        assert_eq!(hashed, hash_password("hunter2"));
    }

    #[test]
    fn test_file_key_uses_fixed_salt() {
        let hash = hash_password("pw");
        assert_eq!(derive_file_key(&hash), derive_file_key(&hash));
        assert_ne!(derive_file_key(&hash), derive_file_key(&hash_password("pw2")));
    }

    #[test]
    fn test_seal_open_roundtrip() {
        let hash = hash_password("correct horse");
        let sealed = seal(&hash, b"identity json").unwrap();
        assert_eq!(sealed.len(), NONCE_SIZE + 13 + 16);
        assert_eq!(open(&hash, &sealed).unwrap(), b"identity json");
    }

    #[test]
    fn test_wrong_password_fails() {
        let sealed = seal(&hash_password("right"), b"secret").unwrap();
        assert!(matches!(
            open(&hash_password("wrong"), &sealed),
            Err(KeyFileError::DecryptionFailed)
        ));
    }

    #[test]
    fn test_truncated_file_fails() {
        assert!(matches!(
            open(&hash_password("x"), &[0u8; 5]),
            Err(KeyFileError::Truncated)
        ));
    }

    #[test]
    fn test_write_read_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        let hash = hash_password("pw");
        let sample = Sample {
            user_id: 7,
            name: "alice".into(),
        };

        write_encrypted(&path, &hash, &sample).unwrap();
        let raw = fs::read(&path).unwrap();
        assert!(!raw.windows(5).any(|w| w == b"alice"));

        let back: Sample = read_encrypted(&path, &hash).unwrap();
        assert_eq!(back, sample);
    }
}
