//! Signing, verification and chunked RSA-OAEP encryption.
//!
//! Every byte layout here is shared with remote peers, so encodings are fixed:
//! signatures are raw `r || s`, signing keys are SEC1 points, encryption keys
//! are DER (SPKI public, PKCS#1 private).

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use p256::ecdsa::signature::hazmat::{PrehashSigner, PrehashVerifier};
use p256::ecdsa::Signature;
use rand::rngs::OsRng;
use rsa::pkcs1::{DecodeRsaPrivateKey, EncodeRsaPrivateKey};
use rsa::pkcs8::{DecodePublicKey, EncodePublicKey};
use rsa::traits::PublicKeyParts;
use rsa::Oaep;
use sha2::{Digest, Sha256};

use crate::constants::{
    CURVE_BYTE_SIZE, HASH_SIZE, RSA_KEY_BITS, SIGNATURE_SIZE, SIGNING_PRIVKEY_SIZE,
    SIGNING_PUBKEY_SIZE,
};
use crate::error::CryptoError;

pub use p256::ecdsa::{SigningKey, VerifyingKey};
pub use rsa::{RsaPrivateKey, RsaPublicKey};

pub fn hash(data: &[u8]) -> [u8; HASH_SIZE] {
    Sha256::digest(data).into()
}

// ---------------------------------------------------------------------------
// Signatures
// ---------------------------------------------------------------------------

/// Sign `SHA-256(data)` and return the fixed-width `r || s` encoding.
pub fn sign(key: &SigningKey, data: &[u8]) -> Result<[u8; SIGNATURE_SIZE], CryptoError> {
    let signature: Signature = key
        .sign_prehash(&hash(data))
        .map_err(|_| CryptoError::SigningFailed)?;

    let mut out = [0u8; SIGNATURE_SIZE];
    out.copy_from_slice(&signature.to_bytes());
    Ok(out)
}

/// Verify a raw `r || s` signature over `SHA-256(data)`.
///
/// Returns `Ok(false)` for a signature that does not match. A signature of the
/// wrong total length is a decode error, not a mismatch.
pub fn verify(key: &VerifyingKey, data: &[u8], signature: &[u8]) -> Result<bool, CryptoError> {
    if signature.len() != SIGNATURE_SIZE {
        return Err(CryptoError::InvalidSignatureLength {
            expected: SIGNATURE_SIZE,
            got: signature.len(),
        });
    }

    // Right length but r or s out of range: cannot have been produced by the key.
    let Ok(signature) = Signature::from_slice(signature) else {
        return Ok(false);
    };

    Ok(key.verify_prehash(&hash(data), &signature).is_ok())
}

// ---------------------------------------------------------------------------
// Signing key encoding
// ---------------------------------------------------------------------------

/// SEC1 uncompressed encoding (`0x04 || x || y`).
pub fn signing_public_key_to_bytes(key: &VerifyingKey) -> Vec<u8> {
    key.to_encoded_point(false).as_bytes().to_vec()
}

pub fn signing_public_key_from_bytes(bytes: &[u8]) -> Result<VerifyingKey, CryptoError> {
    if bytes.len() != SIGNING_PUBKEY_SIZE || bytes[0] != 0x04 {
        return Err(CryptoError::InvalidSigningPublicKey);
    }
    VerifyingKey::from_sec1_bytes(bytes).map_err(|_| CryptoError::InvalidSigningPublicKey)
}

/// Scalar (32 bytes, big-endian) followed by the uncompressed public point.
pub fn signing_private_key_to_bytes(key: &SigningKey) -> Vec<u8> {
    let mut out = Vec::with_capacity(SIGNING_PRIVKEY_SIZE);
    out.extend_from_slice(&key.to_bytes());
    out.extend_from_slice(&signing_public_key_to_bytes(key.verifying_key()));
    out
}

pub fn signing_private_key_from_bytes(bytes: &[u8]) -> Result<SigningKey, CryptoError> {
    if bytes.len() != SIGNING_PRIVKEY_SIZE {
        return Err(CryptoError::InvalidSigningPrivateKey);
    }
    let (scalar, point) = bytes.split_at(CURVE_BYTE_SIZE);

    let key = SigningKey::from_slice(scalar).map_err(|_| CryptoError::InvalidSigningPrivateKey)?;
    let stored_public = signing_public_key_from_bytes(point)?;

    if *key.verifying_key() != stored_public {
        return Err(CryptoError::InvalidSigningPrivateKey);
    }
    Ok(key)
}

// ---------------------------------------------------------------------------
// Encryption key encoding
// ---------------------------------------------------------------------------

pub fn generate_encryption_key() -> Result<RsaPrivateKey, CryptoError> {
    RsaPrivateKey::new(&mut OsRng, RSA_KEY_BITS).map_err(|e| CryptoError::KeyGeneration(e.to_string()))
}

/// DER SubjectPublicKeyInfo.
pub fn encryption_public_key_to_der(key: &RsaPublicKey) -> Result<Vec<u8>, CryptoError> {
    key.to_public_key_der()
        .map(|doc| doc.as_bytes().to_vec())
        .map_err(|e| CryptoError::InvalidEncryptionPublicKey(e.to_string()))
}

pub fn encryption_public_key_from_der(bytes: &[u8]) -> Result<RsaPublicKey, CryptoError> {
    RsaPublicKey::from_public_key_der(bytes)
        .map_err(|e| CryptoError::InvalidEncryptionPublicKey(e.to_string()))
}

/// DER PKCS#1.
pub fn encryption_private_key_to_der(key: &RsaPrivateKey) -> Result<Vec<u8>, CryptoError> {
    key.to_pkcs1_der()
        .map(|doc| doc.as_bytes().to_vec())
        .map_err(|e| CryptoError::InvalidEncryptionPrivateKey(e.to_string()))
}

pub fn encryption_private_key_from_der(bytes: &[u8]) -> Result<RsaPrivateKey, CryptoError> {
    RsaPrivateKey::from_pkcs1_der(bytes)
        .map_err(|e| CryptoError::InvalidEncryptionPrivateKey(e.to_string()))
}

// ---------------------------------------------------------------------------
// Chunked RSA-OAEP
// ---------------------------------------------------------------------------

/// Plaintext bytes per RSA block: one byte under the OAEP(SHA-256) bound of
/// `k - 2*hLen - 2`, which is what deployed peers produce.
pub fn plaintext_chunk_size(block_size: usize) -> usize {
    block_size.saturating_sub(2 * HASH_SIZE + 2 + 1)
}

/// Encrypt `plaintext` block by block; the output is a concatenation of
/// `key.size()`-byte OAEP blocks. Empty input yields empty output.
pub fn encrypt_chunked(key: &RsaPublicKey, plaintext: &[u8]) -> Result<Vec<u8>, CryptoError> {
    let block_size = key.size();
    let chunk_size = plaintext_chunk_size(block_size);
    if chunk_size == 0 {
        return Err(CryptoError::EncryptionFailed);
    }

    let mut rng = OsRng;
    let mut output = Vec::with_capacity(plaintext.len().div_ceil(chunk_size) * block_size);
    for chunk in plaintext.chunks(chunk_size) {
        let block = key
            .encrypt(&mut rng, Oaep::new::<Sha256>(), chunk)
            .map_err(|_| CryptoError::EncryptionFailed)?;
        output.extend_from_slice(&block);
    }
    Ok(output)
}

pub fn decrypt_chunked(key: &RsaPrivateKey, ciphertext: &[u8]) -> Result<Vec<u8>, CryptoError> {
    let block_size = key.size();
    if ciphertext.len() % block_size != 0 {
        return Err(CryptoError::InvalidCiphertextLength {
            len: ciphertext.len(),
            block: block_size,
        });
    }

    let mut output =
        Vec::with_capacity(ciphertext.len() / block_size * plaintext_chunk_size(block_size));
    for block in ciphertext.chunks(block_size) {
        let chunk = key
            .decrypt(Oaep::new::<Sha256>(), block)
            .map_err(|_| CryptoError::DecryptionFailed)?;
        output.extend_from_slice(&chunk);
    }
    Ok(output)
}

// ---------------------------------------------------------------------------
// Base64
// ---------------------------------------------------------------------------

pub fn base64_encode(data: &[u8]) -> String {
    STANDARD.encode(data)
}

pub fn base64_decode(data: &str) -> Result<Vec<u8>, CryptoError> {
    Ok(STANDARD.decode(data.trim())?)
}
