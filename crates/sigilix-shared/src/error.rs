use thiserror::Error;

#[derive(Error, Debug)]
pub enum SigilixError {
    #[error("Crypto error: {0}")]
    Crypto(#[from] CryptoError),

    #[error("Identity error: {0}")]
    Identity(#[from] IdentityError),

    #[error("Protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    #[error("Key file error: {0}")]
    KeyFile(#[from] KeyFileError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Error, Debug)]
pub enum CryptoError {
    #[error("Signing failed")]
    SigningFailed,

    #[error("Key generation failed: {0}")]
    KeyGeneration(String),

    #[error("Encryption failed")]
    EncryptionFailed,

    #[error("Decryption failed: invalid ciphertext or wrong key")]
    DecryptionFailed,

    #[error("Invalid signature length: expected {expected} bytes, got {got}")]
    InvalidSignatureLength { expected: usize, got: usize },

    #[error("Invalid ciphertext length: {len} is not a multiple of {block}")]
    InvalidCiphertextLength { len: usize, block: usize },

    #[error("Invalid signing public key")]
    InvalidSigningPublicKey,

    #[error("Invalid signing private key")]
    InvalidSigningPrivateKey,

    #[error("Invalid encryption public key: {0}")]
    InvalidEncryptionPublicKey(String),

    #[error("Invalid encryption private key: {0}")]
    InvalidEncryptionPrivateKey(String),

    #[error("Base64 decode error: {0}")]
    Base64(#[from] base64::DecodeError),
}

#[derive(Error, Debug)]
pub enum IdentityError {
    #[error("Failed to generate keypair: {0}")]
    GenerationFailed(String),

    #[error("Invalid key material: {0}")]
    InvalidKey(#[from] CryptoError),
}

#[derive(Error, Debug)]
pub enum ProtocolError {
    #[error("Unknown notification type: {0}")]
    UnknownNotificationType(String),

    #[error("Malformed {kind} notification: {source}")]
    MalformedNotification {
        kind: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

#[derive(Error, Debug)]
pub enum KeyFileError {
    #[error("Identity file is truncated")]
    Truncated,

    #[error("Identity file could not be decrypted: wrong password or corrupted file")]
    DecryptionFailed,

    #[error("Identity file encryption failed")]
    EncryptionFailed,

    #[error("Identity file contents are invalid: {0}")]
    InvalidContents(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
