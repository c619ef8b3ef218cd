/// Application name
pub const APP_NAME: &str = "Sigilix";

/// P-256 field/scalar size in bytes (`ceil(256 / 8)`)
pub const CURVE_BYTE_SIZE: usize = 32;

/// Raw ECDSA signature size: `r || s`, both fixed-width big-endian
pub const SIGNATURE_SIZE: usize = 2 * CURVE_BYTE_SIZE;

/// SEC1 uncompressed point size: `0x04 || x || y`
pub const SIGNING_PUBKEY_SIZE: usize = 1 + 2 * CURVE_BYTE_SIZE;

/// Serialized signing private key: scalar followed by the uncompressed point
pub const SIGNING_PRIVKEY_SIZE: usize = CURVE_BYTE_SIZE + SIGNING_PUBKEY_SIZE;

/// RSA modulus size for identity and per-chat encryption keys
pub const RSA_KEY_BITS: usize = 2048;

/// SHA-256 output size in bytes
pub const HASH_SIZE: usize = 32;

/// AES-GCM nonce size in bytes
pub const NONCE_SIZE: usize = 12;

/// Number of SHA-256 rounds applied to the password before it is used
pub const PASSWORD_HASH_ROUNDS: usize = 100;

/// PBKDF2 iterations for the identity file key
pub const KDF_ITERATIONS: u32 = 4096;

/// PBKDF2 salt for the identity file key. Fixed for on-disk compatibility.
pub const KDF_SALT: &[u8] = b"salt";

/// Request signature header
pub const HEADER_SIGNATURE: &str = "X-Sigilix-Signature";

/// Request user id header
pub const HEADER_USER_ID: &str = "X-Sigilix-User-Id";

/// Default notification batch size per pull
pub const DEFAULT_NOTIFICATION_LIMIT: u32 = 100;
