//! Key material for signing and encrypting cookie tokens.

use std::{fmt, sync::Arc};

use rand::RngCore;
use sha2::{Digest, Sha256};

use crate::error::ConfigError;

/// Minimum HMAC key length for HS512 (the hash block output size).
pub const MIN_SIGNING_KEY_LEN: usize = 64;

/// AES-256 key size.
pub const ENCRYPTION_KEY_LEN: usize = 32;

/// HMAC key used to sign and verify cookie tokens.
#[derive(Clone, PartialEq, Eq)]
pub struct SigningKey(Arc<[u8]>);

impl SigningKey {
    /// Wrap raw key bytes.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::SigningKeyTooShort`] if fewer than [`MIN_SIGNING_KEY_LEN`] bytes
    /// are given.
    pub fn new(bytes: impl AsRef<[u8]>) -> Result<Self, ConfigError> {
        let bytes = bytes.as_ref();
        if bytes.len() < MIN_SIGNING_KEY_LEN {
            return Err(ConfigError::SigningKeyTooShort {
                min: MIN_SIGNING_KEY_LEN,
                actual: bytes.len(),
            });
        }
        Ok(Self(Arc::from(bytes)))
    }

    /// Generate a random key. Tokens signed with it do not survive a restart.
    #[must_use]
    pub fn generate() -> Self {
        let mut bytes = [0u8; MIN_SIGNING_KEY_LEN];
        rand::rng().fill_bytes(&mut bytes);
        Self(Arc::from(&bytes[..]))
    }

    pub(crate) fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Debug for SigningKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("SigningKey").field(&"..").finish()
    }
}

/// AES-256-GCM key used for encrypted cookie kinds.
#[derive(Clone, PartialEq, Eq)]
pub struct EncryptionKey([u8; ENCRYPTION_KEY_LEN]);

impl EncryptionKey {
    /// Use exactly [`ENCRYPTION_KEY_LEN`] raw bytes.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::EncryptionKeyLength`] on any other length.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, ConfigError> {
        let key: [u8; ENCRYPTION_KEY_LEN] =
            bytes.try_into().map_err(|_| ConfigError::EncryptionKeyLength {
                expected: ENCRYPTION_KEY_LEN,
                actual: bytes.len(),
            })?;
        Ok(Self(key))
    }

    /// Derive a key from a passphrase using SHA-256.
    #[must_use]
    pub fn derive_from(passphrase: &str) -> Self {
        let digest = Sha256::digest(passphrase.as_bytes());
        let mut key = [0u8; ENCRYPTION_KEY_LEN];
        key.copy_from_slice(&digest);
        Self(key)
    }

    #[must_use]
    pub fn generate() -> Self {
        let mut key = [0u8; ENCRYPTION_KEY_LEN];
        rand::rng().fill_bytes(&mut key);
        Self(key)
    }

    pub(crate) fn as_bytes(&self) -> &[u8; ENCRYPTION_KEY_LEN] {
        &self.0
    }
}

impl fmt::Debug for EncryptionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("EncryptionKey").field(&"..").finish()
    }
}
