//! AES-256-GCM wrapping for encrypted cookie kinds.
//!
//! The output is `base64url(nonce || ciphertext || tag)` without padding so it can be placed in
//! a cookie value without further encoding.

use aes_gcm::{Aes256Gcm, KeyInit, Nonce, aead::Aead};
use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use rand::RngCore;

use crate::{
    error::{EncodeError, VerificationError},
    key::EncryptionKey,
};

const NONCE_SIZE: usize = 12;
const TAG_SIZE: usize = 16;

pub(crate) fn encrypt(plaintext: &str, key: &EncryptionKey) -> Result<String, EncodeError> {
    let cipher = Aes256Gcm::new_from_slice(key.as_bytes())
        .map_err(|err| EncodeError::Encrypt(format!("key init failed: {err}")))?;

    let mut nonce_bytes = [0u8; NONCE_SIZE];
    rand::rng().fill_bytes(&mut nonce_bytes);
    let nonce = Nonce::from_slice(&nonce_bytes);

    let ciphertext = cipher
        .encrypt(nonce, plaintext.as_bytes())
        .map_err(|err| EncodeError::Encrypt(err.to_string()))?;

    let mut combined = Vec::with_capacity(NONCE_SIZE + ciphertext.len());
    combined.extend_from_slice(&nonce_bytes);
    combined.extend_from_slice(&ciphertext);

    Ok(URL_SAFE_NO_PAD.encode(combined))
}

pub(crate) fn decrypt(value: &str, key: &EncryptionKey) -> Result<String, VerificationError> {
    let combined = URL_SAFE_NO_PAD
        .decode(value.as_bytes())
        .map_err(|err| VerificationError::DecryptionFailed(format!("base64: {err}")))?;

    if combined.len() < NONCE_SIZE + TAG_SIZE {
        return Err(VerificationError::DecryptionFailed(
            "ciphertext too short".into(),
        ));
    }

    let cipher = Aes256Gcm::new_from_slice(key.as_bytes())
        .map_err(|err| VerificationError::DecryptionFailed(format!("key init failed: {err}")))?;

    let (nonce, ciphertext) = combined.split_at(NONCE_SIZE);
    let plaintext = cipher
        .decrypt(Nonce::from_slice(nonce), ciphertext)
        .map_err(|_| VerificationError::DecryptionFailed("authentication tag mismatch".into()))?;

    String::from_utf8(plaintext)
        .map_err(|err| VerificationError::DecryptionFailed(format!("utf-8: {err}")))
}
