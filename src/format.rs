//! Helpers for encoding/decoding the form snapshot carried in flash cookies.
//!
//! This is primarily useful for testing and debugging.
//!
//! Note: the on-wire format is versioned, but it is still considered an implementation detail and
//! may evolve.

use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use serde::{Deserialize, Serialize};

use crate::{
    error::{EncodeError, VerificationError},
    state::Form,
};

const VERSION: u8 = 1;

#[derive(Debug, Serialize, Deserialize)]
struct Envelope {
    v: u8,
    form: Form,
}

/// Encode a [`Form`] into the `form` claim value.
pub fn encode_form(form: &Form) -> Result<String, EncodeError> {
    let envelope = Envelope {
        v: VERSION,
        form: form.clone(),
    };

    let bytes = serde_json::to_vec(&envelope).map_err(|err| EncodeError::Form(err.to_string()))?;

    Ok(URL_SAFE_NO_PAD.encode(bytes))
}

/// Decode a `form` claim value into a [`Form`].
pub fn decode_form(value: &str) -> Result<Form, VerificationError> {
    let bytes = URL_SAFE_NO_PAD
        .decode(value.as_bytes())
        .map_err(|err| VerificationError::Malformed(err.to_string()))?;

    let envelope: Envelope = serde_json::from_slice(&bytes)
        .map_err(|err| VerificationError::Malformed(err.to_string()))?;

    if envelope.v != VERSION {
        return Err(VerificationError::Malformed(format!(
            "Unsupported form snapshot version: {}",
            envelope.v
        )));
    }

    Ok(envelope.form)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_version_is_rejected() {
        let bytes = serde_json::to_vec(&serde_json::json!({ "v": 9, "form": {} }))
            .expect("json serializes");
        let value = URL_SAFE_NO_PAD.encode(bytes);

        assert!(decode_form(&value).is_err());
    }

    #[test]
    fn snapshot_survives_encoding() {
        let form = Form::new()
            .with_value("email", "foo@example.com")
            .with_error("password", "too short");

        let decoded = decode_form(&encode_form(&form).expect("form encodes"))
            .expect("form decodes");

        assert_eq!(decoded.get("email"), Some("foo@example.com"));
        assert_eq!(decoded.error("password"), Some("too short"));
        assert!(!decoded.is_kept());
    }
}
