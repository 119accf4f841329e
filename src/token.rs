//! Signed claim tokens carried in cookie values.
//!
//! Tokens are compact JWS values signed with HMAC-SHA-512. HS512 is the only accepted algorithm:
//! a token whose header names anything else is rejected before its claims are read.

use jsonwebtoken::{
    Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode, errors::ErrorKind,
};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use time::OffsetDateTime;

use crate::{
    error::{EncodeError, VerificationError},
    key::SigningKey,
};

pub const ALGORITHM: Algorithm = Algorithm::HS512;

/// Verified claim set.
///
/// `exp` is always present. Claims other than `exp` and `sub` are kept in `extra`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claims {
    pub exp: i64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub: Option<String>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Claims {
    #[must_use]
    pub fn new(expires: OffsetDateTime) -> Self {
        Self {
            exp: expires.unix_timestamp(),
            sub: None,
            extra: Map::new(),
        }
    }

    #[must_use]
    pub fn with_subject(mut self, subject: impl Into<String>) -> Self {
        self.sub = Some(subject.into());
        self
    }

    #[must_use]
    pub fn with_claim(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.extra.insert(name.into(), value.into());
        self
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.extra.get(name)
    }
}

/// Payload as it arrives, before the mandatory claims are checked.
#[derive(Deserialize)]
struct UnverifiedClaims {
    #[serde(default)]
    exp: Option<i64>,

    #[serde(default)]
    sub: Option<String>,

    #[serde(flatten)]
    extra: Map<String, Value>,
}

/// Sign a claim set with HS512.
pub fn sign(claims: &Claims, key: &SigningKey) -> Result<String, EncodeError> {
    encode(
        &Header::new(ALGORITHM),
        claims,
        &EncodingKey::from_secret(key.as_bytes()),
    )
    .map_err(|err| EncodeError::Sign(err.to_string()))
}

/// Verify a token's signature and mandatory claims.
///
/// `exp` is always required and must lie strictly in the future. When `require_subject` is set a
/// non-empty `sub` claim is required as well.
pub fn verify(
    token: &str,
    key: &SigningKey,
    require_subject: bool,
) -> Result<Claims, VerificationError> {
    let mut validation = Validation::new(ALGORITHM);
    validation.leeway = 0;
    validation.validate_exp = true;
    if require_subject {
        validation.set_required_spec_claims(&["exp", "sub"]);
    } else {
        validation.set_required_spec_claims(&["exp"]);
    }

    let data =
        decode::<UnverifiedClaims>(token, &DecodingKey::from_secret(key.as_bytes()), &validation)
            .map_err(|err| classify(err.kind()))?;
    let UnverifiedClaims { exp, sub, extra } = data.claims;
    let exp = exp.ok_or_else(|| {
        VerificationError::ExpiredOrMissingClaim("missing claim exp".into())
    })?;
    let claims = Claims { exp, sub, extra };

    if claims.exp <= OffsetDateTime::now_utc().unix_timestamp() {
        return Err(VerificationError::ExpiredOrMissingClaim(
            "token has expired".into(),
        ));
    }

    if require_subject && claims.sub.as_deref().is_none_or(str::is_empty) {
        return Err(VerificationError::ExpiredOrMissingClaim(
            "subject is empty".into(),
        ));
    }

    Ok(claims)
}

fn classify(kind: &ErrorKind) -> VerificationError {
    match kind {
        ErrorKind::InvalidSignature => VerificationError::SignatureInvalid("mac mismatch".into()),
        ErrorKind::InvalidAlgorithm => {
            VerificationError::SignatureInvalid("algorithm not allowed".into())
        }
        ErrorKind::ExpiredSignature => {
            VerificationError::ExpiredOrMissingClaim("token has expired".into())
        }
        ErrorKind::MissingRequiredClaim(claim) => {
            VerificationError::ExpiredOrMissingClaim(format!("missing claim {claim}"))
        }
        other => VerificationError::Malformed(format!("{other:?}")),
    }
}

#[cfg(test)]
mod tests {
    use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
    use time::Duration;

    use super::*;

    fn key() -> SigningKey {
        SigningKey::new([7u8; 64]).expect("key is long enough")
    }

    fn in_one_hour() -> OffsetDateTime {
        OffsetDateTime::now_utc() + Duration::hours(1)
    }

    #[test]
    fn signed_claims_verify() {
        let claims = Claims::new(in_one_hour())
            .with_subject("foo")
            .with_claim("twoFactor", true);
        let token = sign(&claims, &key()).expect("sign succeeds");

        let verified = verify(&token, &key(), true).expect("token verifies");
        assert_eq!(verified, claims);
    }

    #[test]
    fn wrong_key_is_signature_failure() {
        let token = sign(&Claims::new(in_one_hour()), &key()).expect("sign succeeds");
        let other = SigningKey::new([8u8; 64]).expect("key is long enough");

        assert!(matches!(
            verify(&token, &other, false),
            Err(VerificationError::SignatureInvalid(_))
        ));
    }

    #[test]
    fn hs256_is_rejected_even_with_the_right_key() {
        let claims = Claims::new(in_one_hour());
        let token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(key().as_bytes()),
        )
        .expect("encode succeeds");

        assert!(matches!(
            verify(&token, &key(), false),
            Err(VerificationError::SignatureInvalid(_))
        ));
    }

    #[test]
    fn unsigned_token_is_rejected() {
        let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"none","typ":"JWT"}"#);
        let payload = URL_SAFE_NO_PAD.encode(
            format!(r#"{{"exp":{}}}"#, in_one_hour().unix_timestamp()).as_bytes(),
        );
        let token = format!("{header}.{payload}.");

        assert!(verify(&token, &key(), false).is_err());
    }

    #[test]
    fn expired_token_is_rejected() {
        let claims = Claims::new(OffsetDateTime::now_utc() - Duration::seconds(5));
        let token = sign(&claims, &key()).expect("sign succeeds");

        assert!(matches!(
            verify(&token, &key(), false),
            Err(VerificationError::ExpiredOrMissingClaim(_))
        ));
    }

    #[test]
    fn missing_expiry_is_rejected() {
        #[derive(Serialize)]
        struct NoExp {
            sub: &'static str,
        }
        let token = encode(
            &Header::new(ALGORITHM),
            &NoExp { sub: "foo" },
            &EncodingKey::from_secret(key().as_bytes()),
        )
        .expect("encode succeeds");

        assert!(matches!(
            verify(&token, &key(), false),
            Err(VerificationError::ExpiredOrMissingClaim(_))
        ));
    }

    #[test]
    fn missing_expiry_with_subject_required() {
        let token = encode(
            &Header::new(ALGORITHM),
            &serde_json::json!({ "sub": "foo", "data": {} }),
            &EncodingKey::from_secret(key().as_bytes()),
        )
        .expect("encode succeeds");

        assert!(matches!(
            verify(&token, &key(), true),
            Err(VerificationError::ExpiredOrMissingClaim(_))
        ));
    }

    #[test]
    fn subject_requirement() {
        let token = sign(&Claims::new(in_one_hour()), &key()).expect("sign succeeds");
        assert!(verify(&token, &key(), false).is_ok());
        assert!(matches!(
            verify(&token, &key(), true),
            Err(VerificationError::ExpiredOrMissingClaim(_))
        ));

        let empty = sign(&Claims::new(in_one_hour()).with_subject(""), &key())
            .expect("sign succeeds");
        assert!(verify(&empty, &key(), true).is_err());
    }

    #[test]
    fn garbage_is_malformed() {
        assert!(matches!(
            verify("not-a-token", &key(), false),
            Err(VerificationError::Malformed(_))
        ));
    }
}
