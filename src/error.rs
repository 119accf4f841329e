use thiserror::Error;

/// Reasons a cookie token was not accepted.
///
/// Every variant is handled the same way by the reconstructor: the failure is logged and the
/// cookie is treated as if it were absent.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VerificationError {
    #[error("malformed token: {0}")]
    Malformed(String),

    #[error("invalid signature: {0}")]
    SignatureInvalid(String),

    #[error("decryption failed: {0}")]
    DecryptionFailed(String),

    #[error("expired or missing required claim: {0}")]
    ExpiredOrMissingClaim(String),
}

/// Errors raised while producing outgoing cookie values.
#[derive(Debug, Error)]
pub enum EncodeError {
    #[error("failed to sign token: {0}")]
    Sign(String),

    #[error("failed to encrypt token: {0}")]
    Encrypt(String),

    #[error("failed to serialize form: {0}")]
    Form(String),

    #[error("authentication has no authenticated user")]
    Unauthenticated,
}

/// Missing or invalid configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} is required")]
    Missing(&'static str),

    #[error("{name}: {reason}")]
    Invalid { name: String, reason: String },

    #[error("signing key must be at least {min} bytes, got {actual}")]
    SigningKeyTooShort { min: usize, actual: usize },

    #[error("encryption key must be exactly {expected} bytes, got {actual}")]
    EncryptionKeyLength { expected: usize, actual: usize },
}

/// Rejection returned by the extractors when the request was not routed through
/// [`CookieStateLayer`](crate::CookieStateLayer).
#[derive(Debug, Clone, Copy, Error)]
#[error("request state is missing; is CookieStateLayer installed?")]
pub struct StateMissing;
