//! Cookie-backed request security state for `tower` services.
//!
//! [`CookieStateLayer`] reads the session, authentication and flash cookies of every request,
//! verifies them and inserts one [`RequestState`] into the request extensions before calling the
//! inner service.
//!
//! # Security
//! Cookie values are HS512-signed tokens with a mandatory expiry. Tokens signed with any other
//! algorithm are rejected. Session and authentication cookies can additionally be encrypted with
//! AES-256-GCM. A cookie that is missing, expired, tampered with or otherwise invalid is replaced by
//! an empty, unauthenticated default; verification failures are logged and never turned into
//! error responses.

mod claims;
pub mod codec;
mod config;
mod crypto;
mod error;
#[cfg(feature = "axum")]
mod extract;
pub mod format;
mod key;
pub mod layer;
mod reconstruct;
mod source;
mod state;
pub mod token;

pub use tower_cookies::cookie::SameSite;

pub use crate::claims::{AUTHENTICITY, DATA, FORM, TWO_FACTOR};
pub use crate::config::{
    CookieSettings, CookieStateConfig, DEFAULT_AUTHENTICATION_COOKIE_NAME,
    DEFAULT_FLASH_COOKIE_NAME, DEFAULT_SESSION_COOKIE_NAME, MAX_TTL,
};
pub use crate::error::{ConfigError, EncodeError, StateMissing, VerificationError};
pub use crate::key::{EncryptionKey, SigningKey};
pub use crate::layer::{CookieStateLayer, CookieStateService};
pub use crate::reconstruct::StateReconstructor;
pub use crate::source::CookieSource;
pub use crate::state::{Authentication, Flash, Form, RequestState, Session, Subject};
