//! Cookie values in and out: lookup, decrypt-then-verify, sign-then-encrypt.

use time::OffsetDateTime;
use tower_cookies::Cookie;

use crate::{
    claims,
    config::{CookieSettings, CookieStateConfig},
    crypto,
    error::{EncodeError, VerificationError},
    key::EncryptionKey,
    source::CookieSource,
    state::{Authentication, Flash, Form, Session},
    token::{self, Claims},
};

/// Legacy value some clients send instead of omitting the cookie.
pub const ABSENT_MARKER: &str = "null";

/// Look up the value of cookie `name`.
///
/// Missing cookies, a missing cookie source, blank values and [`ABSENT_MARKER`] all yield `None`.
pub fn extract<S: CookieSource + ?Sized>(cookies: Option<&S>, name: &str) -> Option<String> {
    cookies?
        .get(name)
        .filter(|value| !value.trim().is_empty() && value != ABSENT_MARKER)
}

/// Decrypt (when `encryption_key` is set) and verify a cookie value.
pub fn decode_value(
    value: &str,
    settings: &CookieSettings,
    encryption_key: Option<&EncryptionKey>,
    require_subject: bool,
) -> Result<Claims, VerificationError> {
    match encryption_key {
        Some(key) => {
            let token = crypto::decrypt(value, key)?;
            token::verify(&token, &settings.sign_key, require_subject)
        }
        None => token::verify(value, &settings.sign_key, require_subject),
    }
}

/// Sign `claims` and encrypt the token if the cookie kind is encrypted.
pub fn encode_value(claims: &Claims, settings: &CookieSettings) -> Result<String, EncodeError> {
    let token = token::sign(claims, &settings.sign_key)?;
    match &settings.encryption_key {
        Some(key) => crypto::encrypt(&token, key),
        None => Ok(token),
    }
}

/// Build the `Set-Cookie` value that carries `session`.
pub fn session_cookie(
    config: &CookieStateConfig,
    session: &Session,
) -> Result<Cookie<'static>, EncodeError> {
    let value = encode_value(&claims::session_claims(session), &config.session)?;
    Ok(config.build_cookie(config.session.name.clone(), value, session.expires()))
}

/// Build the `Set-Cookie` value that carries an authenticated user.
///
/// # Errors
///
/// Returns [`EncodeError::Unauthenticated`] when no user is authenticated; use
/// [`CookieStateConfig::removal_cookie`] to clear the cookie instead.
pub fn authentication_cookie(
    config: &CookieStateConfig,
    authentication: &Authentication,
) -> Result<Cookie<'static>, EncodeError> {
    let claims = claims::authentication_claims(authentication)?;
    let value = encode_value(&claims, &config.authentication)?;
    Ok(config.build_cookie(
        config.authentication.name.clone(),
        value,
        authentication.expires(),
    ))
}

/// Build the `Set-Cookie` value for flash data and an optional form snapshot.
pub fn flash_cookie(
    config: &CookieStateConfig,
    flash: &Flash,
    form: Option<&Form>,
) -> Result<Cookie<'static>, EncodeError> {
    let expires = OffsetDateTime::now_utc() + config.flash.ttl();
    let claims = claims::flash_claims(flash, form, expires)?;
    let value = encode_value(&claims, &config.flash)?;
    Ok(config.build_cookie(config.flash.name.clone(), value, expires))
}
