//! Mapping between verified claims and the typed request state.

use std::collections::HashMap;

use serde_json::{Map, Value};
use time::OffsetDateTime;

use crate::{
    error::{EncodeError, VerificationError},
    format,
    state::{Authentication, Flash, Form, Session, Subject},
    token::Claims,
};

pub const DATA: &str = "data";
pub const AUTHENTICITY: &str = "authenticity";
pub const TWO_FACTOR: &str = "twoFactor";
pub const FORM: &str = "form";

pub(crate) fn session_from_claims(claims: &Claims) -> Result<Session, VerificationError> {
    let authenticity = match claims.get(AUTHENTICITY) {
        Some(Value::String(token)) if !token.trim().is_empty() => token.clone(),
        Some(_) => return Err(malformed(AUTHENTICITY, "expected a non-empty string")),
        None => {
            return Err(VerificationError::ExpiredOrMissingClaim(format!(
                "missing claim {AUTHENTICITY}"
            )));
        }
    };

    Ok(Session::new(
        copy_data(claims)?,
        authenticity,
        expires(claims)?,
    ))
}

pub(crate) fn authentication_from_claims(
    claims: &Claims,
) -> Result<(Authentication, Subject), VerificationError> {
    let user = claims
        .sub
        .clone()
        .filter(|sub| !sub.is_empty())
        .ok_or_else(|| VerificationError::ExpiredOrMissingClaim("missing claim sub".into()))?;

    let two_factor = match claims.get(TWO_FACTOR) {
        None | Some(Value::Null) => false,
        Some(Value::Bool(flag)) => *flag,
        Some(_) => return Err(malformed(TWO_FACTOR, "expected a boolean")),
    };

    let subject = Subject::authenticated(user.clone());
    Ok((
        Authentication::new(expires(claims)?, user, two_factor),
        subject,
    ))
}

pub(crate) fn flash_from_claims(
    claims: &Claims,
) -> Result<(Flash, Option<Form>), VerificationError> {
    let flash = Flash::from_cookie(copy_data(claims)?);

    let form = match claims.get(FORM) {
        None | Some(Value::Null) => None,
        Some(Value::String(payload)) => match format::decode_form(payload) {
            Ok(form) => Some(form),
            Err(err) => {
                tracing::debug!(err = %err, "dropping undecodable form snapshot");
                None
            }
        },
        Some(_) => {
            tracing::debug!("dropping form snapshot that is not a string");
            None
        }
    };

    Ok((flash, form))
}

pub(crate) fn session_claims(session: &Session) -> Claims {
    Claims::new(session.expires())
        .with_claim(DATA, data_value(session.content()))
        .with_claim(AUTHENTICITY, session.authenticity())
}

pub(crate) fn authentication_claims(
    authentication: &Authentication,
) -> Result<Claims, EncodeError> {
    let user = authentication
        .authenticated_user()
        .ok_or(EncodeError::Unauthenticated)?;

    Ok(Claims::new(authentication.expires())
        .with_subject(user)
        .with_claim(TWO_FACTOR, authentication.two_factor()))
}

pub(crate) fn flash_claims(
    flash: &Flash,
    form: Option<&Form>,
    expires: OffsetDateTime,
) -> Result<Claims, EncodeError> {
    let mut claims = Claims::new(expires).with_claim(DATA, data_value(flash.content()));
    if let Some(form) = form {
        claims = claims.with_claim(FORM, format::encode_form(form)?);
    }
    Ok(claims)
}

/// Copy the `data` claim into a new map. A missing claim is an empty map.
fn copy_data(claims: &Claims) -> Result<HashMap<String, String>, VerificationError> {
    let object = match claims.get(DATA) {
        None | Some(Value::Null) => return Ok(HashMap::new()),
        Some(Value::Object(object)) => object,
        Some(_) => return Err(malformed(DATA, "expected an object")),
    };

    object
        .iter()
        .map(|(key, value)| match value {
            Value::String(value) => Ok((key.clone(), value.clone())),
            _ => Err(malformed(DATA, "expected string values")),
        })
        .collect()
}

fn data_value(content: &HashMap<String, String>) -> Value {
    Value::Object(
        content
            .iter()
            .map(|(key, value)| (key.clone(), Value::String(value.clone())))
            .collect::<Map<_, _>>(),
    )
}

fn expires(claims: &Claims) -> Result<OffsetDateTime, VerificationError> {
    OffsetDateTime::from_unix_timestamp(claims.exp).map_err(|err| malformed("exp", err))
}

fn malformed(claim: &str, reason: impl std::fmt::Display) -> VerificationError {
    VerificationError::Malformed(format!("claim {claim}: {reason}"))
}
