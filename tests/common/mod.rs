#![allow(dead_code)]

// Shared helpers for integration tests.
//
// Cookies are minted with the crate's own outbound codec so tests exercise the same wire format
// that a response-writing stage would emit.
use std::convert::Infallible;

use axum::body::Body;
use http::{HeaderMap, Request, Response, header};
use http_body_util::BodyExt as _;
use serde_json::{Value, json};
use time::{Duration, OffsetDateTime};
use tower_cookie_state::{
    AUTHENTICITY, CookieSettings, CookieStateConfig, DATA, RequestState, SigningKey, codec,
    token::Claims,
};
use tower_cookies::Cookie;

pub fn sign_key() -> SigningKey {
    SigningKey::new([42u8; 64]).expect("key is long enough")
}

pub fn other_sign_key() -> SigningKey {
    SigningKey::new([24u8; 64]).expect("key is long enough")
}

pub fn config() -> CookieStateConfig {
    CookieStateConfig::new(sign_key()).with_secure(false)
}

pub fn in_one_hour() -> OffsetDateTime {
    OffsetDateTime::now_utc() + Duration::hours(1)
}

pub fn session_claims(data: Value) -> Claims {
    Claims::new(in_one_hour())
        .with_claim(DATA, data)
        .with_claim(AUTHENTICITY, "authenticity-from-cookie")
}

pub fn encode(claims: &Claims, settings: &CookieSettings) -> String {
    codec::encode_value(claims, settings).expect("cookie value encodes")
}

pub fn cookie_header(pairs: &[(&str, &str)]) -> String {
    // Build a `Cookie` request header from name/value pairs.
    pairs
        .iter()
        .map(|(name, value)| Cookie::new(*name, *value).encoded().to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

pub fn request(cookies: &[(&str, &str)]) -> Request<Body> {
    let mut builder = Request::builder().uri("/");
    if !cookies.is_empty() {
        builder = builder.header(header::COOKIE, cookie_header(cookies));
    }
    builder.body(Body::empty()).expect("request builds successfully")
}

pub async fn body_string(body: Body) -> String {
    // Collect an Axum body into a UTF-8 string for assertions.
    let bytes = body
        .collect()
        .await
        .expect("body collects successfully")
        .to_bytes();
    String::from_utf8_lossy(&bytes).into_owned()
}

pub async fn body_json(body: Body) -> Value {
    serde_json::from_str(&body_string(body).await).expect("body is json")
}

pub async fn state_handler(req: Request<Body>) -> Result<Response<Body>, Infallible> {
    // Echo the reconstructed state as JSON so tests can assert on every field.
    let state = req
        .extensions()
        .get::<RequestState>()
        .cloned()
        .expect("request includes RequestState extension");

    Ok(Response::new(Body::from(state_json(&state).to_string())))
}

pub fn state_json(state: &RequestState) -> Value {
    json!({
        "session": state.session.content(),
        "authenticity": state.session.authenticity(),
        "session_expires": state.session.expires().unix_timestamp(),
        "user": state.authentication.authenticated_user(),
        "two_factor": state.authentication.two_factor(),
        "subject": [state.subject.name(), state.subject.is_authenticated()],
        "flash": state.flash.content(),
        "discard": state.flash.is_discard(),
        "form": state.form.as_ref().map(|form| form.values().clone()),
    })
}

pub fn set_cookie_headers(headers: &HeaderMap) -> Vec<Cookie<'static>> {
    headers
        .get_all(header::SET_COOKIE)
        .iter()
        .map(|value| {
            let value = value.to_str().expect("set-cookie header is valid utf-8");
            Cookie::parse_encoded(value)
                .expect("set-cookie parses successfully")
                .into_owned()
        })
        .collect()
}
