//! Request-scoped security state.

use std::collections::{BTreeMap, HashMap};

use rand::{Rng as _, distr::Alphanumeric};
use serde::{Deserialize, Serialize};
use time::{Duration, OffsetDateTime};

/// Length of generated authenticity tokens.
pub const AUTHENTICITY_TOKEN_LEN: usize = 32;

const FLASH_ERROR: &str = "error";
const FLASH_WARNING: &str = "warning";
const FLASH_SUCCESS: &str = "success";

/// Per-browser state carried across requests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    content: HashMap<String, String>,
    authenticity: String,
    expires: OffsetDateTime,
}

impl Session {
    pub(crate) fn new(
        content: HashMap<String, String>,
        authenticity: String,
        expires: OffsetDateTime,
    ) -> Self {
        Self {
            content,
            authenticity,
            expires,
        }
    }

    /// An empty session with a freshly generated authenticity token.
    pub(crate) fn fresh(ttl: Duration) -> Self {
        Self::new(
            HashMap::new(),
            generate_authenticity_token(),
            OffsetDateTime::now_utc() + ttl,
        )
    }

    pub fn content(&self) -> &HashMap<String, String> {
        &self.content
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.content.get(key).map(String::as_str)
    }

    pub fn put(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.content.insert(key.into(), value.into());
    }

    pub fn remove(&mut self, key: &str) -> Option<String> {
        self.content.remove(key)
    }

    pub fn clear(&mut self) {
        self.content.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }

    pub fn authenticity(&self) -> &str {
        &self.authenticity
    }

    /// Compare a submitted authenticity token against this session's token.
    pub fn authenticity_matches(&self, token: &str) -> bool {
        let expected = self.authenticity.as_bytes();
        let actual = token.as_bytes();
        expected.len() == actual.len()
            && expected
                .iter()
                .zip(actual)
                .fold(0u8, |acc, (a, b)| acc | (a ^ b))
                == 0
    }

    pub fn expires(&self) -> OffsetDateTime {
        self.expires
    }

    pub fn is_expired(&self) -> bool {
        self.expires <= OffsetDateTime::now_utc()
    }
}

/// Authentication claim of the current request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Authentication {
    expires: OffsetDateTime,
    authenticated_user: Option<String>,
    two_factor: bool,
}

impl Authentication {
    pub(crate) fn new(expires: OffsetDateTime, authenticated_user: String, two_factor: bool) -> Self {
        Self {
            expires,
            authenticated_user: Some(authenticated_user),
            two_factor,
        }
    }

    pub(crate) fn unauthenticated(ttl: Duration) -> Self {
        Self {
            expires: OffsetDateTime::now_utc() + ttl,
            authenticated_user: None,
            two_factor: false,
        }
    }

    pub fn authenticated_user(&self) -> Option<&str> {
        self.authenticated_user.as_deref()
    }

    pub fn is_authenticated(&self) -> bool {
        self.authenticated_user.is_some()
    }

    /// Only meaningful when a user is authenticated.
    pub fn two_factor(&self) -> bool {
        self.authenticated_user.is_some() && self.two_factor
    }

    pub fn expires(&self) -> OffsetDateTime {
        self.expires
    }

    /// Mark `user` as authenticated, e.g. after a successful credential check.
    pub fn login(&mut self, user: impl Into<String>, two_factor: bool) {
        self.authenticated_user = Some(user.into());
        self.two_factor = two_factor;
    }

    pub fn logout(&mut self) {
        self.authenticated_user = None;
        self.two_factor = false;
    }
}

/// Identity summary for authorization checks.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Subject {
    name: String,
    authenticated: bool,
}

impl Subject {
    #[must_use]
    pub fn anonymous() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn authenticated(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            authenticated: true,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_authenticated(&self) -> bool {
        self.authenticated
    }
}

/// One-shot data handed over from the previous request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Flash {
    content: HashMap<String, String>,
    discard: bool,
}

impl Flash {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Flash data read back from a verified cookie.
    pub(crate) fn from_cookie(content: HashMap<String, String>) -> Self {
        Self {
            content,
            discard: true,
        }
    }

    pub fn content(&self) -> &HashMap<String, String> {
        &self.content
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.content.get(key).map(String::as_str)
    }

    pub fn put(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.content.insert(key.into(), value.into());
    }

    pub fn set_error(&mut self, message: impl Into<String>) {
        self.put(FLASH_ERROR, message);
    }

    pub fn set_warning(&mut self, message: impl Into<String>) {
        self.put(FLASH_WARNING, message);
    }

    pub fn set_success(&mut self, message: impl Into<String>) {
        self.put(FLASH_SUCCESS, message);
    }

    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }

    /// `true` when this flash came from the request's cookie and has now been shown.
    ///
    /// Nothing clears the cookie automatically. The browser keeps sending it until it expires or
    /// a handler sends [`CookieStateConfig::removal_cookie`](crate::CookieStateConfig::removal_cookie)
    /// for the flash cookie name.
    pub fn is_discard(&self) -> bool {
        self.discard
    }
}

/// Snapshot of a submitted form, carried through a redirect inside the flash cookie.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Form {
    #[serde(default)]
    values: BTreeMap<String, String>,
    #[serde(default)]
    errors: BTreeMap<String, String>,
    #[serde(default)]
    keep: bool,
}

impl Form {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_value(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.values.insert(name.into(), value.into());
        self
    }

    #[must_use]
    pub fn with_error(mut self, name: impl Into<String>, message: impl Into<String>) -> Self {
        self.errors.insert(name.into(), message.into());
        self
    }

    /// Keep the snapshot so it is redisplayed after the next redirect.
    #[must_use]
    pub fn keep(mut self) -> Self {
        self.keep = true;
        self
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(String::as_str)
    }

    pub fn values(&self) -> &BTreeMap<String, String> {
        &self.values
    }

    pub fn error(&self, name: &str) -> Option<&str> {
        self.errors.get(name).map(String::as_str)
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    pub fn is_kept(&self) -> bool {
        self.keep
    }
}

/// Everything reconstructed from the inbound cookies of one request.
///
/// Inserted into the request extensions as a single value, so later stages see either all of it
/// or none of it.
#[derive(Debug, Clone)]
pub struct RequestState {
    pub session: Session,
    pub authentication: Authentication,
    pub subject: Subject,
    pub flash: Flash,
    pub form: Option<Form>,
}

fn generate_authenticity_token() -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(AUTHENTICITY_TOKEN_LEN)
        .map(char::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_session() {
        let session = Session::fresh(Duration::hours(1));

        assert!(session.is_empty());
        assert_eq!(session.authenticity().len(), AUTHENTICITY_TOKEN_LEN);
        assert!(session.authenticity().chars().all(|c| c.is_ascii_alphanumeric()));
        assert!(!session.is_expired());
        assert_ne!(
            session.authenticity(),
            Session::fresh(Duration::hours(1)).authenticity()
        );
    }

    #[test]
    fn authenticity_matches() {
        let session = Session::new(HashMap::new(), "abc123".into(), OffsetDateTime::now_utc());

        assert!(session.authenticity_matches("abc123"));
        assert!(!session.authenticity_matches("abc124"));
        assert!(!session.authenticity_matches("abc"));
        assert!(!session.authenticity_matches(""));
    }

    #[test]
    fn session_mutation() {
        let mut session = Session::fresh(Duration::hours(1));
        session.put("foo", "bar");
        assert_eq!(session.get("foo"), Some("bar"));
        assert_eq!(session.remove("foo"), Some("bar".to_string()));
        session.put("a", "b");
        session.clear();
        assert!(session.is_empty());
    }

    #[test]
    fn two_factor_requires_a_user() {
        let mut authentication = Authentication::unauthenticated(Duration::hours(1));
        assert!(!authentication.two_factor());

        authentication.login("foo", true);
        assert_eq!(authentication.authenticated_user(), Some("foo"));
        assert!(authentication.two_factor());

        authentication.logout();
        assert!(!authentication.is_authenticated());
        assert!(!authentication.two_factor());
    }

    #[test]
    fn flash_discard_flag() {
        assert!(!Flash::new().is_discard());

        let flash = Flash::from_cookie(HashMap::from([("msg".to_string(), "ok".to_string())]));
        assert!(flash.is_discard());
        assert_eq!(flash.get("msg"), Some("ok"));
    }

    #[test]
    fn flash_message_keys() {
        let mut flash = Flash::new();
        flash.set_error("bad");
        flash.set_success("good");
        assert_eq!(flash.get("error"), Some("bad"));
        assert_eq!(flash.get("success"), Some("good"));
        assert_eq!(flash.get("warning"), None);
    }
}
