use std::borrow::Cow;

use time::{Duration, OffsetDateTime};
use tower_cookies::Cookie;

use crate::{
    SameSite,
    error::ConfigError,
    key::{EncryptionKey, SigningKey},
};

pub const DEFAULT_SESSION_COOKIE_NAME: &str = "session";
pub const DEFAULT_AUTHENTICATION_COOKIE_NAME: &str = "authentication";
pub const DEFAULT_FLASH_COOKIE_NAME: &str = "flash";

const DEFAULT_SESSION_TTL: Duration = Duration::seconds(86_400);
const DEFAULT_AUTHENTICATION_TTL: Duration = Duration::seconds(3_600);
const DEFAULT_FLASH_TTL: Duration = Duration::seconds(60);

/// Upper bound for cookie lifetimes, roughly one hundred years.
pub const MAX_TTL: Duration = Duration::days(36_525);

/// Name, keys and lifetime of one cookie kind.
#[derive(Debug, Clone)]
pub struct CookieSettings {
    pub(crate) name: Cow<'static, str>,
    pub(crate) sign_key: SigningKey,
    pub(crate) encryption_key: Option<EncryptionKey>,
    ttl: Option<Duration>,
}

impl CookieSettings {
    #[must_use]
    pub fn new<N: Into<Cow<'static, str>>>(name: N, sign_key: SigningKey) -> Self {
        Self {
            name: name.into(),
            sign_key,
            encryption_key: None,
            ttl: None,
        }
    }

    #[must_use]
    pub fn with_name<N: Into<Cow<'static, str>>>(mut self, name: N) -> Self {
        self.name = name.into();
        self
    }

    #[must_use]
    pub fn with_sign_key(mut self, sign_key: SigningKey) -> Self {
        self.sign_key = sign_key;
        self
    }

    /// Encrypt the signed token before it is placed in the cookie.
    #[must_use]
    pub fn with_encryption(mut self, key: EncryptionKey) -> Self {
        self.encryption_key = Some(key);
        self
    }

    #[must_use]
    pub fn without_encryption(mut self) -> Self {
        self.encryption_key = None;
        self
    }

    /// Lifetime of the cookie and of the default state issued for this kind.
    ///
    /// Clamped to between one second and [`MAX_TTL`]. Without an explicit TTL the kind's default
    /// applies once the settings are installed on a [`CookieStateConfig`].
    #[must_use]
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = Some(ttl.clamp(Duration::SECOND, MAX_TTL));
        self
    }

    fn with_default_ttl(mut self, ttl: Duration) -> Self {
        self.ttl.get_or_insert(ttl);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn ttl(&self) -> Duration {
        self.ttl.unwrap_or(DEFAULT_SESSION_TTL)
    }

    pub fn is_encrypted(&self) -> bool {
        self.encryption_key.is_some()
    }
}

#[derive(Debug, Clone)]
pub struct CookieStateConfig {
    pub(crate) session: CookieSettings,
    pub(crate) authentication: CookieSettings,
    pub(crate) flash: CookieSettings,
    pub(crate) http_only: bool,
    pub(crate) same_site: SameSite,
    pub(crate) secure: bool,
    pub(crate) path: Cow<'static, str>,
    pub(crate) domain: Option<Cow<'static, str>>,
}

impl CookieStateConfig {
    /// Configuration that signs all three cookie kinds with `sign_key`.
    #[must_use]
    pub fn new(sign_key: SigningKey) -> Self {
        Self {
            session: CookieSettings::new(DEFAULT_SESSION_COOKIE_NAME, sign_key.clone())
                .with_ttl(DEFAULT_SESSION_TTL),
            authentication: CookieSettings::new(
                DEFAULT_AUTHENTICATION_COOKIE_NAME,
                sign_key.clone(),
            )
            .with_ttl(DEFAULT_AUTHENTICATION_TTL),
            flash: CookieSettings::new(DEFAULT_FLASH_COOKIE_NAME, sign_key)
                .with_ttl(DEFAULT_FLASH_TTL),
            http_only: true,
            same_site: SameSite::Strict,
            secure: true,
            path: "/".into(),
            domain: None,
        }
    }

    /// Create config from environment variables.
    ///
    /// # Required env vars
    /// - `COOKIE_SIGN_KEY`: default signing key for all cookie kinds (at least 64 bytes)
    ///
    /// # Optional env vars
    /// - `SESSION_COOKIE_NAME`, `AUTHENTICATION_COOKIE_NAME`, `FLASH_COOKIE_NAME`
    /// - `SESSION_COOKIE_SIGN_KEY`, `AUTHENTICATION_COOKIE_SIGN_KEY`, `FLASH_COOKIE_SIGN_KEY`
    /// - `SESSION_COOKIE_EXPIRES`, `AUTHENTICATION_COOKIE_EXPIRES`, `FLASH_COOKIE_EXPIRES`
    ///   (seconds)
    /// - `SESSION_COOKIE_ENCRYPT`, `AUTHENTICATION_COOKIE_ENCRYPT`: `"1"` or `"true"` to encrypt;
    ///   requires the matching `..._ENCRYPTION_KEY` passphrase
    /// - `COOKIE_SECURE`: `"0"` or `"false"` to drop the `Secure` attribute
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if required variables are missing or values are invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Same as [`from_env`](Self::from_env), reading variables through `lookup`.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let sign_key = lookup("COOKIE_SIGN_KEY").ok_or(ConfigError::Missing("COOKIE_SIGN_KEY"))?;
        let sign_key = SigningKey::new(sign_key.as_bytes())?;

        let mut config = Self::new(sign_key);
        config.session = settings_from_lookup(&lookup, "SESSION", config.session, true)?;
        config.authentication =
            settings_from_lookup(&lookup, "AUTHENTICATION", config.authentication, true)?;
        config.flash = settings_from_lookup(&lookup, "FLASH", config.flash, false)?;

        if matches!(lookup("COOKIE_SECURE").as_deref(), Some("0") | Some("false")) {
            config.secure = false;
        }

        Ok(config)
    }

    #[must_use]
    pub fn with_session(mut self, settings: CookieSettings) -> Self {
        self.session = settings.with_default_ttl(DEFAULT_SESSION_TTL);
        self
    }

    #[must_use]
    pub fn with_authentication(mut self, settings: CookieSettings) -> Self {
        self.authentication = settings.with_default_ttl(DEFAULT_AUTHENTICATION_TTL);
        self
    }

    /// Flash cookies are signed only; an encryption key on `settings` is discarded.
    #[must_use]
    pub fn with_flash(mut self, settings: CookieSettings) -> Self {
        self.flash = settings
            .without_encryption()
            .with_default_ttl(DEFAULT_FLASH_TTL);
        self
    }

    #[must_use]
    pub fn with_http_only(mut self, http_only: bool) -> Self {
        self.http_only = http_only;
        self
    }

    #[must_use]
    pub fn with_same_site(mut self, same_site: SameSite) -> Self {
        self.same_site = same_site;
        self
    }

    #[must_use]
    pub fn with_secure(mut self, secure: bool) -> Self {
        self.secure = secure;
        self
    }

    #[must_use]
    pub fn with_path<P: Into<Cow<'static, str>>>(mut self, path: P) -> Self {
        self.path = path.into();
        self
    }

    #[must_use]
    pub fn with_domain<D: Into<Cow<'static, str>>>(mut self, domain: D) -> Self {
        self.domain = Some(domain.into());
        self
    }

    #[must_use]
    pub fn without_domain(mut self) -> Self {
        self.domain = None;
        self
    }

    pub fn session(&self) -> &CookieSettings {
        &self.session
    }

    pub fn authentication(&self) -> &CookieSettings {
        &self.authentication
    }

    pub fn flash(&self) -> &CookieSettings {
        &self.flash
    }

    pub(crate) fn build_cookie(
        &self,
        name: Cow<'static, str>,
        value: String,
        expires: OffsetDateTime,
    ) -> Cookie<'static> {
        let max_age = std::cmp::max(expires - OffsetDateTime::now_utc(), Duration::ZERO);
        let mut cookie_builder = Cookie::build((name, value))
            .http_only(self.http_only)
            .same_site(self.same_site)
            .secure(self.secure)
            .path(self.path.clone())
            .max_age(max_age);

        if let Some(domain) = self.domain.clone() {
            cookie_builder = cookie_builder.domain(domain);
        }

        cookie_builder.build()
    }

    /// A cookie that clears `name` in the browser.
    pub fn removal_cookie(&self, name: &str) -> Cookie<'static> {
        let mut cookie = Cookie::new(name.to_owned(), "");
        cookie.set_path(self.path.clone());
        if let Some(domain) = self.domain.clone() {
            cookie.set_domain(domain);
        }
        cookie.make_removal();
        cookie
    }
}

fn settings_from_lookup<F>(
    lookup: &F,
    prefix: &str,
    mut settings: CookieSettings,
    encryptable: bool,
) -> Result<CookieSettings, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(name) = lookup(&format!("{prefix}_COOKIE_NAME")) {
        settings = settings.with_name(name);
    }

    if let Some(key) = lookup(&format!("{prefix}_COOKIE_SIGN_KEY")) {
        settings = settings.with_sign_key(SigningKey::new(key.as_bytes())?);
    }

    let expires_var = format!("{prefix}_COOKIE_EXPIRES");
    if let Some(seconds) = lookup(&expires_var) {
        let seconds: i64 = seconds.trim().parse().map_err(|err| ConfigError::Invalid {
            name: expires_var.clone(),
            reason: format!("{err}"),
        })?;
        if seconds <= 0 {
            return Err(ConfigError::Invalid {
                name: expires_var,
                reason: "must be positive".into(),
            });
        }
        if seconds > MAX_TTL.whole_seconds() {
            return Err(ConfigError::Invalid {
                name: expires_var,
                reason: format!("must not exceed {} seconds", MAX_TTL.whole_seconds()),
            });
        }
        settings = settings.with_ttl(Duration::seconds(seconds));
    }

    if encryptable {
        let encrypt = matches!(
            lookup(&format!("{prefix}_COOKIE_ENCRYPT")).as_deref(),
            Some("1") | Some("true"),
        );
        if encrypt {
            let key_var = format!("{prefix}_COOKIE_ENCRYPTION_KEY");
            let passphrase = lookup(&key_var)
                .filter(|passphrase| !passphrase.is_empty())
                .ok_or_else(|| ConfigError::Invalid {
                    name: key_var,
                    reason: "required when encryption is enabled".into(),
                })?;
            settings = settings.with_encryption(EncryptionKey::derive_from(&passphrase));
        }
    }

    Ok(settings)
}
