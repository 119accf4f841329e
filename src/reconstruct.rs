use std::sync::Arc;

use crate::{
    claims,
    codec,
    config::{CookieSettings, CookieStateConfig},
    error::VerificationError,
    key::EncryptionKey,
    source::CookieSource,
    state::{Authentication, Flash, Form, RequestState, Session, Subject},
    token::Claims,
};

/// Rebuilds [`RequestState`] from the cookies of a request.
///
/// Invalid cookies never surface as errors: each kind falls back to its unauthenticated, empty
/// default.
#[derive(Debug, Clone)]
pub struct StateReconstructor {
    config: Arc<CookieStateConfig>,
}

struct CookieKind<'a> {
    settings: &'a CookieSettings,
    encryption_key: Option<&'a EncryptionKey>,
    require_subject: bool,
}

impl StateReconstructor {
    #[must_use]
    pub fn new(config: CookieStateConfig) -> Self {
        Self {
            config: Arc::new(config),
        }
    }

    pub fn config(&self) -> &CookieStateConfig {
        &self.config
    }

    pub fn reconstruct<S: CookieSource + ?Sized>(&self, cookies: Option<&S>) -> RequestState {
        let session = self.session(cookies);
        let (authentication, subject) = self.authentication(cookies);
        let (flash, form) = self.flash(cookies);

        RequestState {
            session,
            authentication,
            subject,
            flash,
            form,
        }
    }

    pub fn session<S: CookieSource + ?Sized>(&self, cookies: Option<&S>) -> Session {
        let settings = &self.config.session;
        let kind = CookieKind {
            settings,
            encryption_key: settings.encryption_key.as_ref(),
            require_subject: false,
        };

        verify_and_extract(cookies, kind, claims::session_from_claims)
            .unwrap_or_else(|| Session::fresh(settings.ttl()))
    }

    pub fn authentication<S: CookieSource + ?Sized>(
        &self,
        cookies: Option<&S>,
    ) -> (Authentication, Subject) {
        let settings = &self.config.authentication;
        let kind = CookieKind {
            settings,
            encryption_key: settings.encryption_key.as_ref(),
            require_subject: true,
        };

        verify_and_extract(cookies, kind, claims::authentication_from_claims).unwrap_or_else(
            || {
                (
                    Authentication::unauthenticated(settings.ttl()),
                    Subject::anonymous(),
                )
            },
        )
    }

    /// Flash cookies are signed only and never decrypted.
    pub fn flash<S: CookieSource + ?Sized>(
        &self,
        cookies: Option<&S>,
    ) -> (Flash, Option<Form>) {
        let kind = CookieKind {
            settings: &self.config.flash,
            encryption_key: None,
            require_subject: false,
        };

        verify_and_extract(cookies, kind, claims::flash_from_claims)
            .unwrap_or_else(|| (Flash::new(), None))
    }
}

/// `None` when the cookie is absent or fails verification or extraction.
fn verify_and_extract<S, T, F>(cookies: Option<&S>, kind: CookieKind<'_>, extract: F) -> Option<T>
where
    S: CookieSource + ?Sized,
    F: FnOnce(&Claims) -> Result<T, VerificationError>,
{
    let name = kind.settings.name();
    let value = codec::extract(cookies, name)?;

    let result = codec::decode_value(
        &value,
        kind.settings,
        kind.encryption_key,
        kind.require_subject,
    )
    .and_then(|claims| extract(&claims));

    match result {
        Ok(entity) => Some(entity),
        Err(err) => {
            tracing::warn!(cookie = %name, err = %err, "cookie verification failed");
            None
        }
    }
}
