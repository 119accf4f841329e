//! Axum extractors for the reconstructed state.
//!
//! ```rust,ignore
//! async fn profile(authentication: Authentication, flash: Flash) -> impl IntoResponse {
//!     match authentication.authenticated_user() {
//!         Some(user) => format!("Hello, {user}"),
//!         None => "Hello, guest".to_string(),
//!     }
//! }
//!
//! // Only present when the previous request redirected with a form snapshot.
//! async fn signup(form: Option<Form>) -> impl IntoResponse { /* ... */ }
//! ```

use std::convert::Infallible;

use axum_core::{
    extract::{FromRequestParts, OptionalFromRequestParts},
    response::{IntoResponse, Response},
};
use http::{StatusCode, request::Parts};

use crate::{
    error::StateMissing,
    state::{Authentication, Flash, Form, RequestState, Session, Subject},
};

impl IntoResponse for StateMissing {
    fn into_response(self) -> Response {
        tracing::error!(err = %self, "request state extraction failed");
        (StatusCode::INTERNAL_SERVER_ERROR, "Internal error").into_response()
    }
}

fn request_state(parts: &Parts) -> Result<&RequestState, StateMissing> {
    parts.extensions.get::<RequestState>().ok_or(StateMissing)
}

impl<S> FromRequestParts<S> for RequestState
where
    S: Send + Sync,
{
    type Rejection = StateMissing;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        request_state(parts).cloned()
    }
}

impl<S> FromRequestParts<S> for Session
where
    S: Send + Sync,
{
    type Rejection = StateMissing;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        request_state(parts).map(|state| state.session.clone())
    }
}

impl<S> FromRequestParts<S> for Authentication
where
    S: Send + Sync,
{
    type Rejection = StateMissing;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        request_state(parts).map(|state| state.authentication.clone())
    }
}

impl<S> FromRequestParts<S> for Subject
where
    S: Send + Sync,
{
    type Rejection = StateMissing;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        request_state(parts).map(|state| state.subject.clone())
    }
}

impl<S> FromRequestParts<S> for Flash
where
    S: Send + Sync,
{
    type Rejection = StateMissing;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        request_state(parts).map(|state| state.flash.clone())
    }
}

impl<S> OptionalFromRequestParts<S> for Form
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        _state: &S,
    ) -> Result<Option<Self>, Self::Rejection> {
        Ok(parts
            .extensions
            .get::<RequestState>()
            .and_then(|state| state.form.clone()))
    }
}
