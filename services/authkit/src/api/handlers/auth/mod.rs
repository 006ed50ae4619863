//! Auth handlers: registration, login, refresh-token rotation, and the
//! bearer-token gatekeeper for protected routes.
//!
//! Error mapping lives here so every endpoint collapses internal failures to
//! the same small set of HTTP codes. Token validation failures are never
//! distinguished for callers; the cause goes to logs.

pub(crate) mod guard;
pub(crate) mod login;
pub(crate) mod register;
pub(crate) mod session;
pub(crate) mod types;

use crate::credential::{AuthError, PgCredentialStore, StoreError};
use axum::http::StatusCode;
use axum::Json;
use std::sync::Arc;
use tracing::{debug, error};
use types::ErrorBody;

pub use guard::Gatekeeper;

pub(crate) type SharedAuthService = Arc<crate::credential::AuthService<PgCredentialStore>>;

/// Map an orchestrator error to its HTTP boundary form. Internal detail never
/// reaches the response body.
pub(super) fn error_response(err: &AuthError) -> (StatusCode, Json<ErrorBody>) {
    let (status, message) = match err {
        AuthError::InvalidCredentials => (StatusCode::UNAUTHORIZED, "invalid credentials"),
        AuthError::Conflict => (StatusCode::CONFLICT, "email already registered"),
        AuthError::AccountGone => (StatusCode::NOT_FOUND, "account not found"),
        AuthError::InvalidToken(cause) => {
            debug!("token rejected: {cause}");
            (StatusCode::UNAUTHORIZED, "unauthorized")
        }
        AuthError::Store(StoreError::Timeout | StoreError::Unavailable(_)) => {
            error!("credential store degraded: {err}");
            (StatusCode::SERVICE_UNAVAILABLE, "service unavailable")
        }
        AuthError::Store(_) => {
            error!("credential store error: {err}");
            (StatusCode::INTERNAL_SERVER_ERROR, "internal error")
        }
        AuthError::Internal(cause) => {
            error!("internal auth error: {cause}");
            (StatusCode::INTERNAL_SERVER_ERROR, "internal error")
        }
    };
    (status, Json(ErrorBody::new(message)))
}
