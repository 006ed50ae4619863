//! Request gatekeeper for protected routes.
//!
//! Flow Overview: extract the bearer token from `Authorization`, validate it
//! as an access token under the active scheme, and publish the resulting
//! [`Identity`] into request extensions for downstream handlers. Every
//! failure short-circuits with the same opaque 401 body.

use crate::api::handlers::now_unix_seconds;
use crate::api::handlers::auth::types::ErrorBody;
use crate::credential::Identity;
use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use bearer_token::{SchemeCodec, TokenKind};
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

/// Shared state for the bearer middleware: the codec for the active scheme,
/// or `None` when token issuance is disabled (all protected routes reject).
#[derive(Clone)]
pub struct Gatekeeper {
    codec: Option<Arc<SchemeCodec>>,
}

impl Gatekeeper {
    #[must_use]
    pub fn new(codec: Option<Arc<SchemeCodec>>) -> Self {
        Self { codec }
    }
}

/// axum middleware validating `Authorization: Bearer <token>`.
pub async fn require_bearer(
    State(gate): State<Gatekeeper>,
    mut request: Request,
    next: Next,
) -> Response {
    // A missing or malformed header rejects before any codec work.
    let Some(token) = extract_bearer_token(request.headers()) else {
        return unauthorized();
    };

    let Some(codec) = gate.codec.as_ref() else {
        debug!("bearer token presented but no token scheme is active");
        return unauthorized();
    };

    let claims = match codec.validate(&token, TokenKind::Access, now_unix_seconds()) {
        Ok(claims) => claims,
        Err(err) => {
            // Expired vs malformed vs wrong kind stays internal.
            debug!("bearer token rejected: {err}");
            return unauthorized();
        }
    };

    let Ok(user_id) = Uuid::parse_str(&claims.sub) else {
        debug!("bearer token subject is not a uuid");
        return unauthorized();
    };

    request.extensions_mut().insert(Identity {
        user_id,
        role: claims.role.clone(),
        claims,
    });
    next.run(request).await
}

/// Pull the token out of `Authorization: Bearer <token>`, tolerating nothing
/// but that exact shape.
pub(crate) fn extract_bearer_token(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let token = value.trim().strip_prefix("Bearer ")?.trim();
    if token.is_empty() {
        None
    } else {
        Some(token.to_string())
    }
}

fn unauthorized() -> Response {
    (StatusCode::UNAUTHORIZED, Json(ErrorBody::new("unauthorized"))).into_response()
}
