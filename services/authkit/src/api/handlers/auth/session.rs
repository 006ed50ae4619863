//! Refresh-token cookie handling: rotation and logout.
//!
//! The refresh token rides in an HttpOnly, SameSite=Lax cookie so browser
//! scripts never see it. Rotation fully validates the presented token
//! (signature, expiry, kind) before minting a replacement pair; presence of
//! the cookie alone proves nothing.

use crate::config::Settings;
use axum::{
    extract::Extension,
    http::{
        header::{InvalidHeaderValue, COOKIE, SET_COOKIE},
        HeaderMap, HeaderValue, StatusCode,
    },
    response::IntoResponse,
    Json,
};
use tracing::{error, instrument};

use super::types::{ErrorBody, TokenPairResponse};
use super::SharedAuthService;

const REFRESH_COOKIE_NAME: &str = "refresh_token";
const REFRESH_COOKIE_MAX_AGE_SECONDS: i64 = 7 * 24 * 60 * 60;

#[utoipa::path(
    post,
    path = "/v1/auth/refresh",
    responses(
        (status = 200, description = "Rotated token pair; cookie replaced", body = TokenPairResponse),
        (status = 401, description = "Missing, invalid, or expired refresh token", body = ErrorBody),
    ),
    tag = "auth"
)]
#[instrument(skip(headers, service, settings))]
pub async fn refresh(
    headers: HeaderMap,
    service: Extension<SharedAuthService>,
    settings: Extension<Settings>,
) -> impl IntoResponse {
    let Some(token) = extract_refresh_cookie(&headers) else {
        return (
            StatusCode::UNAUTHORIZED,
            Json(ErrorBody::new("unauthorized")),
        )
            .into_response();
    };

    match service.refresh(&token).await {
        Ok(pair) => {
            let mut response_headers = HeaderMap::new();
            match refresh_cookie(settings.production(), &pair.refresh_token) {
                Ok(cookie) => {
                    response_headers.insert(SET_COOKIE, cookie);
                }
                Err(err) => error!("failed to build refresh cookie: {err}"),
            }
            (
                StatusCode::OK,
                response_headers,
                Json(TokenPairResponse::from(pair)),
            )
                .into_response()
        }
        Err(err) => super::error_response(&err).into_response(),
    }
}

#[utoipa::path(
    post,
    path = "/v1/auth/logout",
    responses(
        (status = 204, description = "Refresh cookie cleared")
    ),
    tag = "auth"
)]
pub async fn logout(settings: Extension<Settings>) -> impl IntoResponse {
    // Always clear the cookie; there is no server-side session to tear down.
    let mut headers = HeaderMap::new();
    if let Ok(cookie) = clear_refresh_cookie(settings.production()) {
        headers.insert(SET_COOKIE, cookie);
    }
    (StatusCode::NO_CONTENT, headers).into_response()
}

/// Build the HttpOnly refresh cookie; `Secure` only in production so local
/// HTTP development keeps working.
pub(super) fn refresh_cookie(
    production: bool,
    token: &str,
) -> Result<HeaderValue, InvalidHeaderValue> {
    let mut cookie = format!(
        "{REFRESH_COOKIE_NAME}={token}; Path=/; HttpOnly; SameSite=Lax; Max-Age={REFRESH_COOKIE_MAX_AGE_SECONDS}"
    );
    if production {
        cookie.push_str("; Secure");
    }
    HeaderValue::from_str(&cookie)
}

fn clear_refresh_cookie(production: bool) -> Result<HeaderValue, InvalidHeaderValue> {
    let mut cookie = format!("{REFRESH_COOKIE_NAME}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0");
    if production {
        cookie.push_str("; Secure");
    }
    HeaderValue::from_str(&cookie)
}

fn extract_refresh_cookie(headers: &HeaderMap) -> Option<String> {
    let header = headers.get(COOKIE)?;
    let value = header.to_str().ok()?;
    for pair in value.split(';') {
        let trimmed = pair.trim();
        let mut parts = trimmed.splitn(2, '=');
        let key = parts.next()?.trim();
        let val = parts.next()?.trim();
        if key == REFRESH_COOKIE_NAME && !val.is_empty() {
            return Some(val.to_string());
        }
    }
    None
}
