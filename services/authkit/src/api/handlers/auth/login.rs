use crate::api::handlers::{valid_email, valid_password};
use crate::config::Settings;
use axum::{
    extract::Extension,
    http::{header::SET_COOKIE, HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};
use tracing::{error, instrument};

use super::session::refresh_cookie;
use super::types::{ErrorBody, LoginRequest, TokenPairResponse};
use super::SharedAuthService;

#[utoipa::path(
    post,
    path = "/v1/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful; refresh token also set as HttpOnly cookie", body = TokenPairResponse),
        (status = 400, description = "Validation error", body = ErrorBody),
        (status = 401, description = "Invalid credentials", body = ErrorBody),
    ),
    tag = "auth"
)]
#[instrument(skip(service, settings, payload))]
pub async fn login(
    service: Extension<SharedAuthService>,
    settings: Extension<Settings>,
    payload: Option<Json<LoginRequest>>,
) -> impl IntoResponse {
    let request: LoginRequest = match payload {
        Some(Json(payload)) => payload,
        None => {
            return (
                StatusCode::BAD_REQUEST,
                Json(ErrorBody::new("missing payload")),
            )
                .into_response()
        }
    };

    // Shape checks only; anything plausible goes to the orchestrator so the
    // failure mode stays uniform.
    if !valid_email(&request.email) || !valid_password(&request.password) {
        return (
            StatusCode::UNAUTHORIZED,
            Json(ErrorBody::new("invalid credentials")),
        )
            .into_response();
    }

    match service.login(&request.email, &request.password).await {
        Ok(pair) => {
            let mut headers = HeaderMap::new();
            if !pair.refresh_token.is_empty() {
                match refresh_cookie(settings.production(), &pair.refresh_token) {
                    Ok(cookie) => {
                        headers.insert(SET_COOKIE, cookie);
                    }
                    Err(err) => error!("failed to build refresh cookie: {err}"),
                }
            }
            (StatusCode::OK, headers, Json(TokenPairResponse::from(pair))).into_response()
        }
        Err(err) => super::error_response(&err).into_response(),
    }
}
