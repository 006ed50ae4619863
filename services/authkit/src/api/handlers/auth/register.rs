use crate::api::handlers::{valid_email, valid_password};
use axum::{extract::Extension, http::StatusCode, response::IntoResponse, Json};
use tracing::instrument;

use super::types::{ErrorBody, RegisterRequest, TokenPairResponse};
use super::SharedAuthService;

#[utoipa::path(
    post,
    path = "/v1/auth/register",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Registration successful", body = TokenPairResponse),
        (status = 400, description = "Validation error", body = ErrorBody),
        (status = 409, description = "Email already registered", body = ErrorBody),
    ),
    tag = "auth"
)]
#[instrument(skip(service, payload))]
pub async fn register(
    service: Extension<SharedAuthService>,
    payload: Option<Json<RegisterRequest>>,
) -> impl IntoResponse {
    let request: RegisterRequest = match payload {
        Some(Json(payload)) => payload,
        None => {
            return (
                StatusCode::BAD_REQUEST,
                Json(ErrorBody::new("missing payload")),
            )
                .into_response()
        }
    };

    if !valid_email(&request.email) {
        return (
            StatusCode::BAD_REQUEST,
            Json(ErrorBody::new("invalid email")),
        )
            .into_response();
    }

    if !valid_password(&request.password) {
        return (
            StatusCode::BAD_REQUEST,
            Json(ErrorBody::new("invalid password")),
        )
            .into_response();
    }

    match service
        .register(
            &request.email,
            &request.password,
            request.name.as_deref(),
            request.role_name.as_deref(),
        )
        .await
    {
        Ok(pair) => (StatusCode::CREATED, Json(TokenPairResponse::from(pair))).into_response(),
        Err(err) => super::error_response(&err).into_response(),
    }
}
