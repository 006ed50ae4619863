//! Authenticated introspection endpoint.
//!
//! Runs behind the bearer gatekeeper: the [`Identity`] extension is present
//! by the time this handler executes. A missing account here means the token
//! outlived its subject, which is surfaced as 404 rather than 401.

use crate::credential::Identity;
use axum::{extract::Extension, http::StatusCode, response::IntoResponse, Json};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::auth::SharedAuthService;

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct MeResponse {
    pub id: String,
    pub email: String,
    pub role: String,
    pub name: Option<String>,
    pub email_verified: bool,
}

#[utoipa::path(
    get,
    path = "/v1/me",
    responses(
        (status = 200, description = "Credential projection for the authenticated caller", body = MeResponse),
        (status = 401, description = "Missing or invalid bearer token"),
        (status = 404, description = "Token subject no longer exists"),
    ),
    security(("bearer_token" = [])),
    tag = "me"
)]
pub async fn get_me(
    Extension(identity): Extension<Identity>,
    service: Extension<SharedAuthService>,
) -> impl IntoResponse {
    match service.introspect(identity.user_id).await {
        Ok(credential) => {
            let response = MeResponse {
                id: credential.id.to_string(),
                email: credential.email,
                role: credential.role,
                name: credential.name,
                email_verified: credential.email_verified,
            };
            (StatusCode::OK, Json(response)).into_response()
        }
        Err(err) => super::auth::error_response(&err).into_response(),
    }
}
