use bearer_token::Claims;
use uuid::Uuid;

/// A stored credential as the persistence collaborator returns it.
///
/// `password_hash` is a PHC string with the salt embedded; the plaintext
/// password never reaches this type.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Credential {
    pub id: Uuid,
    pub email: String,
    pub password_hash: String,
    pub role: String,
    pub name: Option<String>,
    pub email_verified: bool,
}

/// Authenticated caller context derived from a validated access token.
///
/// Produced by the request gatekeeper and published into request extensions;
/// lives for exactly one request.
#[derive(Clone, Debug)]
pub struct Identity {
    pub user_id: Uuid,
    pub role: String,
    pub claims: Claims,
}
