//! Credential store gateway: the narrow contract this engine consumes from
//! the persistence collaborator.

use crate::credential::models::Credential;
use async_trait::async_trait;
use std::future::Future;
use std::time::Duration;
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("credential not found")]
    NotFound,
    #[error("credential already exists")]
    Conflict,
    #[error("store call timed out")]
    Timeout,
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Fields needed to create a credential. The password arrives pre-hashed;
/// plaintext never crosses this boundary.
#[derive(Debug)]
pub struct NewCredential<'a> {
    pub email: &'a str,
    pub password_hash: &'a str,
    pub role: &'a str,
    pub name: Option<&'a str>,
}

#[async_trait]
pub trait CredentialStore: Send + Sync {
    async fn get_by_email(&self, email: &str) -> Result<Credential, StoreError>;

    async fn get_by_id(&self, id: Uuid) -> Result<Credential, StoreError>;

    async fn create(&self, new: NewCredential<'_>) -> Result<Credential, StoreError>;

    async fn mark_email_verified(&self, id: Uuid) -> Result<(), StoreError>;
}

/// Bound a store call so a slow collaborator cannot stall the request.
/// Expiry cancels the in-flight future and surfaces as [`StoreError::Timeout`],
/// kept distinct from `NotFound`.
pub(crate) async fn with_timeout<T>(
    timeout: Duration,
    call: impl Future<Output = Result<T, StoreError>> + Send,
) -> Result<T, StoreError> {
    tokio::time::timeout(timeout, call)
        .await
        .map_err(|_| StoreError::Timeout)?
}
