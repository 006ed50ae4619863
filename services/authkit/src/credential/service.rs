//! Register / login / introspect orchestration.
//!
//! Flow Overview: handlers validate request shape, then call into
//! [`AuthService`], which owns the business rules: credential lookup and
//! verification, deployment-mode branching on registration, and token-scheme
//! branching on issuance. Every store call is bounded by the configured
//! timeout so a slow collaborator cannot stall a request.
//!
//! Security boundaries: unknown email and wrong password collapse into one
//! [`AuthError::InvalidCredentials`] before anything leaves this module; the
//! distinct cause is logged at debug level only.

use crate::config::Settings;
use crate::credential::models::Credential;
use crate::credential::password;
use crate::credential::repo::{with_timeout, CredentialStore, NewCredential, StoreError};
use crate::email::{EmailMessage, EmailQueue};
use anyhow::Context;
use bearer_token::{Claims, SchemeCodec, TokenKind, TokenPair};
use rand::Rng;
use serde_json::json;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::{Duration, SystemTime};
use thiserror::Error;
use tracing::{debug, error, info};
use uuid::Uuid;

const DEFAULT_ROLE: &str = "user";
const VERIFY_EMAIL_TEMPLATE: &str = "verify_email";

#[derive(Debug, Error)]
pub enum AuthError {
    /// Wrong email or wrong password; callers must not learn which.
    #[error("invalid credentials")]
    InvalidCredentials,
    #[error("email already registered")]
    Conflict,
    /// A validated token references an account that no longer exists.
    #[error("account no longer exists")]
    AccountGone,
    #[error("invalid token")]
    InvalidToken(#[source] bearer_token::Error),
    #[error(transparent)]
    Store(StoreError),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

pub struct AuthService<S> {
    store: S,
    codec: Option<Arc<SchemeCodec>>,
    production: bool,
    access_token_ttl_seconds: i64,
    store_timeout: Duration,
    token_metadata: BTreeMap<String, String>,
    frontend_base_url: String,
    mailer: Option<EmailQueue>,
}

impl<S: CredentialStore> AuthService<S> {
    #[must_use]
    pub fn new(
        store: S,
        codec: Option<Arc<SchemeCodec>>,
        settings: &Settings,
        mailer: Option<EmailQueue>,
    ) -> Self {
        Self {
            store,
            codec,
            production: settings.production(),
            access_token_ttl_seconds: settings.access_token_ttl_seconds(),
            store_timeout: Duration::from_secs(settings.store_timeout_seconds()),
            token_metadata: settings.token_metadata().clone(),
            frontend_base_url: settings.frontend_base_url().to_string(),
            mailer,
        }
    }

    /// Authenticate an email/password pair and mint a token pair.
    ///
    /// Deterministic: same inputs against the same credential state always
    /// produce the same outcome. Returns an empty pair when no token scheme
    /// is active; callers must treat that as success.
    ///
    /// # Errors
    ///
    /// `InvalidCredentials` for unknown email or wrong password, `Store` for
    /// a degraded collaborator, `InvalidToken`/`Internal` for issuance
    /// failures.
    pub async fn login(&self, email: &str, plaintext: &str) -> Result<TokenPair, AuthError> {
        let email = normalize_email(email);
        let credential = match with_timeout(self.store_timeout, self.store.get_by_email(&email))
            .await
        {
            Ok(credential) => credential,
            Err(StoreError::NotFound) => {
                debug!(email = %email, "login rejected: unknown email");
                return Err(AuthError::InvalidCredentials);
            }
            Err(err) => return Err(AuthError::Store(err)),
        };

        if !password::verify(plaintext, &credential.password_hash) {
            debug!(email = %email, "login rejected: password mismatch");
            return Err(AuthError::InvalidCredentials);
        }

        self.issue_pair(&credential)
    }

    /// Create a credential and mint its first token pair.
    ///
    /// Production deployments enqueue a verification email and leave the
    /// credential unverified; elsewhere the credential is verified
    /// synchronously as a development convenience. Tokens are issued either
    /// way, before verification completes.
    ///
    /// # Errors
    ///
    /// `Conflict` for a duplicate email (never retried), `Store` for a
    /// degraded collaborator, `Internal` for hashing failures.
    pub async fn register(
        &self,
        email: &str,
        plaintext: &str,
        name: Option<&str>,
        role_name: Option<&str>,
    ) -> Result<TokenPair, AuthError> {
        let email = normalize_email(email);
        let role = role_name.unwrap_or(DEFAULT_ROLE);
        let password_hash = password::hash(plaintext).context("password hashing failed")?;

        let new = NewCredential {
            email: &email,
            password_hash: &password_hash,
            role,
            name,
        };
        let credential = match with_timeout(self.store_timeout, self.store.create(new)).await {
            Ok(credential) => credential,
            Err(StoreError::Conflict) => return Err(AuthError::Conflict),
            Err(err) => return Err(AuthError::Store(err)),
        };

        if self.production {
            self.enqueue_verification_email(&credential);
        } else {
            // Development convenience: skip the email loop entirely.
            match with_timeout(
                self.store_timeout,
                self.store.mark_email_verified(credential.id),
            )
            .await
            {
                Ok(()) => {}
                Err(StoreError::NotFound) => return Err(AuthError::AccountGone),
                Err(err) => return Err(AuthError::Store(err)),
            }
        }

        info!(user_id = %credential.id, "credential created");
        self.issue_pair(&credential)
    }

    /// Return the credential behind an already-validated identity.
    ///
    /// # Errors
    ///
    /// `AccountGone` when the subject no longer exists (a stale or forged
    /// token referencing a deleted account), distinct from token-invalid.
    pub async fn introspect(&self, user_id: Uuid) -> Result<Credential, AuthError> {
        match with_timeout(self.store_timeout, self.store.get_by_id(user_id)).await {
            Ok(credential) => Ok(credential),
            Err(StoreError::NotFound) => Err(AuthError::AccountGone),
            Err(err) => Err(AuthError::Store(err)),
        }
    }

    /// Validate a refresh token and rotate it into a fresh pair.
    ///
    /// The subject must still exist; role changes since the token was minted
    /// take effect on rotation because the stored role wins.
    ///
    /// # Errors
    ///
    /// `InvalidToken` for signature/expiry/kind failures or when no scheme is
    /// active, `AccountGone` when the subject was deleted.
    pub async fn refresh(&self, refresh_token: &str) -> Result<TokenPair, AuthError> {
        let codec = self
            .codec
            .as_ref()
            .ok_or(AuthError::InvalidToken(bearer_token::Error::MissingSecret))?;

        let claims = codec
            .validate(refresh_token, TokenKind::Refresh, now_unix_seconds())
            .map_err(AuthError::InvalidToken)?;

        let user_id = parse_subject(&claims)?;
        let credential = match with_timeout(self.store_timeout, self.store.get_by_id(user_id)).await
        {
            Ok(credential) => credential,
            Err(StoreError::NotFound) => return Err(AuthError::AccountGone),
            Err(err) => return Err(AuthError::Store(err)),
        };

        self.issue_pair(&credential)
    }

    fn issue_pair(&self, credential: &Credential) -> Result<TokenPair, AuthError> {
        let Some(codec) = self.codec.as_ref() else {
            // Token issuance disabled by configuration; a valid outcome.
            return Ok(TokenPair::empty());
        };

        codec
            .issue(
                &credential.id.to_string(),
                &credential.role,
                &self.token_metadata,
                self.access_token_ttl_seconds,
                now_unix_seconds(),
            )
            .map_err(AuthError::InvalidToken)
    }

    fn enqueue_verification_email(&self, credential: &Credential) {
        let Some(mailer) = self.mailer.as_ref() else {
            error!(
                to_email = %credential.email,
                "no email queue configured, verification email not sent"
            );
            return;
        };

        let code = generate_six_digit_code();
        let payload = json!({
            "email": credential.email,
            "code": code,
            "verify_url": build_verify_url(&self.frontend_base_url, &credential.email, &code),
        });
        mailer.enqueue(EmailMessage {
            to_email: credential.email.clone(),
            template: VERIFY_EMAIL_TEMPLATE.to_string(),
            payload_json: payload.to_string(),
        });
    }
}

/// Normalize an email for lookup/uniqueness checks.
pub(crate) fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

fn parse_subject(claims: &Claims) -> Result<Uuid, AuthError> {
    Uuid::parse_str(&claims.sub)
        .map_err(|_| AuthError::InvalidToken(bearer_token::Error::TokenFormat))
}

fn now_unix_seconds() -> i64 {
    SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .map(|duration| i64::try_from(duration.as_secs()).unwrap_or(i64::MAX))
        .unwrap_or(0)
}

fn generate_six_digit_code() -> String {
    let code: u32 = rand::thread_rng().gen_range(0..1_000_000);
    format!("{code:06}")
}

fn build_verify_url(frontend_base_url: &str, email: &str, code: &str) -> String {
    let base = frontend_base_url.trim_end_matches('/');
    format!("{base}/verify?email={email}&code={code}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::email::{spawn_notifier_worker, EmailSender, EmailWorkerConfig};
    use anyhow::Result;
    use std::collections::HashMap;
    use std::sync::Mutex as StdMutex;
    use tokio::sync::Mutex;

    /// In-memory store standing in for the persistence collaborator.
    #[derive(Default)]
    struct MemoryCredentialStore {
        rows: Mutex<HashMap<Uuid, Credential>>,
        delay: Option<Duration>,
    }

    impl MemoryCredentialStore {
        fn with_delay(delay: Duration) -> Self {
            Self {
                rows: Mutex::new(HashMap::new()),
                delay: Some(delay),
            }
        }

        async fn stall(&self) {
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
        }

        async fn count(&self) -> usize {
            self.rows.lock().await.len()
        }
    }

    #[async_trait::async_trait]
    impl CredentialStore for &MemoryCredentialStore {
        async fn get_by_email(&self, email: &str) -> Result<Credential, StoreError> {
            self.stall().await;
            self.rows
                .lock()
                .await
                .values()
                .find(|credential| credential.email == email)
                .cloned()
                .ok_or(StoreError::NotFound)
        }

        async fn get_by_id(&self, id: Uuid) -> Result<Credential, StoreError> {
            self.stall().await;
            self.rows
                .lock()
                .await
                .get(&id)
                .cloned()
                .ok_or(StoreError::NotFound)
        }

        async fn create(&self, new: NewCredential<'_>) -> Result<Credential, StoreError> {
            self.stall().await;
            let mut rows = self.rows.lock().await;
            if rows.values().any(|credential| credential.email == new.email) {
                return Err(StoreError::Conflict);
            }
            let credential = Credential {
                id: Uuid::new_v4(),
                email: new.email.to_string(),
                password_hash: new.password_hash.to_string(),
                role: new.role.to_string(),
                name: new.name.map(str::to_string),
                email_verified: false,
            };
            rows.insert(credential.id, credential.clone());
            Ok(credential)
        }

        async fn mark_email_verified(&self, id: Uuid) -> Result<(), StoreError> {
            self.stall().await;
            let mut rows = self.rows.lock().await;
            let credential = rows.get_mut(&id).ok_or(StoreError::NotFound)?;
            credential.email_verified = true;
            Ok(())
        }
    }

    struct RecordingSender {
        sent: StdMutex<Vec<EmailMessage>>,
    }

    impl EmailSender for RecordingSender {
        fn send(&self, message: &EmailMessage) -> Result<()> {
            if let Ok(mut sent) = self.sent.lock() {
                sent.push(message.clone());
            }
            Ok(())
        }
    }

    fn jwt_codec() -> Option<Arc<SchemeCodec>> {
        SchemeCodec::jwt(b"test-signing-secret").ok().map(Arc::new)
    }

    fn service<'a>(
        store: &'a MemoryCredentialStore,
        codec: Option<Arc<SchemeCodec>>,
        settings: &Settings,
    ) -> AuthService<&'a MemoryCredentialStore> {
        AuthService::new(store, codec, settings, None)
    }

    #[tokio::test]
    async fn register_then_login_round_trip() -> Result<()> {
        let store = MemoryCredentialStore::default();
        let service = service(&store, jwt_codec(), &Settings::new());

        let registered = service
            .register("a@x.com", "Secret123", None, Some("user"))
            .await?;
        assert!(!registered.access_token.is_empty());

        let pair = service.login("a@x.com", "Secret123").await?;
        assert!(!pair.access_token.is_empty());
        assert!(!pair.refresh_token.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn login_is_case_and_whitespace_insensitive_on_email() -> Result<()> {
        let store = MemoryCredentialStore::default();
        let service = service(&store, jwt_codec(), &Settings::new());

        service.register(" A@X.com ", "Secret123", None, None).await?;
        let pair = service.login("a@x.com", "Secret123").await?;
        assert!(!pair.access_token.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn duplicate_registration_conflicts_once() -> Result<()> {
        let store = MemoryCredentialStore::default();
        let service = service(&store, jwt_codec(), &Settings::new());

        service.register("a@x.com", "Secret123", None, None).await?;
        let second = service.register("a@x.com", "Other456", None, None).await;
        assert!(matches!(second, Err(AuthError::Conflict)));
        assert_eq!(store.count().await, 1);
        Ok(())
    }

    #[tokio::test]
    async fn unknown_email_and_wrong_password_collapse() -> Result<()> {
        let store = MemoryCredentialStore::default();
        let service = service(&store, jwt_codec(), &Settings::new());
        service.register("a@x.com", "Secret123", None, None).await?;

        let unknown = service.login("ghost@x.com", "whatever").await;
        assert!(matches!(unknown, Err(AuthError::InvalidCredentials)));

        let wrong = service.login("a@x.com", "WrongPass").await;
        assert!(matches!(wrong, Err(AuthError::InvalidCredentials)));
        Ok(())
    }

    #[tokio::test]
    async fn non_production_register_marks_verified() -> Result<()> {
        let store = MemoryCredentialStore::default();
        let service = service(&store, jwt_codec(), &Settings::new());

        let pair = service
            .register("a@x.com", "Secret123", None, Some("user"))
            .await?;
        assert!(!pair.access_token.is_empty());

        let credential = service.store.get_by_email("a@x.com").await?;
        assert!(credential.email_verified);
        Ok(())
    }

    #[tokio::test]
    async fn production_register_enqueues_email_and_stays_unverified() -> Result<()> {
        let store = MemoryCredentialStore::default();
        let sender = Arc::new(RecordingSender {
            sent: StdMutex::new(Vec::new()),
        });
        let (queue, handle) = spawn_notifier_worker(sender.clone(), EmailWorkerConfig::new());
        let settings = Settings::new().with_production(true);
        let service = AuthService::new(&store, jwt_codec(), &settings, Some(queue));

        let pair = service.register("a@x.com", "Secret123", None, None).await?;
        // Tokens are usable immediately, before verification completes.
        assert!(!pair.access_token.is_empty());

        let credential = service.store.get_by_email("a@x.com").await?;
        assert!(!credential.email_verified);

        drop(service);
        let _ = handle.await;
        let sent = sender.sent.lock().map(|sent| sent.clone()).unwrap_or_default();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].template, "verify_email");
        assert_eq!(sent[0].to_email, "a@x.com");
        Ok(())
    }

    #[tokio::test]
    async fn scheme_none_returns_empty_pair() -> Result<()> {
        let store = MemoryCredentialStore::default();
        let service = service(&store, None, &Settings::new());

        let registered = service.register("a@x.com", "Secret123", None, None).await?;
        assert!(registered.is_empty());

        let pair = service.login("a@x.com", "Secret123").await?;
        assert!(pair.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn access_token_claims_carry_subject_role_and_metadata() -> Result<()> {
        let store = MemoryCredentialStore::default();
        let codec = jwt_codec();
        let settings = Settings::new().with_token_metadata(BTreeMap::from([(
            "tenant".to_string(),
            "acme".to_string(),
        )]));
        let service = AuthService::new(&store, codec.clone(), &settings, None);

        let pair = service
            .register("a@x.com", "Secret123", None, Some("admin"))
            .await?;
        let credential = service.store.get_by_email("a@x.com").await?;

        let codec = codec.ok_or(AuthError::InvalidCredentials)?;
        let claims = codec
            .validate(&pair.access_token, TokenKind::Access, now_unix_seconds())
            .map_err(AuthError::InvalidToken)?;
        assert_eq!(claims.sub, credential.id.to_string());
        assert_eq!(claims.role, "admin");
        assert_eq!(claims.metadata.get("tenant").map(String::as_str), Some("acme"));
        Ok(())
    }

    #[tokio::test]
    async fn introspect_returns_projection_and_detects_deleted_accounts() -> Result<()> {
        let store = MemoryCredentialStore::default();
        let service = service(&store, jwt_codec(), &Settings::new());

        service.register("a@x.com", "Secret123", Some("Alice"), None).await?;
        let credential = service.store.get_by_email("a@x.com").await?;

        let found = service.introspect(credential.id).await?;
        assert_eq!(found.email, "a@x.com");
        assert_eq!(found.name.as_deref(), Some("Alice"));

        let gone = service.introspect(Uuid::new_v4()).await;
        assert!(matches!(gone, Err(AuthError::AccountGone)));
        Ok(())
    }

    #[tokio::test]
    async fn refresh_rotates_a_valid_refresh_token() -> Result<()> {
        let store = MemoryCredentialStore::default();
        let service = service(&store, jwt_codec(), &Settings::new());

        let pair = service.register("a@x.com", "Secret123", None, None).await?;
        let rotated = service.refresh(&pair.refresh_token).await?;
        assert!(!rotated.access_token.is_empty());
        assert!(!rotated.refresh_token.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn refresh_rejects_access_tokens_and_garbage() -> Result<()> {
        let store = MemoryCredentialStore::default();
        let service = service(&store, jwt_codec(), &Settings::new());

        let pair = service.register("a@x.com", "Secret123", None, None).await?;

        let result = service.refresh(&pair.access_token).await;
        assert!(matches!(
            result,
            Err(AuthError::InvalidToken(bearer_token::Error::KindMismatch))
        ));

        let result = service.refresh("not-a-token").await;
        assert!(matches!(result, Err(AuthError::InvalidToken(_))));
        Ok(())
    }

    #[tokio::test]
    async fn refresh_with_no_scheme_is_rejected() {
        let store = MemoryCredentialStore::default();
        let service = service(&store, None, &Settings::new());

        let result = service.refresh("anything").await;
        assert!(matches!(result, Err(AuthError::InvalidToken(_))));
    }

    #[tokio::test]
    async fn slow_store_surfaces_timeout_not_not_found() -> Result<()> {
        let store = MemoryCredentialStore::with_delay(Duration::from_secs(5));
        let settings = Settings::new().with_store_timeout_seconds(0);
        let service = AuthService::new(&store, jwt_codec(), &settings, None);

        let result = service.login("a@x.com", "Secret123").await;
        assert!(matches!(
            result,
            Err(AuthError::Store(StoreError::Timeout))
        ));
        Ok(())
    }

    #[test]
    fn normalize_email_trims_and_lowercases() {
        assert_eq!(normalize_email(" Alice@Example.COM "), "alice@example.com");
    }

    #[test]
    fn six_digit_codes_are_zero_padded() {
        for _ in 0..32 {
            let code = generate_six_digit_code();
            assert_eq!(code.len(), 6);
            assert!(code.chars().all(|c| c.is_ascii_digit()));
        }
    }

    #[test]
    fn build_verify_url_trims_trailing_slash() {
        let url = build_verify_url("https://app.test/", "a@x.com", "123456");
        assert_eq!(url, "https://app.test/verify?email=a@x.com&code=123456");
    }
}
