//! Immutable service configuration and fail-fast bootstrap validation.
//!
//! Settings are built once from CLI/environment input, validated before the
//! server binds, and then only read. Secrets live in [`SecretString`] so they
//! never show up in Debug output or logs.

use base64::Engine;
use bearer_token::{SchemeCodec, PASETO_KEY_BYTES};
use secrecy::{ExposeSecret, SecretString};
use std::collections::BTreeMap;
use thiserror::Error;
use tracing::info;

pub const DEFAULT_ACCESS_TOKEN_TTL_SECONDS: i64 = 180;
pub const DEFAULT_STORE_TIMEOUT_SECONDS: u64 = 5;
pub const DEFAULT_FRONTEND_BASE_URL: &str = "https://authkit.dev";

/// Token scheme for a deployment. Exactly one is active; `None` disables
/// issuance entirely and callers receive empty token pairs.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AuthScheme {
    Jwt,
    Paseto,
    None,
}

impl AuthScheme {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Jwt => "jwt",
            Self::Paseto => "paseto",
            Self::None => "none",
        }
    }
}

/// OAuth client settings for one provider. Flows are not served here; the
/// credentials are only validated at bootstrap so a partially configured
/// provider fails fast instead of at first redirect.
#[derive(Clone)]
pub struct OauthProvider {
    pub client_id: String,
    pub client_secret: SecretString,
    pub redirect_url: String,
}

impl OauthProvider {
    fn is_complete(&self) -> bool {
        !self.client_id.is_empty()
            && !self.client_secret.expose_secret().is_empty()
            && !self.redirect_url.is_empty()
    }
}

impl std::fmt::Debug for OauthProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OauthProvider")
            .field("client_id", &self.client_id)
            .field("client_secret", &"***")
            .field("redirect_url", &self.redirect_url)
            .finish()
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("jwt and paseto token schemes are mutually exclusive; enable only one")]
    ConflictingSchemes,
    #[error("missing {name} for {capability}")]
    MissingSecret {
        capability: &'static str,
        name: &'static str,
    },
    #[error("paseto key must be base64 for exactly {PASETO_KEY_BYTES} bytes")]
    InvalidPasetoKey,
    #[error("access token ttl must be positive, got {0}")]
    InvalidAccessTtl(i64),
}

/// Everything the engine needs beyond the DSN and port, read once at startup.
#[derive(Clone)]
pub struct Settings {
    jwt_auth: bool,
    paseto_auth: bool,
    jwt_secret: Option<SecretString>,
    paseto_key: Option<SecretString>,
    production: bool,
    session: bool,
    session_store_redis: bool,
    redis_address: Option<String>,
    redis_password: Option<SecretString>,
    google_oauth: Option<OauthProvider>,
    github_oauth: Option<OauthProvider>,
    access_token_ttl_seconds: i64,
    store_timeout_seconds: u64,
    token_metadata: BTreeMap<String, String>,
    frontend_base_url: String,
}

impl Settings {
    #[must_use]
    pub fn new() -> Self {
        Self {
            jwt_auth: false,
            paseto_auth: false,
            jwt_secret: None,
            paseto_key: None,
            production: false,
            session: false,
            session_store_redis: false,
            redis_address: None,
            redis_password: None,
            google_oauth: None,
            github_oauth: None,
            access_token_ttl_seconds: DEFAULT_ACCESS_TOKEN_TTL_SECONDS,
            store_timeout_seconds: DEFAULT_STORE_TIMEOUT_SECONDS,
            token_metadata: BTreeMap::new(),
            frontend_base_url: DEFAULT_FRONTEND_BASE_URL.to_string(),
        }
    }

    #[must_use]
    pub fn with_jwt_auth(mut self, enabled: bool) -> Self {
        self.jwt_auth = enabled;
        self
    }

    #[must_use]
    pub fn with_paseto_auth(mut self, enabled: bool) -> Self {
        self.paseto_auth = enabled;
        self
    }

    #[must_use]
    pub fn with_jwt_secret(mut self, secret: Option<SecretString>) -> Self {
        self.jwt_secret = secret;
        self
    }

    #[must_use]
    pub fn with_paseto_key(mut self, key: Option<SecretString>) -> Self {
        self.paseto_key = key;
        self
    }

    #[must_use]
    pub fn with_production(mut self, production: bool) -> Self {
        self.production = production;
        self
    }

    #[must_use]
    pub fn with_session(mut self, session: bool) -> Self {
        self.session = session;
        self
    }

    #[must_use]
    pub fn with_session_store_redis(mut self, redis: bool) -> Self {
        self.session_store_redis = redis;
        self
    }

    #[must_use]
    pub fn with_redis_address(mut self, address: Option<String>) -> Self {
        self.redis_address = address;
        self
    }

    #[must_use]
    pub fn with_redis_password(mut self, password: Option<SecretString>) -> Self {
        self.redis_password = password;
        self
    }

    #[must_use]
    pub fn with_google_oauth(mut self, provider: Option<OauthProvider>) -> Self {
        self.google_oauth = provider;
        self
    }

    #[must_use]
    pub fn with_github_oauth(mut self, provider: Option<OauthProvider>) -> Self {
        self.github_oauth = provider;
        self
    }

    #[must_use]
    pub fn with_access_token_ttl_seconds(mut self, seconds: i64) -> Self {
        self.access_token_ttl_seconds = seconds;
        self
    }

    #[must_use]
    pub fn with_store_timeout_seconds(mut self, seconds: u64) -> Self {
        self.store_timeout_seconds = seconds;
        self
    }

    #[must_use]
    pub fn with_token_metadata(mut self, metadata: BTreeMap<String, String>) -> Self {
        self.token_metadata = metadata;
        self
    }

    #[must_use]
    pub fn with_frontend_base_url(mut self, url: String) -> Self {
        self.frontend_base_url = url;
        self
    }

    /// Resolved scheme after validation: jwt and paseto flags are mutually
    /// exclusive, neither means token issuance is off.
    #[must_use]
    pub const fn scheme(&self) -> AuthScheme {
        if self.jwt_auth {
            AuthScheme::Jwt
        } else if self.paseto_auth {
            AuthScheme::Paseto
        } else {
            AuthScheme::None
        }
    }

    #[must_use]
    pub const fn production(&self) -> bool {
        self.production
    }

    #[must_use]
    pub const fn access_token_ttl_seconds(&self) -> i64 {
        self.access_token_ttl_seconds
    }

    #[must_use]
    pub const fn store_timeout_seconds(&self) -> u64 {
        self.store_timeout_seconds
    }

    #[must_use]
    pub const fn token_metadata(&self) -> &BTreeMap<String, String> {
        &self.token_metadata
    }

    #[must_use]
    pub fn frontend_base_url(&self) -> &str {
        &self.frontend_base_url
    }

    /// Validate that every enabled capability has its secrets present.
    ///
    /// Runs once at bootstrap; any error here must abort the process before
    /// it serves traffic.
    ///
    /// # Errors
    ///
    /// Returns the first missing or malformed value found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.jwt_auth && self.paseto_auth {
            return Err(ConfigError::ConflictingSchemes);
        }

        if self.access_token_ttl_seconds <= 0 {
            return Err(ConfigError::InvalidAccessTtl(self.access_token_ttl_seconds));
        }

        if self.jwt_auth {
            if !has_value(self.jwt_secret.as_ref()) {
                return Err(ConfigError::MissingSecret {
                    capability: "jwt authentication",
                    name: "AUTHKIT_JWT_SECRET",
                });
            }
            info!(scheme = "jwt", "using jwt bearer tokens");
        }

        if self.paseto_auth {
            let key = self.paseto_key.as_ref().ok_or(ConfigError::MissingSecret {
                capability: "paseto authentication",
                name: "AUTHKIT_PASETO_KEY",
            })?;
            if key.expose_secret().is_empty() {
                return Err(ConfigError::MissingSecret {
                    capability: "paseto authentication",
                    name: "AUTHKIT_PASETO_KEY",
                });
            }
            decode_paseto_key(key)?;
            info!(scheme = "paseto", "using paseto bearer tokens");
        }

        if self.session_store_redis {
            if !self
                .redis_address
                .as_ref()
                .is_some_and(|address| !address.is_empty())
            {
                return Err(ConfigError::MissingSecret {
                    capability: "redis session store",
                    name: "AUTHKIT_REDIS_ADDRESS",
                });
            }
            info!("using redis as session store");
        }

        if let Some(provider) = &self.google_oauth {
            if !provider.is_complete() {
                return Err(ConfigError::MissingSecret {
                    capability: "google oauth",
                    name: "AUTHKIT_GOOGLE_CLIENT_ID/SECRET/REDIRECT_URL",
                });
            }
            info!("using google oauth");
        }

        if let Some(provider) = &self.github_oauth {
            if !provider.is_complete() {
                return Err(ConfigError::MissingSecret {
                    capability: "github oauth",
                    name: "AUTHKIT_GITHUB_CLIENT_ID/SECRET/REDIRECT_URL",
                });
            }
            info!("using github oauth");
        }

        Ok(())
    }

    /// Build the token codec for the active scheme, or `None` when disabled.
    ///
    /// Secret presence was checked by [`Settings::validate`]; the codec
    /// constructors re-check it on their own.
    ///
    /// # Errors
    ///
    /// Returns an error if the secret material is missing or malformed.
    pub fn build_codec(&self) -> Result<Option<SchemeCodec>, ConfigError> {
        match self.scheme() {
            AuthScheme::Jwt => {
                let secret = self.jwt_secret.as_ref().ok_or(ConfigError::MissingSecret {
                    capability: "jwt authentication",
                    name: "AUTHKIT_JWT_SECRET",
                })?;
                let codec = SchemeCodec::jwt(secret.expose_secret().as_bytes())
                    .map_err(|_| ConfigError::MissingSecret {
                        capability: "jwt authentication",
                        name: "AUTHKIT_JWT_SECRET",
                    })?;
                Ok(Some(codec))
            }
            AuthScheme::Paseto => {
                let key = self.paseto_key.as_ref().ok_or(ConfigError::MissingSecret {
                    capability: "paseto authentication",
                    name: "AUTHKIT_PASETO_KEY",
                })?;
                let key_bytes = decode_paseto_key(key)?;
                let codec = SchemeCodec::paseto(&key_bytes)
                    .map_err(|_| ConfigError::InvalidPasetoKey)?;
                Ok(Some(codec))
            }
            AuthScheme::None => Ok(None),
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Settings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Settings")
            .field("scheme", &self.scheme().as_str())
            .field("jwt_secret", &self.jwt_secret.as_ref().map(|_| "***"))
            .field("paseto_key", &self.paseto_key.as_ref().map(|_| "***"))
            .field("production", &self.production)
            .field("session", &self.session)
            .field("session_store_redis", &self.session_store_redis)
            .field("redis_address", &self.redis_address)
            .field("redis_password", &self.redis_password.as_ref().map(|_| "***"))
            .field("google_oauth", &self.google_oauth)
            .field("github_oauth", &self.github_oauth)
            .field("access_token_ttl_seconds", &self.access_token_ttl_seconds)
            .field("store_timeout_seconds", &self.store_timeout_seconds)
            .field("token_metadata", &self.token_metadata)
            .field("frontend_base_url", &self.frontend_base_url)
            .finish()
    }
}

fn has_value(secret: Option<&SecretString>) -> bool {
    secret.is_some_and(|secret| !secret.expose_secret().is_empty())
}

fn decode_paseto_key(key: &SecretString) -> Result<Vec<u8>, ConfigError> {
    let bytes = base64::engine::general_purpose::STANDARD
        .decode(key.expose_secret().trim())
        .map_err(|_| ConfigError::InvalidPasetoKey)?;
    if bytes.len() != PASETO_KEY_BYTES {
        return Err(ConfigError::InvalidPasetoKey);
    }
    Ok(bytes)
}
