use crate::Error;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Refresh tokens always live this long; only the access TTL is configurable.
pub const REFRESH_TTL_SECONDS: i64 = 24 * 60 * 60;

/// Discriminates access from refresh tokens inside the signed payload.
///
/// A refresh token presented where an access token is expected (or the other
/// way around) fails validation with [`Error::KindMismatch`].
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TokenKind {
    Access,
    Refresh,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Claims {
    pub sub: String,
    pub role: String,
    pub kind: TokenKind,
    pub iat: i64,
    pub exp: i64,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub metadata: BTreeMap<String, String>,
}

impl Claims {
    /// Check expiry, issued-at sanity, and the kind discriminator.
    ///
    /// Signature/decryption checks happen before this in the scheme codecs;
    /// by the time claims reach here they are authenticated.
    pub(crate) fn validate(
        &self,
        expected_kind: TokenKind,
        now_unix_seconds: i64,
    ) -> Result<(), Error> {
        if self.iat > now_unix_seconds {
            return Err(Error::InvalidIat);
        }
        if self.exp <= now_unix_seconds {
            return Err(Error::Expired);
        }
        if self.kind != expected_kind {
            return Err(Error::KindMismatch);
        }
        Ok(())
    }
}

/// Opaque access/refresh token strings returned to callers.
///
/// Both strings are empty when token issuance is disabled by configuration;
/// callers must treat that as a valid, non-error outcome.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

impl TokenPair {
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.access_token.is_empty() && self.refresh_token.is_empty()
    }
}
