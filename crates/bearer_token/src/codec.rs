use crate::claims::{Claims, TokenKind, TokenPair, REFRESH_TTL_SECONDS};
use crate::jwt::JwtCodec;
use crate::paseto::PasetoCodec;
use crate::Error;
use std::collections::BTreeMap;

/// Token codec bound to exactly one scheme at construction.
///
/// Adding a scheme means adding a variant here plus its codec module; the
/// existing arms never change.
#[derive(Debug)]
pub enum SchemeCodec {
    Jwt(JwtCodec),
    Paseto(PasetoCodec),
}

impl SchemeCodec {
    /// Build a codec for HMAC-signed compact tokens.
    ///
    /// # Errors
    ///
    /// Returns an error for an empty secret.
    pub fn jwt(secret: &[u8]) -> Result<Self, Error> {
        Ok(Self::Jwt(JwtCodec::new(secret)?))
    }

    /// Build a codec for PASETO v4.local tokens.
    ///
    /// # Errors
    ///
    /// Returns an error for an empty or wrong-length key.
    pub fn paseto(key: &[u8]) -> Result<Self, Error> {
        Ok(Self::Paseto(PasetoCodec::new(key)?))
    }

    #[must_use]
    pub const fn scheme_name(&self) -> &'static str {
        match self {
            Self::Jwt(_) => "jwt",
            Self::Paseto(_) => "paseto",
        }
    }

    /// Mint an access/refresh pair for a subject.
    ///
    /// The access token expires `access_ttl_seconds` from `now_unix_seconds`
    /// and carries the metadata map; the refresh token expires after
    /// [`REFRESH_TTL_SECONDS`] and carries no metadata. Both are encoded
    /// independently under the active scheme.
    ///
    /// # Errors
    ///
    /// Returns an error if encoding either token fails.
    pub fn issue(
        &self,
        sub: &str,
        role: &str,
        metadata: &BTreeMap<String, String>,
        access_ttl_seconds: i64,
        now_unix_seconds: i64,
    ) -> Result<TokenPair, Error> {
        let access = Claims {
            sub: sub.to_string(),
            role: role.to_string(),
            kind: TokenKind::Access,
            iat: now_unix_seconds,
            exp: now_unix_seconds + access_ttl_seconds,
            metadata: metadata.clone(),
        };
        let refresh = Claims {
            sub: sub.to_string(),
            role: role.to_string(),
            kind: TokenKind::Refresh,
            iat: now_unix_seconds,
            exp: now_unix_seconds + REFRESH_TTL_SECONDS,
            metadata: BTreeMap::new(),
        };

        Ok(TokenPair {
            access_token: self.encode(&access)?,
            refresh_token: self.encode(&refresh)?,
        })
    }

    /// Validate a token of the expected kind and return its claims.
    ///
    /// # Errors
    ///
    /// Returns an error if the signature/decryption, expiry, or kind check
    /// fails under the active scheme.
    pub fn validate(
        &self,
        token: &str,
        expected_kind: TokenKind,
        now_unix_seconds: i64,
    ) -> Result<Claims, Error> {
        match self {
            Self::Jwt(codec) => codec.verify(token, expected_kind, now_unix_seconds),
            Self::Paseto(codec) => codec.decrypt(token, expected_kind, now_unix_seconds),
        }
    }

    fn encode(&self, claims: &Claims) -> Result<String, Error> {
        match self {
            Self::Jwt(codec) => codec.sign(claims),
            Self::Paseto(codec) => codec.encrypt(claims),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const NOW: i64 = 1_700_000_000;
    const ACCESS_TTL: i64 = 180;

    fn codecs() -> Vec<SchemeCodec> {
        let jwt = SchemeCodec::jwt(b"test-signing-secret").ok();
        let paseto = SchemeCodec::paseto(&[3u8; 32]).ok();
        vec![jwt, paseto].into_iter().flatten().collect()
    }

    #[test]
    fn issue_and_validate_under_both_schemes() -> Result<(), Error> {
        for codec in codecs() {
            let metadata = BTreeMap::from([("tenant".to_string(), "acme".to_string())]);
            let pair = codec.issue("user-1", "admin", &metadata, ACCESS_TTL, NOW)?;
            assert!(!pair.is_empty());

            let access = codec.validate(&pair.access_token, TokenKind::Access, NOW)?;
            assert_eq!(access.sub, "user-1");
            assert_eq!(access.role, "admin");
            assert_eq!(access.kind, TokenKind::Access);
            assert_eq!(access.exp, NOW + ACCESS_TTL);
            assert_eq!(access.metadata.get("tenant").map(String::as_str), Some("acme"));

            let refresh = codec.validate(&pair.refresh_token, TokenKind::Refresh, NOW)?;
            assert_eq!(refresh.kind, TokenKind::Refresh);
            assert_eq!(refresh.exp, NOW + REFRESH_TTL_SECONDS);
            assert!(refresh.metadata.is_empty());
        }
        Ok(())
    }

    #[test]
    fn kind_isolation_under_both_schemes() -> Result<(), Error> {
        for codec in codecs() {
            let pair = codec.issue("user-1", "user", &BTreeMap::new(), ACCESS_TTL, NOW)?;

            let result = codec.validate(&pair.refresh_token, TokenKind::Access, NOW);
            assert!(matches!(result, Err(Error::KindMismatch)));

            let result = codec.validate(&pair.access_token, TokenKind::Refresh, NOW);
            assert!(matches!(result, Err(Error::KindMismatch)));
        }
        Ok(())
    }

    #[test]
    fn access_expires_before_refresh() -> Result<(), Error> {
        for codec in codecs() {
            let pair = codec.issue("user-1", "user", &BTreeMap::new(), ACCESS_TTL, NOW)?;
            let later = NOW + ACCESS_TTL + 1;

            let result = codec.validate(&pair.access_token, TokenKind::Access, later);
            assert!(matches!(result, Err(Error::Expired)));

            let refresh = codec.validate(&pair.refresh_token, TokenKind::Refresh, later);
            assert!(refresh.is_ok());
        }
        Ok(())
    }

    #[test]
    fn tokens_do_not_cross_schemes() -> Result<(), Error> {
        let jwt = SchemeCodec::jwt(b"test-signing-secret")?;
        let paseto = SchemeCodec::paseto(&[3u8; 32])?;

        let pair = jwt.issue("user-1", "user", &BTreeMap::new(), ACCESS_TTL, NOW)?;
        let result = paseto.validate(&pair.access_token, TokenKind::Access, NOW);
        assert!(result.is_err());

        let pair = paseto.issue("user-1", "user", &BTreeMap::new(), ACCESS_TTL, NOW)?;
        let result = jwt.validate(&pair.access_token, TokenKind::Access, NOW);
        assert!(result.is_err());
        Ok(())
    }

    #[test]
    fn scheme_names() -> Result<(), Error> {
        assert_eq!(SchemeCodec::jwt(b"secret")?.scheme_name(), "jwt");
        assert_eq!(SchemeCodec::paseto(&[3u8; 32])?.scheme_name(), "paseto");
        Ok(())
    }
}
