use crate::claims::{Claims, TokenKind};
use crate::Error;
use base64ct::{Base64UrlUnpadded, Encoding};
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TokenHeader {
    pub alg: String,
    pub typ: String,
}

impl TokenHeader {
    fn hs256() -> Self {
        Self {
            alg: "HS256".to_string(),
            typ: "JWT".to_string(),
        }
    }
}

fn b64e_json<T: Serialize>(value: &T) -> Result<String, Error> {
    let json = serde_json::to_vec(value)?;
    Ok(Base64UrlUnpadded::encode_string(&json))
}

fn b64d_json<T: for<'de> Deserialize<'de>>(s: &str) -> Result<T, Error> {
    let bytes = Base64UrlUnpadded::decode_vec(s).map_err(|_| Error::Base64)?;
    Ok(serde_json::from_slice(&bytes)?)
}

/// HMAC-SHA256 signed compact tokens, bound to one secret at construction.
#[derive(Clone)]
pub struct JwtCodec {
    secret: Vec<u8>,
}

impl JwtCodec {
    /// Bind a codec to a signing secret.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MissingSecret`] for an empty secret; presence is
    /// also checked at bootstrap.
    pub fn new(secret: &[u8]) -> Result<Self, Error> {
        if secret.is_empty() {
            return Err(Error::MissingSecret);
        }
        Ok(Self {
            secret: secret.to_vec(),
        })
    }

    /// Create an HS256 signed compact token for the given claims.
    ///
    /// # Errors
    ///
    /// Returns an error if claims/header JSON cannot be encoded or the secret
    /// is rejected by the MAC.
    pub fn sign(&self, claims: &Claims) -> Result<String, Error> {
        let header_b64 = b64e_json(&TokenHeader::hs256())?;
        let claims_b64 = b64e_json(claims)?;
        let signing_input = format!("{header_b64}.{claims_b64}");

        let mut mac =
            HmacSha256::new_from_slice(&self.secret).map_err(|_| Error::MissingSecret)?;
        mac.update(signing_input.as_bytes());
        let tag = mac.finalize().into_bytes();
        let signature_b64 = Base64UrlUnpadded::encode_string(&tag);

        Ok(format!("{signing_input}.{signature_b64}"))
    }

    /// Verify an HS256 compact token and return its decoded claims.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - the token is malformed or contains invalid base64/json,
    /// - the header algorithm is anything other than HS256,
    /// - the signature is invalid,
    /// - the claims fail validation (`iat`, `exp`, kind).
    pub fn verify(
        &self,
        token: &str,
        expected_kind: TokenKind,
        now_unix_seconds: i64,
    ) -> Result<Claims, Error> {
        let mut parts = token.split('.');
        let header_b64 = parts.next().ok_or(Error::TokenFormat)?;
        let claims_b64 = parts.next().ok_or(Error::TokenFormat)?;
        let sig_b64 = parts.next().ok_or(Error::TokenFormat)?;
        if parts.next().is_some() {
            return Err(Error::TokenFormat);
        }

        // Algorithm pinning happens before any cryptographic work so a forged
        // header cannot downgrade or switch the verification method.
        let header: TokenHeader = b64d_json(header_b64)?;
        if header.alg != "HS256" {
            return Err(Error::UnsupportedAlg(header.alg));
        }

        let signature = Base64UrlUnpadded::decode_vec(sig_b64).map_err(|_| Error::Base64)?;
        let signing_input = format!("{header_b64}.{claims_b64}");
        let mut mac =
            HmacSha256::new_from_slice(&self.secret).map_err(|_| Error::MissingSecret)?;
        mac.update(signing_input.as_bytes());
        mac.verify_slice(&signature)
            .map_err(|_| Error::InvalidSignature)?;

        let claims: Claims = b64d_json(claims_b64)?;
        claims.validate(expected_kind, now_unix_seconds)?;
        Ok(claims)
    }
}

impl std::fmt::Debug for JwtCodec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtCodec").field("secret", &"***").finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    const NOW: i64 = 1_700_000_000;
    const SECRET: &[u8] = b"a-long-enough-test-signing-secret";

    fn test_claims(kind: TokenKind) -> Claims {
        Claims {
            sub: "5f6c1a1e-0000-0000-0000-000000000001".to_string(),
            role: "user".to_string(),
            kind,
            iat: NOW,
            exp: NOW + 180,
            metadata: BTreeMap::new(),
        }
    }

    #[test]
    fn sign_and_verify_round_trip() -> Result<(), Error> {
        let codec = JwtCodec::new(SECRET)?;
        let claims = test_claims(TokenKind::Access);
        let token = codec.sign(&claims)?;

        let verified = codec.verify(&token, TokenKind::Access, NOW)?;
        assert_eq!(verified, claims);
        Ok(())
    }

    #[test]
    fn rejects_empty_secret() {
        assert!(matches!(JwtCodec::new(b""), Err(Error::MissingSecret)));
    }

    #[test]
    fn rejects_wrong_secret() -> Result<(), Error> {
        let codec = JwtCodec::new(SECRET)?;
        let other = JwtCodec::new(b"another-secret-entirely")?;
        let token = codec.sign(&test_claims(TokenKind::Access))?;

        let result = other.verify(&token, TokenKind::Access, NOW);
        assert!(matches!(result, Err(Error::InvalidSignature)));
        Ok(())
    }

    #[test]
    fn rejects_tampered_claims() -> Result<(), Error> {
        let codec = JwtCodec::new(SECRET)?;
        let token = codec.sign(&test_claims(TokenKind::Access))?;

        let mut parts = token.split('.');
        let header = parts.next().ok_or(Error::TokenFormat)?;
        let sig = parts.nth(1).ok_or(Error::TokenFormat)?;
        let mut forged = test_claims(TokenKind::Access);
        forged.role = "admin".to_string();
        let forged_b64 = b64e_json(&forged)?;
        let tampered = format!("{header}.{forged_b64}.{sig}");

        let result = codec.verify(&tampered, TokenKind::Access, NOW);
        assert!(matches!(result, Err(Error::InvalidSignature)));
        Ok(())
    }

    #[test]
    fn rejects_foreign_algorithm() -> Result<(), Error> {
        // A token claiming alg=none must be refused before signature checks.
        let codec = JwtCodec::new(SECRET)?;
        let header = TokenHeader {
            alg: "none".to_string(),
            typ: "JWT".to_string(),
        };
        let token = format!(
            "{}.{}.{}",
            b64e_json(&header)?,
            b64e_json(&test_claims(TokenKind::Access))?,
            Base64UrlUnpadded::encode_string(b"")
        );

        let result = codec.verify(&token, TokenKind::Access, NOW);
        assert!(matches!(result, Err(Error::UnsupportedAlg(alg)) if alg == "none"));
        Ok(())
    }

    #[test]
    fn rejects_expired_token() -> Result<(), Error> {
        let codec = JwtCodec::new(SECRET)?;
        let token = codec.sign(&test_claims(TokenKind::Access))?;

        let result = codec.verify(&token, TokenKind::Access, NOW + 9_999);
        assert!(matches!(result, Err(Error::Expired)));
        Ok(())
    }

    #[test]
    fn rejects_refresh_where_access_expected() -> Result<(), Error> {
        let codec = JwtCodec::new(SECRET)?;
        let token = codec.sign(&test_claims(TokenKind::Refresh))?;

        let result = codec.verify(&token, TokenKind::Access, NOW);
        assert!(matches!(result, Err(Error::KindMismatch)));
        Ok(())
    }

    #[test]
    fn rejects_malformed_token() -> Result<(), Error> {
        let codec = JwtCodec::new(SECRET)?;
        assert!(matches!(
            codec.verify("not-a-token", TokenKind::Access, NOW),
            Err(Error::TokenFormat)
        ));
        assert!(matches!(
            codec.verify("a.b.c.d", TokenKind::Access, NOW),
            Err(Error::TokenFormat)
        ));
        Ok(())
    }

    #[test]
    fn metadata_survives_round_trip() -> Result<(), Error> {
        let codec = JwtCodec::new(SECRET)?;
        let mut claims = test_claims(TokenKind::Access);
        claims
            .metadata
            .insert("tenant".to_string(), "acme".to_string());
        let token = codec.sign(&claims)?;

        let verified = codec.verify(&token, TokenKind::Access, NOW)?;
        assert_eq!(verified.metadata.get("tenant").map(String::as_str), Some("acme"));
        Ok(())
    }
}
