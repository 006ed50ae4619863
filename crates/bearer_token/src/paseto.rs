use crate::claims::{Claims, TokenKind};
use crate::Error;
use pasetors::errors::Error as PasetorsError;
use pasetors::keys::SymmetricKey;
use pasetors::token::UntrustedToken;
use pasetors::version4::{LocalToken, V4};
use pasetors::Local;

/// v4.local keys are exactly 32 bytes.
pub const PASETO_KEY_BYTES: usize = 32;

/// PASETO v4.local tokens: symmetric authenticated encryption over the
/// claims payload. The key is bound once at construction.
pub struct PasetoCodec {
    key: SymmetricKey<V4>,
}

impl PasetoCodec {
    /// Bind a codec to a 32-byte symmetric key.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MissingSecret`] for an empty key and
    /// [`Error::InvalidKeyLength`] for any other length than 32 bytes.
    pub fn new(key_bytes: &[u8]) -> Result<Self, Error> {
        if key_bytes.is_empty() {
            return Err(Error::MissingSecret);
        }
        if key_bytes.len() != PASETO_KEY_BYTES {
            return Err(Error::InvalidKeyLength);
        }
        let key = SymmetricKey::<V4>::from(key_bytes).map_err(|_| Error::InvalidKeyLength)?;
        Ok(Self { key })
    }

    /// Encrypt claims into a v4.local token.
    ///
    /// # Errors
    ///
    /// Returns an error if JSON encoding or encryption fails.
    pub fn encrypt(&self, claims: &Claims) -> Result<String, Error> {
        let payload = serde_json::to_vec(claims)?;
        LocalToken::encrypt(&self.key, &payload, None, None).map_err(|err| map_paseto_error(&err))
    }

    /// Decrypt and validate a v4.local token, returning its claims.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - the token is malformed or fails authenticated decryption,
    /// - the claims fail validation (`iat`, `exp`, kind).
    pub fn decrypt(
        &self,
        token: &str,
        expected_kind: TokenKind,
        now_unix_seconds: i64,
    ) -> Result<Claims, Error> {
        let untrusted =
            UntrustedToken::<Local, V4>::try_from(token).map_err(|err| map_paseto_error(&err))?;
        let trusted = LocalToken::decrypt(&self.key, &untrusted, None, None)
            .map_err(|err| map_paseto_error(&err))?;
        let claims: Claims = serde_json::from_str(trusted.payload())?;
        claims.validate(expected_kind, now_unix_seconds)?;
        Ok(claims)
    }
}

impl std::fmt::Debug for PasetoCodec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PasetoCodec").field("key", &"***").finish()
    }
}

fn map_paseto_error(err: &PasetorsError) -> Error {
    match err {
        PasetorsError::Base64 => Error::Base64,
        PasetorsError::TokenValidation => Error::InvalidSignature,
        PasetorsError::Key => Error::InvalidKeyLength,
        _ => Error::TokenFormat,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    const NOW: i64 = 1_700_000_000;

    fn test_key() -> [u8; PASETO_KEY_BYTES] {
        [7u8; PASETO_KEY_BYTES]
    }

    fn test_claims(kind: TokenKind) -> Claims {
        Claims {
            sub: "5f6c1a1e-0000-0000-0000-000000000002".to_string(),
            role: "user".to_string(),
            kind,
            iat: NOW,
            exp: NOW + 180,
            metadata: BTreeMap::new(),
        }
    }

    #[test]
    fn encrypt_and_decrypt_round_trip() -> Result<(), Error> {
        let codec = PasetoCodec::new(&test_key())?;
        let claims = test_claims(TokenKind::Access);
        let token = codec.encrypt(&claims)?;
        assert!(token.starts_with("v4.local."));

        let decrypted = codec.decrypt(&token, TokenKind::Access, NOW)?;
        assert_eq!(decrypted, claims);
        Ok(())
    }

    #[test]
    fn rejects_empty_key() {
        assert!(matches!(PasetoCodec::new(b""), Err(Error::MissingSecret)));
    }

    #[test]
    fn rejects_short_key() {
        assert!(matches!(
            PasetoCodec::new(&[1u8; 16]),
            Err(Error::InvalidKeyLength)
        ));
    }

    #[test]
    fn rejects_wrong_key() -> Result<(), Error> {
        let codec = PasetoCodec::new(&test_key())?;
        let other = PasetoCodec::new(&[9u8; PASETO_KEY_BYTES])?;
        let token = codec.encrypt(&test_claims(TokenKind::Access))?;

        let result = other.decrypt(&token, TokenKind::Access, NOW);
        assert!(matches!(result, Err(Error::InvalidSignature)));
        Ok(())
    }

    #[test]
    fn rejects_expired_token() -> Result<(), Error> {
        let codec = PasetoCodec::new(&test_key())?;
        let token = codec.encrypt(&test_claims(TokenKind::Access))?;

        let result = codec.decrypt(&token, TokenKind::Access, NOW + 9_999);
        assert!(matches!(result, Err(Error::Expired)));
        Ok(())
    }

    #[test]
    fn rejects_kind_mismatch() -> Result<(), Error> {
        let codec = PasetoCodec::new(&test_key())?;
        let token = codec.encrypt(&test_claims(TokenKind::Refresh))?;

        let result = codec.decrypt(&token, TokenKind::Access, NOW);
        assert!(matches!(result, Err(Error::KindMismatch)));
        Ok(())
    }

    #[test]
    fn rejects_tampered_token() -> Result<(), Error> {
        let codec = PasetoCodec::new(&test_key())?;
        let token = codec.encrypt(&test_claims(TokenKind::Access))?;

        // Flip a character in the ciphertext body.
        let mut tampered: Vec<char> = token.chars().collect();
        let index = tampered.len() - 2;
        tampered[index] = if tampered[index] == 'A' { 'B' } else { 'A' };
        let tampered: String = tampered.into_iter().collect();

        let result = codec.decrypt(&tampered, TokenKind::Access, NOW);
        assert!(result.is_err());
        Ok(())
    }

    #[test]
    fn rejects_garbage_input() -> Result<(), Error> {
        let codec = PasetoCodec::new(&test_key())?;
        assert!(codec
            .decrypt("v2.local.not-a-token", TokenKind::Access, NOW)
            .is_err());
        assert!(codec.decrypt("", TokenKind::Access, NOW).is_err());
        Ok(())
    }
}
