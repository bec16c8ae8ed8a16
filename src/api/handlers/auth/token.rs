//! Signed session tokens (HS256 JWT).
//!
//! Tokens are never stored server-side; possession of a token whose signature
//! verifies under the process secret and whose `exp` has not passed is the
//! whole session. There is no renewal: once it expires the administrator logs
//! in again.

use jsonwebtoken::{
    Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode, errors::ErrorKind,
};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// HS256 keys shorter than the digest size are trivially brute-forced.
pub const MIN_SECRET_BYTES: usize = 32;

#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    #[error("signing key is missing")]
    MissingKey,
    #[error("signing key must be at least {MIN_SECRET_BYTES} bytes")]
    WeakKey,
    #[error("token expired")]
    Expired,
    #[error("invalid token signature")]
    InvalidSignature,
    #[error("malformed token: {0}")]
    Malformed(jsonwebtoken::errors::Error),
    #[error("failed to sign token: {0}")]
    Encode(jsonwebtoken::errors::Error),
}

impl From<jsonwebtoken::errors::Error> for TokenError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        match err.kind() {
            ErrorKind::ExpiredSignature => Self::Expired,
            ErrorKind::InvalidSignature => Self::InvalidSignature,
            _ => Self::Malformed(err),
        }
    }
}

/// Claims carried by a session token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionClaims {
    /// Administrator username.
    pub sub: String,
    pub role: String,
    pub iat: i64,
    pub exp: i64,
}

pub struct TokenCodec {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
}

impl std::fmt::Debug for TokenCodec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenCodec").finish_non_exhaustive()
    }
}

impl TokenCodec {
    /// Build a codec from the process signing secret.
    ///
    /// # Errors
    /// Returns `TokenError::MissingKey` for an empty secret and
    /// `TokenError::WeakKey` for one shorter than [`MIN_SECRET_BYTES`].
    pub fn new(secret: &SecretString) -> Result<Self, TokenError> {
        let bytes = secret.expose_secret().as_bytes();
        if bytes.is_empty() {
            return Err(TokenError::MissingKey);
        }
        if bytes.len() < MIN_SECRET_BYTES {
            return Err(TokenError::WeakKey);
        }

        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.validate_exp = true;
        validation.set_required_spec_claims(&["exp", "iat", "sub"]);

        Ok(Self {
            encoding: EncodingKey::from_secret(bytes),
            decoding: DecodingKey::from_secret(bytes),
            validation,
        })
    }

    /// Issue a token for `subject` with `role`, valid for `lifetime` from now.
    ///
    /// # Errors
    /// Returns `TokenError::Encode` if signing fails.
    pub fn issue(&self, subject: &str, role: &str, lifetime: Duration) -> Result<String, TokenError> {
        self.issue_at(subject, role, lifetime, unix_now())
    }

    pub(crate) fn issue_at(
        &self,
        subject: &str,
        role: &str,
        lifetime: Duration,
        now_unix_seconds: i64,
    ) -> Result<String, TokenError> {
        let lifetime = i64::try_from(lifetime.as_secs()).unwrap_or(i64::MAX);
        let claims = SessionClaims {
            sub: subject.to_string(),
            role: role.to_string(),
            iat: now_unix_seconds,
            exp: now_unix_seconds.saturating_add(lifetime),
        };
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding).map_err(TokenError::Encode)
    }

    /// Verify signature, expiry and claim presence, returning the claims.
    ///
    /// Untrusted input never panics; every failure is a `TokenError`.
    ///
    /// # Errors
    /// Returns `TokenError::Expired`, `TokenError::InvalidSignature` or
    /// `TokenError::Malformed`.
    pub fn verify(&self, token: &str) -> Result<SessionClaims, TokenError> {
        let data = decode::<SessionClaims>(token, &self.decoding, &self.validation)?;
        Ok(data.claims)
    }
}

fn unix_now() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |elapsed| i64::try_from(elapsed.as_secs()).unwrap_or(i64::MAX))
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;

    const SECRET: &str = "0123456789abcdef0123456789abcdef";
    const OTHER_SECRET: &str = "fedcba9876543210fedcba9876543210";
    const HOUR: Duration = Duration::from_secs(60 * 60);

    fn codec(secret: &str) -> Result<TokenCodec> {
        Ok(TokenCodec::new(&SecretString::from(secret.to_string()))?)
    }

    #[test]
    fn issued_token_verifies_with_claims() -> Result<()> {
        let codec = codec(SECRET)?;
        let token = codec.issue("admin", "admin", HOUR)?;
        let claims = codec.verify(&token)?;

        assert_eq!(claims.sub, "admin");
        assert_eq!(claims.role, "admin");
        assert_eq!(claims.exp - claims.iat, 3600);
        Ok(())
    }

    #[test]
    fn expired_token_is_rejected() -> Result<()> {
        let codec = codec(SECRET)?;
        let two_hours_ago = unix_now() - 2 * 3600;
        let token = codec.issue_at("admin", "admin", HOUR, two_hours_ago)?;

        assert!(matches!(codec.verify(&token), Err(TokenError::Expired)));
        Ok(())
    }

    #[test]
    fn token_from_another_key_is_rejected() -> Result<()> {
        let token = codec(OTHER_SECRET)?.issue("admin", "admin", HOUR)?;

        assert!(matches!(
            codec(SECRET)?.verify(&token),
            Err(TokenError::InvalidSignature)
        ));
        Ok(())
    }

    #[test]
    fn garbage_is_malformed_not_a_panic() -> Result<()> {
        let codec = codec(SECRET)?;
        for input in ["", "abc", "a.b.c", "....", "eyJhbGciOiJIUzI1NiJ9.e30.x"] {
            assert!(codec.verify(input).is_err(), "accepted {input:?}");
        }
        Ok(())
    }

    #[test]
    fn missing_role_claim_is_rejected() -> Result<()> {
        #[derive(Serialize)]
        struct NoRole {
            sub: String,
            iat: i64,
            exp: i64,
        }

        let now = unix_now();
        let token = encode(
            &Header::new(Algorithm::HS256),
            &NoRole {
                sub: "admin".to_string(),
                iat: now,
                exp: now + 3600,
            },
            &EncodingKey::from_secret(SECRET.as_bytes()),
        )?;

        assert!(matches!(
            codec(SECRET)?.verify(&token),
            Err(TokenError::Malformed(_))
        ));
        Ok(())
    }

    #[test]
    fn empty_and_short_secrets_are_refused() {
        assert!(matches!(
            TokenCodec::new(&SecretString::from(String::new())),
            Err(TokenError::MissingKey)
        ));
        assert!(matches!(
            TokenCodec::new(&SecretString::from("short".to_string())),
            Err(TokenError::WeakKey)
        ));
    }
}
