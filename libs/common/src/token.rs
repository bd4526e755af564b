//! JWT claims, verification and revocation shared by both services
//!
//! Tokens are signed with RS256 by the auth service. Every service holding
//! the public key can verify them; revocation state lives in Redis so a
//! logout or password change takes effect everywhere.

use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode};
use serde::{Deserialize, Serialize};
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use uuid::Uuid;

use crate::cache::RedisPool;
use crate::error::TokenError;

/// JWT claims structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// User ID
    pub sub: Uuid,
    /// User roles
    pub roles: Vec<String>,
    /// Issued at time
    pub iat: u64,
    /// Expiration time
    pub exp: u64,
    /// Unique token identifier, used as the blacklist key
    pub jti: Uuid,
    /// Token type (access or refresh)
    pub token_type: TokenType,
}

impl Claims {
    /// Seconds until this token expires, zero if already expired
    pub fn remaining_lifetime(&self, now: u64) -> u64 {
        self.exp.saturating_sub(now)
    }
}

/// Token type enum
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
pub enum TokenType {
    /// Access token
    Access,
    /// Refresh token
    Refresh,
}

/// Current UNIX time in seconds
pub fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default()
}

/// Time left until the wall clock reaches the next whole second
pub fn until_next_second() -> Duration {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.subsec_nanos())
        .unwrap_or_default();
    Duration::from_secs(1) - Duration::from_nanos(u64::from(nanos))
}

/// Resolve key material given either inline PEM or a path to a PEM file
pub fn read_key_material(value: &str) -> Result<String, TokenError> {
    if value.trim_start().starts_with("-----BEGIN") {
        return Ok(value.to_string());
    }

    std::fs::read_to_string(value)
        .map(|pem| pem.trim().to_string())
        .map_err(|e| TokenError::Key(format!("failed to read key file {}: {}", value, e)))
}

/// Verifies RS256 tokens with the auth service's public key
#[derive(Clone)]
pub struct TokenVerifier {
    decoding_key: DecodingKey,
    validation: Validation,
}

impl TokenVerifier {
    /// Build a verifier from a PEM encoded public key
    pub fn from_public_key_pem(pem: &str) -> Result<Self, TokenError> {
        let decoding_key = DecodingKey::from_rsa_pem(pem.as_bytes())?;
        let mut validation = Validation::new(Algorithm::RS256);
        validation.validate_exp = true;
        validation.leeway = 0;

        Ok(Self {
            decoding_key,
            validation,
        })
    }

    /// Build a verifier from `JWT_PUBLIC_KEY` (inline PEM or file path)
    pub fn from_env() -> Result<Self, TokenError> {
        let value = std::env::var("JWT_PUBLIC_KEY")
            .map_err(|_| TokenError::Key("JWT_PUBLIC_KEY environment variable not set".into()))?;
        Self::from_public_key_pem(&read_key_material(&value)?)
    }

    /// Check signature and expiry, then the token type
    pub fn verify(&self, token: &str, expected: TokenType) -> Result<Claims, TokenError> {
        let claims = decode::<Claims>(token, &self.decoding_key, &self.validation)?.claims;
        if claims.token_type != expected {
            return Err(TokenError::WrongType);
        }
        Ok(claims)
    }
}

/// True when a token issued at `iat` is not newer than the revocation `mark`
///
/// `iat` has second granularity, so a token issued in the same second as
/// the mark counts as revoked.
pub fn issued_before_mark(iat: u64, mark: Option<u64>) -> bool {
    matches!(mark, Some(mark) if iat <= mark)
}

/// Redis backed token blacklist and per-user revocation marks
#[derive(Clone)]
pub struct TokenRevocation {
    redis: RedisPool,
}

impl TokenRevocation {
    pub fn new(redis: RedisPool) -> Self {
        Self { redis }
    }

    fn blacklist_key(jti: &Uuid) -> String {
        format!("blacklisted_token:{}", jti)
    }

    fn mark_key(user_id: &Uuid) -> String {
        format!("tokens_revoked_before:{}", user_id)
    }

    /// Blacklist a single token for the rest of its lifetime
    pub async fn blacklist(&self, claims: &Claims) -> anyhow::Result<()> {
        let ttl = claims.remaining_lifetime(unix_now());
        self.redis
            .set(&Self::blacklist_key(&claims.jti), "1", Some(ttl))
            .await
    }

    /// Invalidate every token issued to `user_id` up to now
    ///
    /// The mark must outlive the longest token lifetime, so `ttl` is the
    /// refresh token expiry. Returns once the clock has moved past the
    /// marked second, so tokens issued afterwards stay valid.
    pub async fn revoke_all(&self, user_id: Uuid, ttl: u64) -> anyhow::Result<()> {
        let now = unix_now();
        self.redis
            .set(&Self::mark_key(&user_id), &now.to_string(), Some(ttl))
            .await?;
        tokio::time::sleep(until_next_second()).await;
        Ok(())
    }

    /// Reject blacklisted tokens and tokens older than the user's mark
    pub async fn ensure_active(&self, claims: &Claims) -> Result<(), TokenError> {
        if self
            .redis
            .get(&Self::blacklist_key(&claims.jti))
            .await?
            .is_some()
        {
            return Err(TokenError::Revoked);
        }

        let mark = self
            .redis
            .get(&Self::mark_key(&claims.sub))
            .await?
            .and_then(|v| v.parse::<u64>().ok());

        if issued_before_mark(claims.iat, mark) {
            return Err(TokenError::Revoked);
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{EncodingKey, Header, encode};

    const TEST_PRIVATE_KEY: &str = include_str!("../testdata/jwt_private.pem");
    const TEST_PUBLIC_KEY: &str = include_str!("../testdata/jwt_public.pem");

    fn sign(claims: &Claims) -> String {
        let key = EncodingKey::from_rsa_pem(TEST_PRIVATE_KEY.as_bytes()).unwrap();
        encode(&Header::new(Algorithm::RS256), claims, &key).unwrap()
    }

    fn claims(token_type: TokenType, exp_offset: i64) -> Claims {
        let now = unix_now();
        Claims {
            sub: Uuid::new_v4(),
            roles: vec!["client".to_string()],
            iat: now,
            exp: now.saturating_add_signed(exp_offset),
            jti: Uuid::new_v4(),
            token_type,
        }
    }

    #[test]
    fn test_verify_round_trip() {
        let verifier = TokenVerifier::from_public_key_pem(TEST_PUBLIC_KEY).unwrap();
        let original = claims(TokenType::Access, 60);

        let verified = verifier
            .verify(&sign(&original), TokenType::Access)
            .unwrap();
        assert_eq!(verified.sub, original.sub);
        assert_eq!(verified.roles, vec!["client".to_string()]);
    }

    #[test]
    fn test_verify_rejects_wrong_type() {
        let verifier = TokenVerifier::from_public_key_pem(TEST_PUBLIC_KEY).unwrap();
        let token = sign(&claims(TokenType::Refresh, 60));

        assert!(matches!(
            verifier.verify(&token, TokenType::Access),
            Err(TokenError::WrongType)
        ));
    }

    #[test]
    fn test_verify_rejects_expired() {
        let verifier = TokenVerifier::from_public_key_pem(TEST_PUBLIC_KEY).unwrap();
        let token = sign(&claims(TokenType::Access, -120));

        assert!(matches!(
            verifier.verify(&token, TokenType::Access),
            Err(TokenError::Invalid(_))
        ));
    }

    #[test]
    fn test_verify_rejects_tampered_token() {
        let verifier = TokenVerifier::from_public_key_pem(TEST_PUBLIC_KEY).unwrap();
        let mut token = sign(&claims(TokenType::Access, 60));
        token.push('x');

        assert!(verifier.verify(&token, TokenType::Access).is_err());
    }

    #[test]
    fn test_issued_before_mark() {
        assert!(!issued_before_mark(100, None));
        assert!(issued_before_mark(99, Some(100)));
        assert!(!issued_before_mark(101, Some(100)));
    }

    #[test]
    fn test_token_from_the_revocation_second_is_revoked() {
        assert!(issued_before_mark(100, Some(100)));
    }

    #[test]
    fn test_until_next_second() {
        let wait = until_next_second();
        assert!(wait > Duration::ZERO);
        assert!(wait <= Duration::from_secs(1));
    }

    #[test]
    fn test_read_key_material_inline() {
        let pem = read_key_material(TEST_PUBLIC_KEY).unwrap();
        assert_eq!(pem, TEST_PUBLIC_KEY);
    }

    #[test]
    fn test_read_key_material_missing_file() {
        assert!(matches!(
            read_key_material("/nonexistent/key.pem"),
            Err(TokenError::Key(_))
        ));
    }

    #[test]
    fn test_remaining_lifetime_saturates() {
        let c = claims(TokenType::Access, 30);
        assert_eq!(c.remaining_lifetime(c.exp + 10), 0);
        assert_eq!(c.remaining_lifetime(c.exp - 10), 10);
    }
}
