//! Refresh session management using Redis
//!
//! Each issued refresh token owns a session entry keyed by its `jti`. A
//! refresh token is only honoured while its session exists and the token is
//! neither blacklisted nor older than the user's revocation mark.

use anyhow::Result;
use common::cache::RedisPool;
use common::error::TokenError;
use common::token::{Claims, TokenRevocation};
use tracing::info;
use uuid::Uuid;

/// Session manager for handling refresh sessions in Redis
#[derive(Clone)]
pub struct SessionManager {
    redis_pool: RedisPool,
    revocation: TokenRevocation,
    refresh_token_expiry: u64,
}

impl SessionManager {
    /// Create a new session manager
    pub fn new(redis_pool: RedisPool, refresh_token_expiry: u64) -> Self {
        Self {
            revocation: TokenRevocation::new(redis_pool.clone()),
            redis_pool,
            refresh_token_expiry,
        }
    }

    fn session_key(jti: &Uuid) -> String {
        format!("session:{}", jti)
    }

    /// Record the session backing a freshly issued refresh token
    pub async fn create_session(&self, refresh_claims: &Claims) -> Result<()> {
        info!("Creating session for user: {}", refresh_claims.sub);

        self.redis_pool
            .set(
                &Self::session_key(&refresh_claims.jti),
                &refresh_claims.sub.to_string(),
                Some(self.refresh_token_expiry),
            )
            .await
    }

    /// Check that a refresh token still has a live session for its owner
    pub async fn is_session_valid(&self, refresh_claims: &Claims) -> Result<bool> {
        let owner = self
            .redis_pool
            .get(&Self::session_key(&refresh_claims.jti))
            .await?;

        Ok(owner.as_deref() == Some(refresh_claims.sub.to_string().as_str()))
    }

    /// End a session and blacklist its refresh token
    pub async fn end_session(&self, refresh_claims: &Claims) -> Result<()> {
        info!("Ending session for user: {}", refresh_claims.sub);

        self.redis_pool
            .delete(&Self::session_key(&refresh_claims.jti))
            .await?;
        self.revocation.blacklist(refresh_claims).await
    }

    /// Blacklist a single access token
    pub async fn blacklist(&self, claims: &Claims) -> Result<()> {
        self.revocation.blacklist(claims).await
    }

    /// Invalidate every token issued to a user so far (logout from all
    /// devices)
    pub async fn revoke_all(&self, user_id: Uuid) -> Result<()> {
        info!("Revoking all tokens for user: {}", user_id);
        self.revocation
            .revoke_all(user_id, self.refresh_token_expiry)
            .await
    }

    /// Reject blacklisted or revoked tokens
    pub async fn ensure_active(&self, claims: &Claims) -> Result<(), TokenError> {
        self.revocation.ensure_active(claims).await
    }

    /// Get Redis health status
    pub async fn health_check(&self) -> Result<bool> {
        self.redis_pool.health_check().await
    }
}
