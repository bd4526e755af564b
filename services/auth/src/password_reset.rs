//! Password reset tokens
//!
//! A reset token is a random string stored in Redis with a TTL and mapped to
//! the user it was issued for. Tokens are single use.

use anyhow::Result;
use common::cache::RedisPool;
use rand::{Rng, distributions::Alphanumeric};
use uuid::Uuid;

use crate::models::Role;

const TOKEN_LENGTH: usize = 48;

/// Issues and redeems password reset tokens
#[derive(Clone)]
pub struct PasswordResetService {
    redis_pool: RedisPool,
    ttl_seconds: u64,
}

impl PasswordResetService {
    pub fn new(redis_pool: RedisPool, ttl_seconds: u64) -> Self {
        Self {
            redis_pool,
            ttl_seconds,
        }
    }

    /// Reset token lifetime from `PASSWORD_RESET_TTL` (default: 1 day)
    pub fn ttl_from_env() -> u64 {
        std::env::var("PASSWORD_RESET_TTL")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(86400)
    }

    fn key(token: &str) -> String {
        format!("password_reset:{}", token)
    }

    /// Create a reset token for a user
    pub async fn issue(&self, user_id: Uuid) -> Result<String> {
        let token = generate_token();
        self.redis_pool
            .set(
                &Self::key(&token),
                &user_id.to_string(),
                Some(self.ttl_seconds),
            )
            .await?;
        Ok(token)
    }

    /// Look up the user a token was issued for without consuming it
    pub async fn peek(&self, token: &str) -> Result<Option<Uuid>> {
        Ok(self
            .redis_pool
            .get(&Self::key(token))
            .await?
            .and_then(|v| v.parse().ok()))
    }

    /// Consume a token; returns the user only for the first caller
    pub async fn redeem(&self, token: &str) -> Result<Option<Uuid>> {
        Ok(self
            .redis_pool
            .take(&Self::key(token))
            .await?
            .and_then(|v| v.parse().ok()))
    }
}

/// Random URL-safe reset token
pub fn generate_token() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(TOKEN_LENGTH)
        .map(char::from)
        .collect()
}

/// Build the link sent to the user
///
/// Points at the frontend when one is configured, otherwise at the auth
/// service's own confirm endpoint.
pub fn reset_link(frontend_url: Option<&str>, role: Role, token: &str) -> String {
    match frontend_url.map(|u| u.trim_end_matches('/')) {
        Some(base) if !base.is_empty() => {
            format!("{}/{}/reset-password/{}", base, role, token)
        }
        _ => format!("/{}/auth/reset-password/{}", role, token),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_token_shape() {
        let token = generate_token();
        assert_eq!(token.len(), TOKEN_LENGTH);
        assert!(token.chars().all(|c| c.is_ascii_alphanumeric()));
        assert_ne!(token, generate_token());
    }

    #[test]
    fn test_reset_link_with_frontend() {
        assert_eq!(
            reset_link(Some("https://app.example.com/"), Role::Client, "abc"),
            "https://app.example.com/client/reset-password/abc"
        );
    }

    #[test]
    fn test_reset_link_backend_fallback() {
        assert_eq!(
            reset_link(None, Role::Stylist, "abc"),
            "/stylist/auth/reset-password/abc"
        );
        assert_eq!(
            reset_link(Some(""), Role::Client, "abc"),
            "/client/auth/reset-password/abc"
        );
    }
}
