//! JWT service for token issuance
//!
//! Tokens are signed with RS256. Verification is shared with the api service
//! through [`common::token::TokenVerifier`].

use anyhow::Result;
use common::error::TokenError;
use common::token::{Claims, TokenType, TokenVerifier, read_key_material, unix_now};
use jsonwebtoken::{Algorithm, EncodingKey, Header, encode};
use serde::Serialize;
use uuid::Uuid;

use crate::models::User;

/// JWT configuration
#[derive(Debug, Clone)]
pub struct JwtConfig {
    /// Private key for signing tokens
    pub private_key: String,
    /// Public key for verifying tokens
    pub public_key: String,
    /// Access token expiration time in seconds (default: 1 day)
    pub access_token_expiry: u64,
    /// Refresh token expiration time in seconds (default: 7 days)
    pub refresh_token_expiry: u64,
}

impl JwtConfig {
    /// Create a new JwtConfig from environment variables
    ///
    /// # Environment Variables
    /// - `JWT_PRIVATE_KEY`: Private key (PEM) or path to a PEM file
    /// - `JWT_PUBLIC_KEY`: Public key (PEM) or path to a PEM file
    /// - `JWT_ACCESS_TOKEN_EXPIRY`: Access token expiry in seconds (default: 86400)
    /// - `JWT_REFRESH_TOKEN_EXPIRY`: Refresh token expiry in seconds (default: 604800)
    pub fn from_env() -> Result<Self> {
        let private_key = std::env::var("JWT_PRIVATE_KEY")
            .map_err(|_| anyhow::anyhow!("JWT_PRIVATE_KEY environment variable not set"))?;
        let public_key = std::env::var("JWT_PUBLIC_KEY")
            .map_err(|_| anyhow::anyhow!("JWT_PUBLIC_KEY environment variable not set"))?;

        let access_token_expiry = std::env::var("JWT_ACCESS_TOKEN_EXPIRY")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(86400);

        let refresh_token_expiry = std::env::var("JWT_REFRESH_TOKEN_EXPIRY")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(604800);

        Ok(JwtConfig {
            private_key: read_key_material(&private_key)?,
            public_key: read_key_material(&public_key)?,
            access_token_expiry,
            refresh_token_expiry,
        })
    }
}

/// Access/refresh pair handed to clients
#[derive(Debug, Serialize)]
pub struct TokenPair {
    pub access: String,
    pub refresh: String,
    pub token_type: &'static str,
    pub expires_in: u64,
}

/// Tokens issued for a sign-in, with the refresh claims kept for session
/// bookkeeping
pub struct IssuedTokens {
    pub pair: TokenPair,
    pub refresh_claims: Claims,
}

/// JWT service
#[derive(Clone)]
pub struct JwtService {
    encoding_key: EncodingKey,
    verifier: TokenVerifier,
    config: JwtConfig,
}

impl JwtService {
    /// Initialize a new JWT service
    pub fn new(config: JwtConfig) -> Result<Self> {
        let encoding_key = EncodingKey::from_rsa_pem(config.private_key.as_bytes())?;
        let verifier = TokenVerifier::from_public_key_pem(&config.public_key)?;

        Ok(JwtService {
            encoding_key,
            verifier,
            config,
        })
    }

    fn claims_for(&self, user: &User, token_type: TokenType) -> Claims {
        let now = unix_now();
        let lifetime = match token_type {
            TokenType::Access => self.config.access_token_expiry,
            TokenType::Refresh => self.config.refresh_token_expiry,
        };

        Claims {
            sub: user.id,
            roles: vec![user.role.as_str().to_string()],
            iat: now,
            exp: now + lifetime,
            jti: Uuid::new_v4(),
            token_type,
        }
    }

    fn sign(&self, claims: &Claims) -> Result<String> {
        let token = encode(&Header::new(Algorithm::RS256), claims, &self.encoding_key)?;
        Ok(token)
    }

    /// Generate an access token for a user
    pub fn generate_access_token(&self, user: &User) -> Result<String> {
        self.sign(&self.claims_for(user, TokenType::Access))
    }

    /// Generate a refresh token for a user
    pub fn generate_refresh_token(&self, user: &User) -> Result<(String, Claims)> {
        let claims = self.claims_for(user, TokenType::Refresh);
        Ok((self.sign(&claims)?, claims))
    }

    /// Issue a fresh access/refresh pair
    pub fn issue_tokens(&self, user: &User) -> Result<IssuedTokens> {
        let access = self.generate_access_token(user)?;
        let (refresh, refresh_claims) = self.generate_refresh_token(user)?;

        Ok(IssuedTokens {
            pair: TokenPair {
                access,
                refresh,
                token_type: "Bearer",
                expires_in: self.config.access_token_expiry,
            },
            refresh_claims,
        })
    }

    /// Validate a token and return the claims
    pub fn validate_token(&self, token: &str, expected: TokenType) -> Result<Claims, TokenError> {
        self.verifier.verify(token, expected)
    }

    /// Get the refresh token expiry time
    pub fn refresh_token_expiry(&self) -> u64 {
        self.config.refresh_token_expiry
    }
}
