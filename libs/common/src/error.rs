//! Custom error types for the common library
//!
//! This module defines the error types shared by the auth and api services.

use sqlx::Error as SqlxError;
use sqlx::migrate::MigrateError;
use thiserror::Error;

/// Custom error type for database operations
#[derive(Error, Debug)]
pub enum DatabaseError {
    /// Error occurred during database connection
    #[error("Database connection error: {0}")]
    Connection(#[source] SqlxError),

    /// Error occurred during database query execution
    #[error("Database query error: {0}")]
    Query(#[source] SqlxError),

    /// Error occurred during database migration
    #[error("Database migration error: {0}")]
    Migration(#[from] MigrateError),

    /// Configuration error
    #[error("Database configuration error: {0}")]
    Configuration(String),
}

/// Type alias for Result with DatabaseError
pub type DatabaseResult<T> = Result<T, DatabaseError>;

/// Errors raised while checking a bearer token
#[derive(Error, Debug)]
pub enum TokenError {
    /// Signature, expiry or structure check failed
    #[error("invalid token: {0}")]
    Invalid(#[from] jsonwebtoken::errors::Error),

    /// An access token was presented where a refresh token is expected, or
    /// the other way round
    #[error("unexpected token type")]
    WrongType,

    /// Token is blacklisted or was issued before a revocation mark
    #[error("token has been revoked")]
    Revoked,

    /// Key material could not be loaded
    #[error("token key error: {0}")]
    Key(String),

    /// Revocation lookup failed
    #[error("token store error: {0}")]
    Store(#[from] anyhow::Error),
}
