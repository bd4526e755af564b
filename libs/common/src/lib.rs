//! Common library for the Atelier services
//!
//! This crate provides shared functionality used by the auth and api
//! services: database connectivity and migrations, the Redis client, server
//! settings, and JWT verification with token revocation.

pub mod cache;
pub mod config;
pub mod database;
pub mod error;
pub mod token;
