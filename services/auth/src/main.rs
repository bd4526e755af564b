use anyhow::Result;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

mod email;
mod error;
mod jwt;
mod middleware;
mod models;
mod password_reset;
mod rate_limiter;
mod repositories;
mod routes;
mod session;
mod validation;

use common::{cache, config::ServerConfig, database};
use sqlx::PgPool;
use tokio::net::TcpListener;

use crate::{
    email::{EmailConfig, EmailService},
    jwt::JwtService, password_reset::PasswordResetService, rate_limiter::RateLimiter,
    repositories::UserRepository, session::SessionManager,
};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub db_pool: PgPool,
    pub jwt_service: JwtService,
    pub user_repository: UserRepository,
    pub sessions: SessionManager,
    pub password_resets: PasswordResetService,
    pub email: EmailService,
    pub rate_limiter: RateLimiter,
    pub settings: ServerConfig,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!("Starting authentication service");

    let settings = ServerConfig::load("AUTH", 3000)?;

    // Initialize database connection pool
    let db_config = database::DatabaseConfig::from_env()?;
    let pool = database::init_pool(&db_config).await?;
    database::health_check(&pool).await?;
    database::run_migrations(&pool).await?;

    // Initialize JWT service
    let jwt_config = crate::jwt::JwtConfig::from_env()?;
    let jwt_service = JwtService::new(jwt_config)?;

    // Initialize Redis connection pool
    let redis_config = cache::RedisConfig::from_env()?;
    let redis_pool = cache::RedisPool::new(&redis_config).await?;

    // Initialize outgoing mail
    let email_config = EmailConfig::from_env()?;
    let email = EmailService::from_config(email_config.as_ref())?;
    if email.is_configured() {
        info!("Sending mail through SMTP");
    } else {
        warn!("SMTP_HOST not set, outgoing mail will only be logged");
    }

    let app_state = AppState {
        user_repository: UserRepository::new(pool.clone()),
        db_pool: pool,
        sessions: SessionManager::new(redis_pool.clone(), jwt_service.refresh_token_expiry()),
        password_resets: PasswordResetService::new(
            redis_pool,
            PasswordResetService::ttl_from_env(),
        ),
        jwt_service,
        email,
        rate_limiter: RateLimiter::new(rate_limiter::RateLimiterConfig::default()),
        settings: settings.clone(),
    };

    info!("Authentication service initialized successfully");

    // Start the web server
    let app = routes::create_router(app_state);

    let listener = TcpListener::bind(settings.bind_address()).await?;
    info!("Authentication service listening on {}", settings.bind_address());

    axum::serve(listener, app).await?;

    Ok(())
}
