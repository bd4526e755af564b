use std::sync::Arc;

use anyhow::Result;
use tracing::info;
use tracing_subscriber::EnvFilter;

mod error;
mod middleware;
mod models;
mod recommender;
mod repositories;
mod routes;
mod state;

use common::{
    cache::{RedisConfig, RedisPool},
    config::ServerConfig,
    database,
    token::{TokenRevocation, TokenVerifier},
};
use tokio::net::TcpListener;

use crate::{
    recommender::{AiServiceConfig, RecommendationClient, Recommender},
    repositories::{
        ClientProfileRepository, StylistProfileRepository, UserRepository, WardrobeRepository,
    },
    state::AppState,
};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!("Starting API service");

    let settings = ServerConfig::load("API", 3001)?;

    // Initialize database connection pool
    let db_config = database::DatabaseConfig::from_env()?;
    let pool = database::init_pool(&db_config).await?;
    database::health_check(&pool).await?;
    database::run_migrations(&pool).await?;

    // Token verification and the shared revocation store
    let token_verifier = TokenVerifier::from_env()?;
    let redis_pool = RedisPool::new(&RedisConfig::from_env()?).await?;

    // AI recommendation service
    let ai_config = AiServiceConfig::from_env()?;
    info!("AI recommendation endpoint: {}", ai_config.endpoint());
    let ai_client = RecommendationClient::new(&ai_config)?;

    let client_profiles = ClientProfileRepository::new(pool.clone());
    let wardrobe = WardrobeRepository::new(pool.clone());

    let app_state = AppState {
        token_verifier,
        revocation: TokenRevocation::new(redis_pool),
        user_repository: UserRepository::new(pool.clone()),
        stylist_profiles: StylistProfileRepository::new(pool.clone()),
        recommender: Recommender::new(
            Arc::new(client_profiles.clone()),
            Arc::new(wardrobe.clone()),
            ai_client,
        ),
        client_profiles,
        wardrobe,
        db_pool: pool,
        settings: settings.clone(),
    };

    info!("API service initialized successfully");

    // Start the web server
    let app = routes::create_router(app_state);

    let listener = TcpListener::bind(settings.bind_address()).await?;
    info!("API service listening on {}", settings.bind_address());

    axum::serve(listener, app).await?;

    Ok(())
}
