//! Application state shared across handlers

use common::{
    config::ServerConfig,
    token::{TokenRevocation, TokenVerifier},
};
use sqlx::PgPool;

use crate::{
    recommender::Recommender,
    repositories::{
        ClientProfileRepository, StylistProfileRepository, UserRepository, WardrobeRepository,
    },
};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub db_pool: PgPool,
    pub token_verifier: TokenVerifier,
    pub revocation: TokenRevocation,
    pub user_repository: UserRepository,
    pub client_profiles: ClientProfileRepository,
    pub stylist_profiles: StylistProfileRepository,
    pub wardrobe: WardrobeRepository,
    pub recommender: Recommender,
    pub settings: ServerConfig,
}
