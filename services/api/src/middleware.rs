//! Authentication middleware for JWT token validation

use axum::{body::Body, extract::State, http::Request, middleware::Next, response::Response};
use axum_extra::{
    TypedHeader,
    headers::{Authorization, authorization::Bearer},
};
use common::{error::TokenError, token::TokenType};
use tracing::{error, warn};
use uuid::Uuid;

use crate::{error::ApiError, state::AppState};

/// Authenticated user information
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: Uuid,
    pub roles: Vec<String>,
}

impl AuthUser {
    /// Fail with 403 unless the token carries `role`
    pub fn require_role(&self, role: &str) -> Result<(), ApiError> {
        if self.roles.iter().any(|r| r == role) {
            Ok(())
        } else {
            Err(ApiError::Forbidden)
        }
    }
}

/// Authentication middleware
///
/// Verifies the bearer access token with the auth service's public key and
/// checks it against the shared blacklist and revocation marks.
pub async fn auth_middleware(
    State(state): State<AppState>,
    bearer: Option<TypedHeader<Authorization<Bearer>>>,
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, ApiError> {
    let TypedHeader(Authorization(bearer)) = bearer.ok_or(ApiError::Unauthorized)?;

    let claims = state
        .token_verifier
        .verify(bearer.token(), TokenType::Access)
        .map_err(|e| {
            warn!("Rejected access token: {}", e);
            ApiError::Unauthorized
        })?;

    state
        .revocation
        .ensure_active(&claims)
        .await
        .map_err(|e| match e {
            TokenError::Store(e) => {
                error!("Failed to check token revocation: {}", e);
                ApiError::InternalServerError
            }
            _ => ApiError::Unauthorized,
        })?;

    req.extensions_mut().insert(AuthUser {
        id: claims.sub,
        roles: claims.roles,
    });

    Ok(next.run(req).await)
}
