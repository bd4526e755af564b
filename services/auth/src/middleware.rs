//! Middleware for JWT token validation and authentication

use axum::{
    body::Body,
    extract::State,
    http::Request,
    middleware::Next,
    response::Response,
};
use axum_extra::{
    TypedHeader,
    headers::{Authorization, authorization::Bearer},
};
use common::{error::TokenError, token::TokenType};
use tracing::{error, warn};

use crate::{AppState, error::AuthError};

/// Validate the bearer access token and expose its claims to handlers
pub async fn auth_middleware(
    State(state): State<AppState>,
    bearer: Option<TypedHeader<Authorization<Bearer>>>,
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, AuthError> {
    let TypedHeader(Authorization(bearer)) = bearer.ok_or(AuthError::Unauthorized)?;

    let claims = state
        .jwt_service
        .validate_token(bearer.token(), TokenType::Access)
        .map_err(|e| {
            warn!("Rejected access token: {}", e);
            AuthError::Unauthorized
        })?;

    state
        .sessions
        .ensure_active(&claims)
        .await
        .map_err(|e| match e {
            TokenError::Store(e) => {
                error!("Failed to check token revocation: {}", e);
                AuthError::InternalServerError
            }
            _ => AuthError::Unauthorized,
        })?;

    // Claims are used by logout to blacklist the presented token
    req.extensions_mut().insert(claims);

    Ok(next.run(req).await)
}
