//! API service routes

use axum::{
    Extension, Json, Router,
    extract::{Path, Query, State, rejection::JsonRejection},
    http::StatusCode,
    middleware,
    response::IntoResponse,
    routing::{get, post},
};
use common::database;
use serde_json::json;
use tracing::info;
use uuid::Uuid;

use crate::{
    error::{ApiError, ApiResult, internal},
    middleware::{AuthUser, auth_middleware},
    models::{
        Page, PageQuery, UserSummary,
        profile::{
            ClientProfileResponse, PublicStylist, StylistProfileResponse, UpdateClientProfile,
            UpdateStylistProfile,
        },
        recommendation::{RecommendRequest, RecommendResponse},
        wardrobe::{NewWardrobeItem, UpdateWardrobeItem, WardrobeItem},
    },
    recommender::{ItemSource, RecommendationInput},
    state::AppState,
};

const CLIENT: &str = "client";
const STYLIST: &str = "stylist";

/// Create the router for the API service
pub fn create_router(state: AppState) -> Router {
    let client_routes = Router::new()
        .route("/me", get(get_client_profile).patch(update_client_profile))
        .route("/wardrobe", get(list_wardrobe).post(create_wardrobe_item))
        .route(
            "/wardrobe/:id",
            get(get_wardrobe_item)
                .patch(update_wardrobe_item)
                .delete(delete_wardrobe_item),
        )
        .route("/stylists", get(list_stylists))
        .route("/stylists/:user_id", get(get_stylist))
        .route("/recommendations", post(recommend))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    let stylist_routes = Router::new()
        .route("/me", get(get_stylist_profile).patch(update_stylist_profile))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    Router::new()
        .route("/health", get(health_check))
        .nest("/client", client_routes)
        .nest("/stylist", stylist_routes)
        .with_state(state)
}

/// Health check endpoint
pub async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let database = match database::health_check(&state.db_pool).await {
        Ok(_) => "ok".to_string(),
        Err(e) => format!("error: {}", e),
    };

    let healthy = database == "ok";
    let status = if healthy {
        StatusCode::OK
    } else {
        StatusCode::INTERNAL_SERVER_ERROR
    };

    (
        status,
        Json(json!({
            "status": if healthy { "ok" } else { "error" },
            "service": "api-service",
            "database": database,
            "environment": state.settings.environment,
            "version": state.settings.version,
        })),
    )
}

async fn load_user(state: &AppState, id: Uuid) -> ApiResult<UserSummary> {
    state
        .user_repository
        .find_summary(id)
        .await
        .map_err(internal("Failed to load user"))?
        .ok_or_else(|| ApiError::NotFound("User not found.".to_string()))
}

/// Get the caller's client profile
pub async fn get_client_profile(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> ApiResult<Json<ClientProfileResponse>> {
    user.require_role(CLIENT)?;

    let summary = load_user(&state, user.id).await?;
    let profile = state
        .client_profiles
        .get_or_create(user.id)
        .await
        .map_err(internal("Failed to load client profile"))?;

    Ok(Json(ClientProfileResponse {
        user: summary,
        profile,
    }))
}

/// Partially update the caller's client profile
pub async fn update_client_profile(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    payload: Result<Json<UpdateClientProfile>, JsonRejection>,
) -> ApiResult<Json<ClientProfileResponse>> {
    user.require_role(CLIENT)?;
    let Json(changes) = payload?;
    changes.validate().map_err(ApiError::BadRequest)?;

    let summary = load_user(&state, user.id).await?;
    let profile = state
        .client_profiles
        .update(user.id, &changes)
        .await
        .map_err(internal("Failed to update client profile"))?;

    Ok(Json(ClientProfileResponse {
        user: summary,
        profile,
    }))
}

/// List the caller's wardrobe, newest first
pub async fn list_wardrobe(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Query(query): Query<PageQuery>,
) -> ApiResult<Json<Page<WardrobeItem>>> {
    user.require_role(CLIENT)?;

    let (count, items) = state
        .wardrobe
        .list(user.id, &query)
        .await
        .map_err(internal("Failed to list wardrobe"))?;

    Ok(Json(Page::new(&query, count, items)))
}

/// Add an item to the caller's wardrobe
pub async fn create_wardrobe_item(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    payload: Result<Json<NewWardrobeItem>, JsonRejection>,
) -> ApiResult<impl IntoResponse> {
    user.require_role(CLIENT)?;
    let Json(item) = payload?;
    item.validate().map_err(ApiError::BadRequest)?;

    let created = state
        .wardrobe
        .create(user.id, &item)
        .await
        .map_err(internal("Failed to create wardrobe item"))?;

    Ok((StatusCode::CREATED, Json(created)))
}

fn item_not_found() -> ApiError {
    ApiError::NotFound("Wardrobe item not found.".to_string())
}

/// Get one of the caller's wardrobe items
pub async fn get_wardrobe_item(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<i64>,
) -> ApiResult<Json<WardrobeItem>> {
    user.require_role(CLIENT)?;

    state
        .wardrobe
        .find(user.id, id)
        .await
        .map_err(internal("Failed to load wardrobe item"))?
        .map(Json)
        .ok_or_else(item_not_found)
}

/// Partially update one of the caller's wardrobe items
pub async fn update_wardrobe_item(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<i64>,
    payload: Result<Json<UpdateWardrobeItem>, JsonRejection>,
) -> ApiResult<Json<WardrobeItem>> {
    user.require_role(CLIENT)?;
    let Json(changes) = payload?;
    changes.validate().map_err(ApiError::BadRequest)?;

    state
        .wardrobe
        .update(user.id, id, &changes)
        .await
        .map_err(internal("Failed to update wardrobe item"))?
        .map(Json)
        .ok_or_else(item_not_found)
}

/// Delete one of the caller's wardrobe items
pub async fn delete_wardrobe_item(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<i64>,
) -> ApiResult<StatusCode> {
    user.require_role(CLIENT)?;

    let deleted = state
        .wardrobe
        .delete(user.id, id)
        .await
        .map_err(internal("Failed to delete wardrobe item"))?;

    if deleted {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(item_not_found())
    }
}

/// Browse active stylists, best rated first
pub async fn list_stylists(
    State(state): State<AppState>,
    Query(query): Query<PageQuery>,
) -> ApiResult<Json<Page<PublicStylist>>> {
    let (count, stylists) = state
        .stylist_profiles
        .list_public(&query)
        .await
        .map_err(internal("Failed to list stylists"))?;

    Ok(Json(Page::new(&query, count, stylists)))
}

/// Public profile of one stylist
pub async fn get_stylist(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
) -> ApiResult<Json<PublicStylist>> {
    state
        .stylist_profiles
        .find_public(user_id)
        .await
        .map_err(internal("Failed to load stylist"))?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound("Stylist not found.".to_string()))
}

/// Get the caller's stylist profile
pub async fn get_stylist_profile(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> ApiResult<Json<StylistProfileResponse>> {
    user.require_role(STYLIST)?;

    let summary = load_user(&state, user.id).await?;
    let profile = state
        .stylist_profiles
        .get_or_create(user.id)
        .await
        .map_err(internal("Failed to load stylist profile"))?;

    Ok(Json(StylistProfileResponse {
        user: summary,
        profile,
    }))
}

/// Update the owner-editable parts of the caller's stylist profile
pub async fn update_stylist_profile(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    payload: Result<Json<UpdateStylistProfile>, JsonRejection>,
) -> ApiResult<Json<StylistProfileResponse>> {
    user.require_role(STYLIST)?;
    let Json(changes) = payload?;
    changes.validate().map_err(ApiError::BadRequest)?;

    let summary = load_user(&state, user.id).await?;
    let profile = state
        .stylist_profiles
        .update(user.id, &changes)
        .await
        .map_err(internal("Failed to update stylist profile"))?;

    Ok(Json(StylistProfileResponse {
        user: summary,
        profile,
    }))
}

/// Outfit recommendations for the caller
pub async fn recommend(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    payload: Result<Json<RecommendRequest>, JsonRejection>,
) -> ApiResult<Json<RecommendResponse>> {
    user.require_role(CLIENT)?;
    let Json(request) = payload?;
    request.validate().map_err(ApiError::BadRequest)?;

    info!(
        "Recommendation requested by user {} ({} override items)",
        user.id,
        request.drawer_products.len()
    );

    let response = state
        .recommender
        .recommend(RecommendationInput {
            user_id: user.id,
            destination: request.destination.trim().to_string(),
            occasion: request.occasion.trim().to_string(),
            requested_at: request.datetime,
            items: ItemSource::from_request(request.drawer_products),
        })
        .await?;

    Ok(Json(response))
}
