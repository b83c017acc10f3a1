use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::info;

use crate::{
    error::AppError,
    models::{DetailsView, EnrichedReview, FavoritePlace, NearbyRestaurant, ProviderReviewSummary},
    state::AppState,
};

/// The public radius unit is meters, full stop. No other unit appears
/// anywhere in the request path.
fn default_radius() -> u32 {
    5000
}

fn default_keyword() -> String {
    "restaurant".to_string()
}

#[derive(Deserialize)]
pub struct NearbyRequest {
    pub location: String,
    #[serde(default = "default_radius")]
    pub radius: u32,
    #[serde(default = "default_keyword")]
    pub keyword: String,
    pub user_id: String,
}

#[derive(Deserialize)]
pub struct DetailsQuery {
    pub user_id: Option<String>,
}

#[derive(Deserialize)]
pub struct ReviewRequest {
    pub user_id: String,
    pub place_id: String,
    pub rating: f32,
    pub text: Option<String>,
    /// Display name supplied by the session layer; denormalized into
    /// the review at write time.
    pub author_name: String,
}

#[derive(Deserialize)]
pub struct FavoriteRequest {
    pub user_id: String,
    pub place_id: String,
}

#[derive(Deserialize)]
pub struct CoordinatesRequest {
    pub latitude: f64,
    pub longitude: f64,
}

pub async fn nearby_restaurants_handler(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<NearbyRequest>,
) -> Result<Json<Vec<NearbyRestaurant>>, AppError> {
    if payload.location.trim().is_empty() {
        return Err(AppError::MissingLocation);
    }

    info!("Finding restaurants near {}...", payload.location);
    let restaurants = state
        .discovery
        .find_nearby(
            &payload.location,
            payload.radius,
            &payload.keyword,
            &payload.user_id,
        )
        .await?;

    Ok(Json(restaurants))
}

pub async fn restaurant_details_handler(
    State(state): State<Arc<AppState>>,
    Path(restaurant_id): Path<String>,
    Query(query): Query<DetailsQuery>,
) -> Result<Json<Option<DetailsView>>, AppError> {
    info!("Fetching details for restaurant ID: {restaurant_id}...");
    let details = state
        .discovery
        .get_details(&restaurant_id, query.user_id.as_deref())
        .await?;

    Ok(Json(details))
}

pub async fn restaurant_reviews_handler(
    State(state): State<Arc<AppState>>,
    Path(restaurant_id): Path<String>,
) -> Result<Json<ProviderReviewSummary>, AppError> {
    info!("Fetching provider reviews for restaurant ID: {restaurant_id}...");
    let summary = state.discovery.provider_reviews(&restaurant_id).await?;

    Ok(Json(summary))
}

pub async fn place_reviews_handler(
    State(state): State<Arc<AppState>>,
    Path(place_id): Path<String>,
) -> Result<Json<Vec<EnrichedReview>>, AppError> {
    info!("Fetching user reviews for restaurant ID: {place_id}...");
    let reviews = state.discovery.reviews_for_place(&place_id).await?;

    Ok(Json(reviews))
}

pub async fn user_reviews_handler(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<String>,
) -> Result<Json<Vec<EnrichedReview>>, AppError> {
    info!("Fetching reviews for user ID: {user_id}...");
    let reviews = state.discovery.reviews_for_user(&user_id).await?;

    Ok(Json(reviews))
}

pub async fn add_review_handler(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<ReviewRequest>,
) -> Result<Json<Value>, AppError> {
    info!(
        "Adding review for restaurant {} by user {}...",
        payload.place_id, payload.user_id
    );
    state
        .discovery
        .submit_review(
            &payload.user_id,
            &payload.place_id,
            payload.rating,
            payload.text,
            payload.author_name,
        )
        .await?;

    Ok(Json(json!({ "message": "Review added successfully" })))
}

pub async fn add_favorite_handler(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<FavoriteRequest>,
) -> Result<Json<Value>, AppError> {
    info!(
        "Adding restaurant {} to favorites for user {}...",
        payload.place_id, payload.user_id
    );
    state
        .discovery
        .add_favorite(&payload.user_id, &payload.place_id)
        .await?;

    Ok(Json(json!({ "message": "Favorite added successfully" })))
}

pub async fn remove_favorite_handler(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<FavoriteRequest>,
) -> Result<Json<Value>, AppError> {
    info!(
        "Removing restaurant {} from favorites for user {}...",
        payload.place_id, payload.user_id
    );
    state
        .discovery
        .remove_favorite(&payload.user_id, &payload.place_id)
        .await?;

    Ok(Json(json!({ "message": "Favorite removed successfully" })))
}

pub async fn user_favorites_handler(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<String>,
) -> Result<Json<Vec<FavoritePlace>>, AppError> {
    info!("Fetching favorites for user ID: {user_id}...");
    let favorites = state.discovery.list_favorites(&user_id).await?;

    Ok(Json(favorites))
}

pub async fn reverse_geocode_handler(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<CoordinatesRequest>,
) -> Result<Json<Value>, AppError> {
    info!("Performing reverse geocoding...");
    let location = state
        .discovery
        .reverse_geocode(payload.latitude, payload.longitude)
        .await?;

    Ok(Json(json!({ "location": location })))
}
