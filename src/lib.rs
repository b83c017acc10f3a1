//! Backend for a "what's to eat near me" service.
//!
//!
//!
//! # General Infrastructure
//! - Frontend talks to this server only; Google Maps and Meilisearch
//!   are never exposed directly
//! - Google Geocoding + Places are the single external provider for
//!   coordinates, nearby search, and place details
//! - Meilisearch holds four indexes: `restaurants` (nearby cache),
//!   `restaurant_details` (detail cache), `user_favorites`,
//!   `user_reviews`
//! - The auth/session service in front of us validates users and
//!   forwards `user_id`/`author_name`; we never issue sessions here
//!
//!
//!
//! # Why Cache at All
//!
//! The Places API is rate limited and its latency is all over the
//! place. A nearby search for the same geocoded spot and radius
//! returns the same answer for hours, so every provider response is
//! bulk-upserted into Meilisearch and replayed for identical queries
//! until the entry goes stale (`CACHE_TTL_SECONDS`, default one day).
//!
//! Cache writes are best-effort: if Meilisearch is down, the user
//! still gets their restaurant list and we log the miss. The one
//! fatal upstream error is a failed geocode, since without
//! coordinates there is nothing to search.
//!
//!
//!
//! # Setup
//!
//! Secrets are Docker-style files under `/run/secrets`:
//! `GOOGLE_API_KEY` and `MEILI_ADMIN_KEY`.
//!
//! Environment (all optional): `RUST_PORT`, `MEILI_URL`,
//! `HTTP_TIMEOUT_MS`, `CACHE_TTL_SECONDS`, `RUST_LOG`.
//!
//! View current docs.
//! ```sh
//! cargo doc --open
//! ```
use std::time::Duration;

use axum::{
    http::{header::CONTENT_TYPE, Method},
    routing::{get, post},
    Router,
};

use signal::{
    ctrl_c,
    unix::{signal, SignalKind},
};
use tokio::{net::TcpListener, signal};
use tower_http::cors::CorsLayer;
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

pub mod config;
pub mod discovery;
pub mod error;
pub mod models;
pub mod places;
pub mod routes;
pub mod state;
pub mod store;
pub mod utils;

use routes::{
    add_favorite_handler, add_review_handler, nearby_restaurants_handler, place_reviews_handler,
    remove_favorite_handler, restaurant_details_handler, restaurant_reviews_handler,
    reverse_geocode_handler, user_favorites_handler, user_reviews_handler,
};
use state::AppState;

pub async fn start_server() {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();

    info!("Initializing state...");
    let state = AppState::new().await;

    info!("Starting server...");

    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE])
        .max_age(Duration::from_secs(60 * 60));

    let app = Router::new()
        .route("/maps/nearby_restaurants", post(nearby_restaurants_handler))
        .route(
            "/maps/restaurant_details/{restaurant_id}",
            get(restaurant_details_handler),
        )
        .route(
            "/maps/restaurant_reviews/{restaurant_id}",
            get(restaurant_reviews_handler),
        )
        .route("/maps/place_reviews/{place_id}", get(place_reviews_handler))
        .route("/maps/user_reviews/{user_id}", get(user_reviews_handler))
        .route("/maps/add_review", post(add_review_handler))
        .route("/maps/add_favorite", post(add_favorite_handler))
        .route("/maps/remove_favorite", post(remove_favorite_handler))
        .route(
            "/maps/user_favorites/{user_id}",
            get(user_favorites_handler),
        )
        .route("/maps/reverse_geocode", post(reverse_geocode_handler))
        .layer(cors)
        .with_state(state.clone());

    let address = format!("0.0.0.0:{}", state.config.port);
    info!("Binding to {address}");

    let listener = TcpListener::bind(&address).await.unwrap();
    info!("Server running on {address}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .unwrap();

    println!("Server shutting down...");
}

async fn shutdown_signal() {
    let ctrl_c = async {
        ctrl_c().await.expect("Failed to install Ctrl+C handler");

        info!("Received Ctrl+C, shutting down");
    };

    #[cfg(unix)]
    let terminate = async {
        signal(SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;

        info!("Received terminate signal, shutting down");
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
