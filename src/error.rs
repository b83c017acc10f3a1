use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

/// Everything a handler can fail with. Raw provider/store errors are
/// converted into `Provider`/`Store` at the boundary and never leak
/// their message to the client.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Location is required")]
    MissingLocation,

    #[error("Could not resolve location: {0}")]
    LocationNotFound(String),

    #[error("Coordinates not found")]
    CoordinatesNotFound,

    #[error("Rating must be between 1 and 5")]
    RatingOutOfRange,

    #[error("Favorite not found")]
    FavoriteNotFound,

    #[error("Place provider error: {0}")]
    Provider(String),

    #[error("Store error: {0}")]
    Store(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match self {
            AppError::MissingLocation
            | AppError::LocationNotFound { .. }
            | AppError::CoordinatesNotFound
            | AppError::RatingOutOfRange => StatusCode::BAD_REQUEST,
            AppError::FavoriteNotFound => StatusCode::NOT_FOUND,
            AppError::Provider { .. } | AppError::Store { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = match &self {
            AppError::Provider { .. } | AppError::Store { .. } => {
                "Could not complete the request".to_string()
            }
            _ => self.to_string(),
        };

        (status, body).into_response()
    }
}

impl From<reqwest::Error> for AppError {
    fn from(error: reqwest::Error) -> Self {
        AppError::Provider(error.to_string())
    }
}

impl From<meilisearch_sdk::errors::Error> for AppError {
    fn from(error: meilisearch_sdk::errors::Error) -> Self {
        AppError::Store(error.to_string())
    }
}
