//! # Google Maps client
//!
//! Wraps the three provider endpoints the discovery flow needs:
//! geocoding, nearby search, and place details. Responses are decoded
//! into the narrow wire shapes below; everything else the provider
//! returns is dropped at this boundary.
//!
//! The [`PlaceProvider`] trait is the seam: the orchestrator only ever
//! sees the trait, so tests substitute a fake with call counters.
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::info;

use crate::{
    error::AppError,
    models::{PhotoReference, PlaceDetails},
};

pub const GEOCODE_ENDPOINT: &str = "https://maps.googleapis.com/maps/api/geocode/json";
pub const NEARBY_SEARCH_ENDPOINT: &str =
    "https://maps.googleapis.com/maps/api/place/nearbysearch/json";
pub const DETAILS_ENDPOINT: &str = "https://maps.googleapis.com/maps/api/place/details/json";
pub const PHOTO_ENDPOINT: &str = "https://maps.googleapis.com/maps/api/place/photo";

pub const PHOTO_MAX_WIDTH: u32 = 400;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    /// Stabilizes the pair for use as a cache key.
    pub fn rounded(self) -> Self {
        Self {
            latitude: crate::utils::round_coordinate(self.latitude),
            longitude: crate::utils::round_coordinate(self.longitude),
        }
    }
}

/// One raw nearby-search result. Normalization into a cacheable
/// [`crate::models::Restaurant`] happens in the orchestrator.
#[derive(Deserialize, Clone, Debug)]
pub struct ProviderPlace {
    pub place_id: String,
    pub name: String,
    #[serde(default)]
    pub vicinity: Option<String>,
    #[serde(default)]
    pub rating: Option<f32>,
    #[serde(default)]
    pub photos: Vec<PhotoReference>,
}

#[async_trait]
pub trait PlaceProvider: Send + Sync {
    /// Resolves free text to a coordinate pair. `None` means the
    /// provider answered but found nothing, which callers must treat
    /// as bad input rather than a retryable fault.
    async fn geocode(&self, location: &str) -> Result<Option<Coordinates>, AppError>;

    async fn reverse_geocode(
        &self,
        latitude: f64,
        longitude: f64,
    ) -> Result<Option<String>, AppError>;

    async fn search_nearby(
        &self,
        coordinates: Coordinates,
        radius_meters: u32,
        keyword: &str,
    ) -> Result<Vec<ProviderPlace>, AppError>;

    async fn place_details(&self, place_id: &str) -> Result<Option<PlaceDetails>, AppError>;

    /// Synthesizes a fetchable photo URL from a provider photo
    /// reference and the signing key.
    fn photo_url(&self, photo_reference: &str) -> String;
}

pub struct GooglePlaces {
    http: reqwest::Client,
    api_key: String,
}

impl GooglePlaces {
    pub fn new(api_key: String, timeout: Duration) -> Self {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .expect("HTTP client misconfigured!");

        Self { http, api_key }
    }
}

#[async_trait]
impl PlaceProvider for GooglePlaces {
    async fn geocode(&self, location: &str) -> Result<Option<Coordinates>, AppError> {
        let response = self
            .http
            .get(GEOCODE_ENDPOINT)
            .query(&[("address", location), ("key", self.api_key.as_str())])
            .send()
            .await?;

        info!("Geocode response status: {}", response.status());
        let body: GeocodeResponse = response.json().await?;

        if body.status != "OK" {
            return Ok(None);
        }

        Ok(body.results.first().map(|result| Coordinates {
            latitude: result.geometry.location.lat,
            longitude: result.geometry.location.lng,
        }))
    }

    async fn reverse_geocode(
        &self,
        latitude: f64,
        longitude: f64,
    ) -> Result<Option<String>, AppError> {
        let latlng = format!("{latitude},{longitude}");
        let response = self
            .http
            .get(GEOCODE_ENDPOINT)
            .query(&[("latlng", latlng.as_str()), ("key", self.api_key.as_str())])
            .send()
            .await?;

        let body: GeocodeResponse = response.json().await?;

        if body.status != "OK" {
            return Ok(None);
        }

        Ok(body
            .results
            .into_iter()
            .next()
            .and_then(|result| result.formatted_address))
    }

    async fn search_nearby(
        &self,
        coordinates: Coordinates,
        radius_meters: u32,
        keyword: &str,
    ) -> Result<Vec<ProviderPlace>, AppError> {
        let location = format!("{},{}", coordinates.latitude, coordinates.longitude);
        let radius = radius_meters.to_string();

        let response = self
            .http
            .get(NEARBY_SEARCH_ENDPOINT)
            .query(&[
                ("location", location.as_str()),
                ("radius", radius.as_str()),
                ("keyword", keyword),
                ("key", self.api_key.as_str()),
            ])
            .send()
            .await?;

        info!("Nearby search response status: {}", response.status());
        let body: NearbyResponse = response.json().await?;

        match body.status.as_str() {
            "OK" | "ZERO_RESULTS" => Ok(body.results),
            status => Err(AppError::Provider(format!(
                "nearby search returned {status}: {}",
                body.error_message.unwrap_or_else(|| "Unknown error".to_string())
            ))),
        }
    }

    async fn place_details(&self, place_id: &str) -> Result<Option<PlaceDetails>, AppError> {
        let response = self
            .http
            .get(DETAILS_ENDPOINT)
            .query(&[("place_id", place_id), ("key", self.api_key.as_str())])
            .send()
            .await?;

        let body: DetailsResponse = response.json().await?;

        if body.status != "OK" {
            return Ok(None);
        }

        Ok(body.result)
    }

    fn photo_url(&self, photo_reference: &str) -> String {
        format!(
            "{PHOTO_ENDPOINT}?maxwidth={PHOTO_MAX_WIDTH}&photoreference={photo_reference}&key={}",
            self.api_key
        )
    }
}

#[derive(Deserialize)]
struct GeocodeResponse {
    status: String,
    #[serde(default)]
    results: Vec<GeocodeResult>,
}

#[derive(Deserialize)]
struct GeocodeResult {
    geometry: Geometry,
    #[serde(default)]
    formatted_address: Option<String>,
}

#[derive(Deserialize)]
struct Geometry {
    location: LatLng,
}

#[derive(Deserialize)]
struct LatLng {
    lat: f64,
    lng: f64,
}

#[derive(Deserialize)]
struct NearbyResponse {
    status: String,
    #[serde(default)]
    results: Vec<ProviderPlace>,
    #[serde(default)]
    error_message: Option<String>,
}

#[derive(Deserialize)]
struct DetailsResponse {
    status: String,
    #[serde(default)]
    result: Option<PlaceDetails>,
}
