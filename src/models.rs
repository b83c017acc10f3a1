use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::utils::extract_locality;

/// Builds the one-favorite-per-(user, place) document id. Deriving the
/// key from its natural fields makes re-adding idempotent and removal
/// an exact-match delete.
pub fn favorite_id(user_id: &str, place_id: &str) -> String {
    format!("{user_id}_{place_id}")
}

/// One review per (user, place): a second submission overwrites the
/// first instead of creating a sibling document.
pub fn review_id(user_id: &str, place_id: &str) -> String {
    format!("{user_id}_{place_id}")
}

/// A normalized place as persisted in the `restaurants` cache index.
///
/// `latitude`/`longitude`/`search_radius` are the cache key of the query
/// that produced the entry, not intrinsic properties of the place.
/// `fetched_at` drives the staleness cutoff on lookups.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct Restaurant {
    pub id: String,
    pub name: String,
    pub address: Option<String>,
    pub rating: Option<f32>,
    pub latitude: f64,
    pub longitude: f64,
    pub search_radius: u32,
    pub photo_url: Option<String>,
    pub fetched_at: i64,
}

/// Response shape for nearby search: the cached record plus the
/// caller-specific favorite flag, which is never persisted.
#[derive(Serialize, Debug)]
pub struct NearbyRestaurant {
    #[serde(flatten)]
    pub restaurant: Restaurant,
    pub is_favorite: bool,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct PlaceDetails {
    pub place_id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub formatted_address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub adr_address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rating: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_ratings_total: Option<u32>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub reviews: Vec<ProviderReview>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub photos: Vec<PhotoReference>,
}

/// A provider-authored review embedded in a detail document, distinct
/// from the reviews our own users write.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct ProviderReview {
    pub author_name: String,
    #[serde(default)]
    pub rating: Option<f32>,
    #[serde(default)]
    pub text: Option<String>,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct PhotoReference {
    pub photo_reference: String,
}

/// Detail document as persisted in the `restaurant_details` index.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct StoredDetails {
    pub fetched_at: i64,
    #[serde(flatten)]
    pub details: PlaceDetails,
}

/// Detail response, stamped with the favorite flag when the caller
/// identified themselves.
#[derive(Serialize, Debug)]
pub struct DetailsView {
    #[serde(flatten)]
    pub details: PlaceDetails,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_favorite: Option<bool>,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct Favorite {
    pub favorite_id: String,
    pub user_id: String,
    pub place_id: String,
    pub added_at: DateTime<Utc>,
}

impl Favorite {
    pub fn new(user_id: &str, place_id: &str) -> Self {
        Self {
            favorite_id: favorite_id(user_id, place_id),
            user_id: user_id.to_string(),
            place_id: place_id.to_string(),
            added_at: Utc::now(),
        }
    }
}

/// A favorite hydrated with whatever detail fields the cache or
/// provider could supply. Unknown places keep their id and timestamp.
#[derive(Serialize, Debug)]
pub struct FavoritePlace {
    pub place_id: String,
    pub added_at: DateTime<Utc>,
    pub name: Option<String>,
    pub rating: Option<f32>,
    pub locality: Option<String>,
    pub photo_url: Option<String>,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct Review {
    pub review_id: String,
    pub user_id: String,
    pub place_id: String,
    pub rating: f32,
    pub text: Option<String>,
    pub author_name: String,
    pub created_at: DateTime<Utc>,
}

impl Review {
    pub fn new(
        user_id: &str,
        place_id: &str,
        rating: f32,
        text: Option<String>,
        author_name: String,
    ) -> Self {
        Self {
            review_id: review_id(user_id, place_id),
            user_id: user_id.to_string(),
            place_id: place_id.to_string(),
            rating,
            text,
            author_name,
            created_at: Utc::now(),
        }
    }
}

/// A user review joined with the fields of its place that the frontend
/// renders next to it.
#[derive(Serialize, Debug)]
pub struct EnrichedReview {
    pub restaurant_name: Option<String>,
    pub locality: Option<String>,
    pub maps_url: Option<String>,
    pub user_id: String,
    pub author_name: String,
    pub rating: f32,
    pub text: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl EnrichedReview {
    pub fn merge(review: Review, details: Option<&PlaceDetails>) -> Self {
        Self {
            restaurant_name: details.map(|d| d.name.clone()),
            locality: details.and_then(|d| extract_locality(d.adr_address.as_deref())),
            maps_url: details.and_then(|d| d.url.clone()),
            user_id: review.user_id,
            author_name: review.author_name,
            rating: review.rating,
            text: review.text,
            created_at: review.created_at,
        }
    }
}

/// Provider-authored reviews for one place, as exposed by
/// `/maps/restaurant_reviews`.
#[derive(Serialize, Debug, Default)]
pub struct ProviderReviewSummary {
    pub total_ratings_count: u32,
    pub reviews: Vec<ProviderReview>,
}

#[cfg(test)]
mod tests {
    use super::{favorite_id, review_id, Favorite, Review};

    #[test]
    fn test_derived_ids_are_deterministic() {
        assert_eq!(favorite_id("u1", "p1"), "u1_p1");
        assert_eq!(favorite_id("u1", "p1"), favorite_id("u1", "p1"));
        assert_eq!(review_id("u1", "p1"), "u1_p1");
        assert_ne!(favorite_id("u1", "p2"), favorite_id("u2", "p1"));
    }

    #[test]
    fn test_constructors_use_derived_ids() {
        let favorite = Favorite::new("u1", "p1");
        assert_eq!(favorite.favorite_id, "u1_p1");

        let review = Review::new("u1", "p1", 4.0, None, "Alice".to_string());
        assert_eq!(review.review_id, "u1_p1");
        assert_eq!(review.rating, 4.0);
    }
}
