//! # Discovery
//!
//! Composes geocoder, place provider, and store into the public
//! operations: nearby search, detail lookup, review aggregation, and
//! the favorite ledger.
//!
//! The read path is cache-aside: check the store, fall back to the
//! provider on miss, persist what came back. Persistence after a
//! provider fetch is best-effort on purpose: a failed cache write is
//! logged and the response still goes out.
//!
//! Failure semantics per operation:
//! - geocode miss is fatal to the request (client input error)
//! - provider or cache failure during nearby search degrades to an
//!   empty result list
//! - an unknown or unfetchable place yields empty details, callers
//!   cannot tell absence from provider downtime
use std::collections::{HashMap, HashSet};

use chrono::Utc;
use tracing::{error, info, warn};

use crate::{
    error::AppError,
    models::{
        favorite_id, DetailsView, EnrichedReview, Favorite, FavoritePlace, NearbyRestaurant,
        PlaceDetails, ProviderReviewSummary, Restaurant, Review, StoredDetails,
    },
    places::PlaceProvider,
    store::{DetailsCache, FavoriteLedger, RestaurantCache, ReviewLedger},
};

pub struct Discovery<P, S> {
    provider: P,
    store: S,
    cache_ttl_secs: i64,
}

impl<P, S> Discovery<P, S>
where
    P: PlaceProvider,
    S: RestaurantCache + DetailsCache + FavoriteLedger + ReviewLedger,
{
    pub fn new(provider: P, store: S, cache_ttl_secs: i64) -> Self {
        Self {
            provider,
            store,
            cache_ttl_secs,
        }
    }

    /// Radius is meters, everywhere. A cache hit returns documents in
    /// store order; only freshly fetched results are re-ranked by
    /// rating.
    pub async fn find_nearby(
        &self,
        location: &str,
        radius_meters: u32,
        keyword: &str,
        user_id: &str,
    ) -> Result<Vec<NearbyRestaurant>, AppError> {
        let Some(coordinates) = self.provider.geocode(location).await? else {
            return Err(AppError::LocationNotFound(location.to_string()));
        };
        let coordinates = coordinates.rounded();

        let cutoff = Utc::now().timestamp() - self.cache_ttl_secs;
        let cached = match self
            .store
            .lookup_nearby(coordinates.latitude, coordinates.longitude, radius_meters, cutoff)
            .await
        {
            Ok(restaurants) => restaurants,
            Err(e) => {
                warn!("Cache lookup failed, falling back to provider: {e}");
                Vec::new()
            }
        };

        if !cached.is_empty() {
            info!("Returning {} cached restaurants.", cached.len());
            let favorites = self.favorite_ids(user_id).await;

            return Ok(cached
                .into_iter()
                .map(|restaurant| stamp(restaurant, &favorites))
                .collect());
        }

        info!(
            "Fetching nearby restaurants near {},{}...",
            coordinates.latitude, coordinates.longitude
        );
        let places = match self
            .provider
            .search_nearby(coordinates, radius_meters, keyword)
            .await
        {
            Ok(places) => places,
            Err(e) => {
                error!("Error fetching restaurants: {e}");
                return Ok(Vec::new());
            }
        };

        if places.is_empty() {
            info!("Found 0 restaurants.");
            return Ok(Vec::new());
        }

        let fetched_at = Utc::now().timestamp();
        let restaurants: Vec<Restaurant> = places
            .into_iter()
            .map(|place| Restaurant {
                photo_url: place
                    .photos
                    .first()
                    .map(|photo| self.provider.photo_url(&photo.photo_reference)),
                id: place.place_id,
                name: place.name,
                address: place.vicinity,
                rating: place.rating,
                latitude: coordinates.latitude,
                longitude: coordinates.longitude,
                search_radius: radius_meters,
                fetched_at,
            })
            .collect();

        if let Err(e) = self.store.store_nearby(&restaurants).await {
            error!("Failed to cache restaurants: {e}");
        }

        let favorites = self.favorite_ids(user_id).await;
        let mut result: Vec<NearbyRestaurant> = restaurants
            .into_iter()
            .map(|restaurant| stamp(restaurant, &favorites))
            .collect();

        // Missing ratings sort last.
        result.sort_by(|a, b| rating_key(b).total_cmp(&rating_key(a)));

        Ok(result)
    }

    /// Cache-first detail lookup keyed by place id alone. `None` means
    /// "unknown", whether because the place does not exist or because
    /// the provider was unreachable.
    pub async fn get_details(
        &self,
        place_id: &str,
        user_id: Option<&str>,
    ) -> Result<Option<DetailsView>, AppError> {
        let Some(details) = self.cached_or_fetched_details(place_id).await else {
            return Ok(None);
        };

        let is_favorite = match user_id {
            Some(user_id) => Some(self.favorite_ids(user_id).await.contains(place_id)),
            None => None,
        };

        Ok(Some(DetailsView {
            details,
            is_favorite,
        }))
    }

    /// Provider-authored reviews embedded in the detail document.
    pub async fn provider_reviews(&self, place_id: &str) -> Result<ProviderReviewSummary, AppError> {
        let Some(details) = self.cached_or_fetched_details(place_id).await else {
            return Ok(ProviderReviewSummary::default());
        };

        Ok(ProviderReviewSummary {
            total_ratings_count: details.user_ratings_total.unwrap_or(0),
            reviews: details.reviews,
        })
    }

    pub async fn reviews_for_place(
        &self,
        place_id: &str,
    ) -> Result<Vec<EnrichedReview>, AppError> {
        let reviews = self.store.reviews_for_place(place_id).await?;

        Ok(self.enrich_reviews(reviews).await)
    }

    pub async fn reviews_for_user(&self, user_id: &str) -> Result<Vec<EnrichedReview>, AppError> {
        let reviews = self.store.reviews_for_user(user_id).await?;

        Ok(self.enrich_reviews(reviews).await)
    }

    pub async fn submit_review(
        &self,
        user_id: &str,
        place_id: &str,
        rating: f32,
        text: Option<String>,
        author_name: String,
    ) -> Result<(), AppError> {
        if !(1.0..=5.0).contains(&rating) {
            return Err(AppError::RatingOutOfRange);
        }

        let review = Review::new(user_id, place_id, rating, text, author_name);
        info!(
            "Storing review {} for restaurant {place_id} by user {user_id}.",
            review.review_id
        );

        self.store.upsert_review(&review).await
    }

    pub async fn add_favorite(&self, user_id: &str, place_id: &str) -> Result<(), AppError> {
        let favorite = Favorite::new(user_id, place_id);

        self.store.add_favorite(&favorite).await
    }

    pub async fn remove_favorite(&self, user_id: &str, place_id: &str) -> Result<(), AppError> {
        let removed = self
            .store
            .remove_favorite(&favorite_id(user_id, place_id))
            .await?;

        if removed {
            Ok(())
        } else {
            Err(AppError::FavoriteNotFound)
        }
    }

    /// Hydrates each favorite with detail fields, cache-first. The
    /// fan-out is bounded by the user's favorite count.
    pub async fn list_favorites(&self, user_id: &str) -> Result<Vec<FavoritePlace>, AppError> {
        let favorites = self.store.favorites_for_user(user_id).await?;
        let mut places = Vec::with_capacity(favorites.len());

        for favorite in favorites {
            let details = self.cached_or_fetched_details(&favorite.place_id).await;

            places.push(FavoritePlace {
                name: details.as_ref().map(|d| d.name.clone()),
                rating: details.as_ref().and_then(|d| d.rating),
                locality: details.as_ref().and_then(|d| {
                    crate::utils::extract_locality(d.adr_address.as_deref())
                }),
                photo_url: details.as_ref().and_then(|d| {
                    d.photos
                        .first()
                        .map(|photo| self.provider.photo_url(&photo.photo_reference))
                }),
                place_id: favorite.place_id,
                added_at: favorite.added_at,
            });
        }

        Ok(places)
    }

    pub async fn reverse_geocode(
        &self,
        latitude: f64,
        longitude: f64,
    ) -> Result<String, AppError> {
        match self.provider.reverse_geocode(latitude, longitude).await? {
            Some(address) => Ok(address),
            None => Err(AppError::CoordinatesNotFound),
        }
    }

    /// One detail fetch per distinct place id, however many reviews
    /// reference it.
    async fn enrich_reviews(&self, reviews: Vec<Review>) -> Vec<EnrichedReview> {
        let mut details_by_place: HashMap<String, Option<PlaceDetails>> = HashMap::new();

        for review in &reviews {
            if !details_by_place.contains_key(&review.place_id) {
                let details = self.cached_or_fetched_details(&review.place_id).await;
                details_by_place.insert(review.place_id.clone(), details);
            }
        }

        reviews
            .into_iter()
            .map(|review| {
                let details = details_by_place
                    .get(&review.place_id)
                    .and_then(|details| details.as_ref());

                EnrichedReview::merge(review, details)
            })
            .collect()
    }

    async fn cached_or_fetched_details(&self, place_id: &str) -> Option<PlaceDetails> {
        let cutoff = Utc::now().timestamp() - self.cache_ttl_secs;

        match self.store.details(place_id).await {
            Ok(Some(stored)) if stored.fetched_at >= cutoff => {
                info!("Found cached details for restaurant {place_id}.");
                return Some(stored.details);
            }
            Ok(_) => {}
            Err(e) => warn!("Details cache lookup failed for {place_id}: {e}"),
        }

        info!("Fetching details for restaurant {place_id} from provider...");
        let details = match self.provider.place_details(place_id).await {
            Ok(Some(details)) => details,
            Ok(None) => return None,
            Err(e) => {
                error!("Error fetching details for restaurant {place_id}: {e}");
                return None;
            }
        };

        let stored = StoredDetails {
            fetched_at: Utc::now().timestamp(),
            details: details.clone(),
        };
        if let Err(e) = self.store.store_details(&stored).await {
            error!("Failed to cache details for {place_id}: {e}");
        }

        Some(details)
    }

    /// The caller's favorite set, read once per request. A store error
    /// degrades to "nothing favorited" rather than failing the read.
    async fn favorite_ids(&self, user_id: &str) -> HashSet<String> {
        match self.store.favorites_for_user(user_id).await {
            Ok(favorites) => favorites
                .into_iter()
                .map(|favorite| favorite.place_id)
                .collect(),
            Err(e) => {
                warn!("Favorite lookup failed for user {user_id}: {e}");
                HashSet::new()
            }
        }
    }
}

fn stamp(restaurant: Restaurant, favorites: &HashSet<String>) -> NearbyRestaurant {
    NearbyRestaurant {
        is_favorite: favorites.contains(&restaurant.id),
        restaurant,
    }
}

fn rating_key(place: &NearbyRestaurant) -> f32 {
    place.restaurant.rating.unwrap_or(f32::MIN)
}
