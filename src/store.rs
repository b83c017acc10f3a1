//! # Meilisearch
//!
//! Document store behind the discovery flow. Four indexes:
//!
//! - `restaurants`: nearby-search cache, keyed by provider place id,
//!   filtered on the exact `(latitude, longitude, search_radius)`
//!   triple plus a freshness cutoff.
//! - `restaurant_details`: detail cache keyed purely by place id.
//! - `user_favorites`: one document per (user, place), derived id.
//! - `user_reviews`: one document per (user, place), derived id.
//!
//! Writes go through `add_or_update`, so re-adding a favorite or
//! re-submitting a review overwrites instead of duplicating.
//!
//! ## Commands
//!
//! Grab relevant keys.
//! ```sh
//! curl -H "Authorization: Bearer $(cat /run/secrets/MEILI_ADMIN_KEY)" http://localhost:7700/keys
//! ```
use std::sync::Arc;

use async_trait::async_trait;
use meilisearch_sdk::{
    client::Client,
    errors::{Error as MeiliError, ErrorCode, MeilisearchError},
    settings::Settings,
};
use serde::{de::DeserializeOwned, Serialize};

use crate::{
    error::AppError,
    models::{Favorite, Restaurant, Review, StoredDetails},
};

pub const RESTAURANT_INDEX: &str = "restaurants";
pub const DETAILS_INDEX: &str = "restaurant_details";
pub const FAVORITES_INDEX: &str = "user_favorites";
pub const REVIEWS_INDEX: &str = "user_reviews";

pub const RESTAURANT_ID: &str = "id";
pub const DETAILS_ID: &str = "place_id";
pub const FAVORITE_ID: &str = "favorite_id";
pub const REVIEW_ID: &str = "review_id";

const SEARCH_LIMIT: usize = 50;

/// Radius-keyed cache of nearby-search results.
#[async_trait]
pub trait RestaurantCache: Send + Sync {
    /// Exact-triple lookup; entries fetched before `newer_than` are
    /// invisible (stale entries are overwritten, never evicted).
    async fn lookup_nearby(
        &self,
        latitude: f64,
        longitude: f64,
        radius_meters: u32,
        newer_than: i64,
    ) -> Result<Vec<Restaurant>, AppError>;

    async fn store_nearby(&self, restaurants: &[Restaurant]) -> Result<(), AppError>;
}

/// Identity-keyed cache of place detail documents.
#[async_trait]
pub trait DetailsCache: Send + Sync {
    async fn details(&self, place_id: &str) -> Result<Option<StoredDetails>, AppError>;

    async fn store_details(&self, details: &StoredDetails) -> Result<(), AppError>;
}

/// Per-user set membership of place ids.
#[async_trait]
pub trait FavoriteLedger: Send + Sync {
    async fn add_favorite(&self, favorite: &Favorite) -> Result<(), AppError>;

    /// Returns whether a document was actually deleted, so callers can
    /// distinguish "removed" from "was never there".
    async fn remove_favorite(&self, favorite_id: &str) -> Result<bool, AppError>;

    async fn favorites_for_user(&self, user_id: &str) -> Result<Vec<Favorite>, AppError>;
}

/// Per-place and per-user collections of user-authored reviews.
#[async_trait]
pub trait ReviewLedger: Send + Sync {
    async fn upsert_review(&self, review: &Review) -> Result<(), AppError>;

    async fn reviews_for_place(&self, place_id: &str) -> Result<Vec<Review>, AppError>;

    async fn reviews_for_user(&self, user_id: &str) -> Result<Vec<Review>, AppError>;
}

pub struct MeiliStore {
    client: Arc<Client>,
}

pub async fn init_store(meili_url: &str, meili_admin_key: &str) -> MeiliStore {
    let client = Arc::new(Client::new(meili_url, Some(meili_admin_key)).unwrap());

    client
        .index(RESTAURANT_INDEX)
        .set_settings(&Settings::new().with_filterable_attributes([
            "latitude",
            "longitude",
            "search_radius",
            "fetched_at",
        ]))
        .await
        .unwrap();

    client
        .index(FAVORITES_INDEX)
        .set_settings(&Settings::new().with_filterable_attributes(["user_id"]))
        .await
        .unwrap();

    client
        .index(REVIEWS_INDEX)
        .set_settings(&Settings::new().with_filterable_attributes(["user_id", "place_id"]))
        .await
        .unwrap();

    MeiliStore { client }
}

impl MeiliStore {
    async fn upsert<T>(
        &self,
        index_name: &str,
        documents: &[T],
        id_name: &str,
    ) -> Result<(), AppError>
    where
        T: Serialize + Send + Sync,
    {
        let _result = self
            .client
            .index(index_name)
            .add_or_update(documents, Some(id_name))
            .await?
            .wait_for_completion(&self.client, None, None)
            .await?;

        #[cfg(feature = "verbose")]
        println!("Meili task result: {:?}", _result);

        Ok(())
    }

    async fn search<T>(&self, index_name: &str, filter: &str) -> Result<Vec<T>, AppError>
    where
        T: DeserializeOwned + Send + Sync + 'static,
    {
        let results = self
            .client
            .index(index_name)
            .search()
            .with_filter(filter)
            .with_limit(SEARCH_LIMIT)
            .execute::<T>()
            .await?;

        Ok(results.hits.into_iter().map(|hit| hit.result).collect())
    }

    async fn get<T>(&self, index_name: &str, document_id: &str) -> Result<Option<T>, AppError>
    where
        T: DeserializeOwned + Send + Sync + 'static,
    {
        match self.client.index(index_name).get_document::<T>(document_id).await {
            Ok(document) => Ok(Some(document)),
            Err(MeiliError::Meilisearch(MeilisearchError {
                error_code: ErrorCode::DocumentNotFound | ErrorCode::IndexNotFound,
                ..
            })) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

#[async_trait]
impl RestaurantCache for MeiliStore {
    async fn lookup_nearby(
        &self,
        latitude: f64,
        longitude: f64,
        radius_meters: u32,
        newer_than: i64,
    ) -> Result<Vec<Restaurant>, AppError> {
        let filter = format!(
            "latitude = {latitude} AND longitude = {longitude} \
             AND search_radius = {radius_meters} AND fetched_at >= {newer_than}"
        );

        self.search(RESTAURANT_INDEX, &filter).await
    }

    async fn store_nearby(&self, restaurants: &[Restaurant]) -> Result<(), AppError> {
        if restaurants.is_empty() {
            return Ok(());
        }

        self.upsert(RESTAURANT_INDEX, restaurants, RESTAURANT_ID).await
    }
}

#[async_trait]
impl DetailsCache for MeiliStore {
    async fn details(&self, place_id: &str) -> Result<Option<StoredDetails>, AppError> {
        self.get(DETAILS_INDEX, place_id).await
    }

    async fn store_details(&self, details: &StoredDetails) -> Result<(), AppError> {
        self.upsert(DETAILS_INDEX, std::slice::from_ref(details), DETAILS_ID)
            .await
    }
}

#[async_trait]
impl FavoriteLedger for MeiliStore {
    async fn add_favorite(&self, favorite: &Favorite) -> Result<(), AppError> {
        self.upsert(FAVORITES_INDEX, std::slice::from_ref(favorite), FAVORITE_ID)
            .await
    }

    async fn remove_favorite(&self, favorite_id: &str) -> Result<bool, AppError> {
        // Deletion of an absent id is a no-op in Meilisearch, so check
        // existence first to report 0-vs-1 documents affected.
        if self.get::<Favorite>(FAVORITES_INDEX, favorite_id).await?.is_none() {
            return Ok(false);
        }

        self.client
            .index(FAVORITES_INDEX)
            .delete_document(favorite_id)
            .await?
            .wait_for_completion(&self.client, None, None)
            .await?;

        Ok(true)
    }

    async fn favorites_for_user(&self, user_id: &str) -> Result<Vec<Favorite>, AppError> {
        let filter = format!("user_id = \"{user_id}\"");

        self.search(FAVORITES_INDEX, &filter).await
    }
}

#[async_trait]
impl ReviewLedger for MeiliStore {
    async fn upsert_review(&self, review: &Review) -> Result<(), AppError> {
        self.upsert(REVIEWS_INDEX, std::slice::from_ref(review), REVIEW_ID)
            .await
    }

    async fn reviews_for_place(&self, place_id: &str) -> Result<Vec<Review>, AppError> {
        let filter = format!("place_id = \"{place_id}\"");

        self.search(REVIEWS_INDEX, &filter).await
    }

    async fn reviews_for_user(&self, user_id: &str) -> Result<Vec<Review>, AppError> {
        let filter = format!("user_id = \"{user_id}\"");

        self.search(REVIEWS_INDEX, &filter).await
    }
}
