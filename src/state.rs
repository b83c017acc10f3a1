use std::{sync::Arc, time::Duration};

use crate::{
    config::Config,
    discovery::Discovery,
    places::GooglePlaces,
    store::{init_store, MeiliStore},
};

/// Clients are built once here and injected into the orchestrator;
/// nothing downstream reaches for process-wide globals.
pub struct AppState {
    pub config: Config,
    pub discovery: Discovery<GooglePlaces, MeiliStore>,
}

impl AppState {
    pub async fn new() -> Arc<Self> {
        let config = Config::load();

        let provider = GooglePlaces::new(
            config.google_api_key.clone(),
            Duration::from_millis(config.http_timeout_ms),
        );
        let store = init_store(&config.meili_url, &config.meili_key).await;
        let discovery = Discovery::new(provider, store, config.cache_ttl_secs);

        Arc::new(Self { config, discovery })
    }
}
