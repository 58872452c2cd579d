// src/bootstrap.rs
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{info, warn};

use crate::api::AppState;
use crate::classifier::build_classifier;
use crate::config::AppConfig;
use crate::service::Evaluator;
use crate::store::{InMemoryVideoStore, JsonFileVideoStore, VideoStore};
use crate::youtube::YouTubeClient;

/// Build the shared application state from config.
pub fn build_state(cfg: &AppConfig) -> Result<AppState> {
    // Safe diagnostics: provider + key lengths only
    info!(
        classifier = %cfg.classifier.provider,
        youtube_key_len = cfg.youtube_api_key.len(),
        store = ?cfg.store_path,
        "app config loaded"
    );
    if cfg.youtube_api_key.is_empty() {
        warn!("GCP_API_KEY is not set; YouTube requests will be rejected upstream");
    }

    let youtube = Arc::new(YouTubeClient::new(
        cfg.youtube_api_key.clone(),
        cfg.youtube_api_base.clone(),
        cfg.request_timeout_secs,
    ));
    let classifier = build_classifier(&cfg.classifier);

    let store: Arc<dyn VideoStore> = match &cfg.store_path {
        Some(path) => Arc::new(
            JsonFileVideoStore::open(path)
                .with_context(|| format!("opening video store at {}", path.display()))?,
        ),
        None => Arc::new(InMemoryVideoStore::new()),
    };

    info!(classifier = classifier.name(), "evaluator ready");
    Ok(AppState {
        evaluator: Evaluator::new(youtube.clone(), youtube, classifier, store),
    })
}

/// Load config from the environment and build the full router.
pub fn app() -> Result<axum::Router> {
    let cfg = AppConfig::load()?;
    let state = build_state(&cfg)?;
    Ok(crate::api::router(state))
}
