// src/lib.rs
// Public library surface for the binary and integration tests.

pub mod aggregate;
pub mod api;
pub mod bootstrap;
pub mod classifier;
pub mod config;
pub mod metrics;
pub mod service;
pub mod store;
pub mod video;
pub mod youtube;

// ---- Re-exports for stable public API ----
pub use crate::aggregate::{aggregate, InvalidInputError, ScoredComment, Sentiment, SentimentVerdict};
pub use crate::api::router;
pub use crate::bootstrap::app;
pub use crate::classifier::{ClassificationResult, CommentClassifier, Label};
pub use crate::video::{extract_video_id, VideoIdNotFound};
