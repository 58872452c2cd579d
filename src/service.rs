//! # Evaluation service
//! Wires the collaborators together for one request:
//! URL → locator/id → (title, comments) → classify → aggregate → upsert.

use std::sync::Arc;

use metrics::{counter, histogram};
use serde::Serialize;
use thiserror::Error;
use tracing::{info, warn};

use crate::aggregate::{self, InvalidInputError, SentimentVerdict};
use crate::classifier::{ClassifierError, DynClassifier};
use crate::store::{NewVideo, StoreError, VideoRecord, VideoStore};
use crate::video::{canonical_locator, extract_video_id, VideoIdNotFound};
use crate::youtube::{CommentSource, SourceError, VideoMetadataSource};

#[derive(Debug, Error)]
pub enum EvaluateError {
    #[error("invalid video url: {0}")]
    InvalidUrl(#[from] VideoIdNotFound),
    #[error("video has no comments to evaluate")]
    NoComments,
    #[error(transparent)]
    Aggregate(InvalidInputError),
    #[error(transparent)]
    Source(#[from] SourceError),
    #[error(transparent)]
    Classifier(#[from] ClassifierError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl From<InvalidInputError> for EvaluateError {
    fn from(e: InvalidInputError) -> Self {
        match e {
            InvalidInputError::Empty => EvaluateError::NoComments,
            other => EvaluateError::Aggregate(other),
        }
    }
}

impl EvaluateError {
    /// Stable label for metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            EvaluateError::InvalidUrl(_) => "invalid_url",
            EvaluateError::NoComments => "no_comments",
            EvaluateError::Aggregate(_) => "aggregate",
            EvaluateError::Source(_) => "source",
            EvaluateError::Classifier(_) => "classifier",
            EvaluateError::Store(_) => "store",
        }
    }
}

/// Outcome of one evaluation.
#[derive(Debug, Clone, Serialize)]
pub struct Evaluation {
    pub locator: String,
    pub video_id: String,
    pub title: String,
    pub verdict: SentimentVerdict,
    pub record: VideoRecord,
}

#[derive(Clone)]
pub struct Evaluator {
    comments: Arc<dyn CommentSource>,
    metadata: Arc<dyn VideoMetadataSource>,
    classifier: DynClassifier,
    store: Arc<dyn VideoStore>,
}

impl Evaluator {
    pub fn new(
        comments: Arc<dyn CommentSource>,
        metadata: Arc<dyn VideoMetadataSource>,
        classifier: DynClassifier,
        store: Arc<dyn VideoStore>,
    ) -> Self {
        Self {
            comments,
            metadata,
            classifier,
            store,
        }
    }

    pub fn store(&self) -> &Arc<dyn VideoStore> {
        &self.store
    }

    pub async fn evaluate(&self, url: &str) -> Result<Evaluation, EvaluateError> {
        let t0 = std::time::Instant::now();
        let out = self.evaluate_inner(url).await;
        histogram!("evaluation_ms").record(t0.elapsed().as_secs_f64() * 1_000.0);

        match &out {
            Ok(ev) => {
                counter!("evaluations_total").increment(1);
                info!(
                    locator = %ev.locator,
                    score = ev.verdict.overall_score,
                    sentiment = %ev.verdict.overall_sentiment,
                    "evaluation finished"
                );
            }
            Err(e) => {
                counter!("evaluation_errors_total", "kind" => e.kind()).increment(1);
                warn!(error = %e, url, "evaluation failed");
            }
        }
        out
    }

    async fn evaluate_inner(&self, url: &str) -> Result<Evaluation, EvaluateError> {
        let locator = canonical_locator(url);
        let video_id = extract_video_id(&locator)?.to_string();

        let (title, comments) = tokio::try_join!(
            self.metadata.video_title(&video_id),
            self.comments.comments(&video_id),
        )?;
        if comments.is_empty() {
            return Err(EvaluateError::NoComments);
        }

        let classifications = self.classifier.classify(&comments).await?;
        counter!("comments_classified_total").increment(classifications.len() as u64);
        if classifications.len() != comments.len() {
            return Err(ClassifierError::CountMismatch {
                expected: comments.len(),
                got: classifications.len(),
            }
            .into());
        }

        let verdict = aggregate::aggregate(&comments, &classifications)?;

        let record = self
            .store
            .upsert(NewVideo {
                locator: locator.clone(),
                title: title.clone(),
                score: verdict.overall_score,
                sentiment: verdict.overall_sentiment,
            })
            .await?;

        Ok(Evaluation {
            locator,
            video_id,
            title,
            verdict,
            record,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::Sentiment;
    use crate::classifier::LexiconClassifier;
    use crate::store::InMemoryVideoStore;
    use async_trait::async_trait;

    struct FixedSource {
        title: &'static str,
        comments: Vec<&'static str>,
    }

    #[async_trait]
    impl CommentSource for FixedSource {
        async fn comments(&self, _video_id: &str) -> Result<Vec<String>, SourceError> {
            Ok(self.comments.iter().map(|s| s.to_string()).collect())
        }
    }

    #[async_trait]
    impl VideoMetadataSource for FixedSource {
        async fn video_title(&self, video_id: &str) -> Result<String, SourceError> {
            if video_id == "missing0000" {
                return Err(SourceError::VideoNotFound(video_id.to_string()));
            }
            Ok(self.title.to_string())
        }
    }

    fn evaluator(comments: Vec<&'static str>) -> Evaluator {
        let src = Arc::new(FixedSource {
            title: "Test video",
            comments,
        });
        Evaluator::new(
            src.clone(),
            src,
            Arc::new(LexiconClassifier::new()),
            Arc::new(InMemoryVideoStore::new()),
        )
    }

    #[tokio::test]
    async fn evaluates_and_persists_under_canonical_locator() {
        let ev = evaluator(vec!["amazing, love it", "great video"]);
        let out = ev
            .evaluate("https://www.youtube.com/watch?v=dQw4w9WgXcQ")
            .await
            .unwrap();

        assert_eq!(out.video_id, "dQw4w9WgXcQ");
        assert_eq!(out.locator, "https://www.youtube.com/v/dQw4w9WgXcQ");
        assert_eq!(out.verdict.overall_sentiment, Sentiment::Positive);
        assert_eq!(out.record.title, "Test video");

        let rows = ev.store().list_recent().await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].locator, out.locator);
    }

    #[tokio::test]
    async fn invalid_url_is_reported() {
        let ev = evaluator(vec!["x"]);
        let err = ev.evaluate("not a url").await.unwrap_err();
        assert!(matches!(err, EvaluateError::InvalidUrl(_)));
    }

    #[tokio::test]
    async fn no_comments_is_invalid_input() {
        let ev = evaluator(Vec::new());
        let err = ev.evaluate("https://youtu.be/dQw4w9WgXcQ").await.unwrap_err();
        assert!(matches!(err, EvaluateError::NoComments));
        assert!(ev.store().list_recent().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn upstream_errors_propagate() {
        let ev = evaluator(vec!["x"]);
        let err = ev.evaluate("https://youtu.be/missing0000").await.unwrap_err();
        assert!(matches!(err, EvaluateError::Source(SourceError::VideoNotFound(_))));
    }

    #[test]
    fn empty_aggregate_error_maps_to_no_comments() {
        assert!(matches!(
            EvaluateError::from(InvalidInputError::Empty),
            EvaluateError::NoComments
        ));
        assert!(matches!(
            EvaluateError::from(InvalidInputError::LengthMismatch {
                comments: 1,
                classifications: 2
            }),
            EvaluateError::Aggregate(_)
        ));
    }
}
