//! Comment classifier: boundary types + provider abstraction.
//!
//! External providers hand back loosely typed `{label, score}` pairs. They are
//! validated into `ClassificationResult` here, so everything past this module
//! can rely on a two-valued label and a score in `[0, 1]`.

use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use metrics::counter;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

use crate::config::ClassifierConfig;

/// Characters of a single comment sent to a remote model.
const MAX_INPUT_CHARS: usize = 512;

// ------------------------------------------------------------
// Boundary types
// ------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Label {
    Positive,
    Negative,
}

impl FromStr for Label {
    type Err = ClassifierError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "POSITIVE" | "LABEL_1" => Ok(Label::Positive),
            "NEGATIVE" | "LABEL_0" => Ok(Label::Negative),
            other => Err(ClassifierError::InvalidPrediction(format!(
                "unknown label '{other}'"
            ))),
        }
    }
}

/// One validated classifier output.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ClassificationResult {
    label: Label,
    score: f64,
}

impl ClassificationResult {
    pub fn new(label: Label, score: f64) -> Result<Self, ClassifierError> {
        if !(0.0..=1.0).contains(&score) {
            return Err(ClassifierError::InvalidPrediction(format!(
                "score {score} outside [0, 1]"
            )));
        }
        Ok(Self { label, score })
    }

    pub fn label(&self) -> Label {
        self.label
    }

    pub fn score(&self) -> f64 {
        self.score
    }

    /// Score mapped onto a single axis where higher is more positive.
    pub fn positivity(&self) -> f64 {
        match self.label {
            Label::Positive => self.score,
            Label::Negative => 1.0 - self.score,
        }
    }
}

/// Raw `{label, score}` pair as returned by a provider.
#[derive(Debug, Clone, Deserialize)]
pub struct RawPrediction {
    pub label: String,
    pub score: f64,
}

impl TryFrom<RawPrediction> for ClassificationResult {
    type Error = ClassifierError;

    fn try_from(raw: RawPrediction) -> Result<Self, Self::Error> {
        let label = raw.label.parse::<Label>()?;
        ClassificationResult::new(label, raw.score)
    }
}

#[derive(Debug, Error)]
pub enum ClassifierError {
    #[error("invalid prediction: {0}")]
    InvalidPrediction(String),
    #[error("classifier returned {got} results for {expected} comments")]
    CountMismatch { expected: usize, got: usize },
    #[error("classifier request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("classifier responded with status {0}")]
    Status(u16),
}

// ------------------------------------------------------------
// Provider abstraction
// ------------------------------------------------------------

#[async_trait]
pub trait CommentClassifier: Send + Sync {
    /// Classify a batch; output is aligned 1:1 with `comments`.
    async fn classify(
        &self,
        comments: &[String],
    ) -> Result<Vec<ClassificationResult>, ClassifierError>;

    /// Provider name for diagnostics.
    fn name(&self) -> &'static str;
}

pub type DynClassifier = Arc<dyn CommentClassifier>;

/// Factory: build a classifier according to config.
///
/// * `huggingface` with a token → remote Inference API client.
/// * anything else (or a missing token) → offline lexicon classifier.
pub fn build_classifier(cfg: &ClassifierConfig) -> DynClassifier {
    match cfg.provider.as_str() {
        "huggingface" | "hf" => match cfg.hf_api_token.as_deref() {
            Some(token) if !token.trim().is_empty() => {
                Arc::new(HuggingFaceClassifier::new(cfg, token.trim()))
            }
            _ => {
                tracing::warn!("HF_API_TOKEN missing; falling back to lexicon classifier");
                Arc::new(LexiconClassifier::new())
            }
        },
        "lexicon" => Arc::new(LexiconClassifier::new()),
        other => {
            tracing::warn!(provider = other, "unknown classifier provider; using lexicon");
            Arc::new(LexiconClassifier::new())
        }
    }
}

// ------------------------------------------------------------
// Hugging Face Inference API
// ------------------------------------------------------------

pub struct HuggingFaceClassifier {
    http: reqwest::Client,
    endpoint: String,
    token: String,
    batch_size: usize,
}

impl HuggingFaceClassifier {
    pub fn new(cfg: &ClassifierConfig, token: &str) -> Self {
        let http = reqwest::Client::builder()
            .user_agent(concat!("video-comment-sentiment/", env!("CARGO_PKG_VERSION")))
            .connect_timeout(Duration::from_secs(4))
            .timeout(Duration::from_secs(cfg.timeout_secs))
            .build()
            .unwrap_or_default();
        Self {
            http,
            endpoint: format!(
                "{}/models/{}",
                cfg.hf_api_base.trim_end_matches('/'),
                cfg.hf_model
            ),
            token: token.to_string(),
            batch_size: cfg.batch_size.max(1),
        }
    }

    async fn classify_chunk(
        &self,
        chunk: &[String],
    ) -> Result<Vec<ClassificationResult>, ClassifierError> {
        #[derive(Serialize)]
        struct Req<'a> {
            inputs: Vec<&'a str>,
        }

        let req = Req {
            inputs: chunk.iter().map(|c| truncate_chars(c, MAX_INPUT_CHARS)).collect(),
        };

        let resp = self
            .http
            .post(&self.endpoint)
            .bearer_auth(&self.token)
            .json(&req)
            .send()
            .await?;

        if !resp.status().is_success() {
            counter!("classifier_errors_total").increment(1);
            return Err(ClassifierError::Status(resp.status().as_u16()));
        }

        let body: Vec<Vec<RawPrediction>> = resp.json().await?;
        if body.len() != chunk.len() {
            return Err(ClassifierError::CountMismatch {
                expected: chunk.len(),
                got: body.len(),
            });
        }

        body.into_iter().map(top_candidate).collect()
    }
}

#[async_trait]
impl CommentClassifier for HuggingFaceClassifier {
    async fn classify(
        &self,
        comments: &[String],
    ) -> Result<Vec<ClassificationResult>, ClassifierError> {
        let mut out = Vec::with_capacity(comments.len());
        for chunk in comments.chunks(self.batch_size) {
            out.extend(self.classify_chunk(chunk).await?);
        }
        Ok(out)
    }

    fn name(&self) -> &'static str {
        "huggingface"
    }
}

/// Pick the highest-scoring candidate label for one input.
fn top_candidate(candidates: Vec<RawPrediction>) -> Result<ClassificationResult, ClassifierError> {
    candidates
        .into_iter()
        .max_by(|a, b| a.score.total_cmp(&b.score))
        .ok_or_else(|| ClassifierError::InvalidPrediction("no candidates".to_string()))?
        .try_into()
}

fn truncate_chars(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

// ------------------------------------------------------------
// Offline lexicon classifier
// ------------------------------------------------------------

static LEXICON: Lazy<HashMap<String, i32>> = Lazy::new(|| {
    let raw = include_str!("../sentiment_lexicon.json");
    serde_json::from_str::<HashMap<String, i32>>(raw).expect("valid sentiment lexicon")
});

/// Word-lexicon scorer with short-range negation. Deterministic, no network.
#[derive(Debug, Clone, Default)]
pub struct LexiconClassifier;

impl LexiconClassifier {
    pub fn new() -> Self {
        Self
    }

    /// Net lexicon score of a text.
    /// A negator within the preceding 1..=3 tokens flips a word's polarity.
    pub fn score_text(&self, text: &str) -> i32 {
        let tokens: Vec<String> = tokenize(text).collect();
        let mut score = 0;

        for i in 0..tokens.len() {
            let base = *LEXICON.get(tokens[i].as_str()).unwrap_or(&0);
            if base == 0 {
                continue;
            }
            let negated = (1..=3).any(|k| i >= k && is_negator(tokens[i - k].as_str()));
            score += if negated { -base } else { base };
        }

        score
    }

    /// Map a net lexicon score onto `(label, confidence)`.
    pub fn classify_text(&self, text: &str) -> ClassificationResult {
        let s = self.score_text(text);
        let label = if s >= 0 {
            Label::Positive
        } else {
            Label::Negative
        };
        let confidence = 0.5 + 0.5 * (f64::from(s.abs()) / 2.0).tanh();
        ClassificationResult {
            label,
            score: confidence.clamp(0.0, 1.0),
        }
    }
}

#[async_trait]
impl CommentClassifier for LexiconClassifier {
    async fn classify(
        &self,
        comments: &[String],
    ) -> Result<Vec<ClassificationResult>, ClassifierError> {
        Ok(comments.iter().map(|c| self.classify_text(c)).collect())
    }

    fn name(&self) -> &'static str {
        "lexicon"
    }
}

/// Alphanumeric tokens (apostrophes kept), lower-case.
fn tokenize(s: &str) -> impl Iterator<Item = String> + '_ {
    s.split(|c: char| !(c.is_alphanumeric() || c == '\''))
        .map(|t| t.trim_matches('\''))
        .filter(|t| !t.is_empty())
        .map(|t| t.to_lowercase())
}

fn is_negator(tok: &str) -> bool {
    matches!(
        tok,
        "not"
            | "no"
            | "never"
            | "isn't"
            | "wasn't"
            | "aren't"
            | "won't"
            | "can't"
            | "cannot"
            | "don't"
            | "doesn't"
            | "didn't"
            | "without"
    )
}
