//! # Sentiment Aggregator
//! Pure logic mapping `(comments, classifications)` → `SentimentVerdict`.
//! No I/O, suitable for unit tests and offline evaluation.
//!
//! Every comment lands in exactly one bucket (positive / negative / neutral)
//! based on its raw classifier score; the overall score puts both classes on
//! a single positivity axis where higher is always more positive.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::classifier::{ClassificationResult, Label};

/// Maximum number of comments kept per bucket.
pub const TOP_K: usize = 5;

/// Open interval `(NEUTRAL_LOW, NEUTRAL_HIGH)` treated as neutral.
pub const NEUTRAL_LOW: f64 = 0.4;
pub const NEUTRAL_HIGH: f64 = 0.7;

/// Overall sentiment category of a video.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Sentiment {
    Positive,
    Negative,
    Neutral,
}

impl Sentiment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Sentiment::Positive => "POSITIVE",
            Sentiment::Negative => "NEGATIVE",
            Sentiment::Neutral => "NEUTRAL",
        }
    }

    /// Banding of an overall score. `0.7` itself falls through to NEGATIVE.
    pub fn from_overall_score(score: f64) -> Self {
        if is_neutral_band(score) {
            Sentiment::Neutral
        } else if score > NEUTRAL_HIGH {
            Sentiment::Positive
        } else {
            Sentiment::Negative
        }
    }
}

impl std::fmt::Display for Sentiment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A comment paired with its raw classifier score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredComment {
    pub comment: String,
    pub score: f64,
}

/// Aggregated result for one batch of comments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SentimentVerdict {
    pub positive: Vec<ScoredComment>,
    pub negative: Vec<ScoredComment>,
    pub neutral: Vec<ScoredComment>,
    pub overall_sentiment: Sentiment,
    pub overall_score: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvalidInputError {
    #[error("no comments to aggregate")]
    Empty,
    #[error("got {comments} comments but {classifications} classifications")]
    LengthMismatch {
        comments: usize,
        classifications: usize,
    },
}

/// Aggregate per-comment classifications into a verdict.
///
/// `classifications[i]` must describe `comments[i]`; both slices must be
/// non-empty and of equal length.
pub fn aggregate<S: AsRef<str>>(
    comments: &[S],
    classifications: &[ClassificationResult],
) -> Result<SentimentVerdict, InvalidInputError> {
    if comments.len() != classifications.len() {
        return Err(InvalidInputError::LengthMismatch {
            comments: comments.len(),
            classifications: classifications.len(),
        });
    }
    if comments.is_empty() {
        return Err(InvalidInputError::Empty);
    }

    let mut positivity_sum = 0.0f64;
    let mut positive = Vec::new();
    let mut negative = Vec::new();
    let mut neutral = Vec::new();

    for (text, result) in comments.iter().zip(classifications) {
        let score = result.score();
        positivity_sum += result.positivity();

        let entry = ScoredComment {
            comment: text.as_ref().to_string(),
            score,
        };
        if is_neutral_band(score) {
            neutral.push(entry);
        } else if result.label() == Label::Positive {
            positive.push(entry);
        } else {
            negative.push(entry);
        }
    }

    tracing::debug!(
        total = comments.len(),
        positive = positive.len(),
        negative = negative.len(),
        neutral = neutral.len(),
        "bucketed comments"
    );

    // Stable sorts keep input order among equal keys.
    positive.sort_by(|a, b| b.score.total_cmp(&a.score));
    negative.sort_by(|a, b| b.score.total_cmp(&a.score));
    // Largest distance from 5 first; for scores in [0,1] this is ascending score.
    neutral.sort_by(|a, b| distance_from_five(b.score).total_cmp(&distance_from_five(a.score)));

    positive.truncate(TOP_K);
    negative.truncate(TOP_K);
    neutral.truncate(TOP_K);

    let overall_score = round2(positivity_sum / comments.len() as f64);

    Ok(SentimentVerdict {
        positive,
        negative,
        neutral,
        overall_sentiment: Sentiment::from_overall_score(overall_score),
        overall_score,
    })
}

#[inline]
fn is_neutral_band(score: f64) -> bool {
    score > NEUTRAL_LOW && score < NEUTRAL_HIGH
}

#[inline]
fn distance_from_five(score: f64) -> f64 {
    (5.0 - score).abs()
}

/// Two-decimal rounding of the exact binary value, ties to even.
///
/// `0.695` is stored as `0.69499…` and rounds down; an exact tie such as
/// `0.125` goes to the even hundredth (`0.12`). Scaling by 100 first would
/// get both wrong.
pub fn round2(x: f64) -> f64 {
    // Exact ties at the third decimal are exactly the odd multiples of 1/8.
    let eighths = x * 8.0;
    if eighths.fract() == 0.0 && eighths.rem_euclid(2.0) == 1.0 {
        let lo = (x * 100.0).floor();
        let even = if lo.rem_euclid(2.0) == 0.0 { lo } else { lo + 1.0 };
        return even / 100.0;
    }
    // `{:.2}` rounds the exact decimal expansion of `x`.
    format!("{x:.2}").parse().unwrap_or(x)
}
