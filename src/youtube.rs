// src/youtube.rs
use std::time::Duration;

use async_trait::async_trait;
use metrics::{counter, histogram};
use serde::Deserialize;
use thiserror::Error;

pub const DEFAULT_API_BASE: &str = "https://www.googleapis.com/youtube/v3";

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("video '{0}' not found")]
    VideoNotFound(String),
    #[error("youtube request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("youtube responded with status {0}")]
    Status(u16),
}

/// Ordered raw comment texts for a video.
#[async_trait]
pub trait CommentSource: Send + Sync {
    async fn comments(&self, video_id: &str) -> Result<Vec<String>, SourceError>;
}

/// Display title for a video.
#[async_trait]
pub trait VideoMetadataSource: Send + Sync {
    async fn video_title(&self, video_id: &str) -> Result<String, SourceError>;
}

// --- YouTube Data API v3 response shapes (only the fields we read) ---

#[derive(Debug, Deserialize)]
struct ListResponse<T> {
    #[serde(default = "Vec::new")]
    items: Vec<T>,
}

#[derive(Debug, Deserialize)]
struct VideoItem {
    snippet: VideoSnippet,
}
#[derive(Debug, Deserialize)]
struct VideoSnippet {
    title: String,
}

#[derive(Debug, Deserialize)]
struct ThreadItem {
    snippet: ThreadSnippet,
}
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ThreadSnippet {
    top_level_comment: TopLevelComment,
}
#[derive(Debug, Deserialize)]
struct TopLevelComment {
    snippet: CommentSnippet,
}
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CommentSnippet {
    text_original: String,
}

/// Thin client over the YouTube Data API. Reads only the first result page.
pub struct YouTubeClient {
    http: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl YouTubeClient {
    pub fn new(api_key: impl Into<String>, base_url: impl Into<String>, timeout_secs: u64) -> Self {
        let http = reqwest::Client::builder()
            .user_agent(concat!("video-comment-sentiment/", env!("CARGO_PKG_VERSION")))
            .connect_timeout(Duration::from_secs(4))
            .timeout(Duration::from_secs(timeout_secs.max(1)))
            .build()
            .unwrap_or_default();
        Self {
            http,
            api_key: api_key.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    async fn get_list<T: serde::de::DeserializeOwned>(
        &self,
        resource: &str,
        query: &[(&str, &str)],
    ) -> Result<ListResponse<T>, SourceError> {
        let t0 = std::time::Instant::now();
        let url = format!("{}/{}", self.base_url, resource);
        let resp = match self
            .http
            .get(&url)
            .query(query)
            .query(&[("key", self.api_key.as_str())])
            .send()
            .await
        {
            Ok(r) => r,
            Err(e) => {
                tracing::warn!(error = ?e, resource, "youtube http error");
                counter!("youtube_errors_total").increment(1);
                return Err(e.into());
            }
        };

        let status = resp.status();
        if !status.is_success() {
            tracing::warn!(status = status.as_u16(), resource, "youtube non-2xx");
            counter!("youtube_errors_total").increment(1);
            return Err(SourceError::Status(status.as_u16()));
        }

        let body = resp.json::<ListResponse<T>>().await?;
        histogram!("youtube_request_ms").record(t0.elapsed().as_secs_f64() * 1_000.0);
        Ok(body)
    }
}

#[async_trait]
impl VideoMetadataSource for YouTubeClient {
    async fn video_title(&self, video_id: &str) -> Result<String, SourceError> {
        let list: ListResponse<VideoItem> = self
            .get_list("videos", &[("part", "snippet"), ("id", video_id)])
            .await?;
        list.items
            .into_iter()
            .next()
            .map(|it| it.snippet.title)
            .ok_or_else(|| SourceError::VideoNotFound(video_id.to_string()))
    }
}

#[async_trait]
impl CommentSource for YouTubeClient {
    async fn comments(&self, video_id: &str) -> Result<Vec<String>, SourceError> {
        let list: ListResponse<ThreadItem> = self
            .get_list(
                "commentThreads",
                &[
                    ("part", "snippet"),
                    ("videoId", video_id),
                    ("textFormat", "plainText"),
                ],
            )
            .await?;
        Ok(list
            .items
            .into_iter()
            .map(|it| it.snippet.top_level_comment.snippet.text_original)
            .collect())
    }
}
