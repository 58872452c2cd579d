//! store.rs — latest known score per video, keyed by locator.
//!
//! Upsert semantics: the first evaluation of a locator creates the record;
//! later evaluations overwrite only `score` and `sentiment`.

use std::collections::HashMap;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::aggregate::Sentiment;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoRecord {
    pub locator: String,
    pub title: String,
    pub score: f64,
    pub sentiment: Sentiment,
    pub created_at: DateTime<Utc>,
}

/// Fields supplied by one evaluation.
#[derive(Debug, Clone, PartialEq)]
pub struct NewVideo {
    pub locator: String,
    pub title: String,
    pub score: f64,
    pub sentiment: Sentiment,
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store i/o failed: {0}")]
    Io(#[from] io::Error),
    #[error("store data is corrupt: {0}")]
    Corrupt(#[from] serde_json::Error),
    #[error("store lock poisoned")]
    Poisoned,
}

#[async_trait]
pub trait VideoStore: Send + Sync {
    /// Insert or update by locator; returns the stored record.
    async fn upsert(&self, video: NewVideo) -> Result<VideoRecord, StoreError>;
    /// All records, newest `created_at` first.
    async fn list_recent(&self) -> Result<Vec<VideoRecord>, StoreError>;
    /// Remove everything; returns how many records were removed.
    async fn delete_all(&self) -> Result<usize, StoreError>;
}

fn apply_upsert(map: &mut HashMap<String, VideoRecord>, video: NewVideo) -> VideoRecord {
    let rec = map
        .entry(video.locator.clone())
        .and_modify(|r| {
            r.score = video.score;
            r.sentiment = video.sentiment;
        })
        .or_insert_with(|| VideoRecord {
            locator: video.locator,
            title: video.title,
            score: video.score,
            sentiment: video.sentiment,
            created_at: Utc::now(),
        });
    rec.clone()
}

fn sorted_newest_first(map: &HashMap<String, VideoRecord>) -> Vec<VideoRecord> {
    let mut out: Vec<VideoRecord> = map.values().cloned().collect();
    out.sort_by(|a, b| {
        b.created_at
            .cmp(&a.created_at)
            .then_with(|| a.locator.cmp(&b.locator))
    });
    out
}

// ------------------------------------------------------------
// In-memory
// ------------------------------------------------------------

#[derive(Debug, Default)]
pub struct InMemoryVideoStore {
    inner: Mutex<HashMap<String, VideoRecord>>,
}

impl InMemoryVideoStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl VideoStore for InMemoryVideoStore {
    async fn upsert(&self, video: NewVideo) -> Result<VideoRecord, StoreError> {
        let mut g = self.inner.lock().map_err(|_| StoreError::Poisoned)?;
        Ok(apply_upsert(&mut g, video))
    }

    async fn list_recent(&self) -> Result<Vec<VideoRecord>, StoreError> {
        let g = self.inner.lock().map_err(|_| StoreError::Poisoned)?;
        Ok(sorted_newest_first(&g))
    }

    async fn delete_all(&self) -> Result<usize, StoreError> {
        let mut g = self.inner.lock().map_err(|_| StoreError::Poisoned)?;
        let n = g.len();
        g.clear();
        Ok(n)
    }
}

// ------------------------------------------------------------
// JSON file
// ------------------------------------------------------------

/// Same semantics as the in-memory store, persisted as a JSON array after every write.
///
/// A write is applied to a copy of the map, written to disk on the blocking
/// pool, and only then made visible. A failed write leaves memory and file
/// unchanged. The async lock is held across the write so writers serialize.
#[derive(Debug)]
pub struct JsonFileVideoStore {
    path: PathBuf,
    inner: tokio::sync::Mutex<HashMap<String, VideoRecord>>,
}

impl JsonFileVideoStore {
    /// Open (or lazily create) the store at `path`.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let map = match fs::read_to_string(&path) {
            Ok(s) if s.trim().is_empty() => HashMap::new(),
            Ok(s) => {
                let rows: Vec<VideoRecord> = serde_json::from_str(&s)?;
                rows.into_iter().map(|r| (r.locator.clone(), r)).collect()
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => HashMap::new(),
            Err(e) => return Err(e.into()),
        };
        Ok(Self {
            path,
            inner: tokio::sync::Mutex::new(map),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn persist(&self, map: &HashMap<String, VideoRecord>) -> Result<(), StoreError> {
        let json = serde_json::to_string_pretty(&sorted_newest_first(map))?;
        let path = self.path.clone();
        tokio::task::spawn_blocking(move || write_atomic(&path, json.as_bytes()))
            .await
            .map_err(io::Error::other)??;
        Ok(())
    }
}

fn write_atomic(path: &Path, bytes: &[u8]) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    let tmp = path.with_extension("json.tmp");
    let mut f = fs::File::create(&tmp)?;
    f.write_all(bytes)?;
    fs::rename(tmp, path)
}

#[async_trait]
impl VideoStore for JsonFileVideoStore {
    async fn upsert(&self, video: NewVideo) -> Result<VideoRecord, StoreError> {
        let mut g = self.inner.lock().await;
        let mut next = g.clone();
        let rec = apply_upsert(&mut next, video);
        self.persist(&next).await?;
        *g = next;
        Ok(rec)
    }

    async fn list_recent(&self) -> Result<Vec<VideoRecord>, StoreError> {
        let g = self.inner.lock().await;
        Ok(sorted_newest_first(&g))
    }

    async fn delete_all(&self) -> Result<usize, StoreError> {
        let mut g = self.inner.lock().await;
        self.persist(&HashMap::new()).await?;
        let n = g.len();
        g.clear();
        Ok(n)
    }
}
