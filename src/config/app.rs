// src/config/app.rs
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::{env, fs};

use crate::youtube::DEFAULT_API_BASE;

pub const ENV_CONFIG_PATH: &str = "APP_CONFIG_PATH";
pub const DEFAULT_CONFIG_PATH: &str = "config/app.toml";

fn default_provider() -> String {
    "lexicon".to_string()
}
fn default_hf_model() -> String {
    "distilbert-base-uncased-finetuned-sst-2-english".to_string()
}
fn default_hf_base() -> String {
    "https://api-inference.huggingface.co".to_string()
}
fn default_batch_size() -> usize {
    32
}
fn default_timeout_secs() -> u64 {
    10
}
fn default_youtube_base() -> String {
    DEFAULT_API_BASE.to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassifierConfig {
    /// "huggingface" | "lexicon" (case-insensitive)
    #[serde(default = "default_provider")]
    pub provider: String,
    #[serde(default)]
    pub hf_api_token: Option<String>,
    #[serde(default = "default_hf_model")]
    pub hf_model: String,
    #[serde(default = "default_hf_base")]
    pub hf_api_base: String,
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            hf_api_token: None,
            hf_model: default_hf_model(),
            hf_api_base: default_hf_base(),
            batch_size: default_batch_size(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    /// YouTube Data API key (`GCP_API_KEY`).
    #[serde(default)]
    pub youtube_api_key: String,
    #[serde(default = "default_youtube_base")]
    pub youtube_api_base: String,
    #[serde(default = "default_timeout_secs")]
    pub request_timeout_secs: u64,
    /// JSON file for the video store; in-memory when absent.
    #[serde(default)]
    pub store_path: Option<PathBuf>,
    #[serde(default)]
    pub classifier: ClassifierConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            youtube_api_key: String::new(),
            youtube_api_base: default_youtube_base(),
            request_timeout_secs: default_timeout_secs(),
            store_path: None,
            classifier: ClassifierConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load config using `.env` + file + env overrides:
    /// 1) $APP_CONFIG_PATH (must exist if set)
    /// 2) config/app.toml (optional)
    /// 3) environment variables override individual fields
    pub fn load() -> Result<Self> {
        let _ = dotenvy::dotenv();

        let mut cfg = match env::var(ENV_CONFIG_PATH) {
            Ok(p) => Self::load_from_file(&p)?,
            Err(_) => {
                let default = Path::new(DEFAULT_CONFIG_PATH);
                if default.exists() {
                    Self::load_from_file(default)?
                } else {
                    Self::default()
                }
            }
        };

        cfg.apply_env();
        cfg.sanitize();
        Ok(cfg)
    }

    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let data = fs::read_to_string(path)
            .with_context(|| format!("reading config from {}", path.display()))?;
        let mut cfg: AppConfig =
            toml::from_str(&data).with_context(|| format!("parsing {}", path.display()))?;
        cfg.sanitize();
        Ok(cfg)
    }

    fn apply_env(&mut self) {
        if let Some(v) = env_nonempty("GCP_API_KEY") {
            self.youtube_api_key = v;
        }
        if let Some(v) = env_nonempty("YOUTUBE_API_BASE") {
            self.youtube_api_base = v;
        }
        if let Some(v) = env_parse::<u64>("REQUEST_TIMEOUT_SECS") {
            self.request_timeout_secs = v;
            self.classifier.timeout_secs = v;
        }
        if let Some(v) = env_nonempty("VIDEO_STORE_PATH") {
            self.store_path = Some(PathBuf::from(v));
        }
        if let Some(v) = env_nonempty("CLASSIFIER_PROVIDER") {
            self.classifier.provider = v;
        }
        if let Some(v) = env_nonempty("HF_API_TOKEN") {
            self.classifier.hf_api_token = Some(v);
        }
        if let Some(v) = env_nonempty("HF_MODEL") {
            self.classifier.hf_model = v;
        }
        if let Some(v) = env_nonempty("HF_API_BASE") {
            self.classifier.hf_api_base = v;
        }
        if let Some(v) = env_parse::<usize>("CLASSIFIER_BATCH_SIZE") {
            self.classifier.batch_size = v;
        }
    }

    fn sanitize(&mut self) {
        self.classifier.provider = self.classifier.provider.trim().to_lowercase();
        self.classifier.batch_size = self.classifier.batch_size.max(1);
        self.classifier.timeout_secs = self.classifier.timeout_secs.max(1);
        self.request_timeout_secs = self.request_timeout_secs.max(1);
    }
}

fn env_nonempty(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    match env_nonempty(key)?.parse::<T>() {
        Ok(v) => Some(v),
        Err(_) => {
            tracing::warn!(key, "ignoring unparsable env value");
            None
        }
    }
}
