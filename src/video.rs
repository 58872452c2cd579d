//! Video identifier extraction from user-supplied URLs.

use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;

// 11-char YouTube id after `v=`, then after any `/`.
static RE_QUERY_ID: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"v=([0-9A-Za-z_-]{11})").expect("valid query id regex"));
static RE_PATH_ID: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"/([0-9A-Za-z_-]{11})").expect("valid path id regex"));

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("no video id found in '{0}'")]
pub struct VideoIdNotFound(pub String);

/// Extract the 11-character video id from a URL.
///
/// Tries the `v=` query form first, then the first path segment that starts
/// with 11 id characters.
pub fn extract_video_id(url: &str) -> Result<&str, VideoIdNotFound> {
    [&*RE_QUERY_ID, &*RE_PATH_ID]
        .into_iter()
        .find_map(|re| re.captures(url).and_then(|c| c.get(1)))
        .map(|m| m.as_str())
        .ok_or_else(|| VideoIdNotFound(url.to_string()))
}

/// Locator under which a video's record is stored: `watch?v=` becomes `v/`.
pub fn canonical_locator(url: &str) -> String {
    url.trim().replace("watch?v=", "v/")
}
