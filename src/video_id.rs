//! YouTube video identifier handling.
//!
//! Accepts either a bare 11-character id or one of the watch / short-link URL
//! shapes and reduces it to the bare id.

use crate::error::{Result, WpmError};
use regex::Regex;
use std::sync::LazyLock;

static RE_VIDEO_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-zA-Z0-9_-]{11}$").expect("Invalid regex"));

static RE_LONG_VIDEO_URL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"https://www\.youtube\.com/watch\?v=([a-zA-Z0-9_-]{11})").expect("Invalid regex")
});

static RE_SHORT_VIDEO_URL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"https://youtu\.be/([a-zA-Z0-9_-]{11})").expect("Invalid regex")
});

/// Returns true when `value` is exactly one well-formed video id.
pub fn validate(value: &str) -> bool {
    RE_VIDEO_ID.is_match(value)
}

/// Reduce a video id or URL to the bare 11-character id.
///
/// Rules are tried in order: bare id, `https://www.youtube.com/watch?v=<id>`,
/// `https://youtu.be/<id>`. Anything after the id (query parameters,
/// timestamps, share tokens) is ignored.
pub fn normalize(value: &str) -> Result<String> {
    if validate(value) {
        return Ok(value.to_string());
    }

    [&*RE_LONG_VIDEO_URL, &*RE_SHORT_VIDEO_URL]
        .iter()
        .find_map(|re| re.captures(value))
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
        .ok_or_else(|| WpmError::InvalidIdentifier(value.to_string()))
}

pub fn make_youtube_url(video_id: &str) -> String {
    format!("https://www.youtube.com/watch?v={}", video_id)
}
