pub mod youtube;

pub use youtube::YouTubeClient;

use crate::error::Result;
use crate::estimate::Segment;
use async_trait::async_trait;
use serde::Serialize;

/// Display-only information about a video.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VideoMetadata {
    pub video_id: String,
    pub title: String,
    pub channel_name: String,
    pub channel_url: String,
    pub length_seconds: u64,
}

#[derive(Debug, Clone)]
pub struct Transcript {
    pub segments: Vec<Segment>,
    /// Human readable language name, e.g. "English (auto-generated)".
    pub language: String,
    pub language_code: String,
    pub is_generated: bool,
}

#[derive(Debug, Clone)]
pub struct VideoTranscript {
    pub metadata: VideoMetadata,
    pub transcript: Transcript,
}

#[async_trait]
pub trait TranscriptSource: Send + Sync {
    /// Fetch metadata and the best transcript for `video_id`, trying
    /// `languages` in order.
    async fn fetch(&self, video_id: &str, languages: &[String]) -> Result<VideoTranscript>;
    fn name(&self) -> &'static str;
}

/// Expand a language option into the ordered codes to try.
pub fn normalize_languages(language: &str) -> Vec<String> {
    match language {
        "en" | "en-US" => vec!["en-US".to_string(), "en".to_string()],
        other => vec![other.to_string()],
    }
}
