use crate::error::{Result, WpmError};
use crate::estimate::Segment;
use crate::transcript::{Transcript, TranscriptSource, VideoMetadata, VideoTranscript};
use async_trait::async_trait;
use regex::Regex;
use serde::Deserialize;
use std::sync::LazyLock;
use std::time::Duration;
use tracing::{debug, warn};

/// Default YouTube origin.
const YOUTUBE_BASE_URL: &str = "https://www.youtube.com";

/// Marker preceding the player response JSON in the watch page.
const PLAYER_RESPONSE_MARKER: &str = "ytInitialPlayerResponse = ";

/// Maximum retries for transient failures.
const MAX_RETRIES: u32 = 3;

/// Base delay for exponential backoff (milliseconds).
const BASE_DELAY_MS: u64 = 500;

static RE_TEXT_ELEMENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<text\b([^>]*)>(.*?)</text>").expect("Invalid regex"));

static RE_ATTRIBUTE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"([a-zA-Z_:-]+)="([^"]*)""#).expect("Invalid regex"));

static RE_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<[^>]*>").expect("Invalid regex"));

static RE_NUMERIC_ENTITY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"&#(x[0-9a-fA-F]+|[0-9]+);").expect("Invalid regex"));

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PlayerResponse {
    playability_status: Option<PlayabilityStatus>,
    video_details: Option<VideoDetails>,
    captions: Option<Captions>,
}

#[derive(Debug, Deserialize)]
struct PlayabilityStatus {
    status: String,
    reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VideoDetails {
    video_id: String,
    #[serde(default)]
    title: String,
    #[serde(default)]
    length_seconds: String,
    #[serde(default)]
    author: String,
    #[serde(default)]
    channel_id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Captions {
    player_captions_tracklist_renderer: TracklistRenderer,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TracklistRenderer {
    #[serde(default)]
    caption_tracks: Vec<CaptionTrack>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CaptionTrack {
    base_url: String,
    language_code: String,
    #[serde(default)]
    name: TrackName,
    kind: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TrackName {
    simple_text: Option<String>,
    #[serde(default)]
    runs: Vec<TextRun>,
}

#[derive(Debug, Clone, Deserialize)]
struct TextRun {
    text: String,
}

impl CaptionTrack {
    fn is_generated(&self) -> bool {
        self.kind.as_deref() == Some("asr")
    }

    fn display_name(&self) -> String {
        match &self.name.simple_text {
            Some(text) => text.clone(),
            None if !self.name.runs.is_empty() => {
                self.name.runs.iter().map(|r| r.text.as_str()).collect()
            }
            None => self.language_code.clone(),
        }
    }
}

/// Transcript source backed by the public YouTube watch page and its
/// timed-text caption tracks.
pub struct YouTubeClient {
    client: reqwest::Client,
    base_url: String,
    max_retries: u32,
}

impl Default for YouTubeClient {
    fn default() -> Self {
        Self::new()
    }
}

impl YouTubeClient {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: YOUTUBE_BASE_URL.to_string(),
            max_retries: MAX_RETRIES,
        }
    }

    /// Point the client at a different origin (used by tests).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    async fn get_text(&self, url: &str) -> Result<String> {
        let mut last_error = None;

        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                let delay = BASE_DELAY_MS * 2u64.pow(attempt - 1);
                debug!("Retry attempt {} after {}ms delay", attempt, delay);
                tokio::time::sleep(Duration::from_millis(delay)).await;
            }

            let result = self
                .client
                .get(url)
                .header("Accept-Language", "en-US")
                .send()
                .await
                .and_then(|response| response.error_for_status());

            match result {
                Ok(response) => return Ok(response.text().await?),
                Err(e) => {
                    // Don't retry on client errors
                    if e.status().is_some_and(|s| s.is_client_error()) {
                        return Err(e.into());
                    }
                    warn!("Request to {} failed (attempt {}): {}", url, attempt + 1, e);
                    last_error = Some(e);
                }
            }
        }

        match last_error {
            Some(e) => Err(e.into()),
            None => Err(WpmError::VideoUnavailable(url.to_string())),
        }
    }
}

#[async_trait]
impl TranscriptSource for YouTubeClient {
    async fn fetch(&self, video_id: &str, languages: &[String]) -> Result<VideoTranscript> {
        let watch_url = format!("{}/watch?v={}", self.base_url, video_id);
        debug!("fetching watch page of {} ...", video_id);
        let html = self.get_text(&watch_url).await?;

        let player = extract_player_response(&html, video_id)?;
        let metadata = parse_metadata(&player, video_id)?;

        let tracks = player
            .captions
            .map(|c| c.player_captions_tracklist_renderer.caption_tracks)
            .unwrap_or_default();
        if tracks.is_empty() {
            return Err(WpmError::TranscriptsDisabled(video_id.to_string()));
        }

        let track = find_track(&tracks, languages).ok_or_else(|| WpmError::NoTranscriptFound {
            video_id: video_id.to_string(),
            requested: languages.to_vec(),
            available: tracks.iter().map(|t| t.language_code.clone()).collect(),
        })?;

        debug!(
            "fetching transcript: video_id={}, language_code={}, is_generated={}",
            video_id,
            track.language_code,
            track.is_generated()
        );
        let xml = self.get_text(&track.base_url.replace("&fmt=srv3", "")).await?;
        let segments = parse_timed_text(&xml)?;

        Ok(VideoTranscript {
            metadata,
            transcript: Transcript {
                segments,
                language: track.display_name(),
                language_code: track.language_code.clone(),
                is_generated: track.is_generated(),
            },
        })
    }

    fn name(&self) -> &'static str {
        "YouTube"
    }
}

fn extract_player_response(html: &str, video_id: &str) -> Result<PlayerResponse> {
    let start = html
        .find(PLAYER_RESPONSE_MARKER)
        .map(|i| i + PLAYER_RESPONSE_MARKER.len())
        .ok_or_else(|| WpmError::VideoUnavailable(video_id.to_string()))?;

    // The JSON object is followed by more script; only read the first value.
    let mut stream =
        serde_json::Deserializer::from_str(&html[start..]).into_iter::<PlayerResponse>();
    match stream.next() {
        Some(result) => Ok(result?),
        None => Err(WpmError::Parse(format!(
            "empty player response for {}",
            video_id
        ))),
    }
}

fn parse_metadata(player: &PlayerResponse, video_id: &str) -> Result<VideoMetadata> {
    if let Some(status) = &player.playability_status {
        if status.status != "OK" {
            let reason = status.reason.as_deref().unwrap_or(&status.status);
            return Err(WpmError::VideoUnavailable(format!("{}: {}", video_id, reason)));
        }
    }

    let details = player
        .video_details
        .as_ref()
        .ok_or_else(|| WpmError::Parse(format!("missing video details for {}", video_id)))?;

    Ok(VideoMetadata {
        video_id: details.video_id.clone(),
        title: details.title.clone(),
        channel_name: details.author.clone(),
        channel_url: format!("{}/channel/{}", YOUTUBE_BASE_URL, details.channel_id),
        length_seconds: parse_length(&details.length_seconds, video_id),
    })
}

fn parse_length(value: &str, video_id: &str) -> u64 {
    match value.parse() {
        Ok(secs) => secs,
        Err(_) => {
            warn!("{}: unreadable lengthSeconds {:?}, reporting 0", video_id, value);
            0
        }
    }
}

/// Per requested code, a manually created track wins over a generated one.
fn find_track<'a>(tracks: &'a [CaptionTrack], languages: &[String]) -> Option<&'a CaptionTrack> {
    languages.iter().find_map(|code| {
        let mut candidates = tracks.iter().filter(|t| &t.language_code == code);
        let manual = candidates.clone().find(|t| !t.is_generated());
        manual.or_else(|| candidates.next())
    })
}

/// Parse a timed-text document into caption segments.
pub fn parse_timed_text(xml: &str) -> Result<Vec<Segment>> {
    RE_TEXT_ELEMENT
        .captures_iter(xml)
        .map(|caps| -> Result<Segment> {
            let attrs = &caps[1];
            let mut start = None;
            let mut duration = 0.0;
            for attr in RE_ATTRIBUTE.captures_iter(attrs) {
                match &attr[1] {
                    "start" => start = Some(parse_seconds(&attr[2])?),
                    "dur" => duration = parse_seconds(&attr[2])?,
                    _ => {}
                }
            }
            let start =
                start.ok_or_else(|| WpmError::Parse(format!("text without start: {}", attrs)))?;

            // Timed text is XML-escaped around already HTML-escaped captions.
            // Markup lives in the outer layer; the inner one is spoken text.
            let text = unescape_html(&caps[2]);
            let text = unescape_html(&RE_TAG.replace_all(&text, ""));

            Ok(Segment {
                text,
                start,
                duration,
            })
        })
        .collect()
}

fn parse_seconds(value: &str) -> Result<f64> {
    value
        .parse()
        .map_err(|_| WpmError::Parse(format!("invalid time value: {:?}", value)))
}

fn unescape_html(text: &str) -> String {
    let text = RE_NUMERIC_ENTITY.replace_all(text, |caps: &regex::Captures| {
        let code = &caps[1];
        let value = match code.strip_prefix('x') {
            Some(hex) => u32::from_str_radix(hex, 16).ok(),
            None => code.parse().ok(),
        };
        value
            .and_then(char::from_u32)
            .map(String::from)
            .unwrap_or_else(|| caps[0].to_string())
    });

    // &amp; last so "&amp;lt;" decodes one level only
    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}
