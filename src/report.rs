//! Rendering of analysis results for the terminal.

use crate::analyze::{VideoReport, VideoResult};
use crate::config::LengthFormat;
use crate::error::Result;
use crate::estimate::SolveOutcome;
use crate::video_id::make_youtube_url;
use serde::Serialize;

pub const TITLE: &str = "Title";
pub const CHANNEL: &str = "Channel";
pub const TIME: &str = "Time";
pub const WPM: &str = "Words Per Minute";
pub const AUTO_GEN_TRANSCRIPT: &str = "Auto generated transcript";
pub const TOTAL_WORD_COUNT: &str = "Total word count";
pub const APPROXIMATE_BLANK_TIME: &str = "Approximate blank time";
pub const APPROXIMATE_SPEAKING_TIME: &str = "Approximate speaking time";

/// Render whole seconds as `1h 2m 3s` or `1 hour 2 minutes 3 seconds`.
pub fn format_duration(total_secs: u64, format: LengthFormat) -> String {
    let units = [
        (total_secs / 3600, "h", "hour"),
        ((total_secs % 3600) / 60, "m", "minute"),
        (total_secs % 60, "s", "second"),
    ];

    let parts: Vec<String> = units
        .iter()
        .filter(|(value, _, _)| *value > 0)
        .map(|&(value, short, long)| match format {
            LengthFormat::Short => format!("{}{}", value, short),
            LengthFormat::Long if value == 1 => format!("{} {}", value, long),
            LengthFormat::Long => format!("{} {}s", value, long),
        })
        .collect();

    if parts.is_empty() {
        return match format {
            LengthFormat::Short => "0s".to_string(),
            LengthFormat::Long => "0 seconds".to_string(),
        };
    }
    parts.join(" ")
}

/// Seconds truncated toward zero; negative and NaN clamp to zero.
fn whole_secs(secs: f64) -> u64 {
    secs.max(0.0) as u64
}

/// Markdown list lines for one video, ending with an empty line.
pub fn render_markdown(report: &VideoReport, length_format: LengthFormat, verbosity: u8) -> Vec<String> {
    let meta = &report.metadata;
    let stat = &report.solution.stat;

    let mut lines = vec![
        format!("- {}: [{}]({})", TITLE, meta.title, make_youtube_url(&meta.video_id)),
        format!("- {}: [{}]({})", CHANNEL, meta.channel_name, meta.channel_url),
        format!("- {}: {}", TIME, format_duration(meta.length_seconds, length_format)),
        format!("- {}: {:.1}", WPM, report.wpm()),
        format!("- {}: {}", AUTO_GEN_TRANSCRIPT, report.is_generated),
    ];

    if verbosity > 0 {
        lines.extend([
            format!("- {}: {}", TOTAL_WORD_COUNT, stat.total_word_count),
            format!(
                "- {}: {}",
                APPROXIMATE_BLANK_TIME,
                format_duration(whole_secs(stat.total_blank_secs), length_format)
            ),
            format!(
                "- {}: {}",
                APPROXIMATE_SPEAKING_TIME,
                format_duration(whole_secs(stat.total_speak_secs), length_format)
            ),
        ]);
    }
    lines.push(String::new());

    lines
}

#[derive(Serialize)]
struct JsonEntry<'a> {
    input: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    video: Option<JsonVideo<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<&'a str>,
}

#[derive(Serialize)]
struct JsonVideo<'a> {
    video_id: &'a str,
    url: String,
    title: &'a str,
    channel: &'a str,
    channel_url: &'a str,
    length_seconds: u64,
    wpm: f64,
    auto_generated_transcript: bool,
    language_code: &'a str,
    total_word_count: usize,
    approximate_blank_secs: f64,
    approximate_speaking_secs: f64,
    iterations: usize,
    outcome: SolveOutcome,
}

impl<'a> From<&'a VideoReport> for JsonVideo<'a> {
    fn from(report: &'a VideoReport) -> Self {
        let meta = &report.metadata;
        let stat = &report.solution.stat;
        Self {
            video_id: &meta.video_id,
            url: make_youtube_url(&meta.video_id),
            title: &meta.title,
            channel: &meta.channel_name,
            channel_url: &meta.channel_url,
            length_seconds: meta.length_seconds,
            wpm: report.wpm(),
            auto_generated_transcript: report.is_generated,
            language_code: &report.language_code,
            total_word_count: stat.total_word_count,
            approximate_blank_secs: stat.total_blank_secs,
            approximate_speaking_secs: stat.total_speak_secs,
            iterations: report.solution.iterations,
            outcome: report.solution.outcome,
        }
    }
}

/// Pretty JSON array with one entry per input, failures included.
pub fn render_json(results: &[VideoResult]) -> Result<String> {
    let entries: Vec<JsonEntry> = results
        .iter()
        .map(|r| JsonEntry {
            input: &r.input,
            video: r.report.as_ref().map(JsonVideo::from),
            error: r.error.as_deref(),
        })
        .collect();

    Ok(serde_json::to_string_pretty(&entries)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_duration_short() {
        assert_eq!(format_duration(0, LengthFormat::Short), "0s");
        assert_eq!(format_duration(45, LengthFormat::Short), "45s");
        assert_eq!(format_duration(754, LengthFormat::Short), "12m 34s");
        assert_eq!(format_duration(3600, LengthFormat::Short), "1h");
        assert_eq!(format_duration(3723, LengthFormat::Short), "1h 2m 3s");
    }

    #[test]
    fn test_format_duration_long() {
        assert_eq!(format_duration(0, LengthFormat::Long), "0 seconds");
        assert_eq!(format_duration(1, LengthFormat::Long), "1 second");
        assert_eq!(format_duration(3723, LengthFormat::Long), "1 hour 2 minutes 3 seconds");
        assert_eq!(format_duration(7260, LengthFormat::Long), "2 hours 1 minute");
    }

    #[test]
    fn test_whole_secs() {
        assert_eq!(whole_secs(12.9), 12);
        assert_eq!(whole_secs(-3.0), 0);
        assert_eq!(whole_secs(f64::NAN), 0);
    }
}
