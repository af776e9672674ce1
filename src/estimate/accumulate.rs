use super::{BlendWeight, Segment, SpeakStat, CHARS_PER_WORD_UNIT, WORD_WEIGHT};
use regex::Regex;
use std::sync::LazyLock;
use tracing::trace;

/// A lone bracketed annotation such as `[Music]` or `[Audience laughing]`.
static RE_SOUND: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\[[A-Z][a-zA-Z ]+\]$").expect("Invalid regex"));

/// Returns true for caption text that labels a sound rather than speech.
pub fn is_non_speech(text: &str) -> bool {
    RE_SOUND.is_match(text.trim())
}

/// Running state of one pass. `begin_talk == 0.0` means no anchor yet.
#[derive(Debug, Default)]
struct Running {
    begin_talk: f64,
    last_end: f64,
    word_count: usize,
    blank_secs: f64,
}

impl Running {
    fn step(mut self, segment: &Segment, seconds_per_word: f64, weight: &BlendWeight) -> Self {
        let words: Vec<&str> = segment.text.split_whitespace().collect();
        let word_ct = words.len();
        let char_ct: usize = words.iter().map(|w| w.chars().count()).sum();

        if self.begin_talk == 0.0 {
            self.begin_talk = segment.start;
        } else if self.last_end > 0.0 {
            let gap = segment.start - self.last_end;
            if gap > 0.0 {
                self.blank_secs += gap;
            }
        }

        let approx_speak_time =
            (word_ct as f64 * WORD_WEIGHT + char_ct as f64 / CHARS_PER_WORD_UNIT) * seconds_per_word;
        let effective_end = segment.start
            + (segment.duration * weight.display_duration_weight()
                + approx_speak_time * weight.approx_speak_time_weight());

        trace!(
            "{}: start={}, word_ct={}, char_ct={}, duration={}, speak_time={:.2}",
            segment.text.trim(),
            segment.start,
            word_ct,
            char_ct,
            segment.duration,
            approx_speak_time
        );

        self.last_end = effective_end;
        self.word_count += word_ct;
        self
    }

    fn finish(self) -> SpeakStat {
        SpeakStat {
            total_word_count: self.word_count,
            total_blank_secs: self.blank_secs,
            total_speak_secs: self.last_end - self.begin_talk - self.blank_secs,
        }
    }
}

/// Measure word count, blank time and speaking time for `segments`, assuming
/// each word takes `seconds_per_word` to say.
///
/// Non-speech markers are skipped entirely. Each remaining segment's end is
/// re-estimated as a blend of its display duration and the modelled speaking
/// time; a positive gap between the previous segment's estimated end and the
/// next start counts as blank time. Overlaps count as nothing.
pub fn accumulate(segments: &[Segment], seconds_per_word: f64) -> SpeakStat {
    let weight = BlendWeight::default();

    segments
        .iter()
        .filter(|segment| !is_non_speech(&segment.text))
        .fold(Running::default(), |state, segment| {
            state.step(segment, seconds_per_word, &weight)
        })
        .finish()
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-9;

    fn effective_duration(text: &str, duration: f64, spw: f64) -> f64 {
        let words: Vec<&str> = text.split_whitespace().collect();
        let chars: usize = words.iter().map(|w| w.len()).sum();
        let approx = (words.len() as f64 * 0.95 + chars as f64 / 100.0) * spw;
        duration / 6.0 + approx * 5.0 / 6.0
    }

    #[test]
    fn test_non_speech_markers() {
        assert!(is_non_speech("[Music]"));
        assert!(is_non_speech("  [Applause]  "));
        assert!(is_non_speech("[Audience laughing]"));
        assert!(!is_non_speech("[music]"));
        assert!(!is_non_speech("[A]"));
        assert!(!is_non_speech("[Music] and talking"));
        assert!(!is_non_speech("hello"));
    }

    #[test]
    fn test_empty_input() {
        let stat = accumulate(&[], 0.5);
        assert_eq!(stat.total_word_count, 0);
        assert_eq!(stat.total_blank_secs, 0.0);
        assert_eq!(stat.total_speak_secs, 0.0);
        assert_eq!(stat.wpm(), None);
    }

    #[test]
    fn test_single_segment() {
        let segments = vec![Segment::new("hello world", 5.0, 2.0)];
        let stat = accumulate(&segments, 0.5);

        assert_eq!(stat.total_word_count, 2);
        assert_eq!(stat.total_blank_secs, 0.0);
        // (2 * 0.95 + 10 / 100) * 0.5 = 1.0 modelled; 2/6 + 5/6 blended
        assert!((stat.total_speak_secs - 7.0 / 6.0).abs() < EPS);
        assert!((stat.total_speak_secs - effective_duration("hello world", 2.0, 0.5)).abs() < EPS);
    }

    #[test]
    fn test_only_markers_is_degenerate() {
        let segments = vec![
            Segment::new("[Music]", 0.0, 3.0),
            Segment::new("[Applause]", 3.0, 2.0),
        ];
        let stat = accumulate(&segments, 0.5);
        assert_eq!(stat.total_word_count, 0);
        assert_eq!(stat.total_speak_secs, 0.0);
        assert!(stat.is_degenerate());
    }

    #[test]
    fn test_markers_do_not_affect_timing() {
        let plain = vec![
            Segment::new("one two three", 10.0, 2.0),
            Segment::new("four five", 20.0, 2.0),
            Segment::new("six", 30.0, 1.0),
        ];
        let with_markers = vec![
            Segment::new("[Music]", 1.0, 9.0),
            Segment::new("one two three", 10.0, 2.0),
            Segment::new("[Applause]", 15.0, 4.0),
            Segment::new("four five", 20.0, 2.0),
            Segment::new("[Music]", 25.0, 5.0),
            Segment::new("six", 30.0, 1.0),
        ];
        assert_eq!(accumulate(&plain, 0.4), accumulate(&with_markers, 0.4));
    }

    #[test]
    fn test_gap_measured_from_previous_effective_end() {
        let segments = vec![
            Segment::new("one", 10.0, 1.0),
            Segment::new("two", 20.0, 1.0),
            Segment::new("six", 30.0, 1.0),
        ];
        let stat = accumulate(&segments, 0.5);
        let eff = effective_duration("one", 1.0, 0.5);

        let expected_blank = (20.0 - (10.0 + eff)) + (30.0 - (20.0 + eff));
        assert_eq!(stat.total_word_count, 3);
        assert!((stat.total_blank_secs - expected_blank).abs() < EPS);
        assert!((stat.total_speak_secs - 3.0 * eff).abs() < EPS);
    }

    #[test]
    fn test_back_to_back_speech_has_no_blank_time() {
        let spw = 0.4;
        let texts = ["first line of speech", "second line here", "third and last"];
        let mut start = 2.0;
        let mut segments = Vec::new();
        for text in texts {
            segments.push(Segment::new(text, start, 2.0));
            start += effective_duration(text, 2.0, spw);
        }

        let stat = accumulate(&segments, spw);
        assert!(stat.total_blank_secs < EPS);
        assert!((stat.total_speak_secs - (start - 2.0)).abs() < 1e-6);
    }

    #[test]
    fn test_overlapping_captions_add_no_blank_time() {
        let segments = vec![
            Segment::new("we are going to talk", 1.0, 4.0),
            Segment::new("about overlapping caption boxes", 2.0, 4.0),
            Segment::new("which happen all the time", 3.0, 4.0),
            Segment::new("in auto generated transcripts", 3.5, 4.0),
        ];
        let stat = accumulate(&segments, 0.4);
        assert_eq!(stat.total_word_count, 18);
        assert_eq!(stat.total_blank_secs, 0.0);
        assert!(stat.total_speak_secs > 0.0);
    }

    #[test]
    fn test_zero_start_is_not_an_anchor() {
        let segments = vec![
            Segment::new("hello world", 0.0, 2.0),
            Segment::new("foo", 3.0, 1.0),
        ];
        let spw = 60.0 / 180.0;
        let stat = accumulate(&segments, spw);

        assert_eq!(stat.total_word_count, 3);
        assert_eq!(stat.total_blank_secs, 0.0);
        assert!((stat.total_speak_secs - effective_duration("foo", 1.0, spw)).abs() < EPS);
    }

    #[test]
    fn test_deterministic() {
        let segments = vec![
            Segment::new("The quick brown fox", 0.5, 2.5),
            Segment::new("jumps over", 2.0, 3.0),
            Segment::new("[Music]", 4.0, 1.0),
            Segment::new("the lazy dog", 9.0, 2.0),
        ];
        let a = accumulate(&segments, 0.33);
        let b = accumulate(&segments, 0.33);
        assert_eq!(a.total_word_count, b.total_word_count);
        assert_eq!(a.total_blank_secs.to_bits(), b.total_blank_secs.to_bits());
        assert_eq!(a.total_speak_secs.to_bits(), b.total_speak_secs.to_bits());
    }

    #[test]
    fn test_longer_words_take_longer() {
        let short = accumulate(&[Segment::new("a b c", 1.0, 1.0)], 0.5);
        let long = accumulate(&[Segment::new("antidisestablishment b c", 1.0, 1.0)], 0.5);
        assert!(long.total_speak_secs > short.total_speak_secs);
    }
}
