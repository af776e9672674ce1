//! Speaking-time estimation.
//!
//! Caption segments only tell us when text was *displayed*, not when it was
//! spoken. [`accumulate`] turns a segment sequence plus an assumed speaking
//! rate into net speaking and blank time; [`Solver`] feeds the measured rate
//! back in until the assumption and the measurement agree.

pub mod accumulate;
pub mod solver;

pub use accumulate::{accumulate, is_non_speech};
pub use solver::{seconds_per_word, solve, Solution, SolveOutcome, Solver, SolverConfig};

use serde::{Deserialize, Serialize};

/// Weight of a word in the speaking-time heuristic.
pub const WORD_WEIGHT: f64 = 0.95;

/// Characters are divided by this before being added to the weighted word count.
pub const CHARS_PER_WORD_UNIT: f64 = 100.0;

/// One timestamped caption entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    pub text: String,
    /// Display start in seconds.
    pub start: f64,
    /// Display duration in seconds.
    pub duration: f64,
}

impl Segment {
    pub fn new(text: impl Into<String>, start: f64, duration: f64) -> Self {
        Self {
            text: text.into(),
            start,
            duration,
        }
    }
}

/// Relative trust in the displayed caption duration versus the modelled
/// speaking duration. Always applied normalized by the sum.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BlendWeight {
    pub display_duration: f64,
    pub approx_speak_time: f64,
}

impl Default for BlendWeight {
    fn default() -> Self {
        Self {
            display_duration: 1.0,
            approx_speak_time: 5.0,
        }
    }
}

impl BlendWeight {
    fn total(&self) -> f64 {
        self.display_duration + self.approx_speak_time
    }

    pub fn display_duration_weight(&self) -> f64 {
        self.display_duration / self.total()
    }

    pub fn approx_speak_time_weight(&self) -> f64 {
        self.approx_speak_time / self.total()
    }
}

/// Result of a single accumulation pass.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct SpeakStat {
    pub total_word_count: usize,
    pub total_blank_secs: f64,
    pub total_speak_secs: f64,
}

impl SpeakStat {
    /// Words per minute, or `None` when no speaking time was measured.
    pub fn wpm(&self) -> Option<f64> {
        if self.is_degenerate() {
            return None;
        }
        Some(self.total_word_count as f64 / self.total_speak_secs * 60.0)
    }

    pub fn is_degenerate(&self) -> bool {
        self.total_speak_secs <= 0.0 || self.total_speak_secs.is_nan()
    }
}
