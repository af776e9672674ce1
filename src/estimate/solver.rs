use super::{accumulate, Segment, SpeakStat};
use crate::error::{Result, WpmError};
use serde::Serialize;
use tracing::debug;

/// Seconds needed to say one word at `wpm` words per minute.
pub fn seconds_per_word(wpm: f64) -> f64 {
    60.0 / wpm
}

/// Parameters of the fixed-point iteration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SolverConfig {
    /// Rate assumed by the first pass.
    pub initial_wpm: f64,
    /// Upper bound on accumulation passes.
    pub max_iterations: usize,
    /// Stop once assumed and measured rates differ by less than this.
    pub convergence_threshold: f64,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            initial_wpm: 180.0,
            max_iterations: 10,
            convergence_threshold: 1.0,
        }
    }
}

impl SolverConfig {
    pub fn validate(&self) -> Result<()> {
        if !(self.initial_wpm.is_finite() && self.initial_wpm > 0.0) {
            return Err(WpmError::Config(format!(
                "Initial WPM must be a positive number, got {}",
                self.initial_wpm
            )));
        }
        if self.max_iterations == 0 {
            return Err(WpmError::Config(
                "Max iterations must be greater than 0".to_string(),
            ));
        }
        if !(self.convergence_threshold.is_finite() && self.convergence_threshold > 0.0) {
            return Err(WpmError::Config(format!(
                "Convergence threshold must be a positive number, got {}",
                self.convergence_threshold
            )));
        }
        Ok(())
    }
}

/// How the iteration ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SolveOutcome {
    /// Assumed and measured rates agreed within the threshold.
    Converged,
    /// Iteration budget ran out; the last estimate is still usable.
    BudgetExhausted,
    /// No speaking time was measured, so there is no rate to feed back.
    Degenerate,
}

/// Final estimate plus how it was reached.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Solution {
    pub stat: SpeakStat,
    /// Number of accumulation passes performed.
    pub iterations: usize,
    pub outcome: SolveOutcome,
}

impl Solution {
    pub fn wpm(&self) -> Option<f64> {
        self.stat.wpm()
    }
}

#[derive(Debug, Clone, Default)]
pub struct Solver {
    config: SolverConfig,
}

impl Solver {
    pub fn new(config: SolverConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SolverConfig {
        &self.config
    }

    /// Iterate accumulation passes until the measured rate matches the
    /// assumed one. Always performs at least one pass.
    pub fn run(&self, segments: &[Segment]) -> Solution {
        let max_iterations = self.config.max_iterations.max(1);
        let mut assumed_wpm = self.config.initial_wpm;
        let mut stat = SpeakStat::default();

        for i in 0..max_iterations {
            stat = accumulate(segments, seconds_per_word(assumed_wpm));

            let wpm = match stat.wpm() {
                Some(wpm) if wpm > 0.0 => wpm,
                _ => {
                    debug!("iteration={}, no measurable speaking rate", i);
                    return Solution {
                        stat,
                        iterations: i + 1,
                        outcome: SolveOutcome::Degenerate,
                    };
                }
            };

            let diff_wpm = (wpm - assumed_wpm).abs();
            debug!("iteration={}, wpm={:.1}, diff_wpm={:.1}", i, wpm, diff_wpm);
            if diff_wpm < self.config.convergence_threshold {
                return Solution {
                    stat,
                    iterations: i + 1,
                    outcome: SolveOutcome::Converged,
                };
            }

            assumed_wpm = wpm;
        }

        debug!(
            "no convergence after {} iterations, using last estimate",
            max_iterations
        );
        Solution {
            stat,
            iterations: max_iterations,
            outcome: SolveOutcome::BudgetExhausted,
        }
    }
}

/// Estimate speaking statistics by fixed-point refinement of the rate.
///
/// Runs at most `max_iterations` passes, except that a budget of zero still
/// measures once. Use [`SolverConfig::validate`] to reject such a budget.
pub fn solve(
    segments: &[Segment],
    initial_wpm: f64,
    max_iterations: usize,
    convergence_threshold: f64,
) -> SpeakStat {
    Solver::new(SolverConfig {
        initial_wpm,
        max_iterations,
        convergence_threshold,
    })
    .run(segments)
    .stat
}
