use crate::error::{Result, WpmError};
use crate::estimate::{SolveOutcome, Solution, Solver, SolverConfig};
use crate::transcript::{normalize_languages, TranscriptSource, VideoMetadata};
use crate::video_id;
use futures::stream::{FuturesUnordered, StreamExt};
use indicatif::{ProgressBar, ProgressStyle};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Semaphore;
use tracing::{debug, info, warn};

/// Speaking-rate estimate for one video.
#[derive(Debug, Clone)]
pub struct VideoReport {
    pub metadata: VideoMetadata,
    pub language: String,
    pub language_code: String,
    pub is_generated: bool,
    pub solution: Solution,
}

impl VideoReport {
    /// Reports are only built from non-degenerate solutions.
    pub fn wpm(&self) -> f64 {
        self.solution.wpm().unwrap_or_default()
    }
}

/// Result of processing a single input.
#[derive(Debug)]
pub struct VideoResult {
    pub index: usize,
    pub input: String,
    pub report: Option<VideoReport>,
    pub error: Option<String>,
    pub duration_ms: u64,
}

/// Statistics from a batch run.
#[derive(Debug, Clone)]
pub struct BatchStats {
    pub total_videos: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub total_time: Duration,
}

/// Estimates speaking rates for many videos concurrently. A failure on one
/// video never aborts the others.
pub struct WpmAnalyzer {
    source: Arc<dyn TranscriptSource>,
    concurrency: usize,
    show_progress: bool,
    languages: Arc<Vec<String>>,
    solver: Arc<Solver>,
    cancelled: Arc<AtomicBool>,
}

impl WpmAnalyzer {
    /// Create a new analyzer fetching transcripts from `source`.
    pub fn new(source: Box<dyn TranscriptSource>, concurrency: usize) -> Self {
        Self {
            source: Arc::from(source),
            concurrency: concurrency.max(1),
            show_progress: true,
            languages: Arc::new(normalize_languages("en")),
            solver: Arc::new(Solver::default()),
            cancelled: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Enable or disable progress bar display.
    pub fn with_progress(mut self, show: bool) -> Self {
        self.show_progress = show;
        self
    }

    pub fn with_language(mut self, language: &str) -> Self {
        self.languages = Arc::new(normalize_languages(language));
        self
    }

    pub fn with_solver(mut self, config: SolverConfig) -> Self {
        self.solver = Arc::new(Solver::new(config));
        self
    }

    /// Inputs not yet started when `cancelled` is set fail as cancelled.
    pub fn with_cancel(mut self, cancelled: Arc<AtomicBool>) -> Self {
        self.cancelled = cancelled;
        self
    }

    /// Analyze a single video id or URL.
    pub async fn analyze_one(&self, input: &str) -> Result<VideoReport> {
        analyze_video(&*self.source, &self.solver, &self.languages, input).await
    }

    /// Analyze all inputs and return per-input results in input order.
    pub async fn analyze(&self, inputs: Vec<String>) -> (Vec<VideoResult>, BatchStats) {
        let total_videos = inputs.len();
        let start_time = Instant::now();

        info!(
            "Analyzing {} videos with {} concurrent requests using {}",
            total_videos,
            self.concurrency,
            self.source.name()
        );

        let progress_bar = if self.show_progress && total_videos > 0 {
            let pb = ProgressBar::new(total_videos as u64);
            pb.set_style(
                ProgressStyle::default_bar()
                    .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} videos ({eta})")
                    .unwrap_or_else(|_| ProgressStyle::default_bar())
                    .progress_chars("#>-"),
            );
            Some(pb)
        } else {
            None
        };

        // Use semaphore to limit concurrency
        let semaphore = Arc::new(Semaphore::new(self.concurrency));
        let mut futures = FuturesUnordered::new();

        for (index, input) in inputs.into_iter().enumerate() {
            let sem = semaphore.clone();
            let source = self.source.clone();
            let solver = self.solver.clone();
            let languages = self.languages.clone();
            let cancelled = self.cancelled.clone();
            let pb = progress_bar.clone();

            futures.push(async move {
                let video_start = Instant::now();

                let result = match sem.acquire().await {
                    Ok(_permit) if !cancelled.load(Ordering::Relaxed) => {
                        analyze_video(&*source, &solver, &languages, &input).await
                    }
                    _ => Err(WpmError::Cancelled),
                };
                let duration_ms = video_start.elapsed().as_millis() as u64;

                if let Some(ref pb) = pb {
                    pb.inc(1);
                }

                match result {
                    Ok(report) => {
                        debug!("{} completed in {}ms", input, duration_ms);
                        VideoResult {
                            index,
                            input,
                            report: Some(report),
                            error: None,
                            duration_ms,
                        }
                    }
                    Err(e) => {
                        warn!("{} failed: {}", input, e);
                        VideoResult {
                            index,
                            input,
                            report: None,
                            error: Some(e.to_string()),
                            duration_ms,
                        }
                    }
                }
            });
        }

        let mut results: Vec<VideoResult> = Vec::with_capacity(total_videos);
        while let Some(result) = futures.next().await {
            results.push(result);
        }

        if let Some(pb) = progress_bar {
            pb.finish_and_clear();
        }

        // Sort results by input index to maintain order
        results.sort_by_key(|r| r.index);

        let succeeded = results.iter().filter(|r| r.report.is_some()).count();
        let stats = BatchStats {
            total_videos,
            succeeded,
            failed: total_videos - succeeded,
            total_time: start_time.elapsed(),
        };

        info!(
            "Analysis complete: {}/{} videos successful in {:.2}s",
            stats.succeeded,
            stats.total_videos,
            stats.total_time.as_secs_f64()
        );

        (results, stats)
    }
}

async fn analyze_video(
    source: &dyn TranscriptSource,
    solver: &Solver,
    languages: &[String],
    input: &str,
) -> Result<VideoReport> {
    let video_id = video_id::normalize(input)?;
    debug!("fetching transcripts of {} ...", video_id);

    let fetched = source.fetch(&video_id, languages).await?;
    let transcript = fetched.transcript;

    debug!(
        "calculating wpm: video_id={}, language={}, language_code={}, is_generated={}",
        video_id, transcript.language, transcript.language_code, transcript.is_generated
    );

    let solution = solver.run(&transcript.segments);
    match solution.outcome {
        SolveOutcome::Degenerate => return Err(WpmError::NoSpeech(video_id)),
        SolveOutcome::BudgetExhausted => info!(
            "{}: rate did not converge within {} iterations",
            video_id,
            solver.config().max_iterations
        ),
        SolveOutcome::Converged => {}
    }

    Ok(VideoReport {
        metadata: fetched.metadata,
        language: transcript.language,
        language_code: transcript.language_code,
        is_generated: transcript.is_generated,
        solution,
    })
}
