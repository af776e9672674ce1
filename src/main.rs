use anyhow::{Context, Result};
use clap::Parser;
use std::process::ExitCode;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{error, warn, Level};
use tracing_subscriber::EnvFilter;
use youtube_wpm::config::{Config, LengthFormat, OutputFormat};
use youtube_wpm::report::{render_json, render_markdown};
use youtube_wpm::transcript::YouTubeClient;
use youtube_wpm::WpmAnalyzer;

#[derive(Parser)]
#[command(name = "youtube-wpm")]
#[command(version, about = "A CLI tool to get a YouTube video's words per minute (WPM)")]
struct Cli {
    /// YouTube video IDs or URLs
    #[arg(required = true)]
    video_id_list: Vec<String>,

    /// Language code of the transcript
    #[arg(long)]
    language: Option<String>,

    /// Initial approximate words per minute
    #[arg(long)]
    initial_wpm: Option<f64>,

    /// Maximum refinement iterations per video
    #[arg(long)]
    max_iterations: Option<usize>,

    /// Stop refining once the WPM changes by less than this
    #[arg(long)]
    threshold: Option<f64>,

    /// Output format of durations: short, long
    #[arg(long)]
    length_format: Option<String>,

    /// Output format: markdown, json
    #[arg(short, long)]
    format: Option<String>,

    /// Number of videos analyzed concurrently
    #[arg(short, long)]
    concurrency: Option<usize>,

    /// Show word count, blank time and speaking time
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Print debug logs
    #[arg(long, conflicts_with = "quiet")]
    debug: bool,

    /// Suppress execution log messages
    #[arg(long)]
    quiet: bool,

    /// Disable the progress bar
    #[arg(long)]
    no_progress: bool,
}

fn init_logging(debug: bool, quiet: bool) {
    let level = if debug {
        Level::DEBUG
    } else if quiet {
        Level::ERROR
    } else {
        Level::INFO
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level.as_str().to_lowercase()));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .init();
}

fn resolve_config(cli: &Cli) -> Result<Config> {
    let mut config = Config::load().context("Failed to load configuration")?;

    if let Some(ref language) = cli.language {
        config.language = language.clone();
    }
    if let Some(wpm) = cli.initial_wpm {
        config.initial_wpm = wpm;
    }
    if let Some(n) = cli.max_iterations {
        config.max_iterations = n;
    }
    if let Some(t) = cli.threshold {
        config.convergence_threshold = t;
    }
    if let Some(c) = cli.concurrency {
        config.concurrency = c;
    }
    if let Some(ref format) = cli.length_format {
        config.length_format = format
            .parse::<LengthFormat>()
            .map_err(|e: String| anyhow::anyhow!(e))?;
    }
    if let Some(ref format) = cli.format {
        config.output_format = format
            .parse::<OutputFormat>()
            .map_err(|e: String| anyhow::anyhow!(e))?;
    }

    config.validate().context("Configuration validation failed")?;
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    init_logging(cli.debug, cli.quiet);

    let config = resolve_config(&cli)?;

    let cancelled = Arc::new(AtomicBool::new(false));
    let flag = cancelled.clone();
    if let Err(e) = ctrlc::set_handler(move || {
        flag.store(true, Ordering::Relaxed);
    }) {
        warn!("Failed to install Ctrl+C handler: {}", e);
    }

    let analyzer = WpmAnalyzer::new(Box::new(YouTubeClient::new()), config.concurrency)
        .with_progress(!cli.no_progress && !cli.quiet)
        .with_language(&config.language)
        .with_solver(config.solver_config())
        .with_cancel(cancelled);

    let (results, stats) = analyzer.analyze(cli.video_id_list.clone()).await;

    match config.output_format {
        OutputFormat::Markdown => {
            for result in &results {
                match (&result.report, &result.error) {
                    (Some(report), _) => {
                        for line in render_markdown(report, config.length_format, cli.verbose) {
                            println!("{}", line);
                        }
                    }
                    (None, Some(err)) => error!("{}: {}", result.input, err),
                    (None, None) => {}
                }
            }
        }
        OutputFormat::Json => println!("{}", render_json(&results)?),
    }

    if stats.failed > 0 {
        return Ok(ExitCode::FAILURE);
    }
    Ok(ExitCode::SUCCESS)
}
