use crate::error::{Result, WpmError};
use crate::estimate::SolverConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LengthFormat {
    #[default]
    Short,
    Long,
}

impl std::fmt::Display for LengthFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LengthFormat::Short => write!(f, "short"),
            LengthFormat::Long => write!(f, "long"),
        }
    }
}

impl std::str::FromStr for LengthFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "short" => Ok(LengthFormat::Short),
            "long" => Ok(LengthFormat::Long),
            _ => Err(format!("Unknown length format: {}. Use 'short' or 'long'", s)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Markdown,
    Json,
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Markdown => write!(f, "markdown"),
            OutputFormat::Json => write!(f, "json"),
        }
    }
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "markdown" | "md" => Ok(OutputFormat::Markdown),
            "json" => Ok(OutputFormat::Json),
            _ => Err(format!(
                "Unknown format: {}. Use 'markdown' or 'json'",
                s
            )),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub language: String,
    pub initial_wpm: f64,
    pub max_iterations: usize,
    pub convergence_threshold: f64,
    pub concurrency: usize,
    pub length_format: LengthFormat,
    pub output_format: OutputFormat,
}

impl Default for Config {
    fn default() -> Self {
        let solver = SolverConfig::default();
        Self {
            language: "en".to_string(),
            initial_wpm: solver.initial_wpm,
            max_iterations: solver.max_iterations,
            convergence_threshold: solver.convergence_threshold,
            concurrency: 4,
            length_format: LengthFormat::default(),
            output_format: OutputFormat::default(),
        }
    }
}

impl Config {
    /// Defaults, then the user config file, then environment variables.
    pub fn load() -> Result<Self> {
        let mut config = match Self::config_file_path() {
            Some(path) if path.exists() => Self::from_file(&path)?,
            _ => Self::default(),
        };
        config.apply_env();
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        toml::from_str(&contents).map_err(|e| {
            WpmError::Config(format!("Failed to parse {}: {}", path.display(), e))
        })
    }

    fn apply_env(&mut self) {
        if let Ok(language) = std::env::var("YOUTUBE_WPM_LANGUAGE") {
            self.language = language;
        }
        if let Ok(wpm) = std::env::var("YOUTUBE_WPM_INITIAL_WPM") {
            if let Ok(w) = wpm.parse() {
                self.initial_wpm = w;
            }
        }
        if let Ok(iterations) = std::env::var("YOUTUBE_WPM_MAX_ITERATIONS") {
            if let Ok(n) = iterations.parse() {
                self.max_iterations = n;
            }
        }
        if let Ok(threshold) = std::env::var("YOUTUBE_WPM_THRESHOLD") {
            if let Ok(t) = threshold.parse() {
                self.convergence_threshold = t;
            }
        }
        if let Ok(concurrency) = std::env::var("YOUTUBE_WPM_CONCURRENCY") {
            if let Ok(c) = concurrency.parse() {
                self.concurrency = c;
            }
        }
    }

    pub fn solver_config(&self) -> SolverConfig {
        SolverConfig {
            initial_wpm: self.initial_wpm,
            max_iterations: self.max_iterations,
            convergence_threshold: self.convergence_threshold,
        }
    }

    pub fn validate(&self) -> Result<()> {
        self.solver_config().validate()?;

        if self.language.trim().is_empty() {
            return Err(WpmError::Config("Language must not be empty".to_string()));
        }

        if self.concurrency == 0 {
            return Err(WpmError::Config(
                "Concurrency must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }

    fn config_file_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("youtube-wpm").join("config.toml"))
    }
}
