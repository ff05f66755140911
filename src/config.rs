use crate::error::ConfigError;
use crate::sequencer::TieBreak;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Audio file extensions recognised when no others are configured.
pub const DEFAULT_EXTENSIONS: &[&str] = &["mp3", "wav", "flac"];

/// Number of MFCC coefficients in a timbral fingerprint.
pub const DEFAULT_FINGERPRINT_SIZE: usize = 20;

/// Configuration defaults that can be saved to a file
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extensions: Option<Vec<String>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub on_error: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub tie_break: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub jobs: Option<usize>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub fingerprint_size: Option<usize>,
}

impl Config {
    /// Create a new empty config
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the config file path (~/.state/autoplaylist/defaults.toml)
    pub fn get_config_path() -> Result<PathBuf, ConfigError> {
        let home = std::env::var("HOME").map_err(|_| ConfigError::NoHome)?;
        Ok(Path::new(&home)
            .join(".state")
            .join("autoplaylist")
            .join("defaults.toml"))
    }

    /// Load config from the default location
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::get_config_path()?)
    }

    /// Load config from `path`, or an empty config if the file doesn't exist
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Config::new());
        }

        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Save config to the default location
    pub fn save(&self) -> Result<PathBuf, ConfigError> {
        let path = Self::get_config_path()?;
        self.save_to(&path)?;
        Ok(path)
    }

    /// Save config to `path`, creating parent directories as needed
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        let io_err = |source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        };

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(io_err)?;
        }

        let toml_string = toml::to_string_pretty(self)?;
        fs::write(path, toml_string).map_err(io_err)
    }

    /// Merge this config with another, preferring values from other
    pub fn merge(&mut self, other: &Config) {
        if other.extensions.is_some() {
            self.extensions = other.extensions.clone();
        }
        if other.on_error.is_some() {
            self.on_error = other.on_error.clone();
        }
        if other.tie_break.is_some() {
            self.tie_break = other.tie_break.clone();
        }
        if other.jobs.is_some() {
            self.jobs = other.jobs;
        }
        if other.fingerprint_size.is_some() {
            self.fingerprint_size = other.fingerprint_size;
        }
    }

    /// Fill in defaults and validate every value.
    pub fn resolve(&self) -> Result<PlaylistOptions, ConfigError> {
        let collector = match &self.extensions {
            Some(extensions) => CollectorConfig::from_extensions(extensions)?,
            None => CollectorConfig::default(),
        };

        let on_error = match &self.on_error {
            Some(s) => ErrorPolicy::from_str(s).map_err(|reason| ConfigError::InvalidValue {
                field: "on_error",
                reason,
            })?,
            None => ErrorPolicy::default(),
        };

        let tie_break = match &self.tie_break {
            Some(s) => TieBreak::from_str(s).map_err(|reason| ConfigError::InvalidValue {
                field: "tie_break",
                reason,
            })?,
            None => TieBreak::default(),
        };

        let jobs = self.jobs.unwrap_or(1);
        if jobs == 0 {
            return Err(ConfigError::InvalidValue {
                field: "jobs",
                reason: "must be at least 1".to_string(),
            });
        }

        let fingerprint_size = self.fingerprint_size.unwrap_or(DEFAULT_FINGERPRINT_SIZE);
        if fingerprint_size == 0 {
            return Err(ConfigError::InvalidValue {
                field: "fingerprint_size",
                reason: "must be at least 1".to_string(),
            });
        }

        Ok(PlaylistOptions {
            collector,
            on_error,
            tie_break,
            jobs,
            fingerprint_size,
        })
    }

    /// Print the config in a human-readable format
    pub fn print(&self, title: &str) {
        eprintln!("{}:", title);

        if let Some(extensions) = &self.extensions {
            eprintln!("  Extensions:         {}", extensions.join(", "));
        }
        if let Some(on_error) = &self.on_error {
            eprintln!("  On error:           {}", on_error);
        }
        if let Some(tie_break) = &self.tie_break {
            eprintln!("  Tie break:          {}", tie_break);
        }
        if let Some(jobs) = self.jobs {
            eprintln!("  Extraction jobs:    {}", jobs);
        }
        if let Some(fingerprint_size) = self.fingerprint_size {
            eprintln!("  Fingerprint size:   {} coefficients", fingerprint_size);
        }
    }
}

/// File discovery settings.
#[derive(Debug, Clone, PartialEq)]
pub struct CollectorConfig {
    /// Lowercase extensions without the leading dot.
    pub extensions: Vec<String>,
}

impl CollectorConfig {
    /// Normalise user-supplied extensions (`".MP3"` becomes `"mp3"`).
    pub fn from_extensions<S: AsRef<str>>(extensions: &[S]) -> Result<Self, ConfigError> {
        let mut normalised: Vec<String> = Vec::with_capacity(extensions.len());
        for ext in extensions {
            let ext = ext.as_ref().trim().trim_start_matches('.').to_lowercase();
            if ext.is_empty() {
                return Err(ConfigError::InvalidValue {
                    field: "extensions",
                    reason: "empty extension".to_string(),
                });
            }
            if !normalised.contains(&ext) {
                normalised.push(ext);
            }
        }

        if normalised.is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "extensions",
                reason: "at least one extension is required".to_string(),
            });
        }

        Ok(CollectorConfig {
            extensions: normalised,
        })
    }
}

impl Default for CollectorConfig {
    fn default() -> Self {
        CollectorConfig {
            extensions: DEFAULT_EXTENSIONS.iter().map(|e| e.to_string()).collect(),
        }
    }
}

/// What a run does when a file cannot be analysed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ErrorPolicy {
    /// Stop at the first failure.
    #[default]
    Abort,
    /// Log the failure, leave the file out and keep going.
    Skip,
}

impl ErrorPolicy {
    pub fn as_str(&self) -> &str {
        match self {
            ErrorPolicy::Abort => "abort",
            ErrorPolicy::Skip => "skip",
        }
    }
}

impl FromStr for ErrorPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "abort" => Ok(ErrorPolicy::Abort),
            "skip" => Ok(ErrorPolicy::Skip),
            _ => Err(format!("Unsupported error policy: {} (expected abort or skip)", s)),
        }
    }
}

/// Fully resolved settings for one playlist run.
#[derive(Debug, Clone, PartialEq)]
pub struct PlaylistOptions {
    pub collector: CollectorConfig,
    pub on_error: ErrorPolicy,
    pub tie_break: TieBreak,
    pub jobs: usize,
    pub fingerprint_size: usize,
}

impl Default for PlaylistOptions {
    fn default() -> Self {
        PlaylistOptions {
            collector: CollectorConfig::default(),
            on_error: ErrorPolicy::default(),
            tie_break: TieBreak::default(),
            jobs: 1,
            fingerprint_size: DEFAULT_FINGERPRINT_SIZE,
        }
    }
}
