use std::fs;
use std::path::{Path, PathBuf};
use anyhow::{Result, Context, anyhow};
use serde::{Deserialize, Serialize};

use crate::encoding::DEFAULT_ENCODING_CANDIDATES;
use crate::restorer::{AlignPolicy, DEFAULT_NOISE_TOKENS};
use crate::subtitle_block::ParsePolicy;

/// Application configuration module
/// This module holds the immutable settings struct passed into each pipeline
/// component. There is no process-wide default path resolved by host OS
/// detection; callers construct Settings explicitly, usually from one root
/// directory.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Settings {
    /// Directory holding full original SRT files
    pub origin_dir: PathBuf,

    /// Directory holding the held original chunk copies
    pub origin_chunks_dir: PathBuf,

    /// Directory holding the working chunk copies mutated by the external
    /// translation step
    pub working_chunks_dir: PathBuf,

    /// Directory receiving merged output files
    pub merged_dir: PathBuf,

    /// Maximum caption blocks per chunk
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,

    /// How raw text is cut into blocks
    #[serde(default)]
    pub parse_policy: ParsePolicy,

    /// How restoration reconciles headers
    #[serde(default)]
    pub align_policy: AlignPolicy,

    /// Tool-injected tokens stripped from working chunks before parsing
    #[serde(default = "default_noise_denylist")]
    pub noise_denylist: Vec<String>,

    /// Trial-decode order for files without a BOM
    #[serde(default = "default_encoding_candidates")]
    pub encoding_candidates: Vec<String>,

    /// Pattern file for the repeat compressor
    #[serde(default)]
    pub patterns_file: Option<PathBuf>,

    /// Run length that triggers repeat compression
    #[serde(default = "default_min_repeat")]
    pub min_repeat: usize,

    /// Occurrences kept when a run is compressed
    #[serde(default = "default_keep_repeat")]
    pub keep_repeat: usize,

    /// Join kept occurrences with a single space
    #[serde(default)]
    pub keep_space: bool,

    /// Maximum payload line length before post-processing re-wraps a block
    #[serde(default = "default_max_line_length")]
    pub max_line_length: usize,

    /// Minimum display duration in milliseconds enforced by post-processing
    #[serde(default = "default_min_duration_ms")]
    pub min_duration_ms: u64,

    /// Batch summaries are appended here when set
    #[serde(default)]
    pub summary_log: Option<PathBuf>,

    /// Log level
    #[serde(default)]
    pub log_level: LogLevel,
}

/// Log verbosity level
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

fn default_chunk_size() -> usize {
    800
}

fn default_min_repeat() -> usize {
    7
}

fn default_keep_repeat() -> usize {
    3
}

fn default_max_line_length() -> usize {
    40
}

fn default_min_duration_ms() -> u64 {
    1500
}

fn default_noise_denylist() -> Vec<String> {
    DEFAULT_NOISE_TOKENS.iter().map(|s| s.to_string()).collect()
}

fn default_encoding_candidates() -> Vec<String> {
    DEFAULT_ENCODING_CANDIDATES.iter().map(|s| s.to_string()).collect()
}

impl Settings {
    /// Derive the four directory roles and auxiliary paths from one explicit
    /// root directory
    pub fn with_root<P: AsRef<Path>>(root: P) -> Self {
        let root = root.as_ref();
        Settings {
            origin_dir: root.join("origin"),
            origin_chunks_dir: root.join("origin_chunks"),
            working_chunks_dir: root.join("working_chunks"),
            merged_dir: root.join("merged"),
            chunk_size: default_chunk_size(),
            parse_policy: ParsePolicy::default(),
            align_policy: AlignPolicy::default(),
            noise_denylist: default_noise_denylist(),
            encoding_candidates: default_encoding_candidates(),
            patterns_file: Some(root.join("patterns.txt")),
            min_repeat: default_min_repeat(),
            keep_repeat: default_keep_repeat(),
            keep_space: false,
            max_line_length: default_max_line_length(),
            min_duration_ms: default_min_duration_ms(),
            summary_log: Some(root.join("subferry.log")),
            log_level: LogLevel::default(),
        }
    }

    /// Load settings from a JSON file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read settings file: {}", path.display()))?;
        let settings: Settings = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse settings file: {}", path.display()))?;
        settings.validate()?;
        Ok(settings)
    }

    /// Save settings to a JSON file
    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content)
            .with_context(|| format!("Failed to write settings file: {}", path.display()))
    }

    /// Validate the settings for consistency and required values
    pub fn validate(&self) -> Result<()> {
        if self.chunk_size == 0 {
            return Err(anyhow!("chunk_size must be at least 1"));
        }
        if self.min_repeat < 2 {
            return Err(anyhow!("min_repeat must be at least 2, got {}", self.min_repeat));
        }
        if self.keep_repeat < 1 {
            return Err(anyhow!("keep_repeat must be at least 1, got {}", self.keep_repeat));
        }
        if self.encoding_candidates.is_empty() {
            return Err(anyhow!("encoding_candidates must not be empty"));
        }
        if self.max_line_length == 0 {
            return Err(anyhow!("max_line_length must be at least 1"));
        }

        // The four roots are independent; nesting one inside another breaks
        // the directory-role contract.
        let roots = [
            &self.origin_dir,
            &self.origin_chunks_dir,
            &self.working_chunks_dir,
            &self.merged_dir,
        ];
        for (i, a) in roots.iter().enumerate() {
            for (j, b) in roots.iter().enumerate() {
                if i != j && (a == b || a.starts_with(b)) {
                    return Err(anyhow!(
                        "directory roles must be independent: {} is inside {}",
                        a.display(),
                        b.display()
                    ));
                }
            }
        }

        Ok(())
    }
}

impl Default for Settings {
    fn default() -> Self {
        Settings::with_root("srt_home")
    }
}
