/*!
 * Common test utilities for the subferry test suite
 */

use std::fs;
use std::path::{Path, PathBuf};
use anyhow::Result;
use tempfile::TempDir;

use subferry::app_config::Settings;
use subferry::subtitle_block::{CaptionBlock, CaptionSequence};

/// Installs the env_logger backend so crate logs surface in test output
/// under RUST_LOG; repeated calls are a no-op
pub fn init_test_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Creates a temporary directory for test files
pub fn create_temp_dir() -> Result<TempDir> {
    init_test_logging();
    Ok(TempDir::new()?)
}

/// Creates a test file with the given content in the specified directory
pub fn create_test_file(dir: &Path, filename: &str, content: &str) -> Result<PathBuf> {
    let file_path = dir.join(filename);
    fs::write(&file_path, content)?;
    Ok(file_path)
}

/// One deterministic caption block: 2 seconds apart, 1.5 seconds long
pub fn make_block(ordinal: u64) -> CaptionBlock {
    let start = ordinal * 2000;
    CaptionBlock::new(ordinal, start, start + 1500, format!("Caption line {}", ordinal))
}

/// A sequence of `count` deterministic blocks with ordinals 1..=count
pub fn make_sequence(count: u64) -> CaptionSequence {
    CaptionSequence::new((1..=count).map(make_block).collect())
}

/// Settings rooted in a temp directory with all four directory roles created
pub fn settings_for(root: &Path) -> Result<Settings> {
    let settings = Settings::with_root(root);
    for dir in [
        &settings.origin_dir,
        &settings.origin_chunks_dir,
        &settings.working_chunks_dir,
        &settings.merged_dir,
    ] {
        fs::create_dir_all(dir)?;
    }
    Ok(settings)
}

/// A small well-formed SRT fixture with three blocks
pub fn sample_srt() -> &'static str {
    "1\n00:00:01,000 --> 00:00:04,000\nThis is a test subtitle.\n\n\
     2\n00:00:05,000 --> 00:00:09,000\nIt contains multiple entries.\n\n\
     3\n00:00:10,000 --> 00:00:14,000\nFor testing purposes.\n\n"
}
