use anyhow::{Result, Context};
use std::fs;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;
use chrono::Local;

use crate::chunk_store::{ChunkId, base_identifier};

// @module: File and directory utilities

// @struct: File operations utility
pub struct FileManager;

impl FileManager {
    // @checks: File existence
    pub fn file_exists<P: AsRef<Path>>(path: P) -> bool {
        path.as_ref().exists() && path.as_ref().is_file()
    }

    // @checks: Directory existence
    pub fn dir_exists<P: AsRef<Path>>(path: P) -> bool {
        path.as_ref().exists() && path.as_ref().is_dir()
    }

    // @creates: Directory and parents if needed
    pub fn ensure_dir<P: AsRef<Path>>(path: P) -> Result<()> {
        let path = path.as_ref();
        if !path.exists() {
            fs::create_dir_all(path)?;
        }
        Ok(())
    }

    /// SRT files directly inside a directory, sorted by name
    pub fn srt_files_in<P: AsRef<Path>>(dir: P) -> Result<Vec<PathBuf>> {
        let dir = dir.as_ref();
        let mut result = Vec::new();
        for entry in fs::read_dir(dir)
            .with_context(|| format!("Failed to read directory: {}", dir.display()))?
        {
            let path = entry?.path();
            if path.is_file() && Self::has_srt_extension(&path) {
                result.push(path);
            }
        }
        result.sort();
        Ok(result)
    }

    /// SRT files anywhere under a directory, trash directories skipped,
    /// sorted by path
    pub fn srt_files_recursive<P: AsRef<Path>>(dir: P) -> Result<Vec<PathBuf>> {
        let mut result = Vec::new();
        let walker = WalkDir::new(dir.as_ref())
            .follow_links(true)
            .into_iter()
            .filter_entry(|e| !Self::is_trash_path(e.path()));
        for entry in walker {
            let entry = entry.context("Failed to read directory entry")?;
            let path = entry.path();
            if path.is_file() && Self::has_srt_extension(path) {
                result.push(path.to_path_buf());
            }
        }
        result.sort();
        Ok(result)
    }

    /// Full (unchunked) SRT files in a directory whose base identifier
    /// matches, sorted by name
    pub fn find_full_srt_by_base<P: AsRef<Path>>(dir: P, base: &str) -> Result<Vec<PathBuf>> {
        let mut result = Vec::new();
        for path in Self::srt_files_in(dir)? {
            let name = match path.file_name() {
                Some(name) => name.to_string_lossy().to_string(),
                None => continue,
            };
            // Chunk files live in their own directory roles, but a stray one
            // must not be mistaken for a full file.
            if ChunkId::from_file_name(&name).is_some() {
                continue;
            }
            if base_identifier(&name) == base {
                result.push(path);
            }
        }
        Ok(result)
    }

    /// Move a file, falling back to copy+delete across filesystems
    pub fn move_file<P1: AsRef<Path>, P2: AsRef<Path>>(from: P1, to: P2) -> Result<()> {
        let from = from.as_ref();
        let to = to.as_ref();

        if !from.exists() {
            return Err(anyhow::anyhow!("Source file does not exist: {}", from.display()));
        }
        if let Some(parent) = to.parent() {
            Self::ensure_dir(parent)?;
        }

        if fs::rename(from, to).is_err() {
            fs::copy(from, to)
                .with_context(|| format!("Failed to copy {} to {}", from.display(), to.display()))?;
            fs::remove_file(from)
                .with_context(|| format!("Failed to remove {}", from.display()))?;
        }
        Ok(())
    }

    /// Append content to a log file with timestamp
    pub fn append_to_log_file<P: AsRef<Path>>(path: P, content: &str) -> Result<()> {
        let timestamp = Local::now().format("%Y-%m-%d %H:%M:%S").to_string();

        if let Some(parent) = path.as_ref().parent() {
            Self::ensure_dir(parent)?;
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .with_context(|| format!("Failed to open log file: {:?}", path.as_ref()))?;

        writeln!(file, "[{}] {}", timestamp, content)
            .with_context(|| format!("Failed to write to log file: {:?}", path.as_ref()))?;

        Ok(())
    }

    /// Whether a path points into a recycle bin or trash directory
    pub fn is_trash_path(path: &Path) -> bool {
        let lower = path.to_string_lossy().to_lowercase();
        lower.contains("recycle") || lower.contains("trash")
    }

    /// First media file under `target_dir` whose name starts with the base
    /// identifier, trash directories skipped
    pub fn find_media_for_base<P: AsRef<Path>>(target_dir: P, base: &str) -> Option<PathBuf> {
        let walker = WalkDir::new(target_dir.as_ref())
            .follow_links(true)
            .into_iter()
            .filter_entry(|e| !Self::is_trash_path(e.path()));
        for entry in walker.flatten() {
            let path = entry.path();
            if !path.is_file() {
                continue;
            }
            let name = path.file_name()?.to_string_lossy().to_string();
            let is_media = path
                .extension()
                .map(|e| e.to_string_lossy().eq_ignore_ascii_case("mp4"))
                .unwrap_or(false);
            if is_media && name.starts_with(base) {
                return Some(path.to_path_buf());
            }
        }
        None
    }

    fn has_srt_extension(path: &Path) -> bool {
        path.extension()
            .map(|e| e.to_string_lossy().eq_ignore_ascii_case("srt"))
            .unwrap_or(false)
    }
}
