use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use anyhow::{Result, Context};
use once_cell::sync::Lazy;
use regex::Regex;
use log::debug;

use crate::encoding::{self, DEFAULT_ENCODING_CANDIDATES};
use crate::errors::FerryError;

// @module: Directory-backed chunk lookup behind a typed interface
//
// Related files are grouped by naming convention (`<stem>_<NNN>.srt`). The
// convention is an implementation detail of the stores; callers speak in
// terms of base identifiers and chunk ids, and tests run against an
// in-memory store with the same contract.

// @const: Chunk file name shape, 3-digit zero-padded 0-based index
static CHUNK_FILE_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(.+)_(\d{3})\.srt$").unwrap()
});

/// Base identifier of a file name or stem: the portion before the first `_`
/// and before the first `.` (`name` from `name.lang_003.srt`). The join key
/// across directory roles.
pub fn base_identifier(name: &str) -> String {
    let without_chunk = name.split('_').next().unwrap_or(name);
    without_chunk.split('.').next().unwrap_or(without_chunk).to_string()
}

/// Identity of one chunk: the stem it was cut from plus its 0-based index
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct ChunkId {
    // @field: File stem before the `_NNN` suffix, language tag included
    pub stem: String,

    // @field: 0-based chunk index, contiguous per base
    pub index: u32,
}

impl ChunkId {
    pub fn new(stem: &str, index: u32) -> Self {
        ChunkId { stem: stem.to_string(), index }
    }

    /// File name this chunk persists under
    pub fn file_name(&self) -> String {
        format!("{}_{:03}.srt", self.stem, self.index)
    }

    /// Join key for this chunk
    pub fn base(&self) -> String {
        base_identifier(&self.stem)
    }

    /// Parse a chunk id back out of a file name, `None` when the name does
    /// not carry a chunk suffix
    pub fn from_file_name(name: &str) -> Option<Self> {
        let caps = CHUNK_FILE_REGEX.captures(name)?;
        let stem = caps.get(1)?.as_str().to_string();
        let index: u32 = caps.get(2)?.as_str().parse().ok()?;
        Some(ChunkId { stem, index })
    }
}

/// Typed lookup over one directory role holding chunk files
pub trait ChunkStore {
    /// All chunk ids for a base, sorted by index
    fn list(&self, base: &str) -> Result<Vec<ChunkId>>;

    /// Sorted unique base identifiers present in the store
    fn bases(&self) -> Result<Vec<String>>;

    fn read(&self, id: &ChunkId) -> Result<String>;

    fn write(&self, id: &ChunkId, content: &str) -> Result<()>;

    fn exists(&self, id: &ChunkId) -> bool;

    /// Remove every chunk belonging to a base, returning how many went away
    fn delete_matching(&self, base: &str) -> Result<usize>;
}

/// Chunk store over a filesystem directory
pub struct DirStore {
    dir: PathBuf,
    candidates: Vec<String>,
}

impl DirStore {
    pub fn new<P: AsRef<Path>>(dir: P) -> Self {
        Self::with_candidates(
            dir,
            DEFAULT_ENCODING_CANDIDATES.iter().map(|s| s.to_string()).collect(),
        )
    }

    pub fn with_candidates<P: AsRef<Path>>(dir: P, candidates: Vec<String>) -> Self {
        DirStore { dir: dir.as_ref().to_path_buf(), candidates }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_of(&self, id: &ChunkId) -> PathBuf {
        self.dir.join(id.file_name())
    }

    /// Every chunk id in the directory, unsorted
    fn scan(&self) -> Result<Vec<ChunkId>> {
        if !self.dir.is_dir() {
            return Err(FerryError::MissingInput(format!(
                "chunk directory does not exist: {}",
                self.dir.display()
            ))
            .into());
        }
        let mut ids = Vec::new();
        for entry in fs::read_dir(&self.dir)
            .with_context(|| format!("Failed to read directory: {}", self.dir.display()))?
        {
            let entry = entry?;
            if !entry.path().is_file() {
                continue;
            }
            let name = entry.file_name().to_string_lossy().to_string();
            if let Some(id) = ChunkId::from_file_name(&name) {
                ids.push(id);
            }
        }
        Ok(ids)
    }
}

impl ChunkStore for DirStore {
    fn list(&self, base: &str) -> Result<Vec<ChunkId>> {
        let mut ids: Vec<ChunkId> =
            self.scan()?.into_iter().filter(|id| id.base() == base).collect();
        ids.sort();
        Ok(ids)
    }

    fn bases(&self) -> Result<Vec<String>> {
        let mut bases: Vec<String> = self.scan()?.iter().map(|id| id.base()).collect();
        bases.sort();
        bases.dedup();
        Ok(bases)
    }

    fn read(&self, id: &ChunkId) -> Result<String> {
        let path = self.path_of(id);
        if !path.is_file() {
            return Err(FerryError::MissingInput(format!(
                "chunk file does not exist: {}",
                path.display()
            ))
            .into());
        }
        // Working chunks come back from an external tool and can arrive in
        // any encoding; sniff rather than assume UTF-8.
        let (text, enc) = encoding::read_text_preserve_encoding(&path, &self.candidates)?;
        debug!("Read {} as {}", path.display(), enc.name());
        Ok(text)
    }

    fn write(&self, id: &ChunkId, content: &str) -> Result<()> {
        let path = self.path_of(id);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }
        fs::write(&path, content)
            .with_context(|| format!("Failed to write chunk file: {}", path.display()))
    }

    fn exists(&self, id: &ChunkId) -> bool {
        self.path_of(id).is_file()
    }

    fn delete_matching(&self, base: &str) -> Result<usize> {
        let mut deleted = 0;
        for id in self.list(base)? {
            let path = self.path_of(&id);
            fs::remove_file(&path)
                .with_context(|| format!("Failed to delete: {}", path.display()))?;
            deleted += 1;
        }
        Ok(deleted)
    }
}

/// In-memory chunk store, the test double for `DirStore`
#[derive(Default)]
pub struct MemStore {
    files: RefCell<BTreeMap<String, String>>,
}

impl MemStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn file_names(&self) -> Vec<String> {
        self.files.borrow().keys().cloned().collect()
    }
}

impl ChunkStore for MemStore {
    fn list(&self, base: &str) -> Result<Vec<ChunkId>> {
        let mut ids: Vec<ChunkId> = self
            .files
            .borrow()
            .keys()
            .filter_map(|name| ChunkId::from_file_name(name))
            .filter(|id| id.base() == base)
            .collect();
        ids.sort();
        Ok(ids)
    }

    fn bases(&self) -> Result<Vec<String>> {
        let mut bases: Vec<String> = self
            .files
            .borrow()
            .keys()
            .filter_map(|name| ChunkId::from_file_name(name))
            .map(|id| id.base())
            .collect();
        bases.sort();
        bases.dedup();
        Ok(bases)
    }

    fn read(&self, id: &ChunkId) -> Result<String> {
        self.files
            .borrow()
            .get(&id.file_name())
            .cloned()
            .ok_or_else(|| {
                FerryError::MissingInput(format!("chunk does not exist: {}", id.file_name()))
                    .into()
            })
    }

    fn write(&self, id: &ChunkId, content: &str) -> Result<()> {
        self.files.borrow_mut().insert(id.file_name(), content.to_string());
        Ok(())
    }

    fn exists(&self, id: &ChunkId) -> bool {
        self.files.borrow().contains_key(&id.file_name())
    }

    fn delete_matching(&self, base: &str) -> Result<usize> {
        let doomed: Vec<String> =
            self.list(base)?.iter().map(|id| id.file_name()).collect();
        let mut files = self.files.borrow_mut();
        for name in &doomed {
            files.remove(name);
        }
        Ok(doomed.len())
    }
}
