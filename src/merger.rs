use std::fs;
use std::path::{Path, PathBuf};
use anyhow::{Result, Context};
use log::info;

use crate::chunk_store::{ChunkId, ChunkStore};
use crate::errors::FerryError;

// @module: Recombining restored chunks into one sequence
//
// Merging is the point where a half-finished unit would silently corrupt a
// result, so every precondition is a hard failure: at least one chunk, equal
// chunk counts on both sides, and indices contiguous from 0 with no gaps,
// verified pairwise rather than by count alone.

/// Verify that paired chunk listings agree and are contiguous `0..N-1`.
/// Returns the shared stem on success.
fn verify_pairing(base: &str, origin: &[ChunkId], working: &[ChunkId]) -> Result<String> {
    if origin.is_empty() {
        return Err(
            FerryError::MissingInput(format!("no origin chunks found for base '{}'", base)).into(),
        );
    }
    if origin.len() != working.len() {
        return Err(FerryError::CountMismatch(format!(
            "chunk count differs for base '{}': origin {}, working {}",
            base,
            origin.len(),
            working.len()
        ))
        .into());
    }

    let stem = origin[0].stem.clone();
    for (i, (o, w)) in origin.iter().zip(working.iter()).enumerate() {
        let expected = ChunkId::new(&stem, i as u32);
        if o != &expected || w != &expected {
            return Err(FerryError::CountMismatch(format!(
                "chunk index mismatch for base '{}': expected {}, origin {}, working {}",
                base,
                expected.file_name(),
                o.file_name(),
                w.file_name()
            ))
            .into());
        }
    }
    Ok(stem)
}

/// Merge all restored chunks of a base into one file under `merged_dir`.
///
/// Chunk text is concatenated in index order, each chunk right-trimmed,
/// joined by one blank line and terminated with exactly one trailing blank
/// line. Ordinals already carry their original values from the restoration
/// stage; nothing is renumbered here. Returns the path written.
pub fn merge_base(
    base: &str,
    origin_chunks: &dyn ChunkStore,
    working_chunks: &dyn ChunkStore,
    merged_dir: &Path,
) -> Result<PathBuf> {
    let origin_ids = origin_chunks.list(base)?;
    let working_ids = working_chunks.list(base)?;

    let stem = verify_pairing(base, &origin_ids, &working_ids)?;

    let mut parts = Vec::with_capacity(working_ids.len());
    for id in &working_ids {
        let content = working_chunks.read(id)?;
        parts.push(content.trim_end().to_string());
    }
    let merged = format!("{}\n\n", parts.join("\n\n").trim_end());

    let output_path = merged_dir.join(format!("{}.srt", stem));
    if let Some(parent) = output_path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }
    fs::write(&output_path, merged)
        .with_context(|| format!("Failed to write merged file: {}", output_path.display()))?;

    info!(
        "Merged {} chunks for base '{}' into {}",
        working_ids.len(),
        base,
        output_path.display()
    );
    Ok(output_path)
}
