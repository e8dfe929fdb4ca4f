use std::path::Path;
use anyhow::Result;
use log::{info, warn};

use crate::app_config::Settings;
use crate::chunk_store::{ChunkId, ChunkStore};
use crate::encoding;
use crate::errors::FerryError;
use crate::subtitle_block::CaptionSequence;

// @module: Splitting one caption sequence into bounded chunk files

/// Split a sequence into consecutive, non-overlapping windows of at most
/// `chunk_size` blocks. Ordinals and timestamps are carried unchanged; no
/// renumbering happens at any point of the pipeline.
pub fn split_sequence(sequence: &CaptionSequence, chunk_size: usize) -> Vec<CaptionSequence> {
    // A zero chunk size would loop forever; clamp rather than error.
    let chunk_size = chunk_size.max(1);

    sequence
        .blocks
        .chunks(chunk_size)
        .map(|window| CaptionSequence::new(window.to_vec()))
        .collect()
}

/// Chunk one full SRT file into both chunk stores: a held original copy and
/// a working copy handed to the external transformation.
///
/// Returns the number of chunks written. An input without any parseable
/// block yields zero chunks, reported but not fatal.
pub fn split_file(
    path: &Path,
    origin_chunks: &dyn ChunkStore,
    working_chunks: &dyn ChunkStore,
    settings: &Settings,
) -> Result<usize> {
    if !path.is_file() {
        return Err(
            FerryError::MissingInput(format!("input file does not exist: {}", path.display()))
                .into(),
        );
    }

    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default();

    let (content, _) =
        encoding::read_text_preserve_encoding(path, &settings.encoding_candidates)?;
    let sequence = CaptionSequence::parse(&content, settings.parse_policy);

    let total_blocks = sequence.len();
    info!("Chunking {}: {} caption blocks", path.display(), total_blocks);

    if total_blocks == 0 {
        warn!("No caption blocks found in {}", path.display());
        return Ok(0);
    }

    let chunks = split_sequence(&sequence, settings.chunk_size);
    for (index, chunk) in chunks.iter().enumerate() {
        let id = ChunkId::new(&stem, index as u32);
        let rendered = chunk.render();
        origin_chunks.write(&id, &rendered)?;
        working_chunks.write(&id, &rendered)?;
        info!(
            "Wrote chunk {}: {} blocks, ordinals {} to {}",
            id.file_name(),
            chunk.len(),
            chunk.blocks.first().map(|b| b.ordinal).unwrap_or(0),
            chunk.blocks.last().map(|b| b.ordinal).unwrap_or(0)
        );
    }

    Ok(chunks.len())
}
