/*!
 * Restoration of externally mutated chunks.
 *
 * A working chunk comes back from the outside translation step carrying two
 * kinds of damage: injected tool noise (role markers, format hints,
 * boilerplate prefixes) and drifted header fields. Restoration strips the
 * noise from the raw text first, then reconciles every header against the
 * held original chunk so only the payload text survives the round trip
 * changed.
 */

use anyhow::Result;
use log::{info, warn};
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::app_config::Settings;
use crate::chunk_store::{ChunkId, ChunkStore};
use crate::subtitle_block::{CaptionBlock, CaptionSequence};

/// Tool-injected tokens removed from working text before structural parsing.
/// Observed output damage from the translation tools in use; extend via
/// Settings when a new tool brings new noise.
pub const DEFAULT_NOISE_TOKENS: &[&str] = &[
    "```markdown",
    "```srt",
    "```plain",
    "```text",
    "```",
    "assistant:",
    "here is the translation:",
    "다음 내용을 참조하세요:",
];

/// How headers are reconciled against the original chunk
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AlignPolicy {
    /// Replace ordinal and timestamp unconditionally by position (default)
    #[default]
    Overwrite,
    /// Compare headers first and overwrite only on mismatch, logging each
    /// correction. Output is identical to `Overwrite`; only the log differs.
    CorrectOnMismatch,
}

/// Case-insensitive literal noise removal, rules compiled once and applied
/// in list order
pub struct NoiseStripper {
    rules: Vec<Regex>,
}

impl NoiseStripper {
    pub fn new(tokens: &[String]) -> Result<Self> {
        let mut rules = Vec::with_capacity(tokens.len());
        for token in tokens {
            let rule = Regex::new(&format!("(?i){}", regex::escape(token)))?;
            rules.push(rule);
        }
        Ok(NoiseStripper { rules })
    }

    /// Remove every occurrence of every denylisted token
    pub fn strip(&self, text: &str) -> String {
        let mut out = text.to_string();
        for rule in &self.rules {
            out = rule.replace_all(&out, "").into_owned();
        }
        out
    }
}

/// Reconcile a cleaned working sequence against its original.
///
/// The emitted block at position `i` always carries the original's ordinal
/// and timestamps with the working text at `i`, or empty text when the
/// working sequence is shorter. Working positions beyond the original's
/// length are dropped.
pub fn align(
    original: &CaptionSequence,
    working: &CaptionSequence,
    policy: AlignPolicy,
) -> CaptionSequence {
    let mut blocks = Vec::with_capacity(original.len());

    for (i, origin_block) in original.blocks.iter().enumerate() {
        let working_block = working.blocks.get(i);

        if policy == AlignPolicy::CorrectOnMismatch {
            if let Some(wb) = working_block {
                if wb.ordinal != origin_block.ordinal {
                    warn!(
                        "Block {}: correcting ordinal {} -> {}",
                        i, wb.ordinal, origin_block.ordinal
                    );
                }
                if wb.timecode() != origin_block.timecode() {
                    warn!(
                        "Block {}: correcting timecode '{}' -> '{}'",
                        i,
                        wb.timecode(),
                        origin_block.timecode()
                    );
                }
            }
        }

        let text = working_block.map(|b| b.text.clone()).unwrap_or_default();
        blocks.push(CaptionBlock::new(
            origin_block.ordinal,
            origin_block.start_ms,
            origin_block.end_ms,
            text,
        ));
    }

    let dropped = working.len().saturating_sub(original.len());
    if dropped > 0 {
        warn!("Dropping {} working blocks beyond the original's length", dropped);
    }

    CaptionSequence::new(blocks)
}

/// Restore one working chunk in place.
///
/// Both the working chunk and its original counterpart must exist; a missing
/// original is a hard stop for this unit, reported to the caller and never
/// retried here.
pub fn restore_chunk(
    id: &ChunkId,
    origin_chunks: &dyn ChunkStore,
    working_chunks: &dyn ChunkStore,
    settings: &Settings,
) -> Result<()> {
    let working_text = working_chunks.read(id)?;
    let origin_text = origin_chunks.read(id)?;

    let stripper = NoiseStripper::new(&settings.noise_denylist)?;
    let cleaned = stripper.strip(&working_text);

    let original = CaptionSequence::parse(&origin_text, settings.parse_policy);
    let working = CaptionSequence::parse(&cleaned, settings.parse_policy);

    let restored = align(&original, &working, settings.align_policy);
    working_chunks.write(id, &restored.render())?;

    info!(
        "Restored {}: original blocks {}, working blocks {}, emitted {}",
        id.file_name(),
        original.len(),
        working.len(),
        restored.len()
    );
    Ok(())
}
