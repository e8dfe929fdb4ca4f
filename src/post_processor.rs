/*!
 * Post-processing for finished subtitle files.
 *
 * Speech-to-text output tends to arrive without sentence-final punctuation,
 * with over-long single lines and with blink-and-miss display durations.
 * Post-processing normalizes all three per block: append a final period when
 * the payload does not already end in sentence punctuation, re-wrap the
 * payload at a maximum line length, and extend any display duration below
 * the configured minimum. Header-only blocks pass through untouched.
 */

use std::fs;
use std::path::{Path, PathBuf};
use anyhow::{Result, Context};
use log::{info, warn};

use crate::app_config::Settings;
use crate::encoding;
use crate::errors::FerryError;
use crate::subtitle_block::{CaptionBlock, CaptionSequence};

/// Sentence-final punctuation that suppresses the appended period, ASCII and
/// full-width forms both
const FINAL_PUNCTUATION: &[char] = &['.', '?', '!', '。', '？', '！'];

/// Append a period unless the text already ends in sentence punctuation
/// (trailing whitespace ignored)
pub fn append_final_punctuation(text: &str) -> String {
    let trimmed = text.trim_end();
    if trimmed.ends_with(FINAL_PUNCTUATION) {
        text.to_string()
    } else {
        format!("{}.", trimmed)
    }
}

/// Greedy word wrap at `max_length` characters per line, counted in
/// characters rather than bytes so CJK payloads wrap correctly. Existing
/// line breaks count as word separators, so a block comes out uniformly
/// wrapped. A single word longer than the limit keeps its own line.
pub fn wrap_long_lines(text: &str, max_length: usize) -> String {
    let mut lines: Vec<String> = Vec::new();
    let mut current = String::new();
    let mut current_len = 0usize;

    for word in text.split_whitespace() {
        let word_len = word.chars().count();
        if !current.is_empty() && current_len + 1 + word_len > max_length {
            lines.push(std::mem::take(&mut current));
            current_len = 0;
        }
        if !current.is_empty() {
            current.push(' ');
            current_len += 1;
        }
        current.push_str(word);
        current_len += word_len;
    }
    if !current.is_empty() {
        lines.push(current);
    }

    lines.join("\n")
}

/// Post-process one block: punctuation, wrapping, minimum duration. A block
/// with an empty payload is carried through unchanged, duration included.
pub fn post_process_block(block: &CaptionBlock, settings: &Settings) -> CaptionBlock {
    if block.text.trim().is_empty() {
        return block.clone();
    }

    let text = append_final_punctuation(&block.text);
    let text = wrap_long_lines(&text, settings.max_line_length);

    let duration = block.end_ms.saturating_sub(block.start_ms);
    let end_ms = if duration < settings.min_duration_ms {
        block.start_ms + settings.min_duration_ms
    } else {
        block.end_ms
    };

    CaptionBlock::new(block.ordinal, block.start_ms, end_ms, text)
}

/// Post-process a whole sequence. Returns the new sequence and how many
/// blocks came out different.
pub fn post_process_sequence(
    sequence: &CaptionSequence,
    settings: &Settings,
) -> (CaptionSequence, usize) {
    let mut changed = 0;
    let blocks = sequence
        .blocks
        .iter()
        .map(|block| {
            let processed = post_process_block(block, settings);
            if &processed != block {
                changed += 1;
            }
            processed
        })
        .collect();
    (CaptionSequence::new(blocks), changed)
}

/// Post-process one file. The result lands in `output_dir` under the same
/// file name, or in place when no output directory is given, re-encoded with
/// the file's detected encoding. Returns the number of blocks processed;
/// zero means the file had no caption blocks and nothing was written.
pub fn post_process_file(
    path: &Path,
    output_dir: Option<&Path>,
    settings: &Settings,
) -> Result<usize> {
    if !path.is_file() {
        return Err(
            FerryError::MissingInput(format!("input file does not exist: {}", path.display()))
                .into(),
        );
    }

    let (content, detected) =
        encoding::read_text_preserve_encoding(path, &settings.encoding_candidates)?;
    let sequence = CaptionSequence::parse(&content, settings.parse_policy);
    if sequence.is_empty() {
        warn!("No caption blocks found in {}", path.display());
        return Ok(0);
    }

    let (processed, changed) = post_process_sequence(&sequence, settings);

    let output_path: PathBuf = match output_dir {
        Some(dir) => {
            fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create directory: {}", dir.display()))?;
            dir.join(path.file_name().unwrap_or_default())
        }
        None => path.to_path_buf(),
    };
    encoding::write_text_with_encoding(&output_path, &processed.render(), detected)?;

    info!(
        "Post-processed {}: {} of {} blocks changed",
        output_path.display(),
        changed,
        processed.len()
    );
    Ok(processed.len())
}
