/*!
 * Structural acceptance gate for a finished sequence.
 *
 * The comparator decides whether a merged, restored sequence may replace the
 * original: block counts must agree, every ordinal and timecode must match
 * exactly, and no payload may be empty. Text content is deliberately
 * excluded from equality because translated text differs by design.
 */

use std::fmt;
use std::path::Path;
use anyhow::Result;
use log::{info, warn};

use crate::app_config::Settings;
use crate::encoding;
use crate::errors::FerryError;
use crate::file_utils::FileManager;
use crate::subtitle_block::CaptionSequence;

/// One structural disagreement between original and candidate
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Defect {
    /// Block counts differ; per-block checks were skipped
    CountMismatch { original: usize, candidate: usize },
    /// Ordinals differ at a position
    OrdinalMismatch { index: usize, original: u64, candidate: u64 },
    /// Timecode lines differ at a position
    TimecodeMismatch { index: usize, original: String, candidate: String },
    /// Candidate block has an entirely empty payload
    EmptyPayload { index: usize, ordinal: u64 },
}

impl fmt::Display for Defect {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::CountMismatch { original, candidate } => write!(
                f,
                "block count mismatch: original {}, candidate {}",
                original, candidate
            ),
            Self::OrdinalMismatch { index, original, candidate } => write!(
                f,
                "block {}: ordinal mismatch - original '{}', candidate '{}'",
                index + 1,
                original,
                candidate
            ),
            Self::TimecodeMismatch { index, original, candidate } => write!(
                f,
                "block {}: timecode mismatch - original '{}', candidate '{}'",
                index + 1,
                original,
                candidate
            ),
            Self::EmptyPayload { index, ordinal } => write!(
                f,
                "block {}: empty payload (ordinal {}, header only)",
                index + 1,
                ordinal
            ),
        }
    }
}

/// Outcome of a comparison: PASS, or FAIL with every defect found
#[derive(Debug, Clone, Default)]
pub struct Verdict {
    pub defects: Vec<Defect>,
}

impl Verdict {
    pub fn passed(&self) -> bool {
        self.defects.is_empty()
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if self.passed() {
            write!(f, "PASS: all blocks match, no empty payload")
        } else {
            writeln!(f, "FAIL: {} defect(s)", self.defects.len())?;
            for defect in &self.defects {
                writeln!(f, "  - {}", defect)?;
            }
            Ok(())
        }
    }
}

/// Compare a candidate sequence against its pre-transformation original.
///
/// A count mismatch short-circuits as a single defect; ordinal, timecode and
/// empty-payload violations are accumulated so a caller sees every defect in
/// one pass.
pub fn compare_sequences(original: &CaptionSequence, candidate: &CaptionSequence) -> Verdict {
    let mut verdict = Verdict::default();

    if original.len() != candidate.len() {
        verdict.defects.push(Defect::CountMismatch {
            original: original.len(),
            candidate: candidate.len(),
        });
        return verdict;
    }

    for (i, (ob, cb)) in original.blocks.iter().zip(candidate.blocks.iter()).enumerate() {
        if ob.ordinal != cb.ordinal {
            verdict.defects.push(Defect::OrdinalMismatch {
                index: i,
                original: ob.ordinal,
                candidate: cb.ordinal,
            });
        }
        if ob.timecode() != cb.timecode() {
            verdict.defects.push(Defect::TimecodeMismatch {
                index: i,
                original: ob.timecode(),
                candidate: cb.timecode(),
            });
        }
        if cb.text.trim().is_empty() {
            verdict.defects.push(Defect::EmptyPayload { index: i, ordinal: cb.ordinal });
        }
    }

    verdict
}

/// Locate the full original and merged candidate for a base and compare
/// them. Multiple matches in either directory get a warning and the first
/// sorted match, like the rest of the pipeline's prefix lookups.
pub fn compare_base(
    base: &str,
    origin_dir: &Path,
    merged_dir: &Path,
    settings: &Settings,
) -> Result<Verdict> {
    let origin_file = locate_one(base, origin_dir, "original")?;
    let candidate_file = locate_one(base, merged_dir, "merged")?;

    let (origin_text, _) =
        encoding::read_text_preserve_encoding(&origin_file, &settings.encoding_candidates)?;
    let (candidate_text, _) =
        encoding::read_text_preserve_encoding(&candidate_file, &settings.encoding_candidates)?;

    let original = CaptionSequence::parse(&origin_text, settings.parse_policy);
    let candidate = CaptionSequence::parse(&candidate_text, settings.parse_policy);

    let verdict = compare_sequences(&original, &candidate);
    info!("Compared base '{}': {}", base, if verdict.passed() { "PASS" } else { "FAIL" });
    Ok(verdict)
}

fn locate_one(base: &str, dir: &Path, role: &str) -> Result<std::path::PathBuf> {
    let matches = FileManager::find_full_srt_by_base(dir, base)?;
    match matches.first() {
        Some(first) => {
            if matches.len() > 1 {
                warn!(
                    "{} matching {} files for base '{}', using {}",
                    matches.len(),
                    role,
                    base,
                    first.display()
                );
            }
            Ok(first.clone())
        }
        None => Err(FerryError::MissingInput(format!(
            "no {} file for base '{}' in {}",
            role,
            base,
            dir.display()
        ))
        .into()),
    }
}
