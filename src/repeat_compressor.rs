/*!
 * Repeat-pattern compressor.
 *
 * Speech-to-text output degenerates into long runs of the same token
 * ("네 네 네 네 ..."); a run of at least `min_repeat` occurrences of a
 * literal pattern collapses to exactly `keep_repeat` occurrences. Runs may
 * span horizontal whitespace but never line breaks, and the whitespace that
 * bordered the run is preserved. Patterns chain in caller order, each
 * operating on the already-compressed result of the previous one.
 */

use std::path::Path;
use anyhow::{Result, anyhow};
use log::debug;
use regex::Regex;

use crate::encoding;

/// One compiled rule: a matcher for a run of the literal plus its
/// replacement text
struct Rule {
    pattern: String,
    matcher: Regex,
    replacement: String,
}

/// Pattern-driven run compressor; rules compile once at construction and
/// stay in caller order since patterns chain
pub struct RepeatCompressor {
    rules: Vec<Rule>,
}

impl RepeatCompressor {
    /// Build a compressor. `min_repeat` must be at least 2 and `keep_repeat`
    /// at least 1.
    pub fn new(
        patterns: &[String],
        min_repeat: usize,
        keep_repeat: usize,
        keep_space: bool,
    ) -> Result<Self> {
        if min_repeat < 2 {
            return Err(anyhow!("min_repeat must be at least 2, got {}", min_repeat));
        }
        if keep_repeat < 1 {
            return Err(anyhow!("keep_repeat must be at least 1, got {}", keep_repeat));
        }

        let joiner = if keep_space { " " } else { "" };
        let mut rules = Vec::with_capacity(patterns.len());
        for pattern in patterns {
            let escaped = regex::escape(pattern);
            // A run: the literal, then at least min_repeat-1 further
            // occurrences separated by horizontal whitespace only. The
            // bordering whitespace is captured and carried through.
            let matcher = Regex::new(&format!(
                r"(?P<pre>\s*)(?:{esc})(?:[^\S\r\n]*{esc}){{{min},}}(?P<post>\s*)",
                esc = escaped,
                min = min_repeat - 1,
            ))?;
            let replacement = vec![pattern.as_str(); keep_repeat].join(joiner);
            rules.push(Rule { pattern: pattern.clone(), matcher, replacement });
        }

        Ok(RepeatCompressor { rules })
    }

    /// Apply every rule in order over the whole text
    pub fn compress(&self, text: &str) -> String {
        let mut out = text.to_string();
        for rule in &self.rules {
            let compressed = rule
                .matcher
                .replace_all(&out, |caps: &regex::Captures| {
                    format!("{}{}{}", &caps["pre"], rule.replacement, &caps["post"])
                })
                .into_owned();
            if compressed != out {
                debug!("Pattern '{}' compressed at least one run", rule.pattern);
            }
            out = compressed;
        }
        out
    }

    /// Compress one file in place, preserving its byte encoding. Returns
    /// whether the file changed and the encoding it was detected as; with
    /// `dry_run` the file is left untouched.
    pub fn process_file(
        &self,
        path: &Path,
        candidates: &[String],
        dry_run: bool,
    ) -> Result<(bool, &'static str)> {
        let (original, detected) = encoding::read_text_preserve_encoding(path, candidates)?;
        let modified = self.compress(&original);
        if modified != original {
            if !dry_run {
                encoding::write_text_with_encoding(path, &modified, detected)?;
            }
            return Ok((true, detected.name()));
        }
        Ok((false, detected.name()))
    }
}

/// Load literal patterns from a file: one per line, blank lines and lines
/// starting with `#` ignored. The file itself goes through the encoding
/// cascade so legacy-encoded pattern lists work.
pub fn load_patterns(path: &Path, candidates: &[String]) -> Result<Vec<String>> {
    let (raw, _) = encoding::read_text_preserve_encoding(path, candidates)?;
    let patterns = raw
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_string)
        .collect();
    Ok(patterns)
}
