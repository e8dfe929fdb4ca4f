use std::fmt;
use anyhow::{Result, Context, anyhow};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use log::debug;

// @module: Canonical caption block model, parser and serializer

// @const: SRT timestamp-range line, anchored
static TIMECODE_LINE_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(\d{2}):(\d{2}):(\d{2}),(\d{3}) --> (\d{2}):(\d{2}):(\d{2}),(\d{3})$").unwrap()
});

// @const: A line consisting solely of digits opens a new block
static ORDINAL_LINE_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d+$").unwrap());

/// How raw text is cut into blocks. Two strategies were in circulation
/// upstream; the choice is explicit rather than hard-coded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ParsePolicy {
    /// A standalone digit line opens a new block (default). Blank lines are
    /// kept inside the accumulating block and trimmed away later, which makes
    /// this policy robust against noise a translation tool injects between
    /// blocks.
    #[default]
    DigitLine,
    /// A blank line terminates the current block.
    BlankLine,
}

// @struct: Single caption block
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptionBlock {
    // @field: Ordinal as it appeared in the file, never renumbered
    pub ordinal: u64,

    // @field: Start time in ms
    pub start_ms: u64,

    // @field: End time in ms
    pub end_ms: u64,

    // @field: Payload text, lines joined with '\n'; may be empty
    pub text: String,
}

impl CaptionBlock {
    pub fn new(ordinal: u64, start_ms: u64, end_ms: u64, text: String) -> Self {
        CaptionBlock { ordinal, start_ms, end_ms, text }
    }

    /// Parse a single `HH:MM:SS,mmm` timestamp to milliseconds
    pub fn parse_timestamp(timestamp: &str) -> Result<u64> {
        let parts: Vec<&str> = timestamp.split(&[':', ','][..]).collect();
        if parts.len() != 4 {
            return Err(anyhow!("Invalid timestamp format: {}", timestamp));
        }

        let hours: u64 = parts[0].trim().parse().context("Failed to parse hours")?;
        let minutes: u64 = parts[1].trim().parse().context("Failed to parse minutes")?;
        let seconds: u64 = parts[2].trim().parse().context("Failed to parse seconds")?;
        let millis: u64 = parts[3].trim().parse().context("Failed to parse milliseconds")?;

        if minutes >= 60 || seconds >= 60 || millis >= 1000 {
            return Err(anyhow!("Invalid time components in timestamp: {}", timestamp));
        }

        Ok(hours * 3_600_000 + minutes * 60_000 + seconds * 1_000 + millis)
    }

    /// Format a timestamp in milliseconds to SRT format (HH:MM:SS,mmm)
    pub fn format_timestamp(ms: u64) -> String {
        let hours = ms / 3_600_000;
        let minutes = (ms % 3_600_000) / 60_000;
        let seconds = (ms % 60_000) / 1_000;
        let millis = ms % 1_000;

        format!("{:02}:{:02}:{:02},{:03}", hours, minutes, seconds, millis)
    }

    /// The full `start --> end` timecode line
    pub fn timecode(&self) -> String {
        format!(
            "{} --> {}",
            Self::format_timestamp(self.start_ms),
            Self::format_timestamp(self.end_ms)
        )
    }

    /// Render as SRT text without a trailing newline. An empty payload
    /// renders as header only.
    pub fn render(&self) -> String {
        if self.text.is_empty() {
            format!("{}\n{}", self.ordinal, self.timecode())
        } else {
            format!("{}\n{}\n{}", self.ordinal, self.timecode(), self.text)
        }
    }
}

impl fmt::Display for CaptionBlock {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.render())
    }
}

/// Ordered list of caption blocks. Order is file order; ordinals are carried
/// verbatim and never resorted or renumbered.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CaptionSequence {
    /// Blocks in file order
    pub blocks: Vec<CaptionBlock>,
}

impl CaptionSequence {
    pub fn new(blocks: Vec<CaptionBlock>) -> Self {
        CaptionSequence { blocks }
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Parse raw SRT text into a sequence.
    ///
    /// Blocks lacking a valid timecode line anywhere after their first line
    /// are stray noise and dropped silently. Blocks with a valid header and
    /// no payload lines are kept, with empty text. A leading BOM is
    /// tolerated. This never fails: the worst input yields an empty sequence.
    pub fn parse(content: &str, policy: ParsePolicy) -> Self {
        let content = content.strip_prefix('\u{feff}').unwrap_or(content);

        let mut raw_blocks: Vec<Vec<&str>> = Vec::new();
        let mut current: Vec<&str> = Vec::new();

        match policy {
            ParsePolicy::DigitLine => {
                for line in content.lines() {
                    let stripped = line.trim();
                    if ORDINAL_LINE_REGEX.is_match(stripped) && !current.is_empty() {
                        raw_blocks.push(std::mem::take(&mut current));
                        current.push(line);
                    } else {
                        current.push(line);
                    }
                }
            }
            ParsePolicy::BlankLine => {
                for line in content.lines() {
                    if line.trim().is_empty() {
                        if !current.is_empty() {
                            raw_blocks.push(std::mem::take(&mut current));
                        }
                    } else {
                        current.push(line);
                    }
                }
            }
        }
        if !current.is_empty() {
            raw_blocks.push(current);
        }

        let mut blocks = Vec::with_capacity(raw_blocks.len());
        for raw in &raw_blocks {
            match Self::block_from_lines(raw) {
                Some(block) => blocks.push(block),
                None => debug!("Dropping malformed fragment: {:?}", raw.first()),
            }
        }

        CaptionSequence { blocks }
    }

    /// Build a typed block from raw lines: first line must be the ordinal,
    /// and a timecode line must exist somewhere after it. Text is everything
    /// after the timecode line, trimmed.
    fn block_from_lines(lines: &[&str]) -> Option<CaptionBlock> {
        let first = lines.first()?.trim();
        if !ORDINAL_LINE_REGEX.is_match(first) {
            return None;
        }
        let ordinal: u64 = first.parse().ok()?;

        let timecode_pos = lines
            .iter()
            .skip(1)
            .position(|l| TIMECODE_LINE_REGEX.is_match(l.trim()))?
            + 1;

        let caps = TIMECODE_LINE_REGEX.captures(lines[timecode_pos].trim())?;
        let start_ms = Self::captured_ms(&caps, 1);
        let end_ms = Self::captured_ms(&caps, 5);

        let text = lines[timecode_pos + 1..].join("\n").trim().to_string();

        Some(CaptionBlock::new(ordinal, start_ms, end_ms, text))
    }

    fn captured_ms(caps: &regex::Captures, start_idx: usize) -> u64 {
        let field = |i: usize| -> u64 {
            caps.get(start_idx + i)
                .map_or(0, |m| m.as_str().parse().unwrap_or(0))
        };
        (field(0) * 3600 + field(1) * 60 + field(2)) * 1000 + field(3)
    }

    /// Render the whole sequence: blocks joined by exactly one blank line,
    /// right-trimmed, terminated with exactly one trailing blank line. An
    /// empty sequence renders as an empty string.
    pub fn render(&self) -> String {
        if self.blocks.is_empty() {
            return String::new();
        }
        let joined = self
            .blocks
            .iter()
            .map(|b| b.render())
            .collect::<Vec<_>>()
            .join("\n\n");
        format!("{}\n\n", joined.trim_end())
    }
}

impl fmt::Display for CaptionSequence {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.render())
    }
}
