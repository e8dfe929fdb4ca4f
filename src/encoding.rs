/*!
 * Encoding-preserving file I/O.
 *
 * Subtitle files in the wild arrive in a mix of UTF-8 (with and without BOM),
 * UTF-16 and legacy single-byte encodings. Reads sniff the encoding by BOM
 * first, then by an ordered trial-decode cascade; writes re-encode with the
 * same detected encoding so a cleanup pass never silently transcodes a file.
 */

use std::fs;
use std::path::Path;
use anyhow::{Result, Context};
use encoding_rs::{Encoding, WINDOWS_1252};
use log::{warn, debug};

/// Default trial-decode order when no BOM is present. The list is
/// configurable in Settings because legacy regional encodings vary by
/// deployment. windows-1252 decodes any byte stream, so it doubles as the
/// lossy fallback.
pub const DEFAULT_ENCODING_CANDIDATES: &[&str] =
    &["utf-8", "utf-16le", "utf-16be", "windows-1252"];

/// The encoding a file was read with, carried alongside its decoded text so
/// the write side can round-trip bytes faithfully.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DetectedEncoding {
    pub encoding: &'static Encoding,
    /// Whether the file opened with a byte-order mark (re-emitted on write)
    pub had_bom: bool,
}

impl DetectedEncoding {
    pub fn utf8() -> Self {
        DetectedEncoding { encoding: encoding_rs::UTF_8, had_bom: false }
    }

    pub fn name(&self) -> &'static str {
        self.encoding.name()
    }
}

/// Decode a byte buffer: BOM probe first, then each candidate label in
/// order, accepting the first clean decode. Falls back to a lossy
/// windows-1252 decode rather than failing.
pub fn sniff_and_decode(bytes: &[u8], candidates: &[String]) -> (String, DetectedEncoding) {
    if let Some((encoding, bom_len)) = Encoding::for_bom(bytes) {
        let (text, _, had_errors) = encoding.decode(&bytes[bom_len..]);
        if had_errors {
            warn!("BOM indicated {} but decode was lossy", encoding.name());
        }
        return (text.into_owned(), DetectedEncoding { encoding, had_bom: true });
    }

    for label in candidates {
        let Some(encoding) = Encoding::for_label(label.as_bytes()) else {
            warn!("Unknown encoding label in candidate list: {}", label);
            continue;
        };
        let (text, had_errors) = encoding.decode_without_bom_handling(bytes);
        if !had_errors {
            debug!("Decoded as {}", encoding.name());
            return (text.into_owned(), DetectedEncoding { encoding, had_bom: false });
        }
    }

    warn!("No candidate encoding decoded cleanly, falling back to lossy windows-1252");
    let (text, _) = WINDOWS_1252.decode_without_bom_handling(bytes);
    (text.into_owned(), DetectedEncoding { encoding: WINDOWS_1252, had_bom: false })
}

/// Read a file, preserving knowledge of its encoding for the write side
pub fn read_text_preserve_encoding<P: AsRef<Path>>(
    path: P,
    candidates: &[String],
) -> Result<(String, DetectedEncoding)> {
    let path = path.as_ref();
    let bytes = fs::read(path)
        .with_context(|| format!("Failed to read file: {}", path.display()))?;
    Ok(sniff_and_decode(&bytes, candidates))
}

/// Write text back with the encoding it was read with, re-emitting the BOM
/// when the original had one
pub fn write_text_with_encoding<P: AsRef<Path>>(
    path: P,
    text: &str,
    detected: DetectedEncoding,
) -> Result<()> {
    let path = path.as_ref();

    let mut bytes: Vec<u8> = Vec::new();
    if detected.had_bom {
        bytes.extend_from_slice(bom_bytes(detected.encoding));
    }

    // encoding_rs has no UTF-16 encoder (its encode() would fall back to
    // UTF-8), so UTF-16 units are produced by hand.
    if detected.encoding == encoding_rs::UTF_16LE {
        for unit in text.encode_utf16() {
            bytes.extend_from_slice(&unit.to_le_bytes());
        }
    } else if detected.encoding == encoding_rs::UTF_16BE {
        for unit in text.encode_utf16() {
            bytes.extend_from_slice(&unit.to_be_bytes());
        }
    } else {
        let (encoded, _, had_errors) = detected.encoding.encode(text);
        if had_errors {
            warn!(
                "Lossy re-encode to {} while writing {}",
                detected.name(),
                path.display()
            );
        }
        bytes.extend_from_slice(&encoded);
    }

    fs::write(path, bytes)
        .with_context(|| format!("Failed to write file: {}", path.display()))
}

fn bom_bytes(encoding: &'static Encoding) -> &'static [u8] {
    if encoding == encoding_rs::UTF_16LE {
        &[0xFF, 0xFE]
    } else if encoding == encoding_rs::UTF_16BE {
        &[0xFE, 0xFF]
    } else {
        &[0xEF, 0xBB, 0xBF]
    }
}
