/*!
 * Tests for BOM sniffing and the trial-decode cascade
 */

use std::fs;
use anyhow::Result;
use subferry::encoding::{
    DEFAULT_ENCODING_CANDIDATES, read_text_preserve_encoding, sniff_and_decode,
    write_text_with_encoding,
};
use crate::common;

fn candidates() -> Vec<String> {
    DEFAULT_ENCODING_CANDIDATES.iter().map(|s| s.to_string()).collect()
}

#[test]
fn test_sniff_withPlainUtf8_shouldPickUtf8WithoutBom() {
    let (text, detected) = sniff_and_decode("자막 텍스트".as_bytes(), &candidates());
    assert_eq!(text, "자막 텍스트");
    assert_eq!(detected.name(), "UTF-8");
    assert!(!detected.had_bom);
}

#[test]
fn test_sniff_withUtf8Bom_shouldStripBomAndRememberIt() {
    let mut bytes = vec![0xEF, 0xBB, 0xBF];
    bytes.extend_from_slice("hello".as_bytes());

    let (text, detected) = sniff_and_decode(&bytes, &candidates());
    assert_eq!(text, "hello");
    assert!(detected.had_bom);
}

#[test]
fn test_sniff_withUtf16LeBom_shouldDecode() {
    let mut bytes: Vec<u8> = vec![0xFF, 0xFE];
    for unit in "테스트".encode_utf16() {
        bytes.extend_from_slice(&unit.to_le_bytes());
    }

    let (text, detected) = sniff_and_decode(&bytes, &candidates());
    assert_eq!(text, "테스트");
    assert_eq!(detected.name(), "UTF-16LE");
    assert!(detected.had_bom);
}

#[test]
fn test_sniff_withNoCleanCandidate_shouldFallBackLossy() {
    // 0xE9 followed by an invalid continuation, odd length: fails UTF-8 and
    // both UTF-16 candidates when windows-1252 is removed from the list
    let bytes = [0xE9, 0x20, 0xE9];
    let (text, detected) =
        sniff_and_decode(&bytes, &["utf-8".to_string(), "utf-16le".to_string()]);
    assert_eq!(detected.name(), "windows-1252");
    assert_eq!(text, "é é");
}

#[test]
fn test_sniff_withUnknownLabel_shouldSkipIt() {
    let (text, detected) = sniff_and_decode(
        "ok".as_bytes(),
        &["no-such-encoding".to_string(), "utf-8".to_string()],
    );
    assert_eq!(text, "ok");
    assert_eq!(detected.name(), "UTF-8");
}

#[test]
fn test_sniff_withEucKrCandidate_shouldHonorCascadeOrder() {
    let (euc, _, _) = encoding_rs::EUC_KR.encode("안녕하세요");
    let bytes = euc.into_owned();

    // UTF-8 fails on EUC-KR bytes, the configured legacy encoding succeeds
    let (text, detected) =
        sniff_and_decode(&bytes, &["utf-8".to_string(), "euc-kr".to_string()]);
    assert_eq!(text, "안녕하세요");
    assert_eq!(detected.name(), "EUC-KR");
}

#[test]
fn test_write_withUtf16Le_shouldRoundTripThroughFile() -> Result<()> {
    let temp = common::create_temp_dir()?;
    let path = temp.path().join("utf16.srt");

    let mut bytes: Vec<u8> = vec![0xFF, 0xFE];
    for unit in "라운드 트립".encode_utf16() {
        bytes.extend_from_slice(&unit.to_le_bytes());
    }
    fs::write(&path, &bytes)?;

    let (text, detected) = read_text_preserve_encoding(&path, &candidates())?;
    assert_eq!(text, "라운드 트립");

    write_text_with_encoding(&path, &text, detected)?;
    assert_eq!(fs::read(&path)?, bytes);
    Ok(())
}

#[test]
fn test_write_withEucKr_shouldReencodeSameBytes() -> Result<()> {
    let temp = common::create_temp_dir()?;
    let path = temp.path().join("euckr.srt");

    let (encoded, _, _) = encoding_rs::EUC_KR.encode("자막");
    fs::write(&path, encoded.as_ref())?;

    let cascade = vec!["utf-8".to_string(), "euc-kr".to_string()];
    let (text, detected) = read_text_preserve_encoding(&path, &cascade)?;
    assert_eq!(text, "자막");
    assert_eq!(detected.name(), "EUC-KR");

    write_text_with_encoding(&path, &text, detected)?;
    assert_eq!(fs::read(&path)?, encoded.as_ref());
    Ok(())
}
