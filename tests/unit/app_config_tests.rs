/*!
 * Tests for the immutable settings struct
 */

use anyhow::Result;
use subferry::app_config::Settings;
use subferry::restorer::AlignPolicy;
use subferry::subtitle_block::ParsePolicy;
use crate::common;

#[test]
fn test_with_root_shouldDeriveAllDirectoryRoles() {
    let settings = Settings::with_root("/tmp/srt_home");
    assert!(settings.origin_dir.ends_with("origin"));
    assert!(settings.origin_chunks_dir.ends_with("origin_chunks"));
    assert!(settings.working_chunks_dir.ends_with("working_chunks"));
    assert!(settings.merged_dir.ends_with("merged"));
    assert_eq!(settings.chunk_size, 800);
    assert_eq!(settings.min_repeat, 7);
    assert_eq!(settings.keep_repeat, 3);
    assert_eq!(settings.max_line_length, 40);
    assert_eq!(settings.min_duration_ms, 1500);
    assert_eq!(settings.parse_policy, ParsePolicy::DigitLine);
    assert_eq!(settings.align_policy, AlignPolicy::Overwrite);
    assert!(settings.validate().is_ok());
}

#[test]
fn test_validate_withBadKnobs_shouldReject() {
    let mut settings = Settings::with_root("/tmp/srt_home");
    settings.chunk_size = 0;
    assert!(settings.validate().is_err());

    let mut settings = Settings::with_root("/tmp/srt_home");
    settings.min_repeat = 1;
    assert!(settings.validate().is_err());

    let mut settings = Settings::with_root("/tmp/srt_home");
    settings.keep_repeat = 0;
    assert!(settings.validate().is_err());

    let mut settings = Settings::with_root("/tmp/srt_home");
    settings.encoding_candidates.clear();
    assert!(settings.validate().is_err());

    let mut settings = Settings::with_root("/tmp/srt_home");
    settings.max_line_length = 0;
    assert!(settings.validate().is_err());
}

#[test]
fn test_validate_withNestedDirectoryRoles_shouldReject() {
    let mut settings = Settings::with_root("/tmp/srt_home");
    settings.working_chunks_dir = settings.origin_chunks_dir.join("working");
    assert!(settings.validate().is_err());

    let mut settings = Settings::with_root("/tmp/srt_home");
    settings.merged_dir = settings.origin_dir.clone();
    assert!(settings.validate().is_err());
}

#[test]
fn test_settings_file_shouldRoundTrip() -> Result<()> {
    let temp = common::create_temp_dir()?;
    let path = temp.path().join("settings.json");

    let mut settings = Settings::with_root(temp.path().join("home"));
    settings.chunk_size = 500;
    settings.keep_space = true;
    settings.to_file(&path)?;

    let loaded = Settings::from_file(&path)?;
    assert_eq!(loaded.chunk_size, 500);
    assert!(loaded.keep_space);
    assert_eq!(loaded.origin_dir, settings.origin_dir);
    Ok(())
}

#[test]
fn test_from_file_withMinimalJson_shouldFillDefaults() -> Result<()> {
    let temp = common::create_temp_dir()?;
    let path = common::create_test_file(
        temp.path(),
        "minimal.json",
        r#"{
            "origin_dir": "/x/origin",
            "origin_chunks_dir": "/x/origin_chunks",
            "working_chunks_dir": "/x/working_chunks",
            "merged_dir": "/x/merged"
        }"#,
    )?;

    let settings = Settings::from_file(&path)?;
    assert_eq!(settings.chunk_size, 800);
    assert_eq!(settings.parse_policy, ParsePolicy::DigitLine);
    assert!(!settings.noise_denylist.is_empty());
    assert!(!settings.encoding_candidates.is_empty());
    Ok(())
}

#[test]
fn test_from_file_withInvalidValues_shouldFailValidation() -> Result<()> {
    let temp = common::create_temp_dir()?;
    let path = common::create_test_file(
        temp.path(),
        "bad.json",
        r#"{
            "origin_dir": "/x/origin",
            "origin_chunks_dir": "/x/origin_chunks",
            "working_chunks_dir": "/x/working_chunks",
            "merged_dir": "/x/merged",
            "min_repeat": 1
        }"#,
    )?;

    assert!(Settings::from_file(&path).is_err());
    Ok(())
}
