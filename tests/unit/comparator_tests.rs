/*!
 * Tests for the structural acceptance gate
 */

use anyhow::Result;
use subferry::comparator::{Defect, compare_base, compare_sequences};
use subferry::subtitle_block::CaptionBlock;
use crate::common;

#[test]
fn test_compare_withIdenticalSequences_shouldPass() {
    let sequence = common::make_sequence(10);
    let verdict = compare_sequences(&sequence, &sequence);
    assert!(verdict.passed());
    assert!(verdict.defects.is_empty());
}

#[test]
fn test_compare_withOnlyTextDiffering_shouldPass() {
    let original = common::make_sequence(5);
    let mut candidate = common::make_sequence(5);
    for block in &mut candidate.blocks {
        block.text = format!("번역된 대사 {}", block.ordinal);
    }
    assert!(compare_sequences(&original, &candidate).passed());
}

#[test]
fn test_compare_withCountMismatch_shouldShortCircuit() {
    let original = common::make_sequence(5);
    let mut candidate = common::make_sequence(4);
    // Even with other defects present, only the count mismatch is reported
    candidate.blocks[0].ordinal = 99;
    candidate.blocks[1].text = String::new();

    let verdict = compare_sequences(&original, &candidate);
    assert!(!verdict.passed());
    assert_eq!(verdict.defects.len(), 1);
    assert!(matches!(
        verdict.defects[0],
        Defect::CountMismatch { original: 5, candidate: 4 }
    ));
}

#[test]
fn test_compare_withHeaderAndPayloadDefects_shouldAccumulateAll() {
    let original = common::make_sequence(4);
    let mut candidate = common::make_sequence(4);
    candidate.blocks[0].ordinal = 99;
    candidate.blocks[1].start_ms += 1;
    candidate.blocks[2].text = String::new();

    let verdict = compare_sequences(&original, &candidate);
    assert!(!verdict.passed());
    assert_eq!(verdict.defects.len(), 3);
    assert!(matches!(verdict.defects[0], Defect::OrdinalMismatch { index: 0, .. }));
    assert!(matches!(verdict.defects[1], Defect::TimecodeMismatch { index: 1, .. }));
    assert!(matches!(verdict.defects[2], Defect::EmptyPayload { index: 2, .. }));
}

#[test]
fn test_compare_withWhitespaceOnlyPayload_shouldFlagEmpty() {
    let original = common::make_sequence(1);
    let mut candidate = common::make_sequence(1);
    candidate.blocks[0].text = "   ".to_string();

    let verdict = compare_sequences(&original, &candidate);
    assert!(matches!(verdict.defects[0], Defect::EmptyPayload { .. }));
}

#[test]
fn test_verdict_display_withDefects_shouldListEveryOne() {
    let original = common::make_sequence(2);
    let mut candidate = common::make_sequence(2);
    candidate.blocks[0].ordinal = 7;
    candidate.blocks[1].text = String::new();

    let rendered = compare_sequences(&original, &candidate).to_string();
    assert!(rendered.contains("FAIL: 2 defect(s)"));
    assert!(rendered.contains("ordinal mismatch"));
    assert!(rendered.contains("empty payload"));
}

#[test]
fn test_compare_base_withMatchingFiles_shouldPass() -> Result<()> {
    let temp = common::create_temp_dir()?;
    let settings = common::settings_for(temp.path())?;

    let original = common::make_sequence(3);
    let mut candidate = common::make_sequence(3);
    for block in &mut candidate.blocks {
        block.text = format!("번역 {}", block.ordinal);
    }

    common::create_test_file(&settings.origin_dir, "show.ja.srt", &original.render())?;
    common::create_test_file(&settings.merged_dir, "show.ja.srt", &candidate.render())?;

    let verdict = compare_base("show", &settings.origin_dir, &settings.merged_dir, &settings)?;
    assert!(verdict.passed());
    Ok(())
}

#[test]
fn test_compare_base_withMissingMerged_shouldError() -> Result<()> {
    let temp = common::create_temp_dir()?;
    let settings = common::settings_for(temp.path())?;
    common::create_test_file(
        &settings.origin_dir,
        "show.ja.srt",
        &common::make_sequence(1).render(),
    )?;

    assert!(compare_base("show", &settings.origin_dir, &settings.merged_dir, &settings).is_err());
    Ok(())
}

#[test]
fn test_compare_withDriftedTimestamp_shouldReportExactStrings() {
    let original = subferry::subtitle_block::CaptionSequence::new(vec![CaptionBlock::new(
        5,
        62_000,
        64_500,
        "a".to_string(),
    )]);
    let candidate = subferry::subtitle_block::CaptionSequence::new(vec![CaptionBlock::new(
        5,
        62_000,
        64_501,
        "b".to_string(),
    )]);

    let verdict = compare_sequences(&original, &candidate);
    match &verdict.defects[0] {
        Defect::TimecodeMismatch { original, candidate, .. } => {
            assert_eq!(original, "00:01:02,000 --> 00:01:04,500");
            assert_eq!(candidate, "00:01:02,000 --> 00:01:04,501");
        }
        other => panic!("unexpected defect: {:?}", other),
    }
}
