/*!
 * Tests for bounded chunk splitting
 */

use anyhow::Result;
use subferry::chunk_store::{ChunkStore, MemStore, DirStore};
use subferry::chunker::{split_file, split_sequence};
use subferry::subtitle_block::{CaptionSequence, ParsePolicy};
use crate::common;

#[test]
fn test_split_sequence_with1700Blocks_shouldYield800_800_100() {
    let sequence = common::make_sequence(1700);
    let chunks = split_sequence(&sequence, 800);

    let sizes: Vec<usize> = chunks.iter().map(|c| c.len()).collect();
    assert_eq!(sizes, vec![800, 800, 100]);

    // Count conservation
    let total: usize = sizes.iter().sum();
    assert_eq!(total, 1700);

    // Ordinals carried unchanged across chunk boundaries
    assert_eq!(chunks[0].blocks[0].ordinal, 1);
    assert_eq!(chunks[0].blocks[799].ordinal, 800);
    assert_eq!(chunks[1].blocks[0].ordinal, 801);
    assert_eq!(chunks[2].blocks[99].ordinal, 1700);
}

#[test]
fn test_split_sequence_withExactMultiple_shouldHaveNoEmptyTail() {
    let chunks = split_sequence(&common::make_sequence(1600), 800);
    assert_eq!(chunks.len(), 2);
    assert!(chunks.iter().all(|c| c.len() == 800));
}

#[test]
fn test_split_sequence_withEmptyInput_shouldYieldZeroChunks() {
    let chunks = split_sequence(&CaptionSequence::default(), 800);
    assert!(chunks.is_empty());
}

#[test]
fn test_split_sequence_withZeroSize_shouldClampToOne() {
    let chunks = split_sequence(&common::make_sequence(3), 0);
    assert_eq!(chunks.len(), 3);
}

#[test]
fn test_split_file_withFiveBlocks_shouldWriteBothStoresContiguously() -> Result<()> {
    let temp = common::create_temp_dir()?;
    let mut settings = common::settings_for(temp.path())?;
    settings.chunk_size = 2;

    let path = common::create_test_file(
        &settings.origin_dir,
        "show.ja.srt",
        &common::make_sequence(5).render(),
    )?;

    let origin = MemStore::new();
    let working = MemStore::new();
    let count = split_file(&path, &origin, &working, &settings)?;
    assert_eq!(count, 3);

    for store in [&origin, &working] {
        let ids = store.list("show")?;
        let indices: Vec<u32> = ids.iter().map(|id| id.index).collect();
        assert_eq!(indices, vec![0, 1, 2]);
        assert!(ids.iter().all(|id| id.stem == "show.ja"));
    }

    // Chunk contents re-parse to the original windows
    let first = CaptionSequence::parse(
        &origin.read(&origin.list("show")?[0])?,
        ParsePolicy::DigitLine,
    );
    assert_eq!(first.len(), 2);
    assert_eq!(first.blocks[0].ordinal, 1);
    assert_eq!(first.blocks[1].ordinal, 2);

    let last = CaptionSequence::parse(
        &origin.read(&origin.list("show")?[2])?,
        ParsePolicy::DigitLine,
    );
    assert_eq!(last.len(), 1);
    assert_eq!(last.blocks[0].ordinal, 5);
    Ok(())
}

#[test]
fn test_split_file_withEmptySrt_shouldReportZeroChunks() -> Result<()> {
    let temp = common::create_temp_dir()?;
    let settings = common::settings_for(temp.path())?;
    let path = common::create_test_file(&settings.origin_dir, "empty.ja.srt", "\n\n")?;

    let origin = MemStore::new();
    let working = MemStore::new();
    assert_eq!(split_file(&path, &origin, &working, &settings)?, 0);
    assert!(origin.bases()?.is_empty());
    Ok(())
}

#[test]
fn test_split_file_withMissingFile_shouldError() -> Result<()> {
    let temp = common::create_temp_dir()?;
    let settings = common::settings_for(temp.path())?;
    let origin = DirStore::new(&settings.origin_chunks_dir);
    let working = DirStore::new(&settings.working_chunks_dir);

    let missing = settings.origin_dir.join("nope.srt");
    assert!(split_file(&missing, &origin, &working, &settings).is_err());
    Ok(())
}
