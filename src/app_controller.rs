use std::fmt;
use std::path::{Path, PathBuf};
use anyhow::{Result, Context};
use indicatif::{ProgressBar, ProgressStyle};
use log::{error, warn, info};

use crate::app_config::Settings;
use crate::chunk_store::{ChunkId, ChunkStore, DirStore, base_identifier};
use crate::chunker;
use crate::comparator::{self, Verdict};
use crate::errors::FerryError;
use crate::file_utils::FileManager;
use crate::merger;
use crate::post_processor;
use crate::repeat_compressor::{RepeatCompressor, load_patterns};
use crate::restorer;

// @module: Batch drivers over the pipeline stages
//
// Each driver iterates its units sequentially and isolates failures per
// unit: a bad unit is logged and recorded, never aborting its siblings. The
// caller gets aggregate counts plus the list of failed identifiers.

/// Aggregate outcome of one batch run
#[derive(Debug, Default, Clone)]
pub struct BatchSummary {
    pub processed: usize,
    pub failed: usize,
    pub skipped: usize,
    pub failed_units: Vec<String>,
    pub skipped_units: Vec<String>,
}

impl BatchSummary {
    pub fn all_ok(&self) -> bool {
        self.failed == 0
    }

    fn record_ok(&mut self) {
        self.processed += 1;
    }

    fn record_failure(&mut self, unit: &str, err: &anyhow::Error) {
        error!("Failed unit '{}': {:#}", unit, err);
        self.failed += 1;
        self.failed_units.push(unit.to_string());
    }

    fn record_skip(&mut self, unit: &str, reason: &str) {
        info!("Skipped unit '{}': {}", unit, reason);
        self.skipped += 1;
        self.skipped_units.push(unit.to_string());
    }
}

impl fmt::Display for BatchSummary {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "processed={}, failed={}, skipped={}",
            self.processed, self.failed, self.skipped
        )?;
        if !self.failed_units.is_empty() {
            write!(f, "; failed units: {}", self.failed_units.join(", "))?;
        }
        if !self.skipped_units.is_empty() {
            write!(f, "; skipped units: {}", self.skipped_units.join(", "))?;
        }
        Ok(())
    }
}

/// Main application controller driving the pipeline stages
pub struct Controller {
    settings: Settings,
}

impl Controller {
    pub fn with_settings(settings: Settings) -> Result<Self> {
        settings.validate()?;
        Ok(Controller { settings })
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    fn origin_chunk_store(&self) -> DirStore {
        DirStore::with_candidates(
            &self.settings.origin_chunks_dir,
            self.settings.encoding_candidates.clone(),
        )
    }

    fn working_chunk_store(&self) -> DirStore {
        DirStore::with_candidates(
            &self.settings.working_chunks_dir,
            self.settings.encoding_candidates.clone(),
        )
    }

    fn progress_bar(&self, len: usize, stage: &str) -> ProgressBar {
        let pb = ProgressBar::new(len as u64);
        pb.set_style(
            ProgressStyle::with_template("{msg} [{bar:30}] {pos}/{len}")
                .unwrap_or_else(|_| ProgressStyle::default_bar()),
        );
        pb.set_message(stage.to_string());
        pb
    }

    fn log_summary(&self, stage: &str, summary: &BatchSummary) {
        info!("{}: {}", stage, summary);
        if let Some(log_path) = &self.settings.summary_log {
            if let Err(e) =
                FileManager::append_to_log_file(log_path, &format!("{}: {}", stage, summary))
            {
                warn!("Could not append to summary log: {:#}", e);
            }
        }
    }

    /// Chunk one full SRT file into both chunk stores
    pub fn split_one(&self, path: &Path) -> Result<usize> {
        chunker::split_file(
            path,
            &self.origin_chunk_store(),
            &self.working_chunk_store(),
            &self.settings,
        )
    }

    /// Chunk every SRT file directly inside the origin directory
    pub fn split_all(&self) -> Result<BatchSummary> {
        if !FileManager::dir_exists(&self.settings.origin_dir) {
            return Err(FerryError::MissingInput(format!(
                "origin directory does not exist: {}",
                self.settings.origin_dir.display()
            ))
            .into());
        }

        let files = FileManager::srt_files_in(&self.settings.origin_dir)?;
        let pb = self.progress_bar(files.len(), "split");
        let mut summary = BatchSummary::default();

        for file in &files {
            let unit = file.file_name().unwrap_or_default().to_string_lossy().to_string();
            match self.split_one(file) {
                Ok(0) => summary.record_skip(&unit, "no caption blocks"),
                Ok(_) => summary.record_ok(),
                Err(e) => summary.record_failure(&unit, &e),
            }
            pb.inc(1);
        }
        pb.finish_and_clear();

        self.log_summary("split", &summary);
        Ok(summary)
    }

    /// Post-process one full SRT file: punctuation, line wrapping, minimum
    /// display duration
    pub fn post_process_one(&self, path: &Path, output_dir: Option<&Path>) -> Result<usize> {
        post_processor::post_process_file(path, output_dir, &self.settings)
    }

    /// Post-process every SRT file directly inside the origin directory,
    /// in place unless an output directory is given
    pub fn post_process_all(&self, output_dir: Option<&Path>) -> Result<BatchSummary> {
        if !FileManager::dir_exists(&self.settings.origin_dir) {
            return Err(FerryError::MissingInput(format!(
                "origin directory does not exist: {}",
                self.settings.origin_dir.display()
            ))
            .into());
        }

        let files = FileManager::srt_files_in(&self.settings.origin_dir)?;
        let pb = self.progress_bar(files.len(), "post-process");
        let mut summary = BatchSummary::default();

        for file in &files {
            let unit = file.file_name().unwrap_or_default().to_string_lossy().to_string();
            match self.post_process_one(file, output_dir) {
                Ok(0) => summary.record_skip(&unit, "no caption blocks"),
                Ok(_) => summary.record_ok(),
                Err(e) => summary.record_failure(&unit, &e),
            }
            pb.inc(1);
        }
        pb.finish_and_clear();

        self.log_summary("post-process", &summary);
        Ok(summary)
    }

    /// Restore one working chunk in place, identified by its file name
    pub fn restore_one(&self, file_name: &str) -> Result<()> {
        let id = ChunkId::from_file_name(file_name).ok_or_else(|| {
            FerryError::MissingInput(format!("not a chunk file name: {}", file_name))
        })?;
        restorer::restore_chunk(
            &id,
            &self.origin_chunk_store(),
            &self.working_chunk_store(),
            &self.settings,
        )
    }

    /// Restore every chunk present in the origin chunk store. Chunks whose
    /// working counterpart has not come back yet are skipped and listed.
    pub fn restore_all(&self) -> Result<BatchSummary> {
        let origin = self.origin_chunk_store();
        let working = self.working_chunk_store();

        let mut ids = Vec::new();
        for base in origin.bases()? {
            ids.extend(origin.list(&base)?);
        }

        let pb = self.progress_bar(ids.len(), "restore");
        let mut summary = BatchSummary::default();

        for id in &ids {
            let unit = id.file_name();
            if !working.exists(id) {
                summary.record_skip(&unit, "no working chunk yet");
                pb.inc(1);
                continue;
            }
            match restorer::restore_chunk(id, &origin, &working, &self.settings) {
                Ok(()) => summary.record_ok(),
                Err(e) => summary.record_failure(&unit, &e),
            }
            pb.inc(1);
        }
        pb.finish_and_clear();

        self.log_summary("restore", &summary);
        Ok(summary)
    }

    /// Merge all restored chunks of one base into the merged directory
    pub fn merge_one(&self, base: &str) -> Result<PathBuf> {
        merger::merge_base(
            base,
            &self.origin_chunk_store(),
            &self.working_chunk_store(),
            &self.settings.merged_dir,
        )
    }

    /// Merge every base present in the origin chunk store
    pub fn merge_all(&self) -> Result<BatchSummary> {
        let origin = self.origin_chunk_store();
        let bases = origin.bases()?;

        let pb = self.progress_bar(bases.len(), "merge");
        let mut summary = BatchSummary::default();

        for base in &bases {
            match self.merge_one(base) {
                Ok(_) => summary.record_ok(),
                Err(e) => summary.record_failure(base, &e),
            }
            pb.inc(1);
        }
        pb.finish_and_clear();

        self.log_summary("merge", &summary);
        Ok(summary)
    }

    /// Compare one base's merged candidate against its full original
    pub fn compare_one(&self, base: &str) -> Result<Verdict> {
        comparator::compare_base(
            base,
            &self.settings.origin_dir,
            &self.settings.merged_dir,
            &self.settings,
        )
    }

    /// Compare every base found in the origin directory. With a relocation
    /// target, an accepted merged file is moved next to its matching media
    /// file under that target and the base's intermediate files are removed.
    pub fn compare_all(&self, relocate_target: Option<&Path>) -> Result<BatchSummary> {
        if !FileManager::dir_exists(&self.settings.origin_dir) {
            return Err(FerryError::MissingInput(format!(
                "origin directory does not exist: {}",
                self.settings.origin_dir.display()
            ))
            .into());
        }

        let mut bases: Vec<String> = FileManager::srt_files_in(&self.settings.origin_dir)?
            .iter()
            .filter_map(|p| p.file_name().map(|n| base_identifier(&n.to_string_lossy())))
            .collect();
        bases.sort();
        bases.dedup();

        let pb = self.progress_bar(bases.len(), "compare");
        let mut summary = BatchSummary::default();

        for base in &bases {
            match self.compare_one(base) {
                Ok(verdict) if verdict.passed() => {
                    if let Some(target) = relocate_target {
                        if let Err(e) = self.relocate_and_clean(base, target) {
                            summary.record_failure(base, &e);
                            pb.inc(1);
                            continue;
                        }
                    }
                    summary.record_ok();
                }
                Ok(verdict) => {
                    warn!("Base '{}' rejected:\n{}", base, verdict);
                    summary.record_failure(base, &anyhow::anyhow!("comparison failed"));
                }
                Err(e) => summary.record_failure(base, &e),
            }
            pb.inc(1);
        }
        pb.finish_and_clear();

        self.log_summary("compare", &summary);
        Ok(summary)
    }

    /// Move an accepted merged file next to its media file, renamed to the
    /// media stem, then delete the base's files from all four directory
    /// roles
    fn relocate_and_clean(&self, base: &str, target: &Path) -> Result<()> {
        let media = FileManager::find_media_for_base(target, base).ok_or_else(|| {
            FerryError::MissingInput(format!(
                "no media file for base '{}' under {}",
                base,
                target.display()
            ))
        })?;

        let merged_files =
            FileManager::find_full_srt_by_base(&self.settings.merged_dir, base)?;
        let merged = merged_files.first().ok_or_else(|| {
            FerryError::MissingInput(format!("no merged file for base '{}'", base))
        })?;

        let dest = media.with_extension("srt");
        FileManager::move_file(merged, &dest)
            .with_context(|| format!("Failed to relocate merged file for base '{}'", base))?;
        info!("Relocated {} -> {}", merged.display(), dest.display());

        for dir in [&self.settings.origin_dir, &self.settings.merged_dir] {
            for file in FileManager::find_full_srt_by_base(dir, base)? {
                if FileManager::file_exists(&file) {
                    std::fs::remove_file(&file)
                        .with_context(|| format!("Failed to delete: {}", file.display()))?;
                }
            }
        }
        self.origin_chunk_store().delete_matching(base)?;
        self.working_chunk_store().delete_matching(base)?;
        info!("Cleaned intermediate files for base '{}'", base);
        Ok(())
    }

    /// Compress repeated tokens in every SRT file under a directory,
    /// recursively, preserving each file's encoding
    pub fn trim_repeats_all(
        &self,
        dir: Option<&Path>,
        patterns_file: Option<&Path>,
        dry_run: bool,
    ) -> Result<BatchSummary> {
        let process_dir = dir.unwrap_or(&self.settings.origin_dir);
        if !FileManager::dir_exists(process_dir) {
            return Err(FerryError::MissingInput(format!(
                "directory does not exist: {}",
                process_dir.display()
            ))
            .into());
        }

        let patterns_path = patterns_file
            .map(|p| p.to_path_buf())
            .or_else(|| self.settings.patterns_file.clone())
            .ok_or_else(|| FerryError::MissingInput("no pattern file configured".to_string()))?;
        if !FileManager::file_exists(&patterns_path) {
            return Err(FerryError::MissingInput(format!(
                "pattern file does not exist: {}",
                patterns_path.display()
            ))
            .into());
        }

        let patterns = load_patterns(&patterns_path, &self.settings.encoding_candidates)?;
        info!("Loaded {} patterns from {}", patterns.len(), patterns_path.display());
        if patterns.is_empty() {
            warn!("Pattern file is empty, nothing to do");
            return Ok(BatchSummary::default());
        }

        let compressor = RepeatCompressor::new(
            &patterns,
            self.settings.min_repeat,
            self.settings.keep_repeat,
            self.settings.keep_space,
        )?;

        let files = FileManager::srt_files_recursive(process_dir)?;
        let pb = self.progress_bar(files.len(), "trim-repeats");
        let mut summary = BatchSummary::default();

        for file in &files {
            let unit = file.display().to_string();
            match compressor.process_file(file, &self.settings.encoding_candidates, dry_run) {
                Ok((true, enc)) => {
                    info!("[UPDATED] {} (enc={})", unit, enc);
                    summary.record_ok();
                }
                Ok((false, enc)) => {
                    info!("[SKIP]    {} (enc={})", unit, enc);
                    summary.record_skip(&unit, "no repeated runs");
                }
                Err(e) => summary.record_failure(&unit, &e),
            }
            pb.inc(1);
        }
        pb.finish_and_clear();

        self.log_summary("trim-repeats", &summary);
        Ok(summary)
    }
}
