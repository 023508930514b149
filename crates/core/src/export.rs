use std::fs;
use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;
use rayon::prelude::*;
use tracing::{info, warn};

use crate::error::{Error, Result};
use crate::hasher;

/// Progress callback events for the export operation.
pub enum ExportProgress {
    /// Starting export with total count.
    Start { total: usize },
    /// Source files were backed up before copying.
    BackedUp { dir: PathBuf, count: usize },
    /// A file was copied under its canonical name.
    Copied { source: PathBuf, target: PathBuf },
    /// A file was skipped (target already holds identical bytes).
    Skipped { path: PathBuf },
    /// A file could not be copied. The batch continues.
    Failed { path: PathBuf, message: String },
    /// Export completed.
    Complete {
        copied: usize,
        skipped: usize,
        failed: usize,
    },
}

/// One planned copy.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportItem {
    pub source: PathBuf,
    pub target: PathBuf,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExportFailure {
    pub path: PathBuf,
    pub message: String,
}

/// Aggregate result of an export run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExportReport {
    pub copied: usize,
    pub skipped: usize,
    pub failures: Vec<ExportFailure>,
    pub backup_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CopyOutcome {
    Copied,
    Skipped,
}

/// Map `(source, canonical name)` pairs to targets inside `out_dir`.
pub fn plan_export(pairs: &[(PathBuf, String)], out_dir: &Path) -> Vec<ExportItem> {
    pairs
        .iter()
        .map(|(source, name)| ExportItem {
            source: source.clone(),
            target: out_dir.join(name),
        })
        .collect()
}

/// `backup_YYYYMMDD_HHMMSS`
pub fn backup_dir_name(at: NaiveDateTime) -> String {
    format!("backup_{}", at.format("%Y%m%d_%H%M%S"))
}

/// Copy `source` to `target` unless the target already holds the same bytes.
/// A stale target with different contents is overwritten.
pub fn copy_to_target(source: &Path, target: &Path) -> Result<CopyOutcome> {
    if target.exists() && hasher::same_contents(source, target)? {
        return Ok(CopyOutcome::Skipped);
    }
    if let Some(parent) = target.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::copy(source, target)?;
    Ok(CopyOutcome::Copied)
}

/// Copy every planned item, optionally backing up the sources first into
/// `out_dir/backup_<timestamp>`. Per-file failures are collected, never fatal.
pub fn run_export(
    items: &[ExportItem],
    out_dir: &Path,
    backup_at: Option<NaiveDateTime>,
    mut progress_cb: Option<&mut dyn FnMut(ExportProgress)>,
) -> Result<ExportReport> {
    if !out_dir.is_dir() {
        return Err(Error::ExportPathNotFound(out_dir.to_path_buf()));
    }

    if let Some(ref mut cb) = progress_cb {
        cb(ExportProgress::Start { total: items.len() });
    }

    let mut report = ExportReport::default();

    if let Some(at) = backup_at {
        let dir = out_dir.join(backup_dir_name(at));
        fs::create_dir_all(&dir)?;

        let results: Vec<(PathBuf, Result<CopyOutcome>)> = items
            .par_iter()
            .map(|item| {
                let target = match item.source.file_name() {
                    Some(name) => dir.join(name),
                    None => dir.join("unnamed"),
                };
                (item.source.clone(), copy_to_target(&item.source, &target))
            })
            .collect();

        let mut count = 0usize;
        for (path, result) in results {
            match result {
                Ok(_) => count += 1,
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "backup failed");
                    report.failures.push(ExportFailure {
                        path,
                        message: format!("backup: {e}"),
                    });
                }
            }
        }
        if let Some(ref mut cb) = progress_cb {
            cb(ExportProgress::BackedUp { dir: dir.clone(), count });
        }
        report.backup_dir = Some(dir);
    }

    // Parallel file copy, collect results
    let results: Vec<(&ExportItem, Result<CopyOutcome>)> = items
        .par_iter()
        .map(|item| (item, copy_to_target(&item.source, &item.target)))
        .collect();

    // Report progress sequentially (callback is not Send)
    for (item, result) in results {
        match result {
            Ok(CopyOutcome::Copied) => {
                report.copied += 1;
                if let Some(ref mut cb) = progress_cb {
                    cb(ExportProgress::Copied {
                        source: item.source.clone(),
                        target: item.target.clone(),
                    });
                }
            }
            Ok(CopyOutcome::Skipped) => {
                report.skipped += 1;
                if let Some(ref mut cb) = progress_cb {
                    cb(ExportProgress::Skipped {
                        path: item.source.clone(),
                    });
                }
            }
            Err(e) => {
                warn!(path = %item.source.display(), error = %e, "copy failed");
                let message = e.to_string();
                if let Some(ref mut cb) = progress_cb {
                    cb(ExportProgress::Failed {
                        path: item.source.clone(),
                        message: message.clone(),
                    });
                }
                report.failures.push(ExportFailure {
                    path: item.source.clone(),
                    message,
                });
            }
        }
    }

    if let Some(ref mut cb) = progress_cb {
        cb(ExportProgress::Complete {
            copied: report.copied,
            skipped: report.skipped,
            failed: report.failures.len(),
        });
    }

    info!(
        copied = report.copied,
        skipped = report.skipped,
        failed = report.failures.len(),
        "export finished"
    );
    Ok(report)
}
