//! Locating and interpreting the upgrade report the IDE writes per project.
//!
//! The IDE backs each migrated project up to
//! `<solution>/MigrationBackup/<backupId>/<project path>/` and writes its
//! report there. Backup folders present before a run started belong to
//! earlier runs and are never matched.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use crate::config::PollingConfig;
use crate::error::{AppError, Result};
use crate::paths;
use crate::retry::poll_until;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportLocation {
    pub report: PathBuf,
    /// The `<backupId>` folder holding the report.
    pub backup_folder: PathBuf,
}

pub struct ReportScanner {
    backup_root: PathBuf,
    report_file: String,
    done: HashSet<String>,
}

impl ReportScanner {
    /// Snapshot the backup folders that already exist.
    pub fn prepare(solution_dir: &Path, backup_dir: &str, report_file: &str) -> Result<Self> {
        let backup_root = solution_dir.join(backup_dir);
        let done = if backup_root.is_dir() {
            backup_folders(&backup_root)?
                .iter()
                .map(|folder| paths::fold(folder))
                .collect()
        } else {
            HashSet::new()
        };

        tracing::debug!(
            backup_root = %backup_root.display(),
            existing = done.len(),
            "Prepared report scanner"
        );

        Ok(Self {
            backup_root,
            report_file: report_file.to_string(),
            done,
        })
    }

    /// First report for `project_path` inside a backup folder created since
    /// [`ReportScanner::prepare`].
    pub fn scan(&self, project_path: &Path) -> Option<ReportLocation> {
        if !self.backup_root.is_dir() {
            return None;
        }

        let folders = backup_folders(&self.backup_root).ok()?;
        folders
            .into_iter()
            .filter(|folder| !self.done.contains(&paths::fold(folder)))
            .find_map(|folder| {
                let report = folder.join(project_path).join(&self.report_file);
                report.is_file().then(|| ReportLocation {
                    report,
                    backup_folder: folder,
                })
            })
    }
}

fn backup_folders(root: &Path) -> Result<Vec<PathBuf>> {
    let mut folders = Vec::new();
    for entry in fs::read_dir(root)? {
        let entry = entry?;
        if entry.file_type()?.is_dir() {
            folders.push(entry.path());
        }
    }
    folders.sort();
    Ok(folders)
}

/// Report contents once the IDE has finished writing them.
///
/// Bytes that are not UTF-8 are replaced; the report encoding is up to the IDE.
pub fn read_report(path: &Path) -> Option<String> {
    fs::read(path)
        .ok()
        .filter(|bytes| !bytes.is_empty())
        .map(|bytes| String::from_utf8_lossy(&bytes).into_owned())
}

pub fn discard_backup(folder: &Path) -> Result<()> {
    fs::remove_dir_all(folder).map_err(|e| {
        AppError::Report(format!("Failed to delete backup {}: {e}", folder.display()))
    })?;
    tracing::debug!(folder = %folder.display(), "Deleted clean migration backup");
    Ok(())
}

/// Poll `scan` until a report shows up, or until `report_wait_polls` scans
/// found nothing and the manifest is gone, meaning the IDE finished without
/// writing a report.
pub async fn wait_for_report<F>(
    mut scan: F,
    manifest: &Path,
    polling: &PollingConfig,
) -> Result<Option<ReportLocation>>
where
    F: FnMut() -> Option<ReportLocation>,
{
    let mut misses = 0u32;

    poll_until(
        "migration report",
        polling.interval(),
        polling.report_wait_max_polls,
        || {
            let found = scan();
            async move { Ok(found) }
        },
        |found| {
            if found.is_some() {
                return true;
            }
            misses += 1;
            misses >= polling.report_wait_polls && !manifest.exists()
        },
    )
    .await
}
