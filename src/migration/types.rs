use std::path::{Path, PathBuf};

use crate::platform::types::ProjectId;

/// One solution file named on the command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkItem {
    /// Absolute, normalized solution file path.
    pub path: PathBuf,
}

impl WorkItem {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn solution_dir(&self) -> &Path {
        self.path.parent().unwrap_or_else(|| Path::new(""))
    }

    /// Name of the solution's root node in the solution explorer.
    pub fn solution_name(&self) -> String {
        self.path
            .file_stem()
            .map(|stem| stem.to_string_lossy().to_string())
            .unwrap_or_default()
    }
}

/// A class library still on packages.config, found in a solution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectCandidate {
    /// Solution folders enclosing the project, outermost first, then the project name.
    pub solution_path: Vec<String>,
    /// Project file path relative to the solution directory.
    pub unique_name: String,
    pub project: ProjectId,
    pub name: String,
}

impl ProjectCandidate {
    /// Path of the project inside the solution, as mirrored by migration backups.
    pub fn solution_relative(&self) -> PathBuf {
        self.solution_path.iter().collect()
    }

    /// Solution explorer path from the solution root down to the project.
    pub fn tree_path(&self, solution_name: &str) -> Vec<String> {
        std::iter::once(solution_name.to_string())
            .chain(self.solution_path.iter().cloned())
            .collect()
    }

    pub fn display_path(&self) -> String {
        self.solution_path.join("\\")
    }
}

/// Result of driving one project through the migration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MigrationOutcome {
    /// The project no longer references packages.config.
    NotApplicable,
    /// Report found and clean; its backup folder was deleted.
    MigratedClean,
    /// Report found with issues; the backup folder is kept for review.
    MigratedWithIssues { report: PathBuf },
    /// No report appeared and the manifest is gone.
    TimedOut,
    /// The attempt failed.
    Failed { error: String },
}

impl MigrationOutcome {
    pub fn is_failure(&self) -> bool {
        matches!(self, MigrationOutcome::Failed { .. })
    }
}

#[derive(Debug, Clone)]
pub struct CandidateResult {
    pub candidate: ProjectCandidate,
    pub outcome: MigrationOutcome,
}

/// Everything that happened to one solution.
#[derive(Debug, Clone)]
pub struct SolutionReport {
    pub work_item: WorkItem,
    pub results: Vec<CandidateResult>,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct OutcomeCounts {
    pub not_applicable: usize,
    pub clean: usize,
    pub with_issues: usize,
    pub timed_out: usize,
    pub failed: usize,
}

impl SolutionReport {
    /// True when no project failed.
    pub fn success(&self) -> bool {
        !self.results.iter().any(|r| r.outcome.is_failure())
    }

    pub fn outcomes(&self) -> Vec<&MigrationOutcome> {
        self.results.iter().map(|r| &r.outcome).collect()
    }

    pub fn counts(&self) -> OutcomeCounts {
        let mut counts = OutcomeCounts::default();
        for result in &self.results {
            match result.outcome {
                MigrationOutcome::NotApplicable => counts.not_applicable += 1,
                MigrationOutcome::MigratedClean => counts.clean += 1,
                MigrationOutcome::MigratedWithIssues { .. } => counts.with_issues += 1,
                MigrationOutcome::TimedOut => counts.timed_out += 1,
                MigrationOutcome::Failed { .. } => counts.failed += 1,
            }
        }
        counts
    }
}
