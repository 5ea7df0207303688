use std::path::PathBuf;
use std::sync::Arc;

use crate::config::{AppConfig, MigrationConfig, PollingConfig};
use crate::console;
use crate::error::{AppError, Result};
use crate::migration::discover;
use crate::migration::report::{self, ReportLocation, ReportScanner};
use crate::migration::select::select_tree_path;
use crate::migration::types::*;
use crate::platform::{IdeSession, WindowSystem};
use crate::prompt::OperatorPrompt;
use crate::retry::{poll_until, with_retry, RetryPolicy};

/// Drives the IDE's packages.config migration over every eligible project of
/// one solution, one project at a time.
pub struct Orchestrator {
    retry: RetryPolicy,
    polling: PollingConfig,
    migration: MigrationConfig,
    windows: Arc<dyn WindowSystem>,
    prompt: Arc<dyn OperatorPrompt>,
}

impl Orchestrator {
    pub fn new(
        config: &AppConfig,
        windows: Arc<dyn WindowSystem>,
        prompt: Arc<dyn OperatorPrompt>,
    ) -> Self {
        Self {
            retry: config.retry.policy(),
            polling: config.polling.clone(),
            migration: config.migration.clone(),
            windows,
            prompt,
        }
    }

    /// Migrate every eligible project of the solution open in `session`.
    ///
    /// A failing project is recorded and the next one is attempted. Only
    /// operator cancellation and failures before the first project (console
    /// initialization, enumeration) are returned as errors.
    pub async fn migrate_solution(
        &self,
        session: &dyn IdeSession,
        work_item: &WorkItem,
    ) -> Result<SolutionReport> {
        let scanner = ReportScanner::prepare(
            work_item.solution_dir(),
            &self.migration.backup_dir,
            &self.migration.report_file,
        )?;

        with_retry(&self.retry, "open package manager console", || {
            session.execute_command(&self.migration.console_command)
        })
        .await?;

        console::progress("Enumerating projects in solution.");
        let candidates = with_retry(&self.retry, "enumerate projects", || async {
            let projects = session.solution_projects().await?;
            Ok(discover::find_candidates(&projects, &self.migration))
        })
        .await?;

        tracing::info!(
            solution = %work_item.path.display(),
            candidates = candidates.len(),
            "Enumerated projects"
        );

        let total = candidates.len();
        let mut results = Vec::with_capacity(total);

        for (index, candidate) in candidates.into_iter().enumerate() {
            console::plain(&format!("[{}/{}] {}", index + 1, total, candidate.name));

            let outcome = match self
                .migrate_project(session, work_item, &scanner, &candidate)
                .await
            {
                Ok(outcome) => outcome,
                Err(e) if e.is_cancellation() => return Err(e),
                Err(e) => {
                    tracing::error!(
                        project = %candidate.display_path(),
                        error = %e,
                        "Project migration failed"
                    );
                    MigrationOutcome::Failed {
                        error: e.to_string(),
                    }
                }
            };

            print_outcome(&outcome);
            tracing::info!(
                project = %candidate.display_path(),
                unique_name = %candidate.unique_name,
                outcome = ?outcome,
                "Project processed"
            );

            results.push(CandidateResult { candidate, outcome });
        }

        Ok(SolutionReport {
            work_item: work_item.clone(),
            results,
        })
    }

    async fn migrate_project(
        &self,
        session: &dyn IdeSession,
        work_item: &WorkItem,
        scanner: &ReportScanner,
        candidate: &ProjectCandidate,
    ) -> Result<MigrationOutcome> {
        // A project sharing its directory with an already migrated one may
        // have lost its manifest since enumeration.
        let files = with_retry(&self.retry, "read project items", || {
            session.project_files(&candidate.project)
        })
        .await?;
        let Some(manifest_item) = discover::manifest_item(&files, &self.migration.manifest_file)
        else {
            return Ok(MigrationOutcome::NotApplicable);
        };
        let manifest = PathBuf::from(manifest_item);

        if !manifest.exists() && !self.prompt.confirm_manifest_restored(&manifest).await? {
            return Err(AppError::Cancelled);
        }

        let tree_path = candidate.tree_path(&work_item.solution_name());
        with_retry(&self.retry, "select project", || {
            select_tree_path(session, &tree_path)
        })
        .await?;

        // Never retried: the IDE may already be migrating.
        session
            .execute_command(&self.migration.migrate_command)
            .await?;

        self.dismiss_migration_dialog().await?;

        let project_path = candidate.solution_relative();
        let found =
            report::wait_for_report(|| scanner.scan(&project_path), &manifest, &self.polling)
                .await?;

        let outcome = match found {
            Some(location) => self.review_report(location).await?,
            None => MigrationOutcome::TimedOut,
        };

        with_retry(&self.retry, "save project", || {
            session.save_project(&candidate.project)
        })
        .await?;

        Ok(outcome)
    }

    /// Wait for the migration options dialog and accept it with Enter.
    async fn dismiss_migration_dialog(&self) -> Result<()> {
        let prefix = self.migration.dialog_title_prefix.as_str();
        let windows = self.windows.as_ref();

        let window = poll_until(
            "migration dialog",
            self.polling.interval(),
            self.polling.dialog_max_polls,
            || async move {
                match windows.find_window(prefix).await {
                    Ok(window) => Ok(window),
                    Err(e) => {
                        tracing::debug!(error = %e, "Window lookup failed");
                        Ok(None)
                    }
                }
            },
            Option::is_some,
        )
        .await?;

        if let Some(window) = window {
            windows.bring_to_front(window).await?;
            windows.send_confirm_key(window).await?;
        }
        Ok(())
    }

    /// Keep the backup for reports with issues; delete it otherwise.
    async fn review_report(&self, location: ReportLocation) -> Result<MigrationOutcome> {
        let report_path = location.report.as_path();
        let content = poll_until(
            "readable migration report",
            self.polling.interval(),
            self.polling.report_read_max_polls,
            || {
                let content = report::read_report(report_path);
                async move { Ok(content) }
            },
            Option::is_some,
        )
        .await?
        .unwrap_or_default();

        // The IDE opens the report in a browser; let it load before deleting.
        tokio::time::sleep(self.polling.report_render_delay()).await;

        if content.contains(&self.migration.clean_marker) {
            report::discard_backup(&location.backup_folder)?;
            Ok(MigrationOutcome::MigratedClean)
        } else {
            Ok(MigrationOutcome::MigratedWithIssues {
                report: location.report,
            })
        }
    }
}

fn print_outcome(outcome: &MigrationOutcome) {
    match outcome {
        MigrationOutcome::NotApplicable => console::success("\tDoes not use packages.config."),
        MigrationOutcome::MigratedClean => console::success("\tNo issues were found."),
        MigrationOutcome::MigratedWithIssues { report } => console::failure(&format!(
            "\tOne or more issues were found. See {}",
            report.display()
        )),
        MigrationOutcome::TimedOut => console::warning("\tNo migration report was produced."),
        MigrationOutcome::Failed { error } => console::failure(&format!("\t{error}")),
    }
}
