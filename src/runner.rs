use std::path::PathBuf;
use std::sync::Arc;

use chrono::{DateTime, Local};
use colored::Colorize;

use crate::config::{AppConfig, IdeConfig, PollingConfig};
use crate::console;
use crate::error::{AppError, Result};
use crate::locator::find_instance;
use crate::migration::{Orchestrator, SolutionReport, WorkItem};
use crate::paths;
use crate::platform::launcher::{LaunchedProcess, ProcessLauncher};
use crate::platform::types::AutomationHandle;
use crate::platform::Automation;
use crate::retry::poll_until;

/// How one solution ended.
#[derive(Debug)]
pub enum WorkItemStatus {
    /// The orchestrator ran over the solution's projects.
    Completed(SolutionReport),
    /// The solution could not be opened, initialized or enumerated.
    Failed { error: String },
}

#[derive(Debug)]
pub struct RunEntry {
    pub work_item: WorkItem,
    pub status: WorkItemStatus,
    /// The IDE was started by this run.
    pub launched: bool,
    /// The IDE this run started was closed again.
    pub terminated: bool,
    pub started_at: DateTime<Local>,
    pub finished_at: DateTime<Local>,
}

impl RunEntry {
    pub fn success(&self) -> bool {
        match &self.status {
            WorkItemStatus::Completed(report) => report.success(),
            WorkItemStatus::Failed { .. } => false,
        }
    }
}

/// Processes solution files one after another, opening each in an IDE.
pub struct Runner {
    ide: IdeConfig,
    polling: PollingConfig,
    automation: Arc<dyn Automation>,
    launcher: Arc<dyn ProcessLauncher>,
    orchestrator: Orchestrator,
}

impl Runner {
    pub fn new(
        config: &AppConfig,
        automation: Arc<dyn Automation>,
        launcher: Arc<dyn ProcessLauncher>,
        orchestrator: Orchestrator,
    ) -> Self {
        Self {
            ide: config.ide.clone(),
            polling: config.polling.clone(),
            automation,
            launcher,
            orchestrator,
        }
    }

    /// Migrate each solution in order.
    ///
    /// Returns early only when the operator cancels the run.
    pub async fn run(&self, solutions: &[PathBuf]) -> Result<Vec<RunEntry>> {
        let mut entries = Vec::with_capacity(solutions.len());

        for solution in solutions {
            let work_item = WorkItem::new(paths::absolute(solution)?);
            console::solution(&work_item.path.display().to_string());
            entries.push(self.process(work_item).await?);
        }

        Ok(entries)
    }

    async fn process(&self, work_item: WorkItem) -> Result<RunEntry> {
        let started_at = Local::now();
        let mut launched: Option<Box<dyn LaunchedProcess>> = None;

        let outcome = match self.attach_or_launch(&work_item, &mut launched).await {
            Ok(handle) => {
                let session = self.automation.attach(&handle);
                self.orchestrator
                    .migrate_solution(session.as_ref(), &work_item)
                    .await
            }
            Err(e) => Err(e),
        };

        let status = match outcome {
            Ok(report) => WorkItemStatus::Completed(report),
            Err(e) if e.is_cancellation() => return Err(e),
            Err(e) => {
                console::failure(&e.to_string());
                tracing::error!(solution = %work_item.path.display(), error = %e, "Solution migration failed");
                WorkItemStatus::Failed {
                    error: e.to_string(),
                }
            }
        };

        let mut entry = RunEntry {
            work_item,
            status,
            launched: launched.is_some(),
            terminated: false,
            started_at,
            finished_at: started_at,
        };

        if let Some(process) = launched.as_mut() {
            if entry.success() {
                entry.terminated = terminate(process.as_mut()).await;
            } else {
                tracing::warn!(pid = ?process.id(), "Leaving IDE running for inspection");
            }
        }

        entry.finished_at = Local::now();
        Ok(entry)
    }

    /// Attach to an IDE that already has the solution open, or start one.
    ///
    /// A started IDE is stored in `launched` before waiting for it, so it is
    /// accounted for even when the wait fails.
    async fn attach_or_launch(
        &self,
        work_item: &WorkItem,
        launched: &mut Option<Box<dyn LaunchedProcess>>,
    ) -> Result<AutomationHandle> {
        let automation = self.automation.as_ref();
        let product_name = self.ide.product_name.as_str();
        let target = work_item.path.as_path();

        if let Some(handle) = find_instance(automation, product_name, Some(target)).await? {
            tracing::info!(instance = %handle.instance, "Attached to running IDE");
            return Ok(handle);
        }

        let process = launched.insert(self.launcher.launch(&self.ide.executable, target).await?);

        let handle = poll_until(
            "IDE to open the solution",
            self.polling.interval(),
            self.polling.launch_max_polls,
            || async move {
                match find_instance(automation, product_name, Some(target)).await {
                    Ok(found) => Ok(found),
                    Err(e) if e.is_cancellation() => Err(e),
                    Err(e) => {
                        tracing::debug!(error = %e, "Instance lookup failed while IDE starts");
                        Ok(None)
                    }
                }
            },
            Option::is_some,
        )
        .await?
        .ok_or_else(|| AppError::Launch("IDE instance disappeared".to_string()))?;

        tracing::info!(instance = %handle.instance, pid = ?process.id(), "Launched IDE is ready");
        Ok(handle)
    }
}

async fn terminate(process: &mut dyn LaunchedProcess) -> bool {
    match process.kill().await {
        Ok(()) => {
            tracing::info!(pid = ?process.id(), "Closed launched IDE");
            true
        }
        Err(e) => {
            tracing::warn!(pid = ?process.id(), error = %e, "Failed to close launched IDE");
            false
        }
    }
}

/// End-of-run overview, one line per solution.
pub fn print_summary(entries: &[RunEntry]) {
    if entries.is_empty() {
        return;
    }

    println!();
    println!("{}", "Summary".bold());
    for entry in entries {
        let seconds = (entry.finished_at - entry.started_at).num_seconds();
        let detail = match &entry.status {
            WorkItemStatus::Completed(report) => {
                let counts = report.counts();
                format!(
                    "{} projects: {} clean, {} with issues, {} not applicable, {} without report, {} failed",
                    report.results.len(),
                    counts.clean,
                    counts.with_issues,
                    counts.not_applicable,
                    counts.timed_out,
                    counts.failed
                )
            }
            WorkItemStatus::Failed { error } => error.clone(),
        };
        let ide = match (entry.launched, entry.terminated) {
            (false, _) => "IDE was already running",
            (true, true) => "IDE closed",
            (true, false) => "IDE left running",
        };
        let line = format!(
            "  {} - {detail} ({ide}, {seconds}s)",
            entry.work_item.path.display()
        );

        if entry.success() {
            println!("{}", line.green());
        } else {
            println!("{}", line.red());
        }
    }
}
