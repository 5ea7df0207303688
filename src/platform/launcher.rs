use std::path::Path;

use async_trait::async_trait;
use tokio::process::{Child, Command};

use crate::error::{AppError, Result};

#[async_trait]
pub trait ProcessLauncher: Send + Sync {
    /// Start the IDE with `solution` as its only argument.
    async fn launch(&self, executable: &Path, solution: &Path) -> Result<Box<dyn LaunchedProcess>>;
}

/// An IDE process started by this run. Only these are ever terminated.
#[async_trait]
pub trait LaunchedProcess: Send {
    fn id(&self) -> Option<u32>;

    async fn kill(&mut self) -> Result<()>;
}

pub struct TokioLauncher;

#[async_trait]
impl ProcessLauncher for TokioLauncher {
    async fn launch(&self, executable: &Path, solution: &Path) -> Result<Box<dyn LaunchedProcess>> {
        let child = Command::new(executable)
            .arg(solution)
            .spawn()
            .map_err(|e| AppError::Launch(format!("{}: {e}", executable.display())))?;

        tracing::info!(
            executable = %executable.display(),
            solution = %solution.display(),
            pid = ?child.id(),
            "Launched IDE"
        );

        Ok(Box::new(TokioProcess { child }))
    }
}

struct TokioProcess {
    child: Child,
}

#[async_trait]
impl LaunchedProcess for TokioProcess {
    fn id(&self) -> Option<u32> {
        self.child.id()
    }

    async fn kill(&mut self) -> Result<()> {
        self.child.kill().await?;
        Ok(())
    }
}
