use std::path::{Path, PathBuf};

use async_trait::async_trait;

use crate::error::{AppError, Result};

#[async_trait]
pub trait OperatorPrompt: Send + Sync {
    /// Ask whether a missing manifest has been restored.
    ///
    /// `true` continues with the project, `false` cancels the whole run.
    async fn confirm_manifest_restored(&self, manifest: &Path) -> Result<bool>;
}

/// Terminal prompt for an operator sitting at the console.
pub struct ConsolePrompt;

#[async_trait]
impl OperatorPrompt for ConsolePrompt {
    async fn confirm_manifest_restored(&self, manifest: &Path) -> Result<bool> {
        let manifest: PathBuf = manifest.to_path_buf();

        tokio::task::spawn_blocking(move || {
            let answer = dialoguer::Confirm::new()
                .with_prompt(format!(
                    "{} does not exist. Restore the file and continue? (no aborts the run)",
                    manifest.display()
                ))
                .default(true)
                .interact()?;
            Ok::<bool, AppError>(answer)
        })
        .await
        .map_err(|e| AppError::Prompt(format!("Prompt task panicked: {e}")))?
    }
}
