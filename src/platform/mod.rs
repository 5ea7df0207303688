pub mod bridge;
pub mod launcher;
pub mod types;

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::Result;
use types::*;

/// Registry of running IDE instances.
#[async_trait]
pub trait Automation: Send + Sync {
    /// List every automation object currently registered as running.
    async fn running_instances(&self) -> Result<Vec<InstanceId>>;

    /// Interpret one running object as an IDE instance.
    async fn describe(&self, instance: &InstanceId) -> Result<InstanceDescription>;

    /// Open a session against a located instance.
    fn attach(&self, handle: &AutomationHandle) -> Arc<dyn IdeSession>;
}

/// Object model of one IDE instance and its open solution.
#[async_trait]
pub trait IdeSession: Send + Sync {
    /// Execute a named IDE command against the current selection.
    async fn execute_command(&self, command: &str) -> Result<()>;

    /// Top-level projects of the open solution, with sub-projects of
    /// solution folders populated.
    async fn solution_projects(&self) -> Result<Vec<ProjectNode>>;

    /// Current full paths of a project's items, recursively.
    async fn project_files(&self, project: &ProjectId) -> Result<Vec<String>>;

    async fn save_project(&self, project: &ProjectId) -> Result<()>;

    /// Solution explorer root item by name.
    async fn root_item(&self, name: &str) -> Result<UiItemId>;

    /// Direct child of a solution explorer item by name.
    async fn child_item(&self, parent: &UiItemId, name: &str) -> Result<UiItemId>;

    async fn item_state(&self, item: &UiItemId) -> Result<UiItemState>;

    async fn select_item(&self, item: &UiItemId) -> Result<()>;

    async fn expand_item(&self, item: &UiItemId) -> Result<()>;
}

/// Top-level windows of the desktop session.
#[async_trait]
pub trait WindowSystem: Send + Sync {
    /// First visible top-level window whose title starts with `prefix`.
    async fn find_window(&self, title_prefix: &str) -> Result<Option<WindowHandle>>;

    async fn bring_to_front(&self, window: WindowHandle) -> Result<()>;

    /// Synthesize an Enter keystroke to the foreground window.
    async fn send_confirm_key(&self, window: WindowHandle) -> Result<()>;
}
