use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

pub const SOLUTION_FOLDER_KIND: &str = "{66A26720-8FB5-11D2-AA7E-00C04F688DDE}";
pub const CSHARP_PROJECT_KIND: &str = "{FAE04EC0-301F-11D3-BF4B-00C04F79EFBC}";

/// Opaque id of a running IDE instance as known to the automation host.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InstanceId(pub String);

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProjectId(pub String);

/// A node of the solution explorer tree.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UiItemId(pub String);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WindowHandle(pub u64);

impl fmt::Display for InstanceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// What a running instance reports about itself.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct InstanceDescription {
    pub product_name: String,
    /// Full path of the open solution, if any.
    pub open_solution: Option<PathBuf>,
}

/// A live reference to one running IDE instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AutomationHandle {
    pub instance: InstanceId,
    pub description: InstanceDescription,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(from = "String")]
pub enum ProjectKind {
    SolutionFolder,
    CSharpProject,
    Other(String),
}

impl From<String> for ProjectKind {
    fn from(guid: String) -> Self {
        if guid.eq_ignore_ascii_case(SOLUTION_FOLDER_KIND) {
            ProjectKind::SolutionFolder
        } else if guid.eq_ignore_ascii_case(CSHARP_PROJECT_KIND) {
            ProjectKind::CSharpProject
        } else {
            ProjectKind::Other(guid)
        }
    }
}

/// Snapshot of one project in the solution's project tree.
#[derive(Debug, Clone, Deserialize)]
pub struct ProjectNode {
    pub id: ProjectId,
    pub name: String,
    pub kind: ProjectKind,
    /// Project file path relative to the solution directory.
    #[serde(default)]
    pub unique_name: String,
    /// Names of the project's properties.
    #[serde(default)]
    pub properties: Vec<String>,
    /// Full paths of all project items, folders included, recursively.
    #[serde(default)]
    pub files: Vec<String>,
    /// Sub-projects, populated for solution folders.
    #[serde(default)]
    pub children: Vec<ProjectNode>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct UiItemState {
    pub child_count: usize,
    pub is_solution_folder: bool,
}
