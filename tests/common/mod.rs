//! In-memory IDE, window system and process fakes for end-to-end tests.
//!
//! The fake IDE behaves like the real migration feature as far as the
//! orchestrator can observe it: running the migrate command opens a dialog,
//! confirming the dialog writes a backup folder with a report and removes the
//! project's packages.config.

#![allow(dead_code)]

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tempfile::TempDir;

use pkgref_migrate::config::AppConfig;
use pkgref_migrate::error::{AppError, Result};
use pkgref_migrate::migration::{Orchestrator, WorkItem};
use pkgref_migrate::platform::launcher::{LaunchedProcess, ProcessLauncher};
use pkgref_migrate::platform::types::*;
use pkgref_migrate::platform::{Automation, IdeSession, WindowSystem};
use pkgref_migrate::prompt::OperatorPrompt;

pub const CLEAN_REPORT: &str = "<html><body>No issues were found.</body></html>";
pub const ISSUES_REPORT: &str = "<html><body>1 issue: install.ps1 script ignored</body></html>";
pub const VS: &str = "Microsoft Visual Studio";

/// How the fake IDE treats one project.
#[derive(Clone, Default)]
pub struct Behavior {
    /// Report written on migration; `None` writes no report.
    pub report: Option<&'static str>,
    /// Item list returned by the re-check instead of the enumeration snapshot.
    pub recheck_files: Option<Vec<String>>,
    /// The migrate command is rejected.
    pub fail_migrate: bool,
}

#[derive(Default)]
pub struct IdeState {
    pub selected: Option<String>,
    pub commands: Vec<String>,
    pub saved: Vec<ProjectId>,
    pub backups: u32,
    pub dialog: Option<String>,
    /// Remaining transient failures per method name.
    pub flaky: HashMap<&'static str, u32>,
}

pub struct FakeIde {
    pub solution_dir: PathBuf,
    pub solution_name: String,
    pub projects: Vec<ProjectNode>,
    pub behaviors: HashMap<String, Behavior>,
    pub state: Mutex<IdeState>,
}

/// A solution on disk plus the IDE that has it open.
pub struct Fixture {
    pub dir: TempDir,
    pub work_item: WorkItem,
    pub ide: Arc<FakeIde>,
}

pub struct SolutionBuilder {
    dir: TempDir,
    projects: Vec<ProjectNode>,
    behaviors: HashMap<String, Behavior>,
}

impl SolutionBuilder {
    pub fn new() -> Self {
        Self {
            dir: TempDir::new().expect("temp dir"),
            projects: Vec::new(),
            behaviors: HashMap::new(),
        }
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    /// A class library with packages.config on disk.
    pub fn library(mut self, name: &str, behavior: Behavior) -> Self {
        let node = self.library_node(name);
        self.projects.push(node);
        self.behaviors.insert(name.to_string(), behavior);
        self
    }

    /// A solution folder holding one class library.
    pub fn folder_with_library(mut self, folder: &str, name: &str, behavior: Behavior) -> Self {
        let child = self.library_node(name);
        self.projects.push(ProjectNode {
            id: ProjectId(format!("folder:{folder}")),
            name: folder.to_string(),
            kind: ProjectKind::SolutionFolder,
            unique_name: folder.to_string(),
            properties: Vec::new(),
            files: Vec::new(),
            children: vec![child],
        });
        self.behaviors.insert(name.to_string(), behavior);
        self
    }

    pub fn manifest_path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name).join("packages.config")
    }

    fn library_node(&self, name: &str) -> ProjectNode {
        let project_dir = self.dir.path().join(name);
        fs::create_dir_all(&project_dir).expect("project dir");
        fs::write(project_dir.join("packages.config"), "<packages />").expect("manifest");

        ProjectNode {
            id: ProjectId(name.to_lowercase()),
            name: name.to_string(),
            kind: ProjectKind::CSharpProject,
            unique_name: format!("{name}\\{name}.csproj"),
            properties: vec!["AssemblyName".to_string()],
            files: vec![
                project_dir.join("Class1.cs").display().to_string(),
                project_dir.join("packages.config").display().to_string(),
            ],
            children: Vec::new(),
        }
    }

    pub fn build(self) -> Fixture {
        let path = self.dir.path().join("Shop.sln");
        fs::write(&path, "Microsoft Visual Studio Solution File").expect("sln");
        let ide = Arc::new(FakeIde {
            solution_dir: self.dir.path().to_path_buf(),
            solution_name: "Shop".to_string(),
            projects: self.projects,
            behaviors: self.behaviors,
            state: Mutex::new(IdeState::default()),
        });
        Fixture {
            dir: self.dir,
            work_item: WorkItem::new(path),
            ide,
        }
    }
}

impl FakeIde {
    pub fn state(&self) -> std::sync::MutexGuard<'_, IdeState> {
        self.state.lock().unwrap()
    }

    pub fn fail_next(&self, method: &'static str, times: u32) {
        self.state().flaky.insert(method, times);
    }

    fn transient(&self, method: &'static str) -> Result<()> {
        let mut state = self.state();
        match state.flaky.get_mut(method) {
            Some(remaining) if *remaining > 0 => {
                *remaining -= 1;
                Err(AppError::Automation(format!(
                    "{method}: Call was rejected by callee."
                )))
            }
            _ => Ok(()),
        }
    }

    fn find_node(&self, id: &ProjectId) -> Option<&ProjectNode> {
        fn walk<'a>(nodes: &'a [ProjectNode], id: &ProjectId) -> Option<&'a ProjectNode> {
            nodes.iter().find_map(|node| {
                if &node.id == id {
                    Some(node)
                } else {
                    walk(&node.children, id)
                }
            })
        }
        walk(&self.projects, id)
    }

    /// Tree node behind a solution explorer path, `None` for the solution root.
    fn node_at(&self, item: &UiItemId) -> Option<&ProjectNode> {
        let mut segments = item.0.split('\\').skip(1);
        let first = segments.next()?;
        let mut node = self.projects.iter().find(|n| n.name == first)?;
        for segment in segments {
            node = node.children.iter().find(|n| n.name == segment)?;
        }
        Some(node)
    }

    /// What the IDE does once the migration dialog is confirmed.
    fn run_migration(&self, item: &str) {
        let relative: PathBuf = item.split('\\').skip(1).collect();
        let name = item.rsplit('\\').next().unwrap_or_default().to_string();
        let behavior = self.behaviors.get(&name).cloned().unwrap_or_default();

        let backup = {
            let mut state = self.state();
            state.backups += 1;
            state.backups
        };

        if let Some(content) = behavior.report {
            let dir = self
                .solution_dir
                .join("MigrationBackup")
                .join(format!("backup-{backup}"))
                .join(&relative);
            fs::create_dir_all(&dir).unwrap();
            fs::write(dir.join("NuGetUpgradeLog.html"), content).unwrap();
        }

        let _ = fs::remove_file(self.solution_dir.join(&name).join("packages.config"));
    }
}

#[async_trait]
impl IdeSession for FakeIde {
    async fn execute_command(&self, command: &str) -> Result<()> {
        self.transient("execute_command")?;
        let mut state = self.state();
        state.commands.push(command.to_string());

        if command == AppConfig::default().migration.migrate_command {
            let selected = state.selected.clone().unwrap_or_default();
            let name = selected.rsplit('\\').next().unwrap_or_default();
            if self
                .behaviors
                .get(name)
                .map(|b| b.fail_migrate)
                .unwrap_or(false)
            {
                return Err(AppError::Automation(format!(
                    "Command is not available for {name}"
                )));
            }
            state.dialog = Some(selected);
        }
        Ok(())
    }

    async fn solution_projects(&self) -> Result<Vec<ProjectNode>> {
        self.transient("solution_projects")?;
        Ok(self.projects.clone())
    }

    async fn project_files(&self, project: &ProjectId) -> Result<Vec<String>> {
        self.transient("project_files")?;
        let node = self
            .find_node(project)
            .ok_or_else(|| AppError::Automation(format!("unknown project {}", project.0)))?;
        let behavior = self.behaviors.get(&node.name).cloned().unwrap_or_default();
        Ok(behavior.recheck_files.unwrap_or_else(|| node.files.clone()))
    }

    async fn save_project(&self, project: &ProjectId) -> Result<()> {
        self.transient("save_project")?;
        self.state().saved.push(project.clone());
        Ok(())
    }

    async fn root_item(&self, name: &str) -> Result<UiItemId> {
        self.transient("root_item")?;
        if name != self.solution_name {
            return Err(AppError::Automation(format!("no root item {name}")));
        }
        Ok(UiItemId(name.to_string()))
    }

    async fn child_item(&self, parent: &UiItemId, name: &str) -> Result<UiItemId> {
        let item = UiItemId(format!("{}\\{}", parent.0, name));
        self.node_at(&item)
            .ok_or_else(|| AppError::Automation(format!("no child {name} under {}", parent.0)))?;
        Ok(item)
    }

    async fn item_state(&self, item: &UiItemId) -> Result<UiItemState> {
        Ok(match self.node_at(item) {
            None => UiItemState {
                child_count: self.projects.len(),
                is_solution_folder: false,
            },
            Some(node) => UiItemState {
                child_count: node.children.len(),
                is_solution_folder: node.kind == ProjectKind::SolutionFolder,
            },
        })
    }

    async fn select_item(&self, item: &UiItemId) -> Result<()> {
        self.state().selected = Some(item.0.clone());
        Ok(())
    }

    async fn expand_item(&self, _item: &UiItemId) -> Result<()> {
        Ok(())
    }
}

#[async_trait]
impl WindowSystem for FakeIde {
    async fn find_window(&self, title_prefix: &str) -> Result<Option<WindowHandle>> {
        assert_eq!(title_prefix, "Migrate NuGet format to PackageReference - ");
        Ok(self.state().dialog.as_ref().map(|_| WindowHandle(42)))
    }

    async fn bring_to_front(&self, window: WindowHandle) -> Result<()> {
        assert_eq!(window, WindowHandle(42));
        Ok(())
    }

    async fn send_confirm_key(&self, _window: WindowHandle) -> Result<()> {
        let item = self.state().dialog.take();
        if let Some(item) = item {
            self.run_migration(&item);
        }
        Ok(())
    }
}

pub struct FakePrompt {
    pub answer: bool,
    pub asked: Mutex<Vec<PathBuf>>,
}

impl FakePrompt {
    pub fn answering(answer: bool) -> Arc<Self> {
        Arc::new(Self {
            answer,
            asked: Mutex::new(Vec::new()),
        })
    }
}

#[async_trait]
impl OperatorPrompt for FakePrompt {
    async fn confirm_manifest_restored(&self, manifest: &Path) -> Result<bool> {
        self.asked.lock().unwrap().push(manifest.to_path_buf());
        Ok(self.answer)
    }
}

pub fn orchestrator(ide: &Arc<FakeIde>, prompt: Arc<FakePrompt>) -> Orchestrator {
    Orchestrator::new(&AppConfig::default(), ide.clone(), prompt)
}

/// Running-object registry; an instance can be scheduled to appear only
/// after a number of scans, like an IDE that is still starting.
pub struct FakeRegistry {
    pub ide: Arc<FakeIde>,
    pub instances: Mutex<Vec<(InstanceId, InstanceDescription)>>,
    pub pending: Mutex<Option<(u32, InstanceId, InstanceDescription)>>,
    pub scans: AtomicUsize,
}

impl FakeRegistry {
    pub fn new(ide: Arc<FakeIde>) -> Arc<Self> {
        Arc::new(Self {
            ide,
            instances: Mutex::new(Vec::new()),
            pending: Mutex::new(None),
            scans: AtomicUsize::new(0),
        })
    }

    pub fn add(&self, id: &str, solution: Option<&Path>) {
        self.instances
            .lock()
            .unwrap()
            .push((InstanceId(id.to_string()), description(solution)));
    }

    pub fn appear_after(&self, scans: u32, id: &str, solution: &Path) {
        *self.pending.lock().unwrap() =
            Some((scans, InstanceId(id.to_string()), description(Some(solution))));
    }
}

fn description(solution: Option<&Path>) -> InstanceDescription {
    InstanceDescription {
        product_name: VS.to_string(),
        open_solution: solution.map(Path::to_path_buf),
    }
}

#[async_trait]
impl Automation for FakeRegistry {
    async fn running_instances(&self) -> Result<Vec<InstanceId>> {
        self.scans.fetch_add(1, Ordering::SeqCst);

        let mut pending = self.pending.lock().unwrap();
        if let Some((remaining, _, _)) = pending.as_mut() {
            *remaining = remaining.saturating_sub(1);
            if *remaining == 0 {
                if let Some((_, id, desc)) = pending.take() {
                    self.instances.lock().unwrap().push((id, desc));
                }
            }
        }

        Ok(self
            .instances
            .lock()
            .unwrap()
            .iter()
            .map(|(id, _)| id.clone())
            .collect())
    }

    async fn describe(&self, instance: &InstanceId) -> Result<InstanceDescription> {
        self.instances
            .lock()
            .unwrap()
            .iter()
            .find(|(id, _)| id == instance)
            .map(|(_, desc)| desc.clone())
            .ok_or_else(|| AppError::Automation("object is not an IDE".to_string()))
    }

    fn attach(&self, _handle: &AutomationHandle) -> Arc<dyn IdeSession> {
        self.ide.clone()
    }
}

/// Launcher whose IDE registers itself after a few registry scans.
pub struct FakeLauncher {
    pub registry: Arc<FakeRegistry>,
    pub ready_after_scans: u32,
    pub launches: Mutex<Vec<(PathBuf, PathBuf)>>,
    pub kills: Arc<AtomicUsize>,
}

impl FakeLauncher {
    pub fn new(registry: Arc<FakeRegistry>, ready_after_scans: u32) -> Arc<Self> {
        Arc::new(Self {
            registry,
            ready_after_scans,
            launches: Mutex::new(Vec::new()),
            kills: Arc::new(AtomicUsize::new(0)),
        })
    }

    pub fn kill_count(&self) -> usize {
        self.kills.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ProcessLauncher for FakeLauncher {
    async fn launch(&self, executable: &Path, solution: &Path) -> Result<Box<dyn LaunchedProcess>> {
        self.launches
            .lock()
            .unwrap()
            .push((executable.to_path_buf(), solution.to_path_buf()));
        self.registry
            .appear_after(self.ready_after_scans, "launched", solution);
        Ok(Box::new(FakeProcess {
            kills: self.kills.clone(),
        }))
    }
}

struct FakeProcess {
    kills: Arc<AtomicUsize>,
}

#[async_trait]
impl LaunchedProcess for FakeProcess {
    fn id(&self) -> Option<u32> {
        Some(4242)
    }

    async fn kill(&mut self) -> Result<()> {
        self.kills.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
