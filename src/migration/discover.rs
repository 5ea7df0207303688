//! Finding the projects in a solution that still use packages.config.

use crate::config::MigrationConfig;
use crate::migration::types::ProjectCandidate;
use crate::platform::types::{ProjectKind, ProjectNode};

/// First project item that is the legacy manifest, if any.
///
/// Items are matched on their file name anywhere in the project tree, not
/// only next to the project file.
pub fn manifest_item<'a>(files: &'a [String], manifest_file: &str) -> Option<&'a String> {
    let suffix = format!("/{}", manifest_file.to_lowercase());
    files
        .iter()
        .find(|file| file.replace('\\', "/").to_lowercase().ends_with(&suffix))
}

pub fn is_web_application(node: &ProjectNode, settings: &MigrationConfig) -> bool {
    node.properties
        .iter()
        .any(|name| name == &settings.web_app_property)
}

/// A non-web class library that references the legacy manifest.
pub fn is_eligible(node: &ProjectNode, settings: &MigrationConfig) -> bool {
    node.kind == ProjectKind::CSharpProject
        && manifest_item(&node.files, &settings.manifest_file).is_some()
        && !is_web_application(node, settings)
}

/// Walk the solution's project tree in order, descending into solution folders.
pub fn find_candidates(projects: &[ProjectNode], settings: &MigrationConfig) -> Vec<ProjectCandidate> {
    let mut found = Vec::new();
    for project in projects {
        visit(project, &[], settings, &mut found);
    }
    found
}

fn visit(
    node: &ProjectNode,
    folders: &[String],
    settings: &MigrationConfig,
    found: &mut Vec<ProjectCandidate>,
) {
    if is_eligible(node, settings) {
        let mut solution_path = folders.to_vec();
        solution_path.push(node.name.clone());
        found.push(ProjectCandidate {
            solution_path,
            unique_name: node.unique_name.clone(),
            project: node.id.clone(),
            name: node.name.clone(),
        });
    }

    if node.kind != ProjectKind::SolutionFolder {
        return;
    }

    let mut nested = folders.to_vec();
    nested.push(node.name.clone());
    for child in &node.children {
        if matches!(
            child.kind,
            ProjectKind::CSharpProject | ProjectKind::SolutionFolder
        ) {
            visit(child, &nested, settings, found);
        }
    }
}
