use std::path::{Component, Path, PathBuf};

use crate::error::Result;

/// Make `path` absolute against the working directory and fold `.` and `..`
/// lexically. The path does not need to exist.
pub fn absolute(path: &Path) -> Result<PathBuf> {
    let joined = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()?.join(path)
    };
    Ok(normalize(&joined))
}

pub fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !out.pop() {
                    out.push(component);
                }
            }
            other => out.push(other),
        }
    }
    out
}

/// Case-insensitive path equality, treating `\` and `/` alike.
pub fn eq_ignore_case(a: &Path, b: &Path) -> bool {
    fold(a) == fold(b)
}

pub fn fold(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/").to_lowercase()
}
