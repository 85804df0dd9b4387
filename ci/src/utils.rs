// Copyright 2026 a7mddra
// SPDX-License-Identifier: Apache-2.0

use anyhow::{Context, Result};
use std::env;
use std::path::{Path, PathBuf};

use crate::error::CiError;

/// Marks the top of the source tree.
pub const PROJECT_FILE: &str = "swift.pro";

/// Source root containing `swift.pro`, searched upwards from the current
/// directory.
pub fn project_root() -> Result<PathBuf> {
    let cwd = env::current_dir().context("Failed to read current directory")?;
    find_project_root(&cwd)
}

pub fn find_project_root(start: &Path) -> Result<PathBuf> {
    start
        .ancestors()
        .find(|dir| dir.join(PROJECT_FILE).is_file())
        .map(Path::to_path_buf)
        .ok_or_else(|| {
            CiError::Config(format!(
                "Cannot find {} above {}! Are we in the right directory?",
                PROJECT_FILE,
                start.display()
            ))
            .into()
        })
}

/// Make `path` absolute against the current directory without touching the
/// filesystem.
pub fn absolute(path: &Path) -> Result<PathBuf, CiError> {
    std::path::absolute(path)
        .map_err(|err| CiError::Config(format!("Invalid path {}: {}", path.display(), err)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn finds_root_from_nested_dir() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join(PROJECT_FILE), "").unwrap();
        let nested = dir.path().join("scripts").join("ci");
        fs::create_dir_all(&nested).unwrap();

        assert_eq!(find_project_root(&nested).unwrap(), dir.path());
    }

    #[test]
    fn missing_project_file_is_a_config_error() {
        let dir = TempDir::new().unwrap();
        let err = find_project_root(dir.path()).unwrap_err();
        assert!(err.to_string().contains("Are we in the right directory?"));
        assert_eq!(crate::error::exit_code(&err), 1);
    }
}
