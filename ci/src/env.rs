// Copyright 2026 a7mddra
// SPDX-License-Identifier: Apache-2.0

//! Environment handed to every child process of a build.
//!
//! Seeded once from the process environment, adjusted by the prepare step
//! and passed explicitly to each command. The process environment itself is
//! never modified.

use anyhow::{Context, Result};
use std::collections::BTreeMap;
use std::env;
use std::ffi::{OsStr, OsString};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildEnv {
    vars: BTreeMap<OsString, OsString>,
}

/// Variable names are case-insensitive on Windows (`Path` vs `PATH`).
fn normalize(name: &OsStr) -> OsString {
    if cfg!(windows) {
        name.to_string_lossy().to_uppercase().into()
    } else {
        name.to_os_string()
    }
}

impl BuildEnv {
    pub fn from_process() -> Self {
        env::vars_os().collect()
    }

    pub fn get(&self, name: impl AsRef<OsStr>) -> Option<&OsStr> {
        self.vars.get(&normalize(name.as_ref())).map(OsString::as_os_str)
    }

    pub fn set(&mut self, name: impl AsRef<OsStr>, value: impl Into<OsString>) {
        let name = normalize(name.as_ref());
        let value = value.into();
        tracing::debug!("{} = {}", name.to_string_lossy(), value.to_string_lossy());
        self.vars.insert(name, value);
    }

    /// Entries of a path list variable, empty if unset.
    pub fn paths(&self, name: impl AsRef<OsStr>) -> Vec<PathBuf> {
        self.get(name)
            .map(|value| env::split_paths(value).collect())
            .unwrap_or_default()
    }

    /// Put `dir` in front of the path list in `name`.
    pub fn prepend_path(&mut self, name: impl AsRef<OsStr>, dir: impl AsRef<Path>) -> Result<()> {
        let name = name.as_ref();
        let mut paths = vec![dir.as_ref().to_path_buf()];
        paths.extend(self.paths(name));
        self.set_paths(name, paths)
    }

    /// Append `dir` to the path list in `name`.
    pub fn append_path(&mut self, name: impl AsRef<OsStr>, dir: impl AsRef<Path>) -> Result<()> {
        let name = name.as_ref();
        let mut paths = self.paths(name);
        paths.push(dir.as_ref().to_path_buf());
        self.set_paths(name, paths)
    }

    /// Replace `name` with exactly `paths`.
    pub fn set_paths<I, P>(&mut self, name: impl AsRef<OsStr>, paths: I) -> Result<()>
    where
        I: IntoIterator<Item = P>,
        P: AsRef<OsStr>,
    {
        let name = name.as_ref();
        let joined = env::join_paths(paths)
            .with_context(|| format!("Invalid entry for {}", name.to_string_lossy()))?;
        self.set(name, joined);
        Ok(())
    }

    /// Overlay `vars`, e.g. a captured toolchain environment.
    pub fn merge<K, V>(&mut self, vars: impl IntoIterator<Item = (K, V)>)
    where
        K: AsRef<OsStr>,
        V: Into<OsString>,
    {
        for (name, value) in vars {
            self.set(name, value);
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&OsStr, &OsStr)> {
        self.vars.iter().map(|(k, v)| (k.as_os_str(), v.as_os_str()))
    }
}

impl<K: AsRef<OsStr>, V: Into<OsString>> FromIterator<(K, V)> for BuildEnv {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        let mut env = BuildEnv::default();
        env.vars
            .extend(iter.into_iter().map(|(k, v)| (normalize(k.as_ref()), v.into())));
        env
    }
}
