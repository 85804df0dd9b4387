// Copyright 2026 a7mddra
// SPDX-License-Identifier: Apache-2.0

//! External command execution.

use anyhow::{Context, Result};
use std::ffi::{OsStr, OsString};
use std::fmt;
use std::path::{Path, PathBuf};
use std::process::Command;

use crate::env::BuildEnv;
use crate::error::CiError;

/// A command line plus the directory to run it in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub program: OsString,
    pub args: Vec<OsString>,
    pub cwd: PathBuf,
}

impl Invocation {
    pub fn new(program: impl AsRef<OsStr>, cwd: impl AsRef<Path>) -> Self {
        Self {
            program: program.as_ref().to_os_string(),
            args: Vec::new(),
            cwd: cwd.as_ref().to_path_buf(),
        }
    }

    pub fn arg(mut self, arg: impl AsRef<OsStr>) -> Self {
        self.args.push(arg.as_ref().to_os_string());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        self.args
            .extend(args.into_iter().map(|a| a.as_ref().to_os_string()));
        self
    }
}

impl fmt::Display for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program.to_string_lossy())?;
        for arg in &self.args {
            write!(f, " {}", arg.to_string_lossy())?;
        }
        Ok(())
    }
}

/// Runs invocations to completion. A non-zero exit is an error carrying
/// the child's status.
pub trait CommandRunner {
    fn run(&self, invocation: &Invocation, env: &BuildEnv) -> Result<()>;
}

/// Spawns real processes, blocking until each exits.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemRunner;

impl CommandRunner for SystemRunner {
    fn run(&self, invocation: &Invocation, env: &BuildEnv) -> Result<()> {
        tracing::debug!("Running `{}` in {}", invocation, invocation.cwd.display());

        // Resolve against the build environment's PATH, not ours.
        let program = which::which_in(&invocation.program, env.get("PATH"), &invocation.cwd)
            .with_context(|| {
                format!(
                    "{} not found. Is it installed and on PATH?",
                    invocation.program.to_string_lossy()
                )
            })?;

        let status = Command::new(&program)
            .args(&invocation.args)
            .current_dir(&invocation.cwd)
            .env_clear()
            .envs(env.iter())
            .status()
            .with_context(|| format!("Failed to run {}", program.display()))?;

        if !status.success() {
            return Err(CiError::CommandFailed {
                command: invocation.to_string(),
                code: status.code(),
            }
            .into());
        }

        Ok(())
    }
}
