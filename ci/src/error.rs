// Copyright 2026 a7mddra
// SPDX-License-Identifier: Apache-2.0

use std::path::PathBuf;
use thiserror::Error;

/// Failures that decide the process exit status.
///
/// Everything else travels as a plain `anyhow::Error` and exits with 1.
#[derive(Debug, Error)]
pub enum CiError {
    #[error("{0}")]
    Usage(String),

    #[error("Specified config file does not exist: {}", .0.display())]
    MissingConfigFile(PathBuf),

    #[error("Unknown or unsupported tool chain '{toolchain}' on {os} (supported: {supported})")]
    UnsupportedToolchain {
        os: String,
        toolchain: String,
        supported: String,
    },

    #[error("Unsupported operating system '{0}'")]
    UnsupportedOs(String),

    #[error("{0}")]
    Config(String),

    #[error("version file has wrong format at line {line}: {content:?}")]
    VersionFormat { line: usize, content: String },

    #[error("`{command}` {}", describe_status(.code))]
    CommandFailed { command: String, code: Option<i32> },
}

fn describe_status(code: &Option<i32>) -> String {
    match *code {
        Some(code) => format!("exited with status {}", code),
        None => "was terminated by a signal".to_string(),
    }
}

impl CiError {
    pub fn exit_code(&self) -> i32 {
        match self {
            CiError::Usage(_)
            | CiError::MissingConfigFile(_)
            | CiError::UnsupportedToolchain { .. }
            | CiError::UnsupportedOs(_) => 2,
            CiError::Config(_) | CiError::VersionFormat { .. } => 1,
            CiError::CommandFailed { code, .. } => code.filter(|c| *c != 0).unwrap_or(1),
        }
    }
}

/// Exit status for an error bubbling out of `main`.
pub fn exit_code(err: &anyhow::Error) -> i32 {
    err.chain()
        .find_map(|cause| cause.downcast_ref::<CiError>())
        .map(CiError::exit_code)
        .unwrap_or(1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Context;

    #[test]
    fn usage_errors_exit_with_two() {
        let err = anyhow::Error::new(CiError::Usage("bad".into()));
        assert_eq!(exit_code(&err), 2);
    }

    #[test]
    fn command_status_survives_context() {
        let result: anyhow::Result<()> = Err(CiError::CommandFailed {
            command: "make check".into(),
            code: Some(7),
        }
        .into());
        let err = result.context("Running checks").unwrap_err();
        assert_eq!(exit_code(&err), 7);
    }

    #[test]
    fn signalled_commands_exit_with_one() {
        let err = CiError::CommandFailed {
            command: "make".into(),
            code: None,
        };
        assert_eq!(err.exit_code(), 1);
        assert_eq!(err.to_string(), "`make` was terminated by a signal");
    }

    #[test]
    fn unrelated_errors_exit_with_one() {
        assert_eq!(exit_code(&anyhow::anyhow!("boom")), 1);
    }
}
