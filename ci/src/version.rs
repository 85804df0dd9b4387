// Copyright 2026 a7mddra
// SPDX-License-Identifier: Apache-2.0

//! Reads the project version out of `mkspecs/features/version.pri`.

use anyhow::{Context, Result};
use std::fmt;
use std::fs;
use std::path::Path;

use crate::error::CiError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionInfo {
    pub major: String,
    pub minor: String,
    pub micro: String,
}

impl Default for VersionInfo {
    fn default() -> Self {
        Self {
            major: "0".to_string(),
            minor: "0".to_string(),
            micro: "0".to_string(),
        }
    }
}

impl VersionInfo {
    pub fn from_file(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("Failed to read version file {}", path.display()))?;
        let version = Self::parse(&text)
            .with_context(|| format!("{} has wrong format", path.display()))?;
        tracing::debug!("Read version {} from {}", version, path.display());
        Ok(version)
    }

    /// Parse `KEY = VALUE` lines. Whitespace is ignored everywhere, unknown
    /// keys are skipped and missing components stay `0`. Every line, blank
    /// ones included, must hold exactly one `=`.
    pub fn parse(text: &str) -> Result<Self, CiError> {
        let mut version = Self::default();

        for (index, raw) in text.lines().enumerate() {
            let line: String = raw.chars().filter(|c| !c.is_whitespace()).collect();
            let mut tokens = line.split('=');
            let (key, value) = match (tokens.next(), tokens.next(), tokens.next()) {
                (Some(key), Some(value), None) => (key, value),
                _ => {
                    return Err(CiError::VersionFormat {
                        line: index + 1,
                        content: raw.to_string(),
                    })
                }
            };

            match key {
                "BLACK_VER_MAJ" => version.major = value.to_string(),
                "BLACK_VER_MIN" => version.minor = value.to_string(),
                "BLACK_VER_MIC" => version.micro = value.to_string(),
                _ => {}
            }
        }

        Ok(version)
    }
}

impl fmt::Display for VersionInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.micro)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use tempfile::TempDir;

    #[test]
    fn reads_all_three_components() {
        let text = "BLACK_VER_MAJ = 1\nBLACK_VER_MIN = 2\nBLACK_VER_MIC = 3\n";
        assert_eq!(VersionInfo::parse(text).unwrap().to_string(), "1.2.3");
    }

    #[test]
    fn order_and_spacing_do_not_matter() {
        let text = "  BLACK_VER_MIC=3\nBLACK_VER_MAJ   =\t1  \n BLACK_VER_MIN= 2";
        assert_eq!(VersionInfo::parse(text).unwrap().to_string(), "1.2.3");
    }

    #[test]
    fn unknown_keys_are_ignored() {
        let text = "BLACK_VER_MAJ=0\nBLACK_VER_MIN=8\nBLACK_VER_MIC=4\nBLACK_VER_BUILD=77\n";
        assert_eq!(VersionInfo::parse(text).unwrap().to_string(), "0.8.4");
    }

    #[rstest]
    #[case("BLACK_VER_MIN=2\nBLACK_VER_MIC=3", "0.2.3")]
    #[case("BLACK_VER_MAJ=1\nBLACK_VER_MIC=3", "1.0.3")]
    #[case("BLACK_VER_MAJ=1\nBLACK_VER_MIN=2", "1.2.0")]
    #[case("", "0.0.0")]
    fn missing_components_default_to_zero(#[case] text: &str, #[case] expected: &str) {
        assert_eq!(VersionInfo::parse(text).unwrap().to_string(), expected);
    }

    #[rstest]
    #[case("BLACK_VER_MAJ=1\nBLACK_VER_MIN\n", 2)]
    #[case("BLACK_VER_MAJ=1=2\n", 1)]
    #[case("BLACK_VER_MAJ=1\n\nBLACK_VER_MIN=2\n", 2)]
    #[case("\n", 1)]
    #[case("BLACK_VER_MAJ=1\n   \n", 2)]
    #[case("BLACK_VER_MAJ=1\nBLACK_VER_MIN=2\nCONFIG += c++14 = x\n", 3)]
    fn wrong_token_count_is_a_format_error(#[case] text: &str, #[case] bad_line: usize) {
        match VersionInfo::parse(text) {
            Err(CiError::VersionFormat { line, .. }) => assert_eq!(line, bad_line),
            other => panic!("expected a format error, got {:?}", other),
        }
    }

    #[test]
    fn from_file_names_the_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("version.pri");
        fs::write(&path, "BLACK_VER_MAJ\n").unwrap();

        let err = VersionInfo::from_file(&path).unwrap_err();
        assert!(format!("{:#}", err).contains("version.pri has wrong format"));
        assert_eq!(crate::error::exit_code(&err), 1);
    }

    #[test]
    fn missing_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        assert!(VersionInfo::from_file(&dir.path().join("version.pri")).is_err());
    }
}
