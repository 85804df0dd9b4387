// Copyright 2026 a7mddra
// SPDX-License-Identifier: Apache-2.0

use anyhow::Result;
use clap::{CommandFactory, FromArgMatches, Parser};
use std::path::PathBuf;

use crate::config::{BuildConfig, BuildOptions, WordSize};
use crate::env::BuildEnv;
use crate::pipeline::{Pipeline, Tools};
use crate::platform::{self, Os};
use crate::runner::SystemRunner;
use crate::tools::{BreakpadDumper, VcVarsAll};
use crate::utils;

#[derive(Parser, Debug, Clone, PartialEq, Eq)]
#[command(name = "swift-ci")]
#[command(about = "Build, check, install and package swift on a CI node")]
pub struct Cli {
    /// INI file with Qt and tool locations [default: <source>/scripts/jenkins.cfg]
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Target word size
    #[arg(short, long, value_name = "32|64", value_parser = WordSize::parse)]
    pub wordsize: WordSize,

    /// Tool chain to build with
    #[arg(short, long, value_name = "TOOLCHAIN")]
    pub toolchain: String,

    /// Configure as a development branch build
    #[arg(short, long)]
    pub dev: bool,
}

impl Cli {
    /// Parse `std::env::args`, listing the host's tool chains in `--help`.
    /// Exits with status 2 on usage errors.
    pub fn parse_for_host() -> Self {
        let help = match Os::current() {
            Ok(os) => format!(
                "Supported tool chains on {}: {}",
                os,
                platform::supported_toolchains(os).join("|")
            ),
            Err(err) => err.to_string(),
        };

        let matches = Self::command().after_help(help).get_matches();
        Self::from_arg_matches(&matches).unwrap_or_else(|err| err.exit())
    }

    pub fn options(&self) -> BuildOptions {
        BuildOptions {
            config_file: self.config.clone(),
            word_size: self.wordsize,
            dev_build: self.dev,
        }
    }
}

/// Resolve the host platform and configuration, then run the pipeline.
pub fn run(cli: Cli) -> Result<()> {
    let os = Os::current()?;
    let hooks = platform::select(os, &cli.toolchain)?;
    let source_root = utils::project_root()?;
    let config = BuildConfig::load(&cli.options(), os, &source_root)?;

    tracing::info!(
        "Building swift {} for {} {}-bit with {}{}",
        config.version,
        os,
        config.word_size,
        hooks.toolchain,
        if config.dev_build { " (dev branch)" } else { "" }
    );

    let tools = Tools {
        runner: &SystemRunner,
        symbols: &BreakpadDumper,
        vs_env: &VcVarsAll,
    };
    Pipeline::new(&config, hooks, BuildEnv::from_process(), tools).run()
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::error::ErrorKind;

    #[test]
    fn parses_short_flags() {
        let args = ["swift-ci", "-c", "ci.cfg", "-w", "64", "-t", "gcc", "-d"];
        let cli = Cli::try_parse_from(args).unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("ci.cfg")));
        assert_eq!(cli.wordsize, WordSize::Bits64);
        assert_eq!(cli.toolchain, "gcc");
        assert!(cli.dev);
    }

    #[test]
    fn parses_long_flags() {
        let args = ["swift-ci", "--wordsize", "32", "--toolchain", "mingw"];
        let cli = Cli::try_parse_from(args).unwrap();
        assert_eq!(cli.config, None);
        assert_eq!(cli.wordsize, WordSize::Bits32);
        assert!(!cli.dev);
        assert_eq!(
            cli.options(),
            BuildOptions {
                config_file: None,
                word_size: WordSize::Bits32,
                dev_build: false,
            }
        );
    }

    #[test]
    fn bad_word_size_is_a_usage_error() {
        let err = Cli::try_parse_from(["swift-ci", "-w", "16", "-t", "gcc"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ValueValidation);
        assert_eq!(err.exit_code(), 2);
        assert!(err.to_string().contains("Choose 32 or 64"));
    }

    #[test]
    fn missing_toolchain_is_a_usage_error() {
        let err = Cli::try_parse_from(["swift-ci", "-w", "64"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MissingRequiredArgument);
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn unknown_flag_is_a_usage_error() {
        let err = Cli::try_parse_from(["swift-ci", "-w", "64", "-t", "gcc", "--fast"]).unwrap_err();
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }
}
