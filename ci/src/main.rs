// Copyright 2026 a7mddra
// SPDX-License-Identifier: Apache-2.0

//! Usage:
//!   swift-ci -c <config file> -w <32|64> -t <toolchain> [-d]

use std::process::ExitCode;

use swift_ci::{cli, error, logging};

fn main() -> ExitCode {
    let args = cli::Cli::parse_for_host();
    logging::init();

    match cli::run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!("{:#}", err);
            ExitCode::from(u8::try_from(error::exit_code(&err)).unwrap_or(1))
        }
    }
}
