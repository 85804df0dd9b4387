// Copyright 2026 a7mddra
// SPDX-License-Identifier: Apache-2.0

//! Continuous integration driver for the swift project.
//!
//! Configures, builds, checks, installs and packages the tree with qmake and
//! the platform's make, then archives debug symbols where the tool chain
//! supports it.

pub mod cli;
pub mod config;
pub mod env;
pub mod error;
pub mod logging;
pub mod pipeline;
pub mod platform;
pub mod runner;
pub mod tools;
pub mod utils;
pub mod version;

pub use config::{BuildConfig, BuildOptions, SiteConfig, WordSize};
pub use env::BuildEnv;
pub use error::CiError;
pub use pipeline::{Pipeline, Step, Tools};
pub use platform::{Os, PlatformHooks};
pub use version::VersionInfo;
