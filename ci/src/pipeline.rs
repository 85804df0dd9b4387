// Copyright 2026 a7mddra
// SPDX-License-Identifier: Apache-2.0

//! The build pipeline.
//!
//! Runs prepare, build, checks, install, package and symbols in that order.
//! Platform differences come from [`PlatformHooks`]; the first failing
//! command stops the run.

use anyhow::{Context, Result};
use std::ffi::OsString;
use std::fmt;
use std::fs;
use std::path::Path;

use crate::config::{BuildConfig, WordSize};
use crate::env::BuildEnv;
use crate::platform::{MakeCommand, PlatformHooks, Toolchain};
use crate::runner::{CommandRunner, Invocation};
use crate::tools::{SymbolDumper, VsEnvProvider};

const VS_TOOLSET: &str = "14.0";
const SYSTEM_LIB_DIR: &str = "/usr/lib/x86_64-linux-gnu";
const SSL_LIBS: [(&str, &str); 2] = [
    ("libssl.so", "libssl.so.1.0.2"),
    ("libcrypto.so", "libcrypto.so.1.0.2"),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Prepare,
    Build,
    Checks,
    Install,
    Package,
    Symbols,
}

impl Step {
    pub const ALL: [Step; 6] = [
        Step::Prepare,
        Step::Build,
        Step::Checks,
        Step::Install,
        Step::Package,
        Step::Symbols,
    ];
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Step::Prepare => "prepare",
            Step::Build => "build",
            Step::Checks => "checks",
            Step::Install => "install",
            Step::Package => "package",
            Step::Symbols => "symbols",
        })
    }
}

/// External collaborators the pipeline calls out to.
#[derive(Clone, Copy)]
pub struct Tools<'a> {
    pub runner: &'a dyn CommandRunner,
    pub symbols: &'a dyn SymbolDumper,
    pub vs_env: &'a dyn VsEnvProvider,
}

pub struct Pipeline<'a> {
    config: &'a BuildConfig,
    hooks: PlatformHooks,
    env: BuildEnv,
    tools: Tools<'a>,
}

impl<'a> Pipeline<'a> {
    pub fn new(
        config: &'a BuildConfig,
        hooks: PlatformHooks,
        env: BuildEnv,
        tools: Tools<'a>,
    ) -> Self {
        Self {
            config,
            hooks,
            env,
            tools,
        }
    }

    pub fn env(&self) -> &BuildEnv {
        &self.env
    }

    /// Run every step in order.
    pub fn run(&mut self) -> Result<()> {
        for step in Step::ALL {
            self.run_step(step)
                .with_context(|| format!("{} step failed", step))?;
        }
        tracing::info!("Build of swift {} finished", self.config.version);
        Ok(())
    }

    pub fn run_step(&mut self, step: Step) -> Result<()> {
        match step {
            Step::Prepare => self.prepare(),
            Step::Build => self.build(),
            Step::Checks => self.checks(),
            Step::Install => self.install(),
            Step::Package => self.package_xswiftbus(),
            Step::Symbols => self.symbols(),
        }
    }

    /// Set up the environment every later command runs with.
    pub fn prepare(&mut self) -> Result<()> {
        tracing::info!("Preparing environment ...");
        let qt_bin = self.config.qt_binary_dir(&self.hooks);
        self.env.prepend_path("PATH", &qt_bin)?;

        match self.hooks.toolchain {
            Toolchain::Msvc => self.prepare_msvc(),
            Toolchain::Mingw => self.prepare_mingw(),
            Toolchain::Gcc => self.prepare_linux(),
            Toolchain::Clang => self.prepare_macos(),
        }
    }

    fn prepare_msvc(&mut self) -> Result<()> {
        self.env
            .append_path("PATH", self.config.externals_dir(&self.hooks))?;
        self.env.append_path("PATH", self.config.seven_zip_dir())?;

        let arch = match self.config.word_size {
            WordSize::Bits64 => "amd64",
            WordSize::Bits32 => "x86",
        };
        let vars = self
            .tools
            .vs_env
            .vs_env(VS_TOOLSET, arch, &self.env)
            .with_context(|| format!("Failed to load Visual Studio {} environment", VS_TOOLSET))?;
        self.env.merge(vars);
        Ok(())
    }

    fn prepare_mingw(&mut self) -> Result<()> {
        let mingw = self.config.site.mingw_path.as_ref().with_context(|| {
            format!("No option 'mingw_path' in section: '{}'", self.config.os)
        })?;

        self.env
            .append_path("PATH", self.config.externals_dir(&self.hooks))?;
        self.env.append_path("PATH", mingw)?;
        self.env.append_path("PATH", self.config.seven_zip_dir())?;
        Ok(())
    }

    fn prepare_linux(&mut self) -> Result<()> {
        let lib_dir = self.config.source_root.join("lib");
        self.env.set_paths(
            "LD_LIBRARY_PATH",
            [
                self.config.output_dir().join("release").join("lib"),
                lib_dir.clone(),
                self.config.externals_dir(&self.hooks),
            ],
        )?;

        fs::create_dir_all(&lib_dir)
            .with_context(|| format!("Failed to create {}", lib_dir.display()))?;
        for (link, target) in SSL_LIBS {
            let link = lib_dir.join(link);
            // symlink_metadata so a dangling link counts as present
            if link.symlink_metadata().is_err() {
                let target = Path::new(SYSTEM_LIB_DIR).join(target);
                tracing::debug!("Linking {} -> {}", link.display(), target.display());
                symlink(&target, &link)?;
            }
        }
        Ok(())
    }

    fn prepare_macos(&mut self) -> Result<()> {
        self.env.set_paths(
            "LD_LIBRARY_PATH",
            [
                self.config.output_dir().join("release").join("lib"),
                self.config.externals_dir(&self.hooks),
            ],
        )
    }

    /// qmake, then make with one job per CPU.
    pub fn build(&mut self) -> Result<()> {
        tracing::info!("Running build ...");
        let build_root = &self.config.build_root;
        fs::create_dir_all(build_root)
            .with_context(|| format!("Failed to create {}", build_root.display()))?;

        let mut qmake = Invocation::new("qmake", build_root);
        if self.config.dev_build {
            qmake = qmake.arg("BLACK_CONFIG+=SwiftDevBranch");
        }
        self.exec(&qmake.args(["-r", ".."]))?;

        let make = Invocation::new(self.make_program(), build_root).arg(format!("-j{}", jobs()));
        self.exec(&make)
    }

    pub fn checks(&mut self) -> Result<()> {
        if !self.hooks.run_checks {
            tracing::info!("Skipping checks for {}", self.hooks.toolchain);
            return Ok(());
        }
        tracing::info!("Running checks ...");
        self.exec(&self.make_target("check"))
    }

    pub fn install(&mut self) -> Result<()> {
        tracing::info!("Installing ...");
        let target = if self.hooks.run_publish {
            "publish_installer"
        } else {
            "install"
        };
        self.exec(&self.make_target(target))
    }

    /// Compress the xswiftbus distribution into a 7z archive in the source root.
    pub fn package_xswiftbus(&mut self) -> Result<()> {
        tracing::info!("Packaging xswiftbus ...");
        let archive = self.config.artifact_path("xswiftbus", "7z");
        let content = self.config.xswiftbus_dist_dir();

        let sevenzip = Invocation::new("7z", &self.config.build_root)
            .args(["a", "-mx=9"])
            .arg(&archive)
            .arg(&content);
        self.exec(&sevenzip)?;
        tracing::info!("Created {}", archive.display());
        Ok(())
    }

    /// Dump debug symbols of the build output and archive them in the
    /// source root.
    pub fn symbols(&mut self) -> Result<()> {
        if !self.hooks.create_symbols {
            tracing::info!("Skipping symbols for {}", self.hooks.toolchain);
            return Ok(());
        }
        tracing::info!("Creating symbols ...");
        let archive = self.config.artifact_path("swift-symbols", "tar.gz");
        self.tools.symbols.dump(
            &self.config.site.dump_syms,
            &self.config.output_dir(),
            &self.config.symbol_dir(),
            &archive,
        )
    }

    /// The make program, resolved for this tool chain.
    pub fn make_program(&self) -> OsString {
        match self.hooks.make {
            MakeCommand::Program(name) => name.into(),
            MakeCommand::QtCreatorTool(name) => {
                self.config.qtcreator_binary_dir().join(name).into()
            }
        }
    }

    fn make_target(&self, target: &str) -> Invocation {
        Invocation::new(self.make_program(), &self.config.build_root).arg(target)
    }

    fn exec(&self, invocation: &Invocation) -> Result<()> {
        tracing::info!("  {}", invocation);
        self.tools.runner.run(invocation, &self.env)
    }
}

fn jobs() -> u32 {
    sys_info::cpu_num()
        .ok()
        .filter(|n| *n > 0)
        .or_else(|| {
            std::thread::available_parallelism()
                .ok()
                .and_then(|n| u32::try_from(n.get()).ok())
        })
        .unwrap_or(1)
}

#[cfg(unix)]
fn symlink(target: &Path, link: &Path) -> Result<()> {
    std::os::unix::fs::symlink(target, link)
        .with_context(|| format!("Failed to link {} -> {}", link.display(), target.display()))
}

#[cfg(not(unix))]
fn symlink(target: &Path, link: &Path) -> Result<()> {
    anyhow::bail!(
        "Cannot link {} -> {}: symlinks are only created on Unix",
        link.display(),
        target.display()
    )
}
