// Copyright 2026 a7mddra
// SPDX-License-Identifier: Apache-2.0

//! Per-platform build hooks.
//!
//! Each supported (operating system, tool chain) pair maps to one
//! [`PlatformHooks`] value: the qmake spec, the make program, the Qt
//! component folder and which optional pipeline steps apply.

use std::fmt;

use crate::error::CiError;

/// Operating system, named the way the config file sections and archive
/// names spell it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Os {
    Linux,
    Darwin,
    Windows,
}

impl Os {
    pub const ALL: [Os; 3] = [Os::Linux, Os::Darwin, Os::Windows];

    /// The host operating system.
    pub fn current() -> Result<Self, CiError> {
        let name = sys_info::os_type()
            .map_err(|err| CiError::UnsupportedOs(format!("unknown ({})", err)))?;
        Self::from_name(&name).ok_or(CiError::UnsupportedOs(name))
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|os| os.name().eq_ignore_ascii_case(name))
    }

    pub fn name(self) -> &'static str {
        match self {
            Os::Linux => "Linux",
            Os::Darwin => "Darwin",
            Os::Windows => "Windows",
        }
    }
}

impl fmt::Display for Os {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Toolchain {
    Msvc,
    Mingw,
    Gcc,
    Clang,
}

impl Toolchain {
    pub fn name(self) -> &'static str {
        match self {
            Toolchain::Msvc => "msvc",
            Toolchain::Mingw => "mingw",
            Toolchain::Gcc => "gcc",
            Toolchain::Clang => "clang",
        }
    }
}

impl fmt::Display for Toolchain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// The program standing in for `make`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MakeCommand {
    /// Looked up on `PATH`.
    Program(&'static str),
    /// Shipped in Qt Creator's `bin` directory.
    QtCreatorTool(&'static str),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlatformHooks {
    pub os: Os,
    pub toolchain: Toolchain,
    pub qmake_spec: &'static str,
    pub make: MakeCommand,
    pub qt_component: &'static str,
    pub run_checks: bool,
    pub run_publish: bool,
    pub create_symbols: bool,
}

const MSVC: PlatformHooks = PlatformHooks {
    os: Os::Windows,
    toolchain: Toolchain::Msvc,
    qmake_spec: "win32-msvc2015",
    make: MakeCommand::QtCreatorTool("jom.exe"),
    qt_component: "msvc2015",
    run_checks: true,
    run_publish: true,
    create_symbols: true,
};

const MINGW: PlatformHooks = PlatformHooks {
    os: Os::Windows,
    toolchain: Toolchain::Mingw,
    qmake_spec: "win32-g++",
    make: MakeCommand::Program("mingw32-make"),
    qt_component: "mingw53",
    run_checks: false,
    run_publish: false,
    create_symbols: false,
};

const LINUX_GCC: PlatformHooks = PlatformHooks {
    os: Os::Linux,
    toolchain: Toolchain::Gcc,
    qmake_spec: "linux-g++",
    make: MakeCommand::Program("make"),
    qt_component: "gcc",
    run_checks: true,
    run_publish: true,
    create_symbols: false,
};

const MACOS_CLANG: PlatformHooks = PlatformHooks {
    os: Os::Darwin,
    toolchain: Toolchain::Clang,
    qmake_spec: "macx-clang",
    make: MakeCommand::Program("make"),
    qt_component: "clang",
    run_checks: true,
    run_publish: true,
    create_symbols: true,
};

const SUPPORTED: [PlatformHooks; 4] = [LINUX_GCC, MACOS_CLANG, MSVC, MINGW];

/// Tool chain names accepted on `os`.
pub fn supported_toolchains(os: Os) -> Vec<&'static str> {
    SUPPORTED
        .iter()
        .filter(|hooks| hooks.os == os)
        .map(|hooks| hooks.toolchain.name())
        .collect()
}

/// Look up the hooks for a tool chain name on `os`.
pub fn select(os: Os, toolchain: &str) -> Result<PlatformHooks, CiError> {
    SUPPORTED
        .iter()
        .find(|hooks| hooks.os == os && hooks.toolchain.name() == toolchain)
        .copied()
        .ok_or_else(|| CiError::UnsupportedToolchain {
            os: os.to_string(),
            toolchain: toolchain.to_string(),
            supported: supported_toolchains(os).join("|"),
        })
}

impl PlatformHooks {
    /// Folder name of the Qt kit under `<qt_path>/<qt_version>/`.
    ///
    /// 64-bit kits end in `_64`. 32-bit kits end in `_32`, except MSVC kits
    /// which carry no suffix at all.
    pub fn qt_component_dir(&self, word_size: crate::config::WordSize) -> String {
        use crate::config::WordSize;

        match word_size {
            WordSize::Bits64 => format!("{}_64", self.qt_component),
            WordSize::Bits32 if self.qt_component.contains("msvc") => self.qt_component.to_string(),
            WordSize::Bits32 => format!("{}_32", self.qt_component),
        }
    }
}
