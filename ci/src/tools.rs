// Copyright 2026 a7mddra
// SPDX-License-Identifier: Apache-2.0

//! Seams to the helpers living outside this crate.

use anyhow::Result;
use std::collections::HashMap;
use std::path::Path;

use sys_symbol_store::SymbolStore;

use crate::env::BuildEnv;

/// Symbol extraction: dump everything in `binary_dir` into `symbol_dir`,
/// then pack the result into `archive`.
pub trait SymbolDumper {
    fn dump(
        &self,
        dump_syms: &Path,
        binary_dir: &Path,
        symbol_dir: &Path,
        archive: &Path,
    ) -> Result<()>;
}

/// Toolchain environment capture for Visual Studio. The returned variables
/// are computed on top of `env`, so entries already on its `PATH` survive.
pub trait VsEnvProvider {
    fn vs_env(&self, version: &str, arch: &str, env: &BuildEnv) -> Result<HashMap<String, String>>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct BreakpadDumper;

impl SymbolDumper for BreakpadDumper {
    fn dump(
        &self,
        dump_syms: &Path,
        binary_dir: &Path,
        symbol_dir: &Path,
        archive: &Path,
    ) -> Result<()> {
        let mut store = SymbolStore::new(dump_syms, symbol_dir);
        store.process(binary_dir)?;
        store.pack(archive)
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct VcVarsAll;

impl VsEnvProvider for VcVarsAll {
    fn vs_env(
        &self,
        version: &str,
        arch: &str,
        env: &BuildEnv,
    ) -> Result<HashMap<String, String>> {
        sys_vs_env::get_vs_env(version, arch, env.iter())
    }
}
