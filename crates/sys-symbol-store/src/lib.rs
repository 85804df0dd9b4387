//! Breakpad symbol store.
//!
//! Runs `dump_syms` over every binary below a directory, files the output
//! in the layout crash reporters expect
//! (`<store>/<module>/<debug id>/<module>.sym`) and packs the store into a
//! gzip compressed tarball.

use anyhow::{Context, Result};
use flate2::write::GzEncoder;
use flate2::Compression;
use std::fs::{self, File};
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::Command;
use walkdir::WalkDir;

/// Which files count as binaries worth dumping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryKind {
    /// ELF shared objects and executables (Linux).
    Elf,
    /// Mach-O images, thin or universal (macOS).
    MachO,
    /// Program databases next to Windows binaries.
    Pdb,
}

impl BinaryKind {
    /// The kind produced by the host toolchains.
    pub fn host() -> Self {
        if cfg!(target_os = "windows") {
            BinaryKind::Pdb
        } else if cfg!(target_os = "macos") {
            BinaryKind::MachO
        } else {
            BinaryKind::Elf
        }
    }

    pub fn matches(self, path: &Path) -> bool {
        match self {
            BinaryKind::Pdb => path
                .extension()
                .map(|ext| ext.eq_ignore_ascii_case("pdb"))
                .unwrap_or(false),
            BinaryKind::Elf => read_magic(path).map(|m| m == *b"\x7fELF").unwrap_or(false),
            BinaryKind::MachO => read_magic(path)
                .map(|m| {
                    matches!(
                        u32::from_be_bytes(m),
                        0xfeed_face | 0xfeed_facf | 0xcefa_edfe | 0xcffa_edfe | 0xcafe_babe
                    )
                })
                .unwrap_or(false),
        }
    }
}

fn read_magic(path: &Path) -> Option<[u8; 4]> {
    let mut magic = [0u8; 4];
    File::open(path).ok()?.read_exact(&mut magic).ok()?;
    Some(magic)
}

/// The `MODULE` record heading every Breakpad symbol file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleRecord {
    pub os: String,
    pub arch: String,
    pub id: String,
    pub name: String,
}

impl ModuleRecord {
    /// Parse `MODULE <os> <arch> <id> <name>`. The name may contain spaces.
    pub fn parse(line: &str) -> Option<Self> {
        let mut parts = line.trim_end().splitn(5, ' ');
        if parts.next()? != "MODULE" {
            return None;
        }
        let os = parts.next()?.to_string();
        let arch = parts.next()?.to_string();
        let id = parts.next()?.to_string();
        let name = parts.next()?.to_string();
        if name.is_empty() || id.is_empty() {
            return None;
        }
        Some(Self { os, arch, id, name })
    }

    /// Path of the symbol file relative to the store root.
    pub fn store_path(&self) -> PathBuf {
        let sym_name = match self.name.strip_suffix(".pdb") {
            Some(stem) => format!("{}.sym", stem),
            None => format!("{}.sym", self.name),
        };
        Path::new(&self.name).join(&self.id).join(sym_name)
    }
}

pub struct SymbolStore {
    dump_syms: PathBuf,
    store_dir: PathBuf,
    kind: BinaryKind,
    stored: Vec<PathBuf>,
}

impl SymbolStore {
    pub fn new(dump_syms: impl Into<PathBuf>, store_dir: impl Into<PathBuf>) -> Self {
        Self::with_kind(dump_syms, store_dir, BinaryKind::host())
    }

    pub fn with_kind(
        dump_syms: impl Into<PathBuf>,
        store_dir: impl Into<PathBuf>,
        kind: BinaryKind,
    ) -> Self {
        Self {
            dump_syms: dump_syms.into(),
            store_dir: store_dir.into(),
            kind,
            stored: Vec::new(),
        }
    }

    /// Symbol files written so far, absolute.
    pub fn stored(&self) -> &[PathBuf] {
        &self.stored
    }

    /// Dump every binary below `binary_dir`. Returns the number of symbol
    /// files written.
    pub fn process(&mut self, binary_dir: &Path) -> Result<usize> {
        if !binary_dir.is_dir() {
            anyhow::bail!("Binary directory not found: {}", binary_dir.display());
        }
        fs::create_dir_all(&self.store_dir)
            .with_context(|| format!("Failed to create {}", self.store_dir.display()))?;

        let before = self.stored.len();
        for entry in WalkDir::new(binary_dir).sort_by_file_name() {
            let entry = entry?;
            if !entry.file_type().is_file() || !self.kind.matches(entry.path()) {
                continue;
            }
            self.process_file(entry.path())?;
        }

        let written = self.stored.len() - before;
        tracing::info!("Stored {} symbol files in {}", written, self.store_dir.display());
        Ok(written)
    }

    /// Run `dump_syms` on a single binary and file its output.
    pub fn process_file(&mut self, binary: &Path) -> Result<PathBuf> {
        tracing::debug!("Dumping symbols of {}", binary.display());

        let output = Command::new(&self.dump_syms)
            .arg(binary)
            .output()
            .with_context(|| format!("Failed to run {}", self.dump_syms.display()))?;

        if !output.status.success() {
            anyhow::bail!(
                "{} failed on {}: {}",
                self.dump_syms.display(),
                binary.display(),
                String::from_utf8_lossy(&output.stderr).trim()
            );
        }

        let symbols = String::from_utf8_lossy(&output.stdout);
        let record = symbols
            .lines()
            .next()
            .and_then(ModuleRecord::parse)
            .with_context(|| format!("No MODULE record in symbols of {}", binary.display()))?;

        let dst = self.store_dir.join(record.store_path());
        if let Some(parent) = dst.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&dst, symbols.as_bytes())
            .with_context(|| format!("Failed to write {}", dst.display()))?;

        self.stored.push(dst.clone());
        Ok(dst)
    }

    /// Pack the whole store into `archive` (`.tar.gz`), entries relative to
    /// the store root.
    pub fn pack(&self, archive: &Path) -> Result<()> {
        if let Some(parent) = archive.parent() {
            fs::create_dir_all(parent)?;
        }
        let file = File::create(archive)
            .with_context(|| format!("Failed to create {}", archive.display()))?;
        let mut builder = tar::Builder::new(GzEncoder::new(file, Compression::best()));

        for entry in WalkDir::new(&self.store_dir).sort_by_file_name() {
            let entry = entry?;
            if !entry.file_type().is_file() {
                continue;
            }
            let name = pathdiff::diff_paths(entry.path(), &self.store_dir)
                .with_context(|| format!("{} is outside the store", entry.path().display()))?;
            builder.append_path_with_name(entry.path(), &name)?;
        }

        builder.into_inner()?.finish()?;
        tracing::info!("Packed symbols into {}", archive.display());
        Ok(())
    }
}
