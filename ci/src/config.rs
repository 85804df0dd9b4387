// Copyright 2026 a7mddra
// SPDX-License-Identifier: Apache-2.0

//! Build configuration.
//!
//! Combines the command line options with the per-machine INI file
//! (`scripts/jenkins.cfg` by default):
//!
//! ```ini
//! [General]
//! qt_version = 5.9.2
//!
//! [Linux]
//! qt_path = /opt/Qt
//! dump_syms = /opt/breakpad/dump_syms
//!
//! [Windows]
//! qt_path = C:\Qt
//! dump_syms = C:\breakpad\dump_syms.exe
//! mingw_path = C:\Qt\Tools\mingw530_32\bin
//! sevenzip_path = C:\Program Files\7-Zip
//! ```
//!
//! Backslashes are taken literally.

use anyhow::{Context, Result};
use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::error::CiError;
use crate::platform::{Os, PlatformHooks};
use crate::utils;
use crate::version::VersionInfo;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WordSize {
    Bits32,
    Bits64,
}

impl WordSize {
    pub fn as_str(self) -> &'static str {
        match self {
            WordSize::Bits32 => "32",
            WordSize::Bits64 => "64",
        }
    }

    /// clap value parser.
    pub fn parse(value: &str) -> Result<Self, String> {
        value.parse().map_err(|err: CiError| err.to_string())
    }
}

impl FromStr for WordSize {
    type Err = CiError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "32" => Ok(WordSize::Bits32),
            "64" => Ok(WordSize::Bits64),
            _ => Err(CiError::Usage(
                "Unsupported word size. Choose 32 or 64".to_string(),
            )),
        }
    }
}

impl fmt::Display for WordSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

const DEFAULT_SEVEN_ZIP_DIR: &str = "C:/Program Files/7-Zip";

type Sections = HashMap<String, HashMap<String, String>>;

/// Machine specific tool locations for one operating system.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SiteConfig {
    pub qt_version: String,
    pub qt_path: PathBuf,
    pub dump_syms: PathBuf,
    pub mingw_path: Option<PathBuf>,
    pub sevenzip_path: Option<PathBuf>,
}

impl SiteConfig {
    pub fn load(path: &Path, os: Os) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        // the INI source unescapes `\x`, keep Windows paths intact
        let text = text.replace('\\', r"\\");

        let sections: Sections = config::Config::builder()
            .add_source(config::File::from_str(&text, config::FileFormat::Ini))
            .build()
            .with_context(|| format!("Failed to read config file {}", path.display()))?
            .try_deserialize()
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;

        let site = Self::from_sections(&sections, os)
            .with_context(|| format!("Invalid config file {}", path.display()))?;
        tracing::debug!("Loaded {:?} from {}", site, path.display());
        Ok(site)
    }

    fn from_sections(sections: &Sections, os: Os) -> Result<Self, CiError> {
        let qt_version = lookup(sections, "General", "qt_version")?;
        let qt_path = lookup(sections, os.name(), "qt_path")?;
        let dump_syms = lookup(sections, os.name(), "dump_syms")?;
        let mingw_path = lookup(sections, os.name(), "mingw_path").ok();
        let sevenzip_path = lookup(sections, os.name(), "sevenzip_path").ok();

        Ok(Self {
            qt_version: qt_version.to_string(),
            qt_path: utils::absolute(Path::new(qt_path))?,
            dump_syms: utils::absolute(Path::new(dump_syms))?,
            mingw_path: mingw_path
                .map(|p| utils::absolute(Path::new(p)))
                .transpose()?,
            sevenzip_path: sevenzip_path
                .map(|p| utils::absolute(Path::new(p)))
                .transpose()?,
        })
    }
}

fn lookup<'a>(sections: &'a Sections, section: &str, key: &str) -> Result<&'a str, CiError> {
    let entries = sections
        .iter()
        .find(|(name, _)| name.eq_ignore_ascii_case(section))
        .map(|(_, entries)| entries)
        .ok_or_else(|| CiError::Config(format!("No section: '{}'", section)))?;

    entries
        .iter()
        .find(|(name, _)| name.eq_ignore_ascii_case(key))
        .map(|(_, value)| value.trim())
        .filter(|value| !value.is_empty())
        .ok_or_else(|| CiError::Config(format!("No option '{}' in section: '{}'", key, section)))
}

/// What the command line asks for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildOptions {
    pub config_file: Option<PathBuf>,
    pub word_size: WordSize,
    pub dev_build: bool,
}

/// Everything a pipeline run needs to know, fixed before the first step.
#[derive(Debug, Clone)]
pub struct BuildConfig {
    pub os: Os,
    pub word_size: WordSize,
    pub dev_build: bool,
    pub source_root: PathBuf,
    pub build_root: PathBuf,
    pub site: SiteConfig,
    pub version: VersionInfo,
}

impl BuildConfig {
    pub fn load(options: &BuildOptions, os: Os, source_root: &Path) -> Result<Self> {
        let config_file = match &options.config_file {
            Some(path) => {
                let path = utils::absolute(path)?;
                if !path.exists() {
                    return Err(CiError::MissingConfigFile(path).into());
                }
                path
            }
            None => source_root.join("scripts").join("jenkins.cfg"),
        };

        let site = SiteConfig::load(&config_file, os)?;
        let version = VersionInfo::from_file(&version_file(source_root))?;

        Ok(Self {
            os,
            word_size: options.word_size,
            dev_build: options.dev_build,
            source_root: source_root.to_path_buf(),
            build_root: source_root.join("build"),
            site,
            version,
        })
    }

    /// `<qt_path>/<qt_version>/<kit>/bin`
    pub fn qt_binary_dir(&self, hooks: &PlatformHooks) -> PathBuf {
        self.site
            .qt_path
            .join(&self.site.qt_version)
            .join(hooks.qt_component_dir(self.word_size))
            .join("bin")
    }

    pub fn qtcreator_binary_dir(&self) -> PathBuf {
        self.site.qt_path.join("Tools").join("QtCreator").join("bin")
    }

    /// Prebuilt third party libraries: `<source>/externals/<spec>/lib<bits>`.
    pub fn externals_dir(&self, hooks: &PlatformHooks) -> PathBuf {
        self.source_root
            .join("externals")
            .join(hooks.qmake_spec)
            .join(format!("lib{}", self.word_size))
    }

    /// `sevenzip_path` from the config file, else the stock install location.
    pub fn seven_zip_dir(&self) -> &Path {
        self.site
            .sevenzip_path
            .as_deref()
            .unwrap_or_else(|| Path::new(DEFAULT_SEVEN_ZIP_DIR))
    }

    /// Where the build places its binaries.
    pub fn output_dir(&self) -> PathBuf {
        self.build_root.join("out")
    }

    pub fn symbol_dir(&self) -> PathBuf {
        self.build_root.join("symbols")
    }

    pub fn xswiftbus_dist_dir(&self) -> PathBuf {
        self.build_root.join("dist").join("xswiftbus")
    }

    /// `<source>/<prefix>-<os>-<bits>-<version>.<ext>`
    pub fn artifact_path(&self, prefix: &str, extension: &str) -> PathBuf {
        self.source_root.join(format!(
            "{}-{}-{}-{}.{}",
            prefix, self.os, self.word_size, self.version, extension
        ))
    }
}

pub fn version_file(source_root: &Path) -> PathBuf {
    source_root.join("mkspecs").join("features").join("version.pri")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    const SAMPLE: &str = "\
[General]
qt_version = 5.9.2

[Linux]
qt_path = /opt/Qt
dump_syms = /opt/breakpad/dump_syms

[Windows]
qt_path = C:/Qt
dump_syms = C:/breakpad/dump_syms.exe
mingw_path = C:/Qt/Tools/mingw530_32/bin
";

    fn write_config(dir: &TempDir, text: &str) -> PathBuf {
        let path = dir.path().join("jenkins.cfg");
        fs::write(&path, text).unwrap();
        path
    }

    #[test]
    fn word_size_accepts_only_32_and_64() {
        assert_eq!("32".parse::<WordSize>().unwrap(), WordSize::Bits32);
        assert_eq!("64".parse::<WordSize>().unwrap(), WordSize::Bits64);
        for bad in ["16", "", "x64", " 64", "128"] {
            let err = bad.parse::<WordSize>().unwrap_err();
            assert_eq!(err.exit_code(), 2);
        }
    }

    #[cfg(unix)]
    #[test]
    fn loads_linux_section() {
        let dir = TempDir::new().unwrap();
        let path = write_config(&dir, SAMPLE);

        let site = SiteConfig::load(&path, Os::Linux).unwrap();
        assert_eq!(site.qt_version, "5.9.2");
        assert_eq!(site.qt_path, PathBuf::from("/opt/Qt"));
        assert_eq!(site.dump_syms, PathBuf::from("/opt/breakpad/dump_syms"));
        assert_eq!(site.mingw_path, None);
    }

    #[test]
    fn windows_section_has_mingw_path() {
        let dir = TempDir::new().unwrap();
        let path = write_config(&dir, SAMPLE);

        let site = SiteConfig::load(&path, Os::Windows).unwrap();
        assert!(site.mingw_path.unwrap().ends_with("bin"));
        assert_eq!(site.sevenzip_path, None);
    }

    #[test]
    fn backslashes_are_kept_literally() {
        let dir = TempDir::new().unwrap();
        let path = write_config(
            &dir,
            "[General]\nqt_version = 5.9.2\n\n[Windows]\nqt_path = C:\\Qt\\new\n\
             dump_syms = C:\\tools\\dump_syms.exe\nsevenzip_path = D:\\7-Zip\n",
        );

        let site = SiteConfig::load(&path, Os::Windows).unwrap();
        let text = |p: &Path| p.to_string_lossy().into_owned();
        assert!(text(&site.qt_path).ends_with(r"C:\Qt\new"), "{:?}", site.qt_path);
        assert!(text(&site.dump_syms).ends_with(r"C:\tools\dump_syms.exe"));
        assert!(text(site.sevenzip_path.as_deref().unwrap()).ends_with(r"D:\7-Zip"));
    }

    #[test]
    fn missing_os_section_is_a_config_error() {
        let dir = TempDir::new().unwrap();
        let path = write_config(&dir, SAMPLE);

        let err = SiteConfig::load(&path, Os::Darwin).unwrap_err();
        assert!(format!("{:#}", err).contains("No section: 'Darwin'"));
        assert_eq!(crate::error::exit_code(&err), 1);
    }

    #[test]
    fn missing_key_is_a_config_error() {
        let dir = TempDir::new().unwrap();
        let path = write_config(
            &dir,
            "[General]\nqt_version = 5.9.2\n[Linux]\nqt_path = /opt/Qt\n",
        );

        let err = SiteConfig::load(&path, Os::Linux).unwrap_err();
        assert!(format!("{:#}", err).contains("No option 'dump_syms'"));
    }

    #[test]
    fn relative_paths_become_absolute() {
        let dir = TempDir::new().unwrap();
        let path = write_config(
            &dir,
            "[General]\nqt_version=5.9.2\n[Linux]\nqt_path=Qt\ndump_syms=tools/dump_syms\n",
        );

        let site = SiteConfig::load(&path, Os::Linux).unwrap();
        assert!(site.qt_path.is_absolute());
        assert!(site.dump_syms.ends_with("tools/dump_syms"));
    }

    #[test]
    fn explicit_config_file_must_exist() {
        let dir = TempDir::new().unwrap();
        let options = BuildOptions {
            config_file: Some(dir.path().join("nope.cfg")),
            word_size: WordSize::Bits64,
            dev_build: false,
        };

        let err = BuildConfig::load(&options, Os::Linux, dir.path()).unwrap_err();
        assert_eq!(crate::error::exit_code(&err), 2);
    }
}
