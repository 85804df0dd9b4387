//! Visual Studio build environment capture.
//!
//! Runs `vcvarsall.bat` for a toolset version and target architecture on
//! top of a caller supplied environment and returns the environment it
//! leaves behind. Path lists like `Path` come back with the caller's
//! entries still in them, behind the ones Visual Studio adds.

use anyhow::{Context, Result};
use std::collections::HashMap;
use std::env;
use std::ffi::OsStr;
use std::path::PathBuf;

/// Capture the environment `vcvarsall.bat <arch>` produces for the given
/// toolset version (e.g. `"14.0"`), starting from `base`.
pub fn get_vs_env<I, K, V>(version: &str, arch: &str, base: I) -> Result<HashMap<String, String>>
where
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<OsStr>,
    V: AsRef<OsStr>,
{
    let vcvarsall = find_vcvarsall(version)?;
    tracing::debug!("Loading Visual Studio environment from {}", vcvarsall.display());

    let output = run_vcvarsall(&vcvarsall, arch, base)?;
    if !output.status.success() {
        anyhow::bail!(
            "vcvarsall.bat {} failed: {}",
            arch,
            String::from_utf8_lossy(&output.stderr).trim()
        );
    }

    let vars = parse_set_output(&String::from_utf8_lossy(&output.stdout));
    if vars.is_empty() {
        anyhow::bail!("vcvarsall.bat {} produced no environment", arch);
    }
    Ok(vars)
}

/// Locate `vcvarsall.bat`, preferring the `VS<nnn>COMNTOOLS` variable the
/// installer sets over the default install location.
pub fn find_vcvarsall(version: &str) -> Result<PathBuf> {
    let var = comntools_var(version);
    let mut candidates = Vec::new();

    if let Some(tools) = env::var_os(&var) {
        // COMNTOOLS points at <install>\Common7\Tools\
        let install = PathBuf::from(tools).join("..").join("..");
        candidates.push(install.join("VC").join("vcvarsall.bat"));
    }
    candidates.push(
        PathBuf::from(r"C:\Program Files (x86)")
            .join(format!("Microsoft Visual Studio {}", version))
            .join("VC")
            .join("vcvarsall.bat"),
    );

    candidates
        .into_iter()
        .find(|path| path.is_file())
        .with_context(|| {
            format!("vcvarsall.bat for Visual Studio {} not found (is {} set?)", version, var)
        })
}

/// `"14.0"` -> `"VS140COMNTOOLS"`.
pub fn comntools_var(version: &str) -> String {
    let digits: String = version.chars().filter(|c| c.is_ascii_digit()).collect();
    format!("VS{}COMNTOOLS", digits)
}

/// Parse the output of `set`: one `NAME=value` per line.
pub fn parse_set_output(output: &str) -> HashMap<String, String> {
    output
        .lines()
        .filter_map(|line| {
            let (name, value) = line.split_once('=')?;
            let name = name.trim();
            if name.is_empty() || name.contains(char::is_whitespace) {
                return None;
            }
            Some((name.to_string(), value.trim_end_matches('\r').to_string()))
        })
        .collect()
}

#[cfg(windows)]
fn run_vcvarsall<I, K, V>(
    vcvarsall: &std::path::Path,
    arch: &str,
    base: I,
) -> Result<std::process::Output>
where
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<OsStr>,
    V: AsRef<OsStr>,
{
    use std::os::windows::process::CommandExt;

    std::process::Command::new("cmd")
        .raw_arg(format!("/s /c \"\"{}\" {} && set\"", vcvarsall.display(), arch))
        .env_clear()
        .envs(base)
        .output()
        .context("Failed to run vcvarsall.bat")
}

#[cfg(not(windows))]
fn run_vcvarsall<I, K, V>(
    vcvarsall: &std::path::Path,
    _arch: &str,
    _base: I,
) -> Result<std::process::Output>
where
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<OsStr>,
    V: AsRef<OsStr>,
{
    anyhow::bail!(
        "Cannot run {}: Visual Studio environments are only available on Windows",
        vcvarsall.display()
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn comntools_var_drops_the_dot() {
        assert_eq!(comntools_var("14.0"), "VS140COMNTOOLS");
        assert_eq!(comntools_var("12.0"), "VS120COMNTOOLS");
    }

    #[test]
    fn parses_set_output() {
        let output = "\
**********\r
INCLUDE=C:\\VC\\include;C:\\SDK\\include\r
Path=C:\\VC\\bin;C:\\Windows\r
EMPTY=\r
=C:=C:\\work\r
";
        let vars = parse_set_output(output);
        assert_eq!(
            vars.get("INCLUDE").map(String::as_str),
            Some("C:\\VC\\include;C:\\SDK\\include")
        );
        assert_eq!(vars.get("Path").map(String::as_str), Some("C:\\VC\\bin;C:\\Windows"));
        assert_eq!(vars.get("EMPTY").map(String::as_str), Some(""));
        assert_eq!(vars.len(), 3);
    }

    #[test]
    fn value_may_contain_equals() {
        let vars = parse_set_output("CL=/DFOO=1\n");
        assert_eq!(vars["CL"], "/DFOO=1");
    }

    #[cfg(not(windows))]
    #[test]
    fn unavailable_off_windows() {
        assert!(get_vs_env("14.0", "amd64", std::env::vars_os()).is_err());
    }
}
