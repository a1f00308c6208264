// src/config.rs

//! Run configuration
//!
//! Everything a run needs, collected from the CLI and an optional JSON
//! config file. CLI values win over file values; defaults fill the rest.

use crate::download::{default_workers, DownloadMode};
use crate::error::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Defaults mirrored by the CLI surface
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_RETRIES: u32 = 3;

/// Fully resolved configuration for one run
#[derive(Debug, Clone)]
pub struct RunConfig {
    /// KS entry locator: URL or filesystem path
    pub ks: String,
    /// Target architecture
    pub arch: String,
    /// Repository base URLs
    pub repos: Vec<String>,
    pub mode: DownloadMode,
    pub include_debugsource: bool,
    pub include_noarch: bool,
    /// Off switch for sibling packages/debug repo derivation
    pub derive_sibling_repos: bool,
    pub workers: usize,
    pub timeout_secs: u64,
    pub retries: u32,
    /// Where downloaded RPMs land; `None` resolves only
    pub outdir: Option<PathBuf>,
}

/// JSON config file shape; every field optional
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ConfigFile {
    pub ks: Option<String>,
    pub arch: Option<String>,
    pub repos: Vec<String>,
    pub mode: Option<String>,
    pub debugsource: Option<bool>,
    pub noarch: Option<bool>,
    pub no_sibling_repos: Option<bool>,
    pub workers: Option<usize>,
    pub timeout_secs: Option<u64>,
    pub retries: Option<u32>,
    pub outdir: Option<PathBuf>,
}

impl ConfigFile {
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            Error::IoError(format!("Failed to read config {}: {e}", path.display()))
        })?;
        serde_json::from_str(&text)
            .map_err(|e| Error::ParseError(format!("Invalid config {}: {e}", path.display())))
    }
}

/// Detect the host architecture as an RPM arch string
pub fn detect_arch() -> String {
    std::env::consts::ARCH.to_string()
}

/// Parse a mode selector string
pub fn parse_mode(value: &str) -> Result<DownloadMode> {
    match value {
        "base" => Ok(DownloadMode::Base),
        "debug" => Ok(DownloadMode::Debug),
        "both" => Ok(DownloadMode::Both),
        other => Err(Error::ParseError(format!(
            "Unknown mode '{other}' (expected base, debug, or both)"
        ))),
    }
}

impl RunConfig {
    /// Merge CLI values over an optional config file
    ///
    /// Every `cli_*` argument is `Some`/non-empty only when the user passed
    /// it explicitly.
    #[allow(clippy::too_many_arguments)]
    pub fn merge(
        file: ConfigFile,
        cli_ks: Option<String>,
        cli_arch: Option<String>,
        cli_repos: Vec<String>,
        cli_mode: Option<String>,
        cli_debugsource: bool,
        cli_noarch: bool,
        cli_no_sibling_repos: bool,
        cli_workers: Option<usize>,
        cli_timeout: Option<u64>,
        cli_retries: Option<u32>,
        cli_outdir: Option<PathBuf>,
    ) -> Result<Self> {
        let ks = cli_ks
            .or(file.ks)
            .ok_or_else(|| Error::InitError("No kickstart source given".to_string()))?;

        let repos = if cli_repos.is_empty() {
            file.repos
        } else {
            cli_repos
        };
        if repos.is_empty() {
            return Err(Error::InitError("No repositories given".to_string()));
        }

        let mode = match cli_mode.or(file.mode) {
            Some(value) => parse_mode(&value)?,
            None => DownloadMode::Base,
        };

        Ok(Self {
            ks,
            arch: cli_arch.or(file.arch).unwrap_or_else(detect_arch),
            repos,
            mode,
            include_debugsource: cli_debugsource || file.debugsource.unwrap_or(false),
            include_noarch: cli_noarch || file.noarch.unwrap_or(false),
            derive_sibling_repos: !(cli_no_sibling_repos
                || file.no_sibling_repos.unwrap_or(false)),
            workers: cli_workers
                .or(file.workers)
                .unwrap_or_else(default_workers),
            timeout_secs: cli_timeout
                .or(file.timeout_secs)
                .unwrap_or(DEFAULT_TIMEOUT_SECS),
            retries: cli_retries.or(file.retries).unwrap_or(DEFAULT_RETRIES),
            outdir: cli_outdir.or(file.outdir),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn merge_minimal(file: ConfigFile) -> Result<RunConfig> {
        RunConfig::merge(
            file,
            Some("/srv/ks/main.ks".to_string()),
            None,
            vec!["http://repo/packages/x86_64".to_string()],
            None,
            false,
            false,
            false,
            None,
            None,
            None,
            None,
        )
    }

    #[test]
    fn test_defaults() {
        let cfg = merge_minimal(ConfigFile::default()).unwrap();
        assert_eq!(cfg.mode, DownloadMode::Base);
        assert_eq!(cfg.timeout_secs, DEFAULT_TIMEOUT_SECS);
        assert_eq!(cfg.retries, DEFAULT_RETRIES);
        assert!(cfg.derive_sibling_repos);
        assert!((4..=16).contains(&cfg.workers));
    }

    #[test]
    fn test_cli_wins_over_file() {
        let file = ConfigFile {
            arch: Some("aarch64".to_string()),
            mode: Some("both".to_string()),
            ..ConfigFile::default()
        };
        let cfg = RunConfig::merge(
            file,
            Some("a.ks".to_string()),
            Some("x86_64".to_string()),
            vec!["http://repo".to_string()],
            Some("debug".to_string()),
            false,
            false,
            false,
            None,
            None,
            None,
            None,
        )
        .unwrap();
        assert_eq!(cfg.arch, "x86_64");
        assert_eq!(cfg.mode, DownloadMode::Debug);
    }

    #[test]
    fn test_missing_inputs_are_errors() {
        assert!(merge_minimal(ConfigFile::default()).is_ok());
        assert!(RunConfig::merge(
            ConfigFile::default(),
            None,
            None,
            vec!["http://repo".to_string()],
            None,
            false,
            false,
            false,
            None,
            None,
            None,
            None,
        )
        .is_err());
    }

    #[test]
    fn test_parse_mode() {
        assert_eq!(parse_mode("base").unwrap(), DownloadMode::Base);
        assert_eq!(parse_mode("debug").unwrap(), DownloadMode::Debug);
        assert_eq!(parse_mode("both").unwrap(), DownloadMode::Both);
        assert!(parse_mode("everything").is_err());
    }

    #[test]
    fn test_config_file_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(
            &path,
            r#"{"ks": "/srv/main.ks", "repos": ["http://repo"], "mode": "both"}"#,
        )
        .unwrap();

        let file = ConfigFile::load(&path).unwrap();
        assert_eq!(file.ks.as_deref(), Some("/srv/main.ks"));
        assert_eq!(file.repos.len(), 1);
        assert_eq!(file.mode.as_deref(), Some("both"));
    }
}
