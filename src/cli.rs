// src/cli.rs

//! CLI definitions for ksfetch
//!
//! Argument parsing only; the actual pipeline lives in the `commands`
//! module.

use clap::Parser;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "ksfetch")]
#[command(version)]
#[command(about = "Resolve and fetch the RPM closure of a kickstart manifest", long_about = None)]
pub struct Cli {
    /// Kickstart entry point (URL or path)
    pub ks: Option<String>,

    /// JSON config file; CLI flags override its values
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Target architecture (default: host architecture)
    #[arg(short, long)]
    pub arch: Option<String>,

    /// Repository base URL; repeatable
    #[arg(short, long = "repo")]
    pub repos: Vec<String>,

    /// What to download: base, debug, or both
    #[arg(short, long)]
    pub mode: Option<String>,

    /// Also fetch -debugsource siblings in debug mode
    #[arg(long)]
    pub debugsource: bool,

    /// Fetch noarch RPMs too
    #[arg(long)]
    pub noarch: bool,

    /// Use supplied repos verbatim instead of deriving packages/debug siblings
    #[arg(long)]
    pub no_sibling_repos: bool,

    /// Download worker count (default: clamp(cpus * 2, 4, 16))
    #[arg(short = 'j', long)]
    pub workers: Option<usize>,

    /// Per-request timeout in seconds
    #[arg(long)]
    pub timeout: Option<u64>,

    /// Retry count per request
    #[arg(long)]
    pub retries: Option<u32>,

    /// Output directory for downloaded RPMs; resolve-only when omitted
    #[arg(short, long)]
    pub outdir: Option<PathBuf>,

    /// Report format: plain, json, or markdown
    #[arg(short, long, default_value = "plain")]
    pub format: String,

    /// Write download provenance as CSV to this path
    #[arg(long)]
    pub provenance_csv: Option<PathBuf>,
}
