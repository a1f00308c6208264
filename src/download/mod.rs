// src/download/mod.rs

//! Download orchestration
//!
//! Builds the download task list for a resolved package set (base RPMs
//! and/or their debuginfo/debugsource siblings) and executes it under a
//! bounded worker pool. Every task carries an ordered list of candidate URLs
//! tried strictly in order; the first success wins. A task whose candidates
//! are all exhausted is dropped with a warning; partial results are
//! acceptable, and every materialized file is recorded with the exact URL it
//! came from.

mod roles;
mod urls;

pub use roles::{derive_roles, RepoRoles};
pub use urls::candidate_urls;

use crate::error::{Error, Result};
use crate::fetcher::Fetcher;
use crate::repomd::RepoIndex;
use crate::resolver::Resolution;
use indicatif::{ProgressBar, ProgressStyle};
use rayon::prelude::*;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Which RPMs to fetch for the resolved set
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DownloadMode {
    /// Base RPMs from packages-role repos
    Base,
    /// `-debuginfo` (and optionally `-debugsource`) RPMs from debug-role repos
    Debug,
    /// Union of the two
    Both,
}

/// Download behavior switches
#[derive(Debug, Clone)]
pub struct DownloadOptions {
    pub mode: DownloadMode,
    /// Also look up `<name>-debugsource` in debug mode
    pub include_debugsource: bool,
    /// Fetch noarch RPMs too (resolution may traverse them either way)
    pub include_noarch: bool,
    pub workers: usize,
    pub outdir: PathBuf,
}

/// One file to fetch, with its fallback URL candidates
#[derive(Debug, Clone)]
pub struct DownloadTask {
    pub name: String,
    pub arch: String,
    pub candidates: Vec<String>,
    pub dest: PathBuf,
}

/// A successfully materialized file and the URL it actually came from
pub type Provenance = (PathBuf, String);

/// Default worker count: `clamp(cpu_count * 2, 4, 16)`
pub fn default_workers() -> usize {
    let cpus = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    (cpus * 2).clamp(4, 16)
}

/// Build the task list for a resolution outcome
///
/// Base tasks locate each resolved `(name, arch)` in the packages-role
/// index; debug tasks look up the `-debuginfo`/`-debugsource` siblings of
/// every resolved name in the debug-role index, using the same
/// arch-preference rule as resolution seeding.
pub fn build_tasks(
    resolution: &Resolution,
    pkg_index: &RepoIndex,
    debug_index: &RepoIndex,
    options: &DownloadOptions,
) -> Vec<DownloadTask> {
    let mut tasks: Vec<DownloadTask> = Vec::new();

    if matches!(options.mode, DownloadMode::Base | DownloadMode::Both) {
        for (name, arch) in &resolution.packages {
            if arch == "noarch" && !options.include_noarch {
                debug!("Skipping noarch download {}", name);
                continue;
            }
            let found = pkg_index
                .by_name
                .get(name)
                .and_then(|pkgs| pkgs.iter().find(|p| &p.arch == arch));
            match found {
                Some(pkg) => push_task(
                    &mut tasks,
                    task_for(&pkg.name, &pkg.arch, &pkg.repo_base, &pkg.href, arch, options),
                ),
                None => warn!("Resolved package {}.{} vanished from the index", name, arch),
            }
        }
    }

    if matches!(options.mode, DownloadMode::Debug | DownloadMode::Both) {
        let mut suffixes = vec!["-debuginfo"];
        if options.include_debugsource {
            suffixes.push("-debugsource");
        }

        let mut names: Vec<&String> = resolution.packages.iter().map(|(n, _)| n).collect();
        names.dedup();

        for name in names {
            // the preferred arch for a debug sibling is the resolved base arch
            let arch = resolution
                .packages
                .iter()
                .find(|(n, _)| n == name)
                .map(|(_, a)| a.as_str())
                .unwrap_or_default();

            for suffix in &suffixes {
                let sibling = format!("{name}{suffix}");
                match debug_index.select_named(&sibling, arch) {
                    Some(pkg) => push_task(
                        &mut tasks,
                        task_for(&pkg.name, &pkg.arch, &pkg.repo_base, &pkg.href, arch, options),
                    ),
                    None => debug!("No {} in debug repositories", sibling),
                }
            }
        }
    }

    tasks
}

/// Build one task, generating candidates for both the repo arch and the
/// package's own arch when they differ (noarch RPMs inside arch-named trees)
fn task_for(
    name: &str,
    pkg_arch: &str,
    repo_base: &str,
    href: &str,
    repo_arch: &str,
    options: &DownloadOptions,
) -> DownloadTask {
    let mut candidates = candidate_urls(repo_base, href, repo_arch);
    if pkg_arch != repo_arch {
        for url in candidate_urls(repo_base, href, pkg_arch) {
            if !candidates.contains(&url) {
                candidates.push(url);
            }
        }
    }

    let filename = href
        .rsplit('/')
        .next()
        .unwrap_or(href)
        .to_string();

    DownloadTask {
        name: name.to_string(),
        arch: pkg_arch.to_string(),
        candidates,
        dest: options.outdir.join(filename),
    }
}

/// Append a task unless another task already owns its destination
/// (duplicate providers across mirrored repos)
fn push_task(tasks: &mut Vec<DownloadTask>, task: DownloadTask) {
    if tasks.iter().any(|t| t.dest == task.dest) {
        return;
    }
    tasks.push(task);
}

/// Execute tasks under a bounded worker pool
///
/// Returns provenance for every file that exists afterwards. Pre-existing
/// destinations are skipped without network traffic but still recorded.
pub fn execute(
    fetcher: &Fetcher,
    tasks: &[DownloadTask],
    workers: usize,
) -> Result<Vec<Provenance>> {
    if tasks.is_empty() {
        return Ok(Vec::new());
    }

    info!("Downloading {} files with {} workers", tasks.len(), workers);

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(workers)
        .build()
        .map_err(|e| Error::InitError(format!("Failed to build thread pool: {e}")))?;

    let progress = ProgressBar::new(tasks.len() as u64);
    progress.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:30.cyan/blue}] {pos}/{len} {msg}")
            .expect("Invalid progress bar template")
            .progress_chars("#>-"),
    );

    let results: Vec<Option<Provenance>> = pool.install(|| {
        tasks
            .par_iter()
            .map(|task| {
                let outcome = fetch_task(fetcher, task);
                progress.inc(1);
                outcome
            })
            .collect()
    });

    let provenance: Vec<Provenance> = results.into_iter().flatten().collect();
    progress.finish_with_message(format!(
        "{} of {} files materialized",
        provenance.len(),
        tasks.len()
    ));

    Ok(provenance)
}

/// Try one task's candidates strictly in order
fn fetch_task(fetcher: &Fetcher, task: &DownloadTask) -> Option<Provenance> {
    if task.dest.exists() {
        debug!("{} already present, skipping", task.dest.display());
        let nominal = task.candidates.first().cloned().unwrap_or_default();
        return Some((task.dest.clone(), nominal));
    }

    for url in &task.candidates {
        match fetcher.save(url, &task.dest) {
            Ok(()) => return Some((task.dest.clone(), url.clone())),
            Err(e) => debug!("Candidate {} failed: {}", url, e),
        }
    }

    warn!(
        "All {} candidates failed for {}.{}, dropping",
        task.candidates.len(),
        task.name,
        task.arch
    );
    None
}

/// Write the provenance list as CSV `(local_path, source_url)` rows
pub fn write_provenance_csv(path: &Path, provenance: &[Provenance]) -> Result<()> {
    let mut out = String::from("local_path,source_url\n");
    for (dest, url) in provenance {
        out.push_str(&csv_field(&dest.to_string_lossy()));
        out.push(',');
        out.push_str(&csv_field(url));
        out.push('\n');
    }
    std::fs::write(path, out)
        .map_err(|e| Error::IoError(format!("Failed to write {}: {e}", path.display())))
}

fn csv_field(value: &str) -> String {
    if value.contains(',') || value.contains('"') || value.contains('\n') {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}
