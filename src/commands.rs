// src/commands.rs

//! The ksfetch pipeline, wired together for the CLI
//!
//! KS parse -> repo role derivation -> metadata indexing -> group expansion
//! -> closure resolution -> optional download. Only an unreadable kickstart
//! aborts; every other gap degrades to a warning and the run reports
//! whatever it could produce.

use crate::cli::Cli;
use anyhow::Result;
use ksfetch::config::{ConfigFile, RunConfig};
use ksfetch::download::{self, DownloadOptions, Provenance};
use ksfetch::fetcher::Fetcher;
use ksfetch::report::Report;
use ksfetch::{groups, ks, repomd, resolver};
use std::time::Duration;
use tracing::{info, warn};

/// Run the whole pipeline and print the requested report
pub fn run(cli: Cli) -> Result<()> {
    let file = match &cli.config {
        Some(path) => ConfigFile::load(path)?,
        None => ConfigFile::default(),
    };

    let format = cli.format.clone();
    let provenance_csv = cli.provenance_csv.clone();

    let config = RunConfig::merge(
        file,
        cli.ks,
        cli.arch,
        cli.repos,
        cli.mode,
        cli.debugsource,
        cli.noarch,
        cli.no_sibling_repos,
        cli.workers,
        cli.timeout,
        cli.retries,
        cli.outdir,
    )?;

    let fetcher = Fetcher::new(
        Duration::from_secs(config.timeout_secs),
        config.retries,
    )?;

    // fatal on failure: the closure's seed set must be complete
    let parsed = ks::parse(&fetcher, &config.ks, &config.arch)?;
    info!(
        "Kickstart: {} includes, {} groups, {} excludes from {} sources",
        parsed.includes.len(),
        parsed.groups.len(),
        parsed.excludes.len(),
        parsed.sources.len()
    );

    let roles = download::derive_roles(&config.repos, config.derive_sibling_repos);
    let pkg_index = repomd::load_repo_indexes(&fetcher, &roles.packages, config.workers)?;
    if pkg_index.is_empty() {
        warn!("No usable package metadata in any repository");
    }

    let seeds = groups::expand(&pkg_index, &parsed);
    let resolution = resolver::resolve(&pkg_index, &seeds, &config.arch);
    info!(
        "Resolved {} packages ({} capabilities missing)",
        resolution.packages.len(),
        resolution.missing.len()
    );

    let mut provenance: Vec<Provenance> = Vec::new();
    if let Some(outdir) = &config.outdir {
        let debug_index = if matches!(
            config.mode,
            download::DownloadMode::Debug | download::DownloadMode::Both
        ) {
            repomd::load_repo_indexes(&fetcher, &roles.debug, config.workers)?
        } else {
            repomd::RepoIndex::new()
        };

        let options = DownloadOptions {
            mode: config.mode,
            include_debugsource: config.include_debugsource,
            include_noarch: config.include_noarch,
            workers: config.workers,
            outdir: outdir.clone(),
        };

        let tasks = download::build_tasks(&resolution, &pkg_index, &debug_index, &options);
        provenance = download::execute(&fetcher, &tasks, config.workers)?;
        info!("Materialized {} files in {}", provenance.len(), outdir.display());
    }

    if let Some(path) = &provenance_csv {
        download::write_provenance_csv(path, &provenance)?;
        info!("Wrote provenance CSV to {}", path.display());
    }

    let report = Report::new(&parsed, &resolution);
    match format.as_str() {
        "json" => print!("{}", report.to_json()?),
        "markdown" => print!("{}", report.to_markdown()),
        _ => print!("{}", report.to_plain()),
    }

    for capability in &resolution.missing {
        warn!("Missing capability: {}", capability);
    }

    Ok(())
}
