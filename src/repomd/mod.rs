// src/repomd/mod.rs

//! Repository metadata ingestion
//!
//! For each repository base URL this module resolves `repomd.xml`, fetches
//! the metadata payloads it points at (`primary`, `filelists`, `other`,
//! `group`), decodes them (plain XML, gzip, bzip2, or SQLite) and builds an
//! in-memory [`RepoIndex`].
//!
//! Failure policy: one repository's metadata being unavailable or malformed
//! is a warning and that repository contributes nothing; it never aborts the
//! run. Within a repository only `primary` is required; the other payloads
//! degrade to warnings individually.

mod filelists;
mod group;
mod index;
mod primary;
mod other;
mod sqlite;

pub use index::{PkgMeta, RepoIndex};

use crate::error::{Error, Result};
use crate::fetcher::Fetcher;
use quick_xml::events::Event;
use quick_xml::Reader;
use rayon::prelude::*;
use std::collections::BTreeMap;
use std::io::Read;
use tracing::{debug, info, warn};

/// RPM-MD repomd namespace. A protocol identifier matched verbatim in
/// documents, never fetched.
const NS_REPO: &str = "http://linux.duke.edu/metadata/repo";

/// Load and merge indexes for several repositories in parallel
///
/// Per-repo fetching and parsing runs under a bounded pool; the merge happens
/// single-threaded after the join, in input order, so provider ordering (and
/// with it provider selection) stays deterministic.
pub fn load_repo_indexes(
    fetcher: &Fetcher,
    bases: &[String],
    workers: usize,
) -> Result<RepoIndex> {
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(workers)
        .build()
        .map_err(|e| Error::InitError(format!("Failed to build thread pool: {e}")))?;

    let results: Vec<Option<RepoIndex>> = pool.install(|| {
        bases
            .par_iter()
            .map(|base| match load_repo_index(fetcher, base) {
                Ok(index) => {
                    info!("Indexed {} package names from {}", index.name_count(), base);
                    Some(index)
                }
                Err(e) => {
                    warn!("Skipping repository {}: {}", base, e);
                    None
                }
            })
            .collect()
    });

    let mut merged = RepoIndex::new();
    for index in results.into_iter().flatten() {
        merged.merge_from(index);
    }
    Ok(merged)
}

/// Load the index for a single repository base URL
pub fn load_repo_index(fetcher: &Fetcher, repo_base: &str) -> Result<RepoIndex> {
    let (root, repomd) = locate_repomd(fetcher, repo_base)?;
    let locations = parse_repomd(&repomd)?;

    // primary is required; a repo without it contributes nothing
    let primary_href = locations
        .get("primary")
        .ok_or_else(|| Error::MetadataError(format!("{root}: repomd has no primary entry")))?;
    let data = fetch_payload(fetcher, &root, primary_href)?;
    let mut packages = primary::parse_primary(&data, &root)?;

    if let Some(href) = locations.get("filelists").or_else(|| locations.get("filelists_db")) {
        match fetch_payload(fetcher, &root, href) {
            Ok(data) => {
                let outcome = if is_sqlite(&data) {
                    sqlite::apply_filelists_db(&data, &mut packages)
                } else {
                    filelists::apply_filelists(&data, &mut packages)
                };
                if let Err(e) = outcome {
                    warn!("{root}: ignoring filelists metadata: {e}");
                }
            }
            Err(e) => warn!("{root}: ignoring filelists metadata: {e}"),
        }
    }

    if let Some(href) = locations.get("other").or_else(|| locations.get("other_db")) {
        match fetch_payload(fetcher, &root, href) {
            Ok(data) => {
                if is_sqlite(&data) {
                    debug!("{root}: SQLite other metadata not supported, pkgid left unset");
                } else if let Err(e) = other::apply_other(&data, &mut packages) {
                    warn!("{root}: ignoring other metadata: {e}");
                }
            }
            Err(e) => warn!("{root}: ignoring other metadata: {e}"),
        }
    }

    let mut groups = BTreeMap::new();
    if let Some(href) = locations.get("group").or_else(|| locations.get("group_gz")) {
        match fetch_payload(fetcher, &root, href).and_then(|data| group::parse_groups(&data)) {
            Ok(parsed) => groups = parsed,
            Err(e) => warn!("{root}: ignoring group metadata: {e}"),
        }
    }

    Ok(RepoIndex::from_packages(packages, groups))
}

/// Probe the two candidate repomd.xml locations
///
/// Callers may pass either the directory that directly contains `repodata/`
/// or one level above it; the first successful fetch decides which, and the
/// matching root is what package hrefs resolve against.
fn locate_repomd(fetcher: &Fetcher, repo_base: &str) -> Result<(String, Vec<u8>)> {
    let mut roots = vec![repo_base.trim_end_matches('/').to_string()];
    if let Some(parent) = parent_of(repo_base) {
        roots.push(parent);
    }

    let mut last_err = None;
    for root in roots {
        let url = format!("{root}/repodata/repomd.xml");
        match fetcher.fetch(&url) {
            Ok(data) => {
                debug!("Found repomd at {}", url);
                return Ok((root, data));
            }
            Err(e) => {
                debug!("No repomd at {}: {}", url, e);
                last_err = Some(e);
            }
        }
    }

    Err(Error::MetadataError(format!(
        "{repo_base}: no repomd.xml found: {}",
        last_err.map(|e| e.to_string()).unwrap_or_default()
    )))
}

/// Parent directory of a base URL or path, if it has one
fn parent_of(base: &str) -> Option<String> {
    let trimmed = base.trim_end_matches('/');
    let idx = trimmed.rfind('/')?;
    let parent = &trimmed[..idx];
    // don't strip down into the URL scheme
    if parent.is_empty() || parent.ends_with('/') || parent.ends_with(':') {
        return None;
    }
    Some(parent.to_string())
}

/// Parse repomd.xml into a `data type -> location href` table
fn parse_repomd(data: &[u8]) -> Result<BTreeMap<String, String>> {
    let mut reader = Reader::from_reader(data);
    let mut buf = Vec::new();

    let mut locations = BTreeMap::new();
    let mut current_type: Option<String> = None;

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) | Event::Empty(e) => match e.local_name().as_ref() {
                b"repomd" => {
                    if let Some(ns) = primary::attr_value(&e, "xmlns") {
                        if ns != NS_REPO {
                            warn!("Unexpected repomd namespace {ns}");
                        }
                    }
                }
                b"data" => current_type = primary::attr_value(&e, "type"),
                b"location" => {
                    if let (Some(kind), Some(href)) =
                        (current_type.as_ref(), primary::attr_value(&e, "href"))
                    {
                        locations.insert(kind.clone(), href);
                    }
                }
                _ => {}
            },
            Event::End(e) => {
                if e.local_name().as_ref() == b"data" {
                    current_type = None;
                }
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    if locations.is_empty() {
        return Err(Error::MetadataError(
            "repomd.xml listed no metadata locations".to_string(),
        ));
    }
    Ok(locations)
}

/// Fetch one metadata payload and decode its compression
fn fetch_payload(fetcher: &Fetcher, root: &str, href: &str) -> Result<Vec<u8>> {
    let url = resolve_href(root, href);
    let data = fetcher.fetch(&url)?;
    decode_payload(href, data)
}

/// Resolve a repomd location href against the repo root
///
/// An href starting with `repodata/` is relative to the repo root (one
/// directory above `repodata/`); anything else is relative to the directory
/// containing repomd.xml. Both rules are needed; applying either uniformly
/// resolves some repositories' locations incorrectly.
fn resolve_href(root: &str, href: &str) -> String {
    let href = href.trim_start_matches("./");
    if href.starts_with("repodata/") {
        format!("{root}/{href}")
    } else {
        format!("{root}/repodata/{href}")
    }
}

/// Decode an optionally-compressed metadata payload
///
/// Bzip2 is chosen by suffix, falling back to the raw payload when
/// decompression fails (some servers mislabel already-decompressed files).
/// Gzip is chosen by suffix or the two-byte magic, never suffix alone.
fn decode_payload(href: &str, data: Vec<u8>) -> Result<Vec<u8>> {
    if href.ends_with(".bz2") {
        let mut out = Vec::new();
        match bzip2::read::BzDecoder::new(&data[..]).read_to_end(&mut out) {
            Ok(_) => return Ok(out),
            Err(e) => {
                warn!("{href}: bzip2 decompression failed ({e}), using payload as-is");
                return Ok(data);
            }
        }
    }

    if href.ends_with(".gz") || is_gzip(&data) {
        let mut out = Vec::new();
        flate2::read::GzDecoder::new(&data[..])
            .read_to_end(&mut out)
            .map_err(|e| Error::MetadataError(format!("{href}: gzip decompression failed: {e}")))?;
        return Ok(out);
    }

    Ok(data)
}

fn is_gzip(data: &[u8]) -> bool {
    data.len() >= 2 && data[0] == 0x1f && data[1] == 0x8b
}

fn is_sqlite(data: &[u8]) -> bool {
    data.starts_with(b"SQLite format 3")
}
