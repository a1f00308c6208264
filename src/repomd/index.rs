// src/repomd/index.rs

//! In-memory package index built from RPM-MD metadata
//!
//! [`PkgMeta`] records are constructed and augmented while a single repo's
//! metadata is parsed, then frozen behind `Arc` when the [`RepoIndex`] is
//! built. After that point nothing mutates them, so lookups from parallel
//! phases need no locking.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::Arc;

/// Metadata for one `<package>` entry from primary metadata
///
/// Capabilities are opaque strings; an absolute file path sourced from
/// filelists metadata is a valid capability. A package can only ever be
/// downloaded relative to `repo_base`, the repo it was parsed from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PkgMeta {
    pub name: String,
    pub arch: String,
    /// Repo-relative RPM path from `<location href=...>`
    pub href: String,
    /// Root URL of the owning repository
    pub repo_base: String,
    pub provides: BTreeSet<String>,
    pub requires: BTreeSet<String>,
    /// Absolute file paths from filelists metadata, served as synthetic provides
    pub files: BTreeSet<String>,
    pub pkgid: Option<String>,
}

impl PkgMeta {
    pub fn new(name: String, arch: String, href: String, repo_base: String) -> Self {
        Self {
            name,
            arch,
            href,
            repo_base,
            provides: BTreeSet::new(),
            requires: BTreeSet::new(),
            files: BTreeSet::new(),
            pkgid: None,
        }
    }
}

/// Capability and name lookup tables over one or more repositories
///
/// `merge_from` concatenates without dedup: duplicate providers across
/// mirrored repos are expected, and provider selection resolves them
/// deterministically.
#[derive(Debug, Default)]
pub struct RepoIndex {
    pub by_name: HashMap<String, Vec<Arc<PkgMeta>>>,
    pub by_provide: HashMap<String, Vec<Arc<PkgMeta>>>,
    pub by_file: HashMap<String, Vec<Arc<PkgMeta>>>,
    /// comps group id -> mandatory/default package names (first repo wins)
    pub groups: BTreeMap<String, Vec<String>>,
}

impl RepoIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Freeze fully-parsed package records into lookup tables
    pub fn from_packages(
        packages: Vec<PkgMeta>,
        groups: BTreeMap<String, Vec<String>>,
    ) -> Self {
        let mut index = Self {
            groups,
            ..Self::default()
        };

        for pkg in packages {
            debug_assert!(!pkg.name.is_empty());
            let pkg = Arc::new(pkg);

            index
                .by_name
                .entry(pkg.name.clone())
                .or_default()
                .push(pkg.clone());

            for cap in &pkg.provides {
                index
                    .by_provide
                    .entry(cap.clone())
                    .or_default()
                    .push(pkg.clone());
            }

            // file paths are capabilities too, mirrored into by_provide
            for path in &pkg.files {
                index
                    .by_file
                    .entry(path.clone())
                    .or_default()
                    .push(pkg.clone());
                index
                    .by_provide
                    .entry(path.clone())
                    .or_default()
                    .push(pkg.clone());
            }
        }

        index
    }

    /// Concatenate another index into this one
    pub fn merge_from(&mut self, other: RepoIndex) {
        for (name, pkgs) in other.by_name {
            self.by_name.entry(name).or_default().extend(pkgs);
        }
        for (cap, pkgs) in other.by_provide {
            self.by_provide.entry(cap).or_default().extend(pkgs);
        }
        for (path, pkgs) in other.by_file {
            self.by_file.entry(path).or_default().extend(pkgs);
        }
        for (id, members) in other.groups {
            self.groups.entry(id).or_insert(members);
        }
    }

    /// Number of distinct package names indexed
    pub fn name_count(&self) -> usize {
        self.by_name.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }

    /// Select a package by name with the seeding arch-preference rule:
    /// exact arch match, else first `noarch` entry, else first entry.
    pub fn select_named(&self, name: &str, preferred_arch: &str) -> Option<&Arc<PkgMeta>> {
        let candidates = self.by_name.get(name)?;
        candidates
            .iter()
            .find(|p| p.arch == preferred_arch)
            .or_else(|| candidates.iter().find(|p| p.arch == "noarch"))
            .or_else(|| candidates.first())
    }

    /// Pick the provider of a capability
    ///
    /// Preference order: a candidate matching the preferred arch (self-named
    /// candidates win among arch matches), then a `noarch` candidate with the
    /// same self-naming tiebreak, then the first candidate. Deterministic for
    /// a given index and arch preference.
    pub fn pick_provider(
        &self,
        capability: &str,
        preferred_arch: Option<&str>,
    ) -> Option<&Arc<PkgMeta>> {
        let candidates = self.by_provide.get(capability)?;
        if candidates.is_empty() {
            return None;
        }

        if let Some(arch) = preferred_arch {
            let mut first_arch_match = None;
            for pkg in candidates {
                if pkg.arch == arch {
                    if pkg.name == capability {
                        return Some(pkg);
                    }
                    first_arch_match.get_or_insert(pkg);
                }
            }
            if first_arch_match.is_some() {
                return first_arch_match;
            }
        }

        let mut first_noarch = None;
        for pkg in candidates {
            if pkg.arch == "noarch" {
                if pkg.name == capability {
                    return Some(pkg);
                }
                first_noarch.get_or_insert(pkg);
            }
        }
        if first_noarch.is_some() {
            return first_noarch;
        }

        candidates.first()
    }
}
