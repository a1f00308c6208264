// src/resolver/mod.rs

//! Dependency closure resolution
//!
//! A worklist BFS over `(name, arch)` keys. Each dequeued package's
//! `requires` capabilities are mapped to providers through
//! [`RepoIndex::pick_provider`]; unseen providers are enqueued, capabilities
//! with no provider anywhere are recorded as missing and resolution
//! continues. The visited set tolerates cycles in the requires graph.
//!
//! This phase is single-threaded on purpose: provider selection order
//! decides which duplicate provider across mirrored repos wins, so the
//! traversal must be deterministic given the same index contents.

use crate::repomd::{PkgMeta, RepoIndex};
use std::collections::{BTreeSet, HashSet, VecDeque};
use std::sync::Arc;
use tracing::{debug, warn};

/// Outcome of one resolution pass
#[derive(Debug, Default)]
pub struct Resolution {
    /// Resolved `(name, arch)` pairs, including the seeds
    pub packages: BTreeSet<(String, String)>,
    /// Capabilities (or seed names) for which no provider exists
    pub missing: BTreeSet<String>,
}

impl Resolution {
    /// Sorted, deduplicated package names for report output
    pub fn package_names(&self) -> Vec<String> {
        let names: BTreeSet<&String> = self.packages.iter().map(|(name, _)| name).collect();
        names.into_iter().cloned().collect()
    }
}

/// Resolve the dependency closure of `seeds` against a merged index
pub fn resolve(index: &RepoIndex, seeds: &[String], arch: &str) -> Resolution {
    let mut visited: HashSet<(String, String)> = HashSet::new();
    let mut queue: VecDeque<Arc<PkgMeta>> = VecDeque::new();
    let mut missing = BTreeSet::new();

    for name in seeds {
        match index.select_named(name, arch) {
            Some(pkg) => {
                if visited.insert((pkg.name.clone(), pkg.arch.clone())) {
                    queue.push_back(pkg.clone());
                }
            }
            None => {
                warn!("Requested package {} not found in any repository", name);
                missing.insert(name.clone());
            }
        }
    }

    while let Some(pkg) = queue.pop_front() {
        // requires is an ordered set; iteration order is part of determinism
        for capability in &pkg.requires {
            match index.pick_provider(capability, Some(arch)) {
                Some(provider) => {
                    let key = (provider.name.clone(), provider.arch.clone());
                    if visited.insert(key) {
                        debug!(
                            "{} requires {} -> {} ({})",
                            pkg.name, capability, provider.name, provider.arch
                        );
                        queue.push_back(provider.clone());
                    }
                }
                None => {
                    if missing.insert(capability.clone()) {
                        warn!("No provider for capability {}", capability);
                    }
                }
            }
        }
    }

    Resolution {
        packages: visited.into_iter().collect(),
        missing,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn pkg(name: &str, arch: &str, provides: &[&str], requires: &[&str]) -> PkgMeta {
        let mut p = PkgMeta::new(
            name.to_string(),
            arch.to_string(),
            format!("{arch}/{name}-1.0.rpm"),
            "http://repo/packages/x86_64".to_string(),
        );
        p.provides = provides.iter().map(|s| s.to_string()).collect();
        p.requires = requires.iter().map(|s| s.to_string()).collect();
        p
    }

    fn index(packages: Vec<PkgMeta>) -> RepoIndex {
        RepoIndex::from_packages(packages, BTreeMap::new())
    }

    #[test]
    fn test_closure_follows_provides() {
        let index = index(vec![
            pkg("A", "x86_64", &["A"], &["cap1"]),
            pkg("B", "x86_64", &["B", "cap1"], &[]),
        ]);

        let resolution = resolve(&index, &["A".to_string()], "x86_64");
        assert_eq!(resolution.package_names(), vec!["A", "B"]);
        assert!(resolution.missing.is_empty());
    }

    #[test]
    fn test_missing_capability_is_recorded() {
        let index = index(vec![pkg("A", "x86_64", &["A"], &["cap1"])]);

        let resolution = resolve(&index, &["A".to_string()], "x86_64");
        assert_eq!(resolution.package_names(), vec!["A"]);
        assert_eq!(resolution.missing, BTreeSet::from(["cap1".to_string()]));
    }

    #[test]
    fn test_missing_seed_is_recorded() {
        let index = index(vec![]);
        let resolution = resolve(&index, &["ghost".to_string()], "x86_64");
        assert!(resolution.packages.is_empty());
        assert!(resolution.missing.contains("ghost"));
    }

    #[test]
    fn test_cycles_terminate() {
        let index = index(vec![
            pkg("A", "x86_64", &["A"], &["B"]),
            pkg("B", "x86_64", &["B"], &["A"]),
        ]);

        let resolution = resolve(&index, &["A".to_string()], "x86_64");
        assert_eq!(resolution.package_names(), vec!["A", "B"]);
        assert!(resolution.missing.is_empty());
    }

    #[test]
    fn test_transitive_chain_through_file_capability() {
        let index = index(vec![
            pkg("A", "x86_64", &["A"], &["libb"]),
            pkg("B", "x86_64", &["B", "libb"], &["/usr/bin/c"]),
            {
                let mut c = pkg("C", "x86_64", &["C"], &[]);
                c.files.insert("/usr/bin/c".to_string());
                c
            },
        ]);

        let resolution = resolve(&index, &["A".to_string()], "x86_64");
        assert_eq!(resolution.package_names(), vec!["A", "B", "C"]);
    }

    #[test]
    fn test_deterministic_across_runs() {
        let packages = vec![
            pkg("A", "x86_64", &["A"], &["shared"]),
            pkg("P1", "x86_64", &["P1", "shared"], &[]),
            pkg("P2", "x86_64", &["P2", "shared"], &[]),
        ];

        let first = resolve(&index(packages.clone()), &["A".to_string()], "x86_64");
        let second = resolve(&index(packages), &["A".to_string()], "x86_64");
        assert_eq!(first.packages, second.packages);
        // the first-listed provider wins both times
        assert!(first.packages.contains(&("P1".to_string(), "x86_64".to_string())));
        assert!(!first.packages.contains(&("P2".to_string(), "x86_64".to_string())));
    }

    #[test]
    fn test_noarch_provider_traversed() {
        let index = index(vec![
            pkg("A", "x86_64", &["A"], &["data-cap"]),
            pkg("data", "noarch", &["data", "data-cap"], &[]),
        ]);

        let resolution = resolve(&index, &["A".to_string()], "x86_64");
        assert!(resolution
            .packages
            .contains(&("data".to_string(), "noarch".to_string())));
    }
}
