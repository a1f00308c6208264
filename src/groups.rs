// src/groups.rs

//! Group/preset expansion
//!
//! KS tokens may name a comps group rather than a literal package. Expansion
//! replaces every token matching a known group id with that group's package
//! list and passes everything else through unchanged. One level deep only:
//! groups naming other groups are not chased.

use crate::ks::KsParseResult;
use crate::repomd::RepoIndex;
use std::collections::BTreeSet;
use tracing::debug;

/// Expand a KS parse result into the seed package list for resolution
///
/// Tokens excluded via `-name` (and whole groups via `-@group`) are dropped.
/// The output is deduplicated and sorted.
pub fn expand(index: &RepoIndex, ks: &KsParseResult) -> Vec<String> {
    let mut seeds = BTreeSet::new();

    for token in &ks.includes {
        if ks.excludes.contains(token) {
            continue;
        }
        match index.groups.get(token) {
            Some(members) => {
                debug!("Include token {} expands to {} packages", token, members.len());
                add_members(&mut seeds, members, &ks.excludes);
            }
            None => {
                seeds.insert(token.clone());
            }
        }
    }

    for group in &ks.groups {
        if ks.excludes.contains(&format!("@{group}")) {
            continue;
        }
        match index.groups.get(group) {
            Some(members) => add_members(&mut seeds, members, &ks.excludes),
            None => {
                debug!("Unknown group {}, passing through as a package name", group);
                seeds.insert(group.clone());
            }
        }
    }

    seeds.into_iter().collect()
}

fn add_members(seeds: &mut BTreeSet<String>, members: &[String], excludes: &BTreeSet<String>) {
    for member in members {
        if !excludes.contains(member) {
            seeds.insert(member.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repomd::RepoIndex;
    use std::collections::BTreeMap;

    fn index_with_groups() -> RepoIndex {
        let mut groups = BTreeMap::new();
        groups.insert(
            "core".to_string(),
            vec!["bash".to_string(), "coreutils".to_string()],
        );
        groups.insert("devel".to_string(), vec!["gcc".to_string()]);
        RepoIndex::from_packages(Vec::new(), groups)
    }

    fn ks(includes: &[&str], groups: &[&str], excludes: &[&str]) -> KsParseResult {
        KsParseResult {
            includes: includes.iter().map(|s| s.to_string()).collect(),
            groups: groups.iter().map(|s| s.to_string()).collect(),
            excludes: excludes.iter().map(|s| s.to_string()).collect(),
            sources: Vec::new(),
        }
    }

    #[test]
    fn test_group_reference_expands() {
        let index = index_with_groups();
        let seeds = expand(&index, &ks(&["vim"], &["core"], &[]));
        assert_eq!(seeds, vec!["bash", "coreutils", "vim"]);
    }

    #[test]
    fn test_include_token_matching_group_id_expands() {
        let index = index_with_groups();
        let seeds = expand(&index, &ks(&["devel"], &[], &[]));
        assert_eq!(seeds, vec!["gcc"]);
    }

    #[test]
    fn test_unknown_tokens_pass_through() {
        let index = index_with_groups();
        let seeds = expand(&index, &ks(&["randompkg"], &["missinggroup"], &[]));
        assert_eq!(seeds, vec!["missinggroup", "randompkg"]);
    }

    #[test]
    fn test_excludes_dropped() {
        let index = index_with_groups();
        let seeds = expand(
            &index,
            &ks(&["vim", "nano"], &["core", "devel"], &["nano", "bash", "@devel"]),
        );
        assert_eq!(seeds, vec!["coreutils", "vim"]);
    }
}
