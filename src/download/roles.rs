// src/download/roles.rs

//! Repository role derivation
//!
//! Tizen-style trees host base RPMs and their debuginfo siblings in parallel
//! hierarchies that differ by a single path segment:
//! `…/repos/standard/packages/<arch>/` vs `…/repos/standard/debug/<arch>/`.
//! A user-supplied base recognized as one role derives its sibling for the
//! other role by a pure, invertible segment substitution. The opt-out uses
//! supplied repos verbatim for both roles.

use tracing::warn;

/// Repositories split by role
#[derive(Debug, Default, PartialEq, Eq)]
pub struct RepoRoles {
    /// Feed the dependency resolver and base downloads
    pub packages: Vec<String>,
    /// Consulted only for debuginfo/debugsource lookups
    pub debug: Vec<String>,
}

/// Derive packages/debug role lists from user-supplied repo bases
pub fn derive_roles(repos: &[String], derive_siblings: bool) -> RepoRoles {
    let mut roles = RepoRoles::default();

    if !derive_siblings {
        roles.packages = repos.to_vec();
        roles.debug = repos.to_vec();
        return roles;
    }

    for repo in repos {
        match classify(repo) {
            Some(Role::Packages) => {
                push_unique(&mut roles.packages, repo.clone());
                push_unique(&mut roles.debug, swap_segment(repo, "packages", "debug"));
            }
            Some(Role::Debug) => {
                push_unique(&mut roles.debug, repo.clone());
                push_unique(&mut roles.packages, swap_segment(repo, "debug", "packages"));
            }
            None => {
                warn!(
                    "Repository {} has no packages/debug path segment, using it for packages only",
                    repo
                );
                push_unique(&mut roles.packages, repo.clone());
            }
        }
    }

    roles
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Role {
    Packages,
    Debug,
}

/// Classify a repo base by its rightmost packages/debug path segment
fn classify(repo: &str) -> Option<Role> {
    let segments: Vec<&str> = repo.split('/').collect();
    let packages_pos = segments.iter().rposition(|s| *s == "packages");
    let debug_pos = segments.iter().rposition(|s| *s == "debug");

    match (packages_pos, debug_pos) {
        (Some(p), Some(d)) => Some(if p > d { Role::Packages } else { Role::Debug }),
        (Some(_), None) => Some(Role::Packages),
        (None, Some(_)) => Some(Role::Debug),
        (None, None) => None,
    }
}

/// Replace the rightmost path segment equal to `from` with `to`
fn swap_segment(repo: &str, from: &str, to: &str) -> String {
    let mut segments: Vec<&str> = repo.split('/').collect();
    if let Some(pos) = segments.iter().rposition(|s| *s == from) {
        segments[pos] = to;
    }
    segments.join("/")
}

fn push_unique(list: &mut Vec<String>, value: String) {
    if !list.contains(&value) {
        list.push(value);
    }
}
