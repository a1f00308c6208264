// src/download/urls.rs

//! Candidate download URL generation
//!
//! Repository layouts disagree about where the arch directory lives: the
//! repo base may already end in it, the `href` may carry it, and some debug
//! trees flatten it away entirely even though their metadata hrefs still
//! mention it. Rather than guessing one joining rule, every task gets an
//! ordered list of candidate URLs that successively strips the arch segment
//! from the href, from the base, or from both; the downloader short-circuits
//! on the first candidate that works.

/// Ordered, deduplicated candidate URLs for one package file
pub fn candidate_urls(repo_base: &str, href: &str, arch: &str) -> Vec<String> {
    let base = repo_base.trim_end_matches('/');
    let href = href.trim_start_matches('/');

    let base_stripped = base
        .strip_suffix(arch)
        .and_then(|b| b.strip_suffix('/'))
        .map(str::to_string);
    let href_stripped = href.strip_prefix(&format!("{arch}/")).map(str::to_string);

    let mut candidates = Vec::new();

    // a shared arch segment must not be doubled, so that join comes first
    if base_stripped.is_some() {
        if let Some(h) = &href_stripped {
            push_unique(&mut candidates, join(base, h));
        }
    }
    push_unique(&mut candidates, join(base, href));
    if let Some(h) = &href_stripped {
        push_unique(&mut candidates, join(base, h));
    }
    if let Some(b) = &base_stripped {
        push_unique(&mut candidates, join(b, href));
        if let Some(h) = &href_stripped {
            push_unique(&mut candidates, join(b, h));
        }
    }

    candidates
}

fn join(base: &str, rel: &str) -> String {
    format!("{base}/{rel}")
}

fn push_unique(candidates: &mut Vec<String>, url: String) {
    if !candidates.contains(&url) {
        candidates.push(url);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shared_arch_segment_not_doubled() {
        let candidates = candidate_urls(
            "http://repo/standard/packages/x86_64",
            "x86_64/foo-1.0.rpm",
            "x86_64",
        );
        // the preferred join strips the shared segment instead of doubling it
        assert_eq!(
            candidates[0],
            "http://repo/standard/packages/x86_64/foo-1.0.rpm"
        );
        assert!(!candidates[0].contains("x86_64/x86_64"));
    }

    #[test]
    fn test_flattened_debug_layout_covered() {
        // metadata href mentions an arch directory that does not exist on disk
        let candidates = candidate_urls(
            "http://repo/standard/debug",
            "x86_64/foo-debuginfo-1.0.rpm",
            "x86_64",
        );
        assert!(candidates.contains(&"http://repo/standard/debug/foo-debuginfo-1.0.rpm".to_string()));
        assert!(candidates
            .contains(&"http://repo/standard/debug/x86_64/foo-debuginfo-1.0.rpm".to_string()));
    }

    #[test]
    fn test_href_without_arch_prefix() {
        let candidates = candidate_urls(
            "http://repo/standard/packages/x86_64",
            "foo-1.0.rpm",
            "x86_64",
        );
        assert_eq!(
            candidates[0],
            "http://repo/standard/packages/x86_64/foo-1.0.rpm"
        );
        // base with its arch stripped is still offered as a fallback
        assert!(candidates.contains(&"http://repo/standard/packages/foo-1.0.rpm".to_string()));
    }

    #[test]
    fn test_candidates_are_unique_and_ordered() {
        let candidates = candidate_urls("http://repo/base", "pkg.rpm", "x86_64");
        assert_eq!(candidates, vec!["http://repo/base/pkg.rpm".to_string()]);
    }
}
