// src/ks/mod.rs

//! Kickstart script parsing
//!
//! Turns a KS entry point (URL or local path) plus a target architecture into
//! a flat package/group/exclude set. `%include` directives are followed
//! recursively with cycle protection, so a KS tree of any shape collapses
//! into one [`KsParseResult`].
//!
//! An unreadable KS source is fatal for the whole run: the dependency
//! closure is only correct when the seed set is complete.

mod parser;

use crate::error::Result;
use crate::fetcher::Fetcher;
use std::collections::BTreeSet;

pub use parser::resolve_relative;

/// Flattened outcome of parsing a kickstart tree
///
/// Ordered sets keep re-parsing deterministic regardless of include order or
/// filesystem iteration. `sources` records every resource actually parsed, in
/// parse order, for report output.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KsParseResult {
    /// Plain package names requested for installation
    pub includes: BTreeSet<String>,
    /// Excluded tokens; a group exclusion keeps its `@` prefix
    pub excludes: BTreeSet<String>,
    /// Group references (without the `@` prefix)
    pub groups: BTreeSet<String>,
    /// Every KS resource parsed, entry point first
    pub sources: Vec<String>,
}

impl KsParseResult {
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge a child parse (an `%include` target) into this result
    pub fn merge_from(&mut self, other: KsParseResult) {
        self.includes.extend(other.includes);
        self.excludes.extend(other.excludes);
        self.groups.extend(other.groups);
        self.sources.extend(other.sources);
    }
}

/// Parse a kickstart entry point for the given target architecture
pub fn parse(fetcher: &Fetcher, entry: &str, arch: &str) -> Result<KsParseResult> {
    let mut parser = parser::KsParser::new(fetcher, arch);
    parser.parse_resource(entry)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn parse_file(dir: &tempfile::TempDir, name: &str, arch: &str) -> KsParseResult {
        let fetcher = Fetcher::with_defaults().unwrap();
        let path = dir.path().join(name);
        parse(&fetcher, path.to_str().unwrap(), arch).unwrap()
    }

    #[test]
    fn test_token_classification() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("a.ks"),
            "%packages\n+foo -bar -@grp @othergrp\n%end\n",
        )
        .unwrap();

        let result = parse_file(&dir, "a.ks", "x86_64");
        assert_eq!(result.includes, BTreeSet::from(["foo".to_string()]));
        assert_eq!(
            result.excludes,
            BTreeSet::from(["bar".to_string(), "@grp".to_string()])
        );
        assert_eq!(result.groups, BTreeSet::from(["othergrp".to_string()]));
    }

    #[test]
    fn test_ifarch_else() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("a.ks"),
            "%packages\n%ifarch x86_64\nA\n%else\nB\n%endif\n%end\n",
        )
        .unwrap();

        let on_x86 = parse_file(&dir, "a.ks", "x86_64");
        assert!(on_x86.includes.contains("A"));
        assert!(!on_x86.includes.contains("B"));

        let on_arm = parse_file(&dir, "a.ks", "aarch64");
        assert!(!on_arm.includes.contains("A"));
        assert!(on_arm.includes.contains("B"));
    }

    #[test]
    fn test_nested_conditionals() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("a.ks"),
            concat!(
                "%packages\n",
                "%if 1\n",
                "%ifarch aarch64\n",
                "inner\n",
                "%endif\n",
                "outer\n",
                "%endif\n",
                "%end\n",
            ),
        )
        .unwrap();

        let result = parse_file(&dir, "a.ks", "x86_64");
        assert!(result.includes.contains("outer"));
        assert!(!result.includes.contains("inner"));
    }

    #[test]
    fn test_if_integer_bases() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("a.ks"),
            concat!(
                "%packages\n",
                "%if 0x10\nhex\n%endif\n",
                "%if 010\noctal\n%endif\n",
                "%if 0\nzero\n%endif\n",
                "%end\n",
            ),
        )
        .unwrap();

        let result = parse_file(&dir, "a.ks", "x86_64");
        assert!(result.includes.contains("hex"));
        assert!(result.includes.contains("octal"));
        assert!(!result.includes.contains("zero"));
    }

    #[test]
    fn test_include_merging_and_sources_order() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("main.ks"),
            "%include common.ks\n%packages\ntop\n%end\n",
        )
        .unwrap();
        fs::write(dir.path().join("common.ks"), "%packages\nshared\n%end\n").unwrap();

        let result = parse_file(&dir, "main.ks", "x86_64");
        assert!(result.includes.contains("top"));
        assert!(result.includes.contains("shared"));
        assert_eq!(result.sources.len(), 2);
        assert!(result.sources[0].ends_with("main.ks"));
        assert!(result.sources[1].ends_with("common.ks"));
    }

    #[test]
    fn test_include_inside_inactive_conditional_ignored() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("main.ks"),
            "%ifarch aarch64\n%include arm.ks\n%endif\n%packages\nbase\n%end\n",
        )
        .unwrap();
        // arm.ks deliberately absent; an honored include would be fatal

        let result = parse_file(&dir, "main.ks", "x86_64");
        assert!(result.includes.contains("base"));
        assert_eq!(result.sources.len(), 1);
    }

    #[test]
    fn test_include_cycle_terminates() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("a.ks"),
            "%include b.ks\n%packages\nfrom_a\n%end\n",
        )
        .unwrap();
        fs::write(
            dir.path().join("b.ks"),
            "%include a.ks\n%packages\nfrom_b\n%end\n",
        )
        .unwrap();

        let result = parse_file(&dir, "a.ks", "x86_64");
        assert!(result.includes.contains("from_a"));
        assert!(result.includes.contains("from_b"));
        // each file parsed exactly once
        assert_eq!(result.sources.len(), 2);
    }

    #[test]
    fn test_missing_entry_is_fatal() {
        let fetcher = Fetcher::with_defaults().unwrap();
        let result = parse(&fetcher, "/nonexistent/build.ks", "x86_64");
        assert!(result.is_err());
    }

    #[test]
    fn test_idempotent_reparse() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("a.ks"),
            "%include b.ks\n%packages\nzeta alpha\n%end\n",
        )
        .unwrap();
        fs::write(dir.path().join("b.ks"), "%packages\nmid\n-drop\n%end\n").unwrap();

        let first = parse_file(&dir, "a.ks", "x86_64");
        let second = parse_file(&dir, "a.ks", "x86_64");
        assert_eq!(first, second);
    }

    #[test]
    fn test_comments_and_continuations() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("a.ks"),
            concat!(
                "%packages  # trailing comment\n",
                "alpha \\\n",
                "beta\n",
                "# whole-line comment\n",
                "--option-noise\n",
                "%end\n",
            ),
        )
        .unwrap();

        let result = parse_file(&dir, "a.ks", "x86_64");
        assert!(result.includes.contains("alpha"));
        assert!(result.includes.contains("beta"));
        assert!(result.excludes.is_empty());
    }
}
