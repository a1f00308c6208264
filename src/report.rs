// src/report.rs

//! Report formatting for resolved package sets
//!
//! Pure formatting over the pipeline's outputs: a plain package list, a JSON
//! document, and a Markdown summary. No resolution logic lives here.

use crate::error::Result;
use crate::ks::KsParseResult;
use crate::resolver::Resolution;
use serde::Serialize;

/// Everything a run produced that reports care about
#[derive(Debug, Serialize)]
pub struct Report {
    /// Resolved, deduplicated, sorted package names
    pub packages: Vec<String>,
    /// Group/preset tokens encountered in the kickstart
    pub groups: Vec<String>,
    /// Exclude tokens encountered in the kickstart
    pub excludes: Vec<String>,
    /// KS sources actually parsed, in parse order
    pub sources: Vec<String>,
    /// Capabilities with no provider anywhere
    pub missing: Vec<String>,
}

impl Report {
    pub fn new(ks: &KsParseResult, resolution: &Resolution) -> Self {
        Self {
            packages: resolution.package_names(),
            groups: ks.groups.iter().cloned().collect(),
            excludes: ks.excludes.iter().cloned().collect(),
            sources: ks.sources.clone(),
            missing: resolution.missing.iter().cloned().collect(),
        }
    }

    /// One package name per line
    pub fn to_plain(&self) -> String {
        let mut out = self.packages.join("\n");
        out.push('\n');
        out
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn to_markdown(&self) -> String {
        let mut out = String::new();
        out.push_str("# Package resolution report\n\n");

        out.push_str("## Sources\n\n");
        for source in &self.sources {
            out.push_str(&format!("- `{source}`\n"));
        }

        out.push_str(&format!("\n## Packages ({})\n\n", self.packages.len()));
        for name in &self.packages {
            out.push_str(&format!("- {name}\n"));
        }

        if !self.groups.is_empty() {
            out.push_str("\n## Groups\n\n");
            for group in &self.groups {
                out.push_str(&format!("- @{group}\n"));
            }
        }

        if !self.excludes.is_empty() {
            out.push_str("\n## Excluded\n\n");
            for token in &self.excludes {
                out.push_str(&format!("- {token}\n"));
            }
        }

        if !self.missing.is_empty() {
            out.push_str(&format!("\n## Missing capabilities ({})\n\n", self.missing.len()));
            for capability in &self.missing {
                out.push_str(&format!("- {capability}\n"));
            }
        }

        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    fn sample() -> Report {
        let ks = KsParseResult {
            includes: BTreeSet::from(["foo".to_string()]),
            excludes: BTreeSet::from(["nope".to_string()]),
            groups: BTreeSet::from(["core".to_string()]),
            sources: vec!["/srv/ks/main.ks".to_string()],
        };
        let resolution = Resolution {
            packages: BTreeSet::from([
                ("foo".to_string(), "x86_64".to_string()),
                ("bar".to_string(), "noarch".to_string()),
            ]),
            missing: BTreeSet::from(["libghost.so".to_string()]),
        };
        Report::new(&ks, &resolution)
    }

    #[test]
    fn test_plain_output_sorted() {
        let report = sample();
        assert_eq!(report.to_plain(), "bar\nfoo\n");
    }

    #[test]
    fn test_json_round_trips() {
        let report = sample();
        let json = report.to_json().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["packages"][0], "bar");
        assert_eq!(value["missing"][0], "libghost.so");
    }

    #[test]
    fn test_markdown_sections() {
        let report = sample();
        let md = report.to_markdown();
        assert!(md.contains("## Packages (2)"));
        assert!(md.contains("- @core"));
        assert!(md.contains("## Missing capabilities (1)"));
    }
}
