// src/repomd/filelists.rs

//! Parser for RPM-MD `filelists` metadata (XML encoding)
//!
//! Filelists never introduce packages; they augment the records produced by
//! the primary parser with absolute file paths, which then act as synthetic
//! provides during resolution.

use super::index::PkgMeta;
use super::primary::attr_value;
use crate::error::Result;
use quick_xml::events::Event;
use quick_xml::Reader;
use std::collections::HashMap;
use tracing::debug;

/// Locates already-parsed packages by `(name, arch)`, falling back to the
/// first entry with a matching name when the arch misses.
pub(super) struct PkgLocator {
    by_name_arch: HashMap<(String, String), usize>,
    first_by_name: HashMap<String, usize>,
}

impl PkgLocator {
    pub(super) fn new(packages: &[PkgMeta]) -> Self {
        let mut by_name_arch = HashMap::new();
        let mut first_by_name = HashMap::new();
        for (idx, pkg) in packages.iter().enumerate() {
            by_name_arch
                .entry((pkg.name.clone(), pkg.arch.clone()))
                .or_insert(idx);
            first_by_name.entry(pkg.name.clone()).or_insert(idx);
        }
        Self {
            by_name_arch,
            first_by_name,
        }
    }

    pub(super) fn find(&self, name: &str, arch: &str) -> Option<usize> {
        self.by_name_arch
            .get(&(name.to_string(), arch.to_string()))
            .or_else(|| self.first_by_name.get(name))
            .copied()
    }
}

/// Apply `filelists` XML to the packages parsed from primary metadata
pub fn apply_filelists(data: &[u8], packages: &mut [PkgMeta]) -> Result<()> {
    let locator = PkgLocator::new(packages);
    let mut reader = Reader::from_reader(data);
    let mut buf = Vec::new();

    let mut current: Option<usize> = None;
    let mut in_file = false;
    let mut applied = 0usize;

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) => match e.local_name().as_ref() {
                b"package" => {
                    let name = attr_value(&e, "name").unwrap_or_default();
                    let arch = attr_value(&e, "arch").unwrap_or_default();
                    current = locator.find(&name, &arch);
                    if current.is_none() && !name.is_empty() {
                        debug!("filelists entry for unknown package {name}");
                    }
                }
                b"file" => in_file = true,
                _ => {}
            },
            Event::Text(t) => {
                if in_file {
                    if let Some(idx) = current {
                        let path = t.unescape()?.trim().to_string();
                        if !path.is_empty() {
                            packages[idx].files.insert(path);
                            applied += 1;
                        }
                    }
                }
            }
            Event::End(e) => match e.local_name().as_ref() {
                b"file" => in_file = false,
                b"package" => current = None,
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    debug!("filelists contributed {applied} file paths");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_packages() -> Vec<PkgMeta> {
        vec![
            PkgMeta::new(
                "gawk".to_string(),
                "x86_64".to_string(),
                "x86_64/gawk.rpm".to_string(),
                "http://repo".to_string(),
            ),
            PkgMeta::new(
                "gawk".to_string(),
                "aarch64".to_string(),
                "aarch64/gawk.rpm".to_string(),
                "http://repo".to_string(),
            ),
        ]
    }

    const FILELISTS: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<filelists xmlns="http://linux.duke.edu/metadata/filelists" packages="1">
  <package pkgid="abc" name="gawk" arch="x86_64">
    <version epoch="0" ver="5.0" rel="1"/>
    <file>/usr/bin/awk</file>
    <file>/usr/bin/gawk</file>
  </package>
  <package pkgid="def" name="gawk" arch="riscv64">
    <version epoch="0" ver="5.0" rel="1"/>
    <file>/usr/bin/awk-riscv</file>
  </package>
</filelists>"#;

    #[test]
    fn test_apply_filelists() {
        let mut packages = base_packages();
        apply_filelists(FILELISTS.as_bytes(), &mut packages).unwrap();

        assert!(packages[0].files.contains("/usr/bin/awk"));
        assert!(packages[0].files.contains("/usr/bin/gawk"));
        // arch miss falls back to the first name match
        assert!(packages[0].files.contains("/usr/bin/awk-riscv"));
        assert!(packages[1].files.is_empty());
    }
}
