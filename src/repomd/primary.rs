// src/repomd/primary.rs

//! Parser for RPM-MD `primary` metadata
//!
//! Produces one [`PkgMeta`] per `<package>` element, with the
//! provides/requires capability sets. `rpmlib(...)` pseudo-requirements name
//! packaging-tool features rather than real packages and are skipped.

use super::index::PkgMeta;
use crate::error::{Error, Result};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use tracing::debug;

/// Read one attribute value from a start/empty element
pub(super) fn attr_value(e: &BytesStart, name: &str) -> Option<String> {
    e.try_get_attribute(name)
        .ok()
        .flatten()
        .and_then(|a| a.unescape_value().ok())
        .map(|v| v.into_owned())
}

#[derive(Clone, Copy, PartialEq)]
enum TextTarget {
    Name,
    Arch,
}

#[derive(Clone, Copy, PartialEq)]
enum CapSection {
    Provides,
    Requires,
}

/// Parse `primary` XML into package records owned by `repo_base`
pub fn parse_primary(data: &[u8], repo_base: &str) -> Result<Vec<PkgMeta>> {
    let mut reader = Reader::from_reader(data);
    let mut buf = Vec::new();

    let mut packages = Vec::new();
    let mut current: Option<PkgMeta> = None;
    let mut text_target: Option<TextTarget> = None;
    let mut section: Option<CapSection> = None;

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) => match e.local_name().as_ref() {
                b"package" => {
                    current = Some(PkgMeta::new(
                        String::new(),
                        String::new(),
                        String::new(),
                        repo_base.to_string(),
                    ));
                    section = None;
                    text_target = None;
                }
                b"name" if current.is_some() && section.is_none() => {
                    text_target = Some(TextTarget::Name);
                }
                b"arch" if current.is_some() && section.is_none() => {
                    text_target = Some(TextTarget::Arch);
                }
                b"location" => {
                    if let (Some(pkg), Some(href)) = (current.as_mut(), attr_value(&e, "href")) {
                        pkg.href = href;
                    }
                }
                b"provides" => section = Some(CapSection::Provides),
                b"requires" => section = Some(CapSection::Requires),
                b"entry" => record_entry(&e, section, current.as_mut()),
                _ => {}
            },
            Event::Empty(e) => match e.local_name().as_ref() {
                b"location" => {
                    if let (Some(pkg), Some(href)) = (current.as_mut(), attr_value(&e, "href")) {
                        pkg.href = href;
                    }
                }
                b"entry" => record_entry(&e, section, current.as_mut()),
                _ => {}
            },
            Event::Text(t) => {
                if let (Some(target), Some(pkg)) = (text_target, current.as_mut()) {
                    let text = t.unescape()?.trim().to_string();
                    if !text.is_empty() {
                        match target {
                            TextTarget::Name => pkg.name = text,
                            TextTarget::Arch => pkg.arch = text,
                        }
                    }
                }
            }
            Event::End(e) => match e.local_name().as_ref() {
                b"package" => {
                    if let Some(pkg) = current.take() {
                        if pkg.name.is_empty() {
                            debug!("Dropping primary entry without a name");
                        } else {
                            packages.push(pkg);
                        }
                    }
                }
                b"name" | b"arch" => text_target = None,
                b"provides" | b"requires" => section = None,
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    if packages.is_empty() {
        return Err(Error::MetadataError(
            "primary metadata contained no packages".to_string(),
        ));
    }

    Ok(packages)
}

/// Record one `<rpm:entry name=...>` capability into the open section
fn record_entry(e: &BytesStart, section: Option<CapSection>, pkg: Option<&mut PkgMeta>) {
    let (Some(section), Some(pkg)) = (section, pkg) else {
        return;
    };
    let Some(name) = attr_value(e, "name") else {
        return;
    };

    match section {
        CapSection::Provides => {
            pkg.provides.insert(name);
        }
        CapSection::Requires => {
            // packaging-tool features, not resolvable packages
            if !name.starts_with("rpmlib(") {
                pkg.requires.insert(name);
            }
        }
    }
}
