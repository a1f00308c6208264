// src/repomd/other.rs

//! Parser for RPM-MD `other` metadata
//!
//! The only thing we take from `other` is the per-package `pkgid` attribute.
//! Packages missing from `other`, or an absent `other` payload altogether,
//! are fine: `pkgid` stays `None`.

use super::filelists::PkgLocator;
use super::index::PkgMeta;
use super::primary::attr_value;
use crate::error::Result;
use quick_xml::events::Event;
use quick_xml::Reader;

/// Attach `pkgid` values from `other` XML onto matching packages
pub fn apply_other(data: &[u8], packages: &mut [PkgMeta]) -> Result<()> {
    let locator = PkgLocator::new(packages);
    let mut reader = Reader::from_reader(data);
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) | Event::Empty(e) => {
                if e.local_name().as_ref() == b"package" {
                    let name = attr_value(&e, "name").unwrap_or_default();
                    let arch = attr_value(&e, "arch").unwrap_or_default();
                    if let (Some(idx), Some(pkgid)) =
                        (locator.find(&name, &arch), attr_value(&e, "pkgid"))
                    {
                        packages[idx].pkgid = Some(pkgid);
                    }
                }
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    Ok(())
}
