// src/repomd/group.rs

//! Parser for comps-style `group` metadata
//!
//! Yields group id -> member package names, taking `mandatory` and `default`
//! entries (an absent `type` attribute means mandatory per the comps schema)
//! and ignoring optional/conditional members.

use super::primary::attr_value;
use crate::error::Result;
use quick_xml::events::Event;
use quick_xml::Reader;
use std::collections::BTreeMap;

#[derive(Clone, Copy, PartialEq)]
enum TextTarget {
    GroupId,
    PackageReq,
}

/// Parse comps XML into a group membership table
pub fn parse_groups(data: &[u8]) -> Result<BTreeMap<String, Vec<String>>> {
    let mut reader = Reader::from_reader(data);
    let mut buf = Vec::new();

    let mut groups = BTreeMap::new();
    let mut in_group = false;
    let mut group_id: Option<String> = None;
    let mut members: Vec<String> = Vec::new();
    let mut text_target: Option<TextTarget> = None;
    let mut req_wanted = false;

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) => match e.local_name().as_ref() {
                b"group" => {
                    in_group = true;
                    group_id = None;
                    members.clear();
                }
                b"id" if in_group && group_id.is_none() => {
                    text_target = Some(TextTarget::GroupId);
                }
                b"packagereq" if in_group => {
                    let req_type = attr_value(&e, "type").unwrap_or_default();
                    req_wanted =
                        req_type.is_empty() || req_type == "mandatory" || req_type == "default";
                    text_target = Some(TextTarget::PackageReq);
                }
                _ => {}
            },
            Event::Text(t) => {
                if let Some(target) = text_target {
                    let text = t.unescape()?.trim().to_string();
                    if !text.is_empty() {
                        match target {
                            TextTarget::GroupId => group_id = Some(text),
                            TextTarget::PackageReq => {
                                if req_wanted {
                                    members.push(text);
                                }
                            }
                        }
                    }
                }
            }
            Event::End(e) => match e.local_name().as_ref() {
                b"id" | b"packagereq" => text_target = None,
                b"group" => {
                    if let Some(id) = group_id.take() {
                        groups.entry(id).or_insert_with(|| std::mem::take(&mut members));
                    }
                    in_group = false;
                    members.clear();
                }
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    Ok(groups)
}

#[cfg(test)]
mod tests {
    use super::*;

    const COMPS: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<comps>
  <group>
    <id>core</id>
    <name>Core</name>
    <packagelist>
      <packagereq type="mandatory">bash</packagereq>
      <packagereq type="default">coreutils</packagereq>
      <packagereq type="optional">emacs</packagereq>
      <packagereq>sed</packagereq>
    </packagelist>
  </group>
  <group>
    <id>devel</id>
    <packagelist>
      <packagereq type="mandatory">gcc</packagereq>
    </packagelist>
  </group>
</comps>"#;

    #[test]
    fn test_parse_groups() {
        let groups = parse_groups(COMPS.as_bytes()).unwrap();
        assert_eq!(groups.len(), 2);
        assert_eq!(
            groups.get("core").unwrap(),
            &vec!["bash".to_string(), "coreutils".to_string(), "sed".to_string()]
        );
        assert_eq!(groups.get("devel").unwrap(), &vec!["gcc".to_string()]);
    }
}
