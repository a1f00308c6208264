// src/ks/parser.rs

//! The kickstart line parser
//!
//! A small state machine with two orthogonal axes: the conditional-activity
//! stack (`%if` / `%ifarch` / `%else` / `%endif`) and a flag tracking whether
//! we are inside a `%packages` block. Input lines are joined across backslash
//! continuations, stripped of inline comments, then tokenized on whitespace.

use super::KsParseResult;
use crate::error::{Error, Result};
use crate::fetcher::{is_remote, Fetcher};
use std::collections::HashSet;
use std::path::Path;
use tracing::{debug, warn};
use url::Url;

/// Conditional-activity stack for `%if`-family directives
///
/// `active()` is the AND of the whole stack. A parallel branch-taken stack
/// remembers whether each level's original branch held, which is what `%else`
/// inverts. The stack never empties: popping the last entry restores the
/// `true` sentinel.
struct ConditionalState {
    stack: Vec<bool>,
    taken: Vec<bool>,
}

impl ConditionalState {
    fn new() -> Self {
        Self {
            stack: vec![true],
            taken: vec![true],
        }
    }

    fn active(&self) -> bool {
        self.stack.iter().all(|&b| b)
    }

    fn push(&mut self, value: bool) {
        self.stack.push(value);
        self.taken.push(value);
    }

    fn flip_else(&mut self) {
        if let (Some(top), Some(&was_taken)) = (self.stack.last_mut(), self.taken.last()) {
            *top = !was_taken;
        }
    }

    fn pop(&mut self) {
        self.stack.pop();
        self.taken.pop();
        if self.stack.is_empty() {
            self.stack.push(true);
            self.taken.push(true);
        }
    }
}

/// Recursive kickstart parser sharing one visited set across includes
pub(super) struct KsParser<'a> {
    fetcher: &'a Fetcher,
    arch: &'a str,
    visited: HashSet<String>,
}

impl<'a> KsParser<'a> {
    pub(super) fn new(fetcher: &'a Fetcher, arch: &'a str) -> Self {
        Self {
            fetcher,
            arch,
            visited: HashSet::new(),
        }
    }

    /// Parse one resource (already resolved to an absolute identity)
    ///
    /// A resource seen before yields an empty result so that include cycles
    /// terminate and each file's content is counted exactly once.
    pub(super) fn parse_resource(&mut self, resource: &str) -> Result<KsParseResult> {
        if !self.visited.insert(resource.to_string()) {
            debug!("Skipping already-included kickstart {}", resource);
            return Ok(KsParseResult::new());
        }

        let text = self.fetcher.fetch_string(resource).map_err(|e| {
            Error::KsError(format!("Cannot read kickstart source {resource}: {e}"))
        })?;

        let mut result = KsParseResult::new();
        result.sources.push(resource.to_string());

        let mut cond = ConditionalState::new();
        let mut in_packages = false;

        for raw_line in logical_lines(&text) {
            let line = strip_comment(&raw_line);
            let line = line.trim();
            if line.is_empty() {
                continue;
            }

            let mut tokens = line.split_whitespace();
            let first = match tokens.next() {
                Some(t) => t,
                None => continue,
            };

            match first {
                "%include" => {
                    if cond.active() {
                        match tokens.next() {
                            Some(target) => {
                                let child = resolve_relative(resource, target);
                                let parsed = self.parse_resource(&child)?;
                                result.merge_from(parsed);
                            }
                            None => warn!("%include without a target in {}", resource),
                        }
                    }
                }
                "%ifarch" => {
                    let matched = tokens.any(|a| a == self.arch);
                    cond.push(matched);
                }
                "%if" => {
                    let value = tokens.next().and_then(parse_int_expr).unwrap_or(0);
                    cond.push(value != 0);
                }
                "%else" => cond.flip_else(),
                "%endif" => cond.pop(),
                "%packages" => in_packages = true,
                "%end" => in_packages = false,
                _ => {
                    if in_packages && cond.active() {
                        if first.starts_with("--") {
                            // option-like noise inside %packages
                            continue;
                        }
                        for token in std::iter::once(first).chain(tokens) {
                            classify_token(token, &mut result);
                        }
                    }
                }
            }
        }

        Ok(result)
    }
}

/// Classify one `%packages` token into the parse result
fn classify_token(token: &str, result: &mut KsParseResult) {
    if let Some(rest) = token.strip_prefix('-') {
        // group exclusions keep their '@' prefix, e.g. "-@grp" -> "@grp"
        result.excludes.insert(rest.to_string());
    } else if let Some(rest) = token.strip_prefix('@') {
        result.groups.insert(rest.to_string());
    } else if let Some(rest) = token.strip_prefix('+') {
        result.includes.insert(rest.to_string());
    } else {
        result.includes.insert(token.to_string());
    }
}

/// Join physical lines into logical lines across backslash continuations
fn logical_lines(text: &str) -> Vec<String> {
    let mut out = Vec::new();
    let mut current = String::new();

    for line in text.lines() {
        if let Some(stripped) = line.strip_suffix('\\') {
            current.push_str(stripped);
            continue;
        }
        current.push_str(line);
        out.push(std::mem::take(&mut current));
    }
    if !current.is_empty() {
        out.push(current);
    }
    out
}

/// Remove an inline comment: everything from an unescaped `#` to end of line
///
/// `\#` produces a literal hash; any other backslash passes through untouched.
fn strip_comment(line: &str) -> String {
    let mut out = String::with_capacity(line.len());
    let mut chars = line.chars().peekable();

    while let Some(ch) = chars.next() {
        match ch {
            '\\' => {
                if chars.peek() == Some(&'#') {
                    out.push('#');
                    chars.next();
                } else {
                    out.push('\\');
                }
            }
            '#' => break,
            _ => out.push(ch),
        }
    }
    out
}

/// Parse an integer with auto-detected base: `0x` hex, leading-zero octal,
/// decimal otherwise
fn parse_int_expr(token: &str) -> Option<i64> {
    let token = token.trim();
    let (negative, digits) = match token.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, token),
    };

    let value = if let Some(hex) = digits
        .strip_prefix("0x")
        .or_else(|| digits.strip_prefix("0X"))
    {
        i64::from_str_radix(hex, 16).ok()?
    } else if digits.len() > 1 && digits.starts_with('0') {
        i64::from_str_radix(&digits[1..], 8).ok()?
    } else {
        digits.parse().ok()?
    };

    Some(if negative { -value } else { value })
}

/// Resolve an `%include` target against the resource that referenced it
///
/// URL-sourced kickstarts resolve against the URL base; file-sourced ones
/// against the containing directory. An already-absolute target (URL or
/// rooted path) is returned as-is.
pub fn resolve_relative(base_resource: &str, target: &str) -> String {
    if is_remote(target) {
        return target.to_string();
    }

    if is_remote(base_resource) {
        if let Ok(base) = Url::parse(base_resource) {
            if let Ok(joined) = base.join(target) {
                return joined.to_string();
            }
        }
        warn!("Cannot resolve {} against {}", target, base_resource);
        return target.to_string();
    }

    let target_path = Path::new(target);
    if target_path.is_absolute() {
        return target.to_string();
    }

    match Path::new(base_resource).parent() {
        Some(parent) => parent.join(target_path).to_string_lossy().into_owned(),
        None => target.to_string(),
    }
}
