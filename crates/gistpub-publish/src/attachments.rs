// SPDX-License-Identifier: AGPL-3.0
// Copyright (C) 2026 GistPub Contributors

//! Resolution of inline attachment references in rendered documents.
//!
//! Wiki-flavoured artifacts reference attachments as `!name!` or
//! `!name|options!`. A record's `resources` list declares where those
//! files may live, as ordered `directory:glob-pattern` specifiers. A
//! reference resolves to a file when a glob match under a search root is
//! exactly `root/reference` and is a regular file; the first search root
//! in list order wins. References that resolve nowhere stay untouched,
//! since `!...!` is also legitimate non-attachment markup.
//!
//! Rewriting replaces resolved references with the file's bare name, so
//! the destination only ever sees the uploaded attachment's name. The
//! resolve-then-rewrite pair is idempotent: a bare name no longer points
//! below any search root unless the file sits at the root itself.

use glob::glob;
use percent_encoding::percent_decode_str;
use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use tracing::debug;

/// One parsed `directory:glob-pattern` resource specifier
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceSpec {
    pub root: PathBuf,
    pub pattern: String,
}

impl ResourceSpec {
    /// Parses a record's resource list, keeping declaration order.
    /// Entries without a `:` separator are skipped, not rejected.
    pub fn parse_all(resources: &[String]) -> Vec<ResourceSpec> {
        resources
            .iter()
            .filter_map(|entry| {
                let (root, pattern) = entry.split_once(':')?;
                Some(ResourceSpec { root: PathBuf::from(root), pattern: pattern.to_string() })
            })
            .collect()
    }
}

/// One reference resolved to a file on disk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    /// The reference string as it appears in the document
    pub reference: String,
    /// Repository-relative path of the resolved file
    pub path: PathBuf,
}

impl Resolution {
    /// The file's bare name, as the destination will know the attachment
    pub fn file_name(&self) -> String {
        self.path.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_default()
    }
}

fn reference_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"!([^!|\s]+)(?:\|[^!]*)?!").unwrap_or_else(|_| unreachable!())
    })
}

/// Distinct `!...!` reference tokens in first-seen order.
pub fn find_references(text: &str) -> Vec<String> {
    let mut references: Vec<String> = Vec::new();
    for captures in reference_pattern().captures_iter(text) {
        let token = captures[1].to_string();
        if !references.contains(&token) {
            references.push(token);
        }
    }
    references
}

/// Resolves references against the record's resource specifiers, rooted
/// at the repository root. Returns only the references that resolved.
pub fn resolve(git_root: &Path, references: &[String], specs: &[ResourceSpec]) -> Vec<Resolution> {
    let mut resolutions = Vec::new();
    for reference in references {
        let decoded = percent_decode_str(reference).decode_utf8_lossy().into_owned();
        if let Some(path) = resolve_one(git_root, &decoded, specs) {
            resolutions.push(Resolution { reference: reference.clone(), path });
        } else {
            debug!("reference !{reference}! does not resolve to a resource file");
        }
    }
    resolutions
}

fn resolve_one(git_root: &Path, decoded: &str, specs: &[ResourceSpec]) -> Option<PathBuf> {
    for spec in specs {
        let root = git_root.join(&spec.root);
        let candidate = root.join(decoded);
        let Ok(matches) = glob(&format!("{}/{}", root.display(), spec.pattern)) else {
            continue;
        };
        for entry in matches.flatten() {
            if entry == candidate && candidate.is_file() {
                let relative = candidate
                    .strip_prefix(git_root)
                    .map(Path::to_path_buf)
                    .unwrap_or_else(|_| candidate.clone());
                return Some(relative);
            }
        }
    }
    None
}

/// Rewrites resolved references to the file's bare name, covering both
/// the plain and the `|options` reference forms.
pub fn rewrite(text: &str, resolutions: &[Resolution]) -> String {
    let mut rewritten = text.to_string();
    for resolution in resolutions {
        let name = resolution.file_name();
        rewritten = rewritten
            .replace(&format!("!{}!", resolution.reference), &format!("!{name}!"))
            .replace(&format!("!{}|", resolution.reference), &format!("!{name}|"));
    }
    rewritten
}
