// SPDX-License-Identifier: AGPL-3.0
// Copyright (C) 2026 GistPub Contributors

//! Append-only trail log shared by all pipeline stages.
//!
//! Each stage appends one line per notable outcome to `gistpub.trail` in
//! the repository root, in the form
//! `stage,LEVEL,ISO8601,subject,message`. The subject is the gist path
//! the outcome belongs to, or `*` for failures not tied to one record.
//! The report stage parses the accumulated file and summarizes it per
//! gist; everything before the final comma is structure, the message may
//! itself contain commas.

use chrono::{NaiveDateTime, Utc};
use std::fs;
use std::io::Write as _;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// File name of the trail log, relative to the repository root
pub const TRAIL_FILE_NAME: &str = "gistpub.trail";

const TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

/// Result type for trail log operations
pub type TrailResult<T> = Result<T, TrailError>;

#[derive(Debug, Error)]
pub enum TrailError {
    #[error("malformed trail line: {0}")]
    Malformed(String),

    #[error("unknown trail level {0}")]
    UnknownLevel(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Severity of one trail entry, ordered from least to most severe
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum TrailLevel {
    Debug,
    Info,
    Warning,
    Error,
    Critical,
}

impl std::str::FromStr for TrailLevel {
    type Err = TrailError;

    fn from_str(s: &str) -> TrailResult<Self> {
        match s {
            "DEBUG" => Ok(TrailLevel::Debug),
            "INFO" => Ok(TrailLevel::Info),
            "WARN" | "WARNING" => Ok(TrailLevel::Warning),
            "ERROR" => Ok(TrailLevel::Error),
            "FATAL" | "CRITICAL" => Ok(TrailLevel::Critical),
            other => Err(TrailError::UnknownLevel(other.to_string())),
        }
    }
}

impl std::fmt::Display for TrailLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            TrailLevel::Debug => "DEBUG",
            TrailLevel::Info => "INFO",
            TrailLevel::Warning => "WARNING",
            TrailLevel::Error => "ERROR",
            TrailLevel::Critical => "CRITICAL",
        };
        f.write_str(name)
    }
}

/// One parsed line of the trail log
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrailEntry {
    pub stage: String,
    pub level: TrailLevel,
    pub time: NaiveDateTime,
    pub subject: PathBuf,
    pub message: String,
}

impl TrailEntry {
    /// Parses a whole trail file, in line order.
    pub fn parse_file(path: &Path) -> TrailResult<Vec<TrailEntry>> {
        if !path.exists() {
            return Ok(Vec::new());
        }
        fs::read_to_string(path)?
            .lines()
            .filter(|line| !line.trim().is_empty())
            .map(Self::parse_line)
            .collect()
    }

    fn parse_line(line: &str) -> TrailResult<TrailEntry> {
        let mut fields = line.splitn(5, ',');
        let (stage, level, time, subject, message) = match (
            fields.next(),
            fields.next(),
            fields.next(),
            fields.next(),
            fields.next(),
        ) {
            (Some(stage), Some(level), Some(time), Some(subject), Some(message)) => {
                (stage, level, time, subject, message)
            }
            _ => return Err(TrailError::Malformed(line.to_string())),
        };
        let time = NaiveDateTime::parse_from_str(time, TIME_FORMAT)
            .map_err(|_| TrailError::Malformed(line.to_string()))?;
        Ok(TrailEntry {
            stage: stage.to_string(),
            level: level.parse()?,
            time,
            subject: PathBuf::from(subject),
            message: message.to_string(),
        })
    }
}

/// Appends trail entries for one pipeline stage.
#[derive(Debug, Clone)]
pub struct TrailWriter {
    path: PathBuf,
    stage: String,
}

impl TrailWriter {
    /// A writer appending to `gistpub.trail` in the repository root.
    pub fn new(git_root: &Path, stage: impl Into<String>) -> Self {
        Self { path: git_root.join(TRAIL_FILE_NAME), stage: stage.into() }
    }

    pub fn info(&self, subject: &Path, message: &str) -> TrailResult<()> {
        self.append(TrailLevel::Info, subject, message)
    }

    pub fn error(&self, subject: &Path, message: &str) -> TrailResult<()> {
        self.append(TrailLevel::Error, subject, message)
    }

    fn append(&self, level: TrailLevel, subject: &Path, message: &str) -> TrailResult<()> {
        let mut file = fs::OpenOptions::new().create(true).append(true).open(&self.path)?;
        writeln!(
            file,
            "{},{},{},{},{}",
            self.stage,
            level,
            Utc::now().format(TIME_FORMAT),
            subject.display(),
            message,
        )?;
        Ok(())
    }
}

/// The most severe level found in the given entries, if any.
pub fn max_severity(entries: &[TrailEntry]) -> Option<TrailLevel> {
    entries.iter().map(|entry| entry.level).max()
}

/// Path prefixes shared by more than one of the given paths, longest
/// first. The empty prefix is shared by every relative path and acts as
/// the fallback group.
pub fn shared_prefixes(paths: &[PathBuf]) -> Vec<PathBuf> {
    let mut counts: std::collections::HashMap<PathBuf, usize> = std::collections::HashMap::new();
    for path in paths {
        for ancestor in path.ancestors().skip(1) {
            *counts.entry(ancestor.to_path_buf()).or_default() += 1;
        }
    }
    let mut prefixes: Vec<PathBuf> =
        counts.into_iter().filter(|(_, count)| *count > 1).map(|(prefix, _)| prefix).collect();
    prefixes.sort_by_key(|prefix| std::cmp::Reverse(prefix.as_os_str().len()));
    prefixes
}

/// Splits a path into its longest shared prefix and the remainder.
pub fn split_prefix(path: &Path, prefixes: &[PathBuf]) -> (PathBuf, PathBuf) {
    for prefix in prefixes {
        if let Ok(relative) = path.strip_prefix(prefix) {
            return (prefix.clone(), relative.to_path_buf());
        }
    }
    (PathBuf::new(), path.to_path_buf())
}
