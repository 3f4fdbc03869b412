// SPDX-License-Identifier: AGPL-3.0
// Copyright (C) 2026 GistPub Contributors

// Command modules for the gistpub CLI
pub mod confluence;
pub mod convert;
pub mod discover;
pub mod init;
pub mod jira;
pub mod mirror;
pub mod notebook;
pub mod report;

pub use confluence::ConfluenceCmd;
pub use convert::ConvertCmd;
pub use discover::DiscoverCmd;
pub use init::InitCmd;
pub use jira::JiraCmd;
pub use mirror::MirrorCmd;
pub use notebook::NotebookCmd;
pub use report::ReportCmd;

use anyhow::{Context, Result};
use gistpub_git::{locate_git_root, GitRunner};
use std::path::PathBuf;

/// Runner rooted at the repository containing the working directory
/// (or the directory given with `-C`).
pub(crate) fn git_runner() -> Result<GitRunner> {
    let cwd = match std::env::var("GISTPUB_CWD") {
        Ok(cwd) => PathBuf::from(cwd),
        Err(_) => std::env::current_dir().context("could not determine working directory")?,
    };
    let git_root = locate_git_root(&cwd)?;
    Ok(GitRunner::new(git_root))
}

/// Reads event arguments (literal base64 or a file path per argument).
pub(crate) fn read_events(events: &[String]) -> Vec<String> {
    events.iter().map(|event| gistpub_protocol::read_event_arg(event)).collect()
}
