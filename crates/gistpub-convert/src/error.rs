// SPDX-License-Identifier: AGPL-3.0
// Copyright (C) 2026 GistPub Contributors

//! Error types for the conversion stage

use gistpub_git::GitError;
use std::path::PathBuf;
use thiserror::Error;

/// Result type for conversion operations
pub type ConvertResult<T> = Result<T, ConvertError>;

/// Error types for rendering gists through pandoc
#[derive(Debug, Error)]
pub enum ConvertError {
    #[error(transparent)]
    Git(#[from] GitError),

    /// A conversion defaults file is unusable as written
    #[error("defaults file {path} is invalid: {reason}")]
    Defaults { path: PathBuf, reason: String },

    /// Placeholder rendering of a defaults file failed
    #[error("defaults file {path} failed to render: {reason}")]
    Template { path: PathBuf, reason: String },

    /// The output tree must stay inside the repository so downstream
    /// stages can address artifacts by repo-relative path
    #[error("output path {0} is not inside the git repository")]
    OutsideGitRoot(PathBuf),

    /// An external tool exited with a non-zero status
    #[error("{command} failed: {stderr}")]
    Tool { command: String, stderr: String },

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// One or more records failed after the whole batch was attempted
    #[error("conversion failed for: {}", trace_ids.join(", "))]
    Failed { trace_ids: Vec<String> },
}
