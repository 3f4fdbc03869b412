// SPDX-License-Identifier: AGPL-3.0
// Copyright (C) 2026 GistPub Contributors

//! Error types for gist discovery

use std::path::PathBuf;
use thiserror::Error;

/// Result type for discovery operations
pub type DiscoverResult<T> = Result<T, DiscoverError>;

/// Error types for discovery operations
#[derive(Debug, Error)]
pub enum DiscoverError {
    /// Underlying git operation failed
    #[error(transparent)]
    Git(#[from] gistpub_git::GitError),

    /// Target is a symlink or does not exist
    #[error("{0} is a symbolic link or does not exist; please provide a file or directory")]
    UnsupportedTarget(PathBuf),

    /// Attribute value did not render or is not valid JSON
    #[error("invalid gistpub attribute template: {0}")]
    Template(String),

    /// Rendered attribute value does not have the required shape
    #[error("gistpub attribute schema violation: {0}")]
    Schema(String),

    /// Tree traversal failed
    #[error("failed to walk tree: {0}")]
    Walk(#[from] walkdir::Error),
}
