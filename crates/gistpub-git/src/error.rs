// SPDX-License-Identifier: AGPL-3.0
// Copyright (C) 2026 GistPub Contributors

//! Error types for git integration

use std::path::PathBuf;
use thiserror::Error;

/// Result type for git operations
pub type GitResult<T> = Result<T, GitError>;

/// Error types for git integration operations
#[derive(Debug, Error)]
pub enum GitError {
    /// No parent directory up to the filesystem root contains a `.git` entry
    #[error("{0} is not in a git repository; please run from a valid git repository")]
    NotInRepository(PathBuf),

    /// The gistpub macro attribute is not declared in any known attributes file
    #[error(
        "could not locate [attr]gistpub in any known gitattributes file; \
         please run \"gistpub init\" first"
    )]
    AttributeNotConfigured,

    /// A git subprocess exited with a non-zero status
    #[error("git command failed ({command}): {stderr}")]
    CommandFailed { command: String, stderr: String },

    /// A remote URL could not be parsed or turned into a ref-safe remote name
    #[error("invalid git remote url: {0}")]
    InvalidRemoteUrl(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
