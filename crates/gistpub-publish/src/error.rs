// SPDX-License-Identifier: AGPL-3.0
// Copyright (C) 2026 GistPub Contributors

//! Error types for the publish stage

use thiserror::Error;

/// Result type for publish operations
pub type PublishResult<T> = Result<T, PublishError>;

/// Error types for routing and publishing converted gists
#[derive(Debug, Error)]
pub enum PublishError {
    /// A destination tag block is present but malformed
    #[error("tag block \"{key}\" is malformed: {reason}")]
    TagSchema { key: String, reason: String },

    /// Required connection settings are absent; checked before any record
    /// is processed
    #[error("missing credentials: {0}")]
    CredentialsMissing(String),

    #[error("invalid destination url {0}")]
    InvalidUrl(String),

    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// The destination answered with a non-success status
    #[error("{context} failed with status {status}: {message}")]
    Api { context: String, status: u16, message: String },

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// One or more records failed after the whole batch was attempted
    #[error("publishing failed for: {}", trace_ids.join(", "))]
    Failed { trace_ids: Vec<String> },
}
