// SPDX-License-Identifier: AGPL-3.0
// Copyright (C) 2026 GistPub Contributors

//! Error types for the event wire protocol

use thiserror::Error;

/// Result type for event codec operations
pub type EventResult<T> = Result<T, EventError>;

/// Error types for encoding and decoding event batches
#[derive(Debug, Error)]
pub enum EventError {
    /// Payload is not valid base64 or not valid JSON
    #[error("Malformed event payload: {0}")]
    MalformedEvent(String),

    /// Batch was produced by a stage with an incompatible major version
    #[error("Event semver major version differs: batch is {batch}, codec is {codec}")]
    VersionMismatch { batch: String, codec: String },

    /// Batch carries a record type the consumer does not expect
    #[error("Unexpected record type: expected {expected:?}, got {actual:?}")]
    UnexpectedRecordType { expected: String, actual: String },

    /// A record is missing a required field or a field has the wrong shape
    #[error("Record schema violation: {0}")]
    Schema(String),
}
