// SPDX-License-Identifier: AGPL-3.0
// Copyright (C) 2026 GistPub Contributors

//! The seam between the publish pipeline and concrete destinations.

use crate::error::PublishResult;
use async_trait::async_trait;
use gistpub_protocol::ConvertedGist;

/// What happened to one record at one destination
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// The record carries no tag block for this destination
    NotApplicable,
    /// The record's tag block declares a different host
    SkippedHost { declared: String },
    /// The record was published (or, in a dry run, would have been) to
    /// the given destination container
    Published { container: String },
}

/// One destination adapter the pipeline can publish a record to.
///
/// Implementations evaluate the routing guard themselves so that a
/// not-applicable record never causes any destination traffic.
#[async_trait]
pub trait Destination: Send + Sync {
    /// Stage name used in logs and trail entries
    fn name(&self) -> &'static str;

    /// Host this adapter is configured against
    fn host(&self) -> &str;

    /// Publishes one converted gist, honoring dry-run mode by executing
    /// lookups but suppressing every mutating call.
    async fn publish(&self, conv: &ConvertedGist, dry_run: bool) -> PublishResult<Outcome>;
}
