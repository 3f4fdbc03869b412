// SPDX-License-Identifier: AGPL-3.0
// Copyright (C) 2026 GistPub Contributors

//! Publish stage: routes converted gists to their tagged destinations.
//!
//! Publishing is guard-first: a record's tag map decides which adapters
//! see it at all, and a host gate keeps environment-specific adapter
//! instances from cross-publishing replayed batches. Within a batch,
//! primary documents go out before attachments, and per-record failures
//! are collected rather than aborting the run.

pub mod attachments;
pub mod confluence;
pub mod credentials;
pub mod destination;
pub mod error;
pub mod jira;
pub mod pipeline;
pub mod routing;
pub mod webhook;

pub use attachments::{find_references, resolve, rewrite, Resolution, ResourceSpec};
pub use confluence::{ConfluenceApi, ConfluencePublisher};
pub use credentials::Credentials;
pub use destination::{Destination, Outcome};
pub use error::{PublishError, PublishResult};
pub use jira::{JiraApi, JiraPublisher};
pub use pipeline::{publish_all, sort_for_publish};
pub use routing::{route, ConfluenceTag, JiraTag, Route, TagBlock};
pub use webhook::{message_card, report, WebhookApi};
