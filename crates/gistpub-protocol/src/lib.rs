// SPDX-License-Identifier: AGPL-3.0
// Copyright (C) 2026 GistPub Contributors

//! Event payloads exchanged between gistpub pipeline stages.
//!
//! Every stage is a separate short-lived process; the only contract between
//! them is a versioned, self-describing batch of records serialized as
//! compact JSON and base64-encoded for safe transport on the command line.
//!
//! ## Wire format
//!
//! ```json
//! {"semver":"0.3.1","record-type":"Gist","records":[...]}
//! ```
//!
//! A consumer accepts a batch only if the batch's semver *major* matches its
//! own and the `record-type` tag matches what it expects. Minor and patch
//! differences between independently released stage binaries are tolerated.

pub mod error;
pub mod event;
pub mod record;

pub use error::{EventError, EventResult};
pub use event::{decode, decode_all, encode, read_event_arg, EventRecord};
pub use record::{ConvertedGist, Gist};
