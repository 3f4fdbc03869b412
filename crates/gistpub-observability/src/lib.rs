// SPDX-License-Identifier: AGPL-3.0
// Copyright (C) 2026 GistPub Contributors

//! Structured logging and trail auditing for GistPub.
//!
//! Process logging goes through `tracing` with pretty, compact, or JSON
//! output; pipeline stages additionally append one-line audit records to a
//! `gistpub.trail` file that the report stage parses and summarizes after
//! the whole pipeline ran.

pub mod config;
pub mod initialization;
pub mod trail;

pub use config::{LogConfig, LogError, LogFormat, LogOutput};
pub use initialization::{init_tracing, init_tracing_with_config};
pub use trail::{
    max_severity, shared_prefixes, split_prefix, TrailEntry, TrailError, TrailLevel,
    TrailResult, TrailWriter, TRAIL_FILE_NAME,
};
