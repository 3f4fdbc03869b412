// SPDX-License-Identifier: AGPL-3.0
// Copyright (C) 2026 GistPub Contributors

//! Shared output formatting for CLI commands.
//!
//! Human-facing status lines go to stderr so that stdout stays reserved
//! for event payloads handed to the next pipeline stage.

use console::style;

/// Print a success message to stderr.
pub fn success(msg: &str) {
    eprintln!("{} {}", style("ok").green().bold(), msg);
}

/// Print an error message to stderr.
pub fn error(msg: &str) {
    eprintln!("{} {}", style("error").red().bold(), msg);
}
