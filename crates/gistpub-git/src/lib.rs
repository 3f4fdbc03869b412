// SPDX-License-Identifier: AGPL-3.0
// Copyright (C) 2026 GistPub Contributors

//! Git integration for gistpub.
//!
//! All interaction with the repository goes through the real `git` binary:
//! attribute queries (`git check-attr`), tracked-file listings, diff sets,
//! and remote management for branch mirroring. The repository's attribute
//! and config files are mutated only by the explicit [`AttributeStore::init`]
//! operation and by the ephemeral remotes registered (and always removed)
//! during one [`mirror::mirror`] call.

pub mod attributes;
pub mod error;
pub mod mirror;
pub mod shell;

pub use attributes::{locate_git_root, AttrState, AttributeStore, ATTRIBUTE_NAME};
pub use error::{GitError, GitResult};
pub use mirror::{as_remote, mirror, GitRemote};
pub use shell::GitRunner;
