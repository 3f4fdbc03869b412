// SPDX-License-Identifier: AGPL-3.0
// Copyright (C) 2026 GistPub Contributors

//! Gist discovery over a git working tree.
//!
//! Walks a subtree of the repository and yields one [`Gist`] record per
//! tracked file annotated with the gistpub attribute. Discovery is a
//! synchronous, pull-based iterator: callers can stop consuming it without
//! listing the remainder of the tree, and repeated runs against an
//! unchanged tree yield the same records in the same order.
//!
//! [`Gist`]: gistpub_protocol::Gist

pub mod error;
pub mod iterate;
pub mod template;

pub use error::{DiscoverError, DiscoverResult};
pub use iterate::{discover, Discovery};
pub use template::render_template;
