// SPDX-License-Identifier: AGPL-3.0
// Copyright (C) 2026 GistPub Contributors

//! # GistPub Test Utilities
//!
//! Shared helpers for integration tests: temporary git repositories driven
//! by the real `git` binary, with fixtures for gistpub attribute
//! annotations.

pub mod repo;

pub use repo::TestRepo;
