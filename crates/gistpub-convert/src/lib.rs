// SPDX-License-Identifier: AGPL-3.0
// Copyright (C) 2026 GistPub Contributors

//! Conversion stage: renders discovered gists into publishable artifacts.
//!
//! Conversion is driven by pandoc defaults files committed next to each
//! gist; the stage itself stays format-agnostic and only orchestrates the
//! external `pandoc` invocation, emitting one [`ConvertedGist`] per
//! rendition for downstream publishers. Jupyter notebooks take a detour
//! through nbconvert first, which re-emits them as gists pointing at the
//! rendered static html.
//!
//! [`ConvertedGist`]: gistpub_protocol::ConvertedGist

pub mod error;
pub mod notebook;
pub mod pandoc;

pub use error::{ConvertError, ConvertResult};
pub use notebook::{is_notebook, render, render_all};
pub use pandoc::{convert, convert_all, ensure_outpath};
