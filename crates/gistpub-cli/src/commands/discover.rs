// SPDX-License-Identifier: AGPL-3.0
// Copyright (C) 2026 GistPub Contributors

//! Discover annotated gists and emit them as a Gist event on stdout.

use anyhow::Result;
use clap::Parser;
use gistpub_discovery::discover;
use gistpub_protocol::{encode, Gist};
use std::path::Path;
use tracing::info;

/// Discover annotated gists and emit a Gist event
#[derive(Parser, Debug)]
pub struct DiscoverCmd {
    /// Subtree (or single file) to discover, relative to the git root
    #[arg(long, default_value = ".", value_name = "PATH")]
    pub path: String,

    /// Only emit files changed between this commit and its parent
    #[arg(long, value_name = "COMMIT")]
    pub since_commit: Option<String>,
}

impl DiscoverCmd {
    pub async fn execute(&self) -> Result<()> {
        let runner = super::git_runner()?;
        let discovery =
            discover(&runner, Path::new(&self.path), self.since_commit.as_deref())?;
        let gists = discovery.collect::<Result<Vec<Gist>, _>>()?;
        info!("discovered {} gists below {}", gists.len(), self.path);
        println!("{}", encode(&gists)?);
        Ok(())
    }
}
