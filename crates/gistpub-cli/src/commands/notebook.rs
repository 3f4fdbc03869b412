// SPDX-License-Identifier: AGPL-3.0
// Copyright (C) 2026 GistPub Contributors

//! Render notebook gists as static html and re-emit them as a Gist event.

use anyhow::Result;
use clap::Parser;
use gistpub_convert::{ensure_outpath, render_all};
use gistpub_observability::TrailWriter;
use gistpub_protocol::{decode_all, encode, Gist};
use std::path::Path;

/// Render notebook gists as static html and emit a Gist event
#[derive(Parser, Debug)]
pub struct NotebookCmd {
    /// Gist events (literal base64 or files containing one); records of
    /// multiple events are merged in order
    #[arg(required = true, value_name = "EVENT")]
    pub events: Vec<String>,

    /// Output tree for rendered pages, inside the git root
    #[arg(long, default_value = ".", value_name = "PATH")]
    pub outpath: String,

    /// Log the nbconvert invocations without executing them
    #[arg(long)]
    pub dry_run: bool,
}

impl NotebookCmd {
    pub async fn execute(&self) -> Result<()> {
        let runner = super::git_runner()?;
        let gists: Vec<Gist> = decode_all(&super::read_events(&self.events))?;
        let outpath = ensure_outpath(runner.git_root(), Path::new(&self.outpath))?;
        let trail = TrailWriter::new(runner.git_root(), "jupyter");

        let rendered = render_all(&runner, &gists, &outpath, &trail, self.dry_run)?;
        println!("{}", encode(&rendered)?);
        Ok(())
    }
}
