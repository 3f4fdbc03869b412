// SPDX-License-Identifier: AGPL-3.0
// Copyright (C) 2026 GistPub Contributors

//! Publish converted gists to Confluence.

use crate::output;
use anyhow::Result;
use clap::Parser;
use gistpub_observability::TrailWriter;
use gistpub_protocol::{decode_all, ConvertedGist};
use gistpub_publish::{publish_all, ConfluenceApi, ConfluencePublisher, Credentials};

/// Publish converted gists to Confluence
#[derive(Parser, Debug)]
pub struct ConfluenceCmd {
    /// ConvertedGist events (literal base64 or files containing one)
    #[arg(required = true, value_name = "EVENT")]
    pub events: Vec<String>,

    /// Confluence base url (fallback: GISTPUB_CONFLUENCE_URL)
    #[arg(long, value_name = "URL")]
    pub url: Option<String>,

    /// Username for basic auth (fallback: GISTPUB_CONFLUENCE_USERNAME)
    #[arg(long, value_name = "USER")]
    pub username: Option<String>,

    /// Password or token (fallback: GISTPUB_CONFLUENCE_PASSWORD)
    #[arg(long, value_name = "SECRET")]
    pub password: Option<String>,

    /// Execute lookups but suppress every mutating call
    #[arg(long)]
    pub dry_run: bool,
}

impl ConfluenceCmd {
    pub async fn execute(&self) -> Result<()> {
        // Credentials are resolved before any record is touched
        let credentials = Credentials::resolve(
            "CONFLUENCE",
            self.url.clone(),
            self.username.clone(),
            self.password.clone(),
        )?;
        let runner = super::git_runner()?;
        let convs: Vec<ConvertedGist> = decode_all(&super::read_events(&self.events))?;

        let api = ConfluenceApi::connect(&credentials)?;
        let host = api.host().to_string();
        let publisher = ConfluencePublisher::new(api, runner.git_root());
        let trail = TrailWriter::new(runner.git_root(), "confluence");

        publish_all(&publisher, &convs, &trail, self.dry_run).await?;
        output::success(&format!("processed {} records against {host}", convs.len()));
        Ok(())
    }
}
