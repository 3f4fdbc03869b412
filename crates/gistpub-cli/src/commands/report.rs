// SPDX-License-Identifier: AGPL-3.0
// Copyright (C) 2026 GistPub Contributors

//! Post a summary of the pipeline's trail log to a webhook.

use crate::output;
use anyhow::{Context, Result};
use clap::Parser;
use gistpub_observability::{TrailEntry, TRAIL_FILE_NAME};
use gistpub_protocol::{decode_all, Gist};
use gistpub_publish::{report, WebhookApi};
use std::path::PathBuf;

/// Post a trail summary to a webhook
#[derive(Parser, Debug)]
pub struct ReportCmd {
    /// Gist events of the batch being reported on
    #[arg(required = true, value_name = "EVENT")]
    pub events: Vec<String>,

    /// Webhook url (fallback: GISTPUB_MSTEAMS_WEBHOOK_URL)
    #[arg(long, value_name = "URL")]
    pub webhook_url: Option<String>,

    /// Report title
    #[arg(long, default_value = "gistpub", value_name = "TITLE")]
    pub title: String,
}

impl ReportCmd {
    pub async fn execute(&self) -> Result<()> {
        let webhook_url = self
            .webhook_url
            .clone()
            .or_else(|| std::env::var("GISTPUB_MSTEAMS_WEBHOOK_URL").ok())
            .context("no webhook url given and GISTPUB_MSTEAMS_WEBHOOK_URL is unset")?;
        let runner = super::git_runner()?;

        let gists: Vec<Gist> = decode_all(&super::read_events(&self.events))?;
        let gist_paths: Vec<PathBuf> = gists.iter().map(|gist| gist.path.clone()).collect();
        let entries = TrailEntry::parse_file(&runner.git_root().join(TRAIL_FILE_NAME))?;

        report(&WebhookApi::new(webhook_url), &self.title, &gist_paths, &entries).await?;
        output::success(&format!(
            "reported {} trail entries for {} gists",
            entries.len(),
            gist_paths.len(),
        ));
        Ok(())
    }
}
