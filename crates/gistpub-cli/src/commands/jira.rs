// SPDX-License-Identifier: AGPL-3.0
// Copyright (C) 2026 GistPub Contributors

//! Publish converted gists to Jira.

use crate::output;
use anyhow::Result;
use clap::Parser;
use gistpub_observability::TrailWriter;
use gistpub_protocol::{decode_all, ConvertedGist};
use gistpub_publish::{publish_all, Credentials, JiraApi, JiraPublisher};

/// Publish converted gists to Jira
#[derive(Parser, Debug)]
pub struct JiraCmd {
    /// ConvertedGist events (literal base64 or files containing one)
    #[arg(required = true, value_name = "EVENT")]
    pub events: Vec<String>,

    /// Jira base url (fallback: GISTPUB_JIRA_URL)
    #[arg(long, value_name = "URL")]
    pub url: Option<String>,

    /// Username for basic auth (fallback: GISTPUB_JIRA_USERNAME);
    /// omit to authenticate with a bearer token instead
    #[arg(long, value_name = "USER")]
    pub username: Option<String>,

    /// Password or token (fallback: GISTPUB_JIRA_PASSWORD)
    #[arg(long, value_name = "SECRET")]
    pub password: Option<String>,

    /// Execute lookups but suppress every mutating call
    #[arg(long)]
    pub dry_run: bool,
}

impl JiraCmd {
    pub async fn execute(&self) -> Result<()> {
        let credentials = Credentials::resolve(
            "JIRA",
            self.url.clone(),
            self.username.clone(),
            self.password.clone(),
        )?;
        let runner = super::git_runner()?;
        let convs: Vec<ConvertedGist> = decode_all(&super::read_events(&self.events))?;

        let api = JiraApi::connect(&credentials)?;
        let host = api.host().to_string();
        let publisher = JiraPublisher::new(api, runner.git_root());
        let trail = TrailWriter::new(runner.git_root(), "jira");

        publish_all(&publisher, &convs, &trail, self.dry_run).await?;
        output::success(&format!("processed {} records against {host}", convs.len()));
        Ok(())
    }
}
