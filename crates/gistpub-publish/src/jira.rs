// SPDX-License-Identifier: AGPL-3.0
// Copyright (C) 2026 GistPub Contributors

//! Jira destination adapter.
//!
//! The target issue already exists; publishing never creates one. A
//! primary artifact replaces the issue's description with the rewritten
//! wiki text and uploads every resolved attachment reference; a
//! secondary artifact is attached to the issue directly. Re-uploading a
//! same-named attachment is versioned by the server.

use crate::attachments::{find_references, resolve, rewrite, ResourceSpec};
use crate::confluence::check;
use crate::credentials::Credentials;
use crate::destination::{Destination, Outcome};
use crate::error::{PublishError, PublishResult};
use crate::routing::{route, JiraTag, Route};
use async_trait::async_trait;
use gistpub_protocol::ConvertedGist;
use reqwest::multipart;
use serde_json::json;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;
use url::Url;

/// Low-level Jira REST client
pub struct JiraApi {
    base_url: Url,
    client: reqwest::Client,
    username: Option<String>,
    password: String,
}

impl JiraApi {
    pub fn connect(credentials: &Credentials) -> PublishResult<Self> {
        let base_url = Url::parse(&credentials.url)
            .map_err(|_| PublishError::InvalidUrl(credentials.url.clone()))?;
        Ok(Self {
            base_url,
            client: reqwest::Client::new(),
            username: credentials.username.clone(),
            password: credentials.password.clone(),
        })
    }

    pub fn host(&self) -> &str {
        self.base_url.host_str().unwrap_or_default()
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{path}", self.base_url.as_str().trim_end_matches('/'))
    }

    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.username {
            Some(username) => request.basic_auth(username, Some(&self.password)),
            None => request.bearer_auth(&self.password),
        }
    }

    /// Checks the issue exists; the read-only call shared by live and
    /// dry runs.
    pub async fn issue_exists(&self, issue: &str) -> PublishResult<bool> {
        let url = self.endpoint(&format!("rest/api/2/issue/{issue}?fields=summary"));
        tracing::debug!("GET {url}");
        let response = self.authorize(self.client.get(&url)).send().await?;
        if response.status().as_u16() == 404 {
            return Ok(false);
        }
        check("issue lookup", response).await?;
        Ok(true)
    }

    pub async fn update_description(&self, issue: &str, description: &str) -> PublishResult<()> {
        let url = self.endpoint(&format!("rest/api/2/issue/{issue}"));
        let payload = json!({ "fields": { "description": description } });
        tracing::debug!("PUT {url}");
        let response = self.authorize(self.client.put(&url)).json(&payload).send().await?;
        check("issue update", response).await?;
        Ok(())
    }

    pub async fn attach(&self, issue: &str, file: &Path) -> PublishResult<()> {
        let name = file.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_default();
        let bytes = fs::read(file)?;
        let form = multipart::Form::new()
            .part("file", multipart::Part::bytes(bytes).file_name(name));
        let url = self.endpoint(&format!("rest/api/2/issue/{issue}/attachments"));
        tracing::debug!("POST {url}");
        let response = self
            .authorize(self.client.post(&url))
            .header("X-Atlassian-Token", "no-check")
            .multipart(form)
            .send()
            .await?;
        check("attachment upload", response).await?;
        Ok(())
    }
}

/// Jira adapter for the publish pipeline
pub struct JiraPublisher {
    api: JiraApi,
    git_root: PathBuf,
}

impl JiraPublisher {
    pub fn new(api: JiraApi, git_root: impl Into<PathBuf>) -> Self {
        Self { api, git_root: git_root.into() }
    }

    async fn publish_description(
        &self,
        tag: &JiraTag,
        conv: &ConvertedGist,
        dry_run: bool,
    ) -> PublishResult<()> {
        let text = fs::read_to_string(self.git_root.join(&conv.path))?;
        let specs = ResourceSpec::parse_all(&conv.gist.resources);
        let references = find_references(&text);
        let resolutions = resolve(&self.git_root, &references, &specs);
        let description = rewrite(&text, &resolutions);

        info!("updating description of issue {}", tag.issue);
        if !dry_run {
            self.api.update_description(&tag.issue, &description).await?;
        }
        for resolution in &resolutions {
            info!("attaching {} to issue {}", resolution.path.display(), tag.issue);
            if !dry_run {
                self.api.attach(&tag.issue, &self.git_root.join(&resolution.path)).await?;
            }
        }
        Ok(())
    }
}

#[async_trait]
impl Destination for JiraPublisher {
    fn name(&self) -> &'static str {
        "jira"
    }

    fn host(&self) -> &str {
        self.api.host()
    }

    async fn publish(&self, conv: &ConvertedGist, dry_run: bool) -> PublishResult<Outcome> {
        let tag = match route::<JiraTag>(&conv.gist, self.host())? {
            Route::NotApplicable => return Ok(Outcome::NotApplicable),
            Route::HostMismatch { declared } => return Ok(Outcome::SkippedHost { declared }),
            Route::Publish(tag) => tag,
        };

        if !self.api.issue_exists(&tag.issue).await? {
            return Err(PublishError::Api {
                context: "issue lookup".to_string(),
                status: 404,
                message: format!("issue {} does not exist", tag.issue),
            });
        }

        if conv.is_primary() {
            self.publish_description(&tag, conv, dry_run).await?;
        } else {
            info!("attaching {} to issue {}", conv.path.display(), tag.issue);
            if !dry_run {
                self.api.attach(&tag.issue, &self.git_root.join(&conv.path)).await?;
            }
        }
        Ok(Outcome::Published { container: tag.issue })
    }
}
