// SPDX-License-Identifier: AGPL-3.0
// Copyright (C) 2026 GistPub Contributors

//! Confluence destination adapter.
//!
//! Primary artifacts become wiki pages below the tag block's declared
//! parent page, de-duplicated by title within that parent: an existing
//! page of the same title is updated in place with a bumped version
//! counter, otherwise a fresh page is created. Resolved attachment
//! references are uploaded to the same page, tagged with the source
//! commit id. Secondary artifacts are attached to the page published for
//! their title, falling back to the declared parent page.
//!
//! Some server versions reject the expanded content update; on a 409,
//! 500, or 501 the update is retried exactly once through the bare
//! content endpoint with the same title and parent, which stays
//! idempotent because title-within-parent is the de-duplication key.

use crate::attachments::{find_references, resolve, rewrite, ResourceSpec};
use crate::credentials::Credentials;
use crate::destination::{Destination, Outcome};
use crate::error::{PublishError, PublishResult};
use crate::routing::{route, ConfluenceTag, Route};
use async_trait::async_trait;
use gistpub_protocol::ConvertedGist;
use reqwest::multipart;
use serde::Deserialize;
use serde_json::json;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use url::Url;

const ATLASSIAN_TOKEN_HEADER: &str = "X-Atlassian-Token";

/// An existing page found by title lookup
#[derive(Debug, Clone)]
pub struct ExistingPage {
    pub id: String,
    pub version: u64,
}

#[derive(Deserialize)]
struct ContentList {
    results: Vec<ContentResult>,
}

#[derive(Deserialize)]
struct ContentResult {
    id: String,
    title: String,
    version: Option<ContentVersion>,
}

#[derive(Deserialize)]
struct ContentVersion {
    number: u64,
}

/// Low-level Confluence REST client
pub struct ConfluenceApi {
    base_url: Url,
    client: reqwest::Client,
    username: Option<String>,
    password: String,
}

impl ConfluenceApi {
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

    /// Looks up an existing page by title, within the tag's space when
    /// one is declared, otherwise among the parent page's children.
    pub async fn find_page(
        &self,
        tag: &ConfluenceTag,
        title: &str,
    ) -> PublishResult<Option<ExistingPage>> {
        if let Some(space) = &tag.space {
            let url = format!(
                "{}?spaceKey={space}&title={}&expand=version",
                self.endpoint("rest/api/content"),
                urlencode(title),
            );
            tracing::debug!("GET {url}");
            let response = self.authorize(self.client.get(&url)).send().await?;
            let response = check("page lookup", response).await?;
            let list = response.json::<ContentList>().await?;
            return Ok(match_title(list.results, title));
        }

        // The child listing is windowed; follow the start offset until the
        // title is found or a short window marks the end
        let mut start = 0usize;
        loop {
            let url = format!(
                "{}?expand=version&limit={PAGE_WINDOW}&start={start}",
                self.endpoint(&format!("rest/api/content/{}/child/page", tag.page)),
            );
            tracing::debug!("GET {url}");
            let response = self.authorize(self.client.get(&url)).send().await?;
            let response = check("page lookup", response).await?;
            let list = response.json::<ContentList>().await?;
            let window_len = list.results.len();
            if let Some(page) = match_title(list.results, title) {
                return Ok(Some(page));
            }
            match next_start(start, window_len) {
                Some(next) => start = next,
                None => return Ok(None),
            }
        }
    }

    pub async fn create_page(
        &self,
        parent: &str,
        space: Option<&str>,
        title: &str,
        body: &str,
    ) -> PublishResult<String> {
        let mut payload = json!({
            "type": "page",
            "title": title,
            "ancestors": [{ "id": parent }],
            "body": { "wiki": { "value": body, "representation": "wiki" } },
        });
        if let Some(space) = space {
            payload["space"] = json!({ "key": space });
        }
        let url = self.endpoint("rest/api/content");
        tracing::debug!("POST {url}");
        let response = self.authorize(self.client.post(&url)).json(&payload).send().await?;
        let response = check("page creation", response).await?;
        let created = response.json::<ContentResult>().await?;
        Ok(created.id)
    }

    pub async fn update_page(
        &self,
        page: &ExistingPage,
        title: &str,
        body: &str,
    ) -> PublishResult<()> {
        let expanded =
            self.endpoint(&format!("rest/api/content/{}?expand=version,body.storage", page.id));
        match self.put_page(&expanded, page, title, body).await {
            Err(PublishError::Api { status, .. }) if matches!(status, 409 | 500 | 501) => {
                warn!("page update answered {status}, retrying via bare content endpoint");
                let bare = self.endpoint(&format!("rest/api/content/{}", page.id));
                self.put_page(&bare, page, title, body).await
            }
            other => other,
        }
    }

    async fn put_page(
        &self,
        url: &str,
        page: &ExistingPage,
        title: &str,
        body: &str,
    ) -> PublishResult<()> {
        let payload = json!({
            "type": "page",
            "title": title,
            "version": { "number": page.version + 1 },
            "body": { "wiki": { "value": body, "representation": "wiki" } },
        });
        tracing::debug!("PUT {url}");
        let response = self.authorize(self.client.put(url)).json(&payload).send().await?;
        check("page update", response).await?;
        Ok(())
    }

    /// Uploads one file as a page attachment, tagged with the source
    /// commit id; same-named attachments are versioned by the server.
    pub async fn attach(&self, page_id: &str, file: &Path, commit_id: &str) -> PublishResult<()> {
        let name = file.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_default();
        let bytes = fs::read(file)?;
        let form = multipart::Form::new()
            .part("file", multipart::Part::bytes(bytes).file_name(name))
            .text("comment", format!("Matches {commit_id} git commit id"));
        let url = self.endpoint(&format!("rest/api/content/{page_id}/child/attachment"));
        tracing::debug!("POST {url}");
        let response = self
            .authorize(self.client.post(&url))
            .header(ATLASSIAN_TOKEN_HEADER, "nocheck")
            .multipart(form)
            .send()
            .await?;
        check("attachment upload", response).await?;
        Ok(())
    }
}

pub(crate) async fn check(
    context: &str,
    response: reqwest::Response,
) -> PublishResult<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let message = response.text().await.unwrap_or_default();
    Err(PublishError::Api {
        context: context.to_string(),
        status: status.as_u16(),
        message: message.chars().take(500).collect(),
    })
}

fn urlencode(value: &str) -> String {
    percent_encoding::utf8_percent_encode(value, percent_encoding::NON_ALPHANUMERIC).to_string()
}

/// Window size for paged child-page listings
const PAGE_WINDOW: usize = 200;

fn match_title(results: Vec<ContentResult>, title: &str) -> Option<ExistingPage> {
    results.into_iter().find(|result| result.title == title).map(|result| ExistingPage {
        id: result.id,
        version: result.version.map(|v| v.number).unwrap_or(1),
    })
}

/// A full window may hide further entries; a short one is the last.
fn next_start(start: usize, window_len: usize) -> Option<usize> {
    (window_len == PAGE_WINDOW).then_some(start + PAGE_WINDOW)
}

/// Confluence adapter for the publish pipeline
pub struct ConfluencePublisher {
    api: ConfluenceApi,
    git_root: PathBuf,
}

impl ConfluencePublisher {
    pub fn new(api: ConfluenceApi, git_root: impl Into<PathBuf>) -> Self {
        Self { api, git_root: git_root.into() }
    }

    async fn publish_page(
        &self,
        tag: &ConfluenceTag,
        conv: &ConvertedGist,
        dry_run: bool,
    ) -> PublishResult<String> {
        let text = fs::read_to_string(self.git_root.join(&conv.path))?;
        let specs = ResourceSpec::parse_all(&conv.gist.resources);
        let references = find_references(&text);
        let resolutions = resolve(&self.git_root, &references, &specs);
        let body = rewrite(&text, &resolutions);

        let container = match self.api.find_page(tag, &conv.title).await? {
            Some(page) => {
                info!("updating page {} ({}) version {}", conv.title, page.id, page.version + 1);
                if !dry_run {
                    self.api.update_page(&page, &conv.title, &body).await?;
                }
                page.id
            }
            None => {
                info!("creating page {} below {}", conv.title, tag.page);
                if dry_run {
                    tag.page.clone()
                } else {
                    self.api
                        .create_page(&tag.page, tag.space.as_deref(), &conv.title, &body)
                        .await?
                }
            }
        };

        for resolution in &resolutions {
            info!("attaching {} to page {container}", resolution.path.display());
            if !dry_run {
                self.api
                    .attach(&container, &self.git_root.join(&resolution.path), &conv.gist.commit_id)
                    .await?;
            }
        }
        Ok(container)
    }

    async fn publish_attachment(
        &self,
        tag: &ConfluenceTag,
        conv: &ConvertedGist,
        dry_run: bool,
    ) -> PublishResult<String> {
        let container = self
            .api
            .find_page(tag, &conv.title)
            .await?
            .map(|page| page.id)
            .unwrap_or_else(|| tag.page.clone());
        info!("attaching {} to page {container}", conv.path.display());
        if !dry_run {
            self.api
                .attach(&container, &self.git_root.join(&conv.path), &conv.gist.commit_id)
                .await?;
        }
        Ok(container)
    }
}

#[async_trait]
impl Destination for ConfluencePublisher {
    fn name(&self) -> &'static str {
        "confluence"
    }

    fn host(&self) -> &str {
        self.api.host()
    }

    async fn publish(&self, conv: &ConvertedGist, dry_run: bool) -> PublishResult<Outcome> {
        let tag = match route::<ConfluenceTag>(&conv.gist, self.host())? {
            Route::NotApplicable => return Ok(Outcome::NotApplicable),
            Route::HostMismatch { declared } => return Ok(Outcome::SkippedHost { declared }),
            Route::Publish(tag) => tag,
        };
        let container = if conv.is_primary() {
            self.publish_page(&tag, conv, dry_run).await?
        } else {
            self.publish_attachment(&tag, conv, dry_run).await?
        };
        Ok(Outcome::Published { container })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn api(url: &str) -> ConfluenceApi {
        ConfluenceApi::connect(&Credentials {
            url: url.to_string(),
            username: Some("bot".to_string()),
            password: "secret".to_string(),
        })
        .unwrap()
    }

    #[test]
    fn test_host_is_parsed_from_base_url() {
        assert_eq!(api("https://wiki.example.com/confluence").host(), "wiki.example.com");
    }

    #[test]
    fn test_endpoint_joins_without_duplicate_slash() {
        let api = api("https://wiki.example.com/confluence/");
        assert_eq!(
            api.endpoint("rest/api/content"),
            "https://wiki.example.com/confluence/rest/api/content"
        );
    }

    #[test]
    fn test_full_listing_window_advances_to_the_next_offset() {
        assert_eq!(next_start(0, PAGE_WINDOW), Some(PAGE_WINDOW));
        assert_eq!(next_start(PAGE_WINDOW, PAGE_WINDOW), Some(2 * PAGE_WINDOW));
    }

    #[test]
    fn test_short_listing_window_ends_the_lookup() {
        assert_eq!(next_start(0, 0), None);
        assert_eq!(next_start(PAGE_WINDOW, PAGE_WINDOW - 1), None);
    }

    #[test]
    fn test_match_title_extracts_id_and_version() {
        let results = vec![
            ContentResult { id: "1".into(), title: "other".into(), version: None },
            ContentResult {
                id: "2".into(),
                title: "howto guide".into(),
                version: Some(ContentVersion { number: 7 }),
            },
        ];
        let page = match_title(results, "howto guide").unwrap();
        assert_eq!(page.id, "2");
        assert_eq!(page.version, 7);
    }

    #[test]
    fn test_match_title_defaults_missing_version_to_one() {
        let results =
            vec![ContentResult { id: "1".into(), title: "howto guide".into(), version: None }];
        assert_eq!(match_title(results, "howto guide").unwrap().version, 1);
    }

    #[test]
    fn test_invalid_url_is_rejected() {
        let result = ConfluenceApi::connect(&Credentials {
            url: "not a url".to_string(),
            username: None,
            password: "secret".to_string(),
        });
        assert!(matches!(result, Err(PublishError::InvalidUrl(_))));
    }
}
