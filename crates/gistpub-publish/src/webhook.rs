// SPDX-License-Identifier: AGPL-3.0
// Copyright (C) 2026 GistPub Contributors

//! Trail-summary reporting to an MS-Teams-style webhook.
//!
//! The report stage runs after the whole pipeline: it takes the gists of
//! the original discovery batch plus the accumulated trail entries,
//! groups gists under their longest shared path prefix, and posts one
//! MessageCard whose theme color reflects the worst severity seen.

use crate::confluence::check;
use crate::error::PublishResult;
use gistpub_observability::{max_severity, shared_prefixes, split_prefix, TrailEntry, TrailLevel};
use serde_json::json;
use std::path::PathBuf;
use tracing::info;

/// Sends MessageCard payloads to one webhook URL
pub struct WebhookApi {
    url: String,
    client: reqwest::Client,
}

impl WebhookApi {
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into(), client: reqwest::Client::new() }
    }

    pub async fn send(&self, card: &serde_json::Value) -> PublishResult<()> {
        info!("POST {}", self.url);
        let response = self.client.post(&self.url).json(card).send().await?;
        check("webhook post", response).await?;
        Ok(())
    }
}

/// Posts a summary of the given trail entries to the webhook.
pub async fn report(
    api: &WebhookApi,
    title: &str,
    gist_paths: &[PathBuf],
    entries: &[TrailEntry],
) -> PublishResult<()> {
    api.send(&message_card(title, gist_paths, entries)).await
}

/// Builds the MessageCard payload; pure so it can be asserted on.
pub fn message_card(
    title: &str,
    gist_paths: &[PathBuf],
    entries: &[TrailEntry],
) -> serde_json::Value {
    json!({
        "@context": "https://schema.org/extensions",
        "@type": "MessageCard",
        "themeColor": level_color(max_severity(entries)),
        "title": title,
        "text": summary_table(gist_paths, entries),
    })
}

fn summary_table(gist_paths: &[PathBuf], entries: &[TrailEntry]) -> String {
    if gist_paths.is_empty() {
        return String::new();
    }
    let prefixes = shared_prefixes(gist_paths);

    let mut table = String::from("<table><tr><th>gist</th><th>actions</th></tr>");
    for path in gist_paths {
        let this_entries: Vec<&TrailEntry> =
            entries.iter().filter(|entry| entry.subject == *path).collect();
        let level = this_entries.iter().map(|entry| entry.level).max();
        let (prefix, rest) = split_prefix(path, &prefixes);

        table.push_str(&format!(
            "<tr><td><p style=\"color:#{}\"><tiny>{}</tiny><br />{}</p></td><td>",
            level_color(level),
            prefix.display(),
            rest.display(),
        ));
        for entry in &this_entries {
            table.push_str(&format!(
                "<p style=\"color:#{}\">{}: {}</p><br />",
                level_color(Some(entry.level)),
                entry.stage,
                entry.message,
            ));
        }
        table.push_str("</td></tr>");
    }
    table.push_str("</table>");
    table
}

fn level_color(level: Option<TrailLevel>) -> &'static str {
    match level {
        Some(TrailLevel::Warning) => "fc7e05",
        Some(TrailLevel::Error) | Some(TrailLevel::Critical) => "fd6b6b",
        _ => "000000",
    }
}
