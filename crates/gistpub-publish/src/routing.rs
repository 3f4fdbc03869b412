// SPDX-License-Identifier: AGPL-3.0
// Copyright (C) 2026 GistPub Contributors

//! Tag-based routing guard evaluated before any destination side effect.
//!
//! A record opts into a destination by carrying a tag block under that
//! destination's key; no key means the record is invisible to the
//! adapter. A present block must match the adapter's expected shape, and
//! its declared host must equal the adapter's configured host. The host
//! gate makes one event batch safely replayable against several
//! environment-specific adapter instances without cross-publishing.

use crate::error::{PublishError, PublishResult};
use gistpub_protocol::Gist;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::info;

/// A destination-specific tag block shape
pub trait TagBlock: DeserializeOwned {
    /// Key under which the block appears in a record's tag map
    const KEY: &'static str;

    /// The destination host the block declares
    fn host(&self) -> &str;
}

/// Confluence tag block: target page and host, optionally a space key
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct ConfluenceTag {
    pub page: String,
    pub host: String,
    #[serde(default)]
    pub space: Option<String>,
}

impl TagBlock for ConfluenceTag {
    const KEY: &'static str = "confluence";

    fn host(&self) -> &str {
        &self.host
    }
}

/// Jira tag block: target issue key and host
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct JiraTag {
    pub issue: String,
    pub host: String,
}

impl TagBlock for JiraTag {
    const KEY: &'static str = "jira";

    fn host(&self) -> &str {
        &self.host
    }
}

/// Routing decision for one record and one adapter
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route<T> {
    /// The record carries no tag block for this destination
    NotApplicable,
    /// The block declares a different host than this adapter serves
    HostMismatch { declared: String },
    /// The record is meant for this adapter
    Publish(T),
}

/// Evaluates the routing guard for one record.
///
/// A missing key and a host mismatch are skips, never errors; only a
/// malformed block fails the record.
pub fn route<T: TagBlock>(gist: &Gist, adapter_host: &str) -> PublishResult<Route<T>> {
    let Some(raw) = gist.tags.get(T::KEY) else {
        return Ok(Route::NotApplicable);
    };
    let tag: T = serde_json::from_value(raw.clone()).map_err(|err| PublishError::TagSchema {
        key: T::KEY.to_string(),
        reason: err.to_string(),
    })?;
    if tag.host() != adapter_host {
        info!(
            path = %gist.path.display(),
            "skipping gist: declared host {} does not match {adapter_host}",
            tag.host(),
        );
        return Ok(Route::HostMismatch { declared: tag.host().to_string() });
    }
    Ok(Route::Publish(tag))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::BTreeMap;
    use std::path::PathBuf;

    fn gist_with_tags(tags: BTreeMap<String, serde_json::Value>) -> Gist {
        Gist {
            path: PathBuf::from("docs/howto/README.md"),
            commit_id: "abc1234".into(),
            tags,
            resources: vec!["docs/howto:**/*.*".into()],
            trace_id: "docs/howto/README.md".into(),
            title: "howto-README.md".into(),
        }
    }

    #[test]
    fn test_missing_tag_key_is_not_applicable() {
        let gist = gist_with_tags(BTreeMap::new());
        let route = route::<ConfluenceTag>(&gist, "wiki.example.com").unwrap();
        assert_eq!(route, Route::NotApplicable);
    }

    #[test]
    fn test_matching_host_routes_to_publish() {
        let mut tags = BTreeMap::new();
        tags.insert(
            "confluence".to_string(),
            json!({"page": "117", "host": "wiki.example.com", "space": "OPS"}),
        );
        let gist = gist_with_tags(tags);

        let route = route::<ConfluenceTag>(&gist, "wiki.example.com").unwrap();

        match route {
            Route::Publish(tag) => {
                assert_eq!(tag.page, "117");
                assert_eq!(tag.space.as_deref(), Some("OPS"));
            }
            other => panic!("expected publish route, got {other:?}"),
        }
    }

    #[test]
    fn test_host_mismatch_is_a_skip() {
        let mut tags = BTreeMap::new();
        tags.insert("jira".to_string(), json!({"issue": "OPS-1", "host": "jira.other.com"}));
        let gist = gist_with_tags(tags);

        let route = route::<JiraTag>(&gist, "jira.example.com").unwrap();

        assert_eq!(route, Route::HostMismatch { declared: "jira.other.com".to_string() });
    }

    #[test]
    fn test_malformed_block_fails_with_tag_schema() {
        let mut tags = BTreeMap::new();
        tags.insert("jira".to_string(), json!({"issue": "OPS-1"}));
        let gist = gist_with_tags(tags);

        let err = route::<JiraTag>(&gist, "jira.example.com").unwrap_err();

        assert!(matches!(err, PublishError::TagSchema { .. }), "got {err:?}");
    }

    #[test]
    fn test_unknown_tag_keys_pass_through_opaquely() {
        let mut tags = BTreeMap::new();
        tags.insert("someday".to_string(), json!({"anything": true}));
        let gist = gist_with_tags(tags);

        assert_eq!(route::<ConfluenceTag>(&gist, "wiki.example.com").unwrap(), Route::NotApplicable);
        assert_eq!(route::<JiraTag>(&gist, "jira.example.com").unwrap(), Route::NotApplicable);
    }
}
