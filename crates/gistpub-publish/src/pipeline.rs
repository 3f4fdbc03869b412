// SPDX-License-Identifier: AGPL-3.0
// Copyright (C) 2026 GistPub Contributors

//! Batch publishing with primary-first ordering and fail-at-end
//! aggregation.
//!
//! Within one batch, primary documents are published before attachment
//! artifacts so the destination container exists before anything targets
//! it. A failing record is caught at the record boundary, trailed under
//! its trace id, and the remaining records still run; the aggregate
//! failure lists every failed trace id at the end.

use crate::destination::{Destination, Outcome};
use crate::error::{PublishError, PublishResult};
use gistpub_observability::TrailWriter;
use gistpub_protocol::ConvertedGist;
use tracing::{debug, error, info};

/// Stable primary-first ordering for one batch.
pub fn sort_for_publish(convs: &[ConvertedGist]) -> Vec<&ConvertedGist> {
    let mut sorted: Vec<&ConvertedGist> = convs.iter().collect();
    sorted.sort_by_key(|conv| usize::from(!conv.is_primary()));
    sorted
}

/// Publishes a whole batch to one destination.
pub async fn publish_all(
    destination: &dyn Destination,
    convs: &[ConvertedGist],
    trail: &TrailWriter,
    dry_run: bool,
) -> PublishResult<()> {
    let mut failed: Vec<String> = Vec::new();

    for conv in sort_for_publish(convs) {
        let suffix = conv
            .path
            .extension()
            .map(|ext| format!(".{}", ext.to_string_lossy()))
            .unwrap_or_default();
        match destination.publish(conv, dry_run).await {
            Ok(Outcome::Published { container }) => {
                info!(
                    trace_id = %conv.gist.trace_id,
                    "published {} on {} ({container})",
                    conv.path.display(),
                    destination.host(),
                );
                if let Err(err) = trail.info(
                    &conv.gist.path,
                    &format!("published on {} as {suffix}", destination.host()),
                ) {
                    error!("could not append trail entry: {err}");
                }
            }
            Ok(Outcome::NotApplicable) => {
                debug!(
                    trace_id = %conv.gist.trace_id,
                    "not tagged for {}",
                    destination.name(),
                );
            }
            Ok(Outcome::SkippedHost { declared }) => {
                debug!(
                    trace_id = %conv.gist.trace_id,
                    "tagged for host {declared}, adapter serves {}",
                    destination.host(),
                );
            }
            Err(err) => {
                error!(trace_id = %conv.gist.trace_id, "publishing failed: {err}");
                if let Err(trail_err) = trail.error(
                    &conv.gist.path,
                    &format!("publishing on {} as {suffix} failed", destination.host()),
                ) {
                    error!("could not append trail entry: {trail_err}");
                }
                failed.push(conv.gist.trace_id.clone());
            }
        }
    }

    if failed.is_empty() {
        Ok(())
    } else {
        Err(PublishError::Failed { trace_ids: failed })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use gistpub_protocol::Gist;
    use std::collections::BTreeMap;
    use std::path::PathBuf;
    use std::sync::Mutex;

    struct RecordingDestination {
        published: Mutex<Vec<PathBuf>>,
        fail_on: Option<PathBuf>,
    }

    impl RecordingDestination {
        fn new() -> Self {
            Self { published: Mutex::new(Vec::new()), fail_on: None }
        }

        fn failing_on(path: &str) -> Self {
            Self { published: Mutex::new(Vec::new()), fail_on: Some(PathBuf::from(path)) }
        }

        fn published(&self) -> Vec<PathBuf> {
            self.published.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Destination for RecordingDestination {
        fn name(&self) -> &'static str {
            "recording"
        }

        fn host(&self) -> &str {
            "wiki.example.com"
        }

        async fn publish(&self, conv: &ConvertedGist, _dry_run: bool) -> PublishResult<Outcome> {
            if self.fail_on.as_deref() == Some(conv.path.as_path()) {
                return Err(PublishError::Api {
                    context: "update page".into(),
                    status: 500,
                    message: "boom".into(),
                });
            }
            self.published.lock().unwrap().push(conv.path.clone());
            Ok(Outcome::Published { container: "117".into() })
        }
    }

    fn conv(artifact: &str) -> ConvertedGist {
        let source = PathBuf::from("docs/howto/README.md");
        ConvertedGist {
            gist: Gist {
                path: source.clone(),
                commit_id: "abc1234".into(),
                tags: BTreeMap::new(),
                resources: vec!["docs/howto:**/*.*".into()],
                trace_id: format!("{}#{artifact}", source.display()),
                title: "howto-README.md".into(),
            },
            path: PathBuf::from(artifact),
            title: "howto-README.md".into(),
            deps: vec![PathBuf::from("docs/howto")],
        }
    }

    fn trail_in(dir: &tempfile::TempDir) -> TrailWriter {
        TrailWriter::new(dir.path(), "confluence")
    }

    #[tokio::test]
    async fn test_primaries_publish_before_attachments() {
        let dir = tempfile::tempdir().unwrap();
        let destination = RecordingDestination::new();
        let convs = vec![conv("docs/howto/README.pdf"), conv("docs/howto/README.jira")];

        publish_all(&destination, &convs, &trail_in(&dir), false).await.unwrap();

        assert_eq!(
            destination.published(),
            vec![
                PathBuf::from("docs/howto/README.jira"),
                PathBuf::from("docs/howto/README.pdf"),
            ]
        );
    }

    #[tokio::test]
    async fn test_failures_are_aggregated_after_all_records_ran() {
        let dir = tempfile::tempdir().unwrap();
        let destination = RecordingDestination::failing_on("docs/howto/README.jira");
        let convs = vec![conv("docs/howto/README.jira"), conv("docs/howto/README.pdf")];

        let err = publish_all(&destination, &convs, &trail_in(&dir), false).await.unwrap_err();

        // The attachment still ran after the primary failed
        assert_eq!(destination.published(), vec![PathBuf::from("docs/howto/README.pdf")]);
        match err {
            PublishError::Failed { trace_ids } => {
                assert_eq!(trace_ids, vec!["docs/howto/README.md#docs/howto/README.jira"]);
            }
            other => panic!("expected aggregate failure, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_outcomes_are_trailed() {
        use gistpub_observability::{TrailEntry, TrailLevel, TRAIL_FILE_NAME};

        let dir = tempfile::tempdir().unwrap();
        let destination = RecordingDestination::failing_on("docs/howto/README.pdf");
        let convs = vec![conv("docs/howto/README.jira"), conv("docs/howto/README.pdf")];

        let _ = publish_all(&destination, &convs, &trail_in(&dir), false).await;

        let entries = TrailEntry::parse_file(&dir.path().join(TRAIL_FILE_NAME)).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].level, TrailLevel::Info);
        assert!(entries[0].message.contains("as .jira"));
        assert_eq!(entries[1].level, TrailLevel::Error);
        assert!(entries[1].message.contains("failed"));
    }
}
