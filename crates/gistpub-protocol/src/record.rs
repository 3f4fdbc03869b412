// SPDX-License-Identifier: AGPL-3.0
// Copyright (C) 2026 GistPub Contributors

//! Record types carried by event batches.
//!
//! A [`Gist`] is one discovered source file plus its destination-routing
//! metadata. A [`ConvertedGist`] wraps the originating gist together with a
//! rendered artifact produced by a conversion stage. Converted records are
//! never mutated after a conversion stage emits them.

use crate::error::{EventError, EventResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// One discovered unit of publishable content.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Gist {
    /// Repository-relative file location; the natural unique key within one run
    pub path: PathBuf,
    /// Short hash of the last commit touching the tree at discovery time
    pub commit_id: String,
    /// Per-destination configuration blocks, keyed by destination name.
    /// Presence of a key signals intent to publish there; absence means skip.
    pub tags: BTreeMap<String, serde_json::Value>,
    /// Resource search specifiers of the form `<directory>:<glob-pattern>`
    pub resources: Vec<String>,
    /// Stable identifier correlating derived artifacts back to this source
    pub trace_id: String,
    /// Human-readable display name
    pub title: String,
}

impl Gist {
    /// Template parameters derived from this gist, used when rendering
    /// attribute values and conversion defaults files.
    pub fn template_params(&self) -> BTreeMap<String, String> {
        let mut params = BTreeMap::new();
        params.insert("path".into(), self.path.display().to_string());
        params.insert(
            "dir".into(),
            self.path.parent().map(|p| p.display().to_string()).unwrap_or_default(),
        );
        params.insert(
            "name".into(),
            self.path.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_default(),
        );
        params.insert(
            "stem".into(),
            self.path.file_stem().map(|s| s.to_string_lossy().into_owned()).unwrap_or_default(),
        );
        params.insert(
            "suffix".into(),
            self.path
                .extension()
                .map(|e| format!(".{}", e.to_string_lossy()))
                .unwrap_or_default(),
        );
        params.insert(
            "parent".into(),
            self.path
                .parent()
                .and_then(|p| p.file_name())
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default(),
        );
        params.insert("commit_id".into(), self.commit_id.clone());
        params.insert("trace_id".into(), self.trace_id.clone());
        params.insert("title".into(), self.title.clone());
        params
    }

    pub(crate) fn validate(&self) -> EventResult<()> {
        if self.path.as_os_str().is_empty() {
            return Err(EventError::Schema("gist path must not be empty".into()));
        }
        if self.commit_id.is_empty() {
            return Err(EventError::Schema(format!(
                "gist {} has an empty commit_id",
                self.path.display()
            )));
        }
        if self.trace_id.is_empty() {
            return Err(EventError::Schema(format!(
                "gist {} has an empty trace_id",
                self.path.display()
            )));
        }
        if self.title.is_empty() {
            return Err(EventError::Schema(format!(
                "gist {} has an empty title",
                self.path.display()
            )));
        }
        Ok(())
    }
}

/// A rendered artifact produced by a conversion stage.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ConvertedGist {
    /// The originating record
    pub gist: Gist,
    /// Location of the rendered artifact (e.g. a `.jira` or `.pdf` file)
    pub path: PathBuf,
    /// Display title, possibly overridden by conversion-time metadata
    pub title: String,
    /// Directories holding files this artifact actually requires
    pub deps: Vec<PathBuf>,
}

impl ConvertedGist {
    /// Whether this artifact is the primary document for its destination,
    /// as opposed to a secondary attachment. Primary documents must be
    /// published before attachments that target their container.
    pub fn is_primary(&self) -> bool {
        self.path.extension().is_some_and(|ext| ext == "jira")
    }

    pub(crate) fn validate(&self) -> EventResult<()> {
        self.gist.validate()?;
        if self.path.as_os_str().is_empty() {
            return Err(EventError::Schema(format!(
                "converted gist for {} has an empty artifact path",
                self.gist.path.display()
            )));
        }
        if self.title.is_empty() {
            return Err(EventError::Schema(format!(
                "converted gist {} has an empty title",
                self.path.display()
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_gist() -> Gist {
        Gist {
            path: PathBuf::from("docs/howto/README.md"),
            commit_id: "c0ffee1".to_string(),
            tags: BTreeMap::new(),
            resources: vec!["docs/howto:**/*.*".to_string()],
            trace_id: "docs/howto/README.md".to_string(),
            title: "howto-README.md".to_string(),
        }
    }

    #[test]
    fn test_template_params() {
        let params = sample_gist().template_params();
        assert_eq!(params["dir"], "docs/howto");
        assert_eq!(params["name"], "README.md");
        assert_eq!(params["stem"], "README");
        assert_eq!(params["suffix"], ".md");
        assert_eq!(params["parent"], "howto");
        assert_eq!(params["commit_id"], "c0ffee1");
    }

    #[test]
    fn test_validate_rejects_empty_commit_id() {
        let mut gist = sample_gist();
        gist.commit_id.clear();
        assert!(gist.validate().is_err());
    }

    #[test]
    fn test_primary_detection_by_suffix() {
        let gist = sample_gist();
        let primary = ConvertedGist {
            gist: gist.clone(),
            path: PathBuf::from("docs/howto/README.jira"),
            title: "howto-README.md".to_string(),
            deps: vec![],
        };
        let attachment = ConvertedGist {
            gist,
            path: PathBuf::from("docs/howto/README.pdf"),
            title: "howto-README.md".to_string(),
            deps: vec![],
        };
        assert!(primary.is_primary());
        assert!(!attachment.is_primary());
    }
}
