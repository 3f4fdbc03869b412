// SPDX-License-Identifier: AGPL-3.0
// Copyright (C) 2026 GistPub Contributors

//! The discovery iterator.

use crate::error::{DiscoverError, DiscoverResult};
use crate::template::render_template;
use gistpub_git::{AttrState, AttributeStore, GitRunner};
use gistpub_protocol::Gist;
use std::collections::{BTreeMap, HashSet, VecDeque};
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use walkdir::WalkDir;

/// Starts discovery over `target`, a file or directory inside the runner's
/// repository.
///
/// Fails up front when the gistpub attribute is not declared anywhere
/// ([`gistpub_git::GitError::AttributeNotConfigured`]) or when the target
/// is a symlink or missing. With `since_commit`, only files reported
/// changed between that commit and its parent are emitted; everything else
/// is skipped with an info log.
pub fn discover<'a>(
    runner: &'a GitRunner,
    target: &Path,
    since_commit: Option<&str>,
) -> DiscoverResult<Discovery<'a>> {
    let store = AttributeStore::new(runner);
    store.ensure_declared()?;

    let git_root = runner.git_root().canonicalize().map_err(gistpub_git::GitError::Io)?;
    let absolute = if target.is_absolute() {
        target.to_path_buf()
    } else {
        git_root.join(target)
    };

    let commit_id = runner.head_commit_id()?;
    let diff_files = match since_commit {
        Some(commit) => Some(runner.changed_files(commit)?),
        None => None,
    };

    // Symlinked targets are refused outright; a symlink would let one
    // discovery run escape the repository subtree it was pointed at
    let metadata = std::fs::symlink_metadata(&absolute)
        .map_err(|_| DiscoverError::UnsupportedTarget(target.to_path_buf()))?;

    let dirs: Box<dyn Iterator<Item = walkdir::Result<walkdir::DirEntry>>> =
        if metadata.is_dir() {
            Box::new(
                WalkDir::new(&absolute)
                    .sort_by_file_name()
                    .into_iter()
                    .filter_entry(|entry| entry.file_name() != ".git"),
            )
        } else if metadata.is_file() {
            Box::new(std::iter::empty())
        } else {
            return Err(DiscoverError::UnsupportedTarget(target.to_path_buf()));
        };

    let pending = if metadata.is_file() {
        let relative = absolute
            .strip_prefix(&git_root)
            .map_err(|_| DiscoverError::UnsupportedTarget(target.to_path_buf()))?
            .to_path_buf();
        VecDeque::from([relative])
    } else {
        VecDeque::new()
    };

    Ok(Discovery { runner, store, git_root, commit_id, diff_files, dirs, pending })
}

/// Lazy sequence of discovered gists, in deterministic traversal order.
pub struct Discovery<'a> {
    runner: &'a GitRunner,
    store: AttributeStore<'a>,
    git_root: PathBuf,
    commit_id: String,
    diff_files: Option<HashSet<PathBuf>>,
    dirs: Box<dyn Iterator<Item = walkdir::Result<walkdir::DirEntry>>>,
    pending: VecDeque<PathBuf>,
}

impl Discovery<'_> {
    /// Queries and renders the attribute for one tracked file, returning
    /// `None` when the file is not annotated or filtered out.
    fn emit(&self, file: PathBuf) -> DiscoverResult<Option<Gist>> {
        if let Some(diff_files) = &self.diff_files {
            if !diff_files.contains(&file) {
                info!("{} unchanged, skipping", file.display());
                return Ok(None);
            }
        }

        let tags = match self.store.query(&file)? {
            AttrState::Unspecified => return Ok(None),
            AttrState::Set => BTreeMap::new(),
            AttrState::Template(template) => self.render_tags(&file, &template)?,
        };

        let parent = file.parent().unwrap_or_else(|| Path::new(""));
        let dir_spec = if parent.as_os_str().is_empty() {
            ".".to_string()
        } else {
            parent.display().to_string()
        };
        let file_name =
            file.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_default();
        let title = match parent.file_name() {
            Some(parent_name) => format!("{}-{file_name}", parent_name.to_string_lossy()),
            None => file_name.clone(),
        };

        debug!("discovered gist {}", file.display());
        Ok(Some(Gist {
            trace_id: file.display().to_string(),
            commit_id: self.commit_id.clone(),
            tags,
            resources: vec![format!("{dir_spec}:**/*.*")],
            title,
            path: file,
        }))
    }

    fn render_tags(
        &self,
        file: &Path,
        template: &str,
    ) -> DiscoverResult<BTreeMap<String, serde_json::Value>> {
        let params = self.template_params(file);
        let rendered = render_template(template, &params)?;

        let value: serde_json::Value = serde_json::from_str(&rendered).map_err(|err| {
            DiscoverError::Template(format!(
                "attribute for {} did not render to valid JSON: {err}",
                file.display()
            ))
        })?;
        match value {
            serde_json::Value::Object(map) => Ok(map.into_iter().collect()),
            other => Err(DiscoverError::Schema(format!(
                "attribute for {} must render to a JSON object, got {other}",
                file.display()
            ))),
        }
    }

    fn template_params(&self, file: &Path) -> BTreeMap<String, String> {
        let parent = file.parent().unwrap_or_else(|| Path::new(""));
        BTreeMap::from([
            ("root".to_string(), self.git_root.display().to_string()),
            ("dir".to_string(), parent.display().to_string()),
            (
                "file".to_string(),
                file.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_default(),
            ),
            (
                "stem".to_string(),
                file.file_stem().map(|s| s.to_string_lossy().into_owned()).unwrap_or_default(),
            ),
            (
                "suffix".to_string(),
                file.extension()
                    .map(|e| format!(".{}", e.to_string_lossy()))
                    .unwrap_or_default(),
            ),
            (
                "parent".to_string(),
                parent
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_default(),
            ),
            ("commit_id".to_string(), self.commit_id.clone()),
        ])
    }

    /// Fills the pending queue with tracked files directly inside `dir`.
    fn enqueue_directory(&mut self, dir: &Path) -> DiscoverResult<()> {
        let relative = dir
            .strip_prefix(&self.git_root)
            .map_err(|_| DiscoverError::UnsupportedTarget(dir.to_path_buf()))?;

        let pathspec = if relative.as_os_str().is_empty() {
            Path::new(".")
        } else {
            relative
        };
        for file in self.runner.tracked_files(pathspec)? {
            // ls-files lists the whole subtree; only direct children belong
            // to this directory's batch
            if file.parent() == Some(relative) {
                self.pending.push_back(file);
            }
        }
        Ok(())
    }
}

impl Iterator for Discovery<'_> {
    type Item = DiscoverResult<Gist>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(file) = self.pending.pop_front() {
                match self.emit(file) {
                    Ok(Some(gist)) => return Some(Ok(gist)),
                    Ok(None) => continue,
                    Err(err) => return Some(Err(err)),
                }
            }

            match self.dirs.next() {
                Some(Ok(entry)) => {
                    if !entry.file_type().is_dir() {
                        continue;
                    }
                    if let Err(err) = self.enqueue_directory(entry.path()) {
                        return Some(Err(err));
                    }
                }
                Some(Err(err)) => return Some(Err(err.into())),
                None => return None,
            }
        }
    }
}
