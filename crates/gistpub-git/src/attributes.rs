// SPDX-License-Identifier: AGPL-3.0
// Copyright (C) 2026 GistPub Contributors

//! The gistpub macro attribute: declaration lookup, opt-in installation,
//! and per-path queries.
//!
//! Gists are annotated through a custom git attribute, e.g. in
//! `.gitattributes`:
//!
//! ```text
//! [attr]gistpub
//! docs/**/README.md gistpub={"confluence":{"page":"117","host":"wiki.example.com"}}
//! ```
//!
//! The `[attr]gistpub` macro declaration may live in the repository-local
//! attributes files or in the user's global one; discovery refuses to run
//! until it is declared somewhere (see DEFINING MACRO ATTRIBUTES in
//! `git help attributes`).

use crate::error::{GitError, GitResult};
use crate::shell::GitRunner;
use std::path::{Path, PathBuf};
use tracing::info;

/// Name of the gistpub git attribute
pub const ATTRIBUTE_NAME: &str = "gistpub";

fn attribute_declaration() -> String {
    format!("[attr]{ATTRIBUTE_NAME}")
}

/// Walks parent directories until one containing a `.git` entry is found.
///
/// A `.git` file (as used by linked worktrees) counts as well as the usual
/// `.git` directory.
pub fn locate_git_root(start: &Path) -> GitResult<PathBuf> {
    if !start.exists() {
        return Err(GitError::NotInRepository(start.to_path_buf()));
    }

    let mut current = if start.is_dir() {
        start.to_path_buf()
    } else {
        start.parent().unwrap_or(start).to_path_buf()
    };
    if let Ok(canonical) = current.canonicalize() {
        current = canonical;
    }

    loop {
        if current.join(".git").exists() {
            return Ok(current);
        }
        if !current.pop() {
            return Err(GitError::NotInRepository(start.to_path_buf()));
        }
    }
}

/// Result of querying the gistpub attribute for one path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttrState {
    /// Attribute not set for this path; the file is not a gist
    Unspecified,
    /// Attribute set without a value; the gist carries an empty tag map
    Set,
    /// Attribute set to a template source to be rendered into tags
    Template(String),
}

/// Queries and manages the gistpub attribute for one repository.
pub struct AttributeStore<'a> {
    runner: &'a GitRunner,
}

impl<'a> AttributeStore<'a> {
    pub fn new(runner: &'a GitRunner) -> Self {
        Self { runner }
    }

    /// Verifies that `[attr]gistpub` is declared in one of the known
    /// attributes files, in priority order: the repository's
    /// `.git/info/attributes`, its `.gitattributes`, the configured global
    /// attributes file, and `$HOME/.config/git/attributes`.
    pub fn ensure_declared(&self) -> GitResult<()> {
        let declaration = attribute_declaration();
        for candidate in self.candidate_files() {
            if !candidate.is_file() {
                continue;
            }
            if let Ok(contents) = std::fs::read_to_string(&candidate) {
                if contents.contains(&declaration) {
                    return Ok(());
                }
            }
        }
        Err(GitError::AttributeNotConfigured)
    }

    /// Appends the `[attr]gistpub` declaration to `.git/info/attributes`.
    ///
    /// This is the only operation that mutates the repository's attribute
    /// configuration; it is explicit and opt-in, never run during discovery.
    pub fn init(&self) -> GitResult<()> {
        if self.ensure_declared().is_ok() {
            return Ok(()); // already declared somewhere
        }

        let info_dir = self.runner.git_root().join(".git").join("info");
        std::fs::create_dir_all(&info_dir)?;

        let attributes_path = info_dir.join("attributes");
        info!("adding {} to {}", attribute_declaration(), attributes_path.display());

        let mut contents = std::fs::read_to_string(&attributes_path).unwrap_or_default();
        if !contents.is_empty() && !contents.ends_with('\n') {
            contents.push('\n');
        }
        contents.push_str(&attribute_declaration());
        contents.push('\n');
        std::fs::write(&attributes_path, contents)?;
        Ok(())
    }

    /// Queries the gistpub attribute for a single repository-relative path.
    pub fn query(&self, path: &Path) -> GitResult<AttrState> {
        let path_str = path.to_string_lossy();
        let output =
            self.runner.run(&["check-attr", ATTRIBUTE_NAME, "--", path_str.as_ref()])?;

        // Output shape: "<path>: gistpub: <value>"
        let line = output.trim_end_matches(['\r', '\n']);
        let value = match line.rsplit_once(": ") {
            Some((_, value)) => value,
            None => return Ok(AttrState::Unspecified),
        };

        // "unspecified" and "unset" are opaque sentinels printed by
        // git check-attr, not template sources
        match value {
            "unspecified" | "unset" => Ok(AttrState::Unspecified),
            "set" => Ok(AttrState::Set),
            template => Ok(AttrState::Template(template.to_string())),
        }
    }

    fn candidate_files(&self) -> Vec<PathBuf> {
        let git_root = self.runner.git_root();
        let mut candidates = vec![
            git_root.join(".git").join("info").join("attributes"),
            git_root.join(".gitattributes"),
        ];

        // Globally configured attributes file, if any; a missing config key
        // is a normal condition, not an error
        if let Ok(configured) =
            self.runner.run_quiet(&["config", "--global", "--get", "core.attributesfile"])
        {
            let configured = configured.trim();
            if !configured.is_empty() {
                candidates.push(PathBuf::from(configured));
            }
        }

        if let Ok(home) = std::env::var("HOME") {
            candidates.push(PathBuf::from(home).join(".config").join("git").join("attributes"));
        }

        candidates
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gistpub_test_utils::TestRepo;

    #[test]
    fn test_locate_git_root_from_nested_dir() {
        let repo = TestRepo::with_initial_commit();
        let nested = repo.path().join("docs").join("howto");
        std::fs::create_dir_all(&nested).unwrap();

        let found = locate_git_root(&nested).unwrap();
        assert_eq!(found, repo.path().canonicalize().unwrap());
    }

    #[test]
    fn test_locate_git_root_outside_repository() {
        let temp = tempfile::TempDir::new().unwrap();
        let result = locate_git_root(temp.path());
        assert!(matches!(result, Err(GitError::NotInRepository(_))));
    }

    #[test]
    fn test_ensure_declared_fails_without_declaration() {
        let repo = TestRepo::with_initial_commit();
        let runner = GitRunner::new(repo.path());
        let store = AttributeStore::new(&runner);
        // Isolated test repos have no global attributes file with the macro
        assert!(matches!(store.ensure_declared(), Err(GitError::AttributeNotConfigured)));
    }

    #[test]
    fn test_init_declares_attribute_once() {
        let repo = TestRepo::with_initial_commit();
        let runner = GitRunner::new(repo.path());
        let store = AttributeStore::new(&runner);

        store.init().unwrap();
        store.ensure_declared().unwrap();
        store.init().unwrap(); // second init must not duplicate

        let contents =
            std::fs::read_to_string(repo.path().join(".git/info/attributes")).unwrap();
        assert_eq!(contents.matches("[attr]gistpub").count(), 1);
    }

    #[test]
    fn test_query_states() {
        let repo = TestRepo::with_initial_commit();
        repo.write_file(
            ".gitattributes",
            b"[attr]gistpub\nREADME.md gistpub={\"jira\":{\"issue\":\"DOC-1\",\"host\":\"jira.example.com\"}}\nplain.md gistpub\n",
        );
        repo.write_file("plain.md", b"plain\n");
        repo.add(&[".gitattributes", "plain.md"]);
        repo.commit("Annotate gists");

        let runner = GitRunner::new(repo.path());
        let store = AttributeStore::new(&runner);

        match store.query(Path::new("README.md")).unwrap() {
            AttrState::Template(template) => assert!(template.contains("DOC-1")),
            other => panic!("expected template, got {other:?}"),
        }
        assert_eq!(store.query(Path::new("plain.md")).unwrap(), AttrState::Set);
        assert_eq!(
            store.query(Path::new("unrelated.md")).unwrap(),
            AttrState::Unspecified
        );
    }
}
