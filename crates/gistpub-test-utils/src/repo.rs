// SPDX-License-Identifier: AGPL-3.0
// Copyright (C) 2026 GistPub Contributors

//! Test repository helper for integration tests.
//!
//! Wraps a temporary directory and common git operations so tests can set
//! up annotated working trees without repeating subprocess plumbing.

use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;

/// A temporary git repository with automatic cleanup.
///
/// # Example
/// ```ignore
/// use gistpub_test_utils::TestRepo;
///
/// let repo = TestRepo::with_initial_commit();
/// repo.write_file("docs/README.md", b"# Hello\n");
/// repo.add(&["docs/README.md"]);
/// repo.commit("Add docs");
/// ```
pub struct TestRepo {
    temp_dir: TempDir,
}

impl TestRepo {
    /// Creates a new empty test directory (not initialized as a repo).
    pub fn new() -> Self {
        Self { temp_dir: TempDir::new().expect("failed to create temp directory") }
    }

    /// Creates a new directory initialized as a git repository with a
    /// deterministic identity and no global config surprises.
    pub fn initialized() -> Self {
        let repo = Self::new();
        repo.git(&["init", "-q", "-b", "main"]);
        repo.git(&["config", "user.name", "gistpub-tests"]);
        repo.git(&["config", "user.email", "tests@gistpub.invalid"]);
        repo
    }

    /// Creates a repository with one initial commit.
    pub fn with_initial_commit() -> Self {
        let repo = Self::initialized();
        repo.write_file("README.md", b"# Test Repository\n");
        repo.add(&["README.md"]);
        repo.commit("Initial commit");
        repo
    }

    /// Creates a bare repository, usable as a push/fetch target.
    pub fn bare() -> Self {
        let repo = Self::new();
        repo.git(&["init", "-q", "--bare", "-b", "main"]);
        repo
    }

    /// Path to the repository directory.
    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    /// `file://` URL for this repository.
    pub fn file_url(&self) -> String {
        format!("file://{}", self.path().display())
    }

    /// Writes a file, creating parent directories as needed.
    pub fn write_file(&self, relative: impl AsRef<Path>, contents: &[u8]) -> PathBuf {
        let path = self.path().join(relative.as_ref());
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("failed to create parent directories");
        }
        std::fs::write(&path, contents).expect("failed to write file");
        path
    }

    /// Stages the given paths.
    pub fn add(&self, paths: &[&str]) {
        let mut args = vec!["add", "--"];
        args.extend_from_slice(paths);
        self.git(&args);
    }

    /// Commits staged changes.
    pub fn commit(&self, message: &str) {
        self.git(&["commit", "-q", "-m", message]);
    }

    /// Creates a branch at HEAD.
    pub fn branch(&self, name: &str) {
        self.git(&["branch", name]);
    }

    /// Declares the `[attr]gistpub` macro in `.git/info/attributes`.
    pub fn declare_gistpub_attribute(&self) {
        let info_dir = self.path().join(".git").join("info");
        std::fs::create_dir_all(&info_dir).expect("failed to create .git/info");
        std::fs::write(info_dir.join("attributes"), b"[attr]gistpub\n")
            .expect("failed to write attributes file");
    }

    /// Runs a git command in the repository, panicking on failure.
    pub fn git(&self, args: &[&str]) -> String {
        let output = Command::new("git")
            .args(args)
            .current_dir(self.path())
            .output()
            .expect("failed to spawn git");
        assert!(
            output.status.success(),
            "git {:?} failed: {}",
            args,
            String::from_utf8_lossy(&output.stderr)
        );
        String::from_utf8_lossy(&output.stdout).into_owned()
    }

    /// Names of the remotes currently configured in this repository.
    pub fn remotes(&self) -> Vec<String> {
        self.git(&["remote"]).lines().map(|line| line.trim().to_string()).collect()
    }
}

impl Default for TestRepo {
    fn default() -> Self {
        Self::new()
    }
}
