// SPDX-License-Identifier: AGPL-3.0
// Copyright (C) 2026 GistPub Contributors

//! Integration tests for the pandoc conversion stage.
//!
//! All conversions run dry unless a test explicitly needs side effects,
//! so the suite never depends on a working pandoc install.

use gistpub_convert::{convert, convert_all, ConvertError};
use gistpub_git::GitRunner;
use gistpub_observability::{TrailEntry, TrailLevel, TrailWriter, TRAIL_FILE_NAME};
use gistpub_protocol::Gist;
use gistpub_test_utils::TestRepo;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

fn sample_gist(path: &str) -> Gist {
    let path = PathBuf::from(path);
    let title = format!(
        "{}-{}",
        path.parent().and_then(|p| p.file_name()).unwrap().to_string_lossy(),
        path.file_name().unwrap().to_string_lossy(),
    );
    Gist {
        trace_id: path.display().to_string(),
        title,
        path,
        commit_id: "abc1234".into(),
        tags: BTreeMap::new(),
        resources: vec!["docs/howto:**/*.*".into()],
    }
}

fn runner_for(repo: &TestRepo) -> GitRunner {
    GitRunner::new(repo.path().canonicalize().unwrap())
}

fn fixture_repo() -> TestRepo {
    let repo = TestRepo::initialized();
    repo.write_file("docs/howto/README.md", b"# How to\n\nSome steps.\n");
    repo.write_file(
        "docs/howto/article.pandoc.json",
        concat!(
            "{\n",
            "  \"to\": \"jira\",\n",
            "  \"metadata\": { \"title\": \"{{ parent }} guide\" },\n",
            "  \"resource-path\": [\".\", \"img\"]\n",
            "}\n",
        )
        .as_bytes(),
    );
    repo.add(&["."]);
    repo.commit("add howto");
    repo
}

#[test]
fn test_dry_run_emits_record_per_defaults_file() {
    let repo = fixture_repo();
    let gist = sample_gist("docs/howto/README.md");

    let convs = convert(&runner_for(&repo), &gist, Path::new(""), true).unwrap();

    assert_eq!(convs.len(), 1);
    let conv = &convs[0];
    assert_eq!(conv.path, PathBuf::from("docs/howto/README.jira"));
    assert_eq!(conv.title, "howto guide");
    assert_eq!(
        conv.deps,
        vec![PathBuf::from("docs/howto/."), PathBuf::from("docs/howto/img")]
    );
    assert_eq!(conv.gist, gist);
}

#[test]
fn test_dry_run_writes_nothing() {
    let repo = fixture_repo();
    let gist = sample_gist("docs/howto/README.md");

    convert(&runner_for(&repo), &gist, Path::new(""), true).unwrap();

    assert!(!repo.path().join("docs/howto/article.defaults.json").exists());
    assert!(!repo.path().join("docs/howto/README.jira").exists());
}

#[test]
fn test_title_falls_back_to_record_title() {
    let repo = TestRepo::initialized();
    repo.write_file("docs/howto/README.md", b"# How to\n");
    repo.write_file(
        "docs/howto/article.pandoc.json",
        b"{ \"to\": \"jira\", \"resource-path\": [\".\"] }\n",
    );
    repo.add(&["."]);
    repo.commit("add howto");
    let gist = sample_gist("docs/howto/README.md");

    let convs = convert(&runner_for(&repo), &gist, Path::new(""), true).unwrap();

    assert_eq!(convs[0].title, "howto-README.md");
}

#[test]
fn test_renditions_are_ordered_by_defaults_name() {
    let repo = fixture_repo();
    repo.write_file(
        "docs/howto/slides.pandoc.json",
        b"{ \"to\": \"pdf\", \"resource-path\": [\".\"] }\n",
    );
    repo.add(&["."]);
    repo.commit("add slides rendition");
    let gist = sample_gist("docs/howto/README.md");

    let convs = convert(&runner_for(&repo), &gist, Path::new(""), true).unwrap();

    assert_eq!(convs.len(), 2);
    assert_eq!(convs[0].path, PathBuf::from("docs/howto/README.jira"));
    assert_eq!(convs[1].path, PathBuf::from("docs/howto/README.pdf"));
}

#[test]
fn test_output_tree_prefixes_artifact_paths() {
    let repo = fixture_repo();
    let gist = sample_gist("docs/howto/README.md");

    let convs = convert(&runner_for(&repo), &gist, Path::new("build"), true).unwrap();

    assert_eq!(convs[0].path, PathBuf::from("build/docs/howto/README.jira"));
}

#[test]
fn test_gist_without_defaults_yields_no_records() {
    let repo = TestRepo::initialized();
    repo.write_file("docs/plain.md", b"plain\n");
    repo.add(&["."]);
    repo.commit("add plain");
    let gist = sample_gist("docs/plain.md");

    let convs = convert(&runner_for(&repo), &gist, Path::new(""), true).unwrap();

    assert!(convs.is_empty());
}

#[test]
fn test_defaults_without_to_option_fail() {
    let repo = TestRepo::initialized();
    repo.write_file("docs/howto/README.md", b"# How to\n");
    repo.write_file(
        "docs/howto/article.pandoc.json",
        b"{ \"resource-path\": [\".\"] }\n",
    );
    repo.add(&["."]);
    repo.commit("add howto");
    let gist = sample_gist("docs/howto/README.md");

    let err = convert(&runner_for(&repo), &gist, Path::new(""), true).unwrap_err();

    assert!(matches!(err, ConvertError::Defaults { .. }), "got {err:?}");
}

#[test]
fn test_defaults_without_resource_path_fail() {
    let repo = TestRepo::initialized();
    repo.write_file("docs/howto/README.md", b"# How to\n");
    repo.write_file("docs/howto/article.pandoc.json", b"{ \"to\": \"jira\" }\n");
    repo.add(&["."]);
    repo.commit("add howto");
    let gist = sample_gist("docs/howto/README.md");

    let err = convert(&runner_for(&repo), &gist, Path::new(""), true).unwrap_err();

    assert!(matches!(err, ConvertError::Defaults { .. }), "got {err:?}");
}

#[test]
fn test_defaults_with_unknown_placeholder_fail() {
    let repo = TestRepo::initialized();
    repo.write_file("docs/howto/README.md", b"# How to\n");
    repo.write_file(
        "docs/howto/article.pandoc.json",
        b"{ \"to\": \"{{ nonsense }}\", \"resource-path\": [\".\"] }\n",
    );
    repo.add(&["."]);
    repo.commit("add howto");
    let gist = sample_gist("docs/howto/README.md");

    let err = convert(&runner_for(&repo), &gist, Path::new(""), true).unwrap_err();

    assert!(matches!(err, ConvertError::Template { .. }), "got {err:?}");
}

#[test]
fn test_defaults_with_invalid_json_fail() {
    let repo = TestRepo::initialized();
    repo.write_file("docs/howto/README.md", b"# How to\n");
    repo.write_file("docs/howto/article.pandoc.json", b"to: jira\n");
    repo.add(&["."]);
    repo.commit("add howto");
    let gist = sample_gist("docs/howto/README.md");

    let err = convert(&runner_for(&repo), &gist, Path::new(""), true).unwrap_err();

    assert!(matches!(err, ConvertError::Defaults { .. }), "got {err:?}");
}

#[test]
fn test_convert_all_aggregates_failures_per_record() {
    let repo = TestRepo::initialized();
    repo.write_file("docs/good/README.md", b"# Good\n");
    repo.write_file(
        "docs/good/article.pandoc.json",
        b"{ \"to\": \"jira\", \"resource-path\": [\".\"] }\n",
    );
    repo.write_file("docs/bad/README.md", b"# Bad\n");
    repo.write_file("docs/bad/article.pandoc.json", b"{ \"resource-path\": [\".\"] }\n");
    repo.add(&["."]);
    repo.commit("add gists");
    let gists = vec![sample_gist("docs/bad/README.md"), sample_gist("docs/good/README.md")];
    let trail = TrailWriter::new(repo.path(), "convert");

    let err =
        convert_all(&runner_for(&repo), &gists, Path::new(""), &trail, true).unwrap_err();

    match err {
        ConvertError::Failed { trace_ids } => {
            assert_eq!(trace_ids, vec!["docs/bad/README.md".to_string()]);
        }
        other => panic!("expected aggregate failure, got {other:?}"),
    }

    let entries = TrailEntry::parse_file(&repo.path().join(TRAIL_FILE_NAME)).unwrap();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].subject, PathBuf::from("docs/bad/README.md"));
    assert_eq!(entries[0].level, TrailLevel::Error);
    assert_eq!(entries[1].subject, PathBuf::from("docs/good/README.md"));
    assert_eq!(entries[1].level, TrailLevel::Info);
}

#[test]
fn test_generated_files_in_gist_directory_are_ignored() {
    let repo = fixture_repo();
    let gist = sample_gist("docs/howto/README.md");

    // Not a dry run: the rendered defaults file is written into the gist's
    // directory before pandoc is invoked, whatever pandoc does afterwards.
    let _ = convert(&runner_for(&repo), &gist, Path::new(""), false);

    let gitignore =
        std::fs::read_to_string(repo.path().join("docs/howto/.gitignore")).unwrap();
    assert!(gitignore.lines().any(|line| line == "article.defaults.json"), "{gitignore}");
}
