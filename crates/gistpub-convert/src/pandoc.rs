// SPDX-License-Identifier: AGPL-3.0
// Copyright (C) 2026 GistPub Contributors

//! Pandoc-driven conversion of discovered gists.
//!
//! Each defaults file `<name>.pandoc.json` next to a gist describes one
//! rendition: it is a pandoc defaults file with `{{ key }}` placeholders
//! over the gist's template parameters. The rendered defaults are written
//! into the output tree as `<name>.defaults.json` and handed to
//! `pandoc -d`, producing `<gist stem>.<to>` beside them. Every defaults
//! file must name its `to` format and the `resource-path` directories the
//! rendition depends on.

use crate::error::{ConvertError, ConvertResult};
use gistpub_discovery::render_template;
use gistpub_git::GitRunner;
use gistpub_observability::TrailWriter;
use gistpub_protocol::{ConvertedGist, Gist};
use serde_json::Value;
use std::collections::HashSet;
use std::fs;
use std::path::{Component, Path, PathBuf};
use std::process::Command;
use tracing::{debug, info, warn};

const DEFAULTS_SUFFIX: &str = ".pandoc.json";

/// Resolves a user-supplied output path to a repository-relative one.
///
/// Downstream stages address artifacts by repo-relative path, so the
/// output tree must live inside the repository.
pub fn ensure_outpath(git_root: &Path, outpath: &Path) -> ConvertResult<PathBuf> {
    let absolute = if outpath.is_absolute() {
        normalize(outpath)
    } else {
        normalize(&git_root.join(outpath))
    };
    absolute
        .strip_prefix(git_root)
        .map(Path::to_path_buf)
        .map_err(|_| ConvertError::OutsideGitRoot(outpath.to_path_buf()))
}

/// Lexical normalization; `..` popping is enough here because the
/// repository root is already canonical.
fn normalize(path: &Path) -> PathBuf {
    let mut normalized = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                normalized.pop();
            }
            other => normalized.push(other),
        }
    }
    normalized
}

/// Converts every gist in the batch, catching per-record failures so one
/// broken gist does not abandon the rest. Outcomes are appended to the
/// trail log; the aggregate error at the end names the records that did
/// not convert.
pub fn convert_all(
    runner: &GitRunner,
    gists: &[Gist],
    outpath: &Path,
    trail: &TrailWriter,
    dry_run: bool,
) -> ConvertResult<Vec<ConvertedGist>> {
    let mut convs = Vec::new();
    let mut failed = Vec::new();
    for gist in gists {
        match convert(runner, gist, outpath, dry_run) {
            Ok(mut rendered) => {
                if let Err(err) =
                    trail.info(&gist.path, &format!("converted into {} artifacts", rendered.len()))
                {
                    warn!("could not append trail entry: {err}");
                }
                convs.append(&mut rendered);
            }
            Err(err) => {
                tracing::error!(trace_id = %gist.trace_id, "conversion failed: {err}");
                if let Err(trail_err) = trail.error(&gist.path, "conversion failed") {
                    warn!("could not append trail entry: {trail_err}");
                }
                failed.push(gist.trace_id.clone());
            }
        }
    }
    if failed.is_empty() {
        Ok(convs)
    } else {
        Err(ConvertError::Failed { trace_ids: failed })
    }
}

/// Converts one gist, producing one [`ConvertedGist`] per defaults file
/// found beside it. Files pandoc drops into the gist's own directory are
/// added to that directory's `.gitignore` afterwards, whether or not the
/// conversion succeeded.
pub fn convert(
    runner: &GitRunner,
    gist: &Gist,
    outpath: &Path,
    dry_run: bool,
) -> ConvertResult<Vec<ConvertedGist>> {
    let dir = gist_dir(gist);
    let pre_existing = directory_entries(&runner.git_root().join(&dir))?;

    let result = convert_renditions(runner, gist, &dir, outpath, dry_run);

    if let Err(err) = ignore_new_entries(runner, &dir, &pre_existing) {
        warn!(dir = %dir.display(), "could not update .gitignore: {err}");
    }
    result
}

fn convert_renditions(
    runner: &GitRunner,
    gist: &Gist,
    dir: &Path,
    outpath: &Path,
    dry_run: bool,
) -> ConvertResult<Vec<ConvertedGist>> {
    let git_root = runner.git_root();
    let params = gist.template_params();

    let mut convs = Vec::new();
    for defaults_path in defaults_files(&git_root.join(dir), dir)? {
        let defaults = load_defaults(git_root, &defaults_path, &params)?;
        let to = string_field(&defaults_path, &defaults, "to")?;

        // Rendered defaults land in the output tree next to the artifact
        let defaults_name = defaults_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let rendition = defaults_name
            .strip_suffix(DEFAULTS_SUFFIX)
            .unwrap_or(&defaults_name)
            .to_string();
        let rendered_path = outpath.join(dir).join(format!("{rendition}.defaults.json"));

        info!("writing rendered defaults to {}", rendered_path.display());
        if !dry_run {
            let absolute = git_root.join(&rendered_path);
            if let Some(parent) = absolute.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::write(&absolute, serde_json::to_string_pretty(&defaults)?.as_bytes())?;
        }

        let stem = gist
            .path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let output_path = outpath.join(dir).join(format!("{stem}.{to}"));
        let output_absolute = git_root.join(&output_path);
        if output_absolute.exists() {
            info!("removing stale artifact {}", output_path.display());
            if !dry_run {
                fs::remove_file(&output_absolute)?;
            }
        }

        run_pandoc(git_root, gist, &rendered_path, &output_path, dry_run)?;

        let title = defaults
            .get("metadata")
            .and_then(|m| m.get("title"))
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_else(|| gist.title.clone());
        let deps = resource_paths(&defaults_path, &defaults)?
            .into_iter()
            .map(|entry| dir.join(entry))
            .collect();

        convs.push(ConvertedGist { gist: gist.clone(), path: output_path, title, deps });
    }
    Ok(convs)
}

fn run_pandoc(
    git_root: &Path,
    gist: &Gist,
    defaults_path: &Path,
    output_path: &Path,
    dry_run: bool,
) -> ConvertResult<()> {
    let resource_path = gist_dir(gist);
    let command = format!(
        "pandoc {} -d {} -o {} --resource-path={}",
        gist.path.display(),
        defaults_path.display(),
        output_path.display(),
        resource_path.display(),
    );
    info!("> {command}");
    if dry_run {
        return Ok(());
    }

    if let Some(parent) = git_root.join(output_path).parent() {
        fs::create_dir_all(parent)?;
    }
    let output = Command::new("pandoc")
        .arg(&gist.path)
        .arg("-d")
        .arg(defaults_path)
        .arg("-o")
        .arg(output_path)
        .arg(format!("--resource-path={}", resource_path.display()))
        .current_dir(git_root)
        .output()?;
    if !output.status.success() {
        return Err(ConvertError::Tool {
            command,
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }
    Ok(())
}

/// Repo-relative defaults files next to the gist, in name order so
/// repeated runs emit renditions deterministically.
fn defaults_files(absolute_dir: &Path, dir: &Path) -> ConvertResult<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in fs::read_dir(absolute_dir)? {
        let entry = entry?;
        let name = entry.file_name().to_string_lossy().into_owned();
        if name.ends_with(DEFAULTS_SUFFIX) && entry.file_type()?.is_file() {
            files.push(dir.join(name));
        }
    }
    files.sort();
    Ok(files)
}

fn load_defaults(
    git_root: &Path,
    defaults_path: &Path,
    params: &std::collections::BTreeMap<String, String>,
) -> ConvertResult<serde_json::Map<String, Value>> {
    let raw = fs::read_to_string(git_root.join(defaults_path))?;
    let rendered = render_template(&raw, params).map_err(|err| ConvertError::Template {
        path: defaults_path.to_path_buf(),
        reason: err.to_string(),
    })?;
    match serde_json::from_str::<Value>(&rendered) {
        Ok(Value::Object(defaults)) => Ok(defaults),
        Ok(_) => Err(ConvertError::Defaults {
            path: defaults_path.to_path_buf(),
            reason: "expected a JSON object".into(),
        }),
        Err(err) => Err(ConvertError::Defaults {
            path: defaults_path.to_path_buf(),
            reason: err.to_string(),
        }),
    }
}

fn string_field(
    defaults_path: &Path,
    defaults: &serde_json::Map<String, Value>,
    key: &str,
) -> ConvertResult<String> {
    defaults.get(key).and_then(Value::as_str).map(str::to_string).ok_or_else(|| {
        ConvertError::Defaults {
            path: defaults_path.to_path_buf(),
            reason: format!("required \"{key}\" option missing or not a string"),
        }
    })
}

fn resource_paths(
    defaults_path: &Path,
    defaults: &serde_json::Map<String, Value>,
) -> ConvertResult<Vec<String>> {
    let entries = defaults.get("resource-path").and_then(Value::as_array).ok_or_else(|| {
        ConvertError::Defaults {
            path: defaults_path.to_path_buf(),
            reason: "required \"resource-path\" list missing".into(),
        }
    })?;
    entries
        .iter()
        .map(|entry| {
            entry.as_str().map(str::to_string).ok_or_else(|| ConvertError::Defaults {
                path: defaults_path.to_path_buf(),
                reason: "\"resource-path\" entries must be strings".into(),
            })
        })
        .collect()
}

fn gist_dir(gist: &Gist) -> PathBuf {
    gist.path.parent().map(Path::to_path_buf).unwrap_or_default()
}

fn directory_entries(absolute_dir: &Path) -> ConvertResult<HashSet<PathBuf>> {
    let mut entries = HashSet::new();
    for entry in fs::read_dir(absolute_dir)? {
        entries.insert(entry?.path());
    }
    Ok(entries)
}

/// Git-ignores files a conversion dropped into the gist's own directory,
/// so reruns do not discover or commit generated artifacts.
fn ignore_new_entries(
    runner: &GitRunner,
    dir: &Path,
    pre_existing: &HashSet<PathBuf>,
) -> ConvertResult<()> {
    let absolute_dir = runner.git_root().join(dir);
    for entry in directory_entries(&absolute_dir)? {
        if pre_existing.contains(&entry) {
            continue;
        }
        let name = match entry.file_name() {
            Some(name) => name.to_string_lossy().into_owned(),
            None => continue,
        };
        let pattern = if entry.is_dir() { format!("{name}/") } else { name };

        let candidate = dir.join(&pattern).display().to_string();
        if runner.run(&["check-ignore", "--quiet", &candidate]).is_ok() {
            continue;
        }
        debug!(dir = %dir.display(), "ignoring generated entry {pattern}");
        let mut gitignore = fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(absolute_dir.join(".gitignore"))?;
        use std::io::Write as _;
        writeln!(gitignore, "{pattern}")?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_collapses_dot_segments() {
        assert_eq!(normalize(Path::new("/repo/./out/../artifacts")), PathBuf::from("/repo/artifacts"));
    }

    #[test]
    fn test_ensure_outpath_accepts_subdirectory() {
        let relative = ensure_outpath(Path::new("/repo"), Path::new("build/out")).unwrap();
        assert_eq!(relative, PathBuf::from("build/out"));
    }

    #[test]
    fn test_ensure_outpath_accepts_repository_root() {
        let relative = ensure_outpath(Path::new("/repo"), Path::new(".")).unwrap();
        assert_eq!(relative, PathBuf::new());
    }

    #[test]
    fn test_ensure_outpath_rejects_escaping_path() {
        let err = ensure_outpath(Path::new("/repo"), Path::new("../elsewhere")).unwrap_err();
        assert!(matches!(err, ConvertError::OutsideGitRoot(_)));
    }

    #[test]
    fn test_ensure_outpath_rejects_unrelated_absolute_path() {
        let err = ensure_outpath(Path::new("/repo"), Path::new("/tmp/out")).unwrap_err();
        assert!(matches!(err, ConvertError::OutsideGitRoot(_)));
    }
}
