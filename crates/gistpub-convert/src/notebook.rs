// SPDX-License-Identifier: AGPL-3.0
// Copyright (C) 2026 GistPub Contributors

//! Static-html rendering of jupyter notebook gists through nbconvert.
//!
//! Notebooks are not pandoc input; they are exported to a standalone html
//! page first and re-emitted as gists pointing at the rendered file, so
//! downstream stages see `<dir>/<name>.ipynb.html` with the notebook's
//! routing tags intact. Non-notebook gists pass the stage untouched.

use crate::error::{ConvertError, ConvertResult};
use gistpub_git::GitRunner;
use gistpub_observability::TrailWriter;
use gistpub_protocol::Gist;
use std::fs;
use std::path::Path;
use std::process::Command;
use tracing::{info, warn};

const NOTEBOOK_EXTENSION: &str = "ipynb";

/// Whether a gist is a jupyter notebook.
pub fn is_notebook(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext == NOTEBOOK_EXTENSION)
}

/// Renders every notebook gist in the batch, catching per-record failures
/// so one broken notebook does not abandon the rest. Non-notebook gists
/// are dropped from the output batch.
pub fn render_all(
    runner: &GitRunner,
    gists: &[Gist],
    outpath: &Path,
    trail: &TrailWriter,
    dry_run: bool,
) -> ConvertResult<Vec<Gist>> {
    let mut rendered = Vec::new();
    let mut failed = Vec::new();
    for gist in gists.iter().filter(|gist| is_notebook(&gist.path)) {
        match render(runner, gist, outpath, dry_run) {
            Ok(page) => {
                if let Err(err) = trail.info(&gist.path, "rendered as static html") {
                    warn!("could not append trail entry: {err}");
                }
                rendered.push(page);
            }
            Err(err) => {
                tracing::error!(trace_id = %gist.trace_id, "notebook rendering failed: {err}");
                if let Err(err) = trail.error(&gist.path, "notebook rendering failed") {
                    warn!("could not append trail entry: {err}");
                }
                failed.push(gist.trace_id.clone());
            }
        }
    }
    if !failed.is_empty() {
        return Err(ConvertError::Failed { trace_ids: failed });
    }
    Ok(rendered)
}

/// Renders one notebook to `<outpath>/<dir>/<name>.ipynb.html` and returns
/// the gist re-pointed at the rendered page.
pub fn render(
    runner: &GitRunner,
    gist: &Gist,
    outpath: &Path,
    dry_run: bool,
) -> ConvertResult<Gist> {
    let git_root = runner.git_root();
    if !git_root.join(&gist.path).is_file() {
        return Err(ConvertError::Io(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("{} does not exist", gist.path.display()),
        )));
    }

    let dir = gist.path.parent().unwrap_or(Path::new("")).to_path_buf();
    let name = gist.path.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_default();
    let output_path = outpath.join(&dir).join(format!("{name}.html"));

    run_nbconvert(git_root, gist, &output_path, dry_run)?;

    Ok(Gist { path: output_path, ..gist.clone() })
}

fn run_nbconvert(
    git_root: &Path,
    gist: &Gist,
    output_path: &Path,
    dry_run: bool,
) -> ConvertResult<()> {
    let output_name =
        output_path.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_default();
    let output_dir = output_path.parent().unwrap_or(Path::new("")).to_path_buf();
    let command = format!(
        "jupyter nbconvert --to html --template classic --output {output_name} --output-dir {} {}",
        output_dir.display(),
        gist.path.display(),
    );
    info!("> {command}");
    if dry_run {
        return Ok(());
    }

    fs::create_dir_all(git_root.join(&output_dir))?;
    let output = Command::new("jupyter")
        .arg("nbconvert")
        .arg("--to")
        .arg("html")
        .arg("--template")
        .arg("classic")
        .arg("--output")
        .arg(&output_name)
        .arg("--output-dir")
        .arg(&output_dir)
        .arg(&gist.path)
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_notebook_detection_is_extension_based() {
        assert!(is_notebook(Path::new("docs/nb/analysis.ipynb")));
        assert!(!is_notebook(Path::new("docs/nb/README.md")));
        assert!(!is_notebook(Path::new("docs/nb/ipynb")));
    }
}
