// SPDX-License-Identifier: AGPL-3.0
// Copyright (C) 2026 GistPub Contributors

//! Branch mirroring between two git remotes through ephemeral remote
//! registrations.
//!
//! Registering a remote mutates the caller's repository configuration, so
//! both remotes are removed on every exit path of [`mirror`]; a failure in
//! the mirror body is re-raised after cleanup.

use crate::error::{GitError, GitResult};
use crate::shell::GitRunner;
use rand::Rng;
use regex::Regex;
use tracing::{info, warn};
use url::Url;

/// An ephemeral git remote derived from a URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GitRemote {
    /// Remote URL, with credentials embedded when both were supplied
    pub url: String,
    /// Collision-resistant, ref-safe remote name
    pub name: String,
}

/// Builds an ephemeral remote from a URL and optional credentials.
///
/// The remote name combines the URL's host and path (with characters
/// disallowed in ref names substituted by `.`) with a random-token plus
/// UTC-timestamp suffix, so two concurrent mirror invocations against the
/// same URL cannot collide. Credentials are embedded into the URL only when
/// both username and password are given.
pub fn as_remote(
    url: &str,
    username: Option<&str>,
    password: Option<&str>,
) -> GitResult<GitRemote> {
    let parsed = Url::parse(url).map_err(|err| GitError::InvalidRemoteUrl(err.to_string()))?;

    // file:// remotes have no host; the path alone names them
    let host = parsed.host_str().unwrap_or("");

    // Characters disallowed in ref names, per git-check-ref-format
    let disallowed = Regex::new(r"(\.\.|@\{|//|[~^:?*\[\]\\@/\s])")
        .map_err(|err| GitError::InvalidRemoteUrl(err.to_string()))?;
    let location = format!("{host}{}", parsed.path());
    let substituted = disallowed.replace_all(&location, ".");
    // Substitution next to a literal dot manufactures new `..` runs
    let dot_runs =
        Regex::new(r"\.{2,}").map_err(|err| GitError::InvalidRemoteUrl(err.to_string()))?;
    let stem = dot_runs.replace_all(&substituted, ".");
    if stem.trim_matches('.').is_empty() {
        return Err(GitError::InvalidRemoteUrl(format!("{url} has no host or path")));
    }

    let mut rng = rand::thread_rng();
    let token: String = (0..5).map(|_| rng.gen_range(b'a'..=b'z') as char).collect();
    let timestamp = chrono::Utc::now().format("%Y%m%dt%H%M%S");
    let name = format!("{}-{token}-{timestamp}", stem.trim_matches('.'));

    let remote_url = match (username, password) {
        (Some(user), Some(pass)) if !host.is_empty() => {
            let port = parsed.port().map(|p| format!(":{p}")).unwrap_or_default();
            format!("{}://{user}:{pass}@{host}{port}{}", parsed.scheme(), parsed.path())
        }
        _ => url.to_string(),
    };

    Ok(GitRemote { url: remote_url, name })
}

/// Force-mirrors branches matching `branch_regex` from `src` to `trg`.
///
/// Both remotes are registered under their derived names (removing any
/// stale remote of the same name first), the source's heads are listed and
/// filtered, both remotes are fetched with prune, and each matching branch
/// is force-pushed as `refs/remotes/<src>/<branch>:refs/heads/<branch>`.
/// No matching branch is not an error. With `dry_run` the pushes are
/// reported but not executed.
pub fn mirror(
    runner: &GitRunner,
    src: &GitRemote,
    trg: &GitRemote,
    branch_regex: &str,
    dry_run: bool,
) -> GitResult<()> {
    let result = (|| {
        reset_remote(runner, src)?;
        reset_remote(runner, trg)?;
        mirror_branches(runner, src, trg, branch_regex, dry_run)
    })();

    // Teardown must run on every exit path; a cleanup failure never masks
    // the body's error
    for remote in [src, trg] {
        if let Err(err) = remove_remote(runner, remote) {
            warn!("failed to remove ephemeral remote {}: {err}", remote.name);
        }
    }

    result
}

fn mirror_branches(
    runner: &GitRunner,
    src: &GitRemote,
    trg: &GitRemote,
    branch_regex: &str,
    dry_run: bool,
) -> GitResult<()> {
    let heads = runner.run(&["ls-remote", "--heads", &src.name])?;

    let pattern = Regex::new(&format!(r"(?m)refs/heads/({branch_regex})$"))
        .map_err(|err| GitError::InvalidRemoteUrl(format!("bad branch regex: {err}")))?;
    let branches: Vec<String> =
        pattern.captures_iter(&heads).map(|cap| cap[1].to_string()).collect();

    if branches.is_empty() {
        info!("no branches matching \"{branch_regex}\" exist, skipping");
        return Ok(());
    }

    runner.run(&["fetch", "-p", &src.name])?;
    runner.run(&["fetch", "-p", &trg.name])?;

    for branch in &branches {
        let refspec = format!("refs/remotes/{}/{branch}:refs/heads/{branch}", src.name);
        if dry_run {
            info!("(dry-run) git push -q --force {} {refspec}", trg.name);
            continue;
        }
        runner.run(&["push", "-q", "--force", &trg.name, &refspec])?;
        info!("mirrored branch {branch} to {}", trg.name);
    }
    Ok(())
}

fn exists_remote(runner: &GitRunner, remote: &GitRemote) -> GitResult<bool> {
    let remotes = runner.run(&["remote"])?;
    Ok(remotes.lines().any(|line| line.trim() == remote.name))
}

fn reset_remote(runner: &GitRunner, remote: &GitRemote) -> GitResult<()> {
    remove_remote(runner, remote)?;
    // The URL may embed credentials; never log this argv
    runner.run_quiet(&["remote", "add", &remote.name, &remote.url])?;
    Ok(())
}

fn remove_remote(runner: &GitRunner, remote: &GitRemote) -> GitResult<()> {
    if exists_remote(runner, remote)? {
        runner.run(&["remote", "remove", &remote.name])?;
    }
    Ok(())
}
