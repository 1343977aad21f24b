use crate::error::{BookError, Result};
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;
use tracing::info;

/// Local source paths plus the temporary checkouts that back the remote
/// ones. Checkouts are removed when this value is dropped.
#[derive(Debug, Default)]
pub struct ResolvedSources {
    paths: Vec<PathBuf>,
    checkouts: Vec<TempDir>,
}

impl ResolvedSources {
    pub fn paths(&self) -> &[PathBuf] {
        &self.paths
    }

    pub fn checkout_count(&self) -> usize {
        self.checkouts.len()
    }
}

pub fn is_remote(source: &str) -> bool {
    source.starts_with("http://") || source.starts_with("https://") || source.starts_with("git@")
}

/// Resolve each source argument to a local path, shallow-cloning remote
/// repositories into their own temporary directories.
pub fn resolve_sources(sources: &[String]) -> Result<ResolvedSources> {
    let mut resolved = ResolvedSources::default();
    for source in sources {
        if is_remote(source) {
            let (checkout, repo) = clone_repository(source)?;
            resolved.paths.push(repo);
            resolved.checkouts.push(checkout);
        } else {
            let path = std::path::absolute(Path::new(source)).map_err(|e| BookError::read(source, e))?;
            resolved.paths.push(path);
        }
    }
    Ok(resolved)
}

fn clone_repository(url: &str) -> Result<(TempDir, PathBuf)> {
    let checkout = TempDir::new()?;
    let repo = checkout.path().join("repo");
    info!(url, "cloning repository");

    let output = Command::new("git")
        .args(["clone", "--depth", "1", url])
        .arg(&repo)
        .output()
        .map_err(|e| BookError::SourceFetch {
            source_id: url.to_string(),
            reason: format!("could not run git: {e}"),
        })?;

    if !output.status.success() {
        return Err(BookError::SourceFetch {
            source_id: url.to_string(),
            reason: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }
    Ok((checkout, repo))
}
