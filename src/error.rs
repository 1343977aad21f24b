use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BookError {
    #[error("no Markdown files found in provided sources: {}", display_paths(.0))]
    NoSourceFiles(Vec<PathBuf>),

    #[error("no Markdown files left after excluding {0:?}")]
    AllExcluded(Vec<String>),

    #[error("PDF cover image not found: {}", .0.display())]
    MissingCover(PathBuf),

    #[error("failed to fetch {source_id}: {reason}")]
    SourceFetch { source_id: String, reason: String },

    #[error("invalid configuration in {}: {source}", path.display())]
    Config {
        path: PathBuf,
        #[source]
        source: serde_yaml_ng::Error,
    },

    #[error("malformed markup in {}: {reason}", path.display())]
    Markup { path: PathBuf, reason: String },

    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl BookError {
    pub fn read(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Read {
            path: path.into(),
            source,
        }
    }
}

fn display_paths(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

pub type Result<T> = std::result::Result<T, BookError>;
