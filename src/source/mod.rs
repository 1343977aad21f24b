//! Where chapters come from: local paths and remote repositories.

pub mod discover;
pub mod remote;

pub use discover::{discover_markdown_files, filter_excluded, prioritize_files};
pub use remote::{ResolvedSources, is_remote, resolve_sources};
