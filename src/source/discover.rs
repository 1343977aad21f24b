use crate::error::{BookError, Result};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::debug;
use walkdir::WalkDir;

/// Collect Markdown files from files and directories, in input order.
///
/// A file argument is taken when its extension is `.md` or `.markdown`
/// (any case). A directory contributes its `.md` files sorted by path, then
/// its `.markdown` files sorted by path. Hidden directories are not entered.
/// A file reachable more than once is kept at its first position.
pub fn discover_markdown_files(paths: &[PathBuf]) -> Result<Vec<PathBuf>> {
    let mut found = Vec::new();
    for path in paths {
        if path.is_file() {
            if has_markdown_extension(path) {
                found.push(path.clone());
            } else {
                debug!(path = %path.display(), "not a Markdown file, skipped");
            }
        } else if path.is_dir() {
            found.extend(walk_sorted(path, "md"));
            found.extend(walk_sorted(path, "markdown"));
        } else {
            debug!(path = %path.display(), "source does not exist, skipped");
        }
    }

    let mut seen = HashSet::new();
    let files: Vec<PathBuf> = found
        .into_iter()
        .filter(|file| seen.insert(identity(file)))
        .collect();

    if files.is_empty() {
        return Err(BookError::NoSourceFiles(paths.to_vec()));
    }
    Ok(files)
}

/// Drop files whose stem matches an excluded page name (case-insensitive).
pub fn filter_excluded(files: Vec<PathBuf>, exclude: &[String]) -> Result<Vec<PathBuf>> {
    let excluded: HashSet<String> = exclude.iter().map(|page| page.to_lowercase()).collect();
    let kept: Vec<PathBuf> = files
        .into_iter()
        .filter(|file| {
            let skip = excluded.contains(&stem_lowercase(file));
            if skip {
                debug!(path = %file.display(), "excluded page");
            }
            !skip
        })
        .collect();

    if kept.is_empty() {
        return Err(BookError::AllExcluded(exclude.to_vec()));
    }
    Ok(kept)
}

/// Move the first file whose stem equals `marker` (case-insensitive) to the
/// front; everything else keeps its order.
pub fn prioritize_files(mut files: Vec<PathBuf>, marker: &str) -> Vec<PathBuf> {
    let marker = marker.to_lowercase();
    if let Some(pos) = files.iter().position(|f| stem_lowercase(f) == marker) {
        let preface = files.remove(pos);
        files.insert(0, preface);
    }
    files
}

fn has_markdown_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("md") || e.eq_ignore_ascii_case("markdown"))
}

fn walk_sorted(dir: &Path, extension: &str) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = WalkDir::new(dir)
        .into_iter()
        .filter_entry(|entry| entry.depth() == 0 || !is_hidden(entry.file_name()))
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file())
        .filter(|entry| entry.path().extension().is_some_and(|e| e == extension))
        .map(|entry| entry.into_path())
        .collect();
    files.sort();
    files
}

fn is_hidden(name: &std::ffi::OsStr) -> bool {
    name.to_string_lossy().starts_with('.')
}

fn identity(path: &Path) -> PathBuf {
    path.canonicalize().unwrap_or_else(|_| path.to_path_buf())
}

fn stem_lowercase(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().to_lowercase())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn touch(dir: &Path, name: &str) -> PathBuf {
        let path = dir.join(name);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, "# x\n").unwrap();
        path
    }

    fn names(files: &[PathBuf], root: &Path) -> Vec<String> {
        files
            .iter()
            .map(|f| f.strip_prefix(root).unwrap().to_string_lossy().into_owned())
            .collect()
    }

    #[test]
    fn test_directory_md_before_markdown() {
        let tmp = TempDir::new().unwrap();
        touch(tmp.path(), "b.md");
        touch(tmp.path(), "a.markdown");
        touch(tmp.path(), "sub/a.md");
        touch(tmp.path(), "notes.txt");

        let files = discover_markdown_files(&[tmp.path().to_path_buf()]).unwrap();
        assert_eq!(names(&files, tmp.path()), vec!["b.md", "sub/a.md", "a.markdown"]);
    }

    #[test]
    fn test_hidden_directories_skipped() {
        let tmp = TempDir::new().unwrap();
        touch(tmp.path(), "intro.md");
        touch(tmp.path(), ".github/ISSUE.md");
        let files = discover_markdown_files(&[tmp.path().to_path_buf()]).unwrap();
        assert_eq!(names(&files, tmp.path()), vec!["intro.md"]);
    }

    #[test]
    fn test_explicit_files_and_dedup() {
        let tmp = TempDir::new().unwrap();
        let upper = touch(tmp.path(), "ch2.MD");
        let other = touch(tmp.path(), "ch1.md");
        let text = touch(tmp.path(), "x.txt");

        let files = discover_markdown_files(&[
            upper.clone(),
            text,
            tmp.path().to_path_buf(),
            other.clone(),
        ])
        .unwrap();
        assert_eq!(files, vec![upper, other]);
    }

    #[test]
    fn test_no_markdown_is_an_error() {
        let tmp = TempDir::new().unwrap();
        touch(tmp.path(), "a.txt");
        let err = discover_markdown_files(&[tmp.path().to_path_buf()]).unwrap_err();
        assert!(matches!(err, BookError::NoSourceFiles(_)));
    }

    #[test]
    fn test_filter_excluded_case_insensitive() {
        let files = vec![
            PathBuf::from("docs/README.md"),
            PathBuf::from("docs/_Sidebar.md"),
            PathBuf::from("docs/sidebar.md"),
            PathBuf::from("docs/intro.md"),
        ];
        let exclude = vec!["readme".to_string(), "sidebar".to_string()];
        let kept = filter_excluded(files, &exclude).unwrap();
        assert_eq!(
            kept,
            vec![PathBuf::from("docs/_Sidebar.md"), PathBuf::from("docs/intro.md")]
        );
    }

    #[test]
    fn test_filter_excluding_everything_fails() {
        let err = filter_excluded(vec![PathBuf::from("README.md")], &["readme".to_string()])
            .unwrap_err();
        assert!(matches!(err, BookError::AllExcluded(_)));
    }

    #[test]
    fn test_preface_moves_first() {
        let files = vec![
            PathBuf::from("a.md"),
            PathBuf::from("b.md"),
            PathBuf::from("Preface.md"),
            PathBuf::from("c.md"),
        ];
        let ordered = prioritize_files(files, "preface");
        assert_eq!(
            ordered,
            vec![
                PathBuf::from("Preface.md"),
                PathBuf::from("a.md"),
                PathBuf::from("b.md"),
                PathBuf::from("c.md"),
            ]
        );
    }

    #[test]
    fn test_only_first_preface_moves() {
        let files = vec![
            PathBuf::from("x.md"),
            PathBuf::from("one/preface.md"),
            PathBuf::from("two/preface.md"),
        ];
        let ordered = prioritize_files(files, "preface");
        assert_eq!(
            ordered,
            vec![
                PathBuf::from("one/preface.md"),
                PathBuf::from("x.md"),
                PathBuf::from("two/preface.md"),
            ]
        );
    }

    #[test]
    fn test_without_preface_order_is_unchanged() {
        let files = vec![PathBuf::from("b.md"), PathBuf::from("a.md")];
        assert_eq!(prioritize_files(files.clone(), "preface"), files);
    }
}
