use super::md_to_xhtml::{HeadingToken, MarkdownEngine};
use crate::error::{BookError, Result};
use crate::markup::Fragment;
use crate::util::title_case_stem;
use std::path::{Path, PathBuf};

/// Class carried by the element holding a chapter's running title.
pub const TITLE_CLASS: &str = "chapter-title";

/// A level-1 heading after anchor normalization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnchoredHeading {
    pub id: String,
    pub text: String,
}

/// A chapter whose headings carry book-unique ids.
#[derive(Debug, Clone)]
pub struct Chapter {
    pub title: String,
    pub source: PathBuf,
    pub body: Fragment,
    pub anchor: String,
    pub headings: Vec<AnchoredHeading>,
}

impl Chapter {
    /// Whether the body has an element tagged as the running title.
    pub fn has_title_heading(&self) -> bool {
        self.body.contains_class(TITLE_CLASS)
    }

    /// Text to show for the chapter's own TOC entry.
    pub fn heading_text(&self) -> &str {
        self.headings
            .first()
            .map(|h| h.text.as_str())
            .filter(|text| !text.is_empty())
            .unwrap_or(&self.title)
    }

    pub fn source_dir(&self) -> &Path {
        self.source.parent().unwrap_or_else(|| Path::new("."))
    }
}

/// A rendered chapter before anchors are assigned.
#[derive(Debug, Clone)]
pub struct CompiledChapter {
    pub title: String,
    pub source: PathBuf,
    pub body: Fragment,
    pub level_one: Vec<HeadingToken>,
}

/// Read and render one Markdown file.
pub fn compile_chapter(path: &Path, engine: &dyn MarkdownEngine) -> Result<CompiledChapter> {
    let content = std::fs::read_to_string(path).map_err(|e| BookError::read(path, e))?;
    let rendered = engine.render(strip_frontmatter(&content));
    let level_one = rendered.level_one();
    let title = chapter_title(&level_one, path);
    let body = Fragment::parse(&rendered.html).map_err(|e| BookError::Markup {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;

    Ok(CompiledChapter {
        title,
        source: path.to_path_buf(),
        body,
        level_one,
    })
}

/// First level-1 heading, or the title-cased file stem.
pub fn chapter_title(level_one: &[HeadingToken], path: &Path) -> String {
    if let Some(first) = level_one.first() {
        return first.text.clone();
    }
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    title_case_stem(&stem)
}

/// Strip YAML frontmatter (--- ... ---) from markdown content
fn strip_frontmatter(content: &str) -> &str {
    if !content.starts_with("---") {
        return content;
    }
    // Find the closing ---
    if let Some(end) = content[3..].find("\n---") {
        let after = end + 3 + 4; // skip past \n---
        if after <= content.len() {
            return content[after..].trim_start_matches(['\r', '\n']);
        }
    }
    content
}
