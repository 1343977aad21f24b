//! The single-page book used for HTML and PDF output.

use super::CompiledBook;
use super::chapter::{Chapter, TITLE_CLASS};
use super::md_to_xhtml::MarkdownEngine;
use super::toc::render_toc;
use crate::config::BookConfig;
use crate::error::{BookError, Result};
use crate::util::xml_escape;
use std::path::{Path, PathBuf};

/// Ordered body parts with a reserved position for the table of contents.
#[derive(Debug, Default)]
pub struct Document {
    parts: Vec<String>,
    toc_slot: Option<usize>,
}

impl Document {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, part: String) {
        self.parts.push(part);
    }

    /// Reserve the current position; later parts go after it.
    pub fn mark_toc_slot(&mut self) {
        self.toc_slot = Some(self.parts.len());
    }

    /// Insert `toc` at the reserved position. No-op without a reservation.
    pub fn splice_toc(&mut self, toc: String) {
        if let Some(slot) = self.toc_slot.take() {
            self.parts.insert(slot, toc);
        }
    }

    pub fn into_html(self) -> String {
        format!(
            "<html><head><meta charset=\"utf-8\"/></head><body>{}</body></html>",
            self.parts.concat()
        )
    }
}

/// Cover image for the page outputs, copied next to the document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageCover {
    pub source: PathBuf,
    pub embedded_name: String,
}

/// Resolve the configured cover relative to `base_dir`. A configured cover
/// that does not exist is an error.
pub fn resolve_cover(config: &BookConfig, base_dir: &Path) -> Result<Option<PageCover>> {
    let Some(cover) = &config.pdf_cover else {
        return Ok(None);
    };
    let path = if cover.is_absolute() {
        cover.clone()
    } else {
        base_dir.join(cover)
    };
    let source = path
        .canonicalize()
        .ok()
        .filter(|p| p.is_file())
        .ok_or_else(|| BookError::MissingCover(path.clone()))?;
    let ext = source
        .extension()
        .map(|e| e.to_string_lossy().to_ascii_lowercase())
        .unwrap_or_else(|| "jpg".to_string());
    Ok(Some(PageCover {
        source,
        embedded_name: format!("images/cover.{ext}"),
    }))
}

/// Link target of a chapter's running-header marker.
pub fn chapter_url(url_prefix: Option<&str>, anchor: &str) -> String {
    match url_prefix.map(|p| p.trim_end_matches('/')) {
        Some(prefix) if !prefix.is_empty() => format!("{prefix}/{anchor}"),
        _ => format!("#{anchor}"),
    }
}

/// Assemble the whole book into one HTML document: cover, title block,
/// optional footer, table of contents, then one section per chapter.
pub fn assemble_document(
    book: &CompiledBook,
    config: &BookConfig,
    cover: Option<&PageCover>,
    engine: &dyn MarkdownEngine,
) -> String {
    let mut document = Document::new();

    if let Some(cover) = cover {
        document.push(format!(
            "<div class=\"pdf-cover no-page-number\"><img src=\"{}\" alt=\"Book cover\"/></div>",
            xml_escape(&cover.embedded_name)
        ));
    }

    let author_html = engine.render(&config.author).html;
    document.push(format!(
        "<div class=\"book-meta no-page-number\"><h1 class=\"book-title\">{}</h1><div class=\"book-author\">{}</div></div>",
        xml_escape(&config.title),
        author_html.trim()
    ));

    if config.footer_enabled {
        document.push(format!(
            "<div class=\"page-footer\">{}</div>",
            config.footer_html
        ));
    }

    document.mark_toc_slot();

    for chapter in &book.chapters {
        document.push(chapter_section(chapter, config.url_prefix.as_deref()));
    }

    if config.toc {
        document.splice_toc(render_toc(&book.toc, &config.toc_title));
    }

    document.into_html()
}

fn chapter_section(chapter: &Chapter, url_prefix: Option<&str>) -> String {
    let anchor = xml_escape(&chapter.anchor);
    let title = xml_escape(&chapter.title);
    let url = xml_escape(&chapter_url(url_prefix, &chapter.anchor));

    let mut body = String::new();
    if !chapter.has_title_heading() {
        body.push_str(&format!(
            "<h1 id=\"{anchor}\" class=\"{TITLE_CLASS}\">{title}</h1>"
        ));
    }
    body.push_str(&chapter.body.to_html());

    format!(
        "<section id=\"{anchor}\" class=\"chapter\"><div class=\"chapter-header-title\"><a href=\"{url}\">{title}</a></div>{body}</section>"
    )
}
