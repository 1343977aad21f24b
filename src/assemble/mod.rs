pub mod anchor;
pub mod asset_embed;
pub mod chapter;
pub mod document;
pub mod headings;
pub mod md_to_xhtml;
pub mod package;
pub mod style;
pub mod toc;

use crate::error::Result;
use anchor::AnchorRegistry;
use asset_embed::ResourceRegistry;
use chapter::Chapter;
use headings::HeadingRef;
use md_to_xhtml::MarkdownEngine;
use std::path::{Path, PathBuf};
use toc::TocNode;
use tracing::{debug, info, instrument};

/// Everything the output writers need: chapters with book-unique anchors,
/// the heading list, the nested TOC, and the deduplicated resources.
#[derive(Debug)]
pub struct CompiledBook {
    pub chapters: Vec<Chapter>,
    pub headings: Vec<HeadingRef>,
    pub toc: Vec<TocNode>,
    pub resources: ResourceRegistry,
}

impl CompiledBook {
    /// Directory relative paths in the book config resolve against.
    pub fn base_dir(&self) -> &Path {
        self.chapters
            .first()
            .map(|c| c.source_dir())
            .unwrap_or_else(|| Path::new("."))
    }
}

/// Compile chapter files, in order, into a book.
#[instrument(skip_all, fields(files = files.len()))]
pub fn compile_book(files: &[PathBuf], engine: &dyn MarkdownEngine) -> Result<CompiledBook> {
    let mut anchors = AnchorRegistry::new();
    let mut chapters = Vec::with_capacity(files.len());

    for path in files {
        let compiled = chapter::compile_chapter(path, engine)?;
        let chapter = anchor::normalize_chapter(compiled, &mut anchors);
        debug!(
            source = %path.display(),
            anchor = %chapter.anchor,
            title = %chapter.title,
            "compiled chapter"
        );
        chapters.push(chapter);
    }

    let headings = headings::collect_headings(&chapters);
    let toc = toc::build_toc(&headings);

    let mut resources = ResourceRegistry::new();
    for chapter in &mut chapters {
        asset_embed::embed_chapter_resources(chapter, &mut resources)?;
    }

    info!(
        chapters = chapters.len(),
        headings = headings.len(),
        resources = resources.len(),
        "compiled book"
    );

    Ok(CompiledBook {
        chapters,
        headings,
        toc,
        resources,
    })
}
