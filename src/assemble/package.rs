use super::CompiledBook;
use super::chapter::Chapter;
use super::document::{PageCover, assemble_document, resolve_cover};
use super::headings::collect_chapter_headings;
use super::md_to_xhtml::MarkdownEngine;
use super::style::build_css;
use super::toc::{TocNode, build_toc};
use crate::config::BookConfig;
use crate::epub::{ContentDocument, EpubBook, NavPoint};
use crate::render::PageRenderer;
use anyhow::Context;
use std::path::Path;
use tracing::{debug, info};

const STYLESHEET_HREF: &str = "style/nav.css";

/// Write the book as one HTML page with the stylesheet inlined. Embedded
/// resources are copied next to it.
pub fn write_html(
    book: &CompiledBook,
    config: &BookConfig,
    engine: &dyn MarkdownEngine,
    output: &Path,
) -> anyhow::Result<()> {
    let cover = resolve_cover(config, book.base_dir())?;
    let document = assemble_document(book, config, cover.as_ref(), engine);
    let page = inline_stylesheet(&document, &build_css(config));

    let out_dir = output
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    std::fs::create_dir_all(out_dir)
        .with_context(|| format!("creating {}", out_dir.display()))?;
    stage_resources(book, cover.as_ref(), out_dir)?;
    std::fs::write(output, page).with_context(|| format!("writing {}", output.display()))?;

    info!(path = %output.display(), "wrote HTML");
    Ok(())
}

/// Render the book through `renderer` from a private staging directory.
pub fn write_pdf(
    book: &CompiledBook,
    config: &BookConfig,
    engine: &dyn MarkdownEngine,
    renderer: &dyn PageRenderer,
    output: &Path,
) -> anyhow::Result<()> {
    let cover = resolve_cover(config, book.base_dir())?;
    let document = assemble_document(book, config, cover.as_ref(), engine);
    let css = build_css(config);

    let staging = tempfile::TempDir::new().context("creating PDF staging directory")?;
    stage_resources(book, cover.as_ref(), staging.path())?;
    let output = std::path::absolute(output)
        .with_context(|| format!("resolving {}", output.display()))?;
    renderer
        .render(&document, &css, staging.path(), &output)
        .with_context(|| format!("rendering {}", output.display()))?;

    info!(path = %output.display(), "wrote PDF");
    Ok(())
}

/// Package the book as EPUB 3: one document per chapter, shared
/// stylesheet, deduplicated images, and a navigation document.
pub fn write_epub(book: &CompiledBook, config: &BookConfig, output: &Path) -> anyhow::Result<()> {
    let mut epub = EpubBook::new(&config.title, &config.language, &config.author);
    epub.nav_title = config.toc_title.clone();
    for (key, value) in &config.metadata {
        epub.add_metadata(key, value);
    }

    if let Some(cover) = &config.epub_cover {
        let path = if cover.is_absolute() {
            cover.clone()
        } else {
            book.base_dir().join(cover)
        };
        match std::fs::read(&path) {
            Ok(bytes) => epub.set_cover(&path, bytes),
            Err(e) => debug!(path = %path.display(), error = %e, "EPUB cover not readable, skipped"),
        }
    }

    epub.add_stylesheet("style_nav", STYLESHEET_HREF, &build_css(config));
    for handle in book.resources.handles() {
        epub.add_image(&handle.href(), &handle.media_type, handle.bytes.clone());
    }

    let mut navigation = Vec::new();
    for (idx, chapter) in book.chapters.iter().enumerate() {
        let file_name = format!("chap_{}.xhtml", idx + 1);
        let body = chapter.body.to_xhtml();
        epub.add_content(ContentDocument {
            id: format!("chap_{}", idx + 1),
            file_name: file_name.clone(),
            title: &chapter.title,
            body: &body,
            stylesheet: Some(STYLESHEET_HREF),
        });
        navigation.extend(chapter_navigation(chapter, &file_name, config.toc));
    }
    epub.set_navigation(navigation);

    if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("creating {}", parent.display()))?;
    }
    epub.finalize(output)
        .with_context(|| format!("writing {}", output.display()))?;

    info!(path = %output.display(), "wrote EPUB");
    Ok(())
}

/// Navigation entries for one chapter. With the table of contents enabled
/// the chapter's own heading tree is used; otherwise a single entry.
fn chapter_navigation(chapter: &Chapter, file_name: &str, nested: bool) -> Vec<NavPoint> {
    if !nested {
        return vec![NavPoint {
            label: chapter.title.clone(),
            href: file_name.to_string(),
            children: Vec::new(),
        }];
    }
    build_toc(&collect_chapter_headings(chapter))
        .iter()
        .map(|node| nav_point(node, &chapter.anchor, file_name))
        .collect()
}

fn nav_point(node: &TocNode, anchor: &str, file_name: &str) -> NavPoint {
    let href = if node.id == anchor {
        file_name.to_string()
    } else {
        format!("{file_name}#{}", node.id)
    };
    NavPoint {
        label: node.text.clone(),
        href,
        children: node
            .children
            .iter()
            .map(|child| nav_point(child, anchor, file_name))
            .collect(),
    }
}

/// Copy each embedded resource, and the cover, under `dir`.
fn stage_resources(book: &CompiledBook, cover: Option<&PageCover>, dir: &Path) -> anyhow::Result<()> {
    for handle in book.resources.handles() {
        let target = dir.join(&handle.embedded_name);
        write_creating_parent(&target, &handle.bytes)?;
    }
    if let Some(cover) = cover {
        let bytes = std::fs::read(&cover.source)
            .with_context(|| format!("reading {}", cover.source.display()))?;
        write_creating_parent(&dir.join(&cover.embedded_name), &bytes)?;
    }
    Ok(())
}

fn write_creating_parent(target: &Path, bytes: &[u8]) -> anyhow::Result<()> {
    if let Some(parent) = target.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("creating {}", parent.display()))?;
    }
    std::fs::write(target, bytes).with_context(|| format!("writing {}", target.display()))
}

fn inline_stylesheet(document: &str, css: &str) -> String {
    let style = format!("<style>{css}</style>");
    match document.find("</head>") {
        Some(at) => format!("{}{style}{}", &document[..at], &document[at..]),
        None => format!("{style}{document}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assemble::compile_book;
    use crate::assemble::md_to_xhtml::PulldownEngine;
    use std::cell::RefCell;
    use std::io::Read;
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn sample_book(dir: &Path) -> CompiledBook {
        std::fs::create_dir_all(dir.join("img")).unwrap();
        std::fs::write(dir.join("img/fig.png"), b"fig").unwrap();
        std::fs::write(dir.join("a.md"), "# Alpha\n\n## Detail\n\n![f](img/fig.png)\n").unwrap();
        std::fs::write(dir.join("b.md"), "Plain.\n\n![f](img/fig.png)\n").unwrap();
        compile_book(&[dir.join("a.md"), dir.join("b.md")], &PulldownEngine).unwrap()
    }

    #[derive(Default)]
    struct RecordingRenderer {
        seen: RefCell<Vec<PathBuf>>,
    }

    impl PageRenderer for RecordingRenderer {
        fn render(&self, markup: &str, stylesheet: &str, base: &Path, output: &Path) -> anyhow::Result<()> {
            assert!(markup.contains("src=\"images/1_fig.png\""));
            assert!(stylesheet.contains("@page"));
            assert!(base.join("images/1_fig.png").is_file());
            self.seen.borrow_mut().push(output.to_path_buf());
            Ok(())
        }
    }

    #[test]
    fn html_output_copies_resources() {
        let src = TempDir::new().unwrap();
        let out = TempDir::new().unwrap();
        let book = sample_book(src.path());
        let path = out.path().join("book.html");

        write_html(&book, &BookConfig::default(), &PulldownEngine, &path).unwrap();

        let page = std::fs::read_to_string(&path).unwrap();
        assert!(page.contains("<style>"));
        assert!(page.find("<style>").unwrap() < page.find("</head>").unwrap());
        assert_eq!(page.matches("src=\"images/1_fig.png\"").count(), 2);
        assert_eq!(std::fs::read(out.path().join("images/1_fig.png")).unwrap(), b"fig");
    }

    #[test]
    fn html_output_fails_on_missing_cover() {
        let src = TempDir::new().unwrap();
        let out = TempDir::new().unwrap();
        let book = sample_book(src.path());
        let config = BookConfig {
            pdf_cover: Some(PathBuf::from("missing.png")),
            ..BookConfig::default()
        };
        let err = write_html(&book, &config, &PulldownEngine, &out.path().join("b.html")).unwrap_err();
        assert!(format!("{err:#}").contains("missing.png"), "{err:#}");
        assert!(!out.path().join("b.html").exists());
    }

    #[test]
    fn pdf_output_stages_resources_for_renderer() {
        let src = TempDir::new().unwrap();
        let out = TempDir::new().unwrap();
        let book = sample_book(src.path());
        let renderer = RecordingRenderer::default();
        let path = out.path().join("book.pdf");

        write_pdf(&book, &BookConfig::default(), &PulldownEngine, &renderer, &path).unwrap();
        assert_eq!(renderer.seen.borrow().as_slice(), &[path]);
    }

    #[test]
    fn epub_output_has_one_image_and_chapter_navigation() {
        let src = TempDir::new().unwrap();
        let out = TempDir::new().unwrap();
        let book = sample_book(src.path());
        let path = out.path().join("book.epub");

        write_epub(&book, &BookConfig::default(), &path).unwrap();

        let mut archive = zip::ZipArchive::new(std::fs::File::open(&path).unwrap()).unwrap();
        let images = archive
            .file_names()
            .filter(|name| name.starts_with("OEBPS/images/"))
            .count();
        assert_eq!(images, 1);

        let mut nav = String::new();
        archive
            .by_name("OEBPS/toc.xhtml")
            .unwrap()
            .read_to_string(&mut nav)
            .unwrap();
        assert!(nav.contains("<a href=\"chap_1.xhtml\">Alpha</a>"), "{nav}");
        assert!(nav.contains("<a href=\"chap_1.xhtml#detail\">Detail</a>"), "{nav}");
        assert!(nav.contains("<a href=\"chap_2.xhtml\">B</a>"), "{nav}");
    }

    #[test]
    fn epub_chapters_are_well_formed_xml() {
        let src = TempDir::new().unwrap();
        let out = TempDir::new().unwrap();
        std::fs::write(
            src.path().join("a.md"),
            "# Breaks\n\nline one<br>line two\n\n| a | b |\n|---|---|\n| x<br>y | z&nbsp;w |\n",
        )
        .unwrap();
        let book = compile_book(&[src.path().join("a.md")], &PulldownEngine).unwrap();
        let path = out.path().join("book.epub");

        write_epub(&book, &BookConfig::default(), &path).unwrap();

        let mut archive = zip::ZipArchive::new(std::fs::File::open(&path).unwrap()).unwrap();
        let mut chapter = String::new();
        archive
            .by_name("OEBPS/chap_1.xhtml")
            .unwrap()
            .read_to_string(&mut chapter)
            .unwrap();
        assert!(chapter.contains("line one<br/>line two"), "{chapter}");

        let mut reader = quick_xml::Reader::from_str(&chapter);
        loop {
            match reader.read_event() {
                Ok(quick_xml::events::Event::Eof) => break,
                Ok(_) => {}
                Err(e) => panic!("chap_1.xhtml is not well-formed: {e}\n{chapter}"),
            }
        }
    }

    #[test]
    fn flat_navigation_without_toc() {
        let src = TempDir::new().unwrap();
        let book = sample_book(src.path());
        let nav = chapter_navigation(&book.chapters[0], "chap_1.xhtml", false);
        assert_eq!(
            nav,
            vec![NavPoint {
                label: "Alpha".to_string(),
                href: "chap_1.xhtml".to_string(),
                children: Vec::new(),
            }]
        );
    }

    #[test]
    fn stylesheet_is_inlined_before_head_end() {
        assert_eq!(
            inline_stylesheet("<html><head></head><body/></html>", "p{}"),
            "<html><head><style>p{}</style></head><body/></html>"
        );
    }
}
