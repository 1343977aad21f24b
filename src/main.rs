mod cli;

use anyhow::{Context, Result};
use clap::Parser;
use cli::Cli;
use cli::output::OutputConfig;
use mdweave::assemble::md_to_xhtml::PulldownEngine;
use mdweave::assemble::{compile_book, package};
use mdweave::config::BookConfig;
use mdweave::render::CommandRenderer;
use mdweave::source;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

fn init_tracing(verbose: bool) {
    let default = if verbose { "mdweave=debug" } else { "mdweave=warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    let output = OutputConfig::from_cli(&cli);

    let mut config = BookConfig::load(cli.config.as_deref())?;
    if let Some(cover) = cli.pdf_cover.clone() {
        config.pdf_cover = Some(cover);
    }

    // Keeps remote checkouts alive until the outputs are written.
    let sources = source::resolve_sources(&cli.sources)?;
    if sources.checkout_count() > 0 {
        output.detail(&format!("Cloned {} remote source(s)", sources.checkout_count()));
    }
    let files = source::discover_markdown_files(sources.paths())?;
    let files = source::filter_excluded(files, &config.exclude_pages)?;
    let files = source::prioritize_files(files, &config.preface_marker);

    let engine = PulldownEngine;
    let book = compile_book(&files, &engine).context("compiling chapters")?;

    if output.verbose && !output.quiet {
        let rows: Vec<Vec<String>> = book
            .chapters
            .iter()
            .enumerate()
            .map(|(i, chapter)| {
                vec![
                    (i + 1).to_string(),
                    chapter.anchor.clone(),
                    chapter.title.clone(),
                    chapter.source.display().to_string(),
                ]
            })
            .collect();
        output.print_table(&["#", "ANCHOR", "TITLE", "SOURCE"], &rows);
    }

    let mut written: Vec<(&str, PathBuf)> = Vec::new();

    if cli.format.wants_pdf() {
        let path = cli.output.with_extension("pdf");
        let renderer = CommandRenderer::new(config.pdf_engine.clone());
        package::write_pdf(&book, &config, &engine, &renderer, &path)?;
        output.written("PDF", &path);
        written.push(("pdf", path));
    }

    if cli.format.wants_html() {
        let path = cli.output.with_extension("html");
        package::write_html(&book, &config, &engine, &path)?;
        output.written("HTML", &path);
        written.push(("html", path));
    }

    if cli.format.wants_epub() {
        let path = cli.output.with_extension("epub");
        package::write_epub(&book, &config, &path)?;
        output.written("EPUB", &path);
        written.push(("epub", path));
    }

    if output.json {
        let outputs: serde_json::Map<String, serde_json::Value> = written
            .iter()
            .map(|(kind, path)| (kind.to_string(), serde_json::json!(path.display().to_string())))
            .collect();
        output.print_json(&serde_json::json!({
            "title": config.title,
            "chapters": book.chapters.len(),
            "headings": book.headings.len(),
            "resources": book.resources.len(),
            "outputs": outputs,
        }))?;
    }

    Ok(())
}
