pub mod output;

use clap::{Parser, ValueEnum};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "mdweave",
    version,
    about = "Weave Markdown files, directories, or git repositories into a PDF, HTML, or EPUB book"
)]
pub struct Cli {
    /// Markdown files, directories, or git repository URLs
    #[arg(required = true)]
    pub sources: Vec<String>,

    /// YAML file with book settings
    #[arg(long, short)]
    pub config: Option<PathBuf>,

    /// Output path; the extension is replaced per format
    #[arg(long, short, default_value = "book")]
    pub output: PathBuf,

    /// Output format
    #[arg(long, short, value_enum, default_value_t = Format::Pdf)]
    pub format: Format,

    /// Cover image for the PDF and HTML outputs (overrides the config)
    #[arg(long)]
    pub pdf_cover: Option<PathBuf>,

    /// Output a JSON summary
    #[arg(long)]
    pub json: bool,

    /// Verbose output
    #[arg(long, short)]
    pub verbose: bool,

    /// Suppress non-essential output
    #[arg(long, short)]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, env = "NO_COLOR")]
    pub no_color: bool,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum Format {
    Pdf,
    Epub,
    Html,
    /// PDF and EPUB
    Both,
    /// PDF, HTML and EPUB
    All,
}

impl Format {
    pub fn wants_pdf(self) -> bool {
        matches!(self, Format::Pdf | Format::Both | Format::All)
    }

    pub fn wants_html(self) -> bool {
        matches!(self, Format::Html | Format::All)
    }

    pub fn wants_epub(self) -> bool {
        matches!(self, Format::Epub | Format::Both | Format::All)
    }
}
