use crate::error::{BookError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

const SERIF_STACK: &str = concat!(
    "\"Source Han Serif SC\", \"Noto Serif CJK SC\", \"STSong\", \"SimSun\", ",
    "\"Times New Roman\", \"Georgia\", \"Palatino Linotype\", \"STIX Two Text\", serif"
);

const SANS_STACK: &str = concat!(
    "\"Source Han Sans SC\", \"Noto Sans CJK SC\", \"PingFang SC\", \"Hiragino Sans GB\", ",
    "\"Microsoft YaHei\", \"Heiti SC\", \"Segoe UI\", \"Helvetica Neue\", \"Roboto\", \"Arial\", sans-serif"
);

const KAI_STACK: &str = "\"Kaiti SC\", \"STKaiti\", \"KaiTi\", \"KaiTi_GB2312\", \"DFKai-SB\", serif";

const CODE_STACK: &str =
    "\"Kaiti SC\", \"STKaiti\", \"KaiTi\", \"KaiTi_GB2312\", \"DFKai-SB\", \"Courier New\", monospace";

/// Book settings loaded from a YAML file. Every key is optional; missing keys
/// keep their defaults and unknown keys are rejected.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BookConfig {
    pub title: String,
    pub author: String,
    pub language: String,

    pub font_family: String,
    pub heading_font_family: String,
    pub chapter_title_font_family: String,
    pub table_font_family: String,
    pub code_font_family: String,
    pub base_font_size: String,
    pub line_height: f32,

    pub heading_color: String,
    pub heading_color_h1: String,
    pub heading_color_h2: String,
    pub heading_color_h3: String,
    pub text_color: String,
    pub background_color: String,
    pub link_color: String,
    pub code_background_color: String,
    pub code_border_color: String,
    pub table_cell_padding: String,

    pub page_size: String,
    pub margin_top: String,
    pub margin_bottom: String,
    pub margin_left: String,
    pub margin_right: String,
    pub chapter_page_break: bool,

    pub toc: bool,
    pub toc_title: String,
    pub extra_css: String,

    pub epub_cover: Option<PathBuf>,
    pub pdf_cover: Option<PathBuf>,
    pub metadata: BTreeMap<String, String>,

    pub header_enabled: bool,
    /// Fixed running-header text, shown when the chapter header is off.
    pub header_title: Option<String>,
    /// Show the current chapter title in the running header.
    pub header_chapter: bool,
    pub header_font_size: String,
    pub header_border_color: String,
    /// Base URL for the link in each chapter's running header. When unset the
    /// link points at the chapter anchor inside the document.
    pub url_prefix: Option<String>,

    pub footer_enabled: bool,
    pub footer_font_size: String,
    pub footer_border_color: String,
    pub footer_html: String,

    /// File stems (case-insensitive) that never become chapters.
    pub exclude_pages: Vec<String>,
    /// File stem (case-insensitive) promoted to the first chapter.
    pub preface_marker: String,
    /// Program used to turn the assembled HTML into a PDF.
    pub pdf_engine: String,
}

impl Default for BookConfig {
    fn default() -> Self {
        Self {
            title: "Generated Book".to_string(),
            author: "mdweave".to_string(),
            language: "en".to_string(),
            font_family: SERIF_STACK.to_string(),
            heading_font_family: SANS_STACK.to_string(),
            chapter_title_font_family: SANS_STACK.to_string(),
            table_font_family: KAI_STACK.to_string(),
            code_font_family: CODE_STACK.to_string(),
            base_font_size: "12pt".to_string(),
            line_height: 1.6,
            heading_color: "#77AAC2".to_string(),
            heading_color_h1: "#77AAC2".to_string(),
            heading_color_h2: "#77AAC2".to_string(),
            heading_color_h3: "#77AAC2".to_string(),
            text_color: "#111111".to_string(),
            background_color: "#ffffff".to_string(),
            link_color: "#1a73e8".to_string(),
            code_background_color: "#f5f5f5".to_string(),
            code_border_color: "#e0e0e0".to_string(),
            table_cell_padding: "6px 12px".to_string(),
            page_size: "A4".to_string(),
            margin_top: "30mm".to_string(),
            margin_bottom: "30mm".to_string(),
            margin_left: "25mm".to_string(),
            margin_right: "25mm".to_string(),
            chapter_page_break: true,
            toc: true,
            toc_title: "Table of Contents".to_string(),
            extra_css: String::new(),
            epub_cover: None,
            pdf_cover: None,
            metadata: BTreeMap::new(),
            header_enabled: true,
            header_title: None,
            header_chapter: true,
            header_font_size: "10pt".to_string(),
            header_border_color: "#cccccc".to_string(),
            url_prefix: None,
            footer_enabled: false,
            footer_font_size: "10pt".to_string(),
            footer_border_color: "#cccccc".to_string(),
            footer_html: String::new(),
            exclude_pages: vec!["readme".to_string(), "sidebar".to_string()],
            preface_marker: "preface".to_string(),
            pdf_engine: "weasyprint".to_string(),
        }
    }
}

impl BookConfig {
    /// Load settings from `path`, or return the defaults when no path is given.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let content = std::fs::read_to_string(path).map_err(|e| BookError::read(path, e))?;
        Self::from_yaml_str(&content).map_err(|source| BookError::Config {
            path: path.to_path_buf(),
            source,
        })
    }

    /// An empty document yields the defaults.
    pub fn from_yaml_str(yaml: &str) -> std::result::Result<Self, serde_yaml_ng::Error> {
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml_ng::from_str(yaml)
    }
}
