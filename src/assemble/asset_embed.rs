use super::chapter::Chapter;
use crate::error::{BookError, Result};
use crate::markup::{attribute, tag_name};
use percent_encoding::{AsciiSet, CONTROLS, percent_decode_str, utf8_percent_encode};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Bytes escaped when an embedded name is written as a URL path.
const HREF_ESCAPED: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'\'')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'[')
    .add(b'\\')
    .add(b']')
    .add(b'^')
    .add(b'`')
    .add(b'{')
    .add(b'|')
    .add(b'}');

/// Elements whose `src` can point at a local media file.
const MEDIA_TAGS: &[&str] = &["img", "source", "video", "audio", "embed"];

/// Infer media type from file extension
pub fn infer_media_type(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);
    match ext.as_deref() {
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("png") => "image/png",
        Some("gif") => "image/gif",
        Some("svg") => "image/svg+xml",
        Some("webp") => "image/webp",
        Some("avif") => "image/avif",
        Some("bmp") => "image/bmp",
        Some("tif") | Some("tiff") => "image/tiff",
        Some("ico") => "image/vnd.microsoft.icon",
        Some("css") => "text/css",
        Some("ttf") => "font/ttf",
        Some("otf") => "font/otf",
        Some("woff") => "font/woff",
        Some("woff2") => "font/woff2",
        Some("mp3") => "audio/mpeg",
        Some("mp4") => "video/mp4",
        Some("xhtml") | Some("html") => "application/xhtml+xml",
        _ => "application/octet-stream",
    }
}

/// Media type for an embedded resource; unknown extensions count as JPEG.
pub fn infer_image_type(path: &Path) -> &'static str {
    match infer_media_type(path) {
        "application/octet-stream" => "image/jpeg",
        known => known,
    }
}

/// A local file embedded once and referenced by its embedded name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceHandle {
    pub source: PathBuf,
    pub embedded_name: String,
    pub media_type: String,
    pub bytes: Vec<u8>,
}

impl ResourceHandle {
    /// The embedded name as a relative URL, for `src` attributes and
    /// manifest `href`s. The file itself is stored under `embedded_name`.
    pub fn href(&self) -> String {
        utf8_percent_encode(&self.embedded_name, HREF_ESCAPED).to_string()
    }
}

/// Resources keyed by canonical source path. Registering the same file twice
/// returns the first handle.
#[derive(Debug, Default)]
pub struct ResourceRegistry {
    handles: Vec<ResourceHandle>,
    by_source: HashMap<PathBuf, usize>,
}

impl ResourceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// `resolved` must already be canonical.
    pub fn register(&mut self, resolved: &Path) -> Result<&ResourceHandle> {
        let index = match self.by_source.get(resolved) {
            Some(&index) => index,
            None => {
                let bytes = std::fs::read(resolved).map_err(|e| BookError::read(resolved, e))?;
                let file_name = resolved
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_else(|| "resource".to_string());
                let index = self.handles.len();
                let handle = ResourceHandle {
                    source: resolved.to_path_buf(),
                    embedded_name: format!("images/{}_{file_name}", index + 1),
                    media_type: infer_image_type(resolved).to_string(),
                    bytes,
                };
                debug!(source = %resolved.display(), name = %handle.embedded_name, "embedded resource");
                self.handles.push(handle);
                self.by_source.insert(resolved.to_path_buf(), index);
                index
            }
        };
        Ok(&self.handles[index])
    }

    pub fn handles(&self) -> &[ResourceHandle] {
        &self.handles
    }

    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }
}

/// Remote and inline references are left alone.
pub fn is_external(src: &str) -> bool {
    let lower = src.trim_start().to_ascii_lowercase();
    ["http://", "https://", "//", "data:"]
        .iter()
        .any(|prefix| lower.starts_with(prefix))
}

/// Canonical path of a local reference, or `None` when it is external or
/// does not name an existing file.
pub fn resolve_reference(src: &str, base_dir: &Path) -> Option<PathBuf> {
    if is_external(src) {
        return None;
    }
    let path_part = src.split(['#', '?']).next().unwrap_or_default();
    let relative = percent_decode_str(path_part).decode_utf8().ok()?;
    if relative.is_empty() {
        return None;
    }
    base_dir
        .join(&*relative)
        .canonicalize()
        .ok()
        .filter(|path| path.is_file())
}

/// Register every local media file the chapter references and point its
/// `src` at the embedded name. Returns the number of rewritten references.
pub fn embed_chapter_resources(chapter: &mut Chapter, registry: &mut ResourceRegistry) -> Result<usize> {
    let base_dir = chapter.source_dir().to_path_buf();
    let references: Vec<(usize, String)> = chapter
        .body
        .elements()
        .filter(|(_, start)| MEDIA_TAGS.contains(&tag_name(start).as_str()))
        .filter_map(|(index, start)| attribute(start, "src").map(|src| (index, src)))
        .collect();

    let mut rewritten = 0;
    for (index, src) in references {
        let Some(resolved) = resolve_reference(&src, &base_dir) else {
            debug!(src = %src, chapter = %chapter.source.display(), "media reference left unchanged");
            continue;
        };
        let href = registry.register(&resolved)?.href();
        chapter.body.set_attribute(index, "src", &href);
        rewritten += 1;
    }
    Ok(rewritten)
}
