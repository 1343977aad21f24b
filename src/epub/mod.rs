pub mod writer;

use crate::assemble::md_to_xhtml::wrap_xhtml;
use std::collections::{BTreeMap, HashMap};
use std::path::Path;

/// An EPUB under construction: metadata, manifest, spine, navigation, and
/// the bytes of every file that goes into the container.
#[derive(Debug, Default)]
pub struct EpubBook {
    pub metadata: EpubMetadata,
    pub manifest: Vec<ManifestItem>,
    pub spine: Vec<SpineItem>,
    pub navigation: Vec<NavPoint>,
    pub nav_title: String,
    pub resources: HashMap<String, Vec<u8>>,
}

/// Dublin Core metadata fields
#[derive(Debug, Default, Clone)]
pub struct EpubMetadata {
    pub identifiers: Vec<String>,
    pub titles: Vec<String>,
    pub languages: Vec<String>,
    pub creators: Vec<String>,
    pub publishers: Vec<String>,
    pub dates: Vec<String>,
    pub description: Option<String>,
    pub subjects: Vec<String>,
    pub rights: Option<String>,
    pub modified: Option<String>,
    pub cover_id: Option<String>,
    pub custom: BTreeMap<String, String>,
}

/// An item in the EPUB manifest
#[derive(Debug, Clone)]
pub struct ManifestItem {
    pub id: String,
    pub href: String,
    pub media_type: String,
    pub properties: Option<String>,
}

/// A spine item reference
#[derive(Debug, Clone)]
pub struct SpineItem {
    pub idref: String,
    pub linear: bool,
}

/// A navigation point in the TOC tree
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavPoint {
    pub label: String,
    pub href: String,
    pub children: Vec<NavPoint>,
}

/// One reading-order document.
#[derive(Debug, Clone)]
pub struct ContentDocument<'a> {
    pub id: String,
    pub file_name: String,
    pub title: &'a str,
    pub body: &'a str,
    pub stylesheet: Option<&'a str>,
}

/// Manifest id of the navigation document, always first in the spine.
pub const NAV_ID: &str = "toc";

impl EpubBook {
    pub fn new(title: &str, language: &str, author: &str) -> Self {
        Self {
            metadata: EpubMetadata {
                titles: vec![title.to_string()],
                languages: vec![language.to_string()],
                creators: vec![author.to_string()],
                ..Default::default()
            },
            spine: vec![SpineItem {
                idref: NAV_ID.to_string(),
                linear: true,
            }],
            nav_title: "Table of Contents".to_string(),
            ..Default::default()
        }
    }

    /// Dublin Core terms go to their own fields, anything else becomes a
    /// custom `<meta>` property.
    pub fn add_metadata(&mut self, key: &str, value: &str) {
        let value = value.to_string();
        let metadata = &mut self.metadata;
        match key.to_ascii_lowercase().as_str() {
            "identifier" => metadata.identifiers.push(value),
            "publisher" => metadata.publishers.push(value),
            "date" => metadata.dates.push(value),
            "subject" => metadata.subjects.push(value),
            "creator" => metadata.creators.push(value),
            "description" => metadata.description = Some(value),
            "rights" => metadata.rights = Some(value),
            _ => {
                metadata.custom.insert(key.to_string(), value);
            }
        }
    }

    pub fn add_stylesheet(&mut self, id: &str, href: &str, css: &str) {
        self.add_item(id, href, "text/css", css.as_bytes().to_vec(), None);
    }

    /// Returns the manifest id given to the image.
    pub fn add_image(&mut self, href: &str, media_type: &str, bytes: Vec<u8>) -> String {
        let id = format!("img-{}", slug::slugify(href));
        self.add_item(&id, href, media_type, bytes, None);
        id
    }

    /// Cover image, recorded in the metadata and flagged in the manifest.
    pub fn set_cover(&mut self, path: &Path, bytes: Vec<u8>) {
        let ext = path
            .extension()
            .map(|e| e.to_string_lossy().to_ascii_lowercase())
            .unwrap_or_else(|| "jpg".to_string());
        let href = format!("images/cover.{ext}");
        let media_type = crate::assemble::asset_embed::infer_image_type(path);
        self.add_item("cover-image", &href, media_type, bytes, Some("cover-image"));
        self.metadata.cover_id = Some("cover-image".to_string());
    }

    /// Wrap the body as XHTML, add it to the manifest, and append it to the
    /// reading order.
    pub fn add_content(&mut self, document: ContentDocument<'_>) {
        let language = self
            .metadata
            .languages
            .first()
            .map_or("en", |s| s.as_str())
            .to_string();
        let xhtml = wrap_xhtml(document.body, document.title, &language, document.stylesheet);
        self.add_item(
            &document.id,
            &document.file_name,
            "application/xhtml+xml",
            xhtml.into_bytes(),
            None,
        );
        self.spine.push(SpineItem {
            idref: document.id,
            linear: true,
        });
    }

    pub fn set_navigation(&mut self, toc: Vec<NavPoint>) {
        self.navigation = toc;
    }

    /// Write the container to `path`.
    pub fn finalize(&self, path: &Path) -> anyhow::Result<()> {
        writer::write_epub(self, path)
    }

    fn add_item(
        &mut self,
        id: &str,
        href: &str,
        media_type: &str,
        bytes: Vec<u8>,
        properties: Option<&str>,
    ) {
        self.resources.insert(href.to_string(), bytes);
        self.manifest.push(ManifestItem {
            id: id.to_string(),
            href: href.to_string(),
            media_type: media_type.to_string(),
            properties: properties.map(str::to_string),
        });
    }
}
