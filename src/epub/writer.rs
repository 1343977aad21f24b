use crate::epub::{EpubBook, NAV_ID, NavPoint};
use crate::util::{format_iso8601, xml_escape};
use anyhow::Context;
use percent_encoding::percent_decode_str;
use std::io::Write;
use std::path::Path;
use zip::ZipWriter;
use zip::write::SimpleFileOptions;

const OPF_DIR: &str = "OEBPS";

const CONTAINER_XML: &str = r##"<?xml version="1.0" encoding="UTF-8"?>
<container version="1.0" xmlns="urn:oasis:names:tc:opendocument:xmlns:container">
  <rootfiles>
    <rootfile full-path="OEBPS/content.opf" media-type="application/oebps-package+xml"/>
  </rootfiles>
</container>"##;

/// Write an EpubBook to an EPUB file with atomic rename
pub fn write_epub(book: &EpubBook, path: &Path) -> anyhow::Result<()> {
    let tmp_path = path.with_extension("epub.tmp");
    let file = std::fs::File::create(&tmp_path)
        .with_context(|| format!("creating {}", tmp_path.display()))?;
    let mut zip = ZipWriter::new(file);

    // mimetype must be the first entry, stored uncompressed
    let stored = SimpleFileOptions::default().compression_method(zip::CompressionMethod::Stored);
    zip.start_file("mimetype", stored)?;
    zip.write_all(b"application/epub+zip")?;

    let deflate = SimpleFileOptions::default().compression_method(zip::CompressionMethod::Deflated);
    let package_docs = [
        ("META-INF/container.xml".to_string(), CONTAINER_XML.to_string()),
        (format!("{OPF_DIR}/content.opf"), generate_opf(book)),
        (
            format!("{OPF_DIR}/toc.xhtml"),
            generate_toc_xhtml(&book.navigation, &book.nav_title, &book.metadata.titles),
        ),
        (format!("{OPF_DIR}/toc.ncx"), generate_toc_ncx(book)),
    ];
    for (name, text) in &package_docs {
        zip.start_file(name.as_str(), deflate)?;
        zip.write_all(text.as_bytes())?;
    }

    // Manifest order keeps the archive layout stable between runs.
    for item in &book.manifest {
        let Some(data) = book.resources.get(&item.href) else {
            anyhow::bail!("manifest item {} has no content", item.href);
        };
        // Hrefs are URLs; the archive entry carries the decoded path.
        let entry = percent_decode_str(&item.href).decode_utf8_lossy();
        zip.start_file(format!("{OPF_DIR}/{entry}"), deflate)?;
        zip.write_all(data)?;
    }

    zip.finish()?;

    std::fs::rename(&tmp_path, path)
        .with_context(|| format!("moving EPUB into place at {}", path.display()))?;

    Ok(())
}

/// Line-oriented XML text with two-space indentation per depth.
struct XmlText {
    buf: String,
}

impl XmlText {
    fn new() -> Self {
        Self {
            buf: String::from("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n"),
        }
    }

    fn line(&mut self, depth: usize, text: &str) {
        for _ in 0..depth {
            self.buf.push_str("  ");
        }
        self.buf.push_str(text);
        self.buf.push('\n');
    }

    fn open(&mut self, depth: usize, name: &str, attrs: &[(&str, &str)]) {
        self.line(depth, &format!("<{name}{}>", render_attrs(attrs)));
    }

    fn close(&mut self, depth: usize, name: &str) {
        self.line(depth, &format!("</{name}>"));
    }

    fn empty(&mut self, depth: usize, name: &str, attrs: &[(&str, &str)]) {
        self.line(depth, &format!("<{name}{}/>", render_attrs(attrs)));
    }

    fn text(&mut self, depth: usize, name: &str, attrs: &[(&str, &str)], text: &str) {
        self.line(
            depth,
            &format!("<{name}{}>{}</{name}>", render_attrs(attrs), xml_escape(text)),
        );
    }

    fn finish(self) -> String {
        self.buf
    }
}

fn render_attrs(attrs: &[(&str, &str)]) -> String {
    attrs
        .iter()
        .map(|(key, value)| format!(" {key}=\"{}\"", xml_escape(value)))
        .collect()
}

fn generate_opf(book: &EpubBook) -> String {
    let metadata = &book.metadata;
    let mut xml = XmlText::new();
    xml.open(
        0,
        "package",
        &[
            ("xmlns", "http://www.idpf.org/2007/opf"),
            ("version", "3.0"),
            ("unique-identifier", "uid"),
        ],
    );
    xml.open(1, "metadata", &[("xmlns:dc", "http://purl.org/dc/elements/1.1/")]);

    match metadata.identifiers.split_first() {
        Some((first, rest)) => {
            xml.text(2, "dc:identifier", &[("id", "uid")], first);
            for id in rest {
                xml.text(2, "dc:identifier", &[], id);
            }
        }
        None => {
            let uuid = format!("urn:uuid:{}", uuid::Uuid::new_v4());
            xml.text(2, "dc:identifier", &[("id", "uid")], &uuid);
        }
    }

    let default_language = ["en".to_string()];
    let languages = if metadata.languages.is_empty() {
        &default_language[..]
    } else {
        &metadata.languages[..]
    };
    let repeated = [
        ("dc:title", &metadata.titles[..]),
        ("dc:language", languages),
        ("dc:creator", &metadata.creators[..]),
        ("dc:publisher", &metadata.publishers[..]),
        ("dc:subject", &metadata.subjects[..]),
        ("dc:date", &metadata.dates[..]),
    ];
    for (term, values) in repeated {
        for value in values {
            xml.text(2, term, &[], value);
        }
    }
    let single = [
        ("dc:description", &metadata.description),
        ("dc:rights", &metadata.rights),
    ];
    for (term, value) in single {
        if let Some(value) = value {
            xml.text(2, term, &[], value);
        }
    }

    // EPUB 3 requires a modification timestamp
    let modified = metadata.modified.clone().unwrap_or_else(format_iso8601);
    xml.text(2, "meta", &[("property", "dcterms:modified")], &modified);

    if let Some(cover_id) = &metadata.cover_id {
        xml.empty(2, "meta", &[("name", "cover"), ("content", cover_id.as_str())]);
    }
    for (key, value) in &metadata.custom {
        xml.text(2, "meta", &[("property", key.as_str())], value);
    }
    xml.close(1, "metadata");

    xml.open(1, "manifest", &[]);
    xml.empty(
        2,
        "item",
        &[
            ("id", NAV_ID),
            ("href", "toc.xhtml"),
            ("media-type", "application/xhtml+xml"),
            ("properties", "nav"),
        ],
    );
    xml.empty(
        2,
        "item",
        &[
            ("id", "ncx"),
            ("href", "toc.ncx"),
            ("media-type", "application/x-dtbncx+xml"),
        ],
    );
    for item in &book.manifest {
        let mut attrs = vec![
            ("id", item.id.as_str()),
            ("href", item.href.as_str()),
            ("media-type", item.media_type.as_str()),
        ];
        if let Some(properties) = &item.properties {
            attrs.push(("properties", properties.as_str()));
        }
        xml.empty(2, "item", &attrs);
    }
    xml.close(1, "manifest");

    xml.open(1, "spine", &[("toc", "ncx")]);
    for item in &book.spine {
        if item.linear {
            xml.empty(2, "itemref", &[("idref", item.idref.as_str())]);
        } else {
            xml.empty(2, "itemref", &[("idref", item.idref.as_str()), ("linear", "no")]);
        }
    }
    xml.close(1, "spine");
    xml.close(0, "package");
    xml.finish()
}

fn generate_toc_xhtml(toc: &[NavPoint], heading: &str, titles: &[String]) -> String {
    let title = titles.first().map_or(heading, String::as_str);
    let mut xml = XmlText::new();
    xml.line(0, "<!DOCTYPE html>");
    xml.open(
        0,
        "html",
        &[
            ("xmlns", "http://www.w3.org/1999/xhtml"),
            ("xmlns:epub", "http://www.idpf.org/2007/ops"),
        ],
    );
    xml.open(1, "head", &[]);
    xml.text(2, "title", &[], title);
    xml.close(1, "head");
    xml.open(1, "body", &[]);
    xml.open(2, "nav", &[("epub:type", "toc"), ("id", "toc")]);
    xml.text(3, "h1", &[], heading);
    write_nav_list(&mut xml, 3, toc);
    xml.close(2, "nav");
    xml.close(1, "body");
    xml.close(0, "html");
    xml.finish()
}

fn write_nav_list(xml: &mut XmlText, depth: usize, points: &[NavPoint]) {
    if points.is_empty() {
        return;
    }
    xml.open(depth, "ol", &[]);
    for point in points {
        let link = format!(
            "<a href=\"{}\">{}</a>",
            xml_escape(&point.href),
            xml_escape(&point.label)
        );
        if point.children.is_empty() {
            xml.line(depth + 1, &format!("<li>{link}</li>"));
        } else {
            xml.line(depth + 1, &format!("<li>{link}"));
            write_nav_list(xml, depth + 2, &point.children);
            xml.close(depth + 1, "li");
        }
    }
    xml.close(depth, "ol");
}

fn nav_depth(points: &[NavPoint]) -> usize {
    points
        .iter()
        .map(|point| 1 + nav_depth(&point.children))
        .max()
        .unwrap_or(0)
}

fn generate_toc_ncx(book: &EpubBook) -> String {
    let metadata = &book.metadata;
    let title = metadata.titles.first().map_or("", String::as_str);
    let uid = metadata.identifiers.first().map_or("", String::as_str);
    let depth = nav_depth(&book.navigation).max(1).to_string();

    let mut xml = XmlText::new();
    xml.open(
        0,
        "ncx",
        &[
            ("xmlns", "http://www.daisy.org/z3986/2005/ncx/"),
            ("version", "2005-1"),
        ],
    );
    xml.open(1, "head", &[]);
    xml.empty(2, "meta", &[("name", "dtb:uid"), ("content", uid)]);
    xml.empty(2, "meta", &[("name", "dtb:depth"), ("content", depth.as_str())]);
    xml.close(1, "head");
    xml.open(1, "docTitle", &[]);
    xml.text(2, "text", &[], title);
    xml.close(1, "docTitle");
    xml.open(1, "navMap", &[]);
    let mut play_order = 1;
    write_nav_points(&mut xml, 2, &book.navigation, &mut play_order);
    xml.close(1, "navMap");
    xml.close(0, "ncx");
    xml.finish()
}

fn write_nav_points(xml: &mut XmlText, depth: usize, points: &[NavPoint], play_order: &mut usize) {
    for point in points {
        let order = play_order.to_string();
        *play_order += 1;
        let id = format!("navpoint-{order}");
        xml.open(depth, "navPoint", &[("id", id.as_str()), ("playOrder", order.as_str())]);
        xml.open(depth + 1, "navLabel", &[]);
        xml.text(depth + 2, "text", &[], &point.label);
        xml.close(depth + 1, "navLabel");
        xml.empty(depth + 1, "content", &[("src", point.href.as_str())]);
        write_nav_points(xml, depth + 1, &point.children, play_order);
        xml.close(depth, "navPoint");
    }
}
