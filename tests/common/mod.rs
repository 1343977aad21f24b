use std::io::Read;
use std::path::{Path, PathBuf};

/// Write `content` to `root/relative`, creating parent directories.
pub fn write_file(root: &Path, relative: &str, content: impl AsRef<[u8]>) -> PathBuf {
    let path = root.join(relative);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).expect("create parent dir");
    }
    std::fs::write(&path, content).expect("write file");
    path
}

/// A small documentation tree: README and sidebar pages, a preface, and two
/// chapters in different directories sharing one image.
#[allow(dead_code)]
pub fn sample_docs(root: &Path) -> PathBuf {
    let docs = root.join("docs");
    write_file(&docs, "README.md", "# Project Readme\n\nNot part of the book.\n");
    write_file(&docs, "sidebar.md", "* [Intro](intro.md)\n");
    write_file(&docs, "intro.md", "# Introduction\n\n![Arch](img/arch.png)\n\n## Goals\n");
    write_file(&docs, "preface.md", "# Preface\n\nWhy this book.\n");
    write_file(
        &docs,
        "guide/usage.md",
        "# Usage\n\n![Arch again](../img/arch.png)\n\n## Install\n\n## Run\n",
    );
    write_file(&docs, "img/arch.png", b"\x89PNG fake");
    docs
}

/// Read one archive member as text.
#[allow(dead_code)]
pub fn read_zip_entry(path: &Path, name: &str) -> String {
    let file = std::fs::File::open(path).expect("open archive");
    let mut archive = zip::ZipArchive::new(file).expect("open zip");
    let mut entry = archive.by_name(name).expect("archive entry");
    let mut content = String::new();
    entry.read_to_string(&mut content).expect("read entry");
    content
}

/// Basic structural validation of an EPUB file
#[allow(dead_code)]
pub fn assert_valid_epub(path: &Path) {
    let file = std::fs::File::open(path).expect("open epub");
    let mut archive = zip::ZipArchive::new(file).expect("open zip");

    // Check mimetype is first entry and stored
    let mimetype = archive.by_index(0).expect("first entry");
    assert_eq!(mimetype.name(), "mimetype");
    assert_eq!(mimetype.compression(), zip::CompressionMethod::Stored);
    drop(mimetype);

    let mut mimetype = archive.by_name("mimetype").expect("mimetype entry");
    let mut content = String::new();
    mimetype.read_to_string(&mut content).expect("read mimetype");
    assert_eq!(content.trim(), "application/epub+zip");
    drop(mimetype);

    archive
        .by_name("META-INF/container.xml")
        .expect("container.xml");
    archive.by_name("OEBPS/content.opf").expect("content.opf");
}
