mod common;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn mdweave() -> Command {
    let mut cmd = Command::cargo_bin("mdweave").unwrap();
    cmd.env_remove("RUST_LOG");
    cmd
}

#[test]
fn test_html_output() {
    let tmp = TempDir::new().unwrap();
    let docs = common::sample_docs(tmp.path());
    let out = tmp.path().join("out/book");

    mdweave()
        .args(["-f", "html", "-o"])
        .arg(&out)
        .arg(&docs)
        .assert()
        .success()
        .stdout(predicate::str::contains("HTML created at"));

    let html = std::fs::read_to_string(tmp.path().join("out/book.html")).unwrap();
    assert!(!html.contains("Project Readme"));
    assert!(html.contains("<section id=\"preface\" class=\"chapter\">"));
    assert!(html.contains("<section id=\"introduction\" class=\"chapter\">"));
    assert!(html.contains("<section id=\"usage\" class=\"chapter\">"));

    // Preface is promoted ahead of the path-sorted remainder.
    let preface = html.find("<section id=\"preface\"").unwrap();
    let usage = html.find("<section id=\"usage\"").unwrap();
    let intro = html.find("<section id=\"introduction\"").unwrap();
    assert!(preface < usage && usage < intro);

    // The TOC comes before the first chapter and links nested headings.
    let toc = html.find("class=\"toc no-page-number\"").unwrap();
    assert!(toc < preface);
    assert!(html.contains(r##"<li><a href="#install">Install</a></li>"##));

    // One shared image, copied once next to the page.
    assert_eq!(html.matches("src=\"images/1_arch.png\"").count(), 2);
    assert!(tmp.path().join("out/images/1_arch.png").is_file());
    assert!(!tmp.path().join("out/images/2_arch.png").exists());
}

#[test]
fn test_epub_output() {
    let tmp = TempDir::new().unwrap();
    let docs = common::sample_docs(tmp.path());
    let out = tmp.path().join("book");

    mdweave()
        .args(["-f", "epub", "-o"])
        .arg(&out)
        .arg(&docs)
        .assert()
        .success()
        .stdout(predicate::str::contains("EPUB created at"));

    let epub = tmp.path().join("book.epub");
    common::assert_valid_epub(&epub);

    let opf = common::read_zip_entry(&epub, "OEBPS/content.opf");
    assert!(opf.contains("<dc:title>Generated Book</dc:title>"));
    assert_eq!(opf.matches("media-type=\"image/png\"").count(), 1);
    let spine_start = opf.find("<spine").unwrap();
    assert!(opf[spine_start..].find("idref=\"toc\"").unwrap() < opf[spine_start..].find("idref=\"chap_1\"").unwrap());

    let nav = common::read_zip_entry(&epub, "OEBPS/toc.xhtml");
    assert!(nav.contains("<a href=\"chap_1.xhtml\">Preface</a>"), "{nav}");
    assert!(nav.contains("<a href=\"chap_2.xhtml#install\">Install</a>"), "{nav}");

    let chapter = common::read_zip_entry(&epub, "OEBPS/chap_2.xhtml");
    assert!(chapter.contains("src=\"images/1_arch.png\""));
}

#[test]
fn test_config_file_is_applied() {
    let tmp = TempDir::new().unwrap();
    let docs = common::sample_docs(tmp.path());
    let config = common::write_file(
        tmp.path(),
        "book.yml",
        "title: Field Guide\nauthor: Jo\ntoc: false\nurl_prefix: https://docs.example.com/\n",
    );
    let out = tmp.path().join("guide");

    mdweave()
        .args(["-f", "html", "-c"])
        .arg(&config)
        .arg("-o")
        .arg(&out)
        .arg(&docs)
        .assert()
        .success();

    let html = std::fs::read_to_string(tmp.path().join("guide.html")).unwrap();
    assert!(html.contains("<h1 class=\"book-title\">Field Guide</h1>"));
    assert!(!html.contains("toc-title"));
    assert!(html.contains("<a href=\"https://docs.example.com/usage\">Usage</a>"));
}

#[test]
fn test_json_summary() {
    let tmp = TempDir::new().unwrap();
    let docs = common::sample_docs(tmp.path());

    mdweave()
        .args(["-f", "epub", "--json", "-o"])
        .arg(tmp.path().join("book"))
        .arg(&docs)
        .assert()
        .success()
        .stdout(predicate::str::contains("\"chapters\": 3"))
        .stdout(predicate::str::contains("\"resources\": 1"))
        .stdout(predicate::str::contains("\"epub\""));
}

#[test]
fn test_single_file_source() {
    let tmp = TempDir::new().unwrap();
    let file = common::write_file(tmp.path(), "notes_on_things.md", "Some text only.\n");

    mdweave()
        .args(["-f", "html", "-o"])
        .arg(tmp.path().join("out"))
        .arg(&file)
        .assert()
        .success();

    let html = std::fs::read_to_string(tmp.path().join("out.html")).unwrap();
    assert!(html.contains(
        "<h1 id=\"notes-on-things\" class=\"chapter-title\">Notes On Things</h1>"
    ));
}

#[test]
fn test_no_markdown_fails() {
    let tmp = TempDir::new().unwrap();
    common::write_file(tmp.path(), "notes.txt", "plain");

    mdweave()
        .args(["-f", "html", "-o"])
        .arg(tmp.path().join("out"))
        .arg(tmp.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("no Markdown files found"));
}

#[test]
fn test_only_excluded_pages_fails() {
    let tmp = TempDir::new().unwrap();
    common::write_file(tmp.path(), "README.md", "# Readme\n");

    mdweave()
        .args(["-f", "html", "-o"])
        .arg(tmp.path().join("out"))
        .arg(tmp.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("after excluding"));
}

#[test]
fn test_missing_cover_fails() {
    let tmp = TempDir::new().unwrap();
    let docs = common::sample_docs(tmp.path());

    mdweave()
        .args(["-f", "html", "--pdf-cover", "nope.png", "-o"])
        .arg(tmp.path().join("out"))
        .arg(&docs)
        .assert()
        .failure()
        .stderr(predicate::str::contains("PDF cover image not found"));

    assert!(!tmp.path().join("out.html").exists());
}

#[test]
fn test_invalid_config_fails() {
    let tmp = TempDir::new().unwrap();
    let docs = common::sample_docs(tmp.path());
    let config = common::write_file(tmp.path(), "bad.yml", "titel: typo\n");

    mdweave()
        .args(["-f", "html", "-c"])
        .arg(&config)
        .arg("-o")
        .arg(tmp.path().join("out"))
        .arg(&docs)
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid configuration"));
}

#[test]
fn test_missing_pdf_engine_fails() {
    let tmp = TempDir::new().unwrap();
    let docs = common::sample_docs(tmp.path());
    let config = common::write_file(tmp.path(), "book.yml", "pdf_engine: mdweave-missing-engine\n");

    mdweave()
        .args(["-c"])
        .arg(&config)
        .arg("-o")
        .arg(tmp.path().join("out"))
        .arg(&docs)
        .assert()
        .failure()
        .stderr(predicate::str::contains("mdweave-missing-engine"));
}
