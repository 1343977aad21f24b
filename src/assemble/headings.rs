use super::chapter::Chapter;
use crate::markup::{attribute, tag_name};

/// A heading that can appear in the table of contents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeadingRef {
    pub level: u8,
    pub id: String,
    pub text: String,
}

/// `<h1>`/`<h2>` elements that carry an id, in document order. A chapter
/// without a running-title element gets a synthesized level-1 entry pointing
/// at its anchor.
pub fn collect_chapter_headings(chapter: &Chapter) -> Vec<HeadingRef> {
    let mut headings: Vec<HeadingRef> = chapter
        .body
        .start_tags()
        .filter_map(|(index, start)| {
            let level = match tag_name(start).as_str() {
                "h1" => 1,
                "h2" => 2,
                _ => return None,
            };
            let id = attribute(start, "id").filter(|id| !id.is_empty())?;
            Some(HeadingRef {
                level,
                id,
                text: chapter.body.inner_text(index),
            })
        })
        .collect();

    if !chapter.has_title_heading() {
        headings.insert(
            0,
            HeadingRef {
                level: 1,
                id: chapter.anchor.clone(),
                text: chapter.heading_text().to_string(),
            },
        );
    }

    headings
}

pub fn collect_headings(chapters: &[Chapter]) -> Vec<HeadingRef> {
    chapters.iter().flat_map(collect_chapter_headings).collect()
}
