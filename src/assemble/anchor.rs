//! Book-unique chapter anchors and chapter-scoped heading ids.

use super::chapter::{AnchoredHeading, Chapter, CompiledChapter, TITLE_CLASS};
use super::md_to_xhtml::HeadingToken;
use crate::markup::{Fragment, attribute, tag_name};
use regex::Regex;
use std::collections::{HashMap, HashSet};
use std::sync::LazyLock;
use tracing::debug;

const FALLBACK_SLUG: &str = "section";

static WHITESPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").expect("valid regex"));

/// Slug for a title: whitespace runs become `-`, everything but word
/// characters, `-` and non-Latin code points is dropped, then lowercased.
pub fn slugify_title(title: &str) -> String {
    let hyphenated = WHITESPACE.replace_all(title.trim(), "-");
    let slug = hyphenated
        .chars()
        .filter(|c| is_slug_char(*c))
        .collect::<String>()
        .to_lowercase();
    if slug.is_empty() {
        FALLBACK_SLUG.to_string()
    } else {
        slug
    }
}

fn is_slug_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '-' || ('\u{80}'..='\u{FFFF}').contains(&c)
}

/// Hands out unique anchors. The first claim of a slug gets it bare, the Nth
/// repeat gets `slug-N`; a candidate already handed out is skipped.
#[derive(Debug, Default)]
pub struct AnchorRegistry {
    counts: HashMap<String, usize>,
    issued: HashSet<String>,
}

impl AnchorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn claim(&mut self, base: &str) -> String {
        loop {
            let count = self.counts.entry(base.to_string()).or_insert(0);
            let candidate = if *count == 0 {
                base.to_string()
            } else {
                format!("{base}-{count}")
            };
            *count += 1;
            if self.issued.insert(candidate.clone()) {
                return candidate;
            }
        }
    }
}

/// Assign the chapter anchor and rewrite its level-1 heading ids.
pub fn normalize_chapter(compiled: CompiledChapter, anchors: &mut AnchorRegistry) -> Chapter {
    let CompiledChapter {
        title,
        source,
        mut body,
        level_one,
    } = compiled;

    let anchor = anchors.claim(&slugify_title(&title));
    let headings = normalize_heading_ids(&mut body, &level_one, &anchor);

    Chapter {
        title,
        source,
        body,
        anchor,
        headings,
    }
}

/// Rewrite level-1 heading ids to be chapter-scoped.
///
/// The first heading takes the chapter anchor itself and is tagged with the
/// running-title class; later ones become `anchor-originalId`. Each token is
/// matched to the first `<h1>` not yet rewritten whose id equals the token
/// id, so no other element can be touched.
pub fn normalize_heading_ids(
    body: &mut Fragment,
    level_one: &[HeadingToken],
    anchor: &str,
) -> Vec<AnchoredHeading> {
    let mut local_ids = AnchorRegistry::new();
    let mut rewritten: HashSet<usize> = HashSet::new();
    let mut normalized = Vec::with_capacity(level_one.len());

    for (idx, token) in level_one.iter().enumerate() {
        let original_id = if token.id.is_empty() {
            slugify_title(&token.text)
        } else {
            token.id.clone()
        };
        let base = if idx == 0 {
            anchor.to_string()
        } else {
            format!("{anchor}-{original_id}")
        };
        let new_id = local_ids.claim(&base);

        let target = body
            .start_tags()
            .find(|(index, start)| {
                !rewritten.contains(index)
                    && tag_name(start) == "h1"
                    && attribute(start, "id").as_deref() == Some(original_id.as_str())
            })
            .map(|(index, _)| index);

        match target {
            Some(index) => {
                body.set_attribute(index, "id", &new_id);
                if idx == 0 {
                    body.add_class(index, TITLE_CLASS);
                }
                rewritten.insert(index);
            }
            None => debug!(id = %original_id, "no <h1> carries heading id, left as is"),
        }

        normalized.push(AnchoredHeading {
            id: new_id,
            text: token.text.clone(),
        });
    }

    if normalized.is_empty() {
        normalized.push(AnchoredHeading {
            id: anchor.to_string(),
            text: String::new(),
        });
    }

    normalized
}
