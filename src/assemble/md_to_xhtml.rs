use crate::util::xml_escape;
use pulldown_cmark::{CowStr, Event, Options, Parser, Tag, TagEnd, html};
use std::collections::HashSet;

/// A heading as reported by the Markdown engine, in document order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeadingToken {
    pub level: u8,
    pub id: String,
    pub text: String,
}

/// Rendered HTML fragment plus the headings found while rendering it.
#[derive(Debug, Clone, Default)]
pub struct Rendered {
    pub html: String,
    pub headings: Vec<HeadingToken>,
}

impl Rendered {
    pub fn level_one(&self) -> Vec<HeadingToken> {
        self.headings
            .iter()
            .filter(|h| h.level == 1)
            .cloned()
            .collect()
    }
}

/// Turns Markdown source into an HTML fragment with identified headings.
pub trait MarkdownEngine {
    fn render(&self, source: &str) -> Rendered;
}

/// pulldown-cmark backed engine. Every heading gets an id: the explicit
/// `{#id}` attribute when present, otherwise an ASCII slug of its text.
#[derive(Debug, Default, Clone, Copy)]
pub struct PulldownEngine;

impl MarkdownEngine for PulldownEngine {
    fn render(&self, source: &str) -> Rendered {
        let options = Options::ENABLE_TABLES
            | Options::ENABLE_FOOTNOTES
            | Options::ENABLE_STRIKETHROUGH
            | Options::ENABLE_TASKLISTS
            | Options::ENABLE_HEADING_ATTRIBUTES;

        let mut events: Vec<Event> = Parser::new_ext(source, options).collect();
        let mut headings = Vec::new();
        let mut used_ids = HashSet::new();

        let mut i = 0;
        while i < events.len() {
            let (level, explicit_id) = match &events[i] {
                Event::Start(Tag::Heading { level, id, .. }) => {
                    (*level as u8, id.as_ref().map(|s| s.to_string()))
                }
                _ => {
                    i += 1;
                    continue;
                }
            };

            let mut text = String::new();
            let mut end = i + 1;
            while end < events.len() {
                match &events[end] {
                    Event::End(TagEnd::Heading(_)) => break,
                    Event::Text(t) | Event::Code(t) => text.push_str(t),
                    Event::SoftBreak | Event::HardBreak => text.push(' '),
                    _ => {}
                }
                end += 1;
            }
            let text = text.trim().to_string();

            let base = explicit_id
                .filter(|id| !id.is_empty())
                .unwrap_or_else(|| default_heading_id(&text));
            let id = unique_id(base, &mut used_ids);

            if let Event::Start(Tag::Heading { id: slot, .. }) = &mut events[i] {
                *slot = Some(CowStr::from(id.clone()));
            }
            headings.push(HeadingToken { level, id, text });
            i = end + 1;
        }

        let mut body = String::new();
        html::push_html(&mut body, events.into_iter());
        Rendered {
            html: body,
            headings,
        }
    }
}

fn default_heading_id(text: &str) -> String {
    let id = slug::slugify(text);
    if id.is_empty() {
        "section".to_string()
    } else {
        id
    }
}

/// Repeated ids get `_1`, `_2`, ... appended.
fn unique_id(base: String, used: &mut HashSet<String>) -> String {
    let mut candidate = base.clone();
    let mut n = 1;
    while used.contains(&candidate) {
        candidate = format!("{base}_{n}");
        n += 1;
    }
    used.insert(candidate.clone());
    candidate
}

/// Wrap an HTML fragment in an EPUB 3.3 XHTML document.
pub fn wrap_xhtml(body: &str, title: &str, language: &str, stylesheet: Option<&str>) -> String {
    let css_link = stylesheet
        .map(|href| format!("<link rel=\"stylesheet\" type=\"text/css\" href=\"{href}\"/>"))
        .unwrap_or_default();

    format!(
        concat!(
            "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n",
            "<!DOCTYPE html>\n",
            "<html xmlns=\"http://www.w3.org/1999/xhtml\" xmlns:epub=\"http://www.idpf.org/2007/ops\" lang=\"{lang}\" xml:lang=\"{lang}\">\n",
            "<head>\n",
            "  <meta charset=\"UTF-8\"/>\n",
            "  <title>{title}</title>\n",
            "  {css}\n",
            "</head>\n",
            "<body>\n",
            "{body}",
            "</body>\n",
            "</html>\n",
        ),
        lang = xml_escape(language),
        title = xml_escape(title),
        css = css_link,
        body = body,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render(md: &str) -> Rendered {
        PulldownEngine.render(md)
    }

    #[test]
    fn test_basic_markdown() {
        let out = render("# Hello\n\nWorld");
        assert!(out.html.contains(r#"<h1 id="hello">Hello</h1>"#), "{}", out.html);
        assert!(out.html.contains("<p>World</p>"));
    }

    #[test]
    fn test_heading_tokens_in_order() {
        let out = render("# One\n\n## Two\n\n# Three `code`\n");
        let summary: Vec<_> = out
            .headings
            .iter()
            .map(|h| (h.level, h.id.as_str(), h.text.as_str()))
            .collect();
        assert_eq!(
            summary,
            vec![(1, "one", "One"), (2, "two", "Two"), (1, "three-code", "Three code")]
        );
        assert_eq!(out.level_one().len(), 2);
    }

    #[test]
    fn test_heading_attributes_are_kept() {
        let out = render("## Section {#sec1}\n\nText");
        assert_eq!(out.headings[0].id, "sec1");
        assert!(out.html.contains(r#"id="sec1""#), "{}", out.html);
    }

    #[test]
    fn test_repeated_heading_ids_are_suffixed() {
        let out = render("## Notes\n\n## Notes\n\n## Notes\n");
        let ids: Vec<_> = out.headings.iter().map(|h| h.id.as_str()).collect();
        assert_eq!(ids, vec!["notes", "notes_1", "notes_2"]);
    }

    #[test]
    fn test_non_ascii_heading_gets_id() {
        let out = render("# 数据模型\n");
        assert_eq!(out.headings[0].text, "数据模型");
        assert!(!out.headings[0].id.is_empty());
    }

    #[test]
    fn test_wrap_with_stylesheet() {
        let xhtml = wrap_xhtml("<p>text</p>", "Title", "en", Some("style/nav.css"));
        assert!(xhtml.contains(r#"<link rel="stylesheet" type="text/css" href="style/nav.css"/>"#));
        assert!(xhtml.contains("<p>text</p>"));
    }

    #[test]
    fn test_wrap_without_stylesheet() {
        let xhtml = wrap_xhtml("text", "Title", "en", None);
        assert!(!xhtml.contains("stylesheet"));
    }

    #[test]
    fn test_title_escaping() {
        let xhtml = wrap_xhtml("text", "A<B>&C", "en", None);
        assert!(xhtml.contains("<title>A&lt;B&gt;&amp;C</title>"));
    }
}
