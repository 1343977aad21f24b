//! Token-level view of a rendered HTML fragment.
//!
//! Rewrites (heading ids, title tagging, media sources) address elements by
//! their position in the token stream, so a change touches exactly one
//! element and never text that merely looks like an attribute.

use quick_xml::escape::resolve_predefined_entity;
use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};

/// Elements that never have a closing tag in HTML.
const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param",
    "source", "track", "wbr",
];

#[derive(Debug, Clone, Default)]
pub struct Fragment {
    events: Vec<Event<'static>>,
}

impl Fragment {
    /// Tokenize an HTML fragment. Mismatched or unclosed tags are tolerated
    /// since raw HTML embedded in Markdown is rarely well-formed XML.
    pub fn parse(html: &str) -> Result<Self, quick_xml::Error> {
        let mut reader = Reader::from_str(html);
        let config = reader.config_mut();
        config.check_end_names = false;
        config.allow_unmatched_ends = true;

        let mut events = Vec::new();
        loop {
            match reader.read_event()? {
                Event::Eof => break,
                event => events.push(event.into_owned()),
            }
        }
        Ok(Self { events })
    }

    pub fn to_html(&self) -> String {
        let mut writer = Writer::new(Vec::new());
        for event in &self.events {
            emit(&mut writer, event.borrow());
        }
        String::from_utf8_lossy(&writer.into_inner()).into_owned()
    }

    /// Well-formed XHTML for the EPUB content documents. Void elements are
    /// self-closed, end tags without a matching open element are dropped,
    /// elements still open at a mismatched or final end are closed, and
    /// text is re-escaped so HTML-only entities become plain characters.
    pub fn to_xhtml(&self) -> String {
        let mut writer = Writer::new(Vec::new());
        let mut open: Vec<String> = Vec::new();

        for event in &self.events {
            match event {
                Event::Start(start) if is_void(start) => {
                    emit(&mut writer, Event::Empty(start.borrow()));
                }
                Event::Start(start) => {
                    open.push(String::from_utf8_lossy(start.name().as_ref()).into_owned());
                    emit(&mut writer, Event::Start(start.borrow()));
                }
                Event::End(end) => {
                    let name = end.name();
                    let Some(depth) = open
                        .iter()
                        .rposition(|n| n.as_bytes().eq_ignore_ascii_case(name.as_ref()))
                    else {
                        continue;
                    };
                    for name in open.drain(depth..).rev() {
                        emit(&mut writer, Event::End(BytesEnd::new(name)));
                    }
                }
                Event::Text(text) => {
                    let decoded = decode_text(text);
                    emit(&mut writer, Event::Text(BytesText::new(&decoded)));
                }
                Event::Empty(_) | Event::CData(_) | Event::Comment(_) => {
                    emit(&mut writer, event.borrow());
                }
                _ => {}
            }
        }
        for name in open.into_iter().rev() {
            emit(&mut writer, Event::End(BytesEnd::new(name)));
        }
        String::from_utf8_lossy(&writer.into_inner()).into_owned()
    }

    /// Start and empty-element tags with their token index, in document order.
    pub fn elements(&self) -> impl Iterator<Item = (usize, &BytesStart<'static>)> + '_ {
        self.events
            .iter()
            .enumerate()
            .filter_map(|(index, event)| match event {
                Event::Start(start) | Event::Empty(start) => Some((index, start)),
                _ => None,
            })
    }

    /// Only tags that open an element with content.
    pub fn start_tags(&self) -> impl Iterator<Item = (usize, &BytesStart<'static>)> + '_ {
        self.events
            .iter()
            .enumerate()
            .filter_map(|(index, event)| match event {
                Event::Start(start) => Some((index, start)),
                _ => None,
            })
    }

    pub fn element(&self, index: usize) -> Option<&BytesStart<'static>> {
        match self.events.get(index) {
            Some(Event::Start(start) | Event::Empty(start)) => Some(start),
            _ => None,
        }
    }

    /// Set (or replace) one attribute on the element at `index`, keeping the
    /// position of the other attributes.
    pub fn set_attribute(&mut self, index: usize, key: &str, value: &str) {
        if let Some(Event::Start(start) | Event::Empty(start)) = self.events.get_mut(index) {
            *start = with_attribute(start, key, value);
        }
    }

    /// Add `class` to the element's class list unless already present.
    pub fn add_class(&mut self, index: usize, class: &str) {
        let Some(start) = self.element(index) else {
            return;
        };
        if has_class(start, class) {
            return;
        }
        let value = match attribute(start, "class") {
            Some(existing) if !existing.trim().is_empty() => format!("{} {class}", existing.trim()),
            _ => class.to_string(),
        };
        self.set_attribute(index, "class", &value);
    }

    /// Plain text inside the element at `index`, with nested markup dropped
    /// and entities decoded.
    pub fn inner_text(&self, index: usize) -> String {
        let mut text = String::new();
        let mut depth = 0usize;
        for event in self.events.iter().skip(index + 1) {
            match event {
                Event::Start(start) if !is_void(start) => depth += 1,
                Event::End(_) => {
                    if depth == 0 {
                        break;
                    }
                    depth -= 1;
                }
                Event::Text(t) => text.push_str(&decode_text(t)),
                Event::CData(c) => text.push_str(&String::from_utf8_lossy(c)),
                _ => {}
            }
        }
        text.trim().to_string()
    }

    /// Whether any element carries `class`.
    pub fn contains_class(&self, class: &str) -> bool {
        self.elements().any(|(_, start)| has_class(start, class))
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

fn emit(writer: &mut Writer<Vec<u8>>, event: Event<'_>) {
    // Writing into a Vec cannot fail.
    let _ = writer.write_event(event);
}

/// Lower-cased local name of an element.
pub fn tag_name(start: &BytesStart<'_>) -> String {
    String::from_utf8_lossy(start.local_name().as_ref()).to_ascii_lowercase()
}

/// Decoded value of attribute `key` (ASCII case-insensitive).
pub fn attribute(start: &BytesStart<'_>, key: &str) -> Option<String> {
    start
        .html_attributes()
        .flatten()
        .find(|attr| attr.key.as_ref().eq_ignore_ascii_case(key.as_bytes()))
        .map(|attr| match attr.unescape_value() {
            Ok(value) => value.into_owned(),
            Err(_) => String::from_utf8_lossy(&attr.value).into_owned(),
        })
}

pub fn has_class(start: &BytesStart<'_>, class: &str) -> bool {
    attribute(start, "class").is_some_and(|value| value.split_whitespace().any(|c| c == class))
}

fn is_void(start: &BytesStart<'_>) -> bool {
    VOID_ELEMENTS.contains(&tag_name(start).as_str())
}

fn with_attribute(start: &BytesStart<'_>, key: &str, value: &str) -> BytesStart<'static> {
    let name = String::from_utf8_lossy(start.name().as_ref()).into_owned();
    let mut rebuilt = BytesStart::new(name);
    let mut replaced = false;
    for attr in start.html_attributes().flatten() {
        if attr.key.as_ref().eq_ignore_ascii_case(key.as_bytes()) {
            if !replaced {
                rebuilt.push_attribute((key, value));
                replaced = true;
            }
        } else {
            rebuilt.push_attribute(attr);
        }
    }
    if !replaced {
        rebuilt.push_attribute((key, value));
    }
    rebuilt
}

fn decode_text(text: &BytesText<'_>) -> String {
    text.unescape_with(|entity| match entity {
        "nbsp" => Some("\u{a0}"),
        "ndash" => Some("\u{2013}"),
        "mdash" => Some("\u{2014}"),
        "hellip" => Some("\u{2026}"),
        "copy" => Some("\u{a9}"),
        other => resolve_predefined_entity(other),
    })
    .map(|s| s.into_owned())
    .unwrap_or_else(|_| String::from_utf8_lossy(text).into_owned())
}
