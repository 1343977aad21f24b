use super::headings::HeadingRef;
use crate::util::xml_escape;

/// One entry of the table of contents tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TocNode {
    pub level: u8,
    pub id: String,
    pub text: String,
    pub children: Vec<TocNode>,
}

impl TocNode {
    fn root() -> Self {
        Self {
            level: 0,
            id: String::new(),
            text: String::new(),
            children: Vec::new(),
        }
    }
}

impl From<&HeadingRef> for TocNode {
    fn from(heading: &HeadingRef) -> Self {
        Self {
            level: heading.level,
            id: heading.id.clone(),
            text: heading.text.clone(),
            children: Vec::new(),
        }
    }
}

/// Nest headings by level. A heading closes every open entry whose level is
/// greater than or equal to its own, then opens beneath what remains.
pub fn build_toc(headings: &[HeadingRef]) -> Vec<TocNode> {
    let mut stack = vec![TocNode::root()];
    for heading in headings {
        while stack.len() > 1 && stack.last().is_some_and(|top| top.level >= heading.level) {
            close_top(&mut stack);
        }
        stack.push(TocNode::from(heading));
    }
    while stack.len() > 1 {
        close_top(&mut stack);
    }
    stack.pop().map(|root| root.children).unwrap_or_default()
}

fn close_top(stack: &mut Vec<TocNode>) {
    if let Some(node) = stack.pop()
        && let Some(parent) = stack.last_mut()
    {
        parent.children.push(node);
    }
}

/// Render the tree as the HTML table of contents block.
///
/// Level-1 entries become `<h2>` links followed by a list of their children.
/// Consecutive deeper top-level entries share one list.
pub fn render_toc(nodes: &[TocNode], title: &str) -> String {
    let mut html = String::from("<div class=\"toc no-page-number\">");
    html.push_str(&format!(
        "<div class=\"toc-title\">{}</div>",
        xml_escape(title)
    ));

    let mut loose: Vec<&TocNode> = Vec::new();
    for node in nodes {
        if node.level == 1 {
            write_list(&mut html, &loose);
            loose.clear();
            html.push_str(&format!(
                "<h2><a href=\"#{}\">{}</a></h2>",
                xml_escape(&node.id),
                xml_escape(&node.text)
            ));
            let children: Vec<&TocNode> = node.children.iter().collect();
            write_list(&mut html, &children);
        } else {
            loose.push(node);
        }
    }
    write_list(&mut html, &loose);

    html.push_str("</div>");
    html
}

fn write_list(html: &mut String, nodes: &[&TocNode]) {
    if nodes.is_empty() {
        return;
    }
    html.push_str("<ul class=\"toc-list\">");
    for node in nodes {
        html.push_str(&format!(
            "<li><a href=\"#{}\">{}</a>",
            xml_escape(&node.id),
            xml_escape(&node.text)
        ));
        let children: Vec<&TocNode> = node.children.iter().collect();
        write_list(html, &children);
        html.push_str("</li>");
    }
    html.push_str("</ul>");
}
