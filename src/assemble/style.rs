use crate::config::BookConfig;

/// Page stylesheet for the HTML and PDF outputs, also shipped in the EPUB.
pub fn build_css(config: &BookConfig) -> String {
    let mut running = String::new();
    if config.header_enabled {
        running.push_str(&header_css(config));
    }
    if config.footer_enabled {
        running.push_str(&footer_css(config));
    }

    let page_break = if config.chapter_page_break {
        "always"
    } else {
        "auto"
    };

    format!(
        r#"
@page {{
    size: {page_size};
    margin: {margin_top} {margin_right} {margin_bottom} {margin_left};
    counter-increment: page;
}}

@page:left {{
    @top-left {{
        content: counter(page);
        font-size: {header_font_size};
    }}
}}

@page:right {{
    @top-right {{
        content: counter(page);
        font-size: {header_font_size};
    }}
}}

body {{
    font-family: {font_family};
    font-size: {base_font_size};
    color: {text_color};
    background: {background_color};
    line-height: {line_height};
    counter-reset: page 0;
}}

h1 {{
    font-family: {heading_font_family};
    color: {heading_color_h1};
    margin-top: 1.4em;
}}

h2 {{
    font-family: {heading_font_family};
    color: {heading_color_h2};
    margin-top: 1.4em;
}}

h3 {{
    font-family: {heading_font_family};
    color: {heading_color_h3};
    margin-top: 1.2em;
}}

h4, h5, h6 {{
    font-family: {heading_font_family};
    color: {heading_color};
    margin-top: 1.1em;
}}

a {{
    color: {link_color};
    text-decoration: none;
}}

em, i {{
    font-style: italic;
    font-family: {font_family};
    font-synthesis: style;
}}

pre, code {{
    font-family: {code_font_family};
}}

pre {{
    background: {code_background_color};
    border: 1px dashed {code_border_color};
    padding: 12px;
    border-radius: 4px;
    overflow-x: auto;
    font-size: clamp(10px, 0.95em, 1em);
    box-sizing: border-box;
}}

pre code {{
    display: block;
    font-size: clamp(10px, 0.9em, 0.95em);
    white-space: pre-wrap;
    word-break: break-word;
}}

blockquote {{
    border-left: 4px solid {link_color};
    padding-left: 12px;
    color: #555;
    margin-left: 0;
}}

hr {{
    border: none;
    border-top: 1px dashed {code_border_color};
    margin: 24px 0;
}}

table {{
    border-collapse: collapse;
    width: 100%;
}}

table, th, td {{
    border: 1px solid {code_border_color};
}}

th, td {{
    padding: {table_cell_padding};
    font-family: {table_font_family};
}}

img {{
    display: block;
    margin-left: auto;
    margin-right: auto;
    max-width: 100%;
}}

figure {{
    text-align: center;
}}

.book-title {{
    text-align: center;
    margin-top: 60px;
    font-size: 2.4em;
}}

.book-author {{
    text-align: center;
    color: #666;
    margin-bottom: 40px;
}}

.book-author p {{
    margin: 0;
}}

.chapter {{
    page-break-before: {page_break};
    page-break-after: auto;
}}

.pdf-cover {{
    page-break-after: always;
    text-align: center;
}}

.pdf-cover img {{
    max-width: 100%;
    height: auto;
}}

.no-page-number {{
    page: no-number;
}}

@page no-number {{
    @top-right {{
        content: none;
    }}
    @top-left {{
        content: none;
    }}
    counter-increment: none;
}}

.toc-title {{
    font-size: 1.6em;
    font-weight: bold;
    margin-bottom: 10px;
}}

.toc-list {{
    list-style: none;
    padding-left: 0;
}}

.toc-list li {{
    margin: 6px 0;
}}

.toc-list ul {{
    padding-left: 20px;
}}

.toc {{
    page-break-after: always;
}}

.toc a::after {{
    content: leader('.') target-counter(attr(href), page);
    float: right;
    color: {text_color};
}}

.chapter-title {{
    text-align: center;
    font-family: {chapter_title_font_family};
}}

.chapter > h1:first-of-type {{
    text-align: center;
}}

.chapter-header-title {{
    string-set: chapter-title content();
    visibility: hidden;
    height: 0;
    overflow: hidden;
}}

.chapter-header-title a {{
    color: inherit;
    text-decoration: none;
}}
{running}
{extra_css}
"#,
        page_size = config.page_size,
        margin_top = config.margin_top,
        margin_right = config.margin_right,
        margin_bottom = config.margin_bottom,
        margin_left = config.margin_left,
        header_font_size = config.header_font_size,
        font_family = config.font_family,
        base_font_size = config.base_font_size,
        text_color = config.text_color,
        background_color = config.background_color,
        line_height = config.line_height,
        heading_font_family = config.heading_font_family,
        heading_color = config.heading_color,
        heading_color_h1 = config.heading_color_h1,
        heading_color_h2 = config.heading_color_h2,
        heading_color_h3 = config.heading_color_h3,
        link_color = config.link_color,
        code_font_family = config.code_font_family,
        code_background_color = config.code_background_color,
        code_border_color = config.code_border_color,
        table_cell_padding = config.table_cell_padding,
        table_font_family = config.table_font_family,
        chapter_title_font_family = config.chapter_title_font_family,
        extra_css = config.extra_css,
    )
}

/// Running header: the current chapter title, or the fixed `header_title`
/// when the chapter header is switched off.
fn header_css(config: &BookConfig) -> String {
    if !config.header_chapter {
        return fixed_header_css(config);
    }
    format!(
        r#"
h1.chapter-title {{
    string-set: chapter-title content();
}}

.chapter-header-title {{
    string-set: chapter-title content();
    position: running(page-header);
    font-size: {font_size};
    text-align: center;
    display: inline-block;
    padding-bottom: 6px;
    border-bottom: 1px dashed {border};
    visibility: visible;
    height: auto;
    overflow: visible;
    margin: 0 auto;
}}

@page {{
    @top-center {{
        content: element(page-header);
        text-align: center;
    }}
}}

@page:left {{
    @top-center {{
        content: element(page-header);
        text-align: center;
    }}
}}

@page:right {{
    @top-center {{
        content: element(page-header);
        text-align: center;
    }}
}}
"#,
        font_size = config.header_font_size,
        border = config.header_border_color,
    )
}

fn fixed_header_css(config: &BookConfig) -> String {
    let mut css = String::from("\n.chapter-header-title {\n    display: none;\n}\n");
    if let Some(title) = &config.header_title {
        css.push_str(&format!(
            r#"
@page {{
    @top-center {{
        content: "{text}";
        font-size: {font_size};
        border-bottom: 1px dashed {border};
    }}
}}
"#,
            text = css_string(title),
            font_size = config.header_font_size,
            border = config.header_border_color,
        ));
    }
    css
}

/// Body of a double-quoted CSS string.
fn css_string(text: &str) -> String {
    text.replace('\\', "\\\\")
        .replace('"', "\\\"")
        .replace('\n', "\\A ")
}

fn footer_css(config: &BookConfig) -> String {
    format!(
        r#"
.page-footer {{
    position: running(page-footer);
    font-size: {font_size};
    border-top: 1px dashed {border};
    padding-top: 6px;
    width: 100%;
    box-sizing: border-box;
    display: block;
}}

@page {{
    @bottom-center {{
        content: element(page-footer);
    }}
}}
"#,
        font_size = config.footer_font_size,
        border = config.footer_border_color,
    )
}
