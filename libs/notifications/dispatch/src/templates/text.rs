//! Plaintext fallback derived from rendered HTML.
//!
//! Walks the parsed document and emits readable text: block elements start
//! new paragraphs, table cells are space separated, `<pre>` content keeps its
//! line breaks, images are dropped and links render as `text [href]` unless
//! the href is identical to the text.

use scraper::{ElementRef, Html, Node};

const SKIPPED: &[&str] = &["head", "title", "style", "script", "img", "noscript"];

const BLOCKS: &[&str] = &[
    "address", "article", "blockquote", "body", "center", "div", "dl", "footer", "h1", "h2",
    "h3", "h4", "h5", "h6", "header", "hr", "li", "ol", "p", "section", "table", "tbody",
    "thead", "tr", "ul",
];

/// Convert `html` to plaintext wrapped at `width` columns.
pub fn html_to_text(html: &str, width: usize) -> String {
    let document = Html::parse_document(html);
    let mut builder = TextBuilder::default();
    walk(document.root_element(), &mut builder, false);
    builder.finish(width)
}

fn walk(element: ElementRef<'_>, out: &mut TextBuilder, preformatted: bool) {
    for child in element.children() {
        match child.value() {
            Node::Text(text) if preformatted => out.push_preformatted(text),
            Node::Text(text) => out.push_inline(text),
            Node::Element(_) => {
                if let Some(child) = ElementRef::wrap(child) {
                    visit(child, out, preformatted);
                }
            }
            _ => {}
        }
    }
}

fn visit(element: ElementRef<'_>, out: &mut TextBuilder, preformatted: bool) {
    let name = element.value().name();

    if SKIPPED.contains(&name) {
        return;
    }

    match name {
        "br" => out.break_line(),
        "a" => {
            let label = element.text().collect::<Vec<_>>().join(" ");
            let label = label.split_whitespace().collect::<Vec<_>>().join(" ");
            out.push_inline(&label);

            if let Some(href) = element.value().attr("href") {
                let href = href.trim();
                if !href.is_empty() && href != label {
                    out.push_inline(&format!(" [{href}]"));
                }
            }
        }
        "pre" => {
            out.block();
            walk(element, out, true);
            out.block();
        }
        "td" | "th" => {
            walk(element, out, preformatted);
            out.push_inline(" ");
        }
        name if BLOCKS.contains(&name) => {
            out.block();
            walk(element, out, preformatted);
            out.block();
        }
        _ => walk(element, out, preformatted),
    }
}

#[derive(Default)]
struct TextBuilder {
    /// Finished lines; the flag marks preformatted lines that must not be reflowed.
    lines: Vec<(String, bool)>,
    current: String,
    current_preformatted: bool,
    pending_space: bool,
}

impl TextBuilder {
    fn push_inline(&mut self, text: &str) {
        if text.starts_with(char::is_whitespace) {
            self.pending_space = true;
        }

        for word in text.split_whitespace() {
            if self.pending_space && !self.current.is_empty() {
                self.current.push(' ');
            }
            self.current.push_str(word);
            self.pending_space = true;
        }

        if !text.ends_with(char::is_whitespace) && !text.trim().is_empty() {
            self.pending_space = false;
        }
    }

    fn push_preformatted(&mut self, text: &str) {
        self.current_preformatted = true;
        let mut parts = text.split('\n');
        if let Some(first) = parts.next() {
            self.current.push_str(first);
        }
        for part in parts {
            self.break_line();
            self.current_preformatted = true;
            self.current.push_str(part);
        }
    }

    fn break_line(&mut self) {
        let line = std::mem::take(&mut self.current);
        let preformatted = std::mem::take(&mut self.current_preformatted);
        let line = if preformatted {
            line.trim_end().to_string()
        } else {
            line.trim().to_string()
        };
        self.lines.push((line, preformatted));
        self.pending_space = false;
    }

    /// Close the current paragraph, leaving one blank line behind it.
    fn block(&mut self) {
        if !self.current.trim().is_empty() {
            self.break_line();
        } else {
            self.current.clear();
            self.current_preformatted = false;
            self.pending_space = false;
        }

        if matches!(self.lines.last(), Some((line, _)) if !line.is_empty()) {
            self.lines.push((String::new(), false));
        }
    }

    fn finish(mut self, width: usize) -> String {
        if !self.current.trim().is_empty() {
            self.break_line();
        }

        let mut output: Vec<String> = Vec::new();
        for (line, preformatted) in self.lines {
            if line.is_empty() {
                if matches!(output.last(), Some(last) if !last.is_empty()) {
                    output.push(String::new());
                }
            } else if preformatted {
                output.push(line);
            } else {
                output.extend(wrap(&line, width));
            }
        }

        while matches!(output.last(), Some(last) if last.is_empty()) {
            output.pop();
        }

        output.join("\n")
    }
}

/// Greedy word wrap; words longer than `width` are kept whole.
fn wrap(line: &str, width: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();

    for word in line.split_whitespace() {
        if !current.is_empty() && current.chars().count() + 1 + word.chars().count() > width {
            lines.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(word);
    }

    if !current.is_empty() {
        lines.push(current);
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paragraphs_are_separated() {
        let text = html_to_text("<p>First</p><p>Second   line</p>", 80);
        assert_eq!(text, "First\n\nSecond line");
    }

    #[test]
    fn test_head_and_images_are_skipped() {
        let html = "<html><head><title>T</title><style>p{}</style></head>\
                    <body><img src=\"x.png\" alt=\"x\"><div>Body</div></body></html>";
        assert_eq!(html_to_text(html, 80), "Body");
    }

    #[test]
    fn test_links_hide_href_when_same_as_text() {
        let html = r#"<p><a href="https://a.io">https://a.io</a> <a href="https://b.io">docs</a></p>"#;
        assert_eq!(html_to_text(html, 80), "https://a.io docs [https://b.io]");
    }

    #[test]
    fn test_preformatted_keeps_line_breaks() {
        let html = "<div><pre>line one\n  indented two</pre></div>";
        assert_eq!(html_to_text(html, 80), "line one\n  indented two");
    }

    #[test]
    fn test_preformatted_blank_lines_separate_sections() {
        let html = "<pre><strong>Query:</strong>\n\n\n<strong>Body:</strong>\n</pre>";
        assert_eq!(html_to_text(html, 80), "Query:\n\nBody:");
    }

    #[test]
    fn test_table_cells_are_space_separated() {
        let html = "<table><tr><td><strong>Code:</strong></td><td>500</td></tr></table>";
        assert_eq!(html_to_text(html, 80), "Code: 500");
    }

    #[test]
    fn test_inline_markup_does_not_split_words() {
        assert_eq!(html_to_text("<p>foo<b>bar</b> baz</p>", 80), "foobar baz");
    }

    #[test]
    fn test_long_lines_wrap_at_width() {
        let html = "<p>aaa bbb ccc ddd</p>";
        assert_eq!(html_to_text(html, 7), "aaa bbb\nccc ddd");
    }
}
