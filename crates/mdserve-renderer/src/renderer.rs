//! Markdown renderer producing HTML fragments.

use pulldown_cmark::{CowStr, Event, Options, Parser, Tag, TagEnd};

use crate::heading::HeadingState;
use crate::util::{NBSP_ESCAPE, non_breaking_offsets};

/// Result of rendering markdown.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RenderResult {
    /// Rendered HTML fragment.
    pub html: String,
    /// Text of the first H1 heading, if the document has one.
    pub title: Option<String>,
}

/// Markdown to HTML renderer.
///
/// Parses with `pulldown-cmark` and rewrites the event stream before handing it
/// to the HTML writer:
///
/// - Headings are buffered and emitted with a slug `id` attribute
/// - `\ ` outside code blocks becomes `&nbsp;`
///
/// Rendering is pure: the same input always produces the same output, and a
/// single renderer can be shared between threads.
#[derive(Clone, Debug)]
pub struct MarkdownRenderer {
    options: Options,
}

impl MarkdownRenderer {
    /// Create a renderer with the common extension set enabled.
    #[must_use]
    pub fn new() -> Self {
        Self {
            options: Options::ENABLE_TABLES
                | Options::ENABLE_FOOTNOTES
                | Options::ENABLE_STRIKETHROUGH
                | Options::ENABLE_TASKLISTS
                | Options::ENABLE_DEFINITION_LIST
                | Options::ENABLE_GFM,
        }
    }

    /// Replace the parser options.
    #[must_use]
    pub fn with_options(mut self, options: Options) -> Self {
        self.options = options;
        self
    }

    /// Parser options used for rendering.
    #[must_use]
    pub fn parser_options(&self) -> Options {
        self.options
    }

    /// Render markdown text to an HTML fragment.
    pub fn render(&self, markdown: &str) -> RenderResult {
        let parser = Parser::new_ext(markdown, self.options).into_offset_iter();
        let mut sink = EventSink::new();

        for (event, range) in parser {
            match event {
                Event::Start(Tag::Heading {
                    level,
                    id,
                    classes,
                    attrs,
                }) => {
                    sink.headings.start(level, id, classes, attrs);
                }
                Event::End(TagEnd::Heading(_)) => {
                    if let Some(events) = sink.headings.complete() {
                        sink.events.extend(events);
                    }
                }
                // Escapes are checked against the source, since `\\ ` parses to `\ `.
                Event::Text(text) if !sink.in_code_block => {
                    let offsets = non_breaking_offsets(markdown, range, &text);
                    sink.push_text(text, &offsets);
                }
                Event::Start(Tag::CodeBlock(_)) => {
                    sink.in_code_block = true;
                    sink.push(event);
                }
                Event::End(TagEnd::CodeBlock) => {
                    sink.in_code_block = false;
                    sink.push(event);
                }
                other => sink.push(other),
            }
        }

        let mut html = String::with_capacity(markdown.len() * 3 / 2);
        pulldown_cmark::html::push_html(&mut html, sink.events.into_iter());

        RenderResult {
            html,
            title: sink.headings.take_title(),
        }
    }
}

impl Default for MarkdownRenderer {
    fn default() -> Self {
        Self::new()
    }
}

/// Collects rewritten events, routing heading content into [`HeadingState`].
struct EventSink<'a> {
    events: Vec<Event<'a>>,
    headings: HeadingState<'a>,
    in_code_block: bool,
}

impl<'a> EventSink<'a> {
    fn new() -> Self {
        Self {
            events: Vec::new(),
            headings: HeadingState::new(),
            in_code_block: false,
        }
    }

    fn push(&mut self, event: Event<'a>) {
        match &event {
            Event::Text(text) | Event::Code(text) => self.headings.push_text(text),
            Event::SoftBreak | Event::HardBreak => self.headings.push_text(" "),
            _ => {}
        }
        self.emit(event);
    }

    /// Push text, replacing the `\ ` escapes at `nbsp_offsets` with `&nbsp;`.
    fn push_text(&mut self, text: CowStr<'a>, nbsp_offsets: &[usize]) {
        if nbsp_offsets.is_empty() {
            self.push(Event::Text(text));
            return;
        }

        let mut rest = 0;
        for &offset in nbsp_offsets {
            self.push_part(&text[rest..offset]);
            self.headings.push_text("\u{a0}");
            self.emit(Event::InlineHtml(CowStr::Borrowed("&nbsp;")));
            rest = offset + NBSP_ESCAPE.len();
        }
        self.push_part(&text[rest..]);
    }

    fn push_part(&mut self, part: &str) {
        if !part.is_empty() {
            self.push(Event::Text(CowStr::from(part.to_owned())));
        }
    }

    fn emit(&mut self, event: Event<'a>) {
        if self.headings.is_active() {
            self.headings.push_event(event);
        } else {
            self.events.push(event);
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn render(markdown: &str) -> RenderResult {
        MarkdownRenderer::new().render(markdown)
    }

    #[test]
    fn test_basic_paragraph() {
        let result = render("Hello, world!");
        assert_eq!(result.html, "<p>Hello, world!</p>\n");
        assert_eq!(result.title, None);
    }

    #[test]
    fn test_title_and_heading_id() {
        let result = render("# Hello World\nFancy");
        assert_eq!(result.title.as_deref(), Some("Hello World"));
        assert_eq!(
            result.html,
            "<h1 id=\"hello-world\">Hello World</h1>\n<p>Fancy</p>\n"
        );
    }

    #[test]
    fn test_title_from_first_h1_only() {
        let result = render("## Intro\n\n# Real Title\n\n# Another");
        assert_eq!(result.title.as_deref(), Some("Real Title"));
        assert!(result.html.contains(r#"<h2 id="intro">Intro</h2>"#));
        assert!(result.html.contains(r#"<h1 id="another">Another</h1>"#));
    }

    #[test]
    fn test_title_is_text_content() {
        let result = render("# Install *the* `cli`");
        assert_eq!(result.title.as_deref(), Some("Install the cli"));
        assert!(
            result
                .html
                .contains(r#"<h1 id="install-the-cli">Install <em>the</em> <code>cli</code></h1>"#)
        );
    }

    #[test]
    fn test_title_keeps_special_characters_unescaped() {
        let result = render("# Fish & Chips <3");
        assert_eq!(result.title.as_deref(), Some("Fish & Chips <3"));
        assert!(result.html.contains("Fish &amp; Chips &lt;3"));
    }

    #[test]
    fn test_setext_heading() {
        let result = render("Title\n=====\n\nBody");
        assert_eq!(result.title.as_deref(), Some("Title"));
        assert!(result.html.contains(r#"<h1 id="title">Title</h1>"#));
    }

    #[test]
    fn test_duplicate_heading_ids() {
        let result = render("## FAQ\n\n## FAQ\n\n## FAQ");
        assert!(result.html.contains(r#"id="faq""#));
        assert!(result.html.contains(r#"id="faq-1""#));
        assert!(result.html.contains(r#"id="faq-2""#));
    }

    #[test]
    fn test_non_breaking_space() {
        let result = render("Distance: 10\\ km");
        assert_eq!(result.html, "<p>Distance: 10&nbsp;km</p>\n");
    }

    #[test]
    fn test_non_breaking_space_in_heading() {
        let result = render("# Mr.\\ Smith");
        assert_eq!(result.title.as_deref(), Some("Mr.\u{a0}Smith"));
        assert!(result.html.contains(r#"<h1 id="mr-smith">Mr.&nbsp;Smith</h1>"#));
    }

    #[test]
    fn test_escaped_backslash_before_space_is_literal() {
        let result = render("a\\\\ b");
        assert_eq!(result.html, "<p>a\\ b</p>\n");
    }

    #[test]
    fn test_escaped_backslash_then_non_breaking_space() {
        let result = render("a\\\\\\ b");
        assert_eq!(result.html, "<p>a\\&nbsp;b</p>\n");
    }

    #[test]
    fn test_multiple_non_breaking_spaces() {
        let result = render("1\\ 000\\ 000 *and*\\ more");
        assert_eq!(
            result.html,
            "<p>1&nbsp;000&nbsp;000 <em>and</em>&nbsp;more</p>\n"
        );
    }

    #[test]
    fn test_multiline_setext_title() {
        let result = render("Foo\nBar\n===");
        assert_eq!(result.title.as_deref(), Some("Foo Bar"));
        assert_eq!(result.html, "<h1 id=\"foo-bar\">Foo\nBar</h1>\n");
    }

    #[test]
    fn test_footnotes_numbered_across_headings() {
        let result = render("# T[^a]\n\nX[^b]\n\n[^a]: A\n\n[^b]: B");
        assert_eq!(result.title.as_deref(), Some("T"));
        assert!(result.html.contains(r##"<a href="#a">1</a>"##));
        assert!(result.html.contains(r##"<a href="#b">2</a>"##));
    }

    #[test]
    fn test_non_breaking_space_not_in_code_block() {
        let result = render("```\npath\\ with space\n```");
        assert!(result.html.contains("path\\ with space"));
        assert!(!result.html.contains("&nbsp;"));
    }

    #[test]
    fn test_non_breaking_space_not_in_inline_code() {
        let result = render("Run `a\\ b` now");
        assert!(result.html.contains("<code>a\\ b</code>"));
    }

    #[test]
    fn test_common_extensions() {
        let result = render(
            "| A | B |\n|---|---|\n| 1 | 2 |\n\n~~gone~~\n\n- [x] done\n\nText[^1]\n\n[^1]: Note",
        );
        assert!(result.html.contains("<table>"));
        assert!(result.html.contains("<del>gone</del>"));
        assert!(result.html.contains(r#"type="checkbox""#));
        assert!(result.html.contains("footnote"));
    }

    #[test]
    fn test_emphasis_lists_links() {
        let result = render("*italic* **bold** [link](https://example.com)\n\n1. one\n2. two");
        assert!(result.html.contains("<em>italic</em>"));
        assert!(result.html.contains("<strong>bold</strong>"));
        assert!(result.html.contains(r#"<a href="https://example.com">link</a>"#));
        assert!(result.html.contains("<ol>"));
    }

    #[test]
    fn test_fenced_code_language() {
        let result = render("```rust\nfn main() {}\n```");
        assert!(result.html.contains(r#"class="language-rust""#));
    }

    #[test]
    fn test_render_is_deterministic() {
        let markdown = "# Title\n\n## Section\n\nBody with 1\\ 000 items.";
        let renderer = MarkdownRenderer::new();
        assert_eq!(renderer.render(markdown), renderer.render(markdown));
    }

    #[test]
    fn test_ids_reset_between_renders() {
        let renderer = MarkdownRenderer::new();
        let first = renderer.render("## FAQ");
        let second = renderer.render("## FAQ");
        assert!(second.html.contains(r#"id="faq""#));
        assert_eq!(first, second);
    }

    #[test]
    fn test_parser_options_default() {
        let options = MarkdownRenderer::new().parser_options();
        assert!(options.contains(Options::ENABLE_TABLES));
        assert!(options.contains(Options::ENABLE_FOOTNOTES));
        assert!(options.contains(Options::ENABLE_STRIKETHROUGH));
        assert!(options.contains(Options::ENABLE_TASKLISTS));
    }

    #[test]
    fn test_with_options_disables_tables() {
        let renderer = MarkdownRenderer::new().with_options(Options::empty());
        let result = renderer.render("| A | B |\n|---|---|\n| 1 | 2 |");
        assert!(!result.html.contains("<table>"));
    }
}
