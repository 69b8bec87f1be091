//! Markdown to HTML conversion for mdserve.
//!
//! This crate wraps `pulldown-cmark` with the dialect mdserve serves:
//!
//! - Common extensions (tables, footnotes, strikethrough, task lists,
//!   definition lists, GFM blockquote alerts)
//! - Automatic `id` attributes on every heading, derived from the heading text
//! - `\ ` (backslash-space) rendered as a non-breaking space
//! - Title capture from the first level-1 heading
//!
//! # Example
//!
//! ```
//! use mdserve_renderer::MarkdownRenderer;
//!
//! let result = MarkdownRenderer::new().render("# Hello World\nFancy");
//! assert_eq!(result.title.as_deref(), Some("Hello World"));
//! assert!(result.html.contains(r#"<h1 id="hello-world">Hello World</h1>"#));
//! ```

mod heading;
mod renderer;
mod util;

pub use renderer::{MarkdownRenderer, RenderResult};
pub use util::slugify;
