//! Page composition for mdserve.
//!
//! This crate provides:
//! - [`PageTemplate`]: capability that wraps a rendered fragment into a full page
//! - [`MinijinjaTemplate`]: template adapter over `minijinja`
//! - [`RenderPipeline`]: markdown bytes to final response bytes
//!
//! # Quick Start
//!
//! ```
//! use std::sync::Arc;
//! use mdserve_site::{MinijinjaTemplate, RenderPipeline};
//!
//! let template = MinijinjaTemplate::from_source("<title>{{ title }}</title>{{ document }}").unwrap();
//! let pipeline = RenderPipeline::new(Arc::new(template));
//!
//! let page = pipeline.render(b"# Hello World\nFancy").unwrap();
//! assert_eq!(page.title, "Hello World");
//! assert!(page.body.starts_with(b"<title>Hello World</title>"));
//! ```

mod pipeline;
mod template;

pub use pipeline::{RenderError, RenderPipeline, RenderedPage};
pub use template::{DEFAULT_TEMPLATE, MinijinjaTemplate, PageTemplate, TemplateError};
