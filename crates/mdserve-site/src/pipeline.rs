//! Markdown to page render pipeline.

use std::sync::Arc;

use mdserve_renderer::MarkdownRenderer;

use crate::template::{PageTemplate, TemplateError};

/// Output of [`RenderPipeline::render`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RenderedPage {
    /// Text of the first H1, or empty.
    pub title: String,
    /// Final response body.
    pub body: Vec<u8>,
}

/// Error returned when a page cannot be rendered.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error(transparent)]
    Template(#[from] TemplateError),
}

/// Turns markdown source into a complete page.
///
/// Stateless apart from its configuration, so one pipeline is shared by all
/// requests.
#[derive(Clone)]
pub struct RenderPipeline {
    renderer: MarkdownRenderer,
    template: Arc<dyn PageTemplate>,
}

impl RenderPipeline {
    /// Create a pipeline with the default markdown renderer.
    pub fn new(template: Arc<dyn PageTemplate>) -> Self {
        Self::with_renderer(MarkdownRenderer::new(), template)
    }

    /// Create a pipeline with a custom markdown renderer.
    pub fn with_renderer(renderer: MarkdownRenderer, template: Arc<dyn PageTemplate>) -> Self {
        Self { renderer, template }
    }

    /// Render markdown source bytes.
    ///
    /// Invalid UTF-8 sequences are replaced rather than rejected.
    pub fn render(&self, source: &[u8]) -> Result<RenderedPage, RenderError> {
        let markdown = String::from_utf8_lossy(source);
        let result = self.renderer.render(&markdown);
        let title = result.title.unwrap_or_default();
        let body = self.template.render(&title, &result.html)?;
        Ok(RenderedPage { title, body })
    }
}

impl std::fmt::Debug for RenderPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RenderPipeline")
            .field("renderer", &self.renderer)
            .finish_non_exhaustive()
    }
}
