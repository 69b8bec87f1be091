//! Page templates.

use std::path::{Path, PathBuf};

use minijinja::{AutoEscape, Environment, UndefinedBehavior, Value, context};

/// Name the page template is registered under.
const PAGE_TEMPLATE: &str = "page.html";

/// Built-in page template used when no template file is configured.
pub const DEFAULT_TEMPLATE: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>{{ title }}</title>
</head>
<body>
<article>
{{ document }}
</article>
</body>
</html>
"#;

/// Error returned by page templates.
#[derive(Debug, thiserror::Error)]
pub enum TemplateError {
    /// Template file could not be read.
    #[error("Failed to read template {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// Template source failed to parse.
    #[error("Invalid template: {0}")]
    Compile(#[source] minijinja::Error),
    /// Template execution failed.
    #[error("Template execution failed: {0}")]
    Render(#[source] minijinja::Error),
}

/// Composes a rendered markdown fragment into the final page.
///
/// Implementations must be deterministic: the same `title` and `document`
/// always produce the same bytes.
pub trait PageTemplate: Send + Sync {
    /// Render the page for a document.
    ///
    /// `document` is trusted HTML and must be emitted verbatim. `title` is
    /// plain text.
    fn render(&self, title: &str, document: &str) -> Result<Vec<u8>, TemplateError>;
}

/// [`PageTemplate`] backed by a `minijinja` template.
///
/// The template sees two values: `title` (HTML-escaped on output) and
/// `document` (marked safe). Referencing any other variable is an error.
pub struct MinijinjaTemplate {
    env: Environment<'static>,
}

impl MinijinjaTemplate {
    /// Compile a template from source.
    pub fn from_source(source: impl Into<String>) -> Result<Self, TemplateError> {
        let mut env = Environment::new();
        env.set_auto_escape_callback(|_| AutoEscape::Html);
        env.set_undefined_behavior(UndefinedBehavior::Strict);
        env.add_template_owned(PAGE_TEMPLATE, source.into())
            .map_err(TemplateError::Compile)?;
        Ok(Self { env })
    }

    /// Read and compile a template file.
    pub fn from_file(path: &Path) -> Result<Self, TemplateError> {
        let source = std::fs::read_to_string(path).map_err(|source| TemplateError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        tracing::debug!(path = %path.display(), "Loaded page template");
        Self::from_source(source)
    }

    /// The built-in template.
    pub fn builtin() -> Result<Self, TemplateError> {
        Self::from_source(DEFAULT_TEMPLATE)
    }
}

impl PageTemplate for MinijinjaTemplate {
    fn render(&self, title: &str, document: &str) -> Result<Vec<u8>, TemplateError> {
        let template = self
            .env
            .get_template(PAGE_TEMPLATE)
            .map_err(TemplateError::Render)?;
        let html = template
            .render(context! {
                title => title,
                document => Value::from_safe_string(document.to_owned()),
            })
            .map_err(TemplateError::Render)?;
        Ok(html.into_bytes())
    }
}

impl std::fmt::Debug for MinijinjaTemplate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MinijinjaTemplate").finish_non_exhaustive()
    }
}
