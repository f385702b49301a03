//! Error types for stamp-renderer.

use thiserror::Error;

/// A header template whose placeholders cannot be parsed.
///
/// `line` and `column` are 1-based and point at the opening delimiter.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("template syntax error at line {line}, column {column}: {message}")]
pub struct TemplateSyntaxError {
    pub line: usize,
    pub column: usize,
    pub message: String,
}

impl TemplateSyntaxError {
    pub(crate) fn at(source: &str, offset: usize, message: impl Into<String>) -> Self {
        let before = &source[..offset];
        let line = before.matches('\n').count() + 1;
        let line_start = before.rfind('\n').map(|i| i + 1).unwrap_or(0);
        let column = before[line_start..].chars().count() + 1;
        TemplateSyntaxError {
            line,
            column,
            message: message.into(),
        }
    }
}

/// All errors that can arise from header rendering.
#[derive(Debug, Error)]
pub enum RenderError {
    /// Malformed placeholder delimiters or expression.
    #[error(transparent)]
    Syntax(#[from] TemplateSyntaxError),

    /// Tera failed to evaluate an expression placeholder.
    #[error("template engine error: {0}")]
    Tera(#[from] tera::Error),

    /// JSON serialization error (building the template context).
    #[error("context serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A static context serialized to something other than a mapping.
    #[error("template context must be a mapping, got {kind}")]
    ContextNotAMapping { kind: &'static str },
}

/// Flatten an error and its sources into one line.
pub(crate) fn describe(err: &dyn std::error::Error) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(inner) = source {
        message.push_str(": ");
        message.push_str(&inner.to_string());
        source = inner.source();
    }
    message
}
