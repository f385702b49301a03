//! Header templates — placeholder scanning, compilation and rendering.
//!
//! # Placeholder forms
//!
//! | Form         | Output                         |
//! |--------------|--------------------------------|
//! | `<%= expr %>`| value as text                  |
//! | `<%- expr %>`| value as HTML-escaped text     |
//! | `${ expr }`  | value as text                  |
//!
//! Dotted paths (`file.path`, `pkg.authors.0`) resolve directly against the
//! context and render as `""` when missing. Anything else is handed to Tera
//! as a `{{ expr }}` expression, compiled once here.

use tera::Tera;

use crate::context::{value_to_string, TemplateContext};
use crate::error::{describe, RenderError, TemplateSyntaxError};

// ---------------------------------------------------------------------------
// Delimiters
// ---------------------------------------------------------------------------

struct Delimiter {
    open: &'static str,
    close: &'static str,
    escape: bool,
}

const DELIMITERS: &[Delimiter] = &[
    Delimiter { open: "<%=", close: "%>", escape: false },
    Delimiter { open: "<%-", close: "%>", escape: true },
    Delimiter { open: "${", close: "}", escape: false },
];

// ---------------------------------------------------------------------------
// Scanning
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token<'a> {
    Text(&'a str),
    Placeholder {
        expr: &'a str,
        escape: bool,
        offset: usize,
    },
}

/// Split `source` into literal text and placeholders in a single pass.
fn scan(source: &str) -> Result<Vec<Token<'_>>, TemplateSyntaxError> {
    let mut tokens = Vec::new();
    let mut text_start = 0;
    let mut i = 0;

    while i < source.len() {
        let rest = &source[i..];
        let Some(delim) = DELIMITERS.iter().find(|d| rest.starts_with(d.open)) else {
            i += rest.chars().next().map_or(1, char::len_utf8);
            continue;
        };

        if text_start < i {
            tokens.push(Token::Text(&source[text_start..i]));
        }

        let body_start = i + delim.open.len();
        let Some(body_len) = source[body_start..].find(delim.close) else {
            return Err(TemplateSyntaxError::at(
                source,
                i,
                format!("unterminated `{}` placeholder, expected `{}`", delim.open, delim.close),
            ));
        };

        let expr = source[body_start..body_start + body_len].trim();
        if expr.is_empty() {
            return Err(TemplateSyntaxError::at(source, i, "empty placeholder"));
        }

        tokens.push(Token::Placeholder {
            expr,
            escape: delim.escape,
            offset: i,
        });
        i = body_start + body_len + delim.close.len();
        text_start = i;
    }

    if text_start < source.len() {
        tokens.push(Token::Text(&source[text_start..]));
    }
    Ok(tokens)
}

/// `foo`, `file.path`, `authors.0`. Tera keywords are not paths.
fn is_dotted_path(expr: &str) -> bool {
    if matches!(expr, "true" | "false" | "True" | "False") {
        return false;
    }
    let mut segments = expr.split('.');
    let first_ok = segments.next().is_some_and(|first| {
        first
            .chars()
            .next()
            .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
            && first.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
    });
    first_ok
        && segments.all(|seg| !seg.is_empty() && seg.chars().all(|c| c.is_ascii_alphanumeric() || c == '_'))
}

// ---------------------------------------------------------------------------
// HeaderTemplate
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
enum Segment {
    Text(String),
    Lookup { path: Vec<String>, escape: bool },
    Expression { name: String, escape: bool },
}

/// A compiled header template.
///
/// Compile once with [`HeaderTemplate::compile`] and render once per file.
/// Rendering is side-effect free and linear in the template length.
#[derive(Debug, Clone)]
pub struct HeaderTemplate {
    source: String,
    segments: Vec<Segment>,
    tera: Tera,
    has_expressions: bool,
}

impl HeaderTemplate {
    /// Parse `source` and compile any expression placeholders.
    pub fn compile(source: &str) -> Result<Self, TemplateSyntaxError> {
        let mut tera = Tera::default();
        let mut segments = Vec::new();
        let mut expressions = 0usize;

        for token in scan(source)? {
            match token {
                Token::Text(text) => segments.push(Segment::Text(text.to_string())),
                Token::Placeholder { expr, escape, .. } if is_dotted_path(expr) => {
                    segments.push(Segment::Lookup {
                        path: expr.split('.').map(str::to_string).collect(),
                        escape,
                    });
                }
                Token::Placeholder { expr, escape, offset } => {
                    let name = format!("__header_expr_{expressions}");
                    expressions += 1;
                    tera.add_raw_template(&name, &format!("{{{{ {expr} }}}}"))
                        .map_err(|e| {
                            TemplateSyntaxError::at(
                                source,
                                offset,
                                format!("invalid expression `{expr}`: {}", describe(&e)),
                            )
                        })?;
                    segments.push(Segment::Expression { name, escape });
                }
            }
        }

        Ok(HeaderTemplate {
            source: source.to_string(),
            segments,
            tera,
            has_expressions: expressions > 0,
        })
    }

    /// A template whose text is used verbatim; placeholders are not recognised.
    pub fn literal(text: &str) -> Self {
        let segments = if text.is_empty() {
            vec![]
        } else {
            vec![Segment::Text(text.to_string())]
        };
        HeaderTemplate {
            source: text.to_string(),
            segments,
            tera: Tera::default(),
            has_expressions: false,
        }
    }

    /// The template exactly as supplied.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// True when rendering always yields `""`.
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// The rendered text when it cannot depend on any context.
    pub fn static_text(&self) -> Option<&str> {
        match self.segments.as_slice() {
            [] => Some(""),
            [Segment::Text(text)] => Some(text),
            _ => None,
        }
    }

    /// Number of placeholders in the template.
    pub fn placeholder_count(&self) -> usize {
        self.segments
            .iter()
            .filter(|s| !matches!(s, Segment::Text(_)))
            .count()
    }

    /// Render against `ctx`.
    pub fn render(&self, ctx: &TemplateContext) -> Result<String, RenderError> {
        let tera_ctx = if self.has_expressions {
            ctx.to_tera_context()?
        } else {
            tera::Context::new()
        };

        let mut out = String::with_capacity(self.source.len());
        for segment in &self.segments {
            match segment {
                Segment::Text(text) => out.push_str(text),
                Segment::Lookup { path, escape } => {
                    let value = ctx.resolve(path).map(value_to_string).unwrap_or_default();
                    push_value(&mut out, &value, *escape);
                }
                Segment::Expression { name, escape } => {
                    let value = self.tera.render(name, &tera_ctx)?;
                    push_value(&mut out, &value, *escape);
                }
            }
        }
        Ok(out)
    }
}

fn push_value(out: &mut String, value: &str, escape: bool) {
    if escape {
        out.push_str(&tera::escape_html(value));
    } else {
        out.push_str(value);
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
