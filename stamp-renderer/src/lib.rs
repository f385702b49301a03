//! # stamp-renderer
//!
//! Renders header templates against a per-file context.
//!
//! ## Usage
//!
//! ```rust
//! use stamp_core::File;
//! use stamp_renderer::{HeaderTemplate, TemplateContext};
//!
//! let template = HeaderTemplate::compile("// <%= file.relative %> (${license})\n").unwrap();
//! let mut file = File::new("src/lib.rs").with_base("src");
//! file.insert_data("license", "MIT");
//!
//! let ctx = TemplateContext::for_file(&file, &TemplateContext::new()).unwrap();
//! assert_eq!(template.render(&ctx).unwrap(), "// lib.rs (MIT)\n");
//! ```

pub mod context;
pub mod error;
pub mod template;

pub use context::TemplateContext;
pub use error::{RenderError, TemplateSyntaxError};
pub use template::HeaderTemplate;
