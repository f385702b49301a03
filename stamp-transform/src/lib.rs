//! # stamp-transform
//!
//! The header stage: renders a header for each file and prepends it to the
//! file's contents, buffered or streamed.
//!
//! ```rust
//! use stamp_core::{Contents, File};
//! use stamp_renderer::TemplateContext;
//! use stamp_transform::HeaderTransform;
//!
//! let stage = HeaderTransform::new("// ${file.relative}\n", TemplateContext::new());
//! let file = File::new("src/main.rs").with_base("src").with_contents("fn main() {}\n");
//! let out = stage.transform(file).unwrap();
//! assert!(matches!(out.contents(), Contents::Buffer(b) if b.starts_with(b"// main.rs\n")));
//! ```

pub mod error;
pub mod prepend;
pub mod stage;

pub use error::TransformError;
pub use stage::{HeaderTransform, StageOutput, StageWriter};
