//! stamp core library — file model, configuration, errors.
//!
//! - [`types`] — [`File`], [`Contents`] and the per-file data bag
//! - [`config`] — `.stamp.yaml` loading
//! - [`error`] — [`ConfigError`]

pub mod config;
pub mod error;
pub mod types;

pub use config::StampConfig;
pub use error::ConfigError;
pub use types::{ContentStream, Contents, DataBag, File, FileView};
