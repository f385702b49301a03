//! Subcommands and the header options they share.

pub mod apply;
pub mod diff;
pub mod render;

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::Args;
use serde_json::{Map, Value};

use stamp_core::{config, StampConfig};
use stamp_renderer::TemplateContext;
use stamp_transform::HeaderTransform;

/// Header selection and template context, layered over `.stamp.yaml`.
#[derive(Args, Debug, Clone, Default)]
pub struct HeaderArgs {
    /// Header template, e.g. "// <%= file.relative %>\n".
    #[arg(long, conflicts_with = "header_file")]
    pub header: Option<String>,

    /// Read the header template from a file.
    #[arg(long, value_name = "FILE")]
    pub header_file: Option<PathBuf>,

    /// Static context entry. Dotted keys nest (`pkg.name=demo`); values are
    /// parsed as JSON when they can be, and kept as strings otherwise.
    #[arg(long = "set", value_name = "KEY=VALUE", value_parser = parse_key_value)]
    pub set: Vec<(String, Value)>,

    /// YAML or JSON mapping merged into the static context.
    #[arg(long, value_name = "FILE")]
    pub context_file: Option<PathBuf>,

    /// Prepend the header verbatim, without placeholder substitution.
    #[arg(long)]
    pub raw: bool,

    /// Root used to compute each file's relative path.
    #[arg(long, value_name = "DIR")]
    pub base: Option<PathBuf>,

    /// Only pick up files with this extension when walking directories.
    #[arg(long = "ext", value_name = "EXT")]
    pub extensions: Vec<String>,

    /// Config file to use instead of `./.stamp.yaml`.
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,
}

impl HeaderArgs {
    /// The config file (or defaults) with command-line overrides applied.
    pub fn load_config(&self) -> Result<StampConfig> {
        let mut config = match &self.config {
            Some(path) => config::load_file(path)
                .with_context(|| format!("failed to load config '{}'", path.display()))?,
            None => {
                let cwd = std::env::current_dir().context("could not determine working directory")?;
                config::load_at(&cwd).context("failed to load .stamp.yaml")?
            }
        };

        if self.header.is_some() || self.header_file.is_some() {
            config.header = self.header.clone();
            config.header_file = self.header_file.clone();
        }
        if let Some(path) = &self.context_file {
            for (key, value) in read_context_file(path)? {
                config.context.insert(key, value);
            }
        }
        for (key, value) in &self.set {
            insert_dotted(&mut config.context, key, value.clone());
        }
        if self.raw {
            config.raw = true;
        }
        if self.base.is_some() {
            config.base = self.base.clone();
        }
        if !self.extensions.is_empty() {
            config.extensions = self.extensions.clone();
        }
        Ok(config)
    }
}

/// Build the header stage described by `config`.
pub fn build_stage(config: &StampConfig) -> Result<HeaderTransform> {
    let header = config
        .header_text()
        .context("failed to read header")?
        .unwrap_or_default();
    if header.is_empty() {
        tracing::warn!("no header configured; files will pass through unchanged");
    }
    if config.raw {
        return Ok(HeaderTransform::raw(&header));
    }
    let context = TemplateContext::from(config.context.clone());
    HeaderTransform::try_new(&header, context).context("invalid header template")
}

/// Current-thread runtime; the stage never needs more than one thread.
pub fn runtime() -> Result<tokio::runtime::Runtime> {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("failed to start tokio runtime")
}

fn read_context_file(path: &Path) -> Result<Map<String, Value>> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("cannot read context file '{}'", path.display()))?;
    let value: Value = serde_yaml::from_str(&raw)
        .with_context(|| format!("cannot parse context file '{}'", path.display()))?;
    match value {
        Value::Object(map) => Ok(map),
        Value::Null => Ok(Map::new()),
        _ => bail!("context file '{}' must contain a mapping", path.display()),
    }
}

fn parse_key_value(s: &str) -> std::result::Result<(String, Value), String> {
    let (key, raw) = s
        .split_once('=')
        .ok_or_else(|| format!("expected KEY=VALUE, got '{s}'"))?;
    let key = key.trim();
    if key.is_empty() || key.split('.').any(str::is_empty) {
        return Err(format!("invalid context key '{key}'"));
    }
    let value = serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()));
    Ok((key.to_string(), value))
}

/// Insert `value` at a dotted key, creating (or replacing non-mapping)
/// intermediate entries.
fn insert_dotted(map: &mut Map<String, Value>, key: &str, value: Value) {
    match key.split_once('.') {
        None => {
            map.insert(key.to_string(), value);
        }
        Some((head, rest)) => {
            let entry = map
                .entry(head.to_string())
                .or_insert_with(|| Value::Object(Map::new()));
            if !entry.is_object() {
                *entry = Value::Object(Map::new());
            }
            if let Value::Object(inner) = entry {
                insert_dotted(inner, rest, value);
            }
        }
    }
}
