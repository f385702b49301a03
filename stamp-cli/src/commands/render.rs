//! `stamp render` — print the header a file would receive.

use std::io::Write;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use stamp_core::File;

use super::{build_stage, HeaderArgs};

/// Arguments for `stamp render`.
#[derive(Args, Debug)]
pub struct RenderArgs {
    /// Path of the file to render for. It does not need to exist.
    #[arg(long, value_name = "PATH", default_value = "file")]
    pub file: PathBuf,

    #[command(flatten)]
    pub header: HeaderArgs,
}

impl RenderArgs {
    pub fn run(self) -> Result<()> {
        let config = self.header.load_config()?;
        let stage = build_stage(&config)?;

        let cwd = std::env::current_dir().context("could not determine working directory")?;
        let base = config
            .base
            .clone()
            .or_else(|| self.file.parent().map(PathBuf::from))
            .unwrap_or_default();
        let file = File::new(&self.file).with_cwd(cwd).with_base(base);

        let header = stage
            .render_header(&file)
            .with_context(|| format!("failed to render header for '{}'", self.file.display()))?;

        let mut stdout = std::io::stdout().lock();
        stdout.write_all(header.as_bytes()).context("failed to write to stdout")?;
        stdout.flush().context("failed to write to stdout")?;
        Ok(())
    }
}
