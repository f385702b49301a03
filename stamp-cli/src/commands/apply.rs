//! `stamp apply` — prepend the header and write every file.

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Args;

use stamp_transform::HeaderTransform;

use super::{build_stage, runtime, HeaderArgs};
use crate::collect::{self, Input};
use crate::writer::{self, WriteResult};

/// Bound on files queued in the stage at once.
const STAGE_CAPACITY: usize = 16;

/// Arguments for `stamp apply`.
#[derive(Args, Debug)]
pub struct ApplyArgs {
    /// Files or directories to process.
    #[arg(required = true)]
    pub paths: Vec<PathBuf>,

    #[command(flatten)]
    pub header: HeaderArgs,

    /// Write results under this directory (at each file's relative path)
    /// instead of in place.
    #[arg(long, value_name = "DIR")]
    pub out_dir: Option<PathBuf>,

    /// Show what would be written without actually writing any files.
    #[arg(long)]
    pub dry_run: bool,

    /// Read files as streams instead of loading them whole.
    #[arg(long)]
    pub stream: bool,
}

impl ApplyArgs {
    pub fn run(self) -> Result<()> {
        let config = self.header.load_config()?;
        let stage = build_stage(&config)?;
        let inputs = collect::collect_inputs(&self.paths, &config)?;

        let (writes, failures) = runtime()?.block_on(self.process(stage, inputs));
        print_results(&writes, self.dry_run);

        if failures > 0 {
            bail!("{failures} file(s) failed");
        }
        Ok(())
    }

    /// Feed inputs through a spawned stage and write what comes out.
    /// Per-file failures are reported and counted; the rest carry on.
    async fn process(&self, stage: HeaderTransform, inputs: Vec<Input>) -> (Vec<WriteResult>, usize) {
        let (stage_writer, mut output) = stage.spawn(STAGE_CAPACITY);

        let produce = async move {
            let mut failures = 0usize;
            for input in &inputs {
                match collect::load(input, self.stream).await {
                    Ok(file) => {
                        if let Err(err) = stage_writer.write(file).await {
                            tracing::error!(error = %err, "stage stopped accepting files");
                            failures += 1;
                            break;
                        }
                    }
                    Err(err) => {
                        eprintln!("✗ {err:#}");
                        failures += 1;
                    }
                }
            }
            stage_writer.end();
            failures
        };

        let consume = async {
            let mut writes = Vec::new();
            let mut failures = 0usize;
            while let Some(result) = output.next().await {
                let outcome = match result {
                    Ok(file) => match writer::target_path(&file, self.out_dir.as_deref()) {
                        Ok(target) => writer::write_file(file, &target, self.dry_run)
                            .await
                            .with_context(|| format!("failed to write '{}'", target.display())),
                        Err(err) => Err(err),
                    },
                    Err(err) => Err(err.into()),
                };
                match outcome {
                    Ok(write) => writes.push(write),
                    Err(err) => {
                        eprintln!("✗ {err:#}");
                        failures += 1;
                    }
                }
            }
            (writes, failures)
        };

        let (read_failures, (writes, write_failures)) = tokio::join!(produce, consume);
        (writes, read_failures + write_failures)
    }
}

fn print_results(writes: &[WriteResult], dry_run: bool) {
    let prefix = if dry_run { "[dry-run] " } else { "" };
    let written = writes
        .iter()
        .filter(|r| matches!(r, WriteResult::Written { .. } | WriteResult::WouldWrite { .. }))
        .count();
    let skipped = writes.len() - written;

    println!("{prefix}✓ {written} file(s) stamped, {skipped} skipped");
    for r in writes {
        match r {
            WriteResult::Written { path } => println!("  ✎  {}", path.display()),
            WriteResult::WouldWrite { path } => println!("  ~  {}", path.display()),
            WriteResult::Skipped { path } => println!("  ·  {}", path.display()),
        }
    }
}
