//! `stamp diff` — show unified diffs for what `apply` would write.

use std::path::PathBuf;

use anyhow::{bail, Result};
use clap::Args;
use similar::TextDiff;

use stamp_core::Contents;
use stamp_transform::HeaderTransform;

use super::{build_stage, HeaderArgs};
use crate::collect::{self, Input};

/// Arguments for `stamp diff`.
#[derive(Args, Debug)]
pub struct DiffArgs {
    /// Files or directories to compare.
    #[arg(required = true)]
    pub paths: Vec<PathBuf>,

    #[command(flatten)]
    pub header: HeaderArgs,
}

/// A single stamped-file diff.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileDiff {
    pub path: PathBuf,
    pub unified_diff: String,
}

impl DiffArgs {
    pub fn run(self) -> Result<()> {
        let config = self.header.load_config()?;
        let stage = build_stage(&config)?;
        let inputs = collect::collect_inputs(&self.paths, &config)?;

        let mut failures = 0usize;
        let mut diffs = Vec::new();
        for input in &inputs {
            match diff_input(&stage, input) {
                Ok(Some(diff)) => diffs.push(diff),
                Ok(None) => {}
                Err(err) => {
                    eprintln!("✗ {err:#}");
                    failures += 1;
                }
            }
        }

        if diffs.is_empty() && failures == 0 {
            println!("No differences.");
        }
        for diff in diffs {
            tracing::debug!("diff for {}", diff.path.display());
            print!("{}", diff.unified_diff);
            if !diff.unified_diff.ends_with('\n') {
                println!();
            }
        }

        if failures > 0 {
            bail!("{failures} file(s) failed");
        }
        Ok(())
    }
}

/// Stamp one input in memory and diff it against what is on disk.
/// Nothing is written.
fn diff_input(stage: &HeaderTransform, input: &Input) -> Result<Option<FileDiff>> {
    let file = collect::load_buffered(input)?;
    let relative = file.relative().to_path_buf();
    let original = buffer_text(file.contents());
    let stamped = stage.transform(file)?;
    let updated = buffer_text(stamped.contents());

    if original == updated {
        return Ok(None);
    }

    let old_header = format!("a/{}", relative.display());
    let new_header = format!("b/{}", relative.display());
    let unified_diff = TextDiff::from_lines(&original, &updated)
        .unified_diff()
        .header(&old_header, &new_header)
        .context_radius(3)
        .to_string();

    Ok(Some(FileDiff {
        path: stamped.path().to_path_buf(),
        unified_diff,
    }))
}

fn buffer_text(contents: &Contents) -> String {
    match contents {
        Contents::Buffer(bytes) => String::from_utf8_lossy(bytes).into_owned(),
        _ => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stamp_renderer::TemplateContext;
    use tempfile::TempDir;

    fn input(dir: &TempDir, name: &str, body: &str) -> Input {
        let path = dir.path().join(name);
        std::fs::write(&path, body).unwrap();
        Input {
            path,
            base: dir.path().to_path_buf(),
        }
    }

    #[test]
    fn header_shows_as_added_lines() {
        let dir = TempDir::new().unwrap();
        let stage = HeaderTransform::new("// ${file.relative}\n", TemplateContext::new());
        let diff = diff_input(&stage, &input(&dir, "lib.rs", "fn main() {}\n"))
            .unwrap()
            .expect("a diff");
        assert!(diff.unified_diff.contains("--- a/lib.rs"));
        assert!(diff.unified_diff.contains("+++ b/lib.rs"));
        assert!(diff.unified_diff.contains("+// lib.rs"));
        assert_eq!(std::fs::read_to_string(dir.path().join("lib.rs")).unwrap(), "fn main() {}\n");
    }

    #[test]
    fn identity_stage_has_no_diff() {
        let dir = TempDir::new().unwrap();
        let diff = diff_input(&HeaderTransform::default(), &input(&dir, "a.txt", "same\n")).unwrap();
        assert!(diff.is_none());
    }
}
