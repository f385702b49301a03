//! Turning command-line paths into [`File`]s.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use stamp_core::{Contents, File, StampConfig};

/// A file to process and the base its relative path is computed from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Input {
    pub path: PathBuf,
    pub base: PathBuf,
}

/// Expand `paths` into inputs.
///
/// Directories are walked recursively in sorted order, skipping hidden
/// entries and files the extension filter rejects; their base is the
/// directory itself. Files named explicitly are always included, with their
/// parent as base. `config.base` overrides both. A file reached more than
/// once is kept only where it first appears.
pub fn collect_inputs(paths: &[PathBuf], config: &StampConfig) -> Result<Vec<Input>> {
    let mut inputs: Vec<Input> = Vec::new();
    for path in paths {
        let meta = std::fs::metadata(path)
            .with_context(|| format!("cannot access '{}'", path.display()))?;
        if meta.is_dir() {
            let mut files = Vec::new();
            walk(path, config, &mut files)?;
            files.sort();
            let base = config.base.clone().unwrap_or_else(|| path.clone());
            inputs.extend(files.into_iter().map(|file| Input {
                path: file,
                base: base.clone(),
            }));
        } else {
            let base = config.base.clone().unwrap_or_else(|| {
                path.parent().map(Path::to_path_buf).unwrap_or_default()
            });
            inputs.push(Input {
                path: path.clone(),
                base,
            });
        }
    }

    let mut seen = HashSet::new();
    inputs.retain(|input| seen.insert(File::new(&input.path).path().to_path_buf()));
    Ok(inputs)
}

fn walk(dir: &Path, config: &StampConfig, out: &mut Vec<PathBuf>) -> Result<()> {
    let entries =
        std::fs::read_dir(dir).with_context(|| format!("cannot read directory '{}'", dir.display()))?;
    for entry in entries {
        let entry = entry.with_context(|| format!("cannot read directory '{}'", dir.display()))?;
        if entry.file_name().to_string_lossy().starts_with('.') {
            continue;
        }
        let path = entry.path();
        let file_type = entry
            .file_type()
            .with_context(|| format!("cannot stat '{}'", path.display()))?;
        if file_type.is_dir() {
            walk(&path, config, out)?;
        } else if file_type.is_file() && config.matches_extension(&path) {
            out.push(path);
        }
    }
    Ok(())
}

/// Read one input, buffered or as a lazily-read stream.
pub async fn load(input: &Input, stream: bool) -> Result<File> {
    let contents = if stream {
        let reader = tokio::fs::File::open(&input.path)
            .await
            .with_context(|| format!("cannot open '{}'", input.path.display()))?;
        Contents::from_reader(reader)
    } else {
        let bytes = tokio::fs::read(&input.path)
            .await
            .with_context(|| format!("cannot read '{}'", input.path.display()))?;
        Contents::Buffer(bytes)
    };
    to_file(input, contents)
}

/// Buffered variant of [`load`] for synchronous callers.
pub fn load_buffered(input: &Input) -> Result<File> {
    let bytes = std::fs::read(&input.path)
        .with_context(|| format!("cannot read '{}'", input.path.display()))?;
    to_file(input, Contents::Buffer(bytes))
}

/// Both loaders build files here so `diff` and `apply` render the same header.
fn to_file(input: &Input, contents: Contents) -> Result<File> {
    let cwd = std::env::current_dir().context("could not determine working directory")?;
    Ok(File::new(&input.path)
        .with_cwd(cwd)
        .with_base(&input.base)
        .with_contents(contents))
}
