//! Atomic output writer.
//!
//! ## Protocol
//!
//! 1. Resolve the target (in place, or `<out_dir>/<relative>`).
//! 2. Create parent directories.
//! 3. Write contents to `<target>.stamp.tmp`. Streamed contents go chunk by
//!    chunk, never fully buffered.
//! 4. Rename to the target (atomic on POSIX). On any failure the temp file
//!    is removed and the target is left as it was.

use std::path::{Component, Path, PathBuf};

use anyhow::{bail, Context, Result};
use futures::StreamExt;
use tokio::io::AsyncWriteExt;

use stamp_core::{Contents, File};

/// Outcome of an individual file write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteResult {
    /// File was written.
    Written { path: PathBuf },
    /// `--dry-run` mode: the file *would* have been written.
    WouldWrite { path: PathBuf },
    /// The file had no contents; nothing to write.
    Skipped { path: PathBuf },
}

/// Where `file` ends up: its own path, or its relative path under `out_dir`.
///
/// With `out_dir`, a relative path that is absolute or climbs out with `..`
/// (a file outside its base) is rejected rather than written elsewhere.
pub fn target_path(file: &File, out_dir: Option<&Path>) -> Result<PathBuf> {
    let Some(dir) = out_dir else {
        return Ok(file.path().to_path_buf());
    };
    let relative = file.relative();
    let escapes = relative
        .components()
        .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));
    if escapes {
        bail!(
            "'{}' is not under base '{}'; cannot place it in '{}'",
            file.path().display(),
            file.base().display(),
            dir.display()
        );
    }
    Ok(dir.join(relative))
}

/// Write `file`'s contents to `target`.
pub async fn write_file(mut file: File, target: &Path, dry_run: bool) -> Result<WriteResult> {
    let contents = file.replace_contents(Contents::Null);
    if contents.is_null() {
        tracing::debug!("skipped (no contents): {}", target.display());
        return Ok(WriteResult::Skipped {
            path: target.to_path_buf(),
        });
    }

    if dry_run {
        tracing::info!("[dry-run] would write: {}", target.display());
        return Ok(WriteResult::WouldWrite {
            path: target.to_path_buf(),
        });
    }

    if let Some(parent) = target.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .with_context(|| format!("cannot create '{}'", parent.display()))?;
    }

    let tmp = PathBuf::from(format!("{}.stamp.tmp", target.display()));
    if let Err(err) = write_then_rename(contents, &tmp, target).await {
        let _ = tokio::fs::remove_file(&tmp).await;
        return Err(err);
    }

    tracing::info!("wrote: {}", target.display());
    Ok(WriteResult::Written {
        path: target.to_path_buf(),
    })
}

async fn write_then_rename(contents: Contents, tmp: &Path, target: &Path) -> Result<()> {
    let mut out = tokio::fs::File::create(tmp)
        .await
        .with_context(|| format!("cannot create '{}'", tmp.display()))?;

    match contents {
        Contents::Null => {}
        Contents::Buffer(bytes) => out
            .write_all(&bytes)
            .await
            .with_context(|| format!("cannot write '{}'", tmp.display()))?,
        Contents::Stream(mut chunks) => {
            while let Some(chunk) = chunks.next().await {
                let chunk = chunk.with_context(|| format!("cannot read contents for '{}'", target.display()))?;
                out.write_all(&chunk)
                    .await
                    .with_context(|| format!("cannot write '{}'", tmp.display()))?;
            }
        }
    }
    out.flush()
        .await
        .with_context(|| format!("cannot write '{}'", tmp.display()))?;
    drop(out);

    tokio::fs::rename(tmp, target)
        .await
        .with_context(|| format!("cannot replace '{}'", target.display()))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;
    use tempfile::TempDir;

    #[tokio::test]
    async fn buffer_is_written_and_tmp_removed() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("out.txt");
        let file = File::new(&path).with_contents("hello");

        let result = write_file(file, &path, false).await.unwrap();
        assert!(matches!(result, WriteResult::Written { .. }));
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "hello");
        assert!(!tmp.path().join("out.txt.stamp.tmp").exists());
    }

    #[tokio::test]
    async fn stream_is_written_chunk_by_chunk() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("streamed.txt");
        let file = File::new(&path)
            .with_contents(Contents::from_chunks(vec![b"a".to_vec(), b"b".to_vec(), b"c".to_vec()]));

        write_file(file, &path, false).await.unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "abc");
    }

    #[tokio::test]
    async fn dry_run_does_not_write_file() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("nope.txt");
        let result = write_file(File::new(&path).with_contents("x"), &path, true)
            .await
            .unwrap();
        assert!(matches!(result, WriteResult::WouldWrite { .. }));
        assert!(!path.exists(), "dry-run must not create files");
    }

    #[tokio::test]
    async fn creates_parent_directories() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("deep").join("er").join("file.txt");
        write_file(File::new("file.txt").with_contents("x"), &path, false)
            .await
            .unwrap();
        assert!(path.exists());
    }

    #[tokio::test]
    async fn null_contents_are_skipped() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("none.txt");
        let result = write_file(File::new(&path), &path, false).await.unwrap();
        assert!(matches!(result, WriteResult::Skipped { .. }));
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn stream_failure_leaves_original_and_cleans_tmp() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("keep.txt");
        std::fs::write(&path, "original").unwrap();

        let failing = futures::stream::iter(vec![
            Ok(b"partial".to_vec()),
            Err(io::Error::new(io::ErrorKind::Other, "read failed")),
        ])
        .boxed();
        let file = File::new(&path).with_contents(Contents::Stream(failing));

        let err = write_file(file, &path, false).await.expect_err("stream error");
        assert!(format!("{err:#}").contains("read failed"));
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "original");
        assert!(!tmp.path().join("keep.txt.stamp.tmp").exists());
    }

    #[test]
    fn target_path_under_out_dir_uses_relative() {
        let file = File::new("src/nested/lib.rs").with_base("src");
        assert_eq!(
            target_path(&file, Some(Path::new("dist"))).unwrap(),
            PathBuf::from("dist/nested/lib.rs")
        );
        assert_eq!(target_path(&file, None).unwrap(), PathBuf::from("src/nested/lib.rs"));
    }

    #[test]
    fn target_path_rejects_files_outside_base() {
        let dist = Path::new("dist");

        let absolute = File::new("/srv/src/a.txt").with_base("/home/other");
        let err = target_path(&absolute, Some(dist)).expect_err("absolute relative path");
        assert!(format!("{err:#}").contains("not under base"));

        let climbing = File::new("../secret.txt");
        assert!(target_path(&climbing, Some(dist)).is_err());

        assert_eq!(target_path(&absolute, None).unwrap(), PathBuf::from("/srv/src/a.txt"));
    }
}
