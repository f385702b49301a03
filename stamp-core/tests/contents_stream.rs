//! Streaming real files through [`Contents`].
//!
//! Each `#[case]` is isolated; no shared state.

use std::io;

use futures::StreamExt;
use rstest::rstest;
use stamp_core::{Contents, File};
use tempfile::TempDir;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

async fn file_stream(dir: &TempDir, body: &[u8], chunk_size: usize) -> File {
    let path = dir.path().join("fixture.txt");
    std::fs::write(&path, body).unwrap();
    let reader = tokio::fs::File::open(&path).await.unwrap();
    File::new(&path)
        .with_base(dir.path())
        .with_contents(Contents::from_reader_with_chunk_size(reader, chunk_size))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[rstest]
#[case::single_chunk(1024)]
#[case::byte_at_a_time(1)]
#[case::uneven(4)]
#[tokio::test]
async fn reader_stream_reproduces_file(#[case] chunk_size: usize) {
    let dir = TempDir::new().unwrap();
    let file = file_stream(&dir, b"Hello world", chunk_size).await;
    assert_eq!(file.relative(), std::path::Path::new("fixture.txt"));

    let mut file = file;
    let bytes = file.replace_contents(Contents::Null).into_bytes().await.unwrap();
    assert_eq!(bytes, b"Hello world");
}

#[tokio::test]
async fn empty_file_yields_no_chunks() {
    let dir = TempDir::new().unwrap();
    let mut file = file_stream(&dir, b"", 16).await;
    let Contents::Stream(chunks) = file.replace_contents(Contents::Null) else {
        panic!("expected stream contents");
    };
    assert_eq!(chunks.count().await, 0);
}

#[tokio::test]
async fn stream_error_aborts_drain() {
    let failing = futures::stream::iter(vec![
        Ok(b"partial".to_vec()),
        Err(io::Error::new(io::ErrorKind::BrokenPipe, "upstream closed")),
    ])
    .boxed();
    let err = Contents::Stream(failing).into_bytes().await.expect_err("drain fails");
    assert_eq!(err.kind(), io::ErrorKind::BrokenPipe);
}
