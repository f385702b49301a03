//! Prepending a rendered header to file contents.
//!
//! Buffers are concatenated eagerly. Streams are spliced: the header becomes
//! the first chunk and the original chunks follow untouched, so memory stays
//! bounded by the header size no matter how large the original is.

use futures::future;
use futures::stream::{self, StreamExt};

use stamp_core::{ContentStream, Contents};

/// `header ++ body` as a new buffer.
pub fn prepend_buffer(header: &[u8], body: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(header.len() + body.len());
    out.extend_from_slice(header);
    out.extend_from_slice(body);
    out
}

/// A stream yielding `header` first, then every chunk of `body`.
///
/// Errors from `body` are forwarded as-is and the stream ends when `body` does.
pub fn splice(header: Vec<u8>, body: ContentStream) -> ContentStream {
    stream::once(future::ready(Ok(header))).chain(body).boxed()
}

/// Prepend `header` to `contents`, keeping the representation.
///
/// `Null` contents and an empty header leave `contents` as they are.
pub fn prepend(header: &str, contents: Contents) -> Contents {
    if header.is_empty() {
        return contents;
    }
    match contents {
        Contents::Null => Contents::Null,
        Contents::Buffer(body) => Contents::Buffer(prepend_buffer(header.as_bytes(), &body)),
        Contents::Stream(body) => Contents::Stream(splice(header.as_bytes().to_vec(), body)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn buffer_prepend() {
        assert_eq!(prepend_buffer(b"// hi\n", b"body"), b"// hi\nbody");
        assert_eq!(prepend_buffer(b"", b"body"), b"body");
    }

    #[test]
    fn empty_header_keeps_contents() {
        let out = prepend("", Contents::from("same"));
        assert!(matches!(out, Contents::Buffer(ref b) if b == b"same"));
    }

    #[test]
    fn null_stays_null() {
        assert!(prepend("header", Contents::Null).is_null());
    }

    #[tokio::test]
    async fn splice_yields_header_then_body_chunks() {
        let body = stream::iter(vec![Ok(b"Hello".to_vec()), Ok(b" world".to_vec())]).boxed();
        let chunks: Vec<Vec<u8>> = splice(b"> ".to_vec(), body)
            .map(|c| c.unwrap())
            .collect()
            .await;
        assert_eq!(chunks, vec![b"> ".to_vec(), b"Hello".to_vec(), b" world".to_vec()]);
    }

    #[tokio::test]
    async fn splice_forwards_errors() {
        let body = stream::iter(vec![
            Ok(b"ok".to_vec()),
            Err(io::Error::new(io::ErrorKind::UnexpectedEof, "truncated")),
        ])
        .boxed();
        let items: Vec<io::Result<Vec<u8>>> = splice(b"h".to_vec(), body).collect().await;
        assert_eq!(items.len(), 3);
        assert_eq!(items[2].as_ref().unwrap_err().kind(), io::ErrorKind::UnexpectedEof);
    }
}
