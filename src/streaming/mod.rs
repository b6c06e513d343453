// Streaming bodies for uploads and downloads

use bytes::Bytes;
use futures::stream::{self, BoxStream, Stream, StreamExt};
use tokio::io::{AsyncRead, AsyncReadExt};

use crate::error::{Result, StorageError};

/// Lazy, finite, non-restartable sequence of object body chunks
pub type ObjectStream = BoxStream<'static, Result<Bytes>>;

/// Wrap a response body as an `ObjectStream`
pub fn response_stream(response: reqwest::Response) -> ObjectStream {
    response
        .bytes_stream()
        .map(|chunk| chunk.map_err(StorageError::from))
        .boxed()
}

/// Pull `reader` in chunks of exactly `chunk_size` bytes (the last may be shorter).
///
/// Nothing is read until the stream is polled, and the reader is dropped as
/// soon as the stream finishes or is dropped.
pub fn read_chunks<R>(
    reader: R,
    chunk_size: usize,
) -> impl Stream<Item = std::io::Result<Bytes>> + Send + Sync + 'static
where
    R: AsyncRead + Unpin + Send + Sync + 'static,
{
    stream::try_unfold(reader, move |reader| next_chunk(reader, chunk_size))
}

async fn next_chunk<R>(mut reader: R, chunk_size: usize) -> std::io::Result<Option<(Bytes, R)>>
where
    R: AsyncRead + Unpin,
{
    let mut buf = vec![0u8; chunk_size];
    let mut filled = 0;

    while filled < chunk_size {
        let n = reader.read(&mut buf[filled..]).await?;
        if n == 0 {
            break;
        }
        filled += n;
    }

    if filled == 0 {
        return Ok(None);
    }

    buf.truncate(filled);
    Ok(Some((Bytes::from(buf), reader)))
}

/// Streaming request body over `reader`
pub fn upload_body<R>(reader: R, chunk_size: usize) -> reqwest::Body
where
    R: AsyncRead + Unpin + Send + Sync + 'static,
{
    reqwest::Body::wrap_stream(read_chunks(reader, chunk_size))
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::TryStreamExt;
    use std::io::Cursor;

    async fn collect(data: Vec<u8>, chunk_size: usize) -> Vec<Bytes> {
        read_chunks(Cursor::new(data), chunk_size)
            .try_collect()
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_exact_multiple() {
        let chunks = collect(vec![7u8; 12], 4).await;
        assert_eq!(chunks.len(), 3);
        assert!(chunks.iter().all(|c| c.len() == 4));
    }

    #[tokio::test]
    async fn test_short_last_chunk() {
        let data: Vec<u8> = (0..10).collect();
        let chunks = collect(data.clone(), 4).await;

        let sizes: Vec<usize> = chunks.iter().map(|c| c.len()).collect();
        assert_eq!(sizes, vec![4, 4, 2]);
        assert_eq!(chunks.concat(), data);
    }

    #[tokio::test]
    async fn test_empty_reader_yields_nothing() {
        let chunks = collect(Vec::new(), 4).await;
        assert!(chunks.is_empty());
    }

    #[tokio::test]
    async fn test_chunk_larger_than_input() {
        let chunks = collect(b"hello".to_vec(), 1 << 20).await;
        assert_eq!(chunks, vec![Bytes::from_static(b"hello")]);
    }

    #[tokio::test]
    async fn test_fills_chunks_from_fragmented_reads() {
        // A duplex pipe delivers the input in small writes
        let (mut tx, rx) = tokio::io::duplex(3);
        let writer = tokio::spawn(async move {
            use tokio::io::AsyncWriteExt;
            for part in [&b"ab"[..], &b"cde"[..], &b"f"[..], &b"ghij"[..]] {
                tx.write_all(part).await.unwrap();
            }
        });

        let chunks: Vec<Bytes> = read_chunks(rx, 4).try_collect().await.unwrap();
        writer.await.unwrap();

        assert_eq!(
            chunks,
            vec![
                Bytes::from_static(b"abcd"),
                Bytes::from_static(b"efgh"),
                Bytes::from_static(b"ij"),
            ]
        );
    }
}
