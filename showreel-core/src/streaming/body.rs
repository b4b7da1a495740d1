//! Chunked response bodies backed by a storage reader.
//!
//! The stream is pull-based: the next chunk is read from storage only when
//! the transport polls for it, so a slow client throttles storage reads
//! instead of growing a buffer. Dropping the stream closes the reader.

use bytes::{Bytes, BytesMut};
use futures::{Stream, stream};
use tokio::io::AsyncReadExt;
use tracing::{debug, error, trace};

use crate::storage::MediaReader;

/// Reader state carried between chunks.
struct BodyState {
    reader: MediaReader,
    remaining: u64,
    chunk_size: usize,
    resource_id: String,
}

impl Drop for BodyState {
    fn drop(&mut self) {
        // Client went away before the last byte; not an error
        if self.remaining > 0 {
            debug!(
                "Stream of {} closed with {} bytes unsent",
                self.resource_id, self.remaining
            );
        }
    }
}

/// Creates a body stream yielding exactly `length` bytes from `reader` in
/// chunks of at most `chunk_size` bytes.
///
/// A read error or a premature end of the resource yields one `Err` item
/// and ends the stream, which makes the transport abort the response
/// rather than complete it short.
pub fn media_body_stream(
    reader: MediaReader,
    length: u64,
    chunk_size: usize,
    resource_id: &str,
) -> impl Stream<Item = Result<Bytes, std::io::Error>> + Send + 'static {
    let state = BodyState {
        reader,
        remaining: length,
        chunk_size: chunk_size.max(1),
        resource_id: resource_id.to_string(),
    };

    stream::unfold(Some(state), |state| async move {
        let mut state = state?;
        if state.remaining == 0 {
            trace!("Stream of {} complete", state.resource_id);
            return None;
        }

        let want = state.remaining.min(state.chunk_size as u64);
        match read_chunk(&mut state.reader, want).await {
            Ok(chunk) if !chunk.is_empty() => {
                state.remaining -= chunk.len() as u64;
                Some((Ok(chunk), Some(state)))
            }
            Ok(_) => {
                let missing = state.remaining;
                error!(
                    "Stream of {} ended {} bytes early; resource changed while streaming",
                    state.resource_id, missing
                );
                state.remaining = 0;
                Some((
                    Err(std::io::Error::new(
                        std::io::ErrorKind::UnexpectedEof,
                        format!("{} ended {missing} bytes early", state.resource_id),
                    )),
                    None,
                ))
            }
            Err(e) => {
                error!("Read error while streaming {}: {}", state.resource_id, e);
                state.remaining = 0;
                Some((Err(e), None))
            }
        }
    })
}

/// Reads up to `want` bytes, returning fewer only at end of input.
async fn read_chunk(reader: &mut MediaReader, want: u64) -> Result<Bytes, std::io::Error> {
    let mut buffer = BytesMut::with_capacity(want as usize);
    let mut limited = reader.take(want);
    while limited.read_buf(&mut buffer).await? > 0 {}
    Ok(buffer.freeze())
}
