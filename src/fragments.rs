//! Progressive decoding of a streamed reply body.
//!
//! The streaming endpoint sends UTF-8 text with no framing: every byte of the
//! body belongs to one reply. Network chunks may split a multi-byte character,
//! so undecodable tail bytes are carried over to the next chunk instead of
//! being replaced or dropped.

use bytes::Bytes;
use futures::stream::{self, Stream, StreamExt};

use crate::error::{Error, Result};
use crate::observability::STREAM_BYTES;

/// Incremental UTF-8 decoder that tolerates characters split across chunks.
#[derive(Debug, Default)]
pub struct Utf8Decoder {
    pending: Vec<u8>,
}

impl Utf8Decoder {
    /// Creates an empty decoder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Decodes as much of `chunk` (plus any carried-over bytes) as possible.
    ///
    /// Returns the decoded text, which is empty when the chunk only holds the
    /// start of a character.
    ///
    /// # Errors
    ///
    /// Returns an encoding error if the bytes can never form valid UTF-8.
    pub fn decode(&mut self, chunk: &[u8]) -> Result<String> {
        self.pending.extend_from_slice(chunk);
        let valid_up_to = match std::str::from_utf8(&self.pending) {
            Ok(_) => self.pending.len(),
            Err(err) => {
                if err.error_len().is_some() {
                    return Err(Error::encoding(
                        format!("Invalid UTF-8 in stream: {err}"),
                        Some(Box::new(err)),
                    ));
                }
                err.valid_up_to()
            }
        };
        let text = std::str::from_utf8(&self.pending[..valid_up_to])?.to_owned();
        self.pending.drain(..valid_up_to);
        Ok(text)
    }

    /// Returns true if bytes of an unfinished character are being held.
    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }

    /// Checks that the stream did not end in the middle of a character.
    ///
    /// # Errors
    ///
    /// Returns an encoding error if bytes are still pending.
    pub fn finish(self) -> Result<()> {
        if self.has_pending() {
            Err(Error::encoding(
                format!(
                    "stream ended inside a multi-byte character ({} dangling bytes)",
                    self.pending.len()
                ),
                None,
            ))
        } else {
            Ok(())
        }
    }
}

/// Turns a stream of body chunks into a stream of text fragments.
///
/// Fragments are yielded in arrival order; chunks that decode to nothing are
/// skipped. The first error ends the stream.
pub fn decode_fragments<S>(byte_stream: S) -> impl Stream<Item = Result<String>>
where
    S: Stream<Item = Result<Bytes>>,
{
    stream::unfold(
        Some((Box::pin(byte_stream), Utf8Decoder::new())),
        |state| async move {
            let (mut stream, mut decoder) = state?;
            loop {
                match stream.next().await {
                    Some(Ok(bytes)) => {
                        STREAM_BYTES.count(bytes.len() as u64);
                        match decoder.decode(&bytes) {
                            Ok(text) if text.is_empty() => continue,
                            Ok(text) => return Some((Ok(text), Some((stream, decoder)))),
                            Err(e) => return Some((Err(e), None)),
                        }
                    }
                    Some(Err(e)) => return Some((Err(e), None)),
                    None => {
                        // End of body
                        return match decoder.finish() {
                            Ok(()) => None,
                            Err(e) => Some((Err(e), None)),
                        };
                    }
                }
            }
        },
    )
}
