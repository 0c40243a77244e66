use crate::error::CommonRequestError;
use futures_util::{Stream, StreamExt};
use std::pin::Pin;

const REPLACEMENT: char = '\u{FFFD}';

/// Incremental UTF-8 decoder for a chunked byte stream.
///
/// A code point split across two chunks is held back and completed by the
/// next call, so boundary splits never produce replacement characters.
/// Bytes that can never be valid UTF-8 are replaced with U+FFFD, one per
/// maximal invalid subsequence, and decoding continues.
#[derive(Debug, Default, Clone)]
pub struct Utf8ChunkDecoder {
    pending: Vec<u8>,
}

impl Utf8ChunkDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode one chunk, returning all text that is complete so far.
    pub fn decode(&mut self, chunk: &[u8]) -> String {
        let mut buf = std::mem::take(&mut self.pending);
        buf.extend_from_slice(chunk);

        let mut out = String::with_capacity(buf.len());
        let mut rest = buf.as_slice();
        loop {
            match std::str::from_utf8(rest) {
                Ok(text) => {
                    out.push_str(text);
                    break;
                }
                Err(e) => {
                    let (valid, after) = rest.split_at(e.valid_up_to());
                    out.push_str(&String::from_utf8_lossy(valid));
                    match e.error_len() {
                        Some(len) => {
                            out.push(REPLACEMENT);
                            rest = &after[len..];
                        }
                        None => {
                            // Incomplete sequence at the end: wait for more bytes.
                            self.pending = after.to_vec();
                            break;
                        }
                    }
                }
            }
        }
        out
    }

    /// Bytes held back waiting for the rest of a code point.
    pub fn pending(&self) -> &[u8] {
        &self.pending
    }

    /// Flush at end of stream. A dangling partial code point becomes U+FFFD.
    pub fn finish(&mut self) -> String {
        if self.pending.is_empty() {
            return String::new();
        }
        self.pending.clear();
        REPLACEMENT.to_string()
    }
}

type ByteStream =
    Pin<Box<dyn Stream<Item = Result<bytes::Bytes, reqwest::Error>> + Send>>;

/// Reads a response body chunk by chunk and yields one decoded text
/// fragment per network chunk.
pub struct TextChunkReader {
    byte_stream: ByteStream,
    decoder: Utf8ChunkDecoder,
    finished: bool,
}

impl TextChunkReader {
    pub fn new(response: reqwest::Response) -> Self {
        Self::from_stream(response.bytes_stream())
    }

    pub fn from_stream<S>(stream: S) -> Self
    where
        S: Stream<Item = Result<bytes::Bytes, reqwest::Error>> + Send + 'static,
    {
        Self {
            byte_stream: Box::pin(stream),
            decoder: Utf8ChunkDecoder::new(),
            finished: false,
        }
    }

    /// Get the next decoded fragment, or `None` at end of stream.
    ///
    /// A chunk that only carries the start of a code point yields an empty
    /// fragment; callers should keep reading.
    pub async fn next_fragment(&mut self) -> Result<Option<String>, CommonRequestError> {
        if self.finished {
            return Ok(None);
        }

        match self.byte_stream.next().await {
            Some(chunk) => {
                let chunk = chunk?;
                Ok(Some(self.decoder.decode(&chunk)))
            }
            None => {
                self.finished = true;
                let tail = self.decoder.finish();
                if tail.is_empty() {
                    Ok(None)
                } else {
                    log::debug!("stream ended inside a multi-byte sequence");
                    Ok(Some(tail))
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode_split(bytes: &[u8], at: usize) -> String {
        let mut decoder = Utf8ChunkDecoder::new();
        let mut out = decoder.decode(&bytes[..at]);
        out.push_str(&decoder.decode(&bytes[at..]));
        out.push_str(&decoder.finish());
        out
    }

    #[test]
    fn split_inside_code_point_matches_unsplit() {
        let text = "答案: naïve café 🚀 done";
        let bytes = text.as_bytes();
        for at in 0..=bytes.len() {
            assert_eq!(decode_split(bytes, at), text, "split at byte {at}");
        }
    }

    #[test]
    fn partial_code_point_is_held_back() {
        let mut decoder = Utf8ChunkDecoder::new();
        let rocket = "🚀".as_bytes();
        assert_eq!(decoder.decode(&rocket[..1]), "");
        assert_eq!(decoder.decode(&rocket[1..3]), "");
        assert_eq!(decoder.pending().len(), 3);
        assert_eq!(decoder.decode(&rocket[3..]), "🚀");
        assert!(decoder.pending().is_empty());
    }

    #[test]
    fn invalid_bytes_are_replaced_and_decoding_continues() {
        let mut decoder = Utf8ChunkDecoder::new();
        assert_eq!(decoder.decode(b"ab\xffcd"), "ab\u{fffd}cd");
        assert_eq!(decoder.decode(b"\xc3\x28"), "\u{fffd}(");
    }

    #[test]
    fn dangling_tail_is_flushed_as_replacement() {
        let mut decoder = Utf8ChunkDecoder::new();
        assert_eq!(decoder.decode(&[b'x', 0xe4, 0xbd]), "x");
        assert_eq!(decoder.finish(), "\u{fffd}");
        assert_eq!(decoder.finish(), "");
    }

    #[tokio::test]
    async fn reader_yields_one_fragment_per_chunk() {
        let chunks: Vec<Result<bytes::Bytes, reqwest::Error>> = vec![
            Ok(bytes::Bytes::from_static(b"hello ")),
            Ok(bytes::Bytes::from_static(&[0xe4, 0xbd])),
            Ok(bytes::Bytes::from_static(&[0xa0, b'!'])),
        ];
        let mut reader = TextChunkReader::from_stream(futures_util::stream::iter(chunks));

        assert_eq!(reader.next_fragment().await.unwrap().as_deref(), Some("hello "));
        assert_eq!(reader.next_fragment().await.unwrap().as_deref(), Some(""));
        assert_eq!(reader.next_fragment().await.unwrap().as_deref(), Some("你!"));
        assert_eq!(reader.next_fragment().await.unwrap(), None);
        assert_eq!(reader.next_fragment().await.unwrap(), None);
    }
}
