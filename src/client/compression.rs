//! Gzip response stage.
//!
//! Automatic decoding in the transport is switched off; this stage owns both
//! halves of the exchange. Outgoing requests advertise `Accept-Encoding: gzip`,
//! and a response whose `Content-Encoding` is `gzip` is inflated before error
//! classification or JSON parsing sees it. Any other encoding value passes
//! through untouched.

use std::io::{self, Read, Write};

use bytes::Bytes;
use flate2::read::MultiGzDecoder;
use flate2::write::MultiGzDecoder as GzWriteDecoder;
use reqwest::header::{ACCEPT_ENCODING, CONTENT_ENCODING, HeaderMap, HeaderValue};
use tracing::debug;

/// The only content coding this stage understands.
pub const GZIP_ENCODING: &str = "gzip";

/// Request/response filter for gzip transfer compression.
#[derive(Debug, Clone, Copy, Default)]
pub struct CompressionStage;

impl CompressionStage {
    /// Adds `Accept-Encoding: gzip` to an outgoing header set.
    pub fn advertise(self, headers: &mut HeaderMap) {
        headers.append(ACCEPT_ENCODING, HeaderValue::from_static(GZIP_ENCODING));
    }

    /// Returns true when the response declares a gzip body.
    #[must_use]
    pub fn is_gzip(headers: &HeaderMap) -> bool {
        headers
            .get(CONTENT_ENCODING)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|v| v.trim().eq_ignore_ascii_case(GZIP_ENCODING))
    }

    /// Decodes a fully received body according to the response headers.
    ///
    /// # Errors
    ///
    /// Returns an IO error when the body is declared gzip but is not a valid
    /// gzip stream.
    pub fn decode(self, headers: &HeaderMap, body: Bytes) -> io::Result<Bytes> {
        // A gzip header on an empty reply (204, or some proxies) carries no stream.
        if body.is_empty() || !Self::is_gzip(headers) {
            return Ok(body);
        }
        let inflated = inflate(&body)?;
        debug!(
            compressed = body.len(),
            inflated = inflated.len(),
            "decompressed gzip response"
        );
        Ok(Bytes::from(inflated))
    }

    /// Creates an incremental decoder for a streamed body.
    #[must_use]
    pub fn stream_decoder(self, headers: &HeaderMap) -> StreamDecoder {
        if Self::is_gzip(headers) {
            StreamDecoder::Gzip {
                decoder: Box::new(GzWriteDecoder::new(Vec::new())),
                fed: false,
            }
        } else {
            StreamDecoder::Identity
        }
    }
}

/// Inflates a complete gzip payload, including every member of a
/// multi-member stream.
///
/// # Errors
///
/// Returns an IO error for a malformed or truncated gzip stream.
pub fn inflate(compressed: &[u8]) -> io::Result<Vec<u8>> {
    let mut out = Vec::new();
    MultiGzDecoder::new(compressed).read_to_end(&mut out)?;
    Ok(out)
}

/// Chunk-at-a-time body decoder used by downloads.
///
/// Only the output of the most recent chunk is held in memory.
pub enum StreamDecoder {
    /// Body is not compressed; chunks pass through.
    Identity,
    /// Body is gzip (possibly multi-member); chunks are inflated as they arrive.
    Gzip {
        decoder: Box<GzWriteDecoder<Vec<u8>>>,
        /// Set once a non-empty chunk arrived; an empty body has no stream to finish.
        fed: bool,
    },
}

impl StreamDecoder {
    /// Feeds one received chunk and returns the decoded bytes it produced.
    ///
    /// # Errors
    ///
    /// Returns an IO error when the gzip stream is corrupt.
    pub fn feed<'a>(&'a mut self, chunk: &'a [u8]) -> io::Result<&'a [u8]> {
        match self {
            Self::Identity => Ok(chunk),
            Self::Gzip { decoder, fed } => {
                decoder.get_mut().clear();
                *fed |= !chunk.is_empty();
                decoder.write_all(chunk)?;
                Ok(decoder.get_ref().as_slice())
            }
        }
    }

    /// Flushes whatever the decoder still buffers once the body has ended.
    ///
    /// # Errors
    ///
    /// Returns an IO error when the gzip stream ended prematurely.
    pub fn finish(self) -> io::Result<Vec<u8>> {
        match self {
            Self::Identity => Ok(Vec::new()),
            Self::Gzip { fed: false, .. } => Ok(Vec::new()),
            Self::Gzip { mut decoder, .. } => {
                decoder.get_mut().clear();
                decoder.finish()
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use flate2::Compression;
    use flate2::write::GzEncoder;

    fn gzip(data: &[u8]) -> Vec<u8> {
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(data).unwrap();
        encoder.finish().unwrap()
    }

    fn headers_with_encoding(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_ENCODING, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn test_advertise_adds_accept_encoding_gzip() {
        let mut headers = HeaderMap::new();
        CompressionStage.advertise(&mut headers);
        assert_eq!(headers.get(ACCEPT_ENCODING).unwrap(), "gzip");
    }

    #[test]
    fn test_decode_gzip_body_restores_original_bytes() {
        let original = br#"{"projects":[{"id":1,"name":"demo"}]}"#;
        let headers = headers_with_encoding("gzip");
        let decoded = CompressionStage
            .decode(&headers, Bytes::from(gzip(original)))
            .unwrap();
        assert_eq!(decoded.as_ref(), original);
    }

    #[test]
    fn test_decode_without_encoding_header_passes_through() {
        let body = Bytes::from_static(b"plain body");
        let decoded = CompressionStage.decode(&HeaderMap::new(), body.clone()).unwrap();
        assert_eq!(decoded, body);
    }

    #[test]
    fn test_decode_unsupported_encoding_passes_through() {
        let body = Bytes::from_static(b"\x1b\x00brotli-ish");
        let decoded = CompressionStage
            .decode(&headers_with_encoding("br"), body.clone())
            .unwrap();
        assert_eq!(decoded, body);
    }

    #[test]
    fn test_encoding_match_ignores_case_and_whitespace() {
        assert!(CompressionStage::is_gzip(&headers_with_encoding(" GZip ")));
        assert!(!CompressionStage::is_gzip(&headers_with_encoding("gzip, br")));
    }

    #[test]
    fn test_decode_corrupt_gzip_is_an_error() {
        let result = CompressionStage.decode(
            &headers_with_encoding("gzip"),
            Bytes::from_static(b"definitely not gzip"),
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_stream_decoder_inflates_across_chunk_boundaries() {
        let original: Vec<u8> = (0..200_000u32).flat_map(u32::to_le_bytes).collect();
        let compressed = gzip(&original);
        let mut decoder = CompressionStage.stream_decoder(&headers_with_encoding("gzip"));

        let mut out = Vec::new();
        for chunk in compressed.chunks(1000) {
            out.extend_from_slice(decoder.feed(chunk).unwrap());
        }
        out.extend_from_slice(&decoder.finish().unwrap());
        assert_eq!(out, original);
    }

    #[test]
    fn test_decode_multi_member_gzip_keeps_every_member() {
        let mut body = gzip(br#"{"a":"#);
        body.extend(gzip(b"1}"));
        let decoded = CompressionStage
            .decode(&headers_with_encoding("gzip"), Bytes::from(body))
            .unwrap();
        assert_eq!(decoded.as_ref(), br#"{"a":1}"#);
    }

    #[test]
    fn test_decode_empty_gzip_body_is_empty() {
        let decoded = CompressionStage
            .decode(&headers_with_encoding("gzip"), Bytes::new())
            .unwrap();
        assert!(decoded.is_empty());
    }

    #[test]
    fn test_stream_decoder_inflates_multi_member_stream() {
        let first: Vec<u8> = (0..50_000u32).flat_map(u32::to_be_bytes).collect();
        let second = b"trailing member".to_vec();
        let mut compressed = gzip(&first);
        compressed.extend(gzip(&second));
        let mut decoder = CompressionStage.stream_decoder(&headers_with_encoding("gzip"));

        let mut out = Vec::new();
        for chunk in compressed.chunks(777) {
            out.extend_from_slice(decoder.feed(chunk).unwrap());
        }
        out.extend_from_slice(&decoder.finish().unwrap());
        assert_eq!(out, [first, second].concat());
    }

    #[test]
    fn test_stream_decoder_empty_gzip_body_finishes_empty() {
        let decoder = CompressionStage.stream_decoder(&headers_with_encoding("gzip"));
        assert!(decoder.finish().unwrap().is_empty());
    }

    #[test]
    fn test_stream_decoder_identity_returns_chunks_verbatim() {
        let mut decoder = CompressionStage.stream_decoder(&HeaderMap::new());
        assert_eq!(decoder.feed(b"abc").unwrap(), b"abc");
        assert!(decoder.finish().unwrap().is_empty());
    }
}
