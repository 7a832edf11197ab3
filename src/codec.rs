use bytes::{Buf, BytesMut};
use encoding_rs::{CoderResult, Encoding};
use std::io;
use tokio_util::codec::Decoder;

/// Frames a byte stream in any supported charset as UTF-8 chunks.
///
/// Chunks never split a multi-byte sequence: incomplete trailing input stays in
/// the decoder's own state until more bytes (or EOF) arrive.
pub struct Utf8Transcoder {
    decoder: encoding_rs::Decoder,
    flushed: bool,
}

impl Utf8Transcoder {
    pub fn new(encoding: &'static Encoding) -> Self {
        Self {
            decoder: encoding.new_decoder(),
            flushed: false,
        }
    }

    fn transcode(&mut self, src: &mut BytesMut, last: bool) -> Option<BytesMut> {
        let capacity = self
            .decoder
            .max_utf8_buffer_length(src.len())
            .unwrap_or_else(|| src.len() * 3 + 4);
        let mut out = vec![0u8; capacity];

        let mut read_total = 0usize;
        let mut written_total = 0usize;
        loop {
            let (result, read, written, _had_replacements) =
                self.decoder
                    .decode_to_utf8(&src[read_total..], &mut out[written_total..], last);
            read_total += read;
            written_total += written;
            match result {
                CoderResult::InputEmpty => break,
                // The buffer was sized from the decoder's own upper bound, so
                // this only happens when that bound was unavailable.
                CoderResult::OutputFull => out.resize(out.len() * 2 + 4, 0),
            }
        }

        src.advance(read_total);
        (written_total > 0).then(|| BytesMut::from(&out[..written_total]))
    }
}

impl Decoder for Utf8Transcoder {
    type Item = BytesMut;
    type Error = io::Error;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        if src.is_empty() {
            return Ok(None);
        }
        Ok(self.transcode(src, false))
    }

    /// Flushes the decoder exactly once, so a truncated trailing sequence
    /// comes out as U+FFFD instead of vanishing.
    fn decode_eof(&mut self, buf: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        if self.flushed {
            buf.clear();
            return Ok(None);
        }
        self.flushed = true;
        let out = self.transcode(buf, true);
        buf.clear();
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn latin1_becomes_utf8() {
        let mut codec = Utf8Transcoder::new(encoding_rs::WINDOWS_1252);
        let mut src = BytesMut::from(&b"caf\xe9,na\xefve\n"[..]);
        let out = codec.decode_eof(&mut src).unwrap().unwrap();
        assert_eq!(std::str::from_utf8(&out).unwrap(), "café,naïve\n");
        assert!(src.is_empty());
    }

    #[test]
    fn split_multibyte_sequence_waits_for_rest() {
        let mut codec = Utf8Transcoder::new(encoding_rs::UTF_16LE);
        // "é" in UTF-16LE is E9 00; feed one byte first.
        let mut src = BytesMut::from(&b"\xe9"[..]);
        assert!(codec.decode(&mut src).unwrap().is_none());
        src.extend_from_slice(b"\x00");
        let out = codec.decode(&mut src).unwrap().unwrap();
        assert_eq!(std::str::from_utf8(&out).unwrap(), "é");
    }

    #[tokio::test]
    async fn truncated_tail_becomes_replacement_char() {
        use tokio::io::AsyncReadExt;

        let mut reader = crate::io::utf8_reader(&b"a\x00b"[..], encoding_rs::UTF_16LE);
        let mut text = String::new();
        reader.read_to_string(&mut text).await.unwrap();
        assert_eq!(text, "a\u{FFFD}");
    }

    #[test]
    fn eof_flush_happens_once() {
        let mut codec = Utf8Transcoder::new(encoding_rs::UTF_16LE);
        let mut src = BytesMut::from(&b"a\x00b"[..]);
        let first = codec.decode(&mut src).unwrap().unwrap();
        assert_eq!(std::str::from_utf8(&first).unwrap(), "a");
        assert!(src.is_empty());

        let tail = codec.decode_eof(&mut src).unwrap().unwrap();
        assert_eq!(std::str::from_utf8(&tail).unwrap(), "\u{FFFD}");
        assert!(codec.decode_eof(&mut src).unwrap().is_none());
    }
}
