use bytes::{Buf, BytesMut};
use tokio_util::codec::Decoder;

use crate::serial::{error::SerialPortError, SerialMessageBytes};

/// Cuts incoming bytes into newline delimited frames.
/// The newline is not included in the yielded frames.
#[derive(Debug, Clone, Default)]
pub struct LinesCodec {
    /// How far we have looked for a newline into the buffer
    cursor: usize,
}

impl Decoder for LinesCodec {
    type Item = SerialMessageBytes;
    type Error = SerialPortError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        let read_to = src.len();

        // The buffer may have been drained by someone else since we last looked.
        if self.cursor > read_to {
            self.cursor = 0;
        }

        let look_at = &src[self.cursor..read_to];

        if let Some(position) = look_at.iter().position(|&byte| byte == b'\n') {
            // Since we might "start late" in the buffer (from the cursor),
            // the "global" position within the buffer has to be calculated.
            let actual_position = self.cursor + position;

            // Next time we need to start over.
            self.cursor = 0;

            // Split at the delimiter, getting a slice of the bytes before it.
            let line = src.split_to(actual_position);

            // Discard the newline by advancing the source buffer beyond it.
            src.advance(1);

            Ok(Some(line.to_vec()))
        } else {
            // We did not find a full frame.
            // Since our job is to find the delimiter, we don't need to re-read the bytes we have already looked at.
            self.cursor = read_to;

            Ok(None)
        }
    }

    /// Called when no more bytes are coming for now.
    /// Whatever is buffered is handed out as a (partial) frame.
    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        if let Some(line) = self.decode(src)? {
            return Ok(Some(line));
        }

        self.cursor = 0;

        if src.is_empty() {
            Ok(None)
        } else {
            Ok(Some(src.split().to_vec()))
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn one_line_at_a_time() {
        let mut codec = LinesCodec::default();
        let mut buf = BytesMut::from(&b"first\r\nsecond\n"[..]);

        assert_eq!(codec.decode(&mut buf).unwrap(), Some(b"first\r".to_vec()));
        assert_eq!(codec.decode(&mut buf).unwrap(), Some(b"second".to_vec()));
        assert_eq!(codec.decode(&mut buf).unwrap(), None);
        assert!(buf.is_empty());
    }

    #[test]
    fn line_split_across_reads() {
        let mut codec = LinesCodec::default();
        let mut buf = BytesMut::from(&b"hel"[..]);

        assert_eq!(codec.decode(&mut buf).unwrap(), None);

        buf.extend_from_slice(b"lo\nwor");
        assert_eq!(codec.decode(&mut buf).unwrap(), Some(b"hello".to_vec()));
        assert_eq!(codec.decode(&mut buf).unwrap(), None);
        assert_eq!(&buf[..], b"wor");
    }

    #[test]
    fn eof_yields_the_partial_line() {
        let mut codec = LinesCodec::default();
        let mut buf = BytesMut::from(&b"no newline"[..]);

        assert_eq!(codec.decode(&mut buf).unwrap(), None);
        assert_eq!(
            codec.decode_eof(&mut buf).unwrap(),
            Some(b"no newline".to_vec())
        );
        assert_eq!(codec.decode_eof(&mut buf).unwrap(), None);
    }

    #[test]
    fn eof_prefers_a_full_line() {
        let mut codec = LinesCodec::default();
        let mut buf = BytesMut::from(&b"a\nb"[..]);

        assert_eq!(codec.decode_eof(&mut buf).unwrap(), Some(b"a".to_vec()));
        assert_eq!(codec.decode_eof(&mut buf).unwrap(), Some(b"b".to_vec()));
    }
}
