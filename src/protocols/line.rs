use bytes::{Bytes, BytesMut};
use std::io::{Error, ErrorKind, Read, Result, Write};

const CHUNK: usize = 4096;
/// Longest reply accepted before giving up on finding a terminator.
pub const MAX_LINE: usize = 1 << 20;

/// Line-framed text over any byte stream.
///
/// Bytes read past a terminator stay buffered for the next `read_line`.
pub struct LineStream<IO: Read + Write> {
    io: IO,
    buf: BytesMut,
    terminator: Bytes,
}

impl<IO: Read + Write> LineStream<IO> {
    pub fn new<T: AsRef<[u8]>>(io: IO, terminator: T) -> Self {
        Self {
            io,
            buf: BytesMut::with_capacity(CHUNK),
            terminator: Bytes::copy_from_slice(terminator.as_ref()),
        }
    }

    pub fn get_ref(&self) -> &IO {
        &self.io
    }

    pub fn into_inner(self) -> IO {
        self.io
    }

    /// Writes `line` followed by the terminator, unless it already ends with one.
    ///
    /// Trailing CR/LF is dropped first so a `\n`-terminated command is not
    /// sent as two lines under a `\r\n` terminator.
    pub fn write_line(&mut self, line: &[u8]) -> Result<()> {
        let end = line
            .iter()
            .rposition(|b| *b != b'\r' && *b != b'\n')
            .map_or(0, |i| i + 1);
        let line = &line[..end];
        if line.ends_with(&self.terminator) {
            self.io.write_all(line)?;
        } else {
            let mut message = BytesMut::with_capacity(line.len() + self.terminator.len());
            message.extend_from_slice(line);
            message.extend_from_slice(&self.terminator);
            self.io.write_all(&message)?;
        }
        self.io.flush()
    }

    /// Reads one line and returns it without its terminator.
    ///
    /// A peer closing the stream before a terminator arrives is reported as
    /// `UnexpectedEof`, discarding the partial line. Lines longer than
    /// [`MAX_LINE`] fail with `InvalidData`.
    pub fn read_line(&mut self) -> Result<Bytes> {
        let mut scanned = 0;
        loop {
            if let Some(pos) = find(&self.buf[scanned..], &self.terminator) {
                let end = scanned + pos;
                let mut line = self.buf.split_to(end + self.terminator.len());
                line.truncate(end);
                return Ok(line.freeze());
            }
            // A terminator may straddle two reads.
            scanned = self.buf.len().saturating_sub(self.terminator.len() - 1);

            if self.buf.len() > MAX_LINE {
                self.buf.clear();
                return Err(Error::new(
                    ErrorKind::InvalidData,
                    format!("no line terminator within {} bytes", MAX_LINE),
                ));
            }

            let mut chunk = [0u8; CHUNK];
            let n = match self.io.read(&mut chunk) {
                Ok(n) => n,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            };
            if n == 0 {
                let partial = self.buf.len();
                self.buf.clear();
                return Err(Error::new(
                    ErrorKind::UnexpectedEof,
                    format!("connection closed after {} bytes of an unterminated line", partial),
                ));
            }
            self.buf.extend_from_slice(&chunk[..n]);
        }
    }
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).position(|w| w == needle)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    /// Reads back `input` in small pieces and records writes.
    struct Scripted {
        input: Cursor<Vec<u8>>,
        piece: usize,
        written: Vec<u8>,
    }

    impl Scripted {
        fn new(input: &[u8], piece: usize) -> Self {
            Self {
                input: Cursor::new(input.to_vec()),
                piece,
                written: Vec::new(),
            }
        }
    }

    impl Read for Scripted {
        fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
            let n = buf.len().min(self.piece);
            self.input.read(&mut buf[..n])
        }
    }

    impl Write for Scripted {
        fn write(&mut self, buf: &[u8]) -> Result<usize> {
            self.written.extend_from_slice(buf);
            Ok(buf.len())
        }
        fn flush(&mut self) -> Result<()> {
            Ok(())
        }
    }

    #[test]
    fn appends_terminator_once() {
        let mut s = LineStream::new(Scripted::new(b"", 1), "\n");
        s.write_line(b"*RST").unwrap();
        s.write_line(b"*CLS\n").unwrap();
        assert_eq!(s.get_ref().written, b"*RST\n*CLS\n");
    }

    #[test]
    fn keeps_bytes_after_terminator() {
        let mut s = LineStream::new(Scripted::new(b"ACME,1\n0,\"No error\"\n", 64), "\n");
        assert_eq!(&s.read_line().unwrap()[..], b"ACME,1");
        assert_eq!(&s.read_line().unwrap()[..], b"0,\"No error\"");
    }

    #[test]
    fn multi_byte_terminator_split_across_reads() {
        let mut s = LineStream::new(Scripted::new(b"1.25\r\n2\r\n", 5), "\r\n");
        assert_eq!(&s.read_line().unwrap()[..], b"1.25");
        assert_eq!(&s.read_line().unwrap()[..], b"2");
    }

    #[test]
    fn trailing_newline_replaced_by_terminator() {
        let mut s = LineStream::new(Scripted::new(b"", 1), "\r\n");
        s.write_line(b"*RST\n").unwrap();
        s.write_line(b"*CLS\r\n").unwrap();
        s.write_line(b"*OPC").unwrap();
        assert_eq!(s.get_ref().written, b"*RST\r\n*CLS\r\n*OPC\r\n");

        let mut s = LineStream::new(Scripted::new(b"", 1), "\n");
        s.write_line(b"*RST\r\n").unwrap();
        assert_eq!(s.get_ref().written, b"*RST\n");
    }

    /// Fails every other read with `Interrupted`.
    struct Flaky {
        inner: Scripted,
        interrupt: bool,
    }

    impl Read for Flaky {
        fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
            self.interrupt = !self.interrupt;
            if self.interrupt {
                Err(Error::new(ErrorKind::Interrupted, "signal"))
            } else {
                self.inner.read(buf)
            }
        }
    }

    impl Write for Flaky {
        fn write(&mut self, buf: &[u8]) -> Result<usize> {
            self.inner.write(buf)
        }
        fn flush(&mut self) -> Result<()> {
            Ok(())
        }
    }

    #[test]
    fn interrupted_reads_are_retried() {
        let io = Flaky {
            inner: Scripted::new(b"ACME,Model1\n", 4),
            interrupt: false,
        };
        let mut s = LineStream::new(io, "\n");
        assert_eq!(&s.read_line().unwrap()[..], b"ACME,Model1");
    }

    #[test]
    fn unterminated_flood_is_capped() {
        let flood = vec![b'7'; MAX_LINE + 2 * CHUNK];
        let mut s = LineStream::new(Scripted::new(&flood, CHUNK), "\n");
        let err = s.read_line().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidData);
    }

    #[test]
    fn eof_mid_line_is_error() {
        let mut s = LineStream::new(Scripted::new(b"ACME,Mod", 3), "\n");
        let err = s.read_line().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnexpectedEof);
    }
}
