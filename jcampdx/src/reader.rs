//! Line-oriented, seekable source for JCAMP-DX text.

use crate::lex;
use crate::Result;
use std::path::Path;

/// A lazy, seekable, EOF-aware line reader over JCAMP-DX text.
///
/// The reader is backed by the full contents of the source, loaded once at
/// construction, either from a file path or from an in-memory byte buffer.
/// Lines are terminated by `\n` or `\r\n`; a trailing `\r` is stripped from
/// every line returned by [`read_line`](Self::read_line). Byte offsets
/// returned by [`tell`](Self::tell) index directly into the underlying
/// buffer and are restored with [`seek`](Self::seek).
///
/// Non-UTF-8 bytes are treated as ISO-8859-1-compatible single-byte text and
/// decoded lossily: JCAMP-DX is plain ASCII for every construct this crate
/// interprets, and transcoding of arbitrary string payloads is out of scope.
#[derive(Clone, Debug)]
pub struct TextReader {
    data: Vec<u8>,
    pos: usize,
}

impl TextReader {
    /// Constructs a `TextReader` by reading the full contents of a file.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let data = std::fs::read(path)?;
        Ok(Self::from_bytes(data))
    }

    /// Constructs a `TextReader` over an in-memory byte buffer.
    pub fn from_bytes(data: Vec<u8>) -> Self {
        Self { data, pos: 0 }
    }

    /// Reads and consumes one line, including handling of the line
    /// terminator. The trailing `\n` or `\r\n` is not included in the
    /// returned string.
    pub fn read_line(&mut self) -> Result<String> {
        if self.eof() {
            return Ok(String::new());
        }
        let start = self.pos;
        let end = match self.data[start..].iter().position(|&b| b == b'\n') {
            Some(offset) => start + offset,
            None => self.data.len(),
        };
        let mut line_end = end;
        if line_end > start && self.data[line_end - 1] == b'\r' {
            line_end -= 1;
        }
        let line = String::from_utf8_lossy(&self.data[start..line_end]).into_owned();
        self.pos = if end < self.data.len() { end + 1 } else { end };
        Ok(line)
    }

    /// Returns the current byte offset.
    pub fn tell(&self) -> usize {
        self.pos
    }

    /// Seeks to the given byte offset.
    pub fn seek(&mut self, offset: usize) {
        self.pos = offset.min(self.data.len());
    }

    /// Returns the total length of the underlying buffer, in bytes.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns `true` if there is no underlying data at all.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Returns `true` if the next [`read_line`](Self::read_line) call would
    /// return no further data.
    pub fn eof(&self) -> bool {
        self.pos >= self.data.len()
    }

    /// Returns the first `n` bytes of the underlying buffer, for format
    /// sniffing (see [`crate::can_parse`]).
    pub fn peek(&self, n: usize) -> &[u8] {
        &self.data[..n.min(self.data.len())]
    }

    /// Advances past lines that are not the start of an LDR, leaving the
    /// reader positioned at the next LDR start (or at EOF if none remains).
    ///
    /// Used by record constructors to fast-forward past a data body whose
    /// content is decoded lazily: the body is not otherwise inspected.
    pub fn skip_to_next_ldr(&mut self) -> Result<()> {
        loop {
            if self.eof() {
                return Ok(());
            }
            let pos = self.tell();
            let line = self.read_line()?;
            if lex::is_ldr_start(&line) {
                self.seek(pos);
                return Ok(());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_lf_terminated_lines() {
        let mut reader = TextReader::from_bytes(b"one\ntwo\nthree".to_vec());
        assert_eq!(reader.read_line().unwrap(), "one");
        assert_eq!(reader.read_line().unwrap(), "two");
        assert_eq!(reader.read_line().unwrap(), "three");
        assert!(reader.eof());
    }

    #[test]
    fn strips_trailing_cr() {
        let mut reader = TextReader::from_bytes(b"one\r\ntwo\r\n".to_vec());
        assert_eq!(reader.read_line().unwrap(), "one");
        assert_eq!(reader.read_line().unwrap(), "two");
        assert!(reader.eof());
    }

    #[test]
    fn seek_and_tell_round_trip() {
        let mut reader = TextReader::from_bytes(b"one\ntwo\nthree\n".to_vec());
        reader.read_line().unwrap();
        let pos = reader.tell();
        reader.read_line().unwrap();
        reader.read_line().unwrap();
        assert!(reader.eof());
        reader.seek(pos);
        assert!(!reader.eof());
        assert_eq!(reader.read_line().unwrap(), "two");
    }

    #[test]
    fn eof_on_empty_buffer() {
        let reader = TextReader::from_bytes(Vec::new());
        assert!(reader.eof());
    }

    #[test]
    fn trailing_line_without_newline() {
        let mut reader = TextReader::from_bytes(b"no newline at all".to_vec());
        assert_eq!(reader.read_line().unwrap(), "no newline at all");
        assert!(reader.eof());
    }
}
