//! Byte stream to logical lines, treating `\r` like `\n`.
//!
//! The downloader redraws its progress line with bare carriage returns, so
//! both terminators end a line. Bytes are held until a terminator arrives,
//! which keeps multi-byte UTF-8 sequences split across reads intact.

#[derive(Debug, Default)]
pub struct LineSplitter {
    pending: Vec<u8>,
}

impl LineSplitter {
    /// Feeds a chunk; returns every line it completed. Empty lines are skipped.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        let mut lines = Vec::new();
        for &b in chunk {
            if b == b'\n' || b == b'\r' {
                if let Some(line) = self.take() {
                    lines.push(line);
                }
            } else {
                self.pending.push(b);
            }
        }
        lines
    }

    /// Flushes an unterminated tail at end of stream.
    pub fn finish(&mut self) -> Option<String> {
        self.take()
    }

    fn take(&mut self) -> Option<String> {
        if self.pending.is_empty() {
            return None;
        }
        let line = String::from_utf8_lossy(&self.pending).into_owned();
        self.pending.clear();
        Some(line)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_on_newline() {
        let mut s = LineSplitter::default();
        assert_eq!(s.push(b"one\ntwo\n"), vec!["one", "two"]);
        assert_eq!(s.finish(), None);
    }

    #[test]
    fn carriage_return_ends_a_line() {
        let mut s = LineSplitter::default();
        let lines = s.push(b"[download]  10.0%\r[download]  20.0%\r[download] 100%\n");
        assert_eq!(
            lines,
            vec!["[download]  10.0%", "[download]  20.0%", "[download] 100%"]
        );
    }

    #[test]
    fn crlf_does_not_produce_blank_lines() {
        let mut s = LineSplitter::default();
        assert_eq!(s.push(b"a\r\nb\r\n\r\n"), vec!["a", "b"]);
    }

    #[test]
    fn partial_lines_carry_over_between_chunks() {
        let mut s = LineSplitter::default();
        assert!(s.push(b"[down").is_empty());
        assert_eq!(s.push(b"load] 5%\rnext"), vec!["[download] 5%"]);
        assert_eq!(s.finish().as_deref(), Some("next"));
        assert_eq!(s.finish(), None);
    }

    #[test]
    fn utf8_split_across_chunks_survives() {
        let text = "Загрузка\n".as_bytes();
        let mut s = LineSplitter::default();
        let (a, b) = text.split_at(3); // inside the second Cyrillic letter
        assert!(s.push(a).is_empty());
        assert_eq!(s.push(b), vec!["Загрузка"]);
    }

    #[test]
    fn invalid_utf8_is_replaced() {
        let mut s = LineSplitter::default();
        let lines = s.push(b"bad \xff byte\n");
        assert_eq!(lines, vec!["bad \u{fffd} byte"]);
    }
}
