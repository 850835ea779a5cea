//! Line framing over an arbitrarily chunked byte stream.

use crate::encoding;

/// Reassembles newline-delimited text lines from raw stream reads.
///
/// Bytes after the last newline are buffered and prefixed to the next
/// [`append`](LineFramer::append) call, so lines survive any chunking the
/// transport produces. No maximum line length is enforced.
#[derive(Debug, Default)]
pub struct LineFramer {
    buffer: Vec<u8>,
}

impl LineFramer {
    /// Create an empty framer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed raw bytes, returning every line completed by them, in order.
    ///
    /// The terminating newline is stripped. Lines are decoded from the
    /// wire encoding; decoding is total, so no input is ever lost here.
    pub fn append(&mut self, bytes: &[u8]) -> Vec<String> {
        self.buffer.extend_from_slice(bytes);

        let mut lines = Vec::new();
        while let Some(end) = self.buffer.iter().position(|&b| b == b'\n') {
            let raw: Vec<u8> = self.buffer.drain(..=end).collect();
            lines.push(encoding::decode(&raw[..end]));
        }
        lines
    }

    /// Number of buffered bytes still awaiting their newline.
    pub fn pending(&self) -> usize {
        self.buffer.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_read_yields_all_lines() {
        let mut framer = LineFramer::new();
        let lines = framer.append(b"A alice\nA bob\n");
        assert_eq!(lines, ["A alice", "A bob"]);
        assert_eq!(framer.pending(), 0);
    }

    #[test]
    fn partial_line_is_held_until_completed() {
        let mut framer = LineFramer::new();
        assert!(framer.append(b"A ali").is_empty());
        assert_eq!(framer.pending(), 5);

        let lines = framer.append(b"ce\nR b");
        assert_eq!(lines, ["A alice"]);
        assert_eq!(framer.pending(), 3);

        assert_eq!(framer.append(b"ob\n"), ["R bob"]);
        assert_eq!(framer.pending(), 0);
    }

    #[test]
    fn byte_at_a_time_preserves_lines() {
        let stream = b"M alice Pm 1,2\tPd\nN created\n";
        let mut framer = LineFramer::new();
        let mut lines = Vec::new();
        for byte in stream {
            lines.extend(framer.append(std::slice::from_ref(byte)));
        }
        assert_eq!(lines, ["M alice Pm 1,2\tPd", "N created"]);
    }

    #[test]
    fn empty_lines_are_preserved() {
        let mut framer = LineFramer::new();
        assert_eq!(framer.append(b"\n\nA x\n"), ["", "", "A x"]);
    }

    #[test]
    fn latin2_bytes_decode() {
        let mut framer = LineFramer::new();
        let lines = framer.append(&[b'A', b' ', 0xB3, b'\n']);
        assert_eq!(lines, ["A \u{0142}"]);
    }
}
