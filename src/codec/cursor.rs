//! Read cursor over an in-memory byte stream.

/// Forward-only reader shared by the header parser and both encodings.
#[derive(Debug, Clone)]
pub struct ByteCursor<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> ByteCursor<'a> {
    /// Starts at the first byte of `bytes`.
    #[must_use]
    pub const fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, pos: 0 }
    }

    /// Bytes consumed so far.
    #[must_use]
    pub const fn position(&self) -> usize {
        self.pos
    }

    /// Unread bytes.
    #[must_use]
    pub fn remaining(&self) -> &'a [u8] {
        &self.bytes[self.pos..]
    }

    /// Consumes exactly `n` bytes, or nothing if fewer remain.
    pub fn take(&mut self, n: usize) -> Option<&'a [u8]> {
        let rest = self.remaining();
        if rest.len() < n {
            return None;
        }
        self.pos += n;
        Some(&rest[..n])
    }

    /// Consumes one line and returns it without the `\n`.
    ///
    /// Returns `None` at end of input or if the line is not UTF-8.
    pub fn line(&mut self) -> Option<&'a str> {
        let rest = self.remaining();
        if rest.is_empty() {
            return None;
        }
        let end = rest.iter().position(|&b| b == b'\n').unwrap_or(rest.len());
        self.pos += (end + 1).min(rest.len());
        core::str::from_utf8(&rest[..end]).ok()
    }

    /// Skips ASCII whitespace.
    pub fn skip_whitespace(&mut self) {
        let skipped = self
            .remaining()
            .iter()
            .take_while(|b| b.is_ascii_whitespace())
            .count();
        self.pos += skipped;
    }

    /// Consumes the next whitespace-delimited token.
    pub fn token(&mut self) -> Option<&'a [u8]> {
        self.skip_whitespace();
        let rest = self.remaining();
        let len = rest.iter().take_while(|b| !b.is_ascii_whitespace()).count();
        if len == 0 {
            return None;
        }
        self.pos += len;
        Some(&rest[..len])
    }

    /// Number of unread bytes once trailing whitespace is ignored.
    #[must_use]
    pub fn trailing(&self) -> usize {
        let rest = self.remaining();
        if rest.iter().all(u8::is_ascii_whitespace) {
            0
        } else {
            rest.len()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::ByteCursor;

    #[test]
    fn lines_then_tokens() {
        let mut c = ByteCursor::new(b"2\n3 4\n  1.5\t-2 \n");
        assert_eq!(c.line(), Some("2"));
        assert_eq!(c.line(), Some("3 4"));
        assert_eq!(c.token(), Some(&b"1.5"[..]));
        assert_eq!(c.token(), Some(&b"-2"[..]));
        assert_eq!(c.trailing(), 0);
        assert_eq!(c.token(), None);
    }

    #[test]
    fn take_is_all_or_nothing() {
        let mut c = ByteCursor::new(&[1, 2, 3]);
        assert_eq!(c.take(2), Some(&[1u8, 2][..]));
        assert_eq!(c.take(2), None);
        assert_eq!(c.position(), 2);
        assert_eq!(c.trailing(), 1);
    }
}
