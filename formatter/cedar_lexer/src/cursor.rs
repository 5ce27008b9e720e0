//! Byte cursor over a sentinel-terminated buffer.
//!
//! The cursor advances byte-by-byte; the sentinel guarantees safe
//! termination without per-read bounds checks. Line-oriented scans use
//! memchr so comments and preprocessor lines cost one search, not one
//! comparison per byte.

use memchr::{memchr, memchr2};

use crate::SourceBuffer;

/// Byte cursor with an upper bound (the scan window end).
#[derive(Clone)]
pub struct Cursor<'a> {
    buf: &'a SourceBuffer,
    pos: u32,
    /// Exclusive end of the scan window; reads at or past it yield 0.
    end: u32,
}

impl<'a> Cursor<'a> {
    /// Create a cursor over the whole buffer.
    pub fn new(buf: &'a SourceBuffer) -> Self {
        Cursor {
            buf,
            pos: 0,
            end: buf.len(),
        }
    }

    /// Current byte position.
    #[inline]
    pub fn pos(&self) -> u32 {
        self.pos
    }

    /// Exclusive window end.
    #[inline]
    pub fn window_end(&self) -> u32 {
        self.end
    }

    /// Reposition the cursor to a byte window.
    ///
    /// `end` is clamped to the buffer length; `pos` is clamped to `end`.
    pub fn reset_to(&mut self, pos: u32, end: u32) {
        self.end = end.min(self.buf.len());
        self.pos = pos.min(self.end);
    }

    /// Check if the cursor has reached the window end.
    #[inline]
    pub fn at_end(&self) -> bool {
        self.pos >= self.end
    }

    /// Current byte, or 0 at/past the window end.
    #[inline]
    pub fn current(&self) -> u8 {
        if self.pos >= self.end {
            0
        } else {
            self.buf.byte(self.pos)
        }
    }

    /// Byte one position ahead, or 0 at/past the window end.
    #[inline]
    pub fn peek(&self) -> u8 {
        if self.pos + 1 >= self.end {
            0
        } else {
            self.buf.byte(self.pos + 1)
        }
    }

    /// Byte two positions ahead, or 0 at/past the window end.
    #[inline]
    pub fn peek2(&self) -> u8 {
        if self.pos + 2 >= self.end {
            0
        } else {
            self.buf.byte(self.pos + 2)
        }
    }

    /// Advance one byte.
    #[inline]
    pub fn bump(&mut self) {
        if self.pos < self.end {
            self.pos += 1;
        }
    }

    /// Advance `n` bytes (clamped to the window end).
    #[inline]
    pub fn bump_n(&mut self, n: u32) {
        self.pos = (self.pos + n).min(self.end);
    }

    /// Advance to the next occurrence of `needle` within the window.
    ///
    /// Leaves the cursor ON the needle byte, or at the window end if the
    /// needle does not occur.
    pub fn advance_to_byte(&mut self, needle: u8) {
        let haystack = &self.buf.bytes()[self.pos as usize..self.end as usize];
        match memchr(needle, haystack) {
            Some(i) => self.pos += i as u32,
            None => self.pos = self.end,
        }
    }

    /// Advance to the next occurrence of either needle within the window.
    ///
    /// Leaves the cursor ON the found byte, or at the window end.
    pub fn advance_to_byte2(&mut self, n1: u8, n2: u8) {
        let haystack = &self.buf.bytes()[self.pos as usize..self.end as usize];
        match memchr2(n1, n2, haystack) {
            Some(i) => self.pos += i as u32,
            None => self.pos = self.end,
        }
    }

    /// Check whether `pos` sits at the start of a line: only spaces or
    /// tabs between it and the preceding newline (or file start).
    ///
    /// Looks backwards through the buffer, ignoring the window, because
    /// line starts are a property of the original text.
    pub fn at_line_start(&self, pos: u32) -> bool {
        let mut i = pos;
        while i > 0 {
            match self.buf.byte(i - 1) {
                b' ' | b'\t' => i -= 1,
                b'\n' => return true,
                _ => return false,
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cursor_reads_and_bumps() {
        let buf = SourceBuffer::new("abc");
        let mut c = Cursor::new(&buf);
        assert_eq!(c.current(), b'a');
        assert_eq!(c.peek(), b'b');
        assert_eq!(c.peek2(), b'c');
        c.bump();
        assert_eq!(c.current(), b'b');
        c.bump_n(5);
        assert!(c.at_end());
        assert_eq!(c.current(), 0);
    }

    #[test]
    fn cursor_window_clamps_reads() {
        let buf = SourceBuffer::new("abcdef");
        let mut c = Cursor::new(&buf);
        c.reset_to(1, 3);
        assert_eq!(c.current(), b'b');
        assert_eq!(c.peek(), b'c');
        assert_eq!(c.peek2(), 0);
        c.bump_n(10);
        assert_eq!(c.pos(), 3);
    }

    #[test]
    fn advance_to_byte_stops_on_needle() {
        let buf = SourceBuffer::new("abc\ndef");
        let mut c = Cursor::new(&buf);
        c.advance_to_byte(b'\n');
        assert_eq!(c.pos(), 3);
        c.advance_to_byte(b'x');
        assert_eq!(c.pos(), 7);
    }

    #[test]
    fn line_start_detection() {
        let buf = SourceBuffer::new("ab\n  #if\nx");
        let c = Cursor::new(&buf);
        assert!(c.at_line_start(0));
        assert!(!c.at_line_start(1));
        assert!(c.at_line_start(3));
        assert!(c.at_line_start(5)); // only spaces before the '#'
        assert!(!c.at_line_start(7));
    }
}
