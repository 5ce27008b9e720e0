//! Sentinel-terminated source buffer.
//!
//! The buffer guarantees a `0x00` sentinel byte after the source content,
//! so the scanner detects EOF by value instead of bounds-checking every
//! read. Interior null bytes are distinguished from the sentinel by
//! comparing the position against the source length.

/// Sentinel-terminated copy of the source bytes.
///
/// # Layout
///
/// ```text
/// [source_bytes..., 0x00]
///  ^                ^
///  0                source_len (sentinel)
/// ```
#[derive(Clone, Debug)]
pub struct SourceBuffer {
    /// Owned buffer: `[source_bytes..., 0x00 sentinel]`.
    buf: Vec<u8>,
    /// Length of the actual source content (excludes the sentinel).
    source_len: u32,
}

impl SourceBuffer {
    /// Build a buffer from source text.
    ///
    /// # Panics
    /// Panics if the source exceeds `u32::MAX` bytes; the formatter's
    /// span representation cannot address such files.
    pub fn new(source: &str) -> Self {
        let len = u32::try_from(source.len());
        assert!(len.is_ok(), "source exceeds u32::MAX bytes");
        let mut buf = Vec::with_capacity(source.len() + 1);
        buf.extend_from_slice(source.as_bytes());
        buf.push(0);
        SourceBuffer {
            buf,
            source_len: source.len() as u32,
        }
    }

    /// Length of the source content in bytes.
    #[inline]
    pub fn len(&self) -> u32 {
        self.source_len
    }

    /// Check if the source is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.source_len == 0
    }

    /// Byte at `pos`. Reading at or past the end yields the sentinel.
    #[inline]
    pub fn byte(&self, pos: u32) -> u8 {
        self.buf.get(pos as usize).copied().unwrap_or(0)
    }

    /// The source bytes without the sentinel.
    #[inline]
    pub fn bytes(&self) -> &[u8] {
        &self.buf[..self.source_len as usize]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sentinel_at_end() {
        let buf = SourceBuffer::new("ab");
        assert_eq!(buf.len(), 2);
        assert_eq!(buf.byte(0), b'a');
        assert_eq!(buf.byte(1), b'b');
        assert_eq!(buf.byte(2), 0);
        assert_eq!(buf.byte(100), 0);
    }

    #[test]
    fn empty_source() {
        let buf = SourceBuffer::new("");
        assert!(buf.is_empty());
        assert_eq!(buf.byte(0), 0);
    }
}
