//! Binary serialization utilities shared across record types.
//!
//! All OCD file sections are little-endian. Records are packed field by
//! field through [`ByteWriter`] rather than by reinterpreting in-memory
//! structs, so the on-disk layout is independent of host byte order and
//! struct padding.

/// An append-only little-endian byte sink.
///
/// # Examples
///
/// ```
/// use quince::common::binary::ByteWriter;
/// let mut w = ByteWriter::new();
/// w.u16(0x0cad);
/// w.i32(-1);
/// assert_eq!(w.as_slice(), &[0xad, 0x0c, 0xff, 0xff, 0xff, 0xff]);
/// ```
#[derive(Debug, Default)]
pub struct ByteWriter {
    buf: Vec<u8>,
}

impl ByteWriter {
    pub fn new() -> Self {
        Self { buf: Vec::new() }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buf: Vec::with_capacity(capacity),
        }
    }

    #[inline]
    pub fn u8(&mut self, v: u8) {
        self.buf.push(v);
    }

    #[inline]
    pub fn u16(&mut self, v: u16) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    #[inline]
    pub fn i16(&mut self, v: i16) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    #[inline]
    pub fn u32(&mut self, v: u32) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    #[inline]
    pub fn i32(&mut self, v: i32) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    #[inline]
    pub fn f64(&mut self, v: f64) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    #[inline]
    pub fn bytes(&mut self, v: &[u8]) {
        self.buf.extend_from_slice(v);
    }

    /// Append `count` zero bytes.
    pub fn zeros(&mut self, count: usize) {
        self.buf.resize(self.buf.len() + count, 0);
    }

    /// Append a length-prefixed pascal string in a fixed-size field.
    ///
    /// The field occupies `capacity + 1` bytes: one length byte followed by
    /// up to `capacity` string bytes, zero-padded. Longer input is cut at
    /// `capacity` bytes.
    pub fn pascal_string(&mut self, s: &[u8], capacity: usize) {
        let len = s.len().min(capacity);
        self.buf.push(len as u8);
        self.buf.extend_from_slice(&s[..len]);
        self.zeros(capacity - len);
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.buf
    }

    pub fn into_vec(self) -> Vec<u8> {
        self.buf
    }
}

/// Size of a buffer of `len` bytes after padding to a multiple of `chunk`.
#[inline]
pub fn padded_size(len: usize, chunk: usize) -> usize {
    len.div_ceil(chunk) * chunk
}

/// Append zero bytes until `buf` is a multiple of `chunk` bytes long.
pub fn pad_to_chunk(buf: &mut Vec<u8>, chunk: usize) {
    buf.resize(padded_size(buf.len(), chunk), 0);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_little_endian_fields() {
        let mut w = ByteWriter::new();
        w.u16(0x1234);
        w.i16(-2);
        w.u32(0x0a0b0c0d);
        assert_eq!(
            w.as_slice(),
            &[0x34, 0x12, 0xfe, 0xff, 0x0d, 0x0c, 0x0b, 0x0a]
        );
    }

    #[test]
    fn test_pascal_string_fits() {
        let mut w = ByteWriter::new();
        w.pascal_string(b"abc", 7);
        assert_eq!(w.as_slice(), &[3, b'a', b'b', b'c', 0, 0, 0, 0]);
    }

    #[test]
    fn test_pascal_string_truncates() {
        let mut w = ByteWriter::new();
        w.pascal_string(b"abcdef", 4);
        assert_eq!(w.as_slice(), &[4, b'a', b'b', b'c', b'd']);
    }

    #[test]
    fn test_padding() {
        assert_eq!(padded_size(0, 8), 0);
        assert_eq!(padded_size(1, 8), 8);
        assert_eq!(padded_size(8, 8), 8);
        assert_eq!(padded_size(9, 8), 16);

        let mut buf = vec![1u8, 2, 3];
        pad_to_chunk(&mut buf, 8);
        assert_eq!(buf, [1, 2, 3, 0, 0, 0, 0, 0]);
    }
}
