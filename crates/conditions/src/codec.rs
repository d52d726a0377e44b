//! Canonical tagged-length-value reader/writer.
//!
//! Every value has exactly one valid encoding: integers are
//! length-prefixed minimal big-endian, octet strings use the shortest
//! length form, and composite siblings are ordered by the canonical
//! comparator. The reader rejects alternate encodings of the same value
//! so a fingerprint cannot be equivocated.

use std::cmp::Ordering;

use crate::error::{ConditionError, Result};

/// Number of big-endian bytes in the minimal encoding of `value`.
/// Zero still occupies one byte.
fn be_len(value: u64) -> usize {
    let bits = 64 - value.leading_zeros() as usize;
    bits.div_ceil(8).max(1)
}

/// Encoded size of a var-uint, length prefix included.
pub fn var_uint_len(value: u64) -> u64 {
    1 + be_len(value) as u64
}

/// Encoded size of a var-octet-string holding `len` bytes, length
/// framing included. Saturates at `u64::MAX`; callers doing cost
/// arithmetic on untrusted lengths must treat the saturated value as
/// an overflow.
pub fn var_octet_len(len: u64) -> u64 {
    let prefix = if len < 128 { 1 } else { 1 + be_len(len) as u64 };
    len.saturating_add(prefix)
}

/// Canonical ordering over encoded sibling elements: ascending length,
/// then byte-lexicographic.
pub fn canonical_cmp(a: &[u8], b: &[u8]) -> Ordering {
    a.len().cmp(&b.len()).then_with(|| a.cmp(b))
}

/// Sort encoded sibling elements into canonical order.
pub fn sort_canonical(items: &mut [Vec<u8>]) {
    items.sort_by(|a, b| canonical_cmp(a, b));
}

/// Append-only buffer writer producing canonical encodings.
#[derive(Debug, Default)]
pub struct Writer {
    buf: Vec<u8>,
}

impl Writer {
    /// Create an empty writer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Write a single byte.
    pub fn write_u8(&mut self, value: u8) {
        self.buf.push(value);
    }

    /// Write a fixed 16-bit big-endian integer.
    pub fn write_u16(&mut self, value: u16) {
        self.buf.extend_from_slice(&value.to_be_bytes());
    }

    /// Write a fixed 32-bit big-endian integer.
    pub fn write_u32(&mut self, value: u32) {
        self.buf.extend_from_slice(&value.to_be_bytes());
    }

    /// Write a length-prefixed minimal big-endian integer.
    pub fn write_var_uint(&mut self, value: u64) {
        let len = be_len(value);
        self.buf.push(len as u8);
        self.buf.extend_from_slice(&value.to_be_bytes()[8 - len..]);
    }

    /// Write a length-framed octet string. Lengths below 128 use a
    /// single prefix byte; longer strings use the long form
    /// `0x80 | n` followed by `n` minimal big-endian length bytes.
    pub fn write_var_octet_string(&mut self, bytes: &[u8]) {
        let len = bytes.len();
        if len < 128 {
            self.buf.push(len as u8);
        } else {
            let n = be_len(len as u64);
            self.buf.push(0x80 | n as u8);
            self.buf
                .extend_from_slice(&(len as u64).to_be_bytes()[8 - n..]);
        }
        self.buf.extend_from_slice(bytes);
    }

    /// Write raw bytes with no framing.
    pub fn write_raw(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    /// Number of bytes written so far.
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    /// True if nothing has been written.
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// View the bytes written so far.
    pub fn as_slice(&self) -> &[u8] {
        &self.buf
    }

    /// Consume the writer and return its buffer.
    pub fn into_vec(self) -> Vec<u8> {
        self.buf
    }
}

/// Strict, non-allocating reader over a byte buffer.
///
/// Fails with [`ConditionError::MalformedEncoding`] on truncated input
/// and on any non-canonical form.
#[derive(Debug)]
pub struct Reader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    /// Wrap a byte buffer.
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    /// Current read offset.
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Bytes consumed since `start`, which must be a prior position.
    pub fn consumed_since(&self, start: usize) -> &'a [u8] {
        &self.buf[start..self.pos]
    }

    /// Bytes left to read.
    pub fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    /// True once the whole buffer has been consumed.
    pub fn is_at_end(&self) -> bool {
        self.pos == self.buf.len()
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8]> {
        if self.remaining() < n {
            return Err(ConditionError::MalformedEncoding(format!(
                "truncated input: needed {n} bytes, {} remain",
                self.remaining()
            )));
        }
        let slice = &self.buf[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }

    /// Read a single byte.
    pub fn read_u8(&mut self) -> Result<u8> {
        Ok(self.take(1)?[0])
    }

    /// Read a fixed-width byte array.
    pub fn read_array<const N: usize>(&mut self) -> Result<[u8; N]> {
        let bytes = self.take(N)?;
        let mut out = [0u8; N];
        out.copy_from_slice(bytes);
        Ok(out)
    }

    /// Read a fixed 16-bit big-endian integer.
    pub fn read_u16(&mut self) -> Result<u16> {
        let bytes = self.take(2)?;
        Ok(u16::from_be_bytes([bytes[0], bytes[1]]))
    }

    /// Read a fixed 32-bit big-endian integer.
    pub fn read_u32(&mut self) -> Result<u32> {
        let bytes = self.take(4)?;
        Ok(u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    /// Read a length-prefixed integer, rejecting oversized and
    /// non-minimal encodings.
    pub fn read_var_uint(&mut self) -> Result<u64> {
        let bytes = self.read_var_octet_string()?;
        if bytes.is_empty() {
            return Err(ConditionError::MalformedEncoding(
                "zero-length integer".into(),
            ));
        }
        if bytes.len() > 8 {
            return Err(ConditionError::MalformedEncoding(format!(
                "integer of {} bytes exceeds 64 bits",
                bytes.len()
            )));
        }
        if bytes.len() > 1 && bytes[0] == 0 {
            return Err(ConditionError::MalformedEncoding(
                "integer has a leading zero byte".into(),
            ));
        }
        let mut value = 0u64;
        for &b in bytes {
            value = value << 8 | u64::from(b);
        }
        Ok(value)
    }

    /// Read a length-framed octet string, rejecting non-minimal length
    /// forms.
    pub fn read_var_octet_string(&mut self) -> Result<&'a [u8]> {
        let prefix = self.read_u8()?;
        if prefix < 0x80 {
            return self.take(prefix as usize);
        }
        let n = (prefix & 0x7f) as usize;
        if n == 0 {
            return Err(ConditionError::MalformedEncoding(
                "indefinite length is not allowed".into(),
            ));
        }
        if n > 8 {
            return Err(ConditionError::MalformedEncoding(format!(
                "length of {n} bytes exceeds 64 bits"
            )));
        }
        let len_bytes = self.take(n)?;
        if len_bytes[0] == 0 {
            return Err(ConditionError::MalformedEncoding(
                "length has a leading zero byte".into(),
            ));
        }
        let mut len = 0u64;
        for &b in len_bytes {
            len = len << 8 | u64::from(b);
        }
        if len < 128 {
            return Err(ConditionError::MalformedEncoding(
                "long-form length below 128".into(),
            ));
        }
        let len = usize::try_from(len).map_err(|_| {
            ConditionError::MalformedEncoding("length exceeds address space".into())
        })?;
        self.take(len)
    }

    /// Consume and return everything left in the buffer.
    pub fn read_rest(&mut self) -> &'a [u8] {
        let slice = &self.buf[self.pos..];
        self.pos = self.buf.len();
        slice
    }

    /// Fail unless the buffer has been consumed exactly.
    pub fn expect_eof(&self) -> Result<()> {
        if self.is_at_end() {
            Ok(())
        } else {
            Err(ConditionError::MalformedEncoding(format!(
                "{} trailing bytes after value",
                self.remaining()
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn test_var_uint_round_trip() {
        for value in [0u64, 1, 127, 128, 255, 256, 0xffff, 0x0100_0000, u64::MAX] {
            let mut w = Writer::new();
            w.write_var_uint(value);
            let bytes = w.into_vec();
            assert_eq!(var_uint_len(value) as usize, bytes.len());

            let mut r = Reader::new(&bytes);
            assert_eq!(r.read_var_uint().unwrap(), value);
            r.expect_eof().unwrap();
        }
    }

    #[test]
    fn test_var_uint_zero_is_one_zero_byte() {
        let mut w = Writer::new();
        w.write_var_uint(0);
        assert_eq!(w.into_vec(), vec![0x01, 0x00]);
    }

    #[test]
    fn test_var_uint_rejects_leading_zero() {
        let mut r = Reader::new(&[0x02, 0x00, 0x01]);
        assert_matches!(
            r.read_var_uint(),
            Err(ConditionError::MalformedEncoding(_))
        );
    }

    #[test]
    fn test_var_uint_rejects_zero_length() {
        let mut r = Reader::new(&[0x00]);
        assert_matches!(
            r.read_var_uint(),
            Err(ConditionError::MalformedEncoding(_))
        );
    }

    #[test]
    fn test_var_octet_string_short_form() {
        let payload = vec![0xabu8; 127];
        let mut w = Writer::new();
        w.write_var_octet_string(&payload);
        let bytes = w.into_vec();
        assert_eq!(bytes[0], 127);

        let mut r = Reader::new(&bytes);
        assert_eq!(r.read_var_octet_string().unwrap(), &payload[..]);
        r.expect_eof().unwrap();
    }

    #[test]
    fn test_var_octet_string_long_form() {
        let payload = vec![0xcdu8; 300];
        let mut w = Writer::new();
        w.write_var_octet_string(&payload);
        let bytes = w.into_vec();
        assert_eq!(&bytes[..3], &[0x82, 0x01, 0x2c]);

        let mut r = Reader::new(&bytes);
        assert_eq!(r.read_var_octet_string().unwrap(), &payload[..]);
        r.expect_eof().unwrap();
    }

    #[test]
    fn test_var_octet_string_rejects_non_minimal_length() {
        // 5 bytes of content framed with the long form.
        let mut bytes = vec![0x81, 0x05];
        bytes.extend_from_slice(&[0u8; 5]);
        let mut r = Reader::new(&bytes);
        assert_matches!(
            r.read_var_octet_string(),
            Err(ConditionError::MalformedEncoding(_))
        );
    }

    #[test]
    fn test_var_octet_string_rejects_truncation() {
        let mut r = Reader::new(&[0x04, 0x01, 0x02]);
        assert_matches!(
            r.read_var_octet_string(),
            Err(ConditionError::MalformedEncoding(_))
        );
    }

    #[test]
    fn test_expect_eof_rejects_trailing_bytes() {
        let mut r = Reader::new(&[0x01, 0x07, 0xff]);
        r.read_var_octet_string().unwrap();
        assert_matches!(r.expect_eof(), Err(ConditionError::MalformedEncoding(_)));
    }

    #[test]
    fn test_canonical_order_is_length_first() {
        let mut items = vec![vec![0x01, 0x01, 0x04], vec![0x01, 0x01, 0x00, 0x27]];
        sort_canonical(&mut items);
        // The shorter element sorts first even though it compares
        // higher lexicographically.
        assert_eq!(items[0], vec![0x01, 0x01, 0x04]);
    }

    #[test]
    fn test_predicted_lengths_match_writer() {
        for len in [0usize, 1, 127, 128, 255, 256, 70_000] {
            let payload = vec![0u8; len];
            let mut w = Writer::new();
            w.write_var_octet_string(&payload);
            assert_eq!(w.len() as u64, var_octet_len(len as u64));
        }
    }
}
