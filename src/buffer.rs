use std::fmt;
use std::io;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use bytes::Bytes;

/// Growable byte accumulator with specialized, allocation-free append operations.
///
/// `Buffer` is the rendering surface of the whole crate: encoders append the pieces of a log
/// line to it and the finished bytes are handed to a sink in one write. Every append formats
/// directly into the underlying storage, so rendering a line never builds intermediate strings.
///
/// Buffers are meant to be recycled through a [`BufferPool`](crate::pool::BufferPool):
/// [`reset`](Buffer::reset) drops the contents but keeps the allocation.
///
/// # Examples
///
/// ```
/// use bytelog::Buffer;
///
/// let mut buf = Buffer::new();
/// buf.push_str("took ");
/// buf.append_duration(1_500_000);
/// buf.push_byte(b' ');
/// buf.append_quote("ok\n");
/// assert_eq!(buf.as_str().unwrap(), "took 1.5ms \"ok\\n\"");
/// ```
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Buffer {
    buf: Vec<u8>,
}

impl Buffer {
    /// Creates an empty buffer. Does not allocate.
    pub const fn new() -> Self {
        Self { buf: Vec::new() }
    }

    /// Creates an empty buffer able to hold `capacity` bytes without reallocating.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buf: Vec::with_capacity(capacity),
        }
    }

    /// Guarantees room for another `n` bytes.
    ///
    /// Growth is geometric: when the spare capacity is too small the storage at least doubles,
    /// which keeps the amortized cost of appends constant.
    #[inline]
    pub fn grow(&mut self, n: usize) {
        if self.buf.capacity() - self.buf.len() < n {
            let target = self.buf.capacity().saturating_mul(2).saturating_add(n);
            self.buf.reserve_exact(target - self.buf.len());
        }
    }

    /// Empties the buffer, keeping its capacity.
    #[inline]
    pub fn reset(&mut self) {
        self.buf.clear();
    }

    /// Discards everything after the first `n` bytes. Never reallocates.
    ///
    /// # Panics
    ///
    /// Panics if `n` is greater than [`len`](Buffer::len).
    #[inline]
    pub fn truncate(&mut self, n: usize) {
        assert!(
            n <= self.buf.len(),
            "bytelog::Buffer: truncation out of range ({} > {})",
            n,
            self.buf.len()
        );
        self.buf.truncate(n);
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.buf.capacity()
    }

    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    /// Views the accumulated bytes as UTF-8.
    ///
    /// Everything the append operations produce is valid UTF-8; only raw
    /// [`push_bytes`](Buffer::push_bytes) calls can break that.
    pub fn as_str(&self) -> Result<&str, std::str::Utf8Error> {
        std::str::from_utf8(&self.buf)
    }

    /// Converts the buffer into an immutable, cheaply clonable byte view without copying.
    ///
    /// Consumes the buffer, so the frozen bytes can never be overwritten by a later reuse.
    pub fn freeze(self) -> Bytes {
        Bytes::from(self.buf)
    }

    pub fn into_inner(self) -> Vec<u8> {
        self.buf
    }

    #[inline]
    pub fn push_byte(&mut self, b: u8) {
        self.buf.push(b);
    }

    #[inline]
    pub fn push_bytes(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    #[inline]
    pub fn push_str(&mut self, s: &str) {
        self.buf.extend_from_slice(s.as_bytes());
    }

    /// Appends the UTF-8 encoding of `c`.
    #[inline]
    pub fn push_char(&mut self, c: char) {
        if c.is_ascii() {
            self.buf.push(c as u8);
        } else {
            let mut utf8 = [0u8; 4];
            self.push_str(c.encode_utf8(&mut utf8));
        }
    }

    /// Appends `true` or `false`.
    #[inline]
    pub fn append_bool(&mut self, v: bool) {
        self.push_str(if v { "true" } else { "false" });
    }

    /// Appends the decimal form of `i`.
    pub fn append_int(&mut self, i: i64) {
        if i < 0 {
            self.buf.push(b'-');
        }
        self.append_uint(i.unsigned_abs());
    }

    /// Appends the decimal form of `u`.
    pub fn append_uint(&mut self, u: u64) {
        let mut digits = [0u8; 20];
        let start = fmt_int(&mut digits, u, 0);
        self.push_bytes(&digits[start..]);
    }

    /// Appends `0x` followed by the lowercase hexadecimal form of `p`.
    pub fn append_uintptr(&mut self, p: usize) {
        let mut digits = [0u8; 2 + 2 * std::mem::size_of::<usize>()];
        let mut w = digits.len();
        let mut v = p;
        loop {
            w -= 1;
            digits[w] = HEX[v & 0xF];
            v >>= 4;
            if v == 0 {
                break;
            }
        }
        self.push_str("0x");
        self.push_bytes(&digits[w..]);
    }

    /// Appends the shortest decimal that round-trips to `f` as a 32-bit float.
    ///
    /// Values with an absolute value below `1e-6` or at/above `1e21` switch to exponent form
    /// (`1e-7`, `1.5e+21`); the cutoffs are evaluated in 32-bit precision.
    pub fn append_f32(&mut self, f: f32) {
        self.push_bytes(FloatBuf::from_f32(f).as_bytes());
    }

    /// Appends the shortest decimal that round-trips to `f`.
    ///
    /// Same layout rules as [`append_f32`](Buffer::append_f32), evaluated in 64-bit precision.
    pub fn append_f64(&mut self, f: f64) {
        self.push_bytes(FloatBuf::from_f64(f).as_bytes());
    }

    /// Appends a 64-bit complex number as `re+imi`.
    pub fn append_complex64(&mut self, re: f32, im: f32) {
        self.append_f32(re);
        self.buf.push(b'+');
        self.append_f32(im);
        self.buf.push(b'i');
    }

    /// Appends a 128-bit complex number as `re+imi`.
    pub fn append_complex128(&mut self, re: f64, im: f64) {
        self.append_f64(re);
        self.buf.push(b'+');
        self.append_f64(im);
        self.buf.push(b'i');
    }

    /// Appends `s` as a double-quoted JSON string literal.
    ///
    /// Quote and backslash are backslash-escaped, `\n`, `\r` and `\t` get their short escapes,
    /// other control characters become `\u00XX`.
    pub fn append_quote(&mut self, s: &str) {
        self.buf.push(b'"');
        self.escape_str(s, false);
        self.buf.push(b'"');
    }

    /// Like [`append_quote`](Buffer::append_quote), additionally escaping `<`, `>`, `&`,
    /// U+2028 and U+2029 so the literal is safe inside HTML `<script>` blocks and JSONP.
    pub fn append_html_quote(&mut self, s: &str) {
        self.buf.push(b'"');
        self.escape_str(s, true);
        self.buf.push(b'"');
    }

    /// Quotes raw bytes; each byte that is not part of a valid UTF-8 sequence becomes `\ufffd`.
    pub fn append_quote_bytes(&mut self, s: &[u8]) {
        self.buf.push(b'"');
        self.escape_bytes(s, false);
        self.buf.push(b'"');
    }

    /// HTML-safe variant of [`append_quote_bytes`](Buffer::append_quote_bytes).
    pub fn append_html_quote_bytes(&mut self, s: &[u8]) {
        self.buf.push(b'"');
        self.escape_bytes(s, true);
        self.buf.push(b'"');
    }

    /// Appends the escaped body of an HTML-safe JSON string, without the surrounding quotes.
    pub fn append_html_escaped(&mut self, s: &str) {
        self.escape_str(s, true);
    }

    /// Appends the standard (padded) base64 encoding of `v`, encoded straight into the
    /// buffer's spare capacity.
    pub fn append_base64(&mut self, v: &[u8]) {
        let start = self.buf.len();
        let encoded_len = v.len().div_ceil(3) * 4;
        self.buf.resize(start + encoded_len, 0);
        match STANDARD.encode_slice(v, &mut self.buf[start..]) {
            Ok(n) => self.buf.truncate(start + n),
            Err(_) => self.buf.truncate(start),
        }
    }

    fn escape_bytes(&mut self, s: &[u8], html: bool) {
        for chunk in s.utf8_chunks() {
            self.escape_str(chunk.valid(), html);
            for _ in chunk.invalid() {
                self.push_str("\\ufffd");
            }
        }
    }

    fn escape_str(&mut self, s: &str, html: bool) {
        let bytes = s.as_bytes();
        let mut start = 0;
        let mut i = 0;
        while i < bytes.len() {
            let c = bytes[i];
            if c.is_ascii() {
                if is_safe(c, html) {
                    i += 1;
                    continue;
                }
                self.push_bytes(&bytes[start..i]);
                self.buf.push(b'\\');
                match c {
                    b'\\' | b'"' => self.buf.push(c),
                    b'\n' => self.buf.push(b'n'),
                    b'\r' => self.buf.push(b'r'),
                    b'\t' => self.buf.push(b't'),
                    _ => {
                        self.push_str("u00");
                        self.buf.push(HEX[(c >> 4) as usize]);
                        self.buf.push(HEX[(c & 0xF) as usize]);
                    }
                }
                i += 1;
                start = i;
                continue;
            }

            // U+2028 LINE SEPARATOR and U+2029 PARAGRAPH SEPARATOR break JSONP.
            if html && is_line_separator(&bytes[i..]) {
                self.push_bytes(&bytes[start..i]);
                self.push_str("\\u202");
                self.buf.push(HEX[(bytes[i + 2] & 0xF) as usize]);
                i += 3;
                start = i;
                continue;
            }
            i += 1;
        }
        self.push_bytes(&bytes[start..]);
    }
}

impl fmt::Debug for Buffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Buffer")
            .field("contents", &String::from_utf8_lossy(&self.buf))
            .field("capacity", &self.buf.capacity())
            .finish()
    }
}

impl AsRef<[u8]> for Buffer {
    fn as_ref(&self) -> &[u8] {
        &self.buf
    }
}

impl From<Buffer> for Vec<u8> {
    fn from(buf: Buffer) -> Self {
        buf.buf
    }
}

impl io::Write for Buffer {
    #[inline]
    fn write(&mut self, data: &[u8]) -> io::Result<usize> {
        self.buf.extend_from_slice(data);
        Ok(data.len())
    }

    #[inline]
    fn write_all(&mut self, data: &[u8]) -> io::Result<()> {
        self.buf.extend_from_slice(data);
        Ok(())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl fmt::Write for Buffer {
    #[inline]
    fn write_str(&mut self, s: &str) -> fmt::Result {
        self.push_str(s);
        Ok(())
    }
}

pub(crate) const HEX: &[u8; 16] = b"0123456789abcdef";

/// Whether the ASCII byte `c` can appear inside a JSON string literal unescaped.
#[inline]
fn is_safe(c: u8, html: bool) -> bool {
    c >= 0x20 && c != b'"' && c != b'\\' && !(html && matches!(c, b'<' | b'>' | b'&'))
}

/// Whether `bytes` starts with the UTF-8 encoding of U+2028 or U+2029.
#[inline]
pub(crate) fn is_line_separator(bytes: &[u8]) -> bool {
    matches!(bytes, [0xE2, 0x80, 0xA8 | 0xA9, ..])
}

/// Writes `v` right-aligned into the tail of `buf`, zero-padded to at least `width` digits.
/// Returns the index of the first digit.
#[inline]
pub(crate) fn fmt_int(buf: &mut [u8], mut v: u64, mut width: usize) -> usize {
    let mut w = buf.len();
    while v >= 10 || width > 1 {
        width = width.saturating_sub(1);
        w -= 1;
        buf[w] = (v % 10) as u8 + b'0';
        v /= 10;
    }
    w -= 1;
    buf[w] = v as u8 + b'0';
    w
}

/// Stack storage for one formatted float.
///
/// The standard library already produces the shortest round-trip digits; this only picks
/// between fixed and exponent layout and rewrites the exponent the way JSON log consumers
/// expect it (`e+21`, `e-7`).
pub(crate) struct FloatBuf {
    bytes: [u8; 40],
    len: usize,
}

impl FloatBuf {
    pub(crate) fn from_f64(f: f64) -> Self {
        let abs = f.abs();
        Self::format(f, f.is_nan(), f.is_infinite(), abs != 0.0 && (abs < 1e-6 || abs >= 1e21))
    }

    pub(crate) fn from_f32(f: f32) -> Self {
        let abs = f.abs();
        Self::format(f, f.is_nan(), f.is_infinite(), abs != 0.0 && (abs < 1e-6 || abs >= 1e21))
    }

    fn format<F: fmt::Display + fmt::LowerExp + PartialOrd + Default>(
        f: F,
        nan: bool,
        infinite: bool,
        exponent: bool,
    ) -> Self {
        use std::fmt::Write as _;

        let mut out = Self {
            bytes: [0; 40],
            len: 0,
        };
        let _ = if nan {
            out.write_str("NaN")
        } else if infinite {
            out.write_str(if f < F::default() { "-Inf" } else { "+Inf" })
        } else if exponent {
            write!(out, "{:e}", f).map(|_| out.sign_exponent())
        } else {
            write!(out, "{}", f)
        };
        out
    }

    /// Inserts the `+` of a positive exponent (`1e21` becomes `1e+21`).
    fn sign_exponent(&mut self) {
        if let Some(e) = self.bytes[..self.len].iter().position(|&b| b == b'e') {
            if self.bytes[e + 1] != b'-' && self.len < self.bytes.len() {
                self.bytes.copy_within(e + 1..self.len, e + 2);
                self.bytes[e + 1] = b'+';
                self.len += 1;
            }
        }
    }

    pub(crate) fn as_bytes(&self) -> &[u8] {
        &self.bytes[..self.len]
    }
}

impl fmt::Write for FloatBuf {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        let end = self.len + s.len();
        if end > self.bytes.len() {
            return Err(fmt::Error);
        }
        self.bytes[self.len..end].copy_from_slice(s.as_bytes());
        self.len = end;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn f64_str(f: f64) -> String {
        String::from_utf8(FloatBuf::from_f64(f).as_bytes().to_vec()).unwrap()
    }

    #[test]
    fn test_fmt_int_padding() {
        let mut buf = [0u8; 8];
        let w = fmt_int(&mut buf, 7, 4);
        assert_eq!(&buf[w..], b"0007");
        let w = fmt_int(&mut buf, 12345, 2);
        assert_eq!(&buf[w..], b"12345");
        let w = fmt_int(&mut buf, 0, 0);
        assert_eq!(&buf[w..], b"0");
    }

    #[test]
    fn test_exponent_sign() {
        assert_eq!(f64_str(1e21), "1e+21");
        assert_eq!(f64_str(-1.5e300), "-1.5e+300");
        assert_eq!(f64_str(1e-7), "1e-7");
        assert_eq!(f64_str(5e-324), "5e-324");
    }

    #[test]
    fn test_fixed_layout() {
        assert_eq!(f64_str(1e20), "100000000000000000000");
        assert_eq!(f64_str(0.000001), "0.000001");
        assert_eq!(f64_str(0.0), "0");
        assert_eq!(f64_str(-0.0), "-0");
    }

    #[test]
    fn test_non_finite() {
        assert_eq!(f64_str(f64::NAN), "NaN");
        assert_eq!(f64_str(f64::INFINITY), "+Inf");
        assert_eq!(f64_str(f64::NEG_INFINITY), "-Inf");
    }

    #[test]
    fn test_line_separator_detection() {
        assert!(is_line_separator("\u{2028}x".as_bytes()));
        assert!(is_line_separator("\u{2029}".as_bytes()));
        assert!(!is_line_separator("\u{2027}".as_bytes()));
        assert!(!is_line_separator(&[0xE2, 0x80]));
    }
}
