//! Time and duration rendering for [`Buffer`].
//!
//! This module provides the fixed-layout timestamp fast path and the humane duration
//! formatter. Both build their output in a small stack array and copy it into the buffer in
//! one step, so formatting a timestamp costs no allocation and no format-string parsing.

use chrono::{DateTime, Datelike, Offset, TimeDelta, TimeZone, Timelike};

use crate::buffer::{fmt_int, Buffer};
use crate::flags::flag_set;

flag_set! {
    /// Layout mask for [`Buffer::append_time`].
    ///
    /// Pieces always appear in the same order (date, separator, time, fraction, zone) no
    /// matter how the mask was assembled.
    pub struct TimeFlags: u16 {
        /// `2006-01-02`
        const DATE = 1 << 0;
        /// `T` between date and time instead of a space. Only meaningful with `DATE`.
        const T_SEPARATOR = 1 << 1;
        /// `15:04:05`
        const TIME = 1 << 2;
        /// `.000` milliseconds.
        const MILLIS = 1 << 3;
        /// `.000000` microseconds.
        const MICROS = 1 << 4;
        /// `.000000000` nanoseconds.
        const NANOS = 1 << 5;
        /// Trim trailing zeros of the fraction (`.999` style instead of `.000`), dropping
        /// the dot when nothing is left.
        const TRIM = 1 << 6;
        /// `Z` for a zero offset, `+07:00`/`-07:00` otherwise.
        const ZONE = 1 << 7;

        /// `2006-01-02 15:04:05`
        const DATETIME = (1 << 0) | (1 << 2);
        /// `2006-01-02 15:04:05.000`
        const DATETIME_MILLIS = (1 << 0) | (1 << 2) | (1 << 3);
        /// `2006-01-02 15:04:05.000000`
        const DATETIME_MICROS = (1 << 0) | (1 << 2) | (1 << 4);
        /// `2006-01-02 15:04:05.000000000`
        const DATETIME_NANOS = (1 << 0) | (1 << 2) | (1 << 5);
        /// `2006-01-02T15:04:05Z07:00`
        const RFC3339 = (1 << 0) | (1 << 1) | (1 << 2) | (1 << 7);
        /// `2006-01-02T15:04:05.999999999Z07:00`
        const RFC3339_NANO = (1 << 0) | (1 << 1) | (1 << 2) | (1 << 5) | (1 << 6) | (1 << 7);
    }
}

const SUBSECOND: TimeFlags = TimeFlags::MILLIS
    .union(TimeFlags::MICROS)
    .union(TimeFlags::NANOS);

const NANOS_PER_SEC: u64 = 1_000_000_000;

impl Buffer {
    /// Appends `t` laid out according to `flags`, in `t`'s own offset.
    ///
    /// Supports only the layouts [`TimeFlags`] can express, in exchange for being several
    /// times faster than a general layout formatter.
    ///
    /// # Examples
    ///
    /// ```
    /// use bytelog::{Buffer, TimeFlags};
    /// use chrono::{TimeZone, Utc};
    ///
    /// let t = Utc.with_ymd_and_hms(2019, 1, 18, 12, 0, 35).unwrap();
    /// let mut buf = Buffer::new();
    /// buf.append_time(&t, TimeFlags::RFC3339_NANO);
    /// assert_eq!(buf.as_str().unwrap(), "2019-01-18T12:00:35Z");
    /// ```
    pub fn append_time<Tz: TimeZone>(&mut self, t: &DateTime<Tz>, flags: TimeFlags) {
        // Largest layout is 2006-01-02T15:04:05.999999999-07:00
        let mut out = [0u8; 40];
        let mut w = 0;

        if flags.contains(TimeFlags::DATE) {
            let year = t.year();
            if year < 0 {
                out[w] = b'-';
                w += 1;
            }
            w = put_padded(&mut out, w, u64::from(year.unsigned_abs()), 4);
            out[w] = b'-';
            w = put_padded(&mut out, w + 1, u64::from(t.month()), 2);
            out[w] = b'-';
            w = put_padded(&mut out, w + 1, u64::from(t.day()), 2);
        }

        if flags.intersects(TimeFlags::TIME.union(SUBSECOND)) {
            if flags.contains(TimeFlags::DATE) {
                out[w] = if flags.contains(TimeFlags::T_SEPARATOR) {
                    b'T'
                } else {
                    b' '
                };
                w += 1;
            }
            w = put_padded(&mut out, w, u64::from(t.hour()), 2);
            out[w] = b':';
            w = put_padded(&mut out, w + 1, u64::from(t.minute()), 2);
            out[w] = b':';
            w = put_padded(&mut out, w + 1, u64::from(t.second()), 2);

            let digits = if flags.contains(TimeFlags::NANOS) {
                9
            } else if flags.contains(TimeFlags::MICROS) {
                6
            } else if flags.contains(TimeFlags::MILLIS) {
                3
            } else {
                0
            };
            if digits > 0 {
                // Leap seconds show up as nanosecond values past one second.
                let nanos = u64::from(t.nanosecond()) % NANOS_PER_SEC;
                w = put_fraction(&mut out, w, nanos, digits, flags.contains(TimeFlags::TRIM));
            }
        }

        if flags.contains(TimeFlags::ZONE) {
            let offset = t.offset().fix().local_minus_utc();
            if offset == 0 {
                out[w] = b'Z';
                w += 1;
            } else {
                out[w] = if offset < 0 { b'-' } else { b'+' };
                let abs = u64::from(offset.unsigned_abs());
                w = put_padded(&mut out, w + 1, abs / 3600, 2);
                out[w] = b':';
                w = put_padded(&mut out, w + 1, (abs / 60) % 60, 2);
            }
        }

        self.push_bytes(&out[..w]);
    }

    /// Appends a signed nanosecond count as a humane duration: `1.5ms`, `2m3.25s`, `-1h0m0s`.
    ///
    /// Below one second the largest fitting unit among `ns`, `µs` and `ms` is used;
    /// from one second on the layout is hours, minutes and fractional seconds, omitting
    /// leading zero units. Zero renders as `0s`.
    pub fn append_duration(&mut self, nanos: i64) {
        // Largest value is 2562047h47m16.854775808s
        let mut buf = [0u8; 32];
        let mut w = buf.len();

        let neg = nanos < 0;
        let mut u = nanos.unsigned_abs();

        if u < NANOS_PER_SEC {
            if u == 0 {
                self.push_str("0s");
                return;
            }
            w -= 1;
            buf[w] = b's';
            w -= 1;
            let prec = if u < 1_000 {
                buf[w] = b'n';
                0
            } else if u < 1_000_000 {
                w -= 1;
                buf[w..w + 2].copy_from_slice("µ".as_bytes());
                3
            } else {
                buf[w] = b'm';
                6
            };
            let (nw, nu) = fmt_frac(&mut buf[..w], u, prec);
            w = fmt_int(&mut buf[..nw], nu, 0);
        } else {
            w -= 1;
            buf[w] = b's';

            let (nw, nu) = fmt_frac(&mut buf[..w], u, 9);
            u = nu;

            // u is now whole seconds
            w = fmt_int(&mut buf[..nw], u % 60, 0);
            u /= 60;

            if u > 0 {
                w -= 1;
                buf[w] = b'm';
                w = fmt_int(&mut buf[..w], u % 60, 0);
                u /= 60;

                // Stop at hours; days vary in length.
                if u > 0 {
                    w -= 1;
                    buf[w] = b'h';
                    w = fmt_int(&mut buf[..w], u, 0);
                }
            }
        }

        if neg {
            w -= 1;
            buf[w] = b'-';
        }
        self.push_bytes(&buf[w..]);
    }

    /// [`append_duration`](Buffer::append_duration) for a `chrono` delta. Deltas beyond the
    /// nanosecond range saturate.
    pub fn append_time_delta(&mut self, d: TimeDelta) {
        self.append_duration(delta_nanos(d));
    }

    /// [`append_duration`](Buffer::append_duration) for a std duration. Saturates at
    /// `i64::MAX` nanoseconds.
    pub fn append_std_duration(&mut self, d: std::time::Duration) {
        self.append_duration(i64::try_from(d.as_nanos()).unwrap_or(i64::MAX));
    }
}

/// Nanoseconds in `d`, saturated to the `i64` range.
pub(crate) fn delta_nanos(d: TimeDelta) -> i64 {
    d.num_nanoseconds()
        .unwrap_or(if d < TimeDelta::zero() { i64::MIN } else { i64::MAX })
}

/// Writes `v` zero-padded to `width` digits at `out[w..]`, returning the new end.
#[inline]
fn put_padded(out: &mut [u8], w: usize, v: u64, width: usize) -> usize {
    let mut digits = [0u8; 20];
    let start = fmt_int(&mut digits, v, width);
    let n = digits.len() - start;
    out[w..w + n].copy_from_slice(&digits[start..]);
    w + n
}

/// Writes `.` plus the leading `digits` digits of `nanos` at `out[w..]`.
///
/// With `trim`, trailing zeros are dropped, and nothing at all is written when every
/// remaining digit is zero.
fn put_fraction(out: &mut [u8], w: usize, nanos: u64, digits: u32, trim: bool) -> usize {
    let mut v = nanos / 10u64.pow(9 - digits);
    let mut width = digits as usize;
    if trim {
        if v == 0 {
            return w;
        }
        while v % 10 == 0 {
            v /= 10;
            width -= 1;
        }
    }
    out[w] = b'.';
    put_padded(out, w + 1, v, width)
}

/// Formats the fraction of `v / 10^prec` (e.g. `.12345`) into the tail of `buf`, omitting
/// trailing zeros, and the dot too when the fraction is zero. Returns the index where the
/// output begins and `v / 10^prec`.
fn fmt_frac(buf: &mut [u8], mut v: u64, prec: usize) -> (usize, u64) {
    let mut w = buf.len();
    let mut print = false;
    for _ in 0..prec {
        let digit = v % 10;
        print = print || digit != 0;
        if print {
            w -= 1;
            buf[w] = digit as u8 + b'0';
        }
        v /= 10;
    }
    if print {
        w -= 1;
        buf[w] = b'.';
    }
    (w, v)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fmt_frac_trims() {
        let mut buf = [0u8; 16];
        let (w, rest) = fmt_frac(&mut buf, 1_500_000_000, 9);
        assert_eq!(&buf[w..], b".5");
        assert_eq!(rest, 1);

        let (w, rest) = fmt_frac(&mut buf, 2_000_000_000, 9);
        assert_eq!(w, buf.len(), "zero fraction should print nothing");
        assert_eq!(rest, 2);
    }

    #[test]
    fn test_put_fraction() {
        let mut out = [0u8; 16];
        let end = put_fraction(&mut out, 0, 9_876, 9, false);
        assert_eq!(&out[..end], b".000009876");

        let end = put_fraction(&mut out, 0, 123_450_000, 9, true);
        assert_eq!(&out[..end], b".12345");

        let end = put_fraction(&mut out, 0, 1_234, 3, true);
        assert_eq!(end, 0, "sub-millisecond remainder trims to nothing");

        let end = put_fraction(&mut out, 0, 1_234, 3, false);
        assert_eq!(&out[..end], b".000");
    }

    #[test]
    fn test_delta_saturates() {
        assert_eq!(delta_nanos(TimeDelta::MAX), i64::MAX);
        assert_eq!(delta_nanos(TimeDelta::MIN), i64::MIN);
        assert_eq!(delta_nanos(TimeDelta::milliseconds(3)), 3_000_000);
    }
}
