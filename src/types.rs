use std::fmt;
use std::str::FromStr;

/// An OpenType tag.
///
/// A tag is a 4-byte array where each byte is in the printable ascii range
/// (0x20..=0x7E). Tags shorter than four characters are padded with spaces.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Tag([u8; 4]);

impl Tag {
    /// Create a tag from a string known at compile time.
    ///
    /// Panics when the input is empty or longer than four bytes; prefer the
    /// [`tag!`](crate::tag) macro, which evaluates this in a const context so
    /// that a bad literal fails the build.
    pub const fn new(src: &str) -> Self {
        let bytes = src.as_bytes();
        assert!(
            !bytes.is_empty() && bytes.len() <= 4,
            "a tag must be between one and four bytes"
        );
        let mut out = [b' '; 4];
        let mut i = 0;
        while i < bytes.len() {
            out[i] = bytes[i];
            i += 1;
        }
        Tag(out)
    }

    /// Attempt to create a `Tag` from raw bytes.
    ///
    /// The slice must contain between 1 and 4 bytes, each in the printable
    /// ascii range; shorter inputs are padded with trailing spaces.
    pub fn from_raw(src: impl AsRef<[u8]>) -> Option<Self> {
        let src = src.as_ref();
        if src.is_empty() || src.len() > 4 {
            return None;
        }
        if src.iter().any(|b| !(0x20..=0x7E).contains(b)) {
            return None;
        }
        let mut out = [b' '; 4];
        out[..src.len()].copy_from_slice(src);
        Some(Tag(out))
    }

    /// This tag as raw bytes.
    pub fn as_bytes(&self) -> &[u8; 4] {
        &self.0
    }

    /// This tag as a `&str`.
    pub fn as_str(&self) -> &str {
        std::str::from_utf8(&self.0).unwrap_or("????")
    }
}

impl FromStr for Tag {
    type Err = ();
    fn from_str(s: &str) -> Result<Self, ()> {
        Tag::from_raw(s).ok_or(())
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl fmt::Debug for Tag {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Tag({:?})", self.as_str())
    }
}

/// Create a [`Tag`] from a string literal, checked at compile time.
#[macro_export]
macro_rules! tag {
    ($s:literal) => {{
        const TAG: $crate::types::Tag = $crate::types::Tag::new($s);
        TAG
    }};
}

/// Round a value to the nearest integer, ties to even.
///
/// All integer rounding of scaled deltas and folded metrics goes through
/// this, so that a delta of exactly .5 rounds the same way everywhere.
pub fn round_even(value: f32) -> i32 {
    value.round_ties_even() as i32
}

/// 2.14 fixed-point handling.
///
/// Normalized axis coordinates and tent bounds live on a 2.14 grid in the
/// font file; transformed values are quantized back onto that grid before
/// they are stored, to avoid interpolation surprises.
pub mod F2DOT14 {
    use super::round_even;

    /// The maximum value representable as 2.14 (~1.99994).
    pub const MAX: f32 = 0x7FFF as f32 / 16384.0;

    pub fn pack(v: f32) -> i16 {
        round_even(v * 16384.0) as i16
    }

    pub fn unpack(v: i16) -> f32 {
        (v as f32) / 16384.0
    }

    /// Snap a value onto the 2.14 grid.
    pub fn quantize(v: f32) -> f32 {
        unpack(pack(v))
    }
}

/// Parse a decimal string through the 16.16 fixed-point grid.
///
/// User-space coordinates given on the command line are quantized the same
/// way the font file stores them, so `wght=324.99` and the file's own
/// `324.99000549...` compare equal.
pub fn str_to_fixed_to_float(s: &str) -> Option<f32> {
    let v: f32 = s.trim().parse().ok()?;
    Some(round_even(v * 65536.0) as f32 / 65536.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tag() {
        let t = tag!("wght");
        assert_eq!(t.as_bytes(), b"wght");
        assert_eq!(t.to_string(), "wght");
        assert_eq!(tag!("BASE").as_str(), "BASE");
        // short tags are space-padded
        assert_eq!(tag!("cv1").as_bytes(), b"cv1 ");
        assert!(Tag::from_raw("toolong").is_none());
        assert!(Tag::from_raw("").is_none());
    }

    #[test]
    fn test_f2dot14() {
        assert_eq!(F2DOT14::pack(1.0), 16384);
        assert_eq!(F2DOT14::pack(-1.0), -16384);
        assert_eq!(F2DOT14::quantize(0.3), 0.29998779296875);
        assert_eq!(F2DOT14::quantize(F2DOT14::MAX), F2DOT14::MAX);
    }

    #[test]
    fn test_round_even() {
        assert_eq!(round_even(0.5), 0);
        assert_eq!(round_even(1.5), 2);
        assert_eq!(round_even(-0.5), 0);
        assert_eq!(round_even(2.3), 2);
        assert_eq!(round_even(-2.7), -3);
    }

    #[test]
    fn test_str_to_fixed() {
        assert_eq!(str_to_fixed_to_float("400"), Some(400.0));
        assert_eq!(str_to_fixed_to_float("67.5"), Some(67.5));
        assert!(str_to_fixed_to_float("wght").is_none());
    }
}
