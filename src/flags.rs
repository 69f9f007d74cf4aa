//! Per-pattern flags of the default dialect.
//!
//! [`Flags`] is an immutable bit set over the eight letters `dgimsuvy`.
//! It is either parsed from text with [`Flags::parse`], which validates,
//! or assembled with a [`FlagsBuilder`], which does not.

use std::fmt;

use crate::error::{ErrorCode, SyntaxError};

const HAS_INDICES: u8 = 1 << 0;
const GLOBAL: u8 = 1 << 1;
const IGNORE_CASE: u8 = 1 << 2;
const MULTILINE: u8 = 1 << 3;
const DOT_ALL: u8 = 1 << 4;
const UNICODE: u8 = 1 << 5;
const UNICODE_SETS: u8 = 1 << 6;
const STICKY: u8 = 1 << 7;

/// Letter of each bit, in canonical order.
const LETTERS: [(char, u8); 8] = [
    ('d', HAS_INDICES),
    ('g', GLOBAL),
    ('i', IGNORE_CASE),
    ('m', MULTILINE),
    ('s', DOT_ALL),
    ('u', UNICODE),
    ('v', UNICODE_SETS),
    ('y', STICKY),
];

fn bit_of(c: char) -> Option<u8> {
    match c {
        'd' => Some(HAS_INDICES),
        'g' => Some(GLOBAL),
        'i' => Some(IGNORE_CASE),
        'm' => Some(MULTILINE),
        's' => Some(DOT_ALL),
        'u' => Some(UNICODE),
        'v' => Some(UNICODE_SETS),
        'y' => Some(STICKY),
        _ => None,
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Flags {
    bits: u8,
}

impl Flags {
    pub const EMPTY: Flags = Flags { bits: 0 };

    /// Parse flags text. Every letter must be part of the alphabet, appear at
    /// most once, and `u` and `v` cannot both be present. Error positions are
    /// byte offsets into `text`.
    pub fn parse(text: &str) -> Result<Flags, SyntaxError> {
        let mut bits = 0u8;
        for (i, c) in text.char_indices() {
            let Some(bit) = bit_of(c) else {
                return Err(SyntaxError::new(
                    format!("invalid regular expression flag '{c}'"),
                    i,
                    ErrorCode::InvalidFlag,
                ));
            };
            if bits & bit != 0 {
                return Err(SyntaxError::new(
                    format!("repeated regular expression flag '{c}'"),
                    i,
                    ErrorCode::RepeatedFlag,
                ));
            }
            bits |= bit;
            if bits & (UNICODE | UNICODE_SETS) == UNICODE | UNICODE_SETS {
                return Err(SyntaxError::new(
                    "flags 'u' and 'v' are both set",
                    i,
                    ErrorCode::IncompatibleFlags,
                ));
            }
        }
        Ok(Flags { bits })
    }

    pub fn builder() -> FlagsBuilder {
        FlagsBuilder::default()
    }

    pub fn has_indices(&self) -> bool {
        self.bits & HAS_INDICES != 0
    }

    pub fn global(&self) -> bool {
        self.bits & GLOBAL != 0
    }

    pub fn ignore_case(&self) -> bool {
        self.bits & IGNORE_CASE != 0
    }

    pub fn multiline(&self) -> bool {
        self.bits & MULTILINE != 0
    }

    pub fn dot_all(&self) -> bool {
        self.bits & DOT_ALL != 0
    }

    pub fn unicode(&self) -> bool {
        self.bits & UNICODE != 0
    }

    pub fn unicode_sets(&self) -> bool {
        self.bits & UNICODE_SETS != 0
    }

    pub fn sticky(&self) -> bool {
        self.bits & STICKY != 0
    }

    /// Either `u` or `v`: the pattern is interpreted over code points.
    pub fn either_unicode(&self) -> bool {
        self.bits & (UNICODE | UNICODE_SETS) != 0
    }

    pub fn is_empty(&self) -> bool {
        self.bits == 0
    }

    /// Flags set in either operand. A `u` or `v` in `other` clears the
    /// opposite letter of `self`, as [`FlagsBuilder`] does.
    pub fn union(self, other: Flags) -> Flags {
        let mut bits = self.bits;
        if other.bits & UNICODE != 0 {
            bits &= !UNICODE_SETS;
        }
        if other.bits & UNICODE_SETS != 0 {
            bits &= !UNICODE;
        }
        Flags {
            bits: bits | other.bits,
        }
    }

    pub fn difference(self, other: Flags) -> Flags {
        Flags {
            bits: self.bits & !other.bits,
        }
    }

    pub fn overlaps(self, other: Flags) -> bool {
        self.bits & other.bits != 0
    }

    /// Letters of the set flags, in canonical order.
    pub fn canonical_text(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Flags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (c, bit) in LETTERS {
            if self.bits & bit != 0 {
                write!(f, "{c}")?;
            }
        }
        Ok(())
    }
}

/// Programmatic construction of [`Flags`].
///
/// Enabling `u` clears `v` and vice versa, so [`FlagsBuilder::build`] never
/// fails.
#[derive(Debug, Clone, Default)]
pub struct FlagsBuilder {
    bits: u8,
}

impl FlagsBuilder {
    fn set(mut self, bit: u8, value: bool) -> Self {
        if value {
            self.bits |= bit;
        } else {
            self.bits &= !bit;
        }
        self
    }

    pub fn has_indices(self, value: bool) -> Self {
        self.set(HAS_INDICES, value)
    }

    pub fn global(self, value: bool) -> Self {
        self.set(GLOBAL, value)
    }

    pub fn ignore_case(self, value: bool) -> Self {
        self.set(IGNORE_CASE, value)
    }

    pub fn multiline(self, value: bool) -> Self {
        self.set(MULTILINE, value)
    }

    pub fn dot_all(self, value: bool) -> Self {
        self.set(DOT_ALL, value)
    }

    pub fn unicode(self, value: bool) -> Self {
        let builder = if value { self.set(UNICODE_SETS, false) } else { self };
        builder.set(UNICODE, value)
    }

    pub fn unicode_sets(self, value: bool) -> Self {
        let builder = if value { self.set(UNICODE, false) } else { self };
        builder.set(UNICODE_SETS, value)
    }

    pub fn sticky(self, value: bool) -> Self {
        self.set(STICKY, value)
    }

    pub fn build(self) -> Flags {
        Flags { bits: self.bits }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonical_text_is_sorted() {
        let flags = Flags::parse("ygmi").unwrap();
        assert_eq!(flags.canonical_text(), "gimy");
        assert_eq!(Flags::parse(&flags.canonical_text()).unwrap(), flags);
    }

    #[test]
    fn canonical_text_reparses_for_every_valid_flag_set() {
        // All subsets of the alphabet that do not contain both u and v.
        for mask in 0u16..256 {
            let text: String = LETTERS
                .iter()
                .rev()
                .filter(|(_, bit)| mask as u8 & bit != 0)
                .map(|(c, _)| *c)
                .collect();
            match Flags::parse(&text) {
                Ok(flags) => {
                    let reparsed = Flags::parse(&flags.canonical_text()).unwrap();
                    assert_eq!(reparsed, flags, "flags {text:?}");
                }
                Err(e) => {
                    assert!(text.contains('u') && text.contains('v'), "{text:?}: {e}");
                    assert_eq!(e.code, ErrorCode::IncompatibleFlags);
                }
            }
        }
    }

    #[test]
    fn repeated_flag_reports_second_occurrence() {
        let err = Flags::parse("ii").unwrap_err();
        assert_eq!(err.code, ErrorCode::RepeatedFlag);
        assert_eq!(err.position, 1);

        let err = Flags::parse("gmig").unwrap_err();
        assert_eq!(err.position, 3);
    }

    #[test]
    fn u_and_v_are_exclusive() {
        let err = Flags::parse("uv").unwrap_err();
        assert_eq!(err.code, ErrorCode::IncompatibleFlags);
        assert_eq!(err.position, 1);

        let err = Flags::parse("vgu").unwrap_err();
        assert_eq!(err.position, 2);
    }

    #[test]
    fn invalid_flag() {
        let err = Flags::parse("gx").unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidFlag);
        assert_eq!(err.position, 1);
    }

    #[test]
    fn builder_clears_the_other_unicode_flag() {
        let flags = Flags::builder().unicode(true).unicode_sets(true).build();
        assert!(flags.unicode_sets());
        assert!(!flags.unicode());

        let flags = Flags::builder().unicode_sets(true).unicode(true).build();
        assert_eq!(flags.canonical_text(), "u");
    }

    #[test]
    fn set_operations() {
        let gi = Flags::parse("gi").unwrap();
        let im = Flags::parse("im").unwrap();
        assert_eq!(gi.union(im).canonical_text(), "gim");
        assert_eq!(gi.difference(im).canonical_text(), "g");
        assert!(gi.overlaps(im));
        assert!(!gi.overlaps(Flags::parse("y").unwrap()));
        assert!(gi.difference(gi).is_empty());

        let u = Flags::parse("gu").unwrap();
        let v = Flags::parse("v").unwrap();
        assert_eq!(u.union(v).canonical_text(), "gv");
        assert_eq!(v.union(u).canonical_text(), "gu");
        let joined = u.union(v);
        assert_eq!(Flags::parse(&joined.canonical_text()).unwrap(), joined);
    }

    #[test]
    fn positions_are_byte_offsets() {
        let err = Flags::parse("gé").unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidFlag);
        assert_eq!(err.position, 1);
        assert_eq!(&"gé"[err.position..], "é");
    }
}
