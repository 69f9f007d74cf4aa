/*!
Small types shared by the backends and the matcher descriptor.
*/

/// Input of a single execution.
#[derive(Debug, Clone, Copy)]
pub struct Input<'s> {
    /// The subject string against which the regex is matched
    pub subject: &'s str,
    /// Byte offset where the search starts. Text before it is still
    /// visible to assertions.
    pub from: usize,
    /// Whether the match must start exactly at `from`.
    pub anchored: bool,
    /// Stop at the first match found instead of extending it. Only the
    /// overall bounds are meaningful in this mode.
    pub first_match: bool,
}

impl<'s> Input<'s> {
    pub fn new(subject: &'s str) -> Self {
        Self {
            subject,
            from: 0,
            anchored: false,
            first_match: false,
        }
    }

    pub fn starting_at(mut self, from: usize) -> Self {
        self.from = from;
        self
    }

    pub fn anchored(mut self, value: bool) -> Self {
        self.anchored = value;
        self
    }

    pub fn first_match(mut self, value: bool) -> Self {
        self.first_match = value;
        self
    }

    pub fn valid(&self) -> bool {
        self.from <= self.subject.len() && self.subject.is_char_boundary(self.from)
    }
}

impl<'s> From<&'s str> for Input<'s> {
    fn from(subject: &'s str) -> Self {
        Self::new(subject)
    }
}

/// Bounds of a group in a subject. Implements Copy, unlike
/// [`std::ops::Range`].
#[derive(Copy, Debug, Clone, PartialEq, Eq)]
pub struct Span {
    pub from: usize,
    pub to: usize,
}

impl Span {
    pub fn new(from: usize, to: usize) -> Self {
        Self { from, to }
    }

    pub fn empty(&self) -> bool {
        self.from == self.to
    }

    pub fn valid(&self) -> bool {
        self.from <= self.to
    }

    pub fn invalid() -> Span {
        Span { from: 1, to: 0 }
    }

    pub fn len(&self) -> usize {
        self.to.saturating_sub(self.from)
    }
}

impl From<std::ops::Range<usize>> for Span {
    fn from(value: std::ops::Range<usize>) -> Self {
        Self {
            from: value.start,
            to: value.end,
        }
    }
}

/// A code point, or the [`Char::INPUT_BOUND`] marker standing for the
/// position before the start or after the end of the subject.
#[derive(Copy, Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Char(u32);

impl Char {
    pub const INPUT_BOUND: Char = Char(u32::MAX);
}

impl From<char> for Char {
    fn from(c: char) -> Self {
        Char(c as u32)
    }
}

impl From<u8> for Char {
    fn from(b: u8) -> Self {
        Char(b as u32)
    }
}

/// The character ending just before `pos`, or the input bound.
pub fn find_prev_char(subject: &str, pos: usize) -> Char {
    subject[..pos]
        .chars()
        .next_back()
        .map_or(Char::INPUT_BOUND, Char::from)
}
