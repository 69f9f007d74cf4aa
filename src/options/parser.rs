//! Parser for the inline option block: `Key1=Value1,Key2=Value2,.../pattern/flags`.
//!
//! The parser dispatches on the first character of a key to a short list
//! of candidates and then requires a full-name match, so `MaxDFASize`,
//! `MatchingMode` and `MustAdvance` never get confused by a shared prefix.
//! It works on slices of the input and does not allocate unless it fails.

use crate::error::{ErrorCode, SyntaxError};

use super::{
    BOOLEAN_OPTIONS, Encoding, Flavor, MAX_NUMERIC_OPTION, MatchingMode, NumericOption,
    Options, OptionsBuilder,
};

/// The pattern delimiter.
pub const DELIMITER: u8 = b'/';

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Key {
    Boolean(u16),
    Flavor,
    Encoding,
    MatchingMode,
    PythonLocale,
    Numeric(NumericOption),
}

impl Key {
    fn name(&self) -> &'static str {
        match self {
            Key::Boolean(bit) => BOOLEAN_OPTIONS
                .iter()
                .find(|(_, b)| b == bit)
                .map(|(name, _)| *name)
                .unwrap_or_default(),
            Key::Flavor => "Flavor",
            Key::Encoding => "Encoding",
            Key::MatchingMode => "MatchingMode",
            Key::PythonLocale => "PythonLocale",
            Key::Numeric(option) => option.key(),
        }
    }
}

const fn boolean(index: usize) -> Key {
    Key::Boolean(BOOLEAN_OPTIONS[index].1)
}

const U180E_WHITESPACE: Key = boolean(0);
const REGRESSION_TEST_MODE: Key = boolean(1);
const DUMP_AUTOMATA: Key = boolean(2);
const STEP_EXECUTION: Key = boolean(3);
const ALWAYS_EAGER: Key = boolean(4);
const VALIDATE_ONLY: Key = boolean(5);
const IGNORE_ATOMIC_GROUPS: Key = boolean(6);
const GENERATE_DFA_IMMEDIATELY: Key = boolean(7);
const BOOLEAN_MATCH: Key = boolean(8);
const MUST_ADVANCE: Key = boolean(9);
const GENERATE_INPUT: Key = boolean(10);
const FORCE_LINEAR_EXECUTION: Key = boolean(11);

/// Keys that may start with `first`.
fn candidates(first: u8) -> &'static [Key] {
    match first {
        b'A' => &[ALWAYS_EAGER],
        b'B' => &[BOOLEAN_MATCH],
        b'D' => &[DUMP_AUTOMATA],
        b'E' => &[Key::Encoding],
        b'F' => &[
            Key::Flavor,
            Key::Numeric(NumericOption::FlavorVersion),
            FORCE_LINEAR_EXECUTION,
        ],
        b'G' => &[GENERATE_DFA_IMMEDIATELY, GENERATE_INPUT],
        b'I' => &[IGNORE_ATOMIC_GROUPS],
        b'M' => &[
            Key::Numeric(NumericOption::MaxDfaSize),
            Key::Numeric(NumericOption::MaxBackTrackerCompileSize),
            Key::MatchingMode,
            MUST_ADVANCE,
        ],
        b'P' => &[Key::PythonLocale],
        b'Q' => &[
            Key::Numeric(NumericOption::QuantifierUnrollLimitSingleCC),
            Key::Numeric(NumericOption::QuantifierUnrollLimitGroup),
        ],
        b'R' => &[REGRESSION_TEST_MODE],
        b'S' => &[STEP_EXECUTION],
        b'U' => &[U180E_WHITESPACE],
        b'V' => &[VALIDATE_ONLY],
        _ => &[],
    }
}

fn invalid(message: String, position: usize) -> SyntaxError {
    SyntaxError::new(message, position, ErrorCode::InvalidOption)
}

struct OptionsParser<'s> {
    src: &'s str,
    pos: usize,
    builder: OptionsBuilder,
}

impl<'s> OptionsParser<'s> {
    fn peek(&self) -> Option<u8> {
        self.src.as_bytes().get(self.pos).copied()
    }

    /// Advance until one of `stops` or the end of input, returning the
    /// skipped slice.
    fn take_until(&mut self, stops: &[u8]) -> &'s str {
        let start = self.pos;
        while let Some(b) = self.peek() {
            if stops.contains(&b) {
                break;
            }
            self.pos += 1;
        }
        &self.src[start..self.pos]
    }

    fn parse(mut self) -> Result<(Options, usize), SyntaxError> {
        loop {
            match self.peek() {
                None => {
                    return Err(SyntaxError::new(
                        "expected '/' starting the pattern",
                        self.pos,
                        ErrorCode::InvalidRequest,
                    ));
                }
                Some(DELIMITER) => return Ok((self.builder.finish(), self.pos)),
                Some(b',') => self.pos += 1,
                Some(_) => self.parse_option()?,
            }
        }
    }

    fn parse_option(&mut self) -> Result<(), SyntaxError> {
        let key_start = self.pos;
        let name = self.take_until(b"=,/");
        let key = self.match_key(name, key_start)?;
        if self.peek() != Some(b'=') {
            return Err(invalid(
                format!("expected '=' after option '{name}'"),
                self.pos,
            ));
        }
        self.pos += 1;
        let value_start = self.pos;
        let value = self.take_until(b",/");
        if value.is_empty() {
            return Err(invalid(
                format!("missing value for option '{name}'"),
                value_start,
            ));
        }
        let builder = std::mem::take(&mut self.builder);
        self.builder = apply(builder, key, value, value_start)?;
        Ok(())
    }

    fn match_key(&self, name: &str, position: usize) -> Result<Key, SyntaxError> {
        let first = name.as_bytes().first().copied().unwrap_or_default();
        candidates(first)
            .iter()
            .find(|key| key.name() == name)
            .copied()
            .ok_or_else(|| invalid(format!("unknown option '{name}'"), position))
    }
}

fn apply(
    builder: OptionsBuilder,
    key: Key,
    value: &str,
    position: usize,
) -> Result<OptionsBuilder, SyntaxError> {
    Ok(match key {
        Key::Boolean(bit) => builder.toggle(bit, parse_bool(key.name(), value, position)?),
        Key::Flavor => {
            let flavor = Flavor::from_name(value)
                .ok_or_else(|| invalid(format!("unknown flavor '{value}'"), position))?;
            builder.flavor(flavor)
        }
        Key::Encoding => {
            let encoding = Encoding::from_name(value)
                .ok_or_else(|| invalid(format!("unknown encoding '{value}'"), position))?;
            builder.encoding(encoding)
        }
        Key::MatchingMode => {
            let mode = MatchingMode::from_name(value)
                .ok_or_else(|| invalid(format!("unknown matching mode '{value}'"), position))?;
            builder.matching_mode(Some(mode))
        }
        Key::PythonLocale => builder.python_locale(Some(value.to_owned())),
        Key::Numeric(option) => builder.numeric(option, parse_numeric(option, value, position)?),
    })
}

fn parse_bool(key: &str, value: &str, position: usize) -> Result<bool, SyntaxError> {
    match value {
        "true" => Ok(true),
        "false" => Ok(false),
        _ => Err(invalid(
            format!("expected 'true' or 'false' for option '{key}', got '{value}'"),
            position,
        )),
    }
}

fn parse_numeric(option: NumericOption, value: &str, position: usize) -> Result<u16, SyntaxError> {
    let mut n: u32 = 0;
    for (i, b) in value.bytes().enumerate() {
        if !b.is_ascii_digit() {
            return Err(invalid(
                format!("expected a number for option '{}', got '{value}'", option.key()),
                position + i,
            ));
        }
        n = n * 10 + u32::from(b - b'0');
        if n > u32::from(MAX_NUMERIC_OPTION) {
            return Err(out_of_range(option, value, position));
        }
    }
    if n < u32::from(option.min()) {
        return Err(out_of_range(option, value, position));
    }
    Ok(n as u16)
}

fn out_of_range(option: NumericOption, value: &str, position: usize) -> SyntaxError {
    invalid(
        format!(
            "value '{value}' of option '{}' is outside of {}..={}",
            option.key(),
            option.min(),
            MAX_NUMERIC_OPTION
        ),
        position,
    )
}

/// Check a numeric value coming from a non-textual source.
pub(crate) fn check_numeric(option: NumericOption, value: u64) -> Result<u16, SyntaxError> {
    if value < u64::from(option.min()) || value > u64::from(MAX_NUMERIC_OPTION) {
        return Err(out_of_range(option, &value.to_string(), 0));
    }
    Ok(value as u16)
}

/// Parse the option block at the start of `text`.
///
/// Returns the options and the index of the `/` that starts the pattern.
/// An empty block (`text` starts with `/`) yields the default options.
pub fn parse_inline(text: &str) -> Result<(Options, usize), SyntaxError> {
    OptionsParser {
        src: text,
        pos: 0,
        builder: OptionsBuilder::new(),
    }
    .parse()
}
