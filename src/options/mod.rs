//! Engine-wide options of a compile request.
//!
//! Options come either from an inline `Key=Value,...` block in front of
//! the pattern (see [`parser`]) or from a structured configuration object
//! (see [`structured`]). Both go through [`OptionsBuilder`].

pub mod parser;
pub mod structured;

use std::fmt;

use crate::error::SyntaxError;
use parser::check_numeric;

pub use parser::parse_inline;
pub use structured::OptionLookup;

/// Largest value accepted by any numeric option.
pub const MAX_NUMERIC_OPTION: u16 = i16::MAX as u16;

/// Regex dialect of the pattern.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Flavor {
    #[default]
    ECMAScript,
    Python,
    Ruby,
}

impl Flavor {
    pub const ALL: [Flavor; 3] = [Flavor::ECMAScript, Flavor::Python, Flavor::Ruby];

    pub fn name(&self) -> &'static str {
        match self {
            Flavor::ECMAScript => "ECMAScript",
            Flavor::Python => "Python",
            Flavor::Ruby => "Ruby",
        }
    }

    pub fn from_name(name: &str) -> Option<Flavor> {
        Flavor::ALL.into_iter().find(|f| f.name() == name)
    }

    pub fn is_default(&self) -> bool {
        *self == Flavor::ECMAScript
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Encoding {
    #[default]
    Utf8,
    Utf16,
    Utf32,
    Latin1,
    Bytes,
    Ascii,
}

impl Encoding {
    pub const ALL: [Encoding; 6] = [
        Encoding::Utf8,
        Encoding::Utf16,
        Encoding::Utf32,
        Encoding::Latin1,
        Encoding::Bytes,
        Encoding::Ascii,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Encoding::Utf8 => "UTF-8",
            Encoding::Utf16 => "UTF-16",
            Encoding::Utf32 => "UTF-32",
            Encoding::Latin1 => "LATIN-1",
            Encoding::Bytes => "BYTES",
            Encoding::Ascii => "ASCII",
        }
    }

    pub fn from_name(name: &str) -> Option<Encoding> {
        Encoding::ALL.into_iter().find(|e| e.name() == name)
    }

    /// Whether every code point of the encoding fits in a single byte.
    pub fn is_single_byte(&self) -> bool {
        matches!(self, Encoding::Latin1 | Encoding::Bytes | Encoding::Ascii)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MatchingMode {
    /// Find a match anywhere after the start position.
    Search,
    /// The match must start at the start position.
    Match,
    /// The match must span from the start position to the end of the input.
    FullMatch,
}

impl MatchingMode {
    pub fn name(&self) -> &'static str {
        match self {
            MatchingMode::Search => "search",
            MatchingMode::Match => "match",
            MatchingMode::FullMatch => "fullmatch",
        }
    }

    pub fn from_name(name: &str) -> Option<MatchingMode> {
        [
            MatchingMode::Search,
            MatchingMode::Match,
            MatchingMode::FullMatch,
        ]
        .into_iter()
        .find(|m| m.name() == name)
    }
}

const U180E_WHITESPACE: u16 = 1 << 0;
const REGRESSION_TEST_MODE: u16 = 1 << 1;
const DUMP_AUTOMATA: u16 = 1 << 2;
const STEP_EXECUTION: u16 = 1 << 3;
const ALWAYS_EAGER: u16 = 1 << 4;
const VALIDATE_ONLY: u16 = 1 << 5;
const IGNORE_ATOMIC_GROUPS: u16 = 1 << 6;
const GENERATE_DFA_IMMEDIATELY: u16 = 1 << 7;
const BOOLEAN_MATCH: u16 = 1 << 8;
const MUST_ADVANCE: u16 = 1 << 9;
const GENERATE_INPUT: u16 = 1 << 10;
const FORCE_LINEAR_EXECUTION: u16 = 1 << 11;

/// Boolean option keys and their bits, shared by both option syntaxes.
pub(crate) const BOOLEAN_OPTIONS: [(&str, u16); 12] = [
    ("U180EWhitespace", U180E_WHITESPACE),
    ("RegressionTestMode", REGRESSION_TEST_MODE),
    ("DumpAutomata", DUMP_AUTOMATA),
    ("StepExecution", STEP_EXECUTION),
    ("AlwaysEager", ALWAYS_EAGER),
    ("ValidateOnly", VALIDATE_ONLY),
    ("IgnoreAtomicGroups", IGNORE_ATOMIC_GROUPS),
    ("GenerateDFAImmediately", GENERATE_DFA_IMMEDIATELY),
    ("BooleanMatch", BOOLEAN_MATCH),
    ("MustAdvance", MUST_ADVANCE),
    ("GenerateInput", GENERATE_INPUT),
    ("ForceLinearExecution", FORCE_LINEAR_EXECUTION),
];

/// A bounded numeric option.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum NumericOption {
    FlavorVersion,
    MaxDfaSize,
    MaxBackTrackerCompileSize,
    QuantifierUnrollLimitSingleCC,
    QuantifierUnrollLimitGroup,
}

impl NumericOption {
    pub(crate) const ALL: [NumericOption; 5] = [
        NumericOption::FlavorVersion,
        NumericOption::MaxDfaSize,
        NumericOption::MaxBackTrackerCompileSize,
        NumericOption::QuantifierUnrollLimitSingleCC,
        NumericOption::QuantifierUnrollLimitGroup,
    ];

    pub(crate) fn key(&self) -> &'static str {
        match self {
            NumericOption::FlavorVersion => "FlavorVersion",
            NumericOption::MaxDfaSize => "MaxDFASize",
            NumericOption::MaxBackTrackerCompileSize => "MaxBackTrackerCompileSize",
            NumericOption::QuantifierUnrollLimitSingleCC => "QuantifierUnrollLimitSingleCC",
            NumericOption::QuantifierUnrollLimitGroup => "QuantifierUnrollLimitGroup",
        }
    }

    pub(crate) fn min(&self) -> u16 {
        match self {
            NumericOption::QuantifierUnrollLimitSingleCC
            | NumericOption::QuantifierUnrollLimitGroup => 1,
            _ => 0,
        }
    }
}

/// Immutable set of engine options.
///
/// Equality and hashing cover every field, so two requests only share a
/// cache entry when all their options agree.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Options {
    toggles: u16,
    flavor: Flavor,
    encoding: Encoding,
    matching_mode: Option<MatchingMode>,
    python_locale: Option<String>,
    flavor_version: u16,
    max_dfa_size: u16,
    max_back_tracker_compile_size: u16,
    quantifier_unroll_limit_single_cc: u16,
    quantifier_unroll_limit_group: u16,
}

impl Default for Options {
    fn default() -> Self {
        OptionsBuilder::new().finish()
    }
}

impl Options {
    pub fn builder() -> OptionsBuilder {
        OptionsBuilder::new()
    }

    /// A builder pre-populated with these options.
    pub fn to_builder(&self) -> OptionsBuilder {
        OptionsBuilder {
            options: self.clone(),
        }
    }

    fn toggle(&self, bit: u16) -> bool {
        self.toggles & bit != 0
    }

    pub fn u180e_whitespace(&self) -> bool {
        self.toggle(U180E_WHITESPACE)
    }

    pub fn regression_test_mode(&self) -> bool {
        self.toggle(REGRESSION_TEST_MODE)
    }

    pub fn dump_automata(&self) -> bool {
        self.toggle(DUMP_AUTOMATA)
    }

    pub fn step_execution(&self) -> bool {
        self.toggle(STEP_EXECUTION)
    }

    pub fn always_eager(&self) -> bool {
        self.toggle(ALWAYS_EAGER)
    }

    pub fn validate_only(&self) -> bool {
        self.toggle(VALIDATE_ONLY)
    }

    pub fn ignore_atomic_groups(&self) -> bool {
        self.toggle(IGNORE_ATOMIC_GROUPS)
    }

    pub fn generate_dfa_immediately(&self) -> bool {
        self.toggle(GENERATE_DFA_IMMEDIATELY)
    }

    pub fn boolean_match(&self) -> bool {
        self.toggle(BOOLEAN_MATCH)
    }

    pub fn must_advance(&self) -> bool {
        self.toggle(MUST_ADVANCE)
    }

    pub fn generate_input(&self) -> bool {
        self.toggle(GENERATE_INPUT)
    }

    pub fn force_linear_execution(&self) -> bool {
        self.toggle(FORCE_LINEAR_EXECUTION)
    }

    pub fn flavor(&self) -> Flavor {
        self.flavor
    }

    pub fn encoding(&self) -> Encoding {
        self.encoding
    }

    pub fn matching_mode(&self) -> Option<MatchingMode> {
        self.matching_mode
    }

    pub fn python_locale(&self) -> Option<&str> {
        self.python_locale.as_deref()
    }

    pub fn flavor_version(&self) -> u16 {
        self.flavor_version
    }

    pub fn max_dfa_size(&self) -> u16 {
        self.max_dfa_size
    }

    pub fn max_back_tracker_compile_size(&self) -> u16 {
        self.max_back_tracker_compile_size
    }

    pub fn quantifier_unroll_limit_single_cc(&self) -> u16 {
        self.quantifier_unroll_limit_single_cc
    }

    pub fn quantifier_unroll_limit_group(&self) -> u16 {
        self.quantifier_unroll_limit_group
    }

    /// Same options, with the boolean-match toggle set to `value`.
    pub fn with_boolean_match(&self, value: bool) -> Options {
        self.to_builder().boolean_match(value).finish()
    }
}

impl fmt::Display for Options {
    /// Renders the options in the inline syntax, listing only values that
    /// differ from the defaults.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let defaults = Options::default();
        let mut sep = "";
        for (key, bit) in BOOLEAN_OPTIONS {
            if self.toggle(bit) {
                write!(f, "{sep}{key}=true")?;
                sep = ",";
            }
        }
        if self.flavor != defaults.flavor {
            write!(f, "{sep}Flavor={}", self.flavor.name())?;
            sep = ",";
        }
        if self.encoding != defaults.encoding {
            write!(f, "{sep}Encoding={}", self.encoding.name())?;
            sep = ",";
        }
        if let Some(mode) = self.matching_mode {
            write!(f, "{sep}MatchingMode={}", mode.name())?;
            sep = ",";
        }
        if let Some(locale) = &self.python_locale {
            write!(f, "{sep}PythonLocale={locale}")?;
            sep = ",";
        }
        for option in NumericOption::ALL {
            let value = self.numeric(option);
            if value != defaults.numeric(option) {
                write!(f, "{sep}{}={value}", option.key())?;
                sep = ",";
            }
        }
        Ok(())
    }
}

impl Options {
    pub(crate) fn numeric(&self, option: NumericOption) -> u16 {
        match option {
            NumericOption::FlavorVersion => self.flavor_version,
            NumericOption::MaxDfaSize => self.max_dfa_size,
            NumericOption::MaxBackTrackerCompileSize => self.max_back_tracker_compile_size,
            NumericOption::QuantifierUnrollLimitSingleCC => self.quantifier_unroll_limit_single_cc,
            NumericOption::QuantifierUnrollLimitGroup => self.quantifier_unroll_limit_group,
        }
    }
}

/// Builder for [`Options`].
///
/// The setters do not validate; numeric bounds are enforced by the parsers
/// that feed the builder. [`OptionsBuilder::build`] consumes the builder.
#[derive(Debug, Clone)]
pub struct OptionsBuilder {
    options: Options,
}

impl Default for OptionsBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl OptionsBuilder {
    pub fn new() -> Self {
        Self {
            options: Options {
                toggles: 0,
                flavor: Flavor::default(),
                encoding: Encoding::default(),
                matching_mode: None,
                python_locale: None,
                flavor_version: 0,
                max_dfa_size: 2400,
                max_back_tracker_compile_size: 1000,
                quantifier_unroll_limit_single_cc: 20,
                quantifier_unroll_limit_group: 5,
            },
        }
    }

    pub(crate) fn toggle(mut self, bit: u16, value: bool) -> Self {
        if value {
            self.options.toggles |= bit;
        } else {
            self.options.toggles &= !bit;
        }
        self
    }

    pub fn u180e_whitespace(self, value: bool) -> Self {
        self.toggle(U180E_WHITESPACE, value)
    }

    pub fn regression_test_mode(self, value: bool) -> Self {
        self.toggle(REGRESSION_TEST_MODE, value)
    }

    pub fn dump_automata(self, value: bool) -> Self {
        self.toggle(DUMP_AUTOMATA, value)
    }

    pub fn step_execution(self, value: bool) -> Self {
        self.toggle(STEP_EXECUTION, value)
    }

    pub fn always_eager(self, value: bool) -> Self {
        self.toggle(ALWAYS_EAGER, value)
    }

    pub fn validate_only(self, value: bool) -> Self {
        self.toggle(VALIDATE_ONLY, value)
    }

    pub fn ignore_atomic_groups(self, value: bool) -> Self {
        self.toggle(IGNORE_ATOMIC_GROUPS, value)
    }

    pub fn generate_dfa_immediately(self, value: bool) -> Self {
        self.toggle(GENERATE_DFA_IMMEDIATELY, value)
    }

    pub fn boolean_match(self, value: bool) -> Self {
        self.toggle(BOOLEAN_MATCH, value)
    }

    pub fn must_advance(self, value: bool) -> Self {
        self.toggle(MUST_ADVANCE, value)
    }

    pub fn generate_input(self, value: bool) -> Self {
        self.toggle(GENERATE_INPUT, value)
    }

    pub fn force_linear_execution(self, value: bool) -> Self {
        self.toggle(FORCE_LINEAR_EXECUTION, value)
    }

    pub fn flavor(mut self, flavor: Flavor) -> Self {
        self.options.flavor = flavor;
        self
    }

    pub fn encoding(mut self, encoding: Encoding) -> Self {
        self.options.encoding = encoding;
        self
    }

    pub fn matching_mode(mut self, mode: Option<MatchingMode>) -> Self {
        self.options.matching_mode = mode;
        self
    }

    pub fn python_locale(mut self, locale: Option<String>) -> Self {
        self.options.python_locale = locale;
        self
    }

    pub fn flavor_version(self, value: u16) -> Self {
        self.numeric(NumericOption::FlavorVersion, value)
    }

    pub fn max_dfa_size(self, value: u16) -> Self {
        self.numeric(NumericOption::MaxDfaSize, value)
    }

    pub fn max_back_tracker_compile_size(self, value: u16) -> Self {
        self.numeric(NumericOption::MaxBackTrackerCompileSize, value)
    }

    pub fn quantifier_unroll_limit_single_cc(self, value: u16) -> Self {
        self.numeric(NumericOption::QuantifierUnrollLimitSingleCC, value)
    }

    pub fn quantifier_unroll_limit_group(self, value: u16) -> Self {
        self.numeric(NumericOption::QuantifierUnrollLimitGroup, value)
    }

    pub(crate) fn numeric(mut self, option: NumericOption, value: u16) -> Self {
        let slot = match option {
            NumericOption::FlavorVersion => &mut self.options.flavor_version,
            NumericOption::MaxDfaSize => &mut self.options.max_dfa_size,
            NumericOption::MaxBackTrackerCompileSize => {
                &mut self.options.max_back_tracker_compile_size
            }
            NumericOption::QuantifierUnrollLimitSingleCC => {
                &mut self.options.quantifier_unroll_limit_single_cc
            }
            NumericOption::QuantifierUnrollLimitGroup => {
                &mut self.options.quantifier_unroll_limit_group
            }
        };
        *slot = value;
        self
    }

    /// Check every numeric option against its bounds and produce the options.
    pub fn build(self) -> Result<Options, SyntaxError> {
        for option in NumericOption::ALL {
            check_numeric(option, u64::from(self.options.numeric(option)))?;
        }
        Ok(self.options)
    }

    /// Produce the options of a builder whose numeric values are already in range.
    pub(crate) fn finish(self) -> Options {
        self.options
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use crate::source::RegexSource;

    #[test]
    fn build_checks_numeric_bounds() {
        let err = Options::builder().max_dfa_size(40000).build().unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidOption);
        assert!(err.message.contains("MaxDFASize"));

        let err = Options::builder()
            .quantifier_unroll_limit_group(0)
            .build()
            .unwrap_err();
        assert!(err.message.contains("QuantifierUnrollLimitGroup"));
        assert!(Options::builder().quantifier_unroll_limit_single_cc(0).build().is_err());

        let options = Options::builder()
            .max_dfa_size(MAX_NUMERIC_OPTION)
            .quantifier_unroll_limit_group(1)
            .build()
            .unwrap();
        let source = RegexSource::new("a", "", options);
        let reparsed = RegexSource::parse_request(&source.to_string(), None).unwrap();
        assert_eq!(reparsed, source);
    }
}
