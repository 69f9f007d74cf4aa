//! Dialect-neutral pattern validation.
//!
//! Patterns of the default dialect are checked with `regex-syntax`. The
//! resulting [`Hir`] is shared with the backends, which must agree with the
//! validator on what a well-formed pattern is.

use regex_syntax::ast::ErrorKind as AstErrorKind;
use regex_syntax::hir::{Hir, HirKind};
use regex_syntax::{Parser, ParserBuilder};

use crate::error::{CompileError, ErrorCode, SyntaxError, UnsupportedError};
use crate::flags::Flags;
use crate::options::Options;
use crate::source::RegexSource;

/// A validated pattern.
#[derive(Debug, Clone)]
pub struct PatternInfo {
    pub hir: Hir,
    /// Number of capture groups, including the implicit group 0.
    pub group_count: usize,
    /// Name of each group, by group index.
    pub group_names: Vec<Option<String>>,
}

/// Whether the pattern is interpreted over code points rather than bytes.
pub(crate) fn is_unicode(flags: Flags, options: &Options) -> bool {
    flags.either_unicode() || !options.encoding().is_single_byte()
}

pub(crate) fn parser_for(flags: Flags, options: &Options) -> Parser {
    let unicode = is_unicode(flags, options);
    ParserBuilder::new()
        .case_insensitive(flags.ignore_case())
        .multi_line(flags.multiline())
        .dot_matches_new_line(flags.dot_all())
        .unicode(unicode)
        .utf8(unicode)
        .build()
}

fn ast_code(kind: &AstErrorKind) -> ErrorCode {
    match kind {
        AstErrorKind::ClassUnclosed => ErrorCode::UnmatchedBracket,
        AstErrorKind::ClassRangeInvalid
        | AstErrorKind::ClassRangeLiteral
        | AstErrorKind::ClassEscapeInvalid => ErrorCode::InvalidCharacterClass,
        AstErrorKind::GroupUnclosed | AstErrorKind::GroupUnopened => {
            ErrorCode::UnmatchedParenthesis
        }
        AstErrorKind::EscapeUnrecognized
        | AstErrorKind::EscapeUnexpectedEof
        | AstErrorKind::EscapeHexEmpty
        | AstErrorKind::EscapeHexInvalid
        | AstErrorKind::EscapeHexInvalidDigit => ErrorCode::InvalidEscape,
        AstErrorKind::RepetitionMissing
        | AstErrorKind::RepetitionCountInvalid
        | AstErrorKind::RepetitionCountUnclosed
        | AstErrorKind::RepetitionCountDecimalEmpty => ErrorCode::InvalidQuantifier,
        AstErrorKind::GroupNameDuplicate { .. } => ErrorCode::DuplicateGroupName,
        AstErrorKind::GroupNameEmpty
        | AstErrorKind::GroupNameInvalid
        | AstErrorKind::GroupNameUnexpectedEof => ErrorCode::InvalidGroupName,
        AstErrorKind::FlagDanglingNegation
        | AstErrorKind::FlagDuplicate { .. }
        | AstErrorKind::FlagRepeatedNegation { .. }
        | AstErrorKind::FlagUnexpectedEof
        | AstErrorKind::FlagUnrecognized => ErrorCode::InvalidInlineFlag,
        _ => ErrorCode::InvalidPattern,
    }
}

/// Constructs the default dialect accepts but `regex-syntax` cannot represent.
fn is_unsupported(err: &regex_syntax::Error) -> bool {
    use regex_syntax::hir::ErrorKind as HirErrorKind;
    match err {
        regex_syntax::Error::Parse(e) => matches!(
            e.kind(),
            AstErrorKind::UnsupportedLookAround | AstErrorKind::UnsupportedBackreference
        ),
        regex_syntax::Error::Translate(e) => matches!(
            e.kind(),
            HirErrorKind::UnicodePerlClassNotFound | HirErrorKind::UnicodeCaseUnavailable
        ),
        _ => false,
    }
}

fn to_compile_error(err: regex_syntax::Error, source: &RegexSource) -> CompileError {
    if is_unsupported(&err) {
        return UnsupportedError::new(err.to_string()).with_source(source).into();
    }
    let syntax = match err {
        regex_syntax::Error::Parse(e) => {
            SyntaxError::new(e.kind().to_string(), e.span().start.offset, ast_code(e.kind()))
        }
        regex_syntax::Error::Translate(e) => SyntaxError::new(
            e.kind().to_string(),
            e.span().start.offset,
            ErrorCode::InvalidPattern,
        ),
        e => SyntaxError::new(e.to_string(), 0, ErrorCode::InvalidPattern),
    };
    syntax.into()
}

/// Replace atomic groups `(?>...)` by plain non-capturing groups.
fn strip_atomic_groups(pattern: &str) -> String {
    let mut out = String::with_capacity(pattern.len());
    let mut chars = pattern.chars().peekable();
    let mut in_class = false;
    while let Some(c) = chars.next() {
        out.push(c);
        match c {
            '\\' => {
                if let Some(escaped) = chars.next() {
                    out.push(escaped);
                }
            }
            '[' => in_class = true,
            ']' => in_class = false,
            '(' if !in_class => {
                let mut ahead = chars.clone();
                if ahead.next() == Some('?') && ahead.next() == Some('>') {
                    chars.next();
                    chars.next();
                    out.push_str("?:");
                }
            }
            _ => (),
        }
    }
    out
}

fn collect_names(hir: &Hir, names: &mut Vec<Option<String>>) {
    match hir.kind() {
        HirKind::Capture(capture) => {
            let index = capture.index as usize;
            if names.len() <= index {
                names.resize(index + 1, None);
            }
            names[index] = capture.name.as_deref().map(str::to_owned);
            collect_names(&capture.sub, names);
        }
        HirKind::Repetition(repetition) => collect_names(&repetition.sub, names),
        HirKind::Concat(hirs) | HirKind::Alternation(hirs) => {
            for hir in hirs {
                collect_names(hir, names);
            }
        }
        _ => (),
    }
}

/// The pattern text the backends see for `pattern` under `options`.
pub(crate) fn effective_pattern<'p>(
    pattern: &'p str,
    options: &Options,
) -> std::borrow::Cow<'p, str> {
    if options.ignore_atomic_groups() && pattern.contains("(?>") {
        std::borrow::Cow::Owned(strip_atomic_groups(pattern))
    } else {
        std::borrow::Cow::Borrowed(pattern)
    }
}

/// Validate a default-dialect pattern.
///
/// `source` is the request the pattern was derived from. It is attached to
/// the error when the pattern is well formed but cannot be represented.
pub fn validate(
    pattern: &str,
    flags: Flags,
    options: &Options,
    source: &RegexSource,
) -> Result<PatternInfo, CompileError> {
    let pattern = effective_pattern(pattern, options);
    let hir = parser_for(flags, options)
        .parse(&pattern)
        .map_err(|e| to_compile_error(e, source))?;
    let group_count = hir.properties().explicit_captures_len() + 1;
    let mut group_names = vec![None; group_count];
    collect_names(&hir, &mut group_names);
    Ok(PatternInfo {
        hir,
        group_count,
        group_names,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn check(pattern: &str) -> Result<PatternInfo, CompileError> {
        let source = RegexSource::new(pattern, "", Options::default());
        validate(pattern, Flags::EMPTY, &Options::default(), &source)
    }

    fn check_syntax(pattern: &str) -> SyntaxError {
        match check(pattern) {
            Err(CompileError::Syntax(e)) => e,
            other => panic!("expected a syntax error for {pattern:?}, got {other:?}"),
        }
    }

    #[test]
    fn counts_groups_and_names() {
        let info = check(r"(a)(?P<word>\w+)(?:c)").unwrap();
        assert_eq!(info.group_count, 3);
        assert_eq!(info.group_names, vec![None, None, Some("word".to_owned())]);
    }

    #[test]
    fn error_codes_and_offsets() {
        let err = check_syntax("ab[c");
        assert_eq!(err.code, ErrorCode::UnmatchedBracket);
        assert_eq!(err.position, 2);

        let err = check_syntax("a(b");
        assert_eq!(err.code, ErrorCode::UnmatchedParenthesis);

        let err = check_syntax("x{2,1}");
        assert_eq!(err.code, ErrorCode::InvalidQuantifier);

        let err = check_syntax("(?P<n>a)(?P<n>b)");
        assert_eq!(err.code, ErrorCode::DuplicateGroupName);
    }

    #[test]
    fn unrepresentable_constructs_are_unsupported() {
        for pattern in [r"(?=a)a", r"(?<=a)b", r"(a)\1"] {
            match check(pattern) {
                Err(CompileError::Unsupported(e)) => {
                    let source = e.regex_source.expect("source attached");
                    assert_eq!(source.pattern(), pattern);
                }
                other => panic!("expected unsupported for {pattern:?}, got {other:?}"),
            }
        }
    }

    #[test]
    fn atomic_groups() {
        assert!(check("(?>ab)").is_err());
        let options = Options::builder().ignore_atomic_groups(true).build().unwrap();
        let source = RegexSource::new(r"(?>a)", "", options.clone());
        let info = validate(r"(?>a)[(?>]\(?>", Flags::EMPTY, &options, &source);
        assert!(info.is_ok());
        assert_eq!(strip_atomic_groups(r"(?>a)[(?>]\(?>"), r"(?:a)[(?>]\(?>");
    }
}
