use crate::error::{ErrorCode, SyntaxError};
use crate::flags::Flags;
use crate::options::{Encoding, Flavor};
use crate::source::RegexSource;

use super::{FlavorProcessor, Lowered, parse_letters, rewrite_escapes};

/// Python `re` flags: ascii, ignorecase, locale, multiline, dotall,
/// unicode, verbose.
const PYTHON_FLAGS: &str = "aiLmsux";

pub struct PythonFlavor;

fn position_of(text: &str, c: char) -> usize {
    text.find(c).unwrap_or_default()
}

impl FlavorProcessor for PythonFlavor {
    fn flavor(&self) -> Flavor {
        Flavor::Python
    }

    fn process(&self, source: &RegexSource) -> Result<Lowered, SyntaxError> {
        let text = source.flags();
        let letters = parse_letters(text, PYTHON_FLAGS)?;
        let has = |c: char| letters.contains(&c);

        let type_flags: Vec<char> = letters
            .iter()
            .copied()
            .filter(|c| matches!(c, 'a' | 'u' | 'L'))
            .collect();
        if type_flags.len() > 1 {
            return Err(SyntaxError::new(
                "flags 'a', 'u' and 'L' are incompatible",
                position_of(text, type_flags[1]),
                ErrorCode::IncompatibleFlags,
            ));
        }
        let bytes = source.options().encoding() == Encoding::Bytes;
        if has('L') && !bytes {
            return Err(SyntaxError::new(
                "cannot use LOCALE flag with a str pattern",
                position_of(text, 'L'),
                ErrorCode::UnsupportedFlag,
            ));
        }
        if has('u') && bytes {
            return Err(SyntaxError::new(
                "cannot use UNICODE flag with a bytes pattern",
                position_of(text, 'u'),
                ErrorCode::UnsupportedFlag,
            ));
        }

        let unicode = !bytes && !has('a');
        let flags = Flags::builder()
            .ignore_case(has('i'))
            .multiline(has('m'))
            .dot_all(has('s'))
            .unicode(unicode)
            .build();

        // Python's \Z is the absolute end of input.
        let body = rewrite_escapes(source.pattern(), |c| (c == 'Z').then_some(r"\z"));
        let pattern = if has('x') { format!("(?x){body}") } else { body };
        Ok(Lowered { pattern, flags })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::Options;

    fn python(pattern: &str, flags: &str) -> Result<Lowered, SyntaxError> {
        let options = Options::builder().flavor(Flavor::Python).build().unwrap();
        PythonFlavor.process(&RegexSource::new(pattern, flags, options))
    }

    fn python_bytes(pattern: &str, flags: &str) -> Result<Lowered, SyntaxError> {
        let options = Options::builder()
            .flavor(Flavor::Python)
            .encoding(Encoding::Bytes)
            .build()
            .unwrap();
        PythonFlavor.process(&RegexSource::new(pattern, flags, options))
    }

    #[test]
    fn lowers_flags() {
        let lowered = python(r"a.b\Z", "smi").unwrap();
        assert_eq!(lowered.pattern, r"a.b\z");
        assert_eq!(lowered.flags.canonical_text(), "imsu");

        let lowered = python("a b", "xa").unwrap();
        assert_eq!(lowered.pattern, "(?x)a b");
        assert_eq!(lowered.flags.canonical_text(), "");
    }

    #[test]
    fn type_flags_are_exclusive() {
        let err = python("a", "iau").unwrap_err();
        assert_eq!(err.code, ErrorCode::IncompatibleFlags);
        assert_eq!(err.position, 2);
    }

    #[test]
    fn locale_needs_bytes() {
        let err = python("a", "L").unwrap_err();
        assert_eq!(err.code, ErrorCode::UnsupportedFlag);
        assert!(python_bytes("a", "L").is_ok());
        assert!(python_bytes("a", "u").is_err());
    }

    #[test]
    fn unknown_and_repeated() {
        assert_eq!(python("a", "g").unwrap_err().code, ErrorCode::InvalidFlag);
        assert_eq!(python("a", "ii").unwrap_err().position, 1);
        assert_eq!(python("a", "iß").unwrap_err().position, 1);
    }
}
