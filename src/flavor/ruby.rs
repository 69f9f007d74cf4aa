use crate::error::SyntaxError;
use crate::flags::Flags;
use crate::options::Flavor;
use crate::source::RegexSource;

use super::{FlavorProcessor, Lowered, parse_letters, rewrite_escapes};

/// Ruby regexp options: ignore case, multiline (dot matches newline),
/// extended.
const RUBY_FLAGS: &str = "imx";

pub struct RubyFlavor;

impl FlavorProcessor for RubyFlavor {
    fn flavor(&self) -> Flavor {
        Flavor::Ruby
    }

    fn process(&self, source: &RegexSource) -> Result<Lowered, SyntaxError> {
        let letters = parse_letters(source.flags(), RUBY_FLAGS)?;
        let has = |c: char| letters.contains(&c);

        // In Ruby, ^ and $ always match at line boundaries and `m` is what
        // other dialects call dot-all.
        let flags = Flags::builder()
            .ignore_case(has('i'))
            .multiline(true)
            .dot_all(has('m'))
            .unicode(true)
            .build();

        let body = rewrite_escapes(source.pattern(), |c| match c {
            'h' => Some("[0-9a-fA-F]"),
            'H' => Some("[^0-9a-fA-F]"),
            _ => None,
        });
        let pattern = if has('x') { format!("(?x){body}") } else { body };
        Ok(Lowered { pattern, flags })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use crate::options::Options;

    fn ruby(pattern: &str, flags: &str) -> Result<Lowered, SyntaxError> {
        let options = Options::builder().flavor(Flavor::Ruby).build().unwrap();
        RubyFlavor.process(&RegexSource::new(pattern, flags, options))
    }

    #[test]
    fn m_means_dot_all() {
        let lowered = ruby("^a.$", "m").unwrap();
        assert!(lowered.flags.dot_all());
        assert!(lowered.flags.multiline());
        assert!(!ruby("a", "").unwrap().flags.dot_all());
    }

    #[test]
    fn hex_escapes() {
        assert_eq!(ruby(r"\h+\H\\h", "").unwrap().pattern, r"[0-9a-fA-F]+[^0-9a-fA-F]\\h");
    }

    #[test]
    fn rejects_other_flags() {
        let err = ruby("a", "ig").unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidFlag);
        assert_eq!(err.position, 1);
    }
}
