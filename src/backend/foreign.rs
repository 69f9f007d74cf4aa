//! Backend delegating to the `regex` crate.

use std::sync::Arc;

use regex::{Regex, RegexBuilder};

use super::{CompiledMatcher, MatcherHandle};
use crate::compiler::RegexCompiler;
use crate::error::{CompileError, UnsupportedError};
use crate::flags::Flags;
use crate::source::RegexSource;
use crate::syntax;
use crate::util::{Input, Span};

/// Bytes of compiled program allowed per unit of `MaxBackTrackerCompileSize`.
const SIZE_LIMIT_UNIT: usize = 10 * 1024;

#[derive(Debug, Clone, Copy, Default)]
pub struct ForeignCompiler;

impl RegexCompiler for ForeignCompiler {
    type Output = MatcherHandle;

    fn compile(&self, source: &RegexSource) -> Result<MatcherHandle, CompileError> {
        let flags = Flags::parse(source.flags())?;
        let options = source.options();
        let unicode = syntax::is_unicode(flags, options);
        let pattern = syntax::effective_pattern(source.pattern(), options);
        let size_limit = usize::from(options.max_back_tracker_compile_size()).max(1) * SIZE_LIMIT_UNIT;
        let regex = RegexBuilder::new(&pattern)
            .case_insensitive(flags.ignore_case())
            .multi_line(flags.multiline())
            .dot_matches_new_line(flags.dot_all())
            .unicode(unicode)
            .size_limit(size_limit)
            .build()
            .map_err(|e| {
                let reason = match e {
                    regex::Error::CompiledTooBig(limit) => {
                        format!("compiled regex exceeds the size limit of {limit} bytes")
                    }
                    other => other.to_string(),
                };
                UnsupportedError::new(reason).with_source(source)
            })?;
        Ok(Arc::new(ForeignMatcher { regex }))
    }

    fn name(&self) -> &str {
        "foreign"
    }
}

#[derive(Debug)]
pub struct ForeignMatcher {
    regex: Regex,
}

impl CompiledMatcher for ForeignMatcher {
    fn group_count(&self) -> usize {
        self.regex.captures_len()
    }

    fn exec(&self, input: &Input<'_>, captures: &mut [Span]) -> bool {
        if !input.valid() {
            return false;
        }
        // A match starting at `from` is always the leftmost one, so an
        // anchored search is an unanchored one checked for its start.
        if captures.is_empty() && !input.anchored {
            return self.regex.is_match_at(input.subject, input.from);
        }
        if captures.len() == 1 || captures.is_empty() {
            return match self.regex.find_at(input.subject, input.from) {
                Some(m) if !input.anchored || m.start() == input.from => {
                    if let Some(slot) = captures.first_mut() {
                        *slot = Span::new(m.start(), m.end());
                    }
                    true
                }
                _ => false,
            };
        }
        let Some(caps) = self.regex.captures_at(input.subject, input.from) else {
            return false;
        };
        if input.anchored && caps.get(0).is_some_and(|m| m.start() != input.from) {
            return false;
        }
        for (i, slot) in captures.iter_mut().enumerate() {
            *slot = caps
                .get(i)
                .map_or(Span::invalid(), |m| Span::new(m.start(), m.end()));
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::Options;

    fn compile(pattern: &str, flags: &str) -> Result<MatcherHandle, CompileError> {
        ForeignCompiler.compile(&RegexSource::new(pattern, flags, Options::default()))
    }

    #[test]
    fn word_boundaries() {
        let matcher = compile(r"\bfoo\b", "").unwrap();
        let mut spans = [Span::invalid()];
        assert!(matcher.exec(&Input::new("a foo b"), &mut spans));
        assert_eq!(spans[0], Span::new(2, 5));
        assert!(!matcher.exec(&Input::new("afoo"), &mut spans));
    }

    #[test]
    fn anchored() {
        let matcher = compile("b+", "").unwrap();
        let mut spans = [Span::invalid(); 1];
        assert!(!matcher.exec(&Input::new("abb").anchored(true), &mut spans));
        assert!(matcher.exec(&Input::new("abb").starting_at(1).anchored(true), &mut spans));
        assert_eq!(spans[0], Span::new(1, 3));
    }

    #[test]
    fn size_limit_is_unsupported() {
        let options = Options::builder().max_back_tracker_compile_size(1).build().unwrap();
        let source = RegexSource::new(r"\w{50}\w{50}", "u", options);
        let err = ForeignCompiler.compile(&source).unwrap_err();
        assert!(err.is_unsupported(), "{err}");
    }
}
