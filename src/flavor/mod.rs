//! Dialects other than the default one.
//!
//! A [`FlavorProcessor`] validates a source written in its dialect and
//! lowers it to an equivalent default-dialect pattern and [`Flags`], which
//! then go through the same validation and backends as every other
//! pattern. Processors are looked up in a [`FlavorRegistry`] owned by the
//! engine configuration.

mod python;
mod ruby;

use std::collections::HashMap;
use std::sync::Arc;

use crate::error::{ErrorCode, SyntaxError};
use crate::flags::Flags;
use crate::options::Flavor;
use crate::source::RegexSource;

pub use python::PythonFlavor;
pub use ruby::RubyFlavor;

/// A source lowered to the default dialect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Lowered {
    pub pattern: String,
    pub flags: Flags,
}

pub trait FlavorProcessor: Send + Sync {
    fn flavor(&self) -> Flavor;

    fn process(&self, source: &RegexSource) -> Result<Lowered, SyntaxError>;
}

/// Mapping from [`Flavor`] to its processor.
#[derive(Clone)]
pub struct FlavorRegistry {
    processors: HashMap<Flavor, Arc<dyn FlavorProcessor>>,
}

impl FlavorRegistry {
    /// A registry without processors.
    pub fn empty() -> Self {
        Self {
            processors: HashMap::new(),
        }
    }

    pub fn register(&mut self, processor: Arc<dyn FlavorProcessor>) {
        self.processors.insert(processor.flavor(), processor);
    }

    pub fn get(&self, flavor: Flavor) -> Option<&Arc<dyn FlavorProcessor>> {
        self.processors.get(&flavor)
    }
}

impl Default for FlavorRegistry {
    fn default() -> Self {
        let mut registry = Self::empty();
        registry.register(Arc::new(PythonFlavor));
        registry.register(Arc::new(RubyFlavor));
        registry
    }
}

/// Single-letter flags of a dialect, parsed with the same rules as the
/// default flags: letters from `alphabet`, each at most once. Error
/// positions are byte offsets into `text`.
pub(crate) fn parse_letters(text: &str, alphabet: &str) -> Result<Vec<char>, SyntaxError> {
    let mut seen = Vec::with_capacity(text.len());
    for (i, c) in text.char_indices() {
        if !alphabet.contains(c) {
            return Err(SyntaxError::new(
                format!("invalid flag '{c}'"),
                i,
                ErrorCode::InvalidFlag,
            ));
        }
        if seen.contains(&c) {
            return Err(SyntaxError::new(
                format!("repeated flag '{c}'"),
                i,
                ErrorCode::RepeatedFlag,
            ));
        }
        seen.push(c);
    }
    Ok(seen)
}

/// Copy `pattern`, passing every escape sequence `\c` through `escape`,
/// which returns the replacement text or `None` to keep it.
pub(crate) fn rewrite_escapes(
    pattern: &str,
    escape: impl Fn(char) -> Option<&'static str>,
) -> String {
    let mut out = String::with_capacity(pattern.len());
    let mut chars = pattern.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some(escaped) => match escape(escaped) {
                Some(replacement) => out.push_str(replacement),
                None => {
                    out.push('\\');
                    out.push(escaped);
                }
            },
            None => out.push('\\'),
        }
    }
    out
}
