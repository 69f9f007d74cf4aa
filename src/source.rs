//! The identity of a compile request.

use std::fmt;
use std::hash::{DefaultHasher, Hash, Hasher};
use std::sync::{Arc, OnceLock};

use crate::error::{ErrorCode, SyntaxError};
use crate::options::parser::DELIMITER;
use crate::options::{self, OptionLookup, Options};

/// Immutable (pattern, flags, options) triple.
///
/// This is the cache key of the engine. Two sources are equal iff their
/// pattern, flags text and options are equal; the origin is carried for
/// diagnostics only. Cloning is cheap and clones share the cached hash.
#[derive(Clone)]
pub struct RegexSource {
    inner: Arc<Inner>,
}

struct Inner {
    pattern: String,
    flags: String,
    options: Options,
    origin: Option<Arc<str>>,
    hash: OnceLock<u64>,
}

impl RegexSource {
    pub fn new(pattern: impl Into<String>, flags: impl Into<String>, options: Options) -> Self {
        Self {
            inner: Arc::new(Inner {
                pattern: pattern.into(),
                flags: flags.into(),
                options,
                origin: None,
                hash: OnceLock::new(),
            }),
        }
    }

    pub fn with_origin(self, origin: impl Into<Arc<str>>) -> Self {
        let inner = &self.inner;
        Self {
            inner: Arc::new(Inner {
                pattern: inner.pattern.clone(),
                flags: inner.flags.clone(),
                options: inner.options.clone(),
                origin: Some(origin.into()),
                hash: OnceLock::new(),
            }),
        }
    }

    /// Split a request of the form `[options]/pattern/flags`.
    ///
    /// If the request starts with the delimiter, the options are read from
    /// `lookup` (or are the defaults); otherwise they are parsed from the
    /// inline block. The pattern runs up to the last delimiter.
    pub fn parse_request(
        request: &str,
        lookup: Option<&dyn OptionLookup>,
    ) -> Result<RegexSource, SyntaxError> {
        let (options, start) = if request.as_bytes().first() == Some(&DELIMITER) {
            let options = match lookup {
                Some(lookup) => options::structured::from_lookup(lookup)?,
                None => Options::default(),
            };
            (options, 0)
        } else {
            options::parse_inline(request)?
        };
        let body = &request[start + 1..];
        let Some(end) = body.rfind(DELIMITER as char) else {
            return Err(SyntaxError::new(
                "missing '/' closing the pattern",
                request.len(),
                ErrorCode::InvalidRequest,
            ));
        };
        Ok(RegexSource::new(&body[..end], &body[end + 1..], options))
    }

    pub fn pattern(&self) -> &str {
        &self.inner.pattern
    }

    pub fn flags(&self) -> &str {
        &self.inner.flags
    }

    pub fn options(&self) -> &Options {
        &self.inner.options
    }

    pub fn origin(&self) -> Option<&str> {
        self.inner.origin.as_deref()
    }

    /// A new source with the same pattern and flags but other options.
    pub fn with_options(&self, options: Options) -> RegexSource {
        let source = RegexSource::new(self.pattern(), self.flags(), options);
        match &self.inner.origin {
            Some(origin) => source.with_origin(origin.clone()),
            None => source,
        }
    }

    /// Derived source that differs only by the boolean-match option. It is
    /// a distinct cache key.
    pub fn with_boolean_match(&self, value: bool) -> RegexSource {
        if self.options().boolean_match() == value {
            return self.clone();
        }
        self.with_options(self.options().with_boolean_match(value))
    }

    fn cached_hash(&self) -> u64 {
        *self.inner.hash.get_or_init(|| {
            let mut s = DefaultHasher::new();
            self.inner.pattern.hash(&mut s);
            self.inner.flags.hash(&mut s);
            self.inner.options.hash(&mut s);
            s.finish()
        })
    }
}

impl PartialEq for RegexSource {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
            || (self.cached_hash() == other.cached_hash()
                && self.inner.pattern == other.inner.pattern
                && self.inner.flags == other.inner.flags
                && self.inner.options == other.inner.options)
    }
}

impl Eq for RegexSource {}

impl Hash for RegexSource {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u64(self.cached_hash());
    }
}

impl fmt::Debug for RegexSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegexSource")
            .field("pattern", &self.inner.pattern)
            .field("flags", &self.inner.flags)
            .field("options", &self.inner.options)
            .field("origin", &self.inner.origin)
            .finish()
    }
}

impl fmt::Display for RegexSource {
    /// The request text this source would be parsed from.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.options(), self.pattern(), self.flags())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::Flavor;

    #[test]
    fn equality_ignores_origin() {
        let a = RegexSource::new("a+", "g", Options::default());
        let b = RegexSource::new("a+", "g", Options::default()).with_origin("test.js:3");
        assert_eq!(a, b);
        assert_eq!(b.origin(), Some("test.js:3"));

        let mut s1 = DefaultHasher::new();
        a.hash(&mut s1);
        let mut s2 = DefaultHasher::new();
        b.hash(&mut s2);
        assert_eq!(s1.finish(), s2.finish());
    }

    #[test]
    fn options_take_part_in_equality() {
        let a = RegexSource::new("a", "", Options::default());
        let ruby = Options::builder().flavor(Flavor::Ruby).build().unwrap();
        let b = RegexSource::new("a", "", ruby);
        assert_ne!(a, b);
        assert_ne!(a, a.with_boolean_match(true));
        assert_eq!(a, a.with_boolean_match(true).with_boolean_match(false));
    }

    #[test]
    fn parse_inline_request() {
        let source =
            RegexSource::parse_request("MaxDFASize=4000,Flavor=ECMAScript/ab/i", None).unwrap();
        assert_eq!(source.pattern(), "ab");
        assert_eq!(source.flags(), "i");
        assert_eq!(source.options().max_dfa_size(), 4000);
    }

    #[test]
    fn pattern_runs_to_last_delimiter() {
        let source = RegexSource::parse_request("/a\\/b/c/gm", None).unwrap();
        assert_eq!(source.pattern(), "a\\/b/c");
        assert_eq!(source.flags(), "gm");
    }

    #[test]
    fn structured_request() {
        let mut config = serde_json::Map::new();
        config.insert("Flavor".into(), "Python".into());
        let source = RegexSource::parse_request("/a/i", Some(&config)).unwrap();
        assert_eq!(source.options().flavor(), Flavor::Python);
    }

    #[test]
    fn display_reparses() {
        let source = RegexSource::parse_request("MustAdvance=true,Flavor=Ruby/x|y/m", None).unwrap();
        let reparsed = RegexSource::parse_request(&source.to_string(), None).unwrap();
        assert_eq!(source, reparsed);
    }

    #[test]
    fn missing_closing_delimiter() {
        let err = RegexSource::parse_request("/abc", None).unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidRequest);
        assert_eq!(err.position, 4);
    }
}
