//! Top-level entry point.
//!
//! [`RegexEngine`] turns requests into [`RegexObject`]s: the source goes
//! through its dialect processor (or the default flags parser), is
//! validated, and is handed to the backend as a default-dialect source.
//! Results are memoized per [`RegexSource`] unless caching is disabled or
//! the source asks for `RegressionTestMode`.

use std::sync::Arc;

use crate::backend::{self, BackendCompiler};
use crate::compiler::cache::{CacheStats, DEFAULT_CAPACITY};
use crate::compiler::{CachingCompiler, RegexCompiler};
use crate::error::{CompileError, UnsupportedError};
use crate::flags::Flags;
use crate::flavor::{FlavorRegistry, Lowered};
use crate::options::{Flavor, MatchingMode, OptionLookup};
use crate::regex_object::{Matcher, RegexObject};
use crate::source::RegexSource;
use crate::syntax;

/// Engine-wide configuration.
#[derive(Clone)]
pub struct EngineConfig {
    /// Number of retained compilation results, `None` disables caching.
    pub cache_capacity: Option<usize>,
    pub flavors: FlavorRegistry,
    pub backend: Arc<BackendCompiler>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            cache_capacity: Some(DEFAULT_CAPACITY),
            flavors: FlavorRegistry::default(),
            backend: backend::default_backend(),
        }
    }
}

#[derive(Clone, Default)]
pub struct Builder {
    config: EngineConfig,
}

impl Builder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cache_capacity(mut self, capacity: Option<usize>) -> Self {
        self.config.cache_capacity = capacity;
        self
    }

    pub fn flavors(mut self, flavors: FlavorRegistry) -> Self {
        self.config.flavors = flavors;
        self
    }

    pub fn backend(mut self, backend: Arc<BackendCompiler>) -> Self {
        self.config.backend = backend;
        self
    }

    pub fn build(self) -> RegexEngine {
        let uncached = Arc::new(EngineCompiler {
            flavors: self.config.flavors,
            backend: self.config.backend,
        });
        let cache = self
            .config
            .cache_capacity
            .map(|capacity| CachingCompiler::with_capacity(uncached.clone(), capacity));
        RegexEngine { uncached, cache }
    }
}

/// Pattern wrapped so that a match must extend to the end of the subject.
fn full_match_pattern(pattern: &str) -> String {
    // A trailing comment of a verbose pattern would swallow the ')'
    let close = if pattern.starts_with("(?x)") { "\n)" } else { ")" };
    format!("(?:{pattern}{close}\\z")
}

/// The uncached compile path.
struct EngineCompiler {
    flavors: FlavorRegistry,
    backend: Arc<BackendCompiler>,
}

impl EngineCompiler {
    fn lower(&self, source: &RegexSource) -> Result<Lowered, CompileError> {
        let flavor = source.options().flavor();
        if flavor.is_default() {
            return Ok(Lowered {
                pattern: source.pattern().to_owned(),
                flags: Flags::parse(source.flags())?,
            });
        }
        let Some(processor) = self.flavors.get(flavor) else {
            return Err(UnsupportedError::new(format!(
                "no processor registered for flavor {}",
                flavor.name()
            ))
            .with_source(source)
            .into());
        };
        Ok(processor.process(source)?)
    }
}

impl RegexCompiler for EngineCompiler {
    type Output = Arc<RegexObject>;

    fn compile(&self, source: &RegexSource) -> Result<Arc<RegexObject>, CompileError> {
        let options = source.options();
        let lowered = self.lower(source)?;
        let info = syntax::validate(&lowered.pattern, lowered.flags, options, source)?;

        if options.validate_only() {
            log::trace!("validated {source}");
            return Ok(Arc::new(RegexObject::new(
                source.clone(),
                lowered.flags,
                info.group_count,
                info.group_names,
                Matcher::Absent,
            )));
        }

        let pattern = match options.matching_mode() {
            Some(MatchingMode::FullMatch) => full_match_pattern(&lowered.pattern),
            _ => lowered.pattern,
        };
        let backend_options = options.to_builder().flavor(Flavor::ECMAScript).finish();
        let backend_source =
            RegexSource::new(pattern, lowered.flags.canonical_text(), backend_options)
                .with_origin(source.to_string());
        let object = RegexObject::new(
            source.clone(),
            lowered.flags,
            info.group_count,
            info.group_names,
            Matcher::deferred(self.backend.clone(), backend_source),
        );
        if options.regression_test_mode() || options.generate_dfa_immediately() {
            object.compile_now()?;
        }
        log::debug!(
            "compiled {source} ({} groups, flags '{}')",
            info.group_count,
            lowered.flags
        );
        Ok(Arc::new(object))
    }

    fn name(&self) -> &str {
        "engine"
    }
}

/// Compiles requests into [`RegexObject`]s.
pub struct RegexEngine {
    uncached: Arc<EngineCompiler>,
    cache: Option<CachingCompiler<Arc<EngineCompiler>>>,
}

impl Default for RegexEngine {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl RegexEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn builder() -> Builder {
        Builder::new()
    }

    /// Compile a request of the form `[options]/pattern/flags`.
    ///
    /// A request starting with `/` reads its options from `lookup`.
    pub fn compile(
        &self,
        request: &str,
        lookup: Option<&dyn OptionLookup>,
    ) -> Result<Arc<RegexObject>, CompileError> {
        let source = RegexSource::parse_request(request, lookup)?;
        self.compile_source(&source)
    }

    pub fn compile_source(&self, source: &RegexSource) -> Result<Arc<RegexObject>, CompileError> {
        match &self.cache {
            Some(cache) if !source.options().regression_test_mode() => cache.compile(source),
            _ => self.uncached.compile(source),
        }
    }

    /// Run every check `compile` runs, without building a matcher.
    pub fn validate(
        &self,
        request: &str,
        lookup: Option<&dyn OptionLookup>,
    ) -> Result<(), CompileError> {
        let source = RegexSource::parse_request(request, lookup)?;
        let options = source.options().to_builder().validate_only(true).finish();
        self.compile_source(&source.with_options(options)).map(|_| ())
    }

    pub fn cache_stats(&self) -> Option<CacheStats> {
        self.cache.as_ref().map(CachingCompiler::stats)
    }

    pub fn clear_cache(&self) {
        if let Some(cache) = &self.cache {
            cache.clear();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_match_wrapping() {
        assert_eq!(full_match_pattern("a|ab"), r"(?:a|ab)\z");
        assert_eq!(full_match_pattern("(?x)a # c"), "(?:(?x)a # c\n)\\z");
    }

    #[test]
    fn missing_flavor_processor() {
        let engine = RegexEngine::builder()
            .flavors(FlavorRegistry::empty())
            .build();
        let err = engine.compile("Flavor=Ruby/a/", None).unwrap_err();
        assert!(err.is_unsupported());
    }
}
