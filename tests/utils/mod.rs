#![allow(dead_code)]

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;
use std::time::Duration;

use regex as rust_regex;
use rxfront::backend::{BackendCompiler, ForeignCompiler, NativeCompiler, default_backend};
use rxfront::{
    CompileError, ErrorCode, Options, RegexCompiler, RegexEngine, RegexObject, RegexSource,
    SyntaxError, UnsupportedError,
};

/// Always refuses the pattern with the given reason.
pub struct AlwaysUnsupported(pub &'static str);

impl RegexCompiler for AlwaysUnsupported {
    type Output = String;

    fn compile(&self, source: &RegexSource) -> Result<String, CompileError> {
        Err(UnsupportedError::new(self.0).with_source(source).into())
    }
}

/// Always reports a syntax error at position 3.
pub struct RaisesSyntaxError;

impl RegexCompiler for RaisesSyntaxError {
    type Output = String;

    fn compile(&self, _: &RegexSource) -> Result<String, CompileError> {
        Err(SyntaxError::new("bad pattern", 3, ErrorCode::InvalidPattern).into())
    }
}

/// Compiles every pattern to its own text.
pub struct AlwaysSucceeds;

impl RegexCompiler for AlwaysSucceeds {
    type Output = String;

    fn compile(&self, source: &RegexSource) -> Result<String, CompileError> {
        Ok(source.pattern().to_owned())
    }
}

/// Counts invocations and delegates to `inner`. The delay widens the window
/// in which concurrent callers can race on the same key.
pub struct CountingCompiler<C> {
    pub inner: C,
    pub calls: AtomicUsize,
    pub delay: Duration,
}

impl<C> CountingCompiler<C> {
    pub fn new(inner: C) -> Self {
        Self {
            inner,
            calls: AtomicUsize::new(0),
            delay: Duration::from_millis(20),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl<C: RegexCompiler> RegexCompiler for CountingCompiler<C> {
    type Output = C::Output;

    fn compile(&self, source: &RegexSource) -> Result<C::Output, CompileError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        thread::sleep(self.delay);
        self.inner.compile(source)
    }
}

pub fn source(pattern: &str) -> RegexSource {
    RegexSource::new(pattern, "", Options::default())
}

/// Compile a pattern with every backend configuration. Compilation is
/// forced, so a refused pattern fails here rather than at first use.
/// Returns None if it fails everywhere; panics on an inconsistency.
pub fn compile_all(pattern: &str) -> Option<Vec<Arc<RegexObject>>> {
    let forced = Options::builder().regression_test_mode(true);
    let configs: [(&str, Arc<BackendCompiler>, Options); 4] = [
        ("fallback", default_backend(), forced.clone().build().unwrap()),
        ("foreign", Arc::new(ForeignCompiler), forced.clone().build().unwrap()),
        (
            "fallback-eager",
            default_backend(),
            forced.clone().always_eager(true).build().unwrap(),
        ),
        ("native", Arc::new(NativeCompiler), forced.build().unwrap()),
    ];
    let mut objects = Vec::new();
    let mut must_fail = None;
    for (name, backend, options) in configs {
        let engine = RegexEngine::builder().backend(backend).build();
        let result = engine.compile_source(&RegexSource::new(pattern, "", options));
        match (result, must_fail) {
            (Ok(object), None | Some(false)) => {
                must_fail = Some(false);
                objects.push(object);
            }
            (Err(_), Some(true)) => (),
            (Err(e), None) => {
                assert!(!e.is_unsupported(), "{name} refused {pattern:?}: {e}");
                must_fail = Some(true);
            }
            // The native backend alone may refuse what the others accept
            (Err(e), Some(false)) if name == "native" && e.is_unsupported() => (),
            (result, _) => panic!("Inconsistency detected for {pattern:?} on {name}: {result:?}"),
        }
    }
    if must_fail == Some(true) { None } else { Some(objects) }
}

fn groups<'s>(m: &rxfront::RegexMatch<'_, 's>) -> Vec<Option<&'s str>> {
    (0..m.group_count()).map(|i| m.get_str(i)).collect()
}

/// Match a pattern against an input with every configuration and with
/// rust-regex, and compare both compilation and execution.
pub fn check_all_engines(pattern: &str, input: &str) {
    let rust = rust_regex::Regex::new(pattern);
    let ours = compile_all(pattern);

    match (rust, ours) {
        (Ok(rust_re), Some(objects)) => {
            let rust_match = rust_re.find(input).map(|m| (m.start(), m.end()));
            let rust_all: Vec<_> = rust_re
                .find_iter(input)
                .map(|m| (m.start(), m.end()))
                .collect();
            let rust_groups = rust_re.captures(input).map(|caps| {
                (0..caps.len())
                    .map(|i| caps.get(i).map(|m| m.as_str()))
                    .collect::<Vec<_>>()
            });
            let rust_all_groups: Vec<Vec<Option<&str>>> = rust_re
                .captures_iter(input)
                .map(|caps| (0..caps.len()).map(|i| caps.get(i).map(|m| m.as_str())).collect())
                .collect();

            for object in &objects {
                let found = object.exec(input, 0).unwrap();
                let my_match = found.as_ref().map(|m| (m.start(), m.end()));
                assert_eq!(
                    my_match, rust_match,
                    "Mismatch for pattern {pattern:?} input {input:?} (find)"
                );

                let my_groups = found.as_ref().map(groups);
                assert_eq!(
                    my_groups, rust_groups,
                    "Mismatch for pattern {pattern:?} input {input:?} (captures)"
                );

                let all: Vec<_> = object
                    .matches(input)
                    .map(|m| m.unwrap())
                    .collect();
                let my_all: Vec<_> = all.iter().map(|m| (m.start(), m.end())).collect();
                assert_eq!(
                    my_all, rust_all,
                    "Mismatch for pattern {pattern:?} input {input:?} (find_iter)"
                );
                let my_all_groups: Vec<_> = all.iter().map(groups).collect();
                assert_eq!(
                    my_all_groups, rust_all_groups,
                    "Mismatch for pattern {pattern:?} input {input:?} (captures_iter)"
                );
            }
        }
        (Err(_), None) => {}
        (Ok(_), None) => panic!("Our engines failed to compile {pattern:?} but rust-regex succeeded"),
        (Err(e), Some(_)) => panic!("rust-regex failed to compile {pattern:?} but we succeeded: {e}"),
    }
}
