mod utils;

use std::sync::Arc;
use std::thread;

use rxfront::{CachingCompiler, CompileError, ErrorCode, FallbackCompiler, RegexCompiler};
use utils::{AlwaysSucceeds, AlwaysUnsupported, CountingCompiler, RaisesSyntaxError, source};

#[test]
fn fallback_joins_both_reasons() {
    let compiler = FallbackCompiler::new(AlwaysUnsupported("A"), AlwaysUnsupported("B"));
    let src = source("abc");
    match compiler.compile(&src) {
        Err(CompileError::Unsupported(e)) => {
            assert_eq!(e.reason, "A; B");
            assert_eq!(e.regex_source, Some(src));
        }
        other => panic!("expected unsupported, got {other:?}"),
    }
}

#[test]
fn fallback_never_retries_syntax_errors() {
    let secondary = Arc::new(CountingCompiler::new(AlwaysSucceeds));
    let compiler = FallbackCompiler::new(RaisesSyntaxError, secondary.clone());
    let err = compiler.compile(&source("abc")).unwrap_err();
    let syntax = err.as_syntax().unwrap();
    assert_eq!(syntax.position, 3);
    assert_eq!(syntax.code, ErrorCode::InvalidPattern);
    assert_eq!(secondary.calls(), 0);
}

#[test]
fn fallback_propagates_secondary_outcome() {
    let compiler = FallbackCompiler::new(AlwaysUnsupported("A"), AlwaysSucceeds);
    assert_eq!(compiler.compile(&source("abc")), Ok("abc".to_owned()));

    let compiler = FallbackCompiler::new(AlwaysUnsupported("A"), RaisesSyntaxError);
    assert!(compiler.compile(&source("abc")).unwrap_err().as_syntax().is_some());
}

#[test]
fn concurrent_requests_compile_once() {
    const THREADS: usize = 8;
    let counting = Arc::new(CountingCompiler::new(AlwaysSucceeds));
    let cache = CachingCompiler::new(counting.clone());
    let src = source("a+b");

    let results: Vec<_> = thread::scope(|s| {
        let handles: Vec<_> = (0..THREADS)
            .map(|_| s.spawn(|| cache.compile_cached(&src).into_result()))
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    assert_eq!(results.len(), THREADS);
    for result in &results {
        assert_eq!(result, &Ok("a+b".to_owned()));
    }
    assert!(counting.calls() < THREADS);
    assert_eq!(counting.calls(), 1);
    assert_eq!(cache.stats().compilations, 1);
}

#[test]
fn errors_are_cached() {
    let unsupported = Arc::new(CountingCompiler::new(AlwaysUnsupported("nope")));
    let cache = CachingCompiler::new(unsupported.clone());
    for _ in 0..3 {
        assert!(cache.compile(&source("x")).unwrap_err().is_unsupported());
    }
    assert_eq!(unsupported.calls(), 1);

    let syntax = Arc::new(CountingCompiler::new(RaisesSyntaxError));
    let cache = CachingCompiler::new(syntax.clone());
    let first = cache.compile(&source("x")).unwrap_err();
    let second = cache.compile(&source("x")).unwrap_err();
    assert_eq!(first, second);
    assert_eq!(syntax.calls(), 1);
}

#[test]
fn least_recently_used_is_evicted() {
    let cache = CachingCompiler::with_capacity(AlwaysSucceeds, 2);
    let (a, b, c) = (source("a"), source("b"), source("c"));
    cache.compile_cached(&a);
    cache.compile_cached(&b);
    cache.compile_cached(&a);
    cache.compile_cached(&c);

    assert!(cache.contains(&a));
    assert!(!cache.contains(&b));
    assert!(cache.contains(&c));
    let stats = cache.stats();
    assert_eq!(stats.len, 2);
    assert_eq!(stats.hits, 1);
    assert_eq!(stats.compilations, 3);
}

#[test]
fn evicted_results_stay_valid() {
    let cache = CachingCompiler::with_capacity(AlwaysSucceeds, 1);
    let first = cache.compile(&source("a")).unwrap();
    cache.compile(&source("b")).unwrap();
    assert!(!cache.contains(&source("a")));
    assert_eq!(first, "a");
}

#[test]
fn boolean_match_sources_are_distinct_keys() {
    let counting = Arc::new(CountingCompiler::new(AlwaysSucceeds));
    let cache = CachingCompiler::new(counting.clone());
    let src = source("abc");
    let boolean = src.with_boolean_match(true);
    assert_ne!(src, boolean);
    assert_eq!(boolean.with_boolean_match(false), src);

    cache.compile_cached(&src);
    cache.compile_cached(&boolean);
    cache.compile_cached(&boolean);
    assert_eq!(counting.calls(), 2);
    assert_eq!(cache.stats().len, 2);
}

#[test]
fn origin_does_not_split_keys() {
    let counting = Arc::new(CountingCompiler::new(AlwaysSucceeds));
    let cache = CachingCompiler::new(counting.clone());
    cache.compile_cached(&source("abc"));
    cache.compile_cached(&source("abc").with_origin("script.js:12"));
    assert_eq!(counting.calls(), 1);
}
