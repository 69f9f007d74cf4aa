//! Memoizing compiler.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, OnceLock, PoisonError};

use ahash::RandomState;
use hashlink::LinkedHashMap;

use crate::error::CompileError;
use crate::result::CompilationResult;
use crate::source::RegexSource;

use super::RegexCompiler;

/// Default number of retained results.
pub const DEFAULT_CAPACITY: usize = 64;

type Slot<T> = Arc<OnceLock<CompilationResult<T>>>;

/// Wraps a compiler with a bounded, least-recently-used memo table keyed by
/// [`RegexSource`].
///
/// Successes and both error kinds are stored alike. Concurrent requests for
/// the same source share one slot: one thread compiles while the others
/// wait for its result, so the wrapped compiler runs at most once per
/// retained key. Evicting a slot does not affect results already handed
/// out.
pub struct CachingCompiler<C: RegexCompiler> {
    inner: C,
    capacity: usize,
    table: Mutex<LinkedHashMap<RegexSource, Slot<C::Output>, RandomState>>,
    hits: AtomicU64,
    compilations: AtomicU64,
}

/// Snapshot of a cache's counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub compilations: u64,
    pub len: usize,
}

impl<C: RegexCompiler> CachingCompiler<C> {
    pub fn new(inner: C) -> Self {
        Self::with_capacity(inner, DEFAULT_CAPACITY)
    }

    pub fn with_capacity(inner: C, capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            inner,
            capacity,
            table: Mutex::new(LinkedHashMap::with_capacity_and_hasher(
                capacity,
                RandomState::new(),
            )),
            hits: AtomicU64::new(0),
            compilations: AtomicU64::new(0),
        }
    }

    pub fn inner(&self) -> &C {
        &self.inner
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Compile `source`, or replay the stored outcome of an earlier call.
    pub fn compile_cached(&self, source: &RegexSource) -> CompilationResult<C::Output> {
        let slot = self.slot(source);
        slot.get_or_init(|| {
            self.compilations.fetch_add(1, Ordering::Relaxed);
            log::trace!("cache miss for {source}");
            self.inner.compile(source).into()
        })
        .clone()
    }

    /// Find or create the slot of `source`, evicting the least recently
    /// used entries beyond capacity.
    fn slot(&self, source: &RegexSource) -> Slot<C::Output> {
        let mut table = self.table.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(slot) = table.to_back(source) {
            self.hits.fetch_add(1, Ordering::Relaxed);
            return slot.clone();
        }
        let slot = Slot::<C::Output>::default();
        table.insert(source.clone(), slot.clone());
        while table.len() > self.capacity {
            if let Some((evicted, _)) = table.pop_front() {
                log::debug!("evicted {evicted} from regex cache");
            }
        }
        slot
    }

    pub fn contains(&self, source: &RegexSource) -> bool {
        self.table
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(source)
    }

    pub fn clear(&self) {
        self.table
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    pub fn stats(&self) -> CacheStats {
        let len = self.table.lock().unwrap_or_else(PoisonError::into_inner).len();
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            compilations: self.compilations.load(Ordering::Relaxed),
            len,
        }
    }
}

impl<C: RegexCompiler> RegexCompiler for CachingCompiler<C> {
    type Output = C::Output;

    fn compile(&self, source: &RegexSource) -> Result<Self::Output, CompileError> {
        self.compile_cached(source).into_result()
    }

    fn name(&self) -> &str {
        self.inner.name()
    }
}
