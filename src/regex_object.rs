//! The matcher descriptor returned by the engine.
//!
//! A [`RegexObject`] pairs the metadata of a validated pattern with its
//! backend matcher and a [`RegexProfile`]. It is immutable apart from the
//! profile, and is shared through an `Arc` by every holder of the same
//! cached source.

use std::cell::OnceCell;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};

use crate::backend::{BackendCompiler, MatcherHandle};
use crate::error::{CompileError, UnsupportedError};
use crate::flags::Flags;
use crate::options::MatchingMode;
use crate::profile::RegexProfile;
use crate::source::RegexSource;
use crate::util::{Input, Span};

/// Backend side of a [`RegexObject`].
pub(crate) enum Matcher {
    /// `ValidateOnly`: nothing was compiled.
    Absent,
    /// Compiled on first use, unless the engine forced it already.
    Deferred {
        backend: Arc<BackendCompiler>,
        /// Default-dialect source handed to the backend
        lowered: RegexSource,
        compiled: OnceLock<Result<MatcherHandle, CompileError>>,
    },
}

impl Matcher {
    pub(crate) fn deferred(backend: Arc<BackendCompiler>, lowered: RegexSource) -> Self {
        Matcher::Deferred {
            backend,
            lowered,
            compiled: OnceLock::new(),
        }
    }
}

pub struct RegexObject {
    source: RegexSource,
    flags: Flags,
    group_count: usize,
    group_names: Vec<Option<String>>,
    profile: Arc<RegexProfile>,
    eager_captures: AtomicBool,
    matcher: Matcher,
}

impl RegexObject {
    pub(crate) fn new(
        source: RegexSource,
        flags: Flags,
        group_count: usize,
        group_names: Vec<Option<String>>,
        matcher: Matcher,
    ) -> Self {
        Self {
            source,
            flags,
            group_count,
            group_names,
            profile: Arc::new(RegexProfile::new()),
            eager_captures: AtomicBool::new(false),
            matcher,
        }
    }

    pub fn source(&self) -> &RegexSource {
        &self.source
    }

    /// Flags of the default dialect the pattern was lowered with.
    pub fn flags(&self) -> Flags {
        self.flags
    }

    /// Number of capture groups, including group 0.
    pub fn group_count(&self) -> usize {
        self.group_count
    }

    pub fn group_names(&self) -> &[Option<String>] {
        &self.group_names
    }

    /// Index of the group called `name`.
    pub fn group_index(&self, name: &str) -> Option<usize> {
        self.group_names
            .iter()
            .position(|n| n.as_deref() == Some(name))
    }

    pub fn profile(&self) -> &Arc<RegexProfile> {
        &self.profile
    }

    /// Whether a backend matcher exists or can be built.
    pub fn is_executable(&self) -> bool {
        !matches!(self.matcher, Matcher::Absent)
    }

    /// Whether the backend matcher is already built.
    pub fn is_compiled(&self) -> bool {
        match &self.matcher {
            Matcher::Absent => false,
            Matcher::Deferred { compiled, .. } => compiled.get().is_some(),
        }
    }

    /// Force compilation of the backend matcher.
    pub fn compile_now(&self) -> Result<(), CompileError> {
        self.matcher().map(|_| ())
    }

    fn matcher(&self) -> Result<&MatcherHandle, CompileError> {
        match &self.matcher {
            Matcher::Absent => Err(UnsupportedError::new("regex was compiled with ValidateOnly")
                .with_source(&self.source)
                .into()),
            Matcher::Deferred {
                backend,
                lowered,
                compiled,
            } => compiled
                .get_or_init(|| {
                    log::trace!("compiling {lowered} with {}", backend.name());
                    backend.compile(lowered)
                })
                .as_ref()
                .map_err(Clone::clone),
        }
    }

    fn anchored(&self) -> bool {
        self.flags.sticky()
            || matches!(
                self.source.options().matching_mode(),
                Some(MatchingMode::Match | MatchingMode::FullMatch)
            )
    }

    /// Whether executions currently compute all capture groups.
    pub fn uses_eager_captures(&self) -> bool {
        self.source.options().always_eager() || self.eager_captures.load(Ordering::Relaxed)
    }

    /// Re-evaluate the heuristics. Called after every execution has been
    /// recorded; acts only at trip points.
    fn evaluate_profile(&self, matcher: &MatcherHandle) {
        if !self.profile.at_evaluation_trip_point() {
            return;
        }
        let eager = self.profile.should_use_eager_capture_groups();
        if eager != self.eager_captures.swap(eager, Ordering::Relaxed) {
            log::debug!("{}: eager capture groups {eager}", self.source);
        }
        if self.profile.should_generate_full_automaton() && matcher.generate_full_automaton() {
            log::debug!(
                "{}: generated full automaton after {} calls",
                self.source,
                self.profile.calls()
            );
            self.profile.reset();
        }
    }

    /// Search `subject` starting at byte offset `from`.
    ///
    /// Returns `Ok(None)` when there is no match, including when `from` is
    /// out of bounds. An error means the backend matcher could not be built.
    pub fn exec<'r, 's>(
        &'r self,
        subject: &'s str,
        from: usize,
    ) -> Result<Option<RegexMatch<'r, 's>>, CompileError> {
        let matcher = self.matcher()?;
        self.profile.record_call();
        let found = self.search(matcher, subject, from);
        self.evaluate_profile(matcher);
        Ok(found)
    }

    fn search<'r, 's>(
        &'r self,
        matcher: &MatcherHandle,
        subject: &'s str,
        from: usize,
    ) -> Option<RegexMatch<'r, 's>> {
        let options = self.source.options();
        let boolean = options.boolean_match();
        let eager = !boolean && self.uses_eager_captures();
        let mut spans = vec![Span::invalid(); if eager { self.group_count } else { 1 }];
        let anchored = self.anchored();
        let mut start = from;
        loop {
            let input = Input::new(subject)
                .starting_at(start)
                .anchored(anchored)
                .first_match(boolean);
            if !input.valid() || !matcher.exec(&input, &mut spans) {
                return None;
            }
            if !(options.must_advance() && spans[0].empty() && spans[0].from == from) {
                break;
            }
            if anchored {
                return None;
            }
            start += subject[start..].chars().next()?.len_utf8();
        }

        let whole = spans[0];
        self.profile.record_match(whole.len(), whole.to - from);
        let groups = OnceCell::new();
        if eager || self.group_count == 1 {
            let _ = groups.set(spans.into_boxed_slice());
        }
        Some(RegexMatch {
            object: self,
            subject,
            whole,
            groups,
        })
    }

    pub fn is_match(&self, subject: &str) -> Result<bool, CompileError> {
        Ok(self.exec(subject, 0)?.is_some())
    }

    /// Iterate over successive non-overlapping matches.
    pub fn matches<'r, 's>(&'r self, subject: &'s str) -> Matches<'r, 's> {
        Matches {
            object: self,
            subject,
            from: Some(0),
            last_end: None,
        }
    }
}

impl fmt::Debug for RegexObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegexObject")
            .field("source", &self.source)
            .field("flags", &self.flags)
            .field("group_count", &self.group_count)
            .field("executable", &self.is_executable())
            .finish()
    }
}

/// A successful execution of a [`RegexObject`].
///
/// Unless capture groups were computed eagerly, group bounds other than
/// the overall match are computed on first access.
pub struct RegexMatch<'r, 's> {
    object: &'r RegexObject,
    subject: &'s str,
    whole: Span,
    groups: OnceCell<Box<[Span]>>,
}

impl<'r, 's> RegexMatch<'r, 's> {
    pub fn start(&self) -> usize {
        self.whole.from
    }

    pub fn end(&self) -> usize {
        self.whole.to
    }

    pub fn span(&self) -> Span {
        self.whole
    }

    pub fn as_str(&self) -> &'s str {
        &self.subject[self.whole.from..self.whole.to]
    }

    pub fn group_count(&self) -> usize {
        self.object.group_count
    }

    /// Bounds of group `index`, if it participated in the match.
    pub fn get(&self, index: usize) -> Option<Span> {
        self.object.profile.record_capture_group_access();
        if index == 0 {
            return Some(self.whole);
        }
        if index >= self.object.group_count || self.object.source.options().boolean_match() {
            return None;
        }
        let groups = self.groups.get_or_init(|| self.recompute_groups());
        groups.get(index).copied().filter(Span::valid)
    }

    pub fn get_str(&self, index: usize) -> Option<&'s str> {
        self.get(index).map(|s| &self.subject[s.from..s.to])
    }

    pub fn name(&self, name: &str) -> Option<Span> {
        self.get(self.object.group_index(name)?)
    }

    /// Anchored re-run at the match start. This finds the same match, so it
    /// only has to fill in the groups.
    fn recompute_groups(&self) -> Box<[Span]> {
        let mut spans = vec![Span::invalid(); self.object.group_count].into_boxed_slice();
        let Ok(matcher) = self.object.matcher() else {
            return spans;
        };
        let input = Input::new(self.subject)
            .starting_at(self.whole.from)
            .anchored(true);
        if !matcher.exec(&input, &mut spans) || spans[0] != self.whole {
            log::warn!(
                "{}: capture groups re-run did not reproduce the match",
                self.object.source
            );
        }
        spans
    }
}

impl fmt::Debug for RegexMatch<'_, '_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegexMatch")
            .field("span", &self.whole)
            .field("text", &self.as_str())
            .finish()
    }
}

/// Iterator returned by [`RegexObject::matches`].
pub struct Matches<'r, 's> {
    object: &'r RegexObject,
    subject: &'s str,
    from: Option<usize>,
    last_end: Option<usize>,
}

impl Matches<'_, '_> {
    fn after_char(&self, pos: usize) -> Option<usize> {
        self.subject[pos..].chars().next().map(|c| pos + c.len_utf8())
    }
}

impl<'r, 's> Iterator for Matches<'r, 's> {
    type Item = Result<RegexMatch<'r, 's>, CompileError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let from = self.from?;
            let found = match self.object.exec(self.subject, from) {
                Ok(Some(found)) => found,
                Ok(None) => {
                    self.from = None;
                    return None;
                }
                Err(e) => {
                    self.from = None;
                    return Some(Err(e));
                }
            };
            let end = found.end();
            // No empty match right where the previous one ended
            if found.whole.empty() && self.last_end == Some(end) {
                self.from = self.after_char(end);
                continue;
            }
            self.last_end = Some(end);
            self.from = if found.whole.empty() {
                self.after_char(end)
            } else {
                Some(end)
            };
            return Some(Ok(found));
        }
    }
}
