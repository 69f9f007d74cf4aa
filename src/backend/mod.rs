//! Concrete backends behind the [`RegexCompiler`] capability.
//!
//! The engine only depends on [`CompiledMatcher`]. Two implementations are
//! provided: [`NativeCompiler`], a Thompson bytecode run by a Pike VM, and
//! [`ForeignCompiler`], which delegates to the `regex` crate. The native
//! one refuses some constructs, which is what [`default_backend`] chains
//! the foreign one for.

pub mod bytecode;
pub mod foreign;
pub mod pike_vm;

use std::fmt;
use std::sync::Arc;

use crate::compiler::{FallbackCompiler, RegexCompiler};
use crate::error::{CompileError, UnsupportedError};
use crate::flags::Flags;
use crate::source::RegexSource;
use crate::syntax;
use crate::util::{Input, Span};

pub use foreign::ForeignCompiler;
pub use pike_vm::PikeVM;

/// An executable regex.
pub trait CompiledMatcher: Send + Sync + fmt::Debug {
    /// Number of capture groups, including group 0.
    fn group_count(&self) -> usize;

    /// Search `input`, writing the bounds of the first `captures.len()`
    /// groups of the match on success. Slots of groups that did not
    /// participate are left [`Span::invalid`].
    fn exec(&self, input: &Input<'_>, captures: &mut [Span]) -> bool;

    /// Build the full automaton ahead of time, if this backend can.
    /// Returns whether anything was done.
    fn generate_full_automaton(&self) -> bool {
        false
    }
}

pub type MatcherHandle = Arc<dyn CompiledMatcher>;

/// Backend compiler as stored by the engine.
pub type BackendCompiler = dyn RegexCompiler<Output = MatcherHandle>;

/// Native backend: compiles to [`bytecode`] and executes on a [`PikeVM`].
#[derive(Debug, Clone, Copy, Default)]
pub struct NativeCompiler;

impl RegexCompiler for NativeCompiler {
    type Output = MatcherHandle;

    fn compile(&self, source: &RegexSource) -> Result<MatcherHandle, CompileError> {
        let flags = Flags::parse(source.flags())?;
        let options = source.options();
        let info = syntax::validate(source.pattern(), flags, options, source)?;
        if !info.hir.properties().is_utf8() {
            return Err(UnsupportedError::new("pattern can match invalid UTF-8")
                .with_source(source)
                .into());
        }
        let limits = bytecode::Limits::from(options);
        let code = bytecode::Compiler::compile(info.hir, limits)
            .map_err(|e| UnsupportedError::new(e.to_string()).with_source(source))?;
        let max = usize::from(options.max_dfa_size());
        if max > 0 && code.instructions.len() > max {
            return Err(UnsupportedError::new(format!(
                "automaton of {} states exceeds MaxDFASize {max}",
                code.instructions.len()
            ))
            .with_source(source)
            .into());
        }
        Ok(Arc::new(PikeVM::new(code, info.group_count)))
    }

    fn name(&self) -> &str {
        "native"
    }
}

/// The native backend, falling back to the foreign one.
pub fn default_backend() -> Arc<BackendCompiler> {
    Arc::new(FallbackCompiler::new(NativeCompiler, ForeignCompiler))
}
