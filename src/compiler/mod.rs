//! Composable compilers.
//!
//! Everything that turns a [`RegexSource`] into something executable
//! implements [`RegexCompiler`]: the concrete backends, the
//! [`FallbackCompiler`] that chains two of them, the [`CachingCompiler`]
//! that memoizes any of them, and the engine itself.

pub mod cache;
pub mod fallback;

use std::sync::Arc;

use crate::error::CompileError;
use crate::source::RegexSource;

pub use cache::CachingCompiler;
pub use fallback::FallbackCompiler;

/// Turns a [`RegexSource`] into a compiled value or a typed error.
///
/// Implementations must be pure functions of the source: the result may be
/// cached and shared between threads.
pub trait RegexCompiler: Send + Sync {
    type Output: Clone + Send + Sync;

    fn compile(&self, source: &RegexSource) -> Result<Self::Output, CompileError>;

    /// Name used in diagnostics.
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }
}

impl<C: RegexCompiler + ?Sized> RegexCompiler for Arc<C> {
    type Output = C::Output;

    fn compile(&self, source: &RegexSource) -> Result<Self::Output, CompileError> {
        (**self).compile(source)
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}

impl<C: RegexCompiler + ?Sized> RegexCompiler for Box<C> {
    type Output = C::Output;

    fn compile(&self, source: &RegexSource) -> Result<Self::Output, CompileError> {
        (**self).compile(source)
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}
