//! Outcome of compiling one [`crate::RegexSource`].

use crate::error::{CompileError, SyntaxError, UnsupportedError};

/// Exactly one of: a compiled value, a syntax error, or an unsupported
/// pattern error.
///
/// This is what the cache stores, so all three outcomes replay the same
/// way and a failing request is never compiled twice.
#[derive(Debug, Clone)]
pub enum CompilationResult<T> {
    Compiled(T),
    SyntaxError(SyntaxError),
    Unsupported(UnsupportedError),
}

impl<T> CompilationResult<T> {
    pub fn is_compiled(&self) -> bool {
        matches!(self, CompilationResult::Compiled(_))
    }

    pub fn as_result(&self) -> Result<&T, CompileError> {
        match self {
            CompilationResult::Compiled(value) => Ok(value),
            CompilationResult::SyntaxError(e) => Err(CompileError::Syntax(e.clone())),
            CompilationResult::Unsupported(e) => Err(CompileError::Unsupported(e.clone())),
        }
    }

    pub fn into_result(self) -> Result<T, CompileError> {
        match self {
            CompilationResult::Compiled(value) => Ok(value),
            CompilationResult::SyntaxError(e) => Err(CompileError::Syntax(e)),
            CompilationResult::Unsupported(e) => Err(CompileError::Unsupported(e)),
        }
    }
}

impl<T> From<Result<T, CompileError>> for CompilationResult<T> {
    fn from(value: Result<T, CompileError>) -> Self {
        match value {
            Ok(value) => CompilationResult::Compiled(value),
            Err(CompileError::Syntax(e)) => CompilationResult::SyntaxError(e),
            Err(CompileError::Unsupported(e)) => CompilationResult::Unsupported(e),
        }
    }
}
