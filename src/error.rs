//! Error types shared by every stage of compilation.
//!
//! Two kinds of failure can come out of a compile request: a
//! [`SyntaxError`], which is final and never retried, and an
//! [`UnsupportedError`], which only says that one particular backend could
//! not handle a pattern that is otherwise well formed.

use std::fmt;

use thiserror::Error;

use crate::source::RegexSource;

/// Stable, machine readable classification of a [`SyntaxError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    InvalidFlag,
    RepeatedFlag,
    IncompatibleFlags,
    InvalidOption,
    InvalidRequest,
    UnmatchedBracket,
    UnmatchedParenthesis,
    InvalidEscape,
    InvalidQuantifier,
    InvalidCharacterClass,
    InvalidGroupName,
    DuplicateGroupName,
    InvalidInlineFlag,
    UnsupportedFlag,
    InvalidPattern,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::InvalidFlag => "InvalidFlag",
            ErrorCode::RepeatedFlag => "RepeatedFlag",
            ErrorCode::IncompatibleFlags => "IncompatibleFlags",
            ErrorCode::InvalidOption => "InvalidOption",
            ErrorCode::InvalidRequest => "InvalidRequest",
            ErrorCode::UnmatchedBracket => "UnmatchedBracket",
            ErrorCode::UnmatchedParenthesis => "UnmatchedParenthesis",
            ErrorCode::InvalidEscape => "InvalidEscape",
            ErrorCode::InvalidQuantifier => "InvalidQuantifier",
            ErrorCode::InvalidCharacterClass => "InvalidCharacterClass",
            ErrorCode::InvalidGroupName => "InvalidGroupName",
            ErrorCode::DuplicateGroupName => "DuplicateGroupName",
            ErrorCode::InvalidInlineFlag => "InvalidInlineFlag",
            ErrorCode::UnsupportedFlag => "UnsupportedFlag",
            ErrorCode::InvalidPattern => "InvalidPattern",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A malformed option block, flags text or pattern.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message} at position {position} ({code})")]
pub struct SyntaxError {
    pub message: String,
    /// Byte offset into the text the error was raised for.
    pub position: usize,
    pub code: ErrorCode,
}

impl SyntaxError {
    pub fn new(message: impl Into<String>, position: usize, code: ErrorCode) -> Self {
        Self {
            message: message.into(),
            position,
            code,
        }
    }

    /// Same error, with its position shifted by `offset`. Used when a
    /// sub-parser reports positions relative to a slice of a larger text.
    pub fn shifted(mut self, offset: usize) -> Self {
        self.position += offset;
        self
    }
}

/// A pattern that is valid but that a given backend cannot compile.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unsupported regex: {reason}")]
pub struct UnsupportedError {
    pub reason: String,
    /// The request that was refused, when known.
    pub regex_source: Option<RegexSource>,
}

impl UnsupportedError {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
            regex_source: None,
        }
    }

    pub fn with_source(mut self, source: &RegexSource) -> Self {
        self.regex_source = Some(source.clone());
        self
    }
}

/// Either of the two ways compiling a [`RegexSource`] can fail.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CompileError {
    #[error(transparent)]
    Syntax(#[from] SyntaxError),
    #[error(transparent)]
    Unsupported(#[from] UnsupportedError),
}

impl CompileError {
    pub fn is_unsupported(&self) -> bool {
        matches!(self, CompileError::Unsupported(_))
    }

    pub fn as_syntax(&self) -> Option<&SyntaxError> {
        match self {
            CompileError::Syntax(e) => Some(e),
            CompileError::Unsupported(_) => None,
        }
    }
}
