//! Compilation front end of a regular-expression engine.
//!
//! A request such as `MaxDFASize=4000,Flavor=Python/a+b/i` is split into a
//! [`RegexSource`], validated against its dialect, and compiled into a
//! [`RegexObject`]. Results, including both kinds of errors, are cached by
//! source.
//!
//! ```
//! use rxfront::RegexEngine;
//!
//! let engine = RegexEngine::new();
//! let regex = engine.compile("/(\\w+)@(\\w+)/", None).unwrap();
//! let found = regex.exec("mail bob@example", 0).unwrap().unwrap();
//! assert_eq!(found.get_str(2), Some("example"));
//! ```

pub mod backend;
pub mod compiler;
pub mod engine;
pub mod error;
pub mod flags;
pub mod flavor;
pub mod options;
pub mod profile;
pub mod regex_object;
pub mod result;
pub mod source;
pub mod syntax;
pub mod util;

pub use compiler::{CachingCompiler, FallbackCompiler, RegexCompiler};
pub use engine::{EngineConfig, RegexEngine};
pub use error::{CompileError, ErrorCode, SyntaxError, UnsupportedError};
pub use flags::Flags;
pub use options::{Encoding, Flavor, MatchingMode, Options};
pub use profile::RegexProfile;
pub use regex_object::{RegexMatch, RegexObject};
pub use result::CompilationResult;
pub use source::RegexSource;
