//! Chaining two compilers.

use std::time::{Duration, Instant};

use log::Level;

use crate::error::{CompileError, UnsupportedError};
use crate::source::RegexSource;

use super::RegexCompiler;

/// Tries `primary`, and `secondary` only if `primary` reports the pattern
/// as unsupported.
///
/// A syntax error from `primary` is final. If both compilers refuse the
/// pattern, the error carries both reasons as `"<primary>; <secondary>"`.
#[derive(Debug, Clone)]
pub struct FallbackCompiler<P, S> {
    primary: P,
    secondary: S,
}

impl<P, S> FallbackCompiler<P, S> {
    pub fn new(primary: P, secondary: S) -> Self {
        Self { primary, secondary }
    }
}

fn timed<T>(f: impl FnOnce() -> T) -> (T, Duration) {
    let start = Instant::now();
    let value = f();
    (value, start.elapsed())
}

impl<P, S> RegexCompiler for FallbackCompiler<P, S>
where
    P: RegexCompiler,
    S: RegexCompiler<Output = P::Output>,
{
    type Output = P::Output;

    fn compile(&self, source: &RegexSource) -> Result<Self::Output, CompileError> {
        let timing = log::log_enabled!(Level::Debug);
        let (result, primary_time) = timed(|| self.primary.compile(source));
        let reason = match result {
            Err(CompileError::Unsupported(e)) => e.reason,
            other => {
                if timing {
                    log::debug!(
                        "{}: total {}us, {} {}us",
                        source,
                        primary_time.as_micros(),
                        self.primary.name(),
                        primary_time.as_micros()
                    );
                }
                return other;
            }
        };
        log::trace!("{} unsupported by {}: {}", source, self.primary.name(), reason);

        let (result, secondary_time) = timed(|| self.secondary.compile(source));
        if timing {
            log::debug!(
                "{}: total {}us, {} {}us, {} {}us",
                source,
                (primary_time + secondary_time).as_micros(),
                self.primary.name(),
                primary_time.as_micros(),
                self.secondary.name(),
                secondary_time.as_micros()
            );
        }
        match result {
            Err(CompileError::Unsupported(e)) => Err(UnsupportedError::new(format!(
                "{reason}; {}",
                e.reason
            ))
            .with_source(source)
            .into()),
            other => other,
        }
    }

    fn name(&self) -> &str {
        "fallback"
    }
}
