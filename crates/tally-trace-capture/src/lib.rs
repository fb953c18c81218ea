//! Call stack capture for tally.
//!
//! Walks the current thread's stack with the `backtrace` crate and resolves
//! every instruction pointer into [`Frame`]s. Inlined calls expand into one
//! frame per inlined function, innermost first.

use std::error::Error;
use std::fmt;
use std::num::NonZeroUsize;

use tally_trace_types::{Frame, InvariantError};

/// Frames whose function path starts with one of these belong to the capture
/// machinery itself and are dropped from the top of every capture.
const CAPTURE_NOISE: &[&str] = &[
    "backtrace::",
    "backtrace_rs::",
    "_Unwind_",
    "tally_trace_capture::capture_current",
    "tally_trace_capture::platform::",
];

/// Upper bound on leading noise frames we are willing to walk past.
const NOISE_BUDGET: usize = 32;

#[derive(Debug, Clone, Copy)]
pub struct CaptureOptions {
    pub max_frames: NonZeroUsize,
    pub skip_frames: usize,
}

impl Default for CaptureOptions {
    fn default() -> Self {
        Self {
            max_frames: NonZeroUsize::new(64).unwrap_or(NonZeroUsize::MIN),
            skip_frames: 0,
        }
    }
}

#[derive(Debug)]
pub enum CaptureError {
    EmptyBacktrace,
    InvariantViolation {
        context: &'static str,
        source: InvariantError,
    },
}

impl CaptureError {
    fn invariant(context: &'static str, source: InvariantError) -> Self {
        Self::InvariantViolation { context, source }
    }
}

impl fmt::Display for CaptureError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyBacktrace => write!(f, "captured call stack is empty after skipping frames"),
            Self::InvariantViolation { context, source } => {
                write!(f, "invariant violated in {context}: {source}")
            }
        }
    }
}

impl Error for CaptureError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::InvariantViolation { source, .. } => Some(source),
            Self::EmptyBacktrace => None,
        }
    }
}

/// Capture the calling thread's stack, innermost frame first.
///
/// The frames of the capture machinery are removed before `skip_frames` is
/// applied, so `skip_frames == 0` yields the function that called
/// `capture_current` as the first frame.
#[inline(never)]
pub fn capture_current(options: CaptureOptions) -> Result<Vec<Frame>, CaptureError> {
    let budget = options
        .skip_frames
        .saturating_add(options.max_frames.get())
        .saturating_add(NOISE_BUDGET);
    let raw = platform::walk(budget)?;

    let frames: Vec<Frame> = raw
        .into_iter()
        .skip_while(is_capture_noise)
        .skip(options.skip_frames)
        .take(options.max_frames.get())
        .collect();

    if frames.is_empty() {
        return Err(CaptureError::EmptyBacktrace);
    }
    Ok(frames)
}

fn is_capture_noise(frame: &Frame) -> bool {
    frame
        .function()
        .is_some_and(|name| CAPTURE_NOISE.iter().any(|noise| name.starts_with(noise)))
}

mod platform {
    use super::CaptureError;
    use tally_trace_types::Frame;

    pub(super) fn walk(budget: usize) -> Result<Vec<Frame>, CaptureError> {
        let mut frames = Vec::new();
        let mut failure = None;

        backtrace::trace(|raw| {
            let before = frames.len();
            backtrace::resolve_frame(raw, |symbol| {
                if failure.is_some() {
                    return;
                }
                let function = symbol.name().map(|name| format!("{name:#}"));
                let file = symbol.filename().map(|path| path.display().to_string());
                match Frame::from_parts(function, file, symbol.lineno()) {
                    Ok(frame) => frames.push(frame),
                    Err(err) => failure = Some(CaptureError::invariant("resolve_frame", err)),
                }
            });
            if frames.len() == before && failure.is_none() {
                match Frame::from_parts(None, None, None) {
                    Ok(frame) => frames.push(frame),
                    Err(err) => failure = Some(CaptureError::invariant("unresolved_frame", err)),
                }
            }
            failure.is_none() && frames.len() < budget
        });

        match failure {
            Some(err) => Err(err),
            None => Ok(frames),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[inline(never)]
    fn capture_here(skip_frames: usize) -> Vec<Frame> {
        capture_current(CaptureOptions {
            skip_frames,
            ..CaptureOptions::default()
        })
        .expect("capture must succeed in tests")
    }

    fn function_of(frame: &Frame) -> &str {
        frame.function().unwrap_or_default()
    }

    #[test]
    fn first_frame_is_the_caller_of_capture_current() {
        let frames = capture_here(0);
        assert!(
            function_of(&frames[0]).contains("capture_here"),
            "unexpected first frame: {}",
            frames[0]
        );
    }

    #[test]
    fn capture_machinery_is_not_reported() {
        let frames = capture_here(0);
        assert!(frames.iter().all(|frame| !is_capture_noise(frame)));
    }

    #[test]
    fn skip_frames_drops_leading_frames() {
        let frames = capture_here(1);
        assert!(
            function_of(&frames[0]).contains("skip_frames_drops_leading_frames"),
            "unexpected first frame: {}",
            frames[0]
        );
    }

    #[test]
    fn max_frames_bounds_the_capture() {
        let frames = capture_current(CaptureOptions {
            max_frames: NonZeroUsize::new(2).expect("non-zero"),
            skip_frames: 0,
        })
        .expect("capture must succeed");
        assert!(frames.len() <= 2);
    }

    #[test]
    fn skipping_past_the_stack_is_an_error() {
        let err = capture_current(CaptureOptions {
            skip_frames: 100_000,
            ..CaptureOptions::default()
        })
        .expect_err("no frame survives");
        assert!(matches!(err, CaptureError::EmptyBacktrace));
    }
}
