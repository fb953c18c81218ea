use std::error::Error;
use std::fmt;

use tally_runtime::UsageError;
use tally_trace_capture::CaptureError;

#[derive(Debug)]
pub enum TrackerError {
    Usage(UsageError),
    Capture(CaptureError),
}

impl TrackerError {
    /// `true` when an allow-once call site ran again.
    pub fn is_already_called(&self) -> bool {
        matches!(self, Self::Usage(UsageError::AlreadyCalled { .. }))
    }

    pub fn usage(&self) -> Option<&UsageError> {
        match self {
            Self::Usage(err) => Some(err),
            Self::Capture(_) => None,
        }
    }
}

impl fmt::Display for TrackerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Usage(err) => write!(f, "{err}"),
            Self::Capture(err) => write!(f, "failed to capture call stack: {err}"),
        }
    }
}

impl Error for TrackerError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Usage(err) => Some(err),
            Self::Capture(err) => Some(err),
        }
    }
}

impl From<UsageError> for TrackerError {
    fn from(err: UsageError) -> Self {
        Self::Usage(err)
    }
}

impl From<CaptureError> for TrackerError {
    fn from(err: CaptureError) -> Self {
        Self::Capture(err)
    }
}
