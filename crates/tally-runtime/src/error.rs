use std::error::Error;
use std::fmt;

use crate::key::TAG_DELIMITER;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UsageError {
    /// The tag or the call stack cannot identify a call site.
    InvalidArgument { reason: &'static str },
    /// No caller frame survives skipping the tracking API's own frames.
    StackTooShallow { required: usize, got: usize },
    /// An allow-once call site ran again.
    AlreadyCalled {
        tag: String,
        location: String,
        count: u64,
    },
}

impl UsageError {
    /// The call-site key an `AlreadyCalled` error refers to.
    pub fn key(&self) -> Option<String> {
        match self {
            Self::AlreadyCalled { tag, location, .. } => Some(format!("{tag}{TAG_DELIMITER}{location}")),
            _ => None,
        }
    }
}

impl fmt::Display for UsageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidArgument { reason } => write!(f, "invalid argument: {reason}"),
            Self::StackTooShallow { required, got } => write!(
                f,
                "call stack too shallow: need at least {required} frames to find the caller, got {got}"
            ),
            Self::AlreadyCalled { tag, location, count } if tag.is_empty() => write!(
                f,
                "call site {location} may only run once, but ran {count} times"
            ),
            Self::AlreadyCalled { tag, location, count } => write!(
                f,
                "call site {location} (tag {tag:?}) may only run once, but ran {count} times"
            ),
        }
    }
}

impl Error for UsageError {}
