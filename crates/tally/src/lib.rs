//! Runtime call-site usage tracking.
//!
//! Drop `tracker.log_tagged("maybe-dead")?` into code you suspect is dead, run
//! the expected code paths, then ask `tracker.is_unused_tagged("maybe-dead")`.
//! Put `tracker.allow_once()?` at the top of an initializer and the second
//! call through that line fails with an "already called" error.
//!
//! ```rust
//! let tracker = tally::Tracker::default();
//!
//! fn init(tracker: &tally::Tracker) -> Result<(), tally::TrackerError> {
//!     tracker.allow_once_tagged("init")
//! }
//!
//! init(&tracker).unwrap();
//! assert!(init(&tracker).unwrap_err().is_already_called());
//! assert_eq!(tracker.tag_usage_count("init"), 2);
//! ```
//!
//! Call sites are identified by source location. The default
//! [`CaptureMode::Caller`] uses `#[track_caller]`; [`CaptureMode::Backtrace`]
//! walks the stack instead and reports function names as well.
//!
//! # Configuration
//!
//! [`Tracker::from_env`] reads:
//!
//! | Variable | Values | Default |
//! |----------|--------|---------|
//! | `TALLY_ENABLED` | `1/0`, `true/false`, `on/off`, `yes/no` | enabled |
//! | `TALLY_CAPTURE` | `caller`, `backtrace` | `caller` |
//! | `TALLY_SKIP_FRAMES` | tracker frames skipped in backtrace mode | `2` |
//! | `TALLY_TAG_MATCHING` | `exact`, `prefix` | `exact` |

mod config;
mod error;
mod tracker;

pub use config::{
    CaptureMode, ConfigError, ENV_CAPTURE, ENV_ENABLED, ENV_SKIP_FRAMES, ENV_TAG_MATCHING, TrackerConfig,
};
pub use error::TrackerError;
pub use tally_runtime::{
    CallKey, KeyBuilder, Report, ReportEntry, TagMatching, TaggedSection, UNTAGGED, UsageError, UsageRegistry,
};
pub use tally_trace_types::Frame;
pub use tracker::Tracker;
