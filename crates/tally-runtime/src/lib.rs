//! Usage registry for call-site tracking.
//!
//! Callers mark code locations as used, optionally under a tag. The
//! [`KeyBuilder`] derives a stable [`CallKey`] from the tag and the captured
//! call stack, and the [`UsageRegistry`] counts invocations per key, answers
//! "was this ever used?" and "how often?", enforces allow-once call sites and
//! renders a [`Report`] grouped by tag.

mod error;
mod key;
mod registry;
mod report;


pub use error::UsageError;
pub use key::{CallKey, DEFAULT_SKIP_FRAMES, KeyBuilder, TAG_DELIMITER, UNTAGGED};
pub use registry::{TagMatching, UsageRegistry};
pub use report::{REPORT_HEADER, Report, ReportEntry, TaggedSection};
pub use tally_trace_types::Frame;
