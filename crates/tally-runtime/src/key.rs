//! Call-site keys.
//!
//! A key is `tag:location`, where `location` is the rendered caller frame.
//! Untagged calls use the empty tag, so their keys start with `:`. Because the
//! tag is recovered by splitting at the first colon, tags may not contain one;
//! the location is free to.

use std::fmt;

use tally_trace_types::Frame;

use crate::UsageError;

pub const TAG_DELIMITER: char = ':';

/// The tag used by untagged calls.
pub const UNTAGGED: &str = "";

/// Frames skipped by [`KeyBuilder::default`]: the stack-capture point and
/// the public API method that called it.
pub const DEFAULT_SKIP_FRAMES: usize = 2;

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CallKey(String);

impl CallKey {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn tag(&self) -> &str {
        self.split().0
    }

    pub fn location(&self) -> &str {
        self.split().1
    }

    pub fn is_untagged(&self) -> bool {
        self.0.starts_with(TAG_DELIMITER)
    }

    fn split(&self) -> (&str, &str) {
        self.0.split_once(TAG_DELIMITER).unwrap_or((self.0.as_str(), ""))
    }
}

impl fmt::Display for CallKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Turns a tag and a captured call stack into a [`CallKey`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyBuilder {
    skip_frames: usize,
}

impl Default for KeyBuilder {
    fn default() -> Self {
        Self::new(DEFAULT_SKIP_FRAMES)
    }
}

impl KeyBuilder {
    /// `skip_frames` leading frames belong to the tracking API and are
    /// discarded; the next frame is the call site.
    pub const fn new(skip_frames: usize) -> Self {
        Self { skip_frames }
    }

    pub const fn skip_frames(&self) -> usize {
        self.skip_frames
    }

    pub fn build_key(&self, tag: &str, stack: &[Frame]) -> Result<CallKey, UsageError> {
        validate_tag(tag)?;
        if stack.is_empty() {
            return Err(UsageError::InvalidArgument {
                reason: "call stack must not be empty",
            });
        }
        let caller = stack
            .get(self.skip_frames)
            .ok_or(UsageError::StackTooShallow {
                required: self.skip_frames + 1,
                got: stack.len(),
            })?;
        Ok(CallKey(format!("{tag}{TAG_DELIMITER}{caller}")))
    }
}

pub(crate) fn validate_tag(tag: &str) -> Result<(), UsageError> {
    if tag.contains(TAG_DELIMITER) {
        return Err(UsageError::InvalidArgument {
            reason: "tag must not contain ':'",
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(function: &str, line: u32) -> Frame {
        Frame::new(function, "src/app.rs", line).expect("valid frame")
    }

    fn stack() -> Vec<Frame> {
        vec![
            frame("tally::Tracker::record_call", 10),
            frame("tally::Tracker::log_tagged", 20),
            frame("app::init", 30),
            frame("app::main", 40),
        ]
    }

    #[test]
    fn default_builder_skips_two_frames() {
        let key = KeyBuilder::default().build_key("boot", &stack()).expect("key");
        assert_eq!(key.as_str(), "boot:app::init(src/app.rs:30)");
        assert_eq!(key.tag(), "boot");
        assert_eq!(key.location(), "app::init(src/app.rs:30)");
    }

    #[test]
    fn untagged_keys_start_with_the_delimiter() {
        let key = KeyBuilder::default().build_key(UNTAGGED, &stack()).expect("key");
        assert_eq!(key.as_str(), ":app::init(src/app.rs:30)");
        assert!(key.is_untagged());
        assert_eq!(key.tag(), "");
    }

    #[test]
    fn skip_count_is_configurable() {
        let key = KeyBuilder::new(3).build_key("t", &stack()).expect("key");
        assert_eq!(key.location(), "app::main(src/app.rs:40)");
        let key = KeyBuilder::new(0).build_key("t", &stack()).expect("key");
        assert_eq!(key.location(), "tally::Tracker::record_call(src/app.rs:10)");
    }

    #[test]
    fn same_site_same_tag_is_stable() {
        let builder = KeyBuilder::default();
        let first = builder.build_key("t", &stack()).expect("key");
        let second = builder.build_key("t", &stack()).expect("key");
        assert_eq!(first, second);
    }

    #[test]
    fn different_tags_at_one_site_are_distinct() {
        let builder = KeyBuilder::default();
        let a = builder.build_key("a", &stack()).expect("key");
        let b = builder.build_key("b", &stack()).expect("key");
        assert_ne!(a, b);
        assert_eq!(a.location(), b.location());
    }

    #[test]
    fn location_columns_survive_tag_recovery() {
        let caller = Frame::caller();
        let key = KeyBuilder::new(0).build_key("t", std::slice::from_ref(&caller)).expect("key");
        assert_eq!(key.tag(), "t");
        assert_eq!(key.location(), caller.to_string());
    }

    #[test]
    fn empty_stack_is_invalid() {
        let err = KeyBuilder::default().build_key("t", &[]).expect_err("empty stack");
        assert!(matches!(err, UsageError::InvalidArgument { .. }));
    }

    #[test]
    fn shallow_stack_is_rejected() {
        let err = KeyBuilder::default()
            .build_key("t", &stack()[..2])
            .expect_err("no caller frame");
        assert_eq!(err, UsageError::StackTooShallow { required: 3, got: 2 });
    }

    #[test]
    fn tags_with_delimiter_are_invalid() {
        let err = KeyBuilder::default()
            .build_key("app::boot", &stack())
            .expect_err("colon in tag");
        assert!(matches!(err, UsageError::InvalidArgument { .. }));
    }
}
