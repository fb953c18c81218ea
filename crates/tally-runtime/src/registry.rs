//! Per-call-site invocation counts.
//!
//! The registry is a pure accumulator: keys are inserted or incremented and
//! never removed. Resetting means dropping the registry for a fresh one.

use std::collections::{BTreeMap, BTreeSet};

use parking_lot::Mutex;
use tally_trace_types::Frame;
use tracing::{debug, warn};

use crate::key::{CallKey, KeyBuilder, TAG_DELIMITER, UNTAGGED};
use crate::report::Report;
use crate::UsageError;

/// How [`UsageRegistry::is_unused`] decides that a key belongs to a tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TagMatching {
    /// The key's tag segment must equal the queried tag.
    #[default]
    Exact,
    /// Legacy behavior: any key that starts with the queried tag counts, so a
    /// query for `my` is satisfied by a key tagged `myTag`. The empty tag
    /// still only matches untagged keys.
    Prefix,
}

impl TagMatching {
    fn matches(self, key: &CallKey, tag: &str) -> bool {
        match self {
            Self::Exact => key.tag() == tag,
            Self::Prefix if tag.is_empty() => key.as_str().starts_with(TAG_DELIMITER),
            Self::Prefix => key.as_str().starts_with(tag),
        }
    }
}

#[derive(Debug, Default)]
pub struct UsageRegistry {
    key_builder: KeyBuilder,
    tag_matching: TagMatching,
    counts: Mutex<BTreeMap<CallKey, u64>>,
}

impl UsageRegistry {
    pub fn new(key_builder: KeyBuilder, tag_matching: TagMatching) -> Self {
        Self {
            key_builder,
            tag_matching,
            counts: Mutex::new(BTreeMap::new()),
        }
    }

    pub fn key_builder(&self) -> KeyBuilder {
        self.key_builder
    }

    pub fn tag_matching(&self) -> TagMatching {
        self.tag_matching
    }

    /// Count one invocation of the call site identified by `tag` and `stack`.
    pub fn record(&self, tag: &str, stack: &[Frame]) -> Result<(), UsageError> {
        let key = self.key_builder.build_key(tag, stack)?;
        self.increment(key);
        Ok(())
    }

    /// Count one invocation and fail if the call site had already run.
    ///
    /// The check is per call site, so one tag may guard several sites that
    /// each run once.
    pub fn enforce_once(&self, tag: &str, stack: &[Frame]) -> Result<(), UsageError> {
        let key = self.key_builder.build_key(tag, stack)?;
        let count = self.increment(key.clone());
        if count > 1 {
            warn!(tag, location = key.location(), count, "allow-once call site ran again");
            return Err(UsageError::AlreadyCalled {
                tag: key.tag().to_owned(),
                location: key.location().to_owned(),
                count,
            });
        }
        Ok(())
    }

    /// Increment under a single lock acquisition and return the new count.
    fn increment(&self, key: CallKey) -> u64 {
        let mut counts = self.counts.lock();
        let count = counts.entry(key).or_insert_with_key(|key| {
            debug!(key = key.as_str(), "first call at new call site");
            0
        });
        *count += 1;
        *count
    }

    /// `true` if no recorded call site belongs to `tag`. The empty tag asks
    /// about untagged calls.
    pub fn is_unused(&self, tag: &str) -> bool {
        let counts = self.counts.lock();
        !counts.keys().any(|key| self.tag_matching.matches(key, tag))
    }

    /// Total invocations over call sites whose tag is exactly `tag`.
    pub fn tag_usage_count(&self, tag: &str) -> u64 {
        self.counts
            .lock()
            .iter()
            .filter(|(key, _)| key.tag() == tag)
            .map(|(_, count)| *count)
            .sum()
    }

    pub fn usage_count(&self) -> u64 {
        self.counts.lock().values().sum()
    }

    pub fn untagged_usage_count(&self) -> u64 {
        self.tag_usage_count(UNTAGGED)
    }

    pub fn distinct_tags(&self) -> BTreeSet<String> {
        self.counts
            .lock()
            .keys()
            .filter(|key| !key.is_untagged())
            .map(|key| key.tag().to_owned())
            .collect()
    }

    pub fn snapshot(&self) -> Vec<(CallKey, u64)> {
        self.counts
            .lock()
            .iter()
            .map(|(key, count)| (key.clone(), *count))
            .collect()
    }

    pub fn report(&self) -> Report {
        Report::from_counts(&self.counts.lock())
    }
}
