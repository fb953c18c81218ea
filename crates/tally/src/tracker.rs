use std::collections::BTreeSet;
use std::num::NonZeroUsize;
use std::panic::Location;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::RwLock;
use tally_runtime::{KeyBuilder, Report, UNTAGGED, UsageRegistry};
use tally_trace_capture::{CaptureOptions, capture_current};
use tally_trace_types::Frame;
use tracing::{debug, info};

use crate::config::{CaptureMode, ConfigError, TrackerConfig};
use crate::error::TrackerError;

#[derive(Debug, Clone, Copy)]
enum Policy {
    Count,
    Once,
}

/// Entry point for marking call sites.
///
/// Share one tracker between the code being tracked and the code asking
/// questions about it, e.g. behind an `Arc` or in a `static LazyLock`.
///
/// Operations racing with [`Tracker::reset`] land in either the old or the
/// new registry.
#[derive(Debug)]
pub struct Tracker {
    config: TrackerConfig,
    enabled: AtomicBool,
    registry: RwLock<Arc<UsageRegistry>>,
}

impl Default for Tracker {
    fn default() -> Self {
        Self::new(TrackerConfig::default())
    }
}

impl Tracker {
    pub fn new(config: TrackerConfig) -> Self {
        Self {
            config,
            enabled: AtomicBool::new(config.enabled),
            registry: RwLock::new(Arc::new(fresh_registry(&config))),
        }
    }

    pub fn from_env() -> Result<Self, ConfigError> {
        let config = TrackerConfig::from_env()?;
        debug!(?config, "tracker configured from environment");
        Ok(Self::new(config))
    }

    pub fn config(&self) -> &TrackerConfig {
        &self.config
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::Relaxed)
    }

    /// When disabled, marking calls is a no-op; queries keep answering from
    /// what was recorded so far.
    pub fn set_enabled(&self, enabled: bool) {
        let was = self.enabled.swap(enabled, Ordering::Relaxed);
        if was != enabled {
            info!(enabled, "call-site tracking toggled");
        }
    }

    /// Mark the calling line as used.
    #[track_caller]
    #[inline(never)]
    pub fn log(&self) -> Result<(), TrackerError> {
        self.track(UNTAGGED, Policy::Count, Location::caller())
    }

    /// Mark the calling line as used under `tag`.
    #[track_caller]
    #[inline(never)]
    pub fn log_tagged(&self, tag: &str) -> Result<(), TrackerError> {
        self.track(tag, Policy::Count, Location::caller())
    }

    /// Mark the calling line as used, failing if it already ran.
    #[track_caller]
    #[inline(never)]
    pub fn allow_once(&self) -> Result<(), TrackerError> {
        self.track(UNTAGGED, Policy::Once, Location::caller())
    }

    /// Mark the calling line as used under `tag`, failing if it already ran
    /// under that tag.
    #[track_caller]
    #[inline(never)]
    pub fn allow_once_tagged(&self, tag: &str) -> Result<(), TrackerError> {
        self.track(tag, Policy::Once, Location::caller())
    }

    // Frame layout in backtrace mode: this function, the public method, then
    // the caller. Both tracker frames must stay out of line.
    #[inline(never)]
    fn track(&self, tag: &str, policy: Policy, caller: &'static Location<'static>) -> Result<(), TrackerError> {
        if !self.is_enabled() {
            return Ok(());
        }

        let stack = match self.config.capture {
            CaptureMode::Caller => vec![Frame::from_location(caller)],
            CaptureMode::Backtrace => capture_current(CaptureOptions {
                max_frames: NonZeroUsize::MIN.saturating_add(self.config.backtrace_skip_frames),
                skip_frames: 0,
            })?,
        };

        let registry = self.registry();
        match policy {
            Policy::Count => registry.record(tag, &stack)?,
            Policy::Once => registry.enforce_once(tag, &stack)?,
        }
        Ok(())
    }

    pub fn is_unused(&self) -> bool {
        self.registry().is_unused(UNTAGGED)
    }

    pub fn is_unused_tagged(&self, tag: &str) -> bool {
        self.registry().is_unused(tag)
    }

    pub fn usage_count(&self) -> u64 {
        self.registry().usage_count()
    }

    pub fn tag_usage_count(&self, tag: &str) -> u64 {
        self.registry().tag_usage_count(tag)
    }

    pub fn distinct_tags(&self) -> BTreeSet<String> {
        self.registry().distinct_tags()
    }

    pub fn report(&self) -> Report {
        self.registry().report()
    }

    pub fn print_report(&self) {
        println!("{}", self.report());
    }

    /// Replace the registry with an empty one.
    pub fn reset(&self) {
        let fresh = Arc::new(fresh_registry(&self.config));
        let old = std::mem::replace(&mut *self.registry.write(), fresh);
        info!(discarded_calls = old.usage_count(), "usage registry reset");
    }

    /// The registry currently receiving calls.
    pub fn registry(&self) -> Arc<UsageRegistry> {
        self.registry.read().clone()
    }
}

fn fresh_registry(config: &TrackerConfig) -> UsageRegistry {
    let skip_frames = match config.capture {
        CaptureMode::Caller => 0,
        CaptureMode::Backtrace => config.backtrace_skip_frames,
    };
    UsageRegistry::new(KeyBuilder::new(skip_frames), config.tag_matching)
}
