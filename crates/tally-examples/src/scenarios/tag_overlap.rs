//! Shows how `exact` and `prefix` tag matching answer "is `my` used?" when
//! only `myTag` was recorded.

use tally::{TagMatching, Tracker, TrackerConfig};

fn touch(tracker: &Tracker) -> Result<(), String> {
    tracker.log_tagged("myTag").map_err(|e| e.to_string())
}

pub fn run(tracker: &Tracker) -> Result<(), String> {
    touch(tracker)?;

    for tag_matching in [TagMatching::Exact, TagMatching::Prefix] {
        let probe = Tracker::new(TrackerConfig {
            tag_matching,
            ..*tracker.config()
        });
        touch(&probe)?;
        println!(
            "{tag_matching:?}: is \"my\" unused? {}  is \"myTag\" unused? {}  count(\"my\") = {}",
            probe.is_unused_tagged("my"),
            probe.is_unused_tagged("myTag"),
            probe.tag_usage_count("my"),
        );
    }
    println!();
    Ok(())
}
