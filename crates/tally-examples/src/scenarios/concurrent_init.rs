//! Several threads race through the same allow-once call site; exactly one
//! of them wins.

use std::sync::Barrier;

use tally::Tracker;

const WORKERS: usize = 8;

fn start_metrics_exporter(tracker: &Tracker) -> bool {
    tracker.allow_once_tagged("metrics-exporter").is_ok()
}

pub fn run(tracker: &Tracker) -> Result<(), String> {
    let barrier = Barrier::new(WORKERS);
    let started = std::thread::scope(|scope| {
        let handles: Vec<_> = (0..WORKERS)
            .map(|_| {
                scope.spawn(|| {
                    barrier.wait();
                    start_metrics_exporter(tracker)
                })
            })
            .collect();
        handles
            .into_iter()
            .map(|handle| handle.join().map_err(|_| "worker thread panicked".to_owned()))
            .collect::<Result<Vec<bool>, String>>()
    })?;

    let winners = started.iter().filter(|started| **started).count();
    println!("{WORKERS} workers raced, {winners} started the exporter");
    if tracker.is_enabled() && winners != 1 {
        return Err(format!("expected exactly one winner, got {winners}"));
    }
    println!();
    Ok(())
}
