//! Tag suspected-dead branches of a small order pipeline, drive the expected
//! paths, then ask which tags never fired.

use tally::Tracker;

const TAGS: &[&str] = &["pricing", "discount", "legacy-export", "fraud-review"];

struct Order {
    total_cents: u64,
    coupon: Option<&'static str>,
}

struct Pipeline<'a> {
    tracker: &'a Tracker,
}

impl Pipeline<'_> {
    fn price(&self, order: &Order) -> Result<u64, String> {
        self.tracker.log_tagged("pricing").map_err(|e| e.to_string())?;
        match order.coupon {
            Some(code) => self.apply_discount(order.total_cents, code),
            None => Ok(order.total_cents),
        }
    }

    fn apply_discount(&self, total_cents: u64, code: &str) -> Result<u64, String> {
        self.tracker.log_tagged("discount").map_err(|e| e.to_string())?;
        let percent = if code == "TENOFF" { 10 } else { 0 };
        Ok(total_cents - total_cents * percent / 100)
    }

    fn export_legacy_csv(&self, order: &Order) -> Result<String, String> {
        self.tracker.log_tagged("legacy-export").map_err(|e| e.to_string())?;
        Ok(format!("{},{}", order.total_cents, order.coupon.unwrap_or_default()))
    }

    fn review_for_fraud(&self, order: &Order) -> Result<bool, String> {
        self.tracker.log_tagged("fraud-review").map_err(|e| e.to_string())?;
        Ok(order.total_cents > 1_000_000)
    }

    fn process(&self, order: &Order) -> Result<u64, String> {
        self.tracker.log().map_err(|e| e.to_string())?;
        let total = self.price(order)?;
        if total > 5_000_000 && self.review_for_fraud(order)? {
            return Err(format!("order of {total} cents held for review"));
        }
        if order.coupon == Some("LEGACY") {
            let _ = self.export_legacy_csv(order)?;
        }
        Ok(total)
    }
}

pub fn run(tracker: &Tracker) -> Result<(), String> {
    let pipeline = Pipeline { tracker };
    let orders = [
        Order {
            total_cents: 4_200,
            coupon: None,
        },
        Order {
            total_cents: 19_900,
            coupon: Some("TENOFF"),
        },
        Order {
            total_cents: 750,
            coupon: None,
        },
    ];

    for order in &orders {
        let total = pipeline.process(order)?;
        println!("processed order: {total} cents");
    }

    println!();
    for tag in TAGS {
        let verdict = if tracker.is_unused_tagged(tag) {
            "never ran, candidate for removal"
        } else {
            "in use"
        };
        println!("{tag:<14} {:>3} calls  {verdict}", tracker.tag_usage_count(tag));
    }
    println!();
    Ok(())
}
