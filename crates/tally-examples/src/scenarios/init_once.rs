//! A one-time initializer guarded by `allow_once`, called twice by mistake.

use tally::Tracker;

struct Settings {
    loaded: Vec<(&'static str, &'static str)>,
}

impl Settings {
    fn load(tracker: &Tracker) -> Result<Self, tally::TrackerError> {
        tracker.allow_once_tagged("settings")?;
        Ok(Self {
            loaded: vec![("region", "eu-west"), ("workers", "4")],
        })
    }
}

pub fn run(tracker: &Tracker) -> Result<(), String> {
    let settings = Settings::load(tracker).map_err(|e| e.to_string())?;
    println!("loaded {} settings", settings.loaded.len());

    match Settings::load(tracker) {
        Ok(_) if !tracker.is_enabled() => println!("tracking disabled, second load went unnoticed"),
        Ok(_) => return Err("second settings load was not caught".to_owned()),
        Err(err) if err.is_already_called() => println!("caught duplicate initialization: {err}"),
        Err(err) => return Err(err.to_string()),
    }
    println!();
    Ok(())
}
