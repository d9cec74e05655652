use std::time::{Duration, Instant};
use once_cell::sync::Lazy;
use std::sync::Mutex;

pub static STAGES: Lazy<Mutex<Vec<(&'static str, Duration)>>> = Lazy::new(|| Mutex::new(Vec::new()));

/// Run a pipeline stage and record its wall time under `name`.
pub fn time_stage<T>(name: &'static str, f: impl FnOnce() -> T) -> T {
    let start = Instant::now();
    let out = f();
    STAGES.lock().unwrap().push((name, start.elapsed()));
    out
}

pub fn reset_stages() {
    STAGES.lock().unwrap().clear();
}

/// One line per recorded stage, most recent run last.
pub fn stage_report() -> String {
    let stages = STAGES.lock().unwrap();
    let mut out = String::new();
    for (name, dur) in stages.iter() {
        out.push_str(&format!("{:<10} {:>10.3} ms\n", name, dur.as_secs_f64() * 1e3));
    }
    out
}
