//! Replays two synthetic traces, one scripted and one human-like, and prints
//! how each session resolves.
//!
//! Run with: cargo run --example replay_demo

use chrono::{Duration, Utc};
use synheart_presence::core::{replay, ReplayOptions};
use synheart_presence::InputEvent;

fn scripted_trace() -> Vec<InputEvent> {
    let start = Utc::now();
    // Evenly spaced clicks and nothing else.
    (0..10)
        .map(|i| InputEvent::click(start + Duration::milliseconds(i * 500)))
        .collect()
}

fn human_trace() -> Vec<InputEvent> {
    let start = Utc::now();
    let mut events = Vec::new();
    let mut x = 0.0;
    for i in 0..240 {
        x += 4.0 + (i % 7) as f64 * 3.0;
        let y = 300.0 + ((i as f64) / 10.0).sin() * 80.0;
        events.push(InputEvent::pointer_move(
            start + Duration::milliseconds(i * 16),
            x,
            y,
        ));
    }
    for (i, gap) in [0, 180, 90, 410, 150, 700].iter().enumerate() {
        events.push(InputEvent::click(
            start + Duration::milliseconds(4000 + i as i64 * 200 + gap),
        ));
    }
    for i in 0..40 {
        events.push(InputEvent::key_down(
            start + Duration::milliseconds(6000 + i * 120 + (i % 3) * 45),
        ));
    }
    events.sort_by_key(|e| e.time);
    events
}

fn main() {
    for (name, events) in [("scripted", scripted_trace()), ("human", human_trace())] {
        let start = events.first().map(|e| e.time).unwrap_or_else(Utc::now);
        let options = ReplayOptions {
            until: Some(start + Duration::seconds(12)),
            ..ReplayOptions::default()
        };
        let report = replay(&events, &options);

        println!("{name:>8}: {}", report.status_line());
        for (metric, value) in report.metrics.iter() {
            println!("          {:<24} {:>6.1}", metric.name(), value);
        }
        println!();
    }
}
