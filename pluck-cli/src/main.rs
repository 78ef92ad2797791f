//! # pluck - terminal guitar tuner
//!
//! Thin front end over `pluck-core`: opens the default microphone, runs the
//! tuning loop, repaints the current result at the publish cadence, and maps
//! stdin commands onto the loop's control surface. All tuning logic lives in
//! the core crate.

use std::io::{self, BufRead, Write};
use std::sync::Arc;
use std::thread;

use anyhow::Result;
use pluck_core::TuningResult;
use pluck_core::audio::MicSource;
use pluck_core::engine::{CYCLE_INTERVAL, TuningLoop};
use pluck_core::tuning::Tuning;

fn main() -> Result<()> {
    let tuner = Arc::new(TuningLoop::new(
        MicSource::default(),
        Tuning::standard_guitar(),
    ));
    let results = tuner.results();

    println!("pluck - 6-string guitar tuner");
    println!("commands: start | stop | toggle | quit");

    tuner.start();

    // Display thread: repaints the published result ten times a second.
    // Detached on purpose; it dies with the process.
    {
        let tuner = Arc::clone(&tuner);
        thread::spawn(move || {
            loop {
                if tuner.is_running() {
                    print_result(&results.latest());
                }
                thread::sleep(CYCLE_INTERVAL);
            }
        });
    }

    for line in io::stdin().lock().lines() {
        match line?.trim() {
            "start" => tuner.start(),
            "stop" => {
                tuner.stop();
                println!("\nstopped");
            }
            "toggle" => tuner.toggle(),
            "quit" | "q" => break,
            "" => {}
            other => println!("\nunknown command: {}", other),
        }
    }

    tuner.stop();
    println!();
    Ok(())
}

/// Renders one result over the current terminal line.
fn print_result(result: &TuningResult) {
    let line = match &result.note {
        Some(note) => {
            let verdict = if result.in_tune {
                "in tune"
            } else if result.cents_deviation > 0.0 {
                "tune down"
            } else {
                "tune up"
            };
            format!(
                "{:<3} {:>7.2} Hz  {:>+6.1} cents  {}",
                note.name, result.frequency, result.cents_deviation, verdict
            )
        }
        None => "no note detected".to_string(),
    };
    print!("\r{:<48}", line);
    let _ = io::stdout().flush();
}
