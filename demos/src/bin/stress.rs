/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 19/10/26
******************************************************************************/

//! Hammers one sequencer from many threads, then stops it and prints the
//! counters.
//!
//! Usage: `stress [sync_threads] [async_threads] [seconds]`

use std::env;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::thread;
use std::time::{Duration, Instant};
use threadseq::{CriticalErrorKind, Sequencer, SequencerConfig};
use threadseq_demos::init_logging;
use tracing::{error, info};

fn arg_or(index: usize, default: u64) -> u64 {
    env::args()
        .nth(index)
        .and_then(|value| value.parse().ok())
        .unwrap_or(default)
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_logging("info");

    let sync_threads = arg_or(1, 100) as usize;
    let async_threads = arg_or(2, 100) as usize;
    let run_for = Duration::from_secs(arg_or(3, 3));

    let config = SequencerConfig::builder()
        .queue_capacity(1_000)
        .thread_name("stress-worker")
        .on_critical_error(|kind: CriticalErrorKind| error!(%kind, "sequencer failed"))
        .build()?;
    let sequencer = Arc::new(Sequencer::with_config(config)?);
    let counter = Arc::new(AtomicU64::new(0));

    info!(sync_threads, async_threads, ?run_for, "starting stress run");
    let deadline = Instant::now() + run_for;
    let started = Instant::now();

    let mut handles = Vec::with_capacity(sync_threads + async_threads);
    for i in 0..sync_threads + async_threads {
        let sequencer = sequencer.clone();
        let counter = counter.clone();
        let is_sync = i < sync_threads;
        handles.push(thread::spawn(move || {
            while Instant::now() < deadline && sequencer.is_running() {
                let counter = counter.clone();
                let task = move || {
                    counter.fetch_add(1, Ordering::Relaxed);
                };
                let outcome = if is_sync {
                    sequencer.run_sync(task).map(|_| ())
                } else {
                    sequencer.run_async(task).map(|_| ())
                };
                if let Err(err) = outcome {
                    error!(%err, "submission failed");
                    break;
                }
            }
        }));
    }

    for handle in handles {
        if handle.join().is_err() {
            error!("producer thread panicked");
        }
    }

    sequencer.stop();
    let stats = sequencer.stats();
    let elapsed = started.elapsed();
    info!(
        executed = counter.load(Ordering::Relaxed),
        per_sec = stats.total_executed() as f64 / elapsed.as_secs_f64(),
        "stress run finished"
    );
    println!("{}", serde_json::to_string_pretty(&stats)?);

    Ok(())
}
