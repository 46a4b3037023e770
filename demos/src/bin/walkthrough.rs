/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 19/10/26
******************************************************************************/

//! Tour of the sequencer API: sync and async calls, receipts, reentrancy,
//! deadlock rejection, listeners and shutdown.

use std::sync::Arc;
use threadseq::{
    Completion, DeadlockDetector, Sequencer, SequencerConfig, SequencerEvent, contain_panics,
};
use threadseq_demos::init_logging;
use tracing::info;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_logging("debug");

    let config = SequencerConfig::builder()
        .queue_capacity(8)
        .thread_name("walkthrough")
        .task_wrapper(contain_panics)
        .listener(|event: &SequencerEvent| {
            info!(
                seq = event.sequence_num,
                task = %event.task_id,
                kind = ?event.kind,
                elapsed = ?event.elapsed,
                "task executed"
            );
        })
        .build()?;
    let sequencer = Arc::new(Sequencer::with_config(config)?);

    // sync call returns the closure's value
    let answer = sequencer.run_sync(|| 6 * 7)?;
    info!(?answer, "run_sync");

    // async calls run in submission order
    for i in 0..3 {
        sequencer.run_async(move || info!(i, "async task"))?;
    }
    let receipt = sequencer.submit(|| "after the three async tasks")?;
    info!(value = ?receipt.wait(), "submit");

    // nested run_sync on the worker runs in place
    let inner = sequencer.clone();
    let nested = sequencer.run_sync(move || inner.run_sync(|| "inline").map(|c| c.executed()))?;
    info!(?nested, "reentrant run_sync");

    // a panicking task is contained by the wrapper and reported as abandoned
    let contained = sequencer.run_sync::<_, ()>(|| panic!("contained panic"))?;
    info!(abandoned = contained.is_abandoned(), running = sequencer.is_running(), "panic");

    // a wait cycle across two sequencers is refused instead of hanging
    let detector = Arc::new(DeadlockDetector::new());
    let first = Arc::new(Sequencer::with_config(
        SequencerConfig::builder()
            .thread_name("first")
            .deadlock_detector(detector.clone())
            .build()?,
    )?);
    let second = Arc::new(Sequencer::with_config(
        SequencerConfig::builder()
            .thread_name("second")
            .deadlock_detector(detector)
            .build()?,
    )?);
    let (first_inner, second_inner) = (first.clone(), second.clone());
    let cycle = first.run_sync(move || {
        second_inner.run_sync(move || {
            first_inner
                .run_sync(|| ())
                .map_err(|err| err.to_string())
        })
    })?;
    if let Completion::Executed(Ok(Completion::Executed(Err(message)))) = cycle {
        info!(%message, "deadlock rejected");
    }

    sequencer.stop();
    let after_stop = sequencer.run_sync(|| ())?;
    info!(?after_stop, "stopped");
    println!("{}", sequencer.stats().to_json()?);

    Ok(())
}
