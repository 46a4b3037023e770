/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 19/10/26
******************************************************************************/

//! Sequencer module for serializing work onto a single worker thread.
//!
//! This module provides a [`Sequencer`] that owns one dedicated worker thread
//! and executes closures submitted from any number of threads, one at a time.
//! It is the building block for state that must only ever be touched from one
//! logical thread of control.
//!
//! # Architecture
//!
//! - Synchronous calls install their task in a single-slot channel, one caller
//!   at a time, and wait on a reply channel
//! - Asynchronous calls append to a bounded FIFO channel; producers block
//!   while it is full
//! - Each worker iteration runs at most one sync task, then drains the whole
//!   async queue
//! - A `run_sync` issued from the worker itself runs in place
//! - Nested sync calls across threads are checked against a waits-for graph
//!   and refused when they would close a cycle
//! - Every task runs through a configurable wrapper; panics that escape it
//!   are critical errors that stop the Sequencer
//! - Listeners receive a [`SequencerEvent`] with a monotonic sequence number
//!   after each executed task
//!
//! # Examples
//!
//! ```no_run
//! use threadseq::sequencer::{CriticalErrorKind, Sequencer, SequencerConfig};
//!
//! # fn main() -> threadseq::Result<()> {
//! let config = SequencerConfig::builder()
//!     .queue_capacity(1_000)
//!     .on_critical_error(|kind: CriticalErrorKind| eprintln!("sequencer failed: {kind}"))
//!     .build()?;
//!
//! let sequencer = Sequencer::with_config(config)?;
//! sequencer.run_async(|| println!("queued"))?;
//! sequencer.run_sync(|| println!("waited for"))?;
//!
//! // Dropping stops the worker and joins it.
//! drop(sequencer);
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod core;
pub mod deadlock;
pub mod error;
pub mod event;
pub mod panic;
pub mod receipt;
pub mod stats;
pub mod task;
mod worker;

#[cfg(test)]
mod tests;

// Re-export main types
pub use config::{SequencerConfig, SequencerConfigBuilder};
pub use core::Sequencer;
pub use deadlock::DeadlockDetector;
pub use error::{CriticalErrorKind, Result, SequencerError};
pub use event::SequencerEvent;
pub use panic::{PanicInfo, contain_panics};
pub use receipt::{Completion, Receipt, Submission};
pub use stats::StatsSnapshot;
pub use task::{Task, TaskId, TaskKind};
