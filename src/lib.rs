/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 19/10/26
******************************************************************************/

//! # threadseq
//!
//! A task sequencer: any number of caller threads submit closures that are
//! executed one at a time on a single dedicated worker thread. State that must
//! only ever be touched from one logical thread of control can live inside the
//! closures, and callers never need to share a lock around it.
//!
//! ## Submission modes
//!
//! - [`Sequencer::run_sync`] blocks until the closure has executed on the
//!   worker thread and hands back its return value.
//! - [`Sequencer::run_async`] enqueues the closure and returns. Queued closures
//!   run in submission order. The queue is bounded: producers block while it
//!   is full.
//! - [`Sequencer::submit`] enqueues like `run_async` and returns a [`Receipt`]
//!   that resolves to the closure's return value, usable from plain threads or
//!   from `async` code.
//!
//! A closure already running on the worker that calls `run_sync` on the same
//! sequencer is executed inline. Nested synchronous calls that would close a
//! wait cycle between threads (for example across two sequencers) are rejected
//! with [`SequencerError::Deadlock`] instead of hanging.
//!
//! ## Example
//!
//! ```no_run
//! use threadseq::{Completion, Sequencer};
//!
//! # fn main() -> threadseq::Result<()> {
//! let sequencer = Sequencer::new()?;
//!
//! sequencer.run_async(|| println!("runs later, in order"))?;
//!
//! let answer = sequencer.run_sync(|| 6 * 7)?;
//! assert_eq!(answer, Completion::Executed(42));
//!
//! sequencer.stop();
//! # Ok(())
//! # }
//! ```

pub mod sequencer;

pub use sequencer::{
    Completion, CriticalErrorKind, DeadlockDetector, PanicInfo, Receipt, Result, Sequencer,
    SequencerConfig, SequencerConfigBuilder, SequencerError, SequencerEvent, StatsSnapshot,
    Submission, Task, TaskId, TaskKind, contain_panics,
};
