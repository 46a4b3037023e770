/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 19/10/26
******************************************************************************/

//! Sequencer event types.
//!
//! This module defines the event handed to listeners after the Sequencer has
//! executed a task.

use super::task::{TaskId, TaskKind};
use std::time::Duration;

/// Event emitted after a task has been executed.
///
/// Events are delivered on the thread that executed the task, in execution
/// order, so `sequence_num` is strictly increasing for a given Sequencer.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use std::sync::atomic::{AtomicU64, Ordering};
/// use threadseq::{Sequencer, SequencerConfig};
///
/// # fn main() -> threadseq::Result<()> {
/// let last = Arc::new(AtomicU64::new(0));
/// let last_clone = last.clone();
/// let config = SequencerConfig::builder()
///     .listener(move |event| last_clone.store(event.sequence_num, Ordering::SeqCst))
///     .build()?;
///
/// let sequencer = Sequencer::with_config(config)?;
/// sequencer.run_sync(|| ())?;
///
/// // listeners run after the caller is released; joining the worker flushes them
/// drop(sequencer);
/// assert_eq!(last.load(Ordering::SeqCst), 1);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SequencerEvent {
    /// Monotonically increasing execution number, starting at 1.
    pub sequence_num: u64,

    /// Nanoseconds since the Unix epoch when the task finished.
    pub timestamp_ns: u64,

    /// The executed task.
    pub task_id: TaskId,

    /// How the task reached the executing thread.
    pub kind: TaskKind,

    /// Time between submission and start of execution.
    pub queued_for: Duration,

    /// Execution time.
    pub elapsed: Duration,

    /// Whether a panic escaped the task wrapper.
    pub panicked: bool,
}

/// Returns the current time in nanoseconds since the Unix epoch.
#[inline]
pub(crate) fn nanos_since_epoch() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_nanos() as u64)
        .unwrap_or(0)
}
