/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 19/10/26
******************************************************************************/

//! Error types for the Sequencer.
//!
//! Two families live here. [`SequencerError`] is returned to the caller of a
//! submission and is recoverable. [`CriticalErrorKind`] is never returned: it
//! is funneled through the configured critical-error callback and the
//! sequencer stops itself afterwards.

use super::task::TaskId;
use std::thread::ThreadId;
use thiserror::Error;

/// Result alias used across the crate.
pub type Result<T> = std::result::Result<T, SequencerError>;

/// Errors returned to callers of the Sequencer.
#[derive(Debug, Error)]
pub enum SequencerError {
    /// A synchronous call would close a wait cycle between threads.
    ///
    /// The task was not executed. Retrying the same call pattern will be
    /// rejected again.
    #[error("deadlock detected: sync call from thread {caller:?} into worker {worker:?} would close a wait cycle")]
    Deadlock {
        /// Thread that issued the rejected call.
        caller: ThreadId,
        /// Worker thread the caller would have waited on.
        worker: ThreadId,
    },

    /// The async queue is full and the caller is the worker thread, which is
    /// the only thread able to drain it.
    #[error("async queue is full and the caller is the worker thread")]
    WorkerQueueFull,

    /// The configuration failed validation.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// The worker thread could not be spawned.
    #[error("failed to spawn worker thread: {0}")]
    Spawn(#[from] std::io::Error),
}

impl SequencerError {
    /// Builds a [`SequencerError::Config`] from any message.
    pub fn config<S: Into<String>>(msg: S) -> Self {
        SequencerError::Config(msg.into())
    }

    /// Returns `true` for a deadlock rejection.
    #[inline]
    #[must_use]
    pub fn is_deadlock(&self) -> bool {
        matches!(self, Self::Deadlock { .. })
    }
}

/// Situations that must never happen in a correct run.
///
/// Reported through the `on_critical_error` callback. After one is reported
/// the sequencer no longer accepts or serves work.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CriticalErrorKind {
    /// A panic escaped the task wrapper.
    #[error("task {task_id} panicked: {message}")]
    TaskPanicked {
        /// Task whose execution panicked.
        task_id: TaskId,
        /// Panic payload rendered as text.
        message: String,
    },

    /// An event listener panicked while being notified.
    #[error("event listener panicked: {message}")]
    ListenerPanicked {
        /// Panic payload rendered as text.
        message: String,
    },

    /// The deadlock detector was asked to release a registration it does not
    /// hold.
    #[error("unregister without a matching registration")]
    UnbalancedUnregister,

    /// The sync slot was occupied while the in-flight caller held the gate.
    #[error("sync slot occupied by a foreign task")]
    SyncSlotOccupied,

    /// The worker thread terminated by panicking.
    #[error("worker thread panicked")]
    WorkerPanicked,
}
