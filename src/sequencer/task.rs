/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 19/10/26
******************************************************************************/

//! Task representation.
//!
//! A [`Task`] is what the configured task wrapper receives: the submitted
//! closure plus the metadata needed to log and account for it.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

static NEXT_TASK_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique task identifier, assigned in submission order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TaskId(u64);

impl TaskId {
    fn next() -> Self {
        TaskId(NEXT_TASK_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Raw numeric value.
    #[inline]
    #[must_use]
    pub fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// How a task reached the worker thread.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaskKind {
    /// Installed in the sync slot by a blocked `run_sync` caller.
    Sync,

    /// Taken from the async queue.
    Async,

    /// A `run_sync` issued from the worker thread itself, run in place.
    Inline,
}

/// A unit of work submitted to a Sequencer.
pub struct Task {
    id: TaskId,
    kind: TaskKind,
    submitted_at: Instant,
    func: Box<dyn FnOnce() + Send + 'static>,
}

impl Task {
    pub(crate) fn new<F>(kind: TaskKind, f: F) -> Self
    where
        F: FnOnce() + Send + 'static,
    {
        Task {
            id: TaskId::next(),
            kind,
            submitted_at: Instant::now(),
            func: Box::new(f),
        }
    }

    /// Identifier of this task.
    #[inline]
    #[must_use]
    pub fn id(&self) -> TaskId {
        self.id
    }

    /// Submission mode of this task.
    #[inline]
    #[must_use]
    pub fn kind(&self) -> TaskKind {
        self.kind
    }

    /// Instant at which the task was submitted.
    #[inline]
    #[must_use]
    pub fn submitted_at(&self) -> Instant {
        self.submitted_at
    }

    /// Runs the task, consuming it.
    ///
    /// A wrapper that drops a task without calling `run` makes the submitter
    /// observe the task as abandoned.
    pub fn run(self) {
        (self.func)();
    }
}

impl fmt::Debug for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Task")
            .field("id", &self.id)
            .field("kind", &self.kind)
            .field("submitted_at", &self.submitted_at)
            .finish()
    }
}
