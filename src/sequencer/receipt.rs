/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 19/10/26
******************************************************************************/

//! Submission outcomes.
//!
//! Shutdown abandonment is a normal outcome, not an error: a call that was
//! pending when the Sequencer stopped returns `Ok` with an `Abandoned`
//! variant, and the task did not run (or did not run to completion).

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::sync::oneshot;
use tokio::sync::oneshot::error::TryRecvError;

/// Outcome of a task whose result the caller waits for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion<R> {
    /// The task ran on the worker and returned this value.
    Executed(R),

    /// The task did not run to completion: the Sequencer stopped, the task
    /// wrapper dropped it, or it panicked.
    Abandoned,
}

impl<R> Completion<R> {
    /// Returns `true` if the task ran to completion.
    #[inline]
    #[must_use]
    pub fn is_executed(&self) -> bool {
        matches!(self, Self::Executed(_))
    }

    /// Returns `true` if the task was abandoned.
    #[inline]
    #[must_use]
    pub fn is_abandoned(&self) -> bool {
        matches!(self, Self::Abandoned)
    }

    /// Converts into the returned value, if any.
    #[inline]
    pub fn executed(self) -> Option<R> {
        match self {
            Self::Executed(value) => Some(value),
            Self::Abandoned => None,
        }
    }
}

/// Outcome of an async submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Submission {
    /// The task is in the async queue.
    Enqueued,

    /// The Sequencer stopped before the task could be enqueued.
    Abandoned,
}

impl Submission {
    /// Returns `true` if the task was enqueued.
    #[inline]
    #[must_use]
    pub fn is_enqueued(&self) -> bool {
        matches!(self, Self::Enqueued)
    }

    /// Returns `true` if the Sequencer refused the task because it stopped.
    #[inline]
    #[must_use]
    pub fn is_abandoned(&self) -> bool {
        matches!(self, Self::Abandoned)
    }
}

/// Handle to the return value of a task submitted with
/// [`Sequencer::submit`](super::Sequencer::submit).
///
/// Wait on it from a plain thread with [`wait`](Self::wait) or `.await` it
/// from async code.
#[derive(Debug)]
#[must_use = "a receipt does nothing unless waited on"]
pub struct Receipt<R> {
    rx: oneshot::Receiver<R>,
}

impl<R> Receipt<R> {
    pub(crate) fn new(rx: oneshot::Receiver<R>) -> Self {
        Self { rx }
    }

    /// Blocks the current thread until the task has run or was abandoned.
    ///
    /// # Panics
    ///
    /// Panics if called from within an asynchronous execution context; use
    /// `.await` there instead.
    pub fn wait(self) -> Completion<R> {
        match self.rx.blocking_recv() {
            Ok(value) => Completion::Executed(value),
            Err(_) => Completion::Abandoned,
        }
    }

    /// Returns the outcome if it is already known, without blocking.
    pub fn try_take(&mut self) -> Option<Completion<R>> {
        match self.rx.try_recv() {
            Ok(value) => Some(Completion::Executed(value)),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Closed) => Some(Completion::Abandoned),
        }
    }
}

impl<R> Future for Receipt<R> {
    type Output = Completion<R>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.rx).poll(cx).map(|result| match result {
            Ok(value) => Completion::Executed(value),
            Err(_) => Completion::Abandoned,
        })
    }
}
