/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 19/10/26
******************************************************************************/

//! Cross-thread deadlock detection for synchronous calls.
//!
//! Every outstanding `run_sync` from a thread other than the target worker is
//! recorded as a `caller -> worker` edge in a waits-for graph. A new call is
//! refused when its worker can already reach the caller through outstanding
//! edges, since adding the edge would close a cycle and every thread on it
//! would wait forever.
//!
//! Only waits that go through a sequencer are visible here. A task that blocks
//! on a channel fed by another thread adds an edge the detector cannot see.

use super::error::{CriticalErrorKind, Result, SequencerError};
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, OnceLock};
use std::thread::ThreadId;

static GLOBAL_DETECTOR: OnceLock<Arc<DeadlockDetector>> = OnceLock::new();

/// Waits-for graph over threads blocked in synchronous calls.
///
/// One detector can be shared by many sequencers; cycles spanning several of
/// them are only visible when they share it. [`DeadlockDetector::global`] is
/// the default for every sequencer.
#[derive(Debug, Default)]
pub struct DeadlockDetector {
    graph: Mutex<WaitGraph>,
}

#[derive(Debug, Default)]
struct WaitGraph {
    // waiter -> (awaited -> outstanding registrations)
    edges: HashMap<ThreadId, HashMap<ThreadId, usize>>,
}

impl WaitGraph {
    fn reaches(&self, from: ThreadId, to: ThreadId) -> bool {
        let mut visited = HashSet::new();
        let mut stack = vec![from];

        while let Some(thread) = stack.pop() {
            if thread == to {
                return true;
            }
            if !visited.insert(thread) {
                continue;
            }
            if let Some(next) = self.edges.get(&thread) {
                stack.extend(next.keys().copied());
            }
        }

        false
    }
}

impl DeadlockDetector {
    /// Creates an empty detector.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Process-wide detector shared by sequencers that do not configure one.
    #[must_use]
    pub fn global() -> Arc<Self> {
        GLOBAL_DETECTOR
            .get_or_init(|| Arc::new(DeadlockDetector::new()))
            .clone()
    }

    /// Records that `waiter` is about to block on `awaited`.
    ///
    /// # Errors
    ///
    /// Returns [`SequencerError::Deadlock`] if `awaited` already waits,
    /// directly or transitively, on `waiter`. Nothing is recorded in that case.
    pub fn register(&self, waiter: ThreadId, awaited: ThreadId) -> Result<()> {
        let mut graph = self.graph.lock();

        if waiter == awaited || graph.reaches(awaited, waiter) {
            return Err(SequencerError::Deadlock {
                caller: waiter,
                worker: awaited,
            });
        }

        *graph
            .edges
            .entry(waiter)
            .or_default()
            .entry(awaited)
            .or_insert(0) += 1;
        Ok(())
    }

    /// Releases one registration made by [`register`](Self::register).
    ///
    /// # Errors
    ///
    /// Returns [`CriticalErrorKind::UnbalancedUnregister`] if no matching
    /// registration is outstanding.
    pub fn unregister(
        &self,
        waiter: ThreadId,
        awaited: ThreadId,
    ) -> std::result::Result<(), CriticalErrorKind> {
        let mut graph = self.graph.lock();

        let Some(targets) = graph.edges.get_mut(&waiter) else {
            return Err(CriticalErrorKind::UnbalancedUnregister);
        };
        let Some(count) = targets.get_mut(&awaited) else {
            return Err(CriticalErrorKind::UnbalancedUnregister);
        };

        *count -= 1;
        if *count == 0 {
            targets.remove(&awaited);
            if targets.is_empty() {
                graph.edges.remove(&waiter);
            }
        }
        Ok(())
    }

    /// Number of outstanding registrations held by `waiter`.
    #[must_use]
    pub fn outstanding(&self, waiter: ThreadId) -> usize {
        self.graph
            .lock()
            .edges
            .get(&waiter)
            .map_or(0, |targets| targets.values().sum())
    }

    /// Threads `waiter` is currently registered as waiting on.
    #[must_use]
    pub fn waits_on(&self, waiter: ThreadId) -> Vec<ThreadId> {
        self.graph
            .lock()
            .edges
            .get(&waiter)
            .map(|targets| targets.keys().copied().collect())
            .unwrap_or_default()
    }

    /// Returns `true` when no registration is outstanding.
    #[must_use]
    pub fn is_idle(&self) -> bool {
        self.graph.lock().edges.is_empty()
    }
}
