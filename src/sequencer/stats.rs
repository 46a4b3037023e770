/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 19/10/26
******************************************************************************/

//! Execution counters.

use super::task::TaskKind;
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Debug, Default)]
pub(crate) struct SequencerStats {
    sync_executed: AtomicU64,
    async_executed: AtomicU64,
    inline_executed: AtomicU64,
    panicked: AtomicU64,
    deadlocks_rejected: AtomicU64,
    abandoned: AtomicU64,
    critical_errors: AtomicU64,
}

impl SequencerStats {
    // counted before the task runs so a woken caller already sees it
    pub(crate) fn record_execution(&self, kind: TaskKind) {
        let counter = match kind {
            TaskKind::Sync => &self.sync_executed,
            TaskKind::Async => &self.async_executed,
            TaskKind::Inline => &self.inline_executed,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_panic(&self) {
        self.panicked.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_deadlock(&self) {
        self.deadlocks_rejected.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_abandoned(&self, count: u64) {
        self.abandoned.fetch_add(count, Ordering::Relaxed);
    }

    pub(crate) fn record_critical(&self) {
        self.critical_errors.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            sync_executed: self.sync_executed.load(Ordering::Relaxed),
            async_executed: self.async_executed.load(Ordering::Relaxed),
            inline_executed: self.inline_executed.load(Ordering::Relaxed),
            panicked: self.panicked.load(Ordering::Relaxed),
            deadlocks_rejected: self.deadlocks_rejected.load(Ordering::Relaxed),
            abandoned: self.abandoned.load(Ordering::Relaxed),
            critical_errors: self.critical_errors.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time copy of a Sequencer's counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StatsSnapshot {
    /// Tasks handed to the wrapper from the sync slot.
    pub sync_executed: u64,
    /// Tasks executed from the async queue.
    pub async_executed: u64,
    /// Nested `run_sync` calls executed in place on the worker.
    pub inline_executed: u64,
    /// Executions where a panic escaped the task wrapper.
    pub panicked: u64,
    /// Sync calls refused by the deadlock detector.
    pub deadlocks_rejected: u64,
    /// Submissions that returned or were dropped as abandoned.
    pub abandoned: u64,
    /// Critical errors reported.
    pub critical_errors: u64,
}

impl StatsSnapshot {
    /// Executed tasks of every kind.
    #[must_use]
    pub fn total_executed(&self) -> u64 {
        self.sync_executed + self.async_executed + self.inline_executed
    }

    /// Renders the snapshot as a JSON object.
    ///
    /// # Errors
    ///
    /// Returns the serializer error, which cannot happen for this plain struct
    /// in practice.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}
