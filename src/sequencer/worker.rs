/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 19/10/26
******************************************************************************/

//! Loop run on a Sequencer's dedicated worker thread.

use super::core::Shared;
use super::task::Task;
use crossbeam::channel::{Receiver, Select};
use std::sync::Arc;
use tracing::debug;

/// Receiving side of a Sequencer, run on its dedicated thread.
pub(crate) struct Worker {
    shared: Arc<Shared>,
    sync_rx: Receiver<Task>,
    async_rx: Receiver<Task>,
    stop_rx: Receiver<()>,
}

impl Worker {
    pub(crate) fn new(
        shared: Arc<Shared>,
        sync_rx: Receiver<Task>,
        async_rx: Receiver<Task>,
        stop_rx: Receiver<()>,
    ) -> Self {
        Self {
            shared,
            sync_rx,
            async_rx,
            stop_rx,
        }
    }

    pub(crate) fn run(self) {
        debug!(thread = %self.shared.config().thread_name(), "worker loop started");

        while self.shared.is_running() {
            self.wait_for_work();
            self.run_once();
        }

        let abandoned = self.discard_pending();
        debug!(
            thread = %self.shared.config().thread_name(),
            abandoned,
            "worker loop exited"
        );
    }

    /// Blocks until there is work, stop is signalled, or the idle interval
    /// elapses.
    fn wait_for_work(&self) {
        if !self.sync_rx.is_empty() || !self.async_rx.is_empty() {
            return;
        }

        let mut select = Select::new();
        select.recv(&self.sync_rx);
        select.recv(&self.async_rx);
        select.recv(&self.stop_rx);
        let _ = select.ready_timeout(self.shared.config().idle_interval());
    }

    /// One iteration: at most one sync task, then the whole async backlog.
    pub(crate) fn run_once(&self) {
        if self.shared.is_running() {
            if let Ok(task) = self.sync_rx.try_recv() {
                self.shared.execute(task);
            }
        }

        // re-checked after every pop so tasks added mid-drain are included
        while self.shared.is_running() {
            match self.async_rx.try_recv() {
                Ok(task) => self.shared.execute(task),
                Err(_) => break,
            }
        }
    }

    /// Drops whatever is still queued after stop.
    fn discard_pending(&self) -> u64 {
        // sync callers account for their own abandonment
        self.sync_rx.try_iter().for_each(drop);

        let abandoned = self.async_rx.try_iter().count() as u64;
        if abandoned > 0 {
            self.shared.stats().record_abandoned(abandoned);
        }
        abandoned
    }
}
