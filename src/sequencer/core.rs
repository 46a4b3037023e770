/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 19/10/26
******************************************************************************/

//! Core Sequencer implementation.
//!
//! This module provides the [`Sequencer`] handle and the state it shares with
//! its worker thread. Callers hand closures over two channels: a capacity-1
//! sync slot guarded by a gate so only one synchronous caller is in flight,
//! and a bounded async queue whose capacity throttles producers.

use super::config::SequencerConfig;
use super::deadlock::DeadlockDetector;
use super::error::{CriticalErrorKind, Result, SequencerError};
use super::event::{SequencerEvent, nanos_since_epoch};
use super::panic;
use super::receipt::{Completion, Receipt, Submission};
use super::stats::{SequencerStats, StatsSnapshot};
use super::task::{Task, TaskKind};
use super::worker::Worker;
use crossbeam::channel::{self, RecvTimeoutError, SendTimeoutError, Sender, TrySendError};
use parking_lot::{Mutex, MutexGuard};
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::thread::{self, JoinHandle, ThreadId};
use std::time::Instant;
use tokio::sync::oneshot;
use tracing::{debug, error, info, trace, warn};

/// State shared between the [`Sequencer`] handle and its worker thread.
pub(crate) struct Shared {
    running: AtomicBool,
    config: SequencerConfig,
    stats: SequencerStats,
    sequence: AtomicU64,
    // dropped on stop to wake the worker
    stop_signal: Mutex<Option<Sender<()>>>,
}

impl Shared {
    pub(crate) fn new(config: SequencerConfig, stop_signal: Sender<()>) -> Self {
        Self {
            running: AtomicBool::new(true),
            config,
            stats: SequencerStats::default(),
            sequence: AtomicU64::new(0),
            stop_signal: Mutex::new(Some(stop_signal)),
        }
    }

    #[inline]
    pub(crate) fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    #[inline]
    pub(crate) fn config(&self) -> &SequencerConfig {
        &self.config
    }

    #[inline]
    pub(crate) fn stats(&self) -> &SequencerStats {
        &self.stats
    }

    /// Flips the run-state flag. Returns `false` if it was already off.
    pub(crate) fn stop(&self) -> bool {
        if !self.running.swap(false, Ordering::AcqRel) {
            return false;
        }
        info!(thread = %self.config.thread_name(), "stopping sequencer");
        self.stop_signal.lock().take();
        true
    }

    /// Runs a task through the configured wrapper on the current thread.
    pub(crate) fn execute(&self, task: Task) {
        let task_id = task.id();
        let kind = task.kind();
        let queued_for = task.submitted_at().elapsed();
        let wrapper = self.config.task_wrapper();

        self.stats.record_execution(kind);
        let start = Instant::now();
        let outcome = panic::catch(|| wrapper(task));
        let elapsed = start.elapsed();

        let panicked = outcome.is_err();
        if panicked {
            self.stats.record_panic();
        }
        trace!(task_id = %task_id, ?kind, ?elapsed, "task executed");

        let sequence_num = self.sequence.fetch_add(1, Ordering::Relaxed) + 1;
        self.emit(&SequencerEvent {
            sequence_num,
            timestamp_ns: nanos_since_epoch(),
            task_id,
            kind,
            queued_for,
            elapsed,
            panicked,
        });

        if let Err(info) = outcome {
            self.report_critical(CriticalErrorKind::TaskPanicked {
                task_id,
                message: info.message,
            });
        }
    }

    fn emit(&self, event: &SequencerEvent) {
        for listener in self.config.listeners() {
            if let Err(info) = panic::catch(|| listener(event)) {
                self.report_critical(CriticalErrorKind::ListenerPanicked {
                    message: info.message,
                });
            }
        }
    }

    /// Logs and forwards a critical error, then stops for good.
    pub(crate) fn report_critical(&self, kind: CriticalErrorKind) {
        error!(thread = %self.config.thread_name(), error = %kind, "critical error");
        self.stats.record_critical();

        let handler = self.config.critical_error_handler();
        if panic::catch(|| handler(kind)).is_err() {
            error!("critical error handler panicked");
        }

        self.stop();
    }
}

/// Releases a deadlock-detector registration on every exit path of `run_sync`.
struct Registration<'a> {
    shared: &'a Shared,
    caller: ThreadId,
    worker: ThreadId,
}

impl Drop for Registration<'_> {
    fn drop(&mut self) {
        let detector = self.shared.config().deadlock_detector();
        if let Err(kind) = detector.unregister(self.caller, self.worker) {
            self.shared.report_critical(kind);
        }
    }
}

/// Serializes closures from any number of threads onto one worker thread.
///
/// The worker is spawned by the constructor and joined when the Sequencer is
/// dropped. Share a Sequencer between threads through an [`Arc`].
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use std::sync::atomic::{AtomicUsize, Ordering};
/// use threadseq::{Completion, Sequencer};
///
/// # fn main() -> threadseq::Result<()> {
/// let sequencer = Sequencer::with_capacity(16)?;
/// let counter = Arc::new(AtomicUsize::new(0));
///
/// for _ in 0..10 {
///     let counter = counter.clone();
///     sequencer.run_async(move || {
///         counter.fetch_add(1, Ordering::Relaxed);
///     })?;
/// }
///
/// let receipt = sequencer.submit({
///     let counter = counter.clone();
///     move || counter.load(Ordering::Relaxed)
/// })?;
/// assert_eq!(receipt.wait(), Completion::Executed(10));
/// # Ok(())
/// # }
/// ```
pub struct Sequencer {
    shared: Arc<Shared>,
    sync_tx: Sender<Task>,
    async_tx: Sender<Task>,
    sync_gate: Mutex<()>,
    worker_id: ThreadId,
    worker: Option<JoinHandle<()>>,
}

impl Sequencer {
    /// Creates a Sequencer with the default configuration.
    ///
    /// # Errors
    ///
    /// Returns [`SequencerError::Spawn`] if the worker thread cannot be
    /// spawned.
    pub fn new() -> Result<Self> {
        Self::with_config(SequencerConfig::default())
    }

    /// Creates a Sequencer whose async queue holds at most `capacity` tasks.
    ///
    /// # Errors
    ///
    /// Returns [`SequencerError::Config`] for a zero capacity and
    /// [`SequencerError::Spawn`] if the worker thread cannot be spawned.
    pub fn with_capacity(capacity: usize) -> Result<Self> {
        Self::with_config(SequencerConfig::builder().queue_capacity(capacity).build()?)
    }

    /// Creates a Sequencer from an explicit configuration.
    ///
    /// # Errors
    ///
    /// Returns [`SequencerError::Config`] if the configuration is invalid and
    /// [`SequencerError::Spawn`] if the worker thread cannot be spawned.
    pub fn with_config(config: SequencerConfig) -> Result<Self> {
        config.validate()?;

        let (sync_tx, sync_rx) = channel::bounded(1);
        let (async_tx, async_rx) = channel::bounded(config.queue_capacity());
        let (stop_tx, stop_rx) = channel::bounded(1);

        let mut builder = thread::Builder::new().name(config.thread_name().to_string());
        if let Some(stack_size) = config.stack_size() {
            builder = builder.stack_size(stack_size);
        }

        let shared = Arc::new(Shared::new(config, stop_tx));
        let worker = Worker::new(shared.clone(), sync_rx, async_rx, stop_rx);
        let handle = builder.spawn(move || worker.run())?;
        let worker_id = handle.thread().id();

        debug!(
            thread = %shared.config().thread_name(),
            capacity = shared.config().queue_capacity(),
            "sequencer started"
        );

        Ok(Self {
            shared,
            sync_tx,
            async_tx,
            sync_gate: Mutex::new(()),
            worker_id,
            worker: Some(handle),
        })
    }

    /// Runs `f` on the worker thread and blocks until it has returned.
    ///
    /// Concurrent callers are served one at a time. Called from the worker
    /// thread itself, `f` runs in place. If the Sequencer is or becomes
    /// stopped while the call is pending, it returns
    /// [`Completion::Abandoned`] within one poll interval.
    ///
    /// # Errors
    ///
    /// Returns [`SequencerError::Deadlock`] if blocking on this Sequencer
    /// would close a wait cycle; `f` is not run.
    pub fn run_sync<F, R>(&self, f: F) -> Result<Completion<R>>
    where
        F: FnOnce() -> R + Send + 'static,
        R: Send + 'static,
    {
        if !self.shared.is_running() {
            return Ok(self.abandon());
        }

        let caller = thread::current().id();
        if caller == self.worker_id {
            return Ok(self.run_inline(f));
        }

        let detector = self.shared.config().deadlock_detector();
        if let Err(err) = detector.register(caller, self.worker_id) {
            self.shared.stats().record_deadlock();
            warn!(?caller, worker = ?self.worker_id, "sync call rejected: would deadlock");
            return Err(err);
        }
        let _registration = Registration {
            shared: &self.shared,
            caller,
            worker: self.worker_id,
        };

        let Some(_gate) = self.acquire_gate() else {
            return Ok(self.abandon());
        };

        let (reply_tx, reply_rx) = channel::bounded(1);
        let task = Task::new(TaskKind::Sync, move || {
            let _ = reply_tx.send(f());
        });

        match self.sync_tx.try_send(task) {
            Ok(()) => {}
            Err(TrySendError::Full(_)) => {
                self.shared
                    .report_critical(CriticalErrorKind::SyncSlotOccupied);
                return Ok(self.abandon());
            }
            Err(TrySendError::Disconnected(_)) => return Ok(self.abandon()),
        }

        let poll_interval = self.shared.config().poll_interval();
        loop {
            match reply_rx.recv_timeout(poll_interval) {
                Ok(value) => {
                    // the worker takes the task out before running it
                    if !self.sync_tx.is_empty() {
                        self.shared
                            .report_critical(CriticalErrorKind::SyncSlotOccupied);
                    }
                    return Ok(Completion::Executed(value));
                }
                Err(RecvTimeoutError::Timeout) => {
                    if !self.shared.is_running() {
                        return Ok(self.abandon());
                    }
                }
                Err(RecvTimeoutError::Disconnected) => return Ok(self.abandon()),
            }
        }
    }

    /// Enqueues `f` to run on the worker thread after everything queued
    /// before it.
    ///
    /// Blocks while the queue is full. Never runs `f` in place, even when
    /// called from the worker thread.
    ///
    /// # Errors
    ///
    /// Returns [`SequencerError::WorkerQueueFull`] when called from the worker
    /// thread while the queue is full, since blocking there could never end.
    pub fn run_async<F>(&self, f: F) -> Result<Submission>
    where
        F: FnOnce() + Send + 'static,
    {
        self.enqueue(Task::new(TaskKind::Async, f))
    }

    /// Enqueues `f` like [`run_async`](Self::run_async) and returns a
    /// [`Receipt`] resolving to its return value.
    ///
    /// # Errors
    ///
    /// Same as [`run_async`](Self::run_async).
    pub fn submit<F, R>(&self, f: F) -> Result<Receipt<R>>
    where
        F: FnOnce() -> R + Send + 'static,
        R: Send + 'static,
    {
        let (tx, rx) = oneshot::channel();
        self.enqueue(Task::new(TaskKind::Async, move || {
            let _ = tx.send(f());
        }))?;
        Ok(Receipt::new(rx))
    }

    /// Signals shutdown. Idempotent and non-blocking.
    ///
    /// Pending tasks are not guaranteed to run and blocked callers return
    /// within one poll interval.
    pub fn stop(&self) {
        self.shared.stop();
    }

    /// Returns `false` once [`stop`](Self::stop) was called or a critical
    /// error was reported.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.shared.is_running()
    }

    /// Returns `true` when called from this Sequencer's worker thread.
    #[must_use]
    pub fn is_worker_thread(&self) -> bool {
        thread::current().id() == self.worker_id
    }

    /// Id of the dedicated worker thread.
    #[must_use]
    pub fn worker_thread_id(&self) -> ThreadId {
        self.worker_id
    }

    /// Number of tasks waiting in the async queue.
    #[must_use]
    pub fn pending_async(&self) -> usize {
        self.async_tx.len()
    }

    /// Maximum number of tasks the async queue holds.
    #[must_use]
    pub fn queue_capacity(&self) -> usize {
        self.shared.config().queue_capacity()
    }

    #[must_use]
    pub fn config(&self) -> &SequencerConfig {
        self.shared.config()
    }

    #[must_use]
    pub fn deadlock_detector(&self) -> &Arc<DeadlockDetector> {
        self.shared.config().deadlock_detector()
    }

    /// Snapshot of the execution counters.
    #[must_use]
    pub fn stats(&self) -> StatsSnapshot {
        self.shared.stats().snapshot()
    }

    fn run_inline<F, R>(&self, f: F) -> Completion<R>
    where
        F: FnOnce() -> R + Send + 'static,
        R: Send + 'static,
    {
        let (reply_tx, reply_rx) = channel::bounded(1);
        self.shared.execute(Task::new(TaskKind::Inline, move || {
            let _ = reply_tx.send(f());
        }));

        match reply_rx.try_recv() {
            Ok(value) => Completion::Executed(value),
            Err(_) => self.abandon(),
        }
    }

    fn acquire_gate(&self) -> Option<MutexGuard<'_, ()>> {
        let poll_interval = self.shared.config().poll_interval();
        loop {
            if !self.shared.is_running() {
                return None;
            }
            if let Some(guard) = self.sync_gate.try_lock_for(poll_interval) {
                return self.shared.is_running().then_some(guard);
            }
        }
    }

    fn enqueue(&self, task: Task) -> Result<Submission> {
        if !self.shared.is_running() {
            self.shared.stats().record_abandoned(1);
            return Ok(Submission::Abandoned);
        }

        if self.is_worker_thread() {
            return match self.async_tx.try_send(task) {
                Ok(()) => Ok(Submission::Enqueued),
                Err(TrySendError::Full(_)) => {
                    warn!(
                        capacity = self.queue_capacity(),
                        "async queue full on the worker thread"
                    );
                    Err(SequencerError::WorkerQueueFull)
                }
                Err(TrySendError::Disconnected(_)) => {
                    self.shared.stats().record_abandoned(1);
                    Ok(Submission::Abandoned)
                }
            };
        }

        let poll_interval = self.shared.config().poll_interval();
        let mut task = task;
        let mut throttled = false;
        loop {
            match self.async_tx.send_timeout(task, poll_interval) {
                Ok(()) => return Ok(Submission::Enqueued),
                Err(SendTimeoutError::Timeout(returned)) => {
                    if !throttled {
                        trace!(capacity = self.queue_capacity(), "async queue full; producer throttled");
                        throttled = true;
                    }
                    if !self.shared.is_running() {
                        self.shared.stats().record_abandoned(1);
                        return Ok(Submission::Abandoned);
                    }
                    task = returned;
                }
                Err(SendTimeoutError::Disconnected(_)) => {
                    self.shared.stats().record_abandoned(1);
                    return Ok(Submission::Abandoned);
                }
            }
        }
    }

    fn abandon<R>(&self) -> Completion<R> {
        self.shared.stats().record_abandoned(1);
        Completion::Abandoned
    }
}

impl fmt::Debug for Sequencer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Sequencer")
            .field("worker_id", &self.worker_id)
            .field("running", &self.is_running())
            .field("pending_async", &self.pending_async())
            .field("config", self.shared.config())
            .finish()
    }
}

impl Drop for Sequencer {
    fn drop(&mut self) {
        self.shared.stop();

        let Some(handle) = self.worker.take() else {
            return;
        };

        if self.is_worker_thread() {
            warn!("sequencer dropped on its own worker thread; not joining");
            return;
        }

        if handle.join().is_err() {
            self.shared.report_critical(CriticalErrorKind::WorkerPanicked);
        }
        debug!(thread = %self.shared.config().thread_name(), "sequencer worker joined");
    }
}
