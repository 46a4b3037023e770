/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 19/10/26
******************************************************************************/

//! Sequencer configuration.
//!
//! A [`SequencerConfig`] is built once, validated, and handed to
//! [`Sequencer::with_config`]. It is read-only from then on.
//!
//! [`Sequencer::with_config`]: super::Sequencer::with_config

use super::deadlock::DeadlockDetector;
use super::error::{CriticalErrorKind, Result, SequencerError};
use super::event::SequencerEvent;
use super::task::Task;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// Default bound of the async queue.
pub const DEFAULT_QUEUE_CAPACITY: usize = 100;

/// Default wake-up interval for blocked callers.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Default wake-up interval for the idle worker.
pub const DEFAULT_IDLE_INTERVAL: Duration = Duration::from_millis(100);

/// Default worker thread name.
pub const DEFAULT_THREAD_NAME: &str = "threadseq-worker";

/// Function every task is executed through.
pub type TaskWrapper = Arc<dyn Fn(Task) + Send + Sync>;

/// Callback receiving critical errors.
pub type CriticalErrorHandler = Arc<dyn Fn(CriticalErrorKind) + Send + Sync>;

/// Listener notified on the worker thread after each executed task.
pub type EventListener = Arc<dyn Fn(&SequencerEvent) + Send + Sync>;

/// Runs the task. A panic is left to unwind into the worker, which reports it
/// as [`CriticalErrorKind::TaskPanicked`].
fn run_task(task: Task) {
    task.run();
}

/// Tunables of a Sequencer.
#[derive(Clone)]
pub struct SequencerConfig {
    queue_capacity: usize,
    poll_interval: Duration,
    idle_interval: Duration,
    thread_name: String,
    stack_size: Option<usize>,
    task_wrapper: TaskWrapper,
    on_critical_error: CriticalErrorHandler,
    listeners: Vec<EventListener>,
    deadlock_detector: Arc<DeadlockDetector>,
}

impl Default for SequencerConfig {
    fn default() -> Self {
        Self {
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            poll_interval: DEFAULT_POLL_INTERVAL,
            idle_interval: DEFAULT_IDLE_INTERVAL,
            thread_name: DEFAULT_THREAD_NAME.to_string(),
            stack_size: None,
            task_wrapper: Arc::new(run_task),
            on_critical_error: Arc::new(|_| {}),
            listeners: Vec::new(),
            deadlock_detector: DeadlockDetector::global(),
        }
    }
}

impl SequencerConfig {
    /// Starts a builder with every option at its default.
    pub fn builder() -> SequencerConfigBuilder {
        SequencerConfigBuilder::new()
    }

    /// Checks the invariants the Sequencer relies on.
    ///
    /// # Errors
    ///
    /// Returns [`SequencerError::Config`] describing the first violation.
    pub fn validate(&self) -> Result<()> {
        if self.queue_capacity == 0 {
            return Err(SequencerError::config("queue_capacity must be > 0"));
        }
        if self.poll_interval.is_zero() {
            return Err(SequencerError::config("poll_interval must be > 0"));
        }
        if self.idle_interval.is_zero() {
            return Err(SequencerError::config("idle_interval must be > 0"));
        }
        if self.thread_name.is_empty() {
            return Err(SequencerError::config("thread_name must not be empty"));
        }
        if self.thread_name.contains('\0') {
            return Err(SequencerError::config("thread_name must not contain NUL"));
        }
        if self.stack_size == Some(0) {
            return Err(SequencerError::config("stack_size must be > 0"));
        }
        Ok(())
    }

    /// Bound of the async queue.
    #[must_use]
    pub fn queue_capacity(&self) -> usize {
        self.queue_capacity
    }

    /// Wake-up interval for blocked callers.
    #[must_use]
    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    /// Wake-up interval for the idle worker.
    #[must_use]
    pub fn idle_interval(&self) -> Duration {
        self.idle_interval
    }

    /// Worker thread name.
    #[must_use]
    pub fn thread_name(&self) -> &str {
        &self.thread_name
    }

    /// Worker thread stack size, if overridden.
    #[must_use]
    pub fn stack_size(&self) -> Option<usize> {
        self.stack_size
    }

    /// Detector shared with other sequencers using the same instance.
    #[must_use]
    pub fn deadlock_detector(&self) -> &Arc<DeadlockDetector> {
        &self.deadlock_detector
    }

    pub(crate) fn task_wrapper(&self) -> &TaskWrapper {
        &self.task_wrapper
    }

    pub(crate) fn critical_error_handler(&self) -> &CriticalErrorHandler {
        &self.on_critical_error
    }

    pub(crate) fn listeners(&self) -> &[EventListener] {
        &self.listeners
    }
}

impl fmt::Debug for SequencerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SequencerConfig")
            .field("queue_capacity", &self.queue_capacity)
            .field("poll_interval", &self.poll_interval)
            .field("idle_interval", &self.idle_interval)
            .field("thread_name", &self.thread_name)
            .field("stack_size", &self.stack_size)
            .field("listeners", &self.listeners.len())
            .finish_non_exhaustive()
    }
}

/// Builder for [`SequencerConfig`]. Each option is independent.
#[derive(Debug, Default)]
pub struct SequencerConfigBuilder {
    config: SequencerConfig,
}

impl SequencerConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: SequencerConfig::default(),
        }
    }

    /// Bound of the async queue; `run_async` blocks while it is full.
    pub fn queue_capacity(mut self, capacity: usize) -> Self {
        self.config.queue_capacity = capacity;
        self
    }

    /// Function every task is executed through.
    pub fn task_wrapper<F>(mut self, wrapper: F) -> Self
    where
        F: Fn(Task) + Send + Sync + 'static,
    {
        self.config.task_wrapper = Arc::new(wrapper);
        self
    }

    /// Callback invoked when a critical error is detected.
    pub fn on_critical_error<F>(mut self, callback: F) -> Self
    where
        F: Fn(CriticalErrorKind) + Send + Sync + 'static,
    {
        self.config.on_critical_error = Arc::new(callback);
        self
    }

    pub fn poll_interval(mut self, interval: Duration) -> Self {
        self.config.poll_interval = interval;
        self
    }

    pub fn idle_interval(mut self, interval: Duration) -> Self {
        self.config.idle_interval = interval;
        self
    }

    pub fn thread_name<S: Into<String>>(mut self, name: S) -> Self {
        self.config.thread_name = name.into();
        self
    }

    pub fn stack_size(mut self, size: usize) -> Self {
        self.config.stack_size = Some(size);
        self
    }

    /// Adds a listener called on the worker thread after each executed task.
    pub fn listener<F>(mut self, listener: F) -> Self
    where
        F: Fn(&SequencerEvent) + Send + Sync + 'static,
    {
        self.config.listeners.push(Arc::new(listener));
        self
    }

    /// Replaces the process-wide deadlock detector.
    pub fn deadlock_detector(mut self, detector: Arc<DeadlockDetector>) -> Self {
        self.config.deadlock_detector = detector;
        self
    }

    /// Validates and returns the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`SequencerError::Config`] if any option is out of range.
    pub fn build(self) -> Result<SequencerConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}
