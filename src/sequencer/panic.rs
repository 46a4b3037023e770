/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 19/10/26
******************************************************************************/

//! Panic capture for task execution.

use super::task::Task;
use std::any::Any;
use std::panic::{AssertUnwindSafe, catch_unwind};
use tracing::warn;

/// Text extracted from a panic payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PanicInfo {
    /// The panic message, or a placeholder for non-string payloads.
    pub message: String,
}

impl PanicInfo {
    fn from_payload(payload: Box<dyn Any + Send>) -> Self {
        let message = if let Some(s) = payload.downcast_ref::<&str>() {
            (*s).to_string()
        } else if let Some(s) = payload.downcast_ref::<String>() {
            s.clone()
        } else {
            "unknown panic payload".to_string()
        };

        Self { message }
    }
}

/// Runs `f`, turning an unwinding panic into `Err`.
pub(crate) fn catch<F, R>(f: F) -> Result<R, PanicInfo>
where
    F: FnOnce() -> R,
{
    catch_unwind(AssertUnwindSafe(f)).map_err(PanicInfo::from_payload)
}

/// Task wrapper that contains panics instead of escalating them.
///
/// Install it with [`SequencerConfigBuilder::task_wrapper`] when a panicking
/// task should be logged and skipped rather than treated as a critical error.
/// A `run_sync` caller whose task panicked observes it as abandoned.
///
/// [`SequencerConfigBuilder::task_wrapper`]: super::SequencerConfigBuilder::task_wrapper
pub fn contain_panics(task: Task) {
    let id = task.id();
    let kind = task.kind();
    if let Err(info) = catch(move || task.run()) {
        warn!(task_id = %id, ?kind, message = %info.message, "task panicked; contained");
    }
}
