use std::sync::Arc;
use std::time::Duration;
use threadseq::{
    Completion, DeadlockDetector, Sequencer, SequencerConfig, SequencerError, StatsSnapshot,
    Submission,
};

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::thread;

    #[test]
    fn test_public_lifecycle() {
        let sequencer = Sequencer::with_capacity(4).unwrap();
        assert!(sequencer.is_running());
        assert_eq!(sequencer.queue_capacity(), 4);
        assert_eq!(sequencer.pending_async(), 0);

        assert_eq!(
            sequencer.run_sync(|| "hello").unwrap(),
            Completion::Executed("hello")
        );
        assert_eq!(sequencer.run_async(|| ()).unwrap(), Submission::Enqueued);
        assert_eq!(sequencer.submit(|| 5).unwrap().wait().executed(), Some(5));

        sequencer.stop();
        assert!(!sequencer.is_running());
        assert!(sequencer.run_sync(|| ()).unwrap().is_abandoned());
    }

    #[test]
    fn test_thread_name_applied() {
        let config = SequencerConfig::builder()
            .thread_name("ledger-writer")
            .stack_size(256 * 1024)
            .build()
            .unwrap();
        let sequencer = Sequencer::with_config(config).unwrap();

        let name = sequencer
            .run_sync(|| thread::current().name().map(str::to_owned))
            .unwrap();
        assert_eq!(name, Completion::Executed(Some("ledger-writer".to_string())));
        assert_eq!(sequencer.config().stack_size(), Some(256 * 1024));
    }

    #[test]
    fn test_invalid_configs() {
        assert!(matches!(
            SequencerConfig::builder().queue_capacity(0).build(),
            Err(SequencerError::Config(_))
        ));
        assert!(matches!(
            SequencerConfig::builder().idle_interval(Duration::ZERO).build(),
            Err(SequencerError::Config(_))
        ));
        assert!(matches!(
            SequencerConfig::builder().thread_name("").build(),
            Err(SequencerError::Config(_))
        ));
    }

    #[test]
    fn test_shared_state_without_locks_on_the_worker() {
        // state only ever touched on the worker thread
        let sequencer = Arc::new(Sequencer::with_capacity(64).unwrap());
        let total = Arc::new(AtomicUsize::new(0));

        let producers: Vec<_> = (0..4)
            .map(|_| {
                let sequencer = sequencer.clone();
                let total = total.clone();
                thread::spawn(move || {
                    for _ in 0..250 {
                        let total = total.clone();
                        sequencer
                            .run_async(move || {
                                let current = total.load(Ordering::Relaxed);
                                total.store(current + 1, Ordering::Relaxed);
                            })
                            .unwrap();
                    }
                })
            })
            .collect();
        for producer in producers {
            producer.join().unwrap();
        }

        // a receipt resolves only after the async backlog ahead of it
        let total_clone = total.clone();
        let observed = sequencer
            .submit(move || total_clone.load(Ordering::Relaxed))
            .unwrap()
            .wait();
        assert_eq!(observed, Completion::Executed(1_000));
    }

    #[test]
    fn test_deadlock_error_surfaces_through_public_api() {
        let detector = Arc::new(DeadlockDetector::new());
        let make = |name: &str| {
            Arc::new(
                Sequencer::with_config(
                    SequencerConfig::builder()
                        .thread_name(name)
                        .deadlock_detector(detector.clone())
                        .build()
                        .unwrap(),
                )
                .unwrap(),
            )
        };
        let left = make("left");
        let right = make("right");

        let left_inner = left.clone();
        let right_inner = right.clone();
        let outcome = left
            .run_sync(move || {
                right_inner
                    .run_sync(move || left_inner.run_sync(|| ()).map_err(|e| e.is_deadlock()))
                    .unwrap()
            })
            .unwrap();

        assert_eq!(
            outcome,
            Completion::Executed(Completion::Executed(Err(true)))
        );
        assert!(detector.is_idle());
    }

    #[test]
    fn test_stats_serialize() {
        let sequencer = Sequencer::new().unwrap();
        for _ in 0..3 {
            sequencer.run_sync(|| ()).unwrap();
        }
        let stats: StatsSnapshot = sequencer.stats();
        assert_eq!(stats.sync_executed, 3);

        let json: serde_json::Value = serde_json::from_str(&stats.to_json().unwrap()).unwrap();
        assert_eq!(json["sync_executed"], 3);
        assert_eq!(json["abandoned"], 0);
    }

    #[test]
    fn test_debug_output() {
        let sequencer = Sequencer::new().unwrap();
        let shown = format!("{sequencer:?}");
        assert!(shown.contains("Sequencer"));
        assert!(shown.contains("queue_capacity"));
    }
}
