use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::thread;
use std::time::{Duration, Instant};
use threadseq::{Completion, Sequencer, SequencerConfig};

fn run_mixed_load(sync_threads: usize, async_threads: usize, duration: Duration) {
    let config = SequencerConfig::builder()
        .queue_capacity(100)
        .poll_interval(Duration::from_millis(5))
        .build()
        .unwrap();
    let sequencer = Arc::new(Sequencer::with_config(config).unwrap());
    let deadline = Instant::now() + duration;
    let overlap = Arc::new(AtomicBool::new(false));
    let active = Arc::new(AtomicBool::new(false));
    let submitted = Arc::new(AtomicU64::new(0));

    let make_task = {
        let active = active.clone();
        let overlap = overlap.clone();
        move || {
            let active = active.clone();
            let overlap = overlap.clone();
            move || {
                if active.swap(true, Ordering::SeqCst) {
                    overlap.store(true, Ordering::SeqCst);
                }
                active.store(false, Ordering::SeqCst);
            }
        }
    };

    let mut handles = Vec::new();
    for i in 0..(sync_threads + async_threads) {
        let sequencer = sequencer.clone();
        let submitted = submitted.clone();
        let make_task = make_task.clone();
        let is_sync = i < sync_threads;
        handles.push(thread::spawn(move || {
            while Instant::now() < deadline {
                let task = make_task();
                let executed = if is_sync {
                    sequencer.run_sync(task).unwrap().is_executed()
                } else {
                    sequencer.run_async(task).unwrap().is_enqueued()
                };
                if executed {
                    submitted.fetch_add(1, Ordering::Relaxed);
                }
            }
        }));
    }

    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(
        sequencer.submit(|| ()).unwrap().wait(),
        Completion::Executed(())
    );
    let stats = sequencer.stats();
    assert!(!overlap.load(Ordering::SeqCst));
    assert_eq!(stats.critical_errors, 0);
    assert_eq!(stats.abandoned, 0);
    assert_eq!(stats.total_executed(), submitted.load(Ordering::Relaxed) + 1);
    assert_eq!(sequencer.pending_async(), 0);

    sequencer.stop();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mixed_load_short() {
        run_mixed_load(8, 8, Duration::from_millis(300));
    }

    #[test]
    #[ignore = "spawns 200 threads for several seconds"]
    fn test_mixed_load_heavy() {
        run_mixed_load(100, 100, Duration::from_secs(3));
    }
}
