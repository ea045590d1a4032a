use std::sync::{
	atomic::{AtomicU64, Ordering},
	Arc,
};

/// This enum reports the training progress. It is passed to the callback given to [`Model::train_with_progress`](crate::Model::train_with_progress) once, before the first round, and the counter it carries is incremented as each round completes.
#[derive(Clone, Debug)]
pub enum TrainProgress {
	Training(ProgressCounter),
}

/// A `ProgressCounter` is shared between the trainer and whoever is watching it, for example a thread that draws a progress bar.
#[derive(Clone, Debug)]
pub struct ProgressCounter {
	current: Arc<AtomicU64>,
	total: u64,
}

impl ProgressCounter {
	pub fn new(total: u64) -> Self {
		Self {
			current: Arc::new(AtomicU64::new(0)),
			total,
		}
	}

	pub fn total(&self) -> u64 {
		self.total
	}

	pub fn get(&self) -> u64 {
		self.current.load(Ordering::Relaxed)
	}

	pub fn inc(&self, amount: u64) {
		self.current.fetch_add(amount, Ordering::Relaxed);
	}

	pub fn is_done(&self) -> bool {
		self.get() >= self.total
	}
}

#[test]
fn test_progress_counter() {
	let counter = ProgressCounter::new(3);
	let watcher = counter.clone();
	counter.inc(1);
	counter.inc(1);
	assert_eq!(watcher.get(), 2);
	assert!(!watcher.is_done());
	counter.inc(1);
	assert!(watcher.is_done());
	assert_eq!(watcher.total(), 3);
}
