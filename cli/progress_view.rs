use scorer_tree::TrainProgress;
use std::{
	sync::mpsc::{channel, Receiver, RecvTimeoutError, Sender},
	thread::{spawn, JoinHandle},
	time::Duration,
};

const POLL_INTERVAL: Duration = Duration::from_millis(250);

/// A `ProgressView` watches the round counter from a background thread and logs whenever it advances.
pub struct ProgressView {
	thread: Option<JoinHandle<()>>,
	sender: Option<Sender<Option<TrainProgress>>>,
}

impl ProgressView {
	pub fn new() -> Self {
		let (sender, receiver) = channel::<Option<TrainProgress>>();
		let thread = Some(spawn(move || thread_main(receiver)));
		Self {
			thread,
			sender: Some(sender),
		}
	}

	pub fn update(&mut self, progress: TrainProgress) {
		if let Some(sender) = self.sender.as_ref() {
			sender.send(Some(progress)).ok();
		}
	}
}

impl Drop for ProgressView {
	fn drop(&mut self) {
		if let Some(sender) = self.sender.take() {
			sender.send(None).ok();
		}
		if let Some(thread) = self.thread.take() {
			thread.join().ok();
		}
	}
}

fn thread_main(receiver: Receiver<Option<TrainProgress>>) {
	let mut progress = None;
	let mut reported = None;
	loop {
		let done = match receiver.recv_timeout(POLL_INTERVAL) {
			Ok(Some(new_progress)) => {
				progress = Some(new_progress);
				false
			}
			Ok(None) | Err(RecvTimeoutError::Disconnected) => true,
			Err(RecvTimeoutError::Timeout) => false,
		};
		if let Some(TrainProgress::Training(counter)) = progress.as_ref() {
			let current = counter.get();
			if reported != Some(current) {
				tracing::info!("trained {} of {} rounds", current, counter.total());
				reported = Some(current);
			}
		}
		if done {
			break;
		}
	}
}
