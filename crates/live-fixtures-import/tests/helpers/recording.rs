//! Recording collaborators for assertions on side channels.

use std::sync::{Arc, Mutex};

use live_fixtures_import::progress::{ProgressEvent, ProgressSink};

/// Progress sink that keeps every event it receives.
#[derive(Clone, Default)]
pub struct RecordingProgress {
	events: Arc<Mutex<Vec<ProgressEvent>>>,
	finished: Arc<Mutex<Vec<(String, usize)>>>,
}

impl RecordingProgress {
	pub fn events(&self) -> Vec<ProgressEvent> {
		self.events.lock().unwrap().clone()
	}

	pub fn finished(&self) -> Vec<(String, usize)> {
		self.finished.lock().unwrap().clone()
	}
}

impl ProgressSink for RecordingProgress {
	fn on_progress(&mut self, event: &ProgressEvent) {
		self.events.lock().unwrap().push(event.clone());
	}

	fn on_finish(&mut self, entity: &str, processed: usize) {
		self.finished
			.lock()
			.unwrap()
			.push((entity.to_string(), processed));
	}
}
