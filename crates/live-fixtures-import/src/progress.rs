//! Progress reporting.
//!
//! Sinks observe the import but can neither fail it nor change its flow.

use indicatif::{ProgressBar, ProgressStyle};

/// Rows processed so far for one entity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressEvent {
	pub entity: String,
	pub processed: usize,
	pub total: usize,
}

/// Receiver of progress notifications.
pub trait ProgressSink: Send {
	/// An entity is about to be imported.
	fn on_start(&mut self, _entity: &str, _total: usize) {}

	/// One more primary row was inserted.
	fn on_progress(&mut self, event: &ProgressEvent);

	/// The entity is done.
	fn on_finish(&mut self, _entity: &str, _processed: usize) {}
}

/// Discards every event.
#[derive(Debug, Default)]
pub struct NoopProgress;

impl ProgressSink for NoopProgress {
	fn on_progress(&mut self, _event: &ProgressEvent) {}
}

/// Reports progress through `tracing`.
#[derive(Debug, Default)]
pub struct TracingProgress;

impl ProgressSink for TracingProgress {
	fn on_start(&mut self, entity: &str, total: usize) {
		tracing::debug!(entity, total, "Importing fixtures");
	}

	fn on_progress(&mut self, event: &ProgressEvent) {
		tracing::debug!(
			entity = %event.entity,
			processed = event.processed,
			total = event.total,
			"Imported row"
		);
	}

	fn on_finish(&mut self, entity: &str, processed: usize) {
		tracing::info!(entity, rows = processed, "Imported fixtures");
	}
}

/// Draws one terminal progress bar per entity.
#[derive(Default)]
pub struct ProgressBarSink {
	bar: Option<ProgressBar>,
}

impl ProgressBarSink {
	pub fn new() -> Self {
		Self::default()
	}

	fn style() -> ProgressStyle {
		ProgressStyle::default_bar()
			.template("{msg:>20} [{bar:40.cyan/blue}] {pos}/{len} ({eta})")
			.map(|style| style.progress_chars("#>-"))
			.unwrap_or_else(|_| ProgressStyle::default_bar())
	}
}

impl ProgressSink for ProgressBarSink {
	fn on_start(&mut self, entity: &str, total: usize) {
		let bar = ProgressBar::new(total as u64);
		bar.set_style(Self::style());
		bar.set_message(entity.to_string());
		self.bar = Some(bar);
	}

	fn on_progress(&mut self, event: &ProgressEvent) {
		if let Some(bar) = &self.bar {
			bar.set_position(event.processed as u64);
		}
	}

	fn on_finish(&mut self, _entity: &str, _processed: usize) {
		if let Some(bar) = self.bar.take() {
			bar.finish();
		}
	}
}
