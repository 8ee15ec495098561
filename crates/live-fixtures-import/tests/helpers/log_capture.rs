//! Tracing layer that keeps formatted events for assertions.

use std::sync::{Arc, Mutex};

use tracing_subscriber::layer::Context;

/// Captures every event as `"[LEVEL] message field=value ..."`.
#[derive(Clone, Default)]
pub struct LogCapture {
	logs: Arc<Mutex<Vec<String>>>,
}

impl LogCapture {
	pub fn logs(&self) -> Vec<String> {
		self.logs.lock().unwrap().clone()
	}

	/// Whether any captured `level` event contains every fragment.
	pub fn contains(&self, level: &str, fragments: &[&str]) -> bool {
		self.logs().iter().any(|log| {
			log.starts_with(&format!("[{}]", level))
				&& fragments.iter().all(|fragment| log.contains(fragment))
		})
	}
}

struct EventVisitor {
	message: String,
	fields: Vec<String>,
}

impl tracing::field::Visit for EventVisitor {
	fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn std::fmt::Debug) {
		if field.name() == "message" {
			self.message = format!("{:?}", value);
		} else {
			self.fields.push(format!("{}={:?}", field.name(), value));
		}
	}

	fn record_str(&mut self, field: &tracing::field::Field, value: &str) {
		if field.name() == "message" {
			self.message = value.to_string();
		} else {
			self.fields.push(format!("{}={}", field.name(), value));
		}
	}
}

impl<S: tracing::Subscriber> tracing_subscriber::Layer<S> for LogCapture {
	fn on_event(&self, event: &tracing::Event<'_>, _ctx: Context<'_, S>) {
		let mut visitor = EventVisitor {
			message: String::new(),
			fields: Vec::new(),
		};
		event.record(&mut visitor);

		self.logs.lock().unwrap().push(format!(
			"[{}] {} {}",
			event.metadata().level(),
			visitor.message,
			visitor.fields.join(" ")
		));
	}
}
