use std::sync::Arc;

use crate::{InvocationDescriptor, InvocationError, RemoteValue};

/// Result of handing an outcome to a watcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
	/// The watcher took the outcome.
	Accepted,
	/// The watcher already had an outcome; the new one was discarded.
	Rejected,
}

/// Receiver of one invocation's outcome.
///
/// Called from whatever thread the event-delivery path runs on, exactly once
/// per invocation under normal operation.
pub trait ResultWatcher: Send + Sync {
	fn put_result(&self, value: RemoteValue, binding: Option<String>) -> Delivery;

	fn put_error(&self, error: InvocationError) -> Delivery;
}

/// Anything that can start an invocation and report its outcome to a watcher.
///
/// Implementations must not block until completion; the outcome may arrive
/// later on another thread.
pub trait Invoke: Send + Sync {
	fn invoke(&self, descriptor: InvocationDescriptor, watcher: Arc<dyn ResultWatcher>);

	/// Stops tracking the in-flight invocation reporting to `watcher`, so a
	/// later completion has no effect.
	///
	/// Returns false when the completion was already taken for delivery; the
	/// caller must then leave the watcher to it. Implementations that keep no
	/// per-call state return true.
	fn abandon(&self, watcher: &Arc<dyn ResultWatcher>) -> bool {
		let _ = watcher;
		true
	}
}

impl<T: Invoke + ?Sized> Invoke for Arc<T> {
	fn invoke(&self, descriptor: InvocationDescriptor, watcher: Arc<dyn ResultWatcher>) {
		(**self).invoke(descriptor, watcher);
	}

	fn abandon(&self, watcher: &Arc<dyn ResultWatcher>) -> bool {
		(**self).abandon(watcher)
	}
}
