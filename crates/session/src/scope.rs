//! The object bench: binding names for live objects in the target.

use std::collections::HashMap;

use tokio::sync::broadcast;
use tracing::debug;
use workbench_invocation::ObjectHandle;

/// Bench change notification for presentation layers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BenchEvent {
	Bound { name: String, object: ObjectHandle },
	Unbound { name: String },
}

/// Binding name to live object handle, at most one object per name.
#[derive(Debug)]
pub struct ObjectScope {
	bindings: HashMap<String, ObjectHandle>,
	events: broadcast::Sender<BenchEvent>,
}

impl ObjectScope {
	/// Creates an empty scope whose event channel buffers `event_buffer` events.
	pub fn new(event_buffer: usize) -> Self {
		let (events, _) = broadcast::channel(event_buffer.max(1));
		Self {
			bindings: HashMap::new(),
			events,
		}
	}

	/// Binds `object` as `name`, first unbinding whatever held that name.
	///
	/// Returns the displaced object.
	pub fn bind(&mut self, name: &str, object: ObjectHandle) -> Option<ObjectHandle> {
		let displaced = self.unbind(name);
		debug!(binding = name, object = %object.id(), "scope.bind");
		self.bindings.insert(name.to_owned(), object.clone());
		self.emit(BenchEvent::Bound { name: name.to_owned(), object });
		displaced
	}

	/// Removes the binding for `name`, if any.
	pub fn unbind(&mut self, name: &str) -> Option<ObjectHandle> {
		let removed = self.bindings.remove(name)?;
		debug!(binding = name, object = %removed.id(), "scope.unbind");
		self.emit(BenchEvent::Unbound { name: name.to_owned() });
		Some(removed)
	}

	pub fn resolve(&self, name: &str) -> Option<&ObjectHandle> {
		self.bindings.get(name)
	}

	pub fn len(&self) -> usize {
		self.bindings.len()
	}

	pub fn is_empty(&self) -> bool {
		self.bindings.is_empty()
	}

	/// Bound names, sorted.
	pub fn names(&self) -> Vec<String> {
		let mut names: Vec<_> = self.bindings.keys().cloned().collect();
		names.sort();
		names
	}

	/// Unbinds everything, notifying subscribers for each name.
	pub fn clear(&mut self) {
		for name in self.names() {
			self.unbind(&name);
		}
	}

	/// Subscribe to bench changes.
	pub fn subscribe(&self) -> broadcast::Receiver<BenchEvent> {
		self.events.subscribe()
	}

	fn emit(&self, event: BenchEvent) {
		// Sending with no subscribers is not an error.
		let _ = self.events.send(event);
	}
}

#[cfg(test)]
mod tests {
	use pretty_assertions::assert_eq;
	use workbench_invocation::ObjectId;

	use super::*;

	fn obj(id: u64) -> ObjectHandle {
		ObjectHandle::new(ObjectId(id), "Account")
	}

	#[test]
	fn rebinding_leaves_one_live_binding() {
		let mut scope = ObjectScope::new(8);
		assert_eq!(scope.bind("a1", obj(1)), None);
		assert_eq!(scope.bind("a1", obj(2)), Some(obj(1)));
		assert_eq!(scope.len(), 1);
		assert_eq!(scope.resolve("a1"), Some(&obj(2)));
	}

	#[test]
	fn rebinding_notifies_unbind_before_bind() {
		let mut scope = ObjectScope::new(8);
		scope.bind("a1", obj(1));
		let mut events = scope.subscribe();
		scope.bind("a1", obj(2));

		assert_eq!(events.try_recv().unwrap(), BenchEvent::Unbound { name: "a1".into() });
		assert_eq!(events.try_recv().unwrap(), BenchEvent::Bound { name: "a1".into(), object: obj(2) });
		assert!(events.try_recv().is_err());
	}

	#[test]
	fn unbind_missing_name_is_quiet() {
		let mut scope = ObjectScope::new(8);
		let mut events = scope.subscribe();
		assert_eq!(scope.unbind("nobody"), None);
		assert!(events.try_recv().is_err());
	}

	#[test]
	fn clear_unbinds_every_name() {
		let mut scope = ObjectScope::new(8);
		scope.bind("b", obj(2));
		scope.bind("a", obj(1));
		let mut events = scope.subscribe();
		scope.clear();

		assert!(scope.is_empty());
		assert_eq!(events.try_recv().unwrap(), BenchEvent::Unbound { name: "a".into() });
		assert_eq!(events.try_recv().unwrap(), BenchEvent::Unbound { name: "b".into() });
	}
}
