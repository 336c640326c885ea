//! Registry of recorded calls.

use tracing::debug;

use crate::resolve::{BindingTable, resolve_arguments};
use crate::{CallId, CallKind, RecordedCall};

/// Errors from graph operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GraphError {
	/// A method call named a receiver that was never recorded.
	#[error("no recorded call is bound as '{0}'")]
	ReceiverNotFound(String),
}

/// Argument-provenance DAG of every invocation in one session.
///
/// Nodes are never removed individually. Re-recording a binding name
/// repoints the name to the new call; the old node stays in place so any
/// references to it remain valid.
#[derive(Debug, Clone, Default)]
pub struct InteractionGraph {
	calls: Vec<RecordedCall>,
	bindings: BindingTable,
}

impl InteractionGraph {
	pub fn new() -> Self {
		Self::default()
	}

	/// Records a constructor call bound as `binding`.
	///
	/// Arguments are resolved against the names bound before this call, so a
	/// constructor can never reference itself.
	pub fn begin_constructor_call<S: AsRef<str>>(&mut self, binding: &str, type_name: &str, args: &[S]) -> CallId {
		let args = resolve_arguments(&self.bindings, args);
		let id = self.push(RecordedCall {
			id: CallId(self.calls.len()),
			binding: binding.to_owned(),
			bound: true,
			type_name: type_name.to_owned(),
			kind: CallKind::Constructor,
			args,
			children: Vec::new(),
		});
		self.bind(binding, id);
		id
	}

	/// Records a method call on the object bound as `receiver`.
	pub fn add_method_call<S: AsRef<str>>(&mut self, receiver: &str, method: &str, type_name: &str, args: &[S]) -> Result<CallId, GraphError> {
		self.record_method(receiver, method, type_name, args, None)
	}

	/// Records a method call whose result is bound as `result_binding`.
	pub fn add_method_call_bound<S: AsRef<str>>(
		&mut self,
		receiver: &str,
		method: &str,
		type_name: &str,
		args: &[S],
		result_binding: &str,
	) -> Result<CallId, GraphError> {
		self.record_method(receiver, method, type_name, args, Some(result_binding))
	}

	fn record_method<S: AsRef<str>>(
		&mut self,
		receiver: &str,
		method: &str,
		type_name: &str,
		args: &[S],
		result_binding: Option<&str>,
	) -> Result<CallId, GraphError> {
		let receiver_id = self.bindings.get(receiver).ok_or_else(|| GraphError::ReceiverNotFound(receiver.to_owned()))?;
		let args = resolve_arguments(&self.bindings, args);
		let index = self.calls.len();
		let (binding, bound) = match result_binding {
			Some(name) => (name.to_owned(), true),
			None => (format!("{receiver}.{method}#{index}"), false),
		};
		let id = self.push(RecordedCall {
			id: CallId(index),
			binding,
			bound,
			type_name: type_name.to_owned(),
			kind: CallKind::Method {
				receiver: receiver_id,
				method: method.to_owned(),
			},
			args,
			children: Vec::new(),
		});
		self.calls[receiver_id.0].children.push(id);
		if let Some(name) = result_binding {
			self.bind(name, id);
		}
		Ok(id)
	}

	fn push(&mut self, call: RecordedCall) -> CallId {
		let id = call.id;
		self.calls.push(call);
		id
	}

	fn bind(&mut self, name: &str, id: CallId) {
		if let Some(displaced) = self.bindings.insert(name, id) {
			debug!(binding = name, %displaced, replacement = %id, "graph.binding_displaced");
		}
	}

	/// Returns the call currently bound as `name`.
	pub fn lookup_by_name(&self, name: &str) -> Option<&RecordedCall> {
		self.bindings.get(name).map(|id| &self.calls[id.0])
	}

	pub fn get(&self, id: CallId) -> Option<&RecordedCall> {
		self.calls.get(id.0)
	}

	/// All recorded calls in recording order, displaced ones included.
	pub fn calls(&self) -> &[RecordedCall] {
		&self.calls
	}

	/// Immutable view of the current name bindings.
	pub fn bindings(&self) -> &BindingTable {
		&self.bindings
	}

	pub fn len(&self) -> usize {
		self.calls.len()
	}

	pub fn is_empty(&self) -> bool {
		self.calls.is_empty()
	}

	/// Forgets every call and binding, starting a new session.
	pub fn reset(&mut self) {
		self.calls.clear();
		self.bindings.clear();
	}
}
