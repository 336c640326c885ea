//! Dispatches invocations to a target and routes completions to watchers.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, warn};
use workbench_invocation::{
	Delivery, InvocationDescriptor, InvocationError, InvocationKind, InvocationOutcome, Invoke, RemoteValue, ResultWatcher,
};

use crate::TargetHandle;
use crate::state::SharedState;
use crate::target::{ExecutionTarget, InvocationId, MarshalledArg, MarshalledCall, RawCompletion, RemoteFailure};

/// Extracts the new instance from a constructor's raw result.
///
/// The target returns constructor results wrapped in a holder object whose
/// first declared field is the constructed instance.
pub fn unwrap_constructed(raw: RemoteValue) -> Result<RemoteValue, InvocationError> {
	let holder = match raw {
		RemoteValue::Object(holder) => holder,
		other => return Err(InvocationError::Marshalling(format!("constructor returned {other} instead of a result holder"))),
	};
	match holder.field(0) {
		Some(instance @ RemoteValue::Object(_)) => Ok(instance.clone()),
		_ => Err(InvocationError::Marshalling(format!(
			"constructor result holder {} has no instance in its first field",
			holder.type_name()
		))),
	}
}

struct PendingCall {
	watcher: Arc<dyn ResultWatcher>,
	kind: InvocationKind,
	binding: Option<String>,
	label: String,
}

#[derive(Default)]
struct PendingInner {
	calls: HashMap<InvocationId, PendingCall>,
	next_id: u64,
	closed: bool,
}

/// In-flight invocations awaiting completion, keyed by id.
#[derive(Default)]
struct PendingTable {
	inner: Mutex<PendingInner>,
}

impl PendingTable {
	/// Registers a call under a fresh id; hands it back once the table is closed.
	fn insert(&self, call: PendingCall) -> Result<InvocationId, PendingCall> {
		let mut inner = self.inner.lock();
		if inner.closed {
			return Err(call);
		}
		let id = InvocationId(inner.next_id);
		inner.next_id += 1;
		inner.calls.insert(id, call);
		Ok(id)
	}

	fn take(&self, id: InvocationId) -> Option<PendingCall> {
		self.inner.lock().calls.remove(&id)
	}

	/// Removes the call reporting to `watcher`, matched by identity.
	fn take_watcher(&self, watcher: &Arc<dyn ResultWatcher>) -> Option<(InvocationId, PendingCall)> {
		let mut inner = self.inner.lock();
		let id = inner
			.calls
			.iter()
			.find(|(_, call)| std::ptr::addr_eq(Arc::as_ptr(&call.watcher), Arc::as_ptr(watcher)))
			.map(|(id, _)| *id)?;
		inner.calls.remove(&id).map(|call| (id, call))
	}

	/// Refuses further inserts and drains everything still pending.
	fn close(&self) -> Vec<PendingCall> {
		let mut inner = self.inner.lock();
		inner.closed = true;
		inner.calls.drain().map(|(_, call)| call).collect()
	}

	fn len(&self) -> usize {
		self.inner.lock().calls.len()
	}
}

/// Event-delivery entry point handed to a target at startup.
///
/// Cloneable and callable from any thread. Each dispatched id must be
/// completed once; unknown ids are logged and dropped.
#[derive(Clone)]
pub struct CompletionSink {
	pending: Arc<PendingTable>,
	state: SharedState,
	default_result_name: Arc<str>,
}

impl fmt::Debug for CompletionSink {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("CompletionSink")
			.field("pending", &self.pending.len())
			.field("default_result_name", &self.default_result_name)
			.finish_non_exhaustive()
	}
}

impl CompletionSink {
	/// Reports the raw completion of invocation `id`.
	pub fn complete(&self, id: InvocationId, completion: RawCompletion) {
		let Some(call) = self.pending.take(id) else {
			warn!(%id, "completion for unknown or abandoned invocation");
			return;
		};
		let outcome = self.settle(&call, completion);
		debug!(%id, call = %call.label, success = outcome.is_success(), "invoker.complete");
		let delivery = match outcome {
			InvocationOutcome::Success { value, binding } => call.watcher.put_result(value, binding),
			InvocationOutcome::Failure(err) => call.watcher.put_error(err),
		};
		if delivery == Delivery::Rejected {
			debug!(%id, "watcher had already settled");
		}
	}

	fn settle(&self, call: &PendingCall, completion: RawCompletion) -> InvocationOutcome {
		let raw = match completion {
			Ok(raw) => raw,
			Err(RemoteFailure::Exception(msg)) => return InvocationOutcome::Failure(InvocationError::RemoteExecution(msg)),
			Err(RemoteFailure::Marshalling(msg)) => return InvocationOutcome::Failure(InvocationError::Marshalling(msg)),
		};

		let (value, name) = match call.kind {
			InvocationKind::Constructor => match unwrap_constructed(raw) {
				Ok(value) => (value, Some(call.binding.clone().unwrap_or_else(|| self.default_result_name.to_string()))),
				Err(err) => return InvocationOutcome::Failure(err),
			},
			InvocationKind::Method => (raw, call.binding.clone()),
		};

		let binding = match (name, &value) {
			(Some(name), RemoteValue::Object(object)) => {
				self.state.lock().scope.bind(&name, object.clone());
				Some(name)
			}
			_ => None,
		};
		InvocationOutcome::Success { value, binding }
	}
}

/// Issues invocations against one execution target.
pub struct Invoker {
	handle: TargetHandle,
	target: Arc<dyn ExecutionTarget>,
	sink: CompletionSink,
}

impl fmt::Debug for Invoker {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Invoker")
			.field("state", &self.handle.state())
			.field("sink", &self.sink)
			.finish_non_exhaustive()
	}
}

impl Invoker {
	pub(crate) fn new(handle: TargetHandle, target: Arc<dyn ExecutionTarget>, state: SharedState, default_result_name: &str) -> Self {
		Self {
			handle,
			target,
			sink: CompletionSink {
				pending: Arc::default(),
				state,
				default_result_name: default_result_name.into(),
			},
		}
	}

	/// The event-delivery entry point for this invoker's target.
	pub fn sink(&self) -> CompletionSink {
		self.sink.clone()
	}

	/// Number of dispatched invocations still awaiting completion.
	pub fn pending_count(&self) -> usize {
		self.sink.pending.len()
	}

	/// Fails every pending invocation with [`InvocationError::TargetTerminated`]
	/// and refuses new ones. Returns how many were failed.
	pub(crate) fn fail_pending(&self) -> usize {
		let drained = self.sink.pending.close();
		let count = drained.len();
		for call in drained {
			debug!(call = %call.label, "invoker.terminate");
			call.watcher.put_error(InvocationError::TargetTerminated);
		}
		count
	}

	fn marshal(&self, descriptor: &InvocationDescriptor) -> Result<MarshalledCall, InvocationError> {
		let state = self.sink.state.lock();
		let receiver = match descriptor.receiver() {
			Some(name) => Some(
				state
					.scope
					.resolve(name)
					.cloned()
					.ok_or_else(|| InvocationError::Marshalling(format!("no object is bound as '{name}'")))?,
			),
			None => None,
		};
		let args = descriptor
			.args()
			.iter()
			.map(|text| match state.scope.resolve(text) {
				Some(object) => MarshalledArg::Object(object.clone()),
				None => MarshalledArg::Source(text.clone()),
			})
			.collect();
		Ok(MarshalledCall {
			kind: descriptor.kind(),
			type_name: descriptor.type_name().to_owned(),
			method: descriptor.method_name().map(str::to_owned),
			receiver,
			args,
		})
	}
}

impl Invoke for Invoker {
	fn invoke(&self, descriptor: InvocationDescriptor, watcher: Arc<dyn ResultWatcher>) {
		let label = descriptor.describe();
		if !self.handle.is_ready() {
			debug!(call = %label, state = self.handle.state().as_str(), "invoker.not_ready");
			watcher.put_error(InvocationError::NotReady);
			return;
		}

		let call = match self.marshal(&descriptor) {
			Ok(call) => call,
			Err(err) => {
				debug!(call = %label, error = %err, "invoker.marshal_failed");
				watcher.put_error(err);
				return;
			}
		};

		let pending = PendingCall {
			watcher,
			kind: descriptor.kind(),
			binding: descriptor.binding().map(str::to_owned),
			label,
		};
		let id = match self.sink.pending.insert(pending) {
			Ok(id) => id,
			Err(pending) => {
				pending.watcher.put_error(InvocationError::TargetTerminated);
				return;
			}
		};

		debug!(%id, call = %descriptor.describe(), "invoker.dispatch");
		if let Err(err) = self.target.dispatch(id, call) {
			warn!(%id, error = %err, "invoker.dispatch_failed");
			if let Some(pending) = self.sink.pending.take(id) {
				pending.watcher.put_error(err.into());
			}
		}
	}

	fn abandon(&self, watcher: &Arc<dyn ResultWatcher>) -> bool {
		match self.sink.pending.take_watcher(watcher) {
			Some((id, call)) => {
				debug!(%id, call = %call.label, "invoker.abandon");
				true
			}
			None => false,
		}
	}
}
