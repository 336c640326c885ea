//! One interactive session against one execution target.

use std::sync::Arc;

use tokio::sync::broadcast;
use tracing::{debug, info};
use workbench_graph::{CallId, GraphError, InteractionGraph, render_script};
use workbench_invocation::{CompletionBridge, InvocationDescriptor, InvocationKind, InvocationOutcome, ObjectHandle};

use crate::state::{SessionState, SharedState};
use crate::{BenchEvent, ExecutionTarget, Invoker, LoadStart, ObjectScope, TargetHandle, TargetLoader, WorkbenchConfig};

/// Outcome of [`Workbench::call_and_record`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedOutcome {
	pub outcome: InvocationOutcome,
	/// The graph node for the call; `None` when the call failed.
	pub call: Option<CallId>,
}

/// Owns the target lifecycle, the invoker and the session registries.
///
/// The interaction graph and the object bench share one lock. Watchers and
/// target code never run while it is held.
pub struct Workbench {
	config: WorkbenchConfig,
	handle: TargetHandle,
	loader: TargetLoader,
	target: Arc<dyn ExecutionTarget>,
	state: SharedState,
	bridge: CompletionBridge<Invoker>,
}

impl std::fmt::Debug for Workbench {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Workbench")
			.field("state", &self.handle.state())
			.field("config", &self.config)
			.finish_non_exhaustive()
	}
}

impl Workbench {
	pub fn new(config: WorkbenchConfig, target: Arc<dyn ExecutionTarget>) -> Self {
		let handle = TargetHandle::new();
		let state = SessionState::shared(config.bench_event_buffer);
		let invoker = Invoker::new(handle.clone(), Arc::clone(&target), Arc::clone(&state), &config.default_result_name);
		let bridge = CompletionBridge::new(invoker).with_timeout(config.call_timeout());
		Self {
			loader: TargetLoader::new(config.loader_thread_name.clone()),
			config,
			handle,
			target,
			state,
			bridge,
		}
	}

	/// Starts the target in the background. See [`TargetLoader::start`].
	pub fn start(&self) -> LoadStart {
		self.loader.start(&self.handle, Arc::clone(&self.target), self.invoker().sink())
	}

	pub fn handle(&self) -> &TargetHandle {
		&self.handle
	}

	pub fn invoker(&self) -> &Invoker {
		self.bridge.invoker()
	}

	pub fn config(&self) -> &WorkbenchConfig {
		&self.config
	}

	/// Invokes `descriptor` and blocks until it completes.
	///
	/// # Panics
	///
	/// Panics when called from inside an async runtime; use
	/// [`Self::call_async`] there.
	pub fn call(&self, descriptor: InvocationDescriptor) -> InvocationOutcome {
		self.bridge.call(descriptor)
	}

	pub async fn call_async(&self, descriptor: InvocationDescriptor) -> InvocationOutcome {
		self.bridge.call_async(descriptor).await
	}

	/// Records `descriptor` in the interaction graph without invoking it.
	///
	/// Unnamed constructors are recorded under the default result name.
	pub fn record(&self, descriptor: &InvocationDescriptor) -> Result<CallId, GraphError> {
		let binding = descriptor.binding().map(str::to_owned);
		self.record_as(descriptor, binding.as_deref())
	}

	/// Invokes `descriptor`, blocking, and records it once it succeeds.
	///
	/// A method call on a receiver the graph has never seen is refused before
	/// anything is dispatched. Method results are recorded under their binding
	/// only when the target returned an object.
	pub fn call_and_record(&self, descriptor: InvocationDescriptor) -> Result<RecordedOutcome, GraphError> {
		if let Some(receiver) = descriptor.receiver()
			&& self.state.lock().graph.lookup_by_name(receiver).is_none()
		{
			return Err(GraphError::ReceiverNotFound(receiver.to_owned()));
		}

		let outcome = self.call(descriptor.clone());
		let call = match &outcome {
			InvocationOutcome::Success { binding, .. } => Some(self.record_as(&descriptor, binding.as_deref())?),
			InvocationOutcome::Failure(err) => {
				debug!(call = %descriptor.describe(), error = %err, "workbench.not_recorded");
				None
			}
		};
		Ok(RecordedOutcome { outcome, call })
	}

	fn record_as(&self, descriptor: &InvocationDescriptor, binding: Option<&str>) -> Result<CallId, GraphError> {
		let mut state = self.state.lock();
		let graph = &mut state.graph;
		let args = descriptor.args();
		match (descriptor.kind(), descriptor.receiver(), descriptor.method_name()) {
			(InvocationKind::Method, Some(receiver), Some(method)) => match binding {
				Some(name) => graph.add_method_call_bound(receiver, method, descriptor.type_name(), args, name),
				None => graph.add_method_call(receiver, method, descriptor.type_name(), args),
			},
			_ => {
				let name = binding.unwrap_or(&self.config.default_result_name);
				Ok(graph.begin_constructor_call(name, descriptor.type_name(), args))
			}
		}
	}

	/// Runs `f` against the interaction graph under the session lock.
	pub fn with_graph<R>(&self, f: impl FnOnce(&InteractionGraph) -> R) -> R {
		f(&self.state.lock().graph)
	}

	/// Runs `f` against the object bench under the session lock.
	pub fn with_scope<R>(&self, f: impl FnOnce(&ObjectScope) -> R) -> R {
		f(&self.state.lock().scope)
	}

	/// Renders the recorded calls as program text.
	pub fn script(&self) -> String {
		render_script(&self.state.lock().graph)
	}

	pub fn subscribe_bench(&self) -> broadcast::Receiver<BenchEvent> {
		self.state.lock().scope.subscribe()
	}

	/// Puts `object` on the bench as `name`, replacing any previous binding.
	pub fn bind_object(&self, name: &str, object: ObjectHandle) -> Option<ObjectHandle> {
		self.state.lock().scope.bind(name, object)
	}

	pub fn unbind_object(&self, name: &str) -> Option<ObjectHandle> {
		self.state.lock().scope.unbind(name)
	}

	/// Clears the interaction graph and the bench for a fresh session.
	///
	/// The target keeps running; objects it holds are simply no longer named.
	pub fn reset(&self) {
		let mut state = self.state.lock();
		state.graph.reset();
		state.scope.clear();
		info!("workbench.reset");
	}

	/// Closes the session.
	///
	/// New calls fail with "not open", every waiting call fails with
	/// `TargetTerminated`, and the target is stopped.
	pub fn shutdown(&self) {
		let closed = self.handle.close();
		let abandoned = self.invoker().fail_pending();
		self.target.shutdown();
		info!(closed, abandoned, "workbench.shutdown");
	}
}

#[cfg(test)]
mod tests {
	use pretty_assertions::assert_eq;

	use super::*;
	use crate::target::{InvocationId, MarshalledCall, TargetError};
	use crate::{CompletionSink, TargetState};

	/// Target that never starts, so nothing is ever dispatched.
	struct Inert;

	impl ExecutionTarget for Inert {
		fn start(&self, _sink: CompletionSink) -> Result<(), TargetError> {
			Err(TargetError::Startup("inert".into()))
		}

		fn dispatch(&self, _id: InvocationId, _call: MarshalledCall) -> Result<(), TargetError> {
			Err(TargetError::Disconnected)
		}
	}

	fn workbench() -> Workbench {
		Workbench::new(WorkbenchConfig::default(), Arc::new(Inert))
	}

	#[test]
	fn record_without_invoking() {
		let bench = workbench();
		let a1 = bench.record(&InvocationDescriptor::constructor("Account", ["100"]).bind_as("a1")).unwrap();
		let unnamed = bench.record(&InvocationDescriptor::constructor("Account", [] as [&str; 0])).unwrap();
		let deposit = bench.record(&InvocationDescriptor::method("a1", "Account", "deposit", ["5"])).unwrap();

		bench.with_graph(|graph| {
			assert_eq!(graph.lookup_by_name("a1").map(|c| c.id()), Some(a1));
			assert_eq!(graph.lookup_by_name("result").map(|c| c.id()), Some(unnamed));
			assert_eq!(graph.get(deposit).and_then(|c| c.receiver()), Some((a1, "deposit")));
		});
	}

	#[test]
	fn record_method_on_unknown_receiver() {
		let bench = workbench();
		let err = bench.record(&InvocationDescriptor::method("ghost", "Account", "deposit", ["5"])).unwrap_err();
		assert_eq!(err, GraphError::ReceiverNotFound("ghost".into()));
	}

	#[test]
	fn call_and_record_refuses_unknown_receiver_before_dispatch() {
		let bench = workbench();
		let err = bench.call_and_record(InvocationDescriptor::method("ghost", "Account", "deposit", ["5"])).unwrap_err();
		assert_eq!(err, GraphError::ReceiverNotFound("ghost".into()));
		assert_eq!(bench.invoker().pending_count(), 0);
	}

	#[test]
	fn failed_calls_are_not_recorded() {
		let bench = workbench();
		let recorded = bench.call_and_record(InvocationDescriptor::constructor("Account", ["1"]).bind_as("a1")).unwrap();
		assert_eq!(recorded.call, None);
		assert_eq!(recorded.outcome.error().map(ToString::to_string), Some("not open".to_string()));
		assert!(bench.with_graph(InteractionGraph::is_empty));
	}

	#[test]
	fn reset_clears_graph_and_bench() {
		let bench = workbench();
		bench.record(&InvocationDescriptor::constructor("Account", ["1"]).bind_as("a1")).unwrap();
		bench.bind_object("a1", ObjectHandle::new(workbench_invocation::ObjectId(1), "Account"));
		bench.reset();
		assert!(bench.with_graph(InteractionGraph::is_empty));
		assert!(bench.with_scope(ObjectScope::is_empty));
		assert_eq!(bench.script(), "");
	}

	#[test]
	fn failed_startup_is_reported_on_the_handle() {
		let bench = workbench();
		assert_eq!(bench.start(), LoadStart::Started);
		assert_eq!(bench.handle().wait_settled_blocking(), TargetState::Failed("target startup failed: inert".into()));
		assert_eq!(bench.start(), LoadStart::AlreadyStarted);
	}
}
