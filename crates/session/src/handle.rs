//! Target lifecycle state.

use std::sync::Arc;

use tokio::sync::watch;
use tracing::info;

/// Lifecycle state of an execution target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TargetState {
	Unloaded,
	/// A loader is starting the target.
	Loading,
	/// Invocations may be dispatched.
	Ready,
	/// Startup failed; the message is kept for diagnostics.
	Failed(Arc<str>),
	/// The session was shut down while loading or after becoming ready.
	Closed,
}

impl TargetState {
	/// True for states no loader will leave.
	pub fn is_settled(&self) -> bool {
		matches!(self, Self::Ready | Self::Failed(_) | Self::Closed)
	}

	pub fn as_str(&self) -> &'static str {
		match self {
			Self::Unloaded => "unloaded",
			Self::Loading => "loading",
			Self::Ready => "ready",
			Self::Failed(_) => "failed",
			Self::Closed => "closed",
		}
	}
}

/// Shared handle to one target's lifecycle state.
///
/// Transitions are compare-and-set, so racing loaders or teardown calls
/// cannot skip a state: `Unloaded -> Loading -> Ready | Failed`, and
/// `Ready -> Closed`.
#[derive(Debug, Clone)]
pub struct TargetHandle {
	state_tx: Arc<watch::Sender<TargetState>>,
}

impl Default for TargetHandle {
	fn default() -> Self {
		Self::new()
	}
}

impl TargetHandle {
	pub fn new() -> Self {
		Self {
			state_tx: Arc::new(watch::Sender::new(TargetState::Unloaded)),
		}
	}

	pub fn state(&self) -> TargetState {
		self.state_tx.borrow().clone()
	}

	pub fn is_ready(&self) -> bool {
		matches!(*self.state_tx.borrow(), TargetState::Ready)
	}

	/// Subscribe to state changes.
	pub fn subscribe(&self) -> watch::Receiver<TargetState> {
		self.state_tx.subscribe()
	}

	/// Moves `Unloaded -> Loading`. Returns false if the handle was not unloaded.
	pub(crate) fn begin_loading(&self) -> bool {
		self.transition(|s| matches!(s, TargetState::Unloaded), TargetState::Loading)
	}

	/// Moves `Loading -> Ready` or `Loading -> Failed`.
	pub(crate) fn finish_loading(&self, result: Result<(), String>) -> bool {
		let next = match result {
			Ok(()) => TargetState::Ready,
			Err(msg) => TargetState::Failed(msg.into()),
		};
		self.transition(|s| matches!(s, TargetState::Loading), next)
	}

	/// Moves `Loading` or `Ready` to `Closed`. A loader still running then
	/// finds the handle closed and stops the target it started.
	pub(crate) fn close(&self) -> bool {
		self.transition(|s| matches!(s, TargetState::Loading | TargetState::Ready), TargetState::Closed)
	}

	fn transition(&self, from: impl FnOnce(&TargetState) -> bool, to: TargetState) -> bool {
		let mut previous = None;
		let changed = self.state_tx.send_if_modified(|state| {
			if !from(state) {
				return false;
			}
			previous = Some(std::mem::replace(state, to.clone()));
			true
		});
		if let Some(previous) = previous {
			info!(from = previous.as_str(), to = to.as_str(), "target.state");
		}
		changed
	}

	/// Waits until the target reaches a settled state and returns it.
	pub async fn wait_settled(&self) -> TargetState {
		let mut rx = self.subscribe();
		match rx.wait_for(TargetState::is_settled).await {
			Ok(state) => state.clone(),
			Err(_) => self.state(),
		}
	}

	/// Blocking form of [`Self::wait_settled`].
	///
	/// # Panics
	///
	/// Panics when called from inside an async runtime.
	pub fn wait_settled_blocking(&self) -> TargetState {
		workbench_worker::runtime_handle().block_on(self.wait_settled())
	}
}
