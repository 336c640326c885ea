//! Background startup of an execution target.

use std::sync::Arc;

use tracing::{error, info, warn};
use workbench_worker::{TaskClass, catch_panic};

use crate::{CompletionSink, ExecutionTarget, TargetHandle};

/// Whether a [`TargetLoader::start`] call launched a loader.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadStart {
	/// A loader thread is now starting the target.
	Started,
	/// The handle had already left `Unloaded`; nothing was done.
	AlreadyStarted,
}

/// Starts execution targets on a dedicated thread.
#[derive(Debug, Clone)]
pub struct TargetLoader {
	thread_name: String,
}

impl TargetLoader {
	pub fn new(thread_name: impl Into<String>) -> Self {
		Self { thread_name: thread_name.into() }
	}

	/// Moves `handle` to `Loading` and starts `target` in the background.
	///
	/// Returns before the target is up. The handle ends in `Ready`, or in
	/// `Failed` if startup returned an error or panicked. If the handle was
	/// closed meanwhile, the freshly started target is shut down again.
	pub fn start(&self, handle: &TargetHandle, target: Arc<dyn ExecutionTarget>, sink: CompletionSink) -> LoadStart {
		if !handle.begin_loading() {
			return LoadStart::AlreadyStarted;
		}

		let thread_handle = handle.clone();
		let spawned = workbench_worker::spawn_named_thread(TaskClass::Startup, self.thread_name.clone(), move || {
			let result = match catch_panic(|| target.start(sink)) {
				Ok(Ok(())) => Ok(()),
				Ok(Err(err)) => Err(err.to_string()),
				Err(panic) => Err(format!("target startup panicked: {panic}")),
			};
			if let Err(msg) = &result {
				warn!(error = %msg, "loader.failed");
			}
			let started = result.is_ok();
			if !thread_handle.finish_loading(result) && started {
				info!(state = thread_handle.state().as_str(), "loader.closed_while_loading");
				target.shutdown();
			}
		});

		if let Err(err) = spawned {
			error!(error = %err, "loader.spawn_failed");
			handle.finish_loading(Err(format!("cannot spawn loader thread: {err}")));
		}
		LoadStart::Started
	}
}
