//! In-process execution target.
//!
//! [`LocalTarget`] runs invoked code on its own named thread. Classes are
//! registered as Rust closures over JSON object state. Constructor results
//! are wrapped in a holder object before being reported, the same convention
//! an out-of-process target follows.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::{Arc, mpsc};
use std::thread::JoinHandle;

use parking_lot::Mutex;
use serde_json::Value;
use tracing::{debug, warn};
use workbench_invocation::ObjectId;
use workbench_worker::TaskClass;

use crate::target::{ExecutionTarget, InvocationId, MarshalledCall, TargetError};
use crate::{CompletionSink, WorkbenchConfig};

mod heap;

pub use heap::RESULT_HOLDER_TYPE;

/// Argument as seen by local class code.
#[derive(Debug, Clone, PartialEq)]
pub enum LocalArg {
	/// Unevaluated source text.
	Text(String),
	/// A bench object, with a snapshot of its state.
	Object { id: ObjectId, state: Value },
}

impl LocalArg {
	pub fn text(&self) -> Option<&str> {
		match self {
			Self::Text(text) => Some(text),
			Self::Object { .. } => None,
		}
	}

	/// Parses a text argument, with a readable error for class code to return.
	pub fn parse<T: FromStr>(&self) -> Result<T, String> {
		match self {
			Self::Text(text) => text
				.trim()
				.parse()
				.map_err(|_| format!("expected {} but got `{text}`", std::any::type_name::<T>())),
			Self::Object { id, .. } => Err(format!("expected {} but got object {id}", std::any::type_name::<T>())),
		}
	}

	pub fn object_id(&self) -> Option<ObjectId> {
		match self {
			Self::Object { id, .. } => Some(*id),
			Self::Text(_) => None,
		}
	}
}

/// What a local method produced.
#[derive(Debug, Clone, PartialEq)]
pub enum Returned {
	Void,
	/// A primitive or string result.
	Value(Value),
	/// A newly created object.
	New { type_name: String, state: Value },
}

type ConstructorFn = Arc<dyn Fn(&[LocalArg]) -> Result<Value, String> + Send + Sync>;
type MethodFn = Arc<dyn Fn(&mut Value, &[LocalArg]) -> Result<Returned, String> + Send + Sync>;
type StartupFn = Box<dyn Fn() -> Result<(), String> + Send + Sync>;

/// Constructors and methods known to a local target.
#[derive(Default)]
pub struct ClassTable {
	constructors: HashMap<String, ConstructorFn>,
	methods: HashMap<(String, String), MethodFn>,
}

/// Builder for [`LocalTarget`].
pub struct LocalTargetBuilder {
	classes: ClassTable,
	thread_name: String,
	startup: Option<StartupFn>,
}

impl LocalTargetBuilder {
	/// Name of the thread invoked code runs on.
	#[must_use]
	pub fn thread_name(mut self, name: impl Into<String>) -> Self {
		self.thread_name = name.into();
		self
	}

	/// Registers the constructor of `type_name`; it returns the initial state.
	#[must_use]
	pub fn constructor<F>(mut self, type_name: impl Into<String>, f: F) -> Self
	where
		F: Fn(&[LocalArg]) -> Result<Value, String> + Send + Sync + 'static,
	{
		self.classes.constructors.insert(type_name.into(), Arc::new(f));
		self
	}

	/// Registers method `name` on `type_name`.
	#[must_use]
	pub fn method<F>(mut self, type_name: impl Into<String>, name: impl Into<String>, f: F) -> Self
	where
		F: Fn(&mut Value, &[LocalArg]) -> Result<Returned, String> + Send + Sync + 'static,
	{
		self.classes.methods.insert((type_name.into(), name.into()), Arc::new(f));
		self
	}

	/// Runs `f` on the loader thread before the target accepts calls.
	/// An error fails the startup.
	#[must_use]
	pub fn on_startup<F>(mut self, f: F) -> Self
	where
		F: Fn() -> Result<(), String> + Send + Sync + 'static,
	{
		self.startup = Some(Box::new(f));
		self
	}

	pub fn build(self) -> LocalTarget {
		LocalTarget {
			classes: Arc::new(self.classes),
			thread_name: self.thread_name,
			startup: self.startup,
			running: Mutex::new(None),
		}
	}
}

enum Job {
	Invoke { id: InvocationId, call: MarshalledCall },
	Shutdown,
}

struct Running {
	jobs: mpsc::Sender<Job>,
	thread: JoinHandle<()>,
}

/// Execution target running on a dedicated thread of this process.
pub struct LocalTarget {
	classes: Arc<ClassTable>,
	thread_name: String,
	startup: Option<StartupFn>,
	running: Mutex<Option<Running>>,
}

impl fmt::Debug for LocalTarget {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("LocalTarget")
			.field("thread_name", &self.thread_name)
			.field("constructors", &self.classes.constructors.len())
			.field("methods", &self.classes.methods.len())
			.field("running", &self.running.lock().is_some())
			.finish()
	}
}

impl LocalTarget {
	pub fn builder() -> LocalTargetBuilder {
		LocalTargetBuilder {
			classes: ClassTable::default(),
			thread_name: "workbench-target".to_string(),
			startup: None,
		}
	}

	/// Builder taking its thread name from `config`.
	pub fn builder_for(config: &WorkbenchConfig) -> LocalTargetBuilder {
		Self::builder().thread_name(config.target_thread_name.clone())
	}

	pub fn is_running(&self) -> bool {
		self.running.lock().is_some()
	}

	fn stop(&self) {
		let Some(running) = self.running.lock().take() else {
			return;
		};
		let _ = running.jobs.send(Job::Shutdown);
		if running.thread.thread().id() == std::thread::current().id() {
			return;
		}
		if running.thread.join().is_err() {
			warn!(thread = %self.thread_name, "local target thread panicked");
		}
	}
}

impl ExecutionTarget for LocalTarget {
	fn start(&self, sink: CompletionSink) -> Result<(), TargetError> {
		if let Some(startup) = &self.startup {
			startup().map_err(TargetError::Startup)?;
		}

		let mut running = self.running.lock();
		if running.is_some() {
			return Err(TargetError::Startup("local target is already running".into()));
		}

		let (jobs, rx) = mpsc::channel::<Job>();
		let classes = Arc::clone(&self.classes);
		let thread = workbench_worker::spawn_named_thread(TaskClass::Execution, self.thread_name.clone(), move || {
			let mut heap = heap::Heap::new(classes);
			while let Ok(job) = rx.recv() {
				match job {
					Job::Invoke { id, call } => {
						let completion = heap.execute(call);
						sink.complete(id, completion);
					}
					Job::Shutdown => break,
				}
			}
			debug!("local target thread exiting");
		})
		.map_err(|err| TargetError::Startup(format!("cannot spawn target thread: {err}")))?;

		*running = Some(Running { jobs, thread });
		Ok(())
	}

	fn dispatch(&self, id: InvocationId, call: MarshalledCall) -> Result<(), TargetError> {
		let running = self.running.lock();
		let Some(running) = running.as_ref() else {
			return Err(TargetError::Disconnected);
		};
		running.jobs.send(Job::Invoke { id, call }).map_err(|_| TargetError::Disconnected)
	}

	fn shutdown(&self) {
		self.stop();
	}
}

impl Drop for LocalTarget {
	fn drop(&mut self) {
		self.stop();
	}
}

#[cfg(test)]
mod tests;
