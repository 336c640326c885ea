//! Execution target abstraction.

use std::fmt;

use workbench_invocation::{InvocationError, InvocationKind, ObjectHandle, RemoteValue};

use crate::CompletionSink;

/// Identifies one dispatched invocation between the invoker and the target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct InvocationId(pub u64);

impl fmt::Display for InvocationId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "inv#{}", self.0)
	}
}

/// One argument after marshalling.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MarshalledArg {
	/// Source text for the target to evaluate.
	Source(String),
	/// An object bound on the bench.
	Object(ObjectHandle),
}

/// A descriptor with its receiver and arguments turned into target values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarshalledCall {
	pub kind: InvocationKind,
	pub type_name: String,
	/// Method name; `None` for constructors.
	pub method: Option<String>,
	/// Receiving object; `None` for constructors.
	pub receiver: Option<ObjectHandle>,
	pub args: Vec<MarshalledArg>,
}

/// Failure reported by the target for one invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteFailure {
	/// The invoked code threw.
	Exception(String),
	/// The target could not bind the call (unknown type, method or argument).
	Marshalling(String),
}

/// Raw completion reported by the target: the unprocessed returned value or
/// a failure.
pub type RawCompletion = Result<RemoteValue, RemoteFailure>;

/// Errors raised synchronously by a target.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum TargetError {
	#[error("target startup failed: {0}")]
	Startup(String),
	#[error("cannot dispatch call: {0}")]
	Marshalling(String),
	#[error("target is not running")]
	Disconnected,
}

impl From<TargetError> for InvocationError {
	fn from(err: TargetError) -> Self {
		match err {
			TargetError::Disconnected => Self::TargetTerminated,
			other => Self::Marshalling(other.to_string()),
		}
	}
}

/// The separately scheduled program instance invocations run in.
///
/// The target reports each dispatched invocation exactly once through the
/// [`CompletionSink`] it was started with, from any thread.
pub trait ExecutionTarget: Send + Sync + 'static {
	/// Brings the target up. Runs on the loader thread and may block.
	fn start(&self, sink: CompletionSink) -> Result<(), TargetError>;

	/// Hands one call to the target without waiting for it to run.
	fn dispatch(&self, id: InvocationId, call: MarshalledCall) -> Result<(), TargetError>;

	/// Stops the target. Invocations it has not reported are abandoned.
	fn shutdown(&self) {}
}
