use std::time::Duration;

use crate::RemoteValue;

/// Why an invocation did not produce a value.
///
/// The display text is the human-readable failure message handed to the
/// presentation layer.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum InvocationError {
	/// The execution target is not ready for invocations.
	#[error("not open")]
	NotReady,
	/// Argument text could not be converted or dispatched to the target.
	#[error("invocation error: {0}")]
	Marshalling(String),
	/// The invoked code itself failed.
	#[error("{0}")]
	RemoteExecution(String),
	/// The target went away while the invocation was in flight.
	#[error("execution target terminated")]
	TargetTerminated,
	/// No answer arrived within the configured call timeout.
	#[error("no result after {0:?}")]
	TimedOut(Duration),
}

/// The exactly-once result of one invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InvocationOutcome {
	Success {
		value: RemoteValue,
		/// Name the result was bound under, if any.
		binding: Option<String>,
	},
	Failure(InvocationError),
}

impl InvocationOutcome {
	pub fn is_success(&self) -> bool {
		matches!(self, Self::Success { .. })
	}

	/// Returns the produced value, if the invocation succeeded.
	pub fn value(&self) -> Option<&RemoteValue> {
		match self {
			Self::Success { value, .. } => Some(value),
			Self::Failure(_) => None,
		}
	}

	/// Returns the name the result was bound under.
	pub fn binding(&self) -> Option<&str> {
		match self {
			Self::Success { binding, .. } => binding.as_deref(),
			Self::Failure(_) => None,
		}
	}

	pub fn error(&self) -> Option<&InvocationError> {
		match self {
			Self::Success { .. } => None,
			Self::Failure(err) => Some(err),
		}
	}

	/// Converts into a `Result`, dropping the binding name.
	pub fn into_result(self) -> Result<RemoteValue, InvocationError> {
		match self {
			Self::Success { value, .. } => Ok(value),
			Self::Failure(err) => Err(err),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn not_ready_message_is_not_open() {
		assert_eq!(InvocationError::NotReady.to_string(), "not open");
	}

	#[test]
	fn failure_exposes_error_only() {
		let outcome = InvocationOutcome::Failure(InvocationError::RemoteExecution("boom".into()));
		assert!(!outcome.is_success());
		assert!(outcome.value().is_none());
		assert_eq!(outcome.error().map(ToString::to_string).as_deref(), Some("boom"));
	}
}
