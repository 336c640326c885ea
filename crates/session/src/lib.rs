//! Session runtime for the invocation workbench.
//!
//! A [`Workbench`] starts an [`ExecutionTarget`] in the background, issues
//! invocations against it through an [`Invoker`], keeps named results on the
//! object bench ([`ObjectScope`]) and records every successful call in an
//! interaction graph. [`LocalTarget`] is an in-process target backed by a
//! table of Rust closures.

mod config;
mod handle;
mod invoker;
mod loader;
mod local;
mod scope;
mod session;
mod state;
mod target;

pub use config::{ConfigError, WorkbenchConfig};
pub use handle::{TargetHandle, TargetState};
pub use invoker::{CompletionSink, Invoker, unwrap_constructed};
pub use loader::{LoadStart, TargetLoader};
pub use local::{LocalArg, LocalTarget, LocalTargetBuilder, RESULT_HOLDER_TYPE, Returned};
pub use scope::{BenchEvent, ObjectScope};
pub use session::{RecordedOutcome, Workbench};
pub use target::{ExecutionTarget, InvocationId, MarshalledArg, MarshalledCall, RawCompletion, RemoteFailure, TargetError};
