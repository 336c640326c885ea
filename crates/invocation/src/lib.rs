//! Invocation protocol types and the blocking completion bridge.
//!
//! An [`InvocationDescriptor`] describes one constructor or method call. Some
//! [`Invoke`] implementation starts it and later reports exactly one
//! [`InvocationOutcome`] to a [`ResultWatcher`], possibly from a foreign
//! thread. [`CompletionBridge`] folds that back into a plain function call.

mod bridge;
mod descriptor;
mod outcome;
mod value;
mod watcher;

pub use bridge::{CompletionBridge, OutcomeSlot, OutcomeWait, outcome_slot};
pub use descriptor::{InvocationDescriptor, InvocationKind};
pub use outcome::{InvocationError, InvocationOutcome};
pub use value::{ObjectHandle, ObjectId, RemoteValue};
pub use watcher::{Delivery, Invoke, ResultWatcher};
